//! End-to-end routing over mock provider backends: config in, ranked
//! failover across real adapters, cooldown bookkeeping out.

#![cfg(feature = "all-providers")]

use bytes::Bytes;
use httpmock::{Method::POST, MockServer};

use medley_ai::{
    Artifact, Capability, Env, GenerationRequest, QualityTier, RouterSettings, build_router,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn video_settings(veo_base: &str, runway_base: &str) -> RouterSettings {
    let raw = format!(
        r#"
        cooldown_seconds = 60

        [[providers]]
        name = "veo"
        adapter = "veo_video"
        capability = "video_generation"
        unit_cost_usd_micros = 150000
        quality = "balanced"
        avg_latency_ms = 12500
        base_url = "{veo_base}"

        [[providers]]
        name = "runway"
        adapter = "runway_video"
        capability = "video_generation"
        unit_cost_usd_micros = 200000
        quality = "premium"
        avg_latency_ms = 15200
        base_url = "{runway_base}"
        "#
    );
    RouterSettings::from_toml_str(&raw).expect("settings")
}

fn video_request() -> GenerationRequest {
    GenerationRequest::talking_video(
        Bytes::from_static(b"\x89PNG"),
        "image/png",
        "hello from the test suite",
        10,
    )
    .with_quality(QualityTier::Economy)
}

#[tokio::test]
async fn failover_crosses_real_adapters_and_cools_down_the_loser() {
    init_tracing();
    let veo_server = MockServer::start_async().await;
    let runway_server = MockServer::start_async().await;

    let veo_mock = veo_server
        .mock_async(|when, then| {
            when.method(POST).path("/generate");
            then.status(503).body("maintenance window");
        })
        .await;
    let runway_mock = runway_server
        .mock_async(|when, then| {
            when.method(POST).path("/image_to_video");
            then.status(200)
                .header("content-type", "application/json")
                .body(
                    serde_json::json!({
                        "output": ["https://cdn.runwayml.com/out.mp4"],
                        "billed_seconds": 10
                    })
                    .to_string(),
                );
        })
        .await;

    let env = Env::parse_dotenv("VEO_API_KEY=veo-key\nRUNWAY_API_KEY=runway-key\n");
    let settings = video_settings(&veo_server.base_url(), &runway_server.base_url());
    let router = build_router(&settings, &env).expect("router");

    // Economy preference ranks the cheaper veo first; it fails over.
    let result = router.generate(video_request()).await.expect("route");
    assert!(result.success);
    assert_eq!(result.provider.as_deref(), Some("runway"));
    assert_eq!(result.cost_usd_micros, 2_000_000);
    match result.artifact.expect("artifact") {
        Artifact::Url { url } => assert_eq!(url, "https://cdn.runwayml.com/out.mp4"),
        other => panic!("unexpected artifact: {other:?}"),
    }

    // veo is cooling down, so the second request goes straight to
    // runway without touching the veo backend again.
    let second = router.generate(video_request()).await.expect("route");
    assert_eq!(second.provider.as_deref(), Some("runway"));
    assert_eq!(veo_mock.hits_async().await, 1);
    assert_eq!(runway_mock.hits_async().await, 2);

    let snapshot = router.registry().snapshot();
    let veo_state = snapshot
        .iter()
        .find(|state| state.descriptor.name == "veo")
        .expect("veo state");
    assert!(!veo_state.descriptor.available);
    assert!(veo_state.unavailable_until_epoch_seconds.is_some());

    let metrics = router.metrics();
    assert_eq!(metrics.requests, 2);
    assert_eq!(metrics.provider_failures, 1);
    assert_eq!(metrics.failovers, 1);
    assert_eq!(metrics.served, 2);
}

#[tokio::test]
async fn exhaustion_reports_every_backend_it_tried() {
    init_tracing();
    let veo_server = MockServer::start_async().await;
    let runway_server = MockServer::start_async().await;

    veo_server
        .mock_async(|when, then| {
            when.method(POST).path("/generate");
            then.status(500).body("boom");
        })
        .await;
    runway_server
        .mock_async(|when, then| {
            when.method(POST).path("/image_to_video");
            then.status(429).body("slow down");
        })
        .await;

    let env = Env::parse_dotenv("VEO_API_KEY=veo-key\nRUNWAY_API_KEY=runway-key\n");
    let settings = video_settings(&veo_server.base_url(), &runway_server.base_url());
    let router = build_router(&settings, &env).expect("router");

    let result = router.generate(video_request()).await.expect("route");
    assert!(!result.success);
    assert!(result.provider.is_none());

    let report = result.error.expect("report");
    let rendered = report.to_string();
    assert!(rendered.contains("veo"));
    assert!(rendered.contains("runway"));
    assert_eq!(report.attempts.len(), 2);
}

#[tokio::test]
async fn speech_routes_to_the_configured_tts_backend() {
    init_tracing();
    let tts_server = MockServer::start_async().await;
    let mock = tts_server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/text-to-speech/EXAVITQu4vr4xnSDxMaL")
                .header("xi-api-key", "eleven-key");
            then.status(200)
                .header("content-type", "audio/mpeg")
                .body(&[1u8, 2, 3][..]);
        })
        .await;

    let raw = format!(
        r#"
        [[providers]]
        name = "elevenlabs"
        adapter = "elevenlabs_speech"
        capability = "text_to_speech"
        unit_cost_usd_micros = 300
        quality = "premium"
        avg_latency_ms = 1200
        base_url = "{}"
        "#,
        tts_server.base_url()
    );
    let settings = RouterSettings::from_toml_str(&raw).expect("settings");
    let env = Env::parse_dotenv("ELEVENLABS_API_KEY=eleven-key\n");
    let router = build_router(&settings, &env).expect("router");

    let result = router
        .generate(GenerationRequest::speech("hello world"))
        .await
        .expect("route");

    mock.assert_async().await;
    assert!(result.success);
    assert_eq!(result.provider.as_deref(), Some("elevenlabs"));
    // 11 characters at 300 USD micros each.
    assert_eq!(result.cost_usd_micros, 3_300);
    assert_eq!(result.billed_units, 11);

    let registered = router.registry().list_providers(Capability::TextToSpeech);
    assert_eq!(registered.len(), 1);
}

#[tokio::test]
async fn budget_ceiling_filters_before_any_backend_is_called() {
    init_tracing();
    let veo_server = MockServer::start_async().await;
    let runway_server = MockServer::start_async().await;

    let veo_mock = veo_server
        .mock_async(|when, then| {
            when.method(POST).path("/generate");
            then.status(200).body("{}");
        })
        .await;
    let runway_mock = runway_server
        .mock_async(|when, then| {
            when.method(POST).path("/image_to_video");
            then.status(200).body("{}");
        })
        .await;

    let env = Env::parse_dotenv("VEO_API_KEY=veo-key\nRUNWAY_API_KEY=runway-key\n");
    let settings = video_settings(&veo_server.base_url(), &runway_server.base_url());
    let router = build_router(&settings, &env).expect("router");

    let request = video_request().with_budget_ceiling_usd_micros(1_000);
    let err = router.generate(request).await.expect_err("budget");
    assert!(matches!(
        err,
        medley_ai::MedleyError::BudgetExceeded { .. }
    ));
    assert_eq!(veo_mock.hits_async().await, 0);
    assert_eq!(runway_mock.hits_async().await, 0);
}
