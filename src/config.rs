use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::adapter::ProviderAdapter;
use crate::error::{MedleyError, Result};
use crate::registry::{ProviderDescriptor, ProviderRegistry};
use crate::router::ServiceRouter;
use crate::types::{Capability, QualityTier};

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

fn default_cooldown_seconds() -> u64 {
    60
}

fn default_latency_ms() -> u64 {
    5_000
}

fn default_timeout_seconds() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterSettings {
    #[serde(default = "default_cooldown_seconds")]
    pub cooldown_seconds: u64,
    #[serde(default)]
    pub providers: Vec<ProviderSettings>,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            cooldown_seconds: default_cooldown_seconds(),
            providers: Vec::new(),
        }
    }
}

impl RouterSettings {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn from_toml_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    pub name: String,
    pub adapter: AdapterKind,
    pub capability: Capability,
    pub unit_cost_usd_micros: u64,
    #[serde(default)]
    pub quality: QualityTier,
    #[serde(default = "default_latency_ms")]
    pub avg_latency_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Environment variable names tried in order for the API key; the
    /// adapter's own default names are tried after these.
    #[serde(default)]
    pub api_key_env: Vec<String>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdapterKind {
    #[serde(rename = "gemini_image")]
    GeminiImage,
    #[serde(rename = "stability_image")]
    StabilityImage,
    #[serde(rename = "veo_video")]
    VeoVideo,
    #[serde(rename = "runway_video")]
    RunwayVideo,
    #[serde(rename = "did_video")]
    DidVideo,
    #[serde(rename = "elevenlabs_speech")]
    ElevenLabsSpeech,
    #[serde(rename = "openai_speech")]
    OpenAiSpeech,
}

impl AdapterKind {
    pub fn capability(self) -> Capability {
        match self {
            Self::GeminiImage | Self::StabilityImage => Capability::ImageEnhancement,
            Self::VeoVideo | Self::RunwayVideo | Self::DidVideo => Capability::VideoGeneration,
            Self::ElevenLabsSpeech | Self::OpenAiSpeech => Capability::TextToSpeech,
        }
    }
}

/// Dotenv contents layered over the process environment; dotenv wins.
#[derive(Debug, Clone, Default)]
pub struct Env {
    pub dotenv: BTreeMap<String, String>,
}

impl Env {
    pub fn parse_dotenv(contents: &str) -> Self {
        Self {
            dotenv: parse_dotenv(contents),
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        if let Some(value) = self.dotenv.get(key) {
            return Some(value.clone());
        }
        std::env::var(key)
            .ok()
            .filter(|value| !value.trim().is_empty())
    }
}

pub fn parse_dotenv(contents: &str) -> BTreeMap<String, String> {
    let mut out = BTreeMap::<String, String>::new();

    for raw_line in contents.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let line = line.strip_prefix("export ").unwrap_or(line).trim();
        let Some((raw_key, raw_value)) = line.split_once('=') else {
            continue;
        };
        let key = raw_key.trim();
        if key.is_empty() {
            continue;
        }

        let mut value = raw_value.trim().to_string();
        if let Some(stripped) = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        {
            value = stripped.to_string();
        }

        if value.trim().is_empty() {
            continue;
        }

        out.insert(key.to_string(), value);
    }

    out
}

fn resolve_api_key(env: &Env, configured: &[String], defaults: &[&str]) -> String {
    configured
        .iter()
        .find_map(|key| env.get(key))
        .or_else(|| defaults.iter().find_map(|key| env.get(key)))
        .unwrap_or_default()
}

pub(crate) fn build_http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|err| MedleyError::Config(format!("failed to build http client: {err}")))
}

/// The cost matrix the surrounding product shipped with, priced in USD
/// micros per billing unit (seconds of video, characters of speech,
/// megapixel buckets for images). Override any of it via TOML.
pub fn default_catalog() -> Vec<ProviderSettings> {
    fn entry(
        name: &str,
        adapter: AdapterKind,
        unit_cost_usd_micros: u64,
        quality: QualityTier,
        avg_latency_ms: u64,
    ) -> ProviderSettings {
        ProviderSettings {
            name: name.to_string(),
            capability: adapter.capability(),
            adapter,
            unit_cost_usd_micros,
            quality,
            avg_latency_ms,
            base_url: None,
            api_key_env: Vec::new(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }

    vec![
        entry(
            "nano_banana",
            AdapterKind::GeminiImage,
            39_000,
            QualityTier::Economy,
            2_100,
        ),
        entry(
            "stability_ai",
            AdapterKind::StabilityImage,
            350_000,
            QualityTier::Premium,
            2_800,
        ),
        entry(
            "veo",
            AdapterKind::VeoVideo,
            150_000,
            QualityTier::Balanced,
            12_500,
        ),
        entry(
            "runway",
            AdapterKind::RunwayVideo,
            200_000,
            QualityTier::Premium,
            15_200,
        ),
        entry(
            "d-id",
            AdapterKind::DidVideo,
            100_000,
            QualityTier::Economy,
            8_000,
        ),
        entry(
            "elevenlabs",
            AdapterKind::ElevenLabsSpeech,
            300,
            QualityTier::Premium,
            1_200,
        ),
        entry(
            "openai_tts",
            AdapterKind::OpenAiSpeech,
            30,
            QualityTier::Balanced,
            1_500,
        ),
    ]
}

macro_rules! adapter_from_settings {
    ($ty:ty, $settings:expr, $env:expr, $default_keys:expr) => {{
        let api_key = resolve_api_key($env, &$settings.api_key_env, $default_keys);
        let mut adapter = <$ty>::new(api_key).with_provider_name($settings.name.clone());
        if let Some(base_url) = $settings.base_url.as_deref().filter(|s| !s.trim().is_empty()) {
            adapter = adapter.with_base_url(base_url);
        }
        if $settings.timeout_seconds != DEFAULT_TIMEOUT_SECONDS {
            adapter = adapter.with_http_client(build_http_client(Duration::from_secs(
                $settings.timeout_seconds,
            ))?);
        }
        Arc::new(adapter) as Arc<dyn ProviderAdapter>
    }};
}

fn instantiate_adapter(
    settings: &ProviderSettings,
    env: &Env,
) -> Result<Arc<dyn ProviderAdapter>> {
    let adapter = match settings.adapter {
        #[cfg(feature = "provider-gemini")]
        AdapterKind::GeminiImage => adapter_from_settings!(
            crate::providers::GeminiImage,
            settings,
            env,
            &["GEMINI_API_KEY", "NANO_BANANA_API_KEY"]
        ),
        #[cfg(feature = "provider-stability")]
        AdapterKind::StabilityImage => adapter_from_settings!(
            crate::providers::StabilityImage,
            settings,
            env,
            &["STABILITY_API_KEY"]
        ),
        #[cfg(feature = "provider-veo")]
        AdapterKind::VeoVideo => adapter_from_settings!(
            crate::providers::VeoVideo,
            settings,
            env,
            &["VEO_API_KEY", "VEO3_API_KEY"]
        ),
        #[cfg(feature = "provider-runway")]
        AdapterKind::RunwayVideo => adapter_from_settings!(
            crate::providers::RunwayVideo,
            settings,
            env,
            &["RUNWAY_API_KEY"]
        ),
        #[cfg(feature = "provider-d-id")]
        AdapterKind::DidVideo => adapter_from_settings!(
            crate::providers::DidVideo,
            settings,
            env,
            &["D_ID_API_KEY"]
        ),
        #[cfg(feature = "provider-elevenlabs")]
        AdapterKind::ElevenLabsSpeech => adapter_from_settings!(
            crate::providers::ElevenLabsSpeech,
            settings,
            env,
            &["ELEVENLABS_API_KEY"]
        ),
        #[cfg(feature = "provider-openai-speech")]
        AdapterKind::OpenAiSpeech => adapter_from_settings!(
            crate::providers::OpenAiSpeech,
            settings,
            env,
            &["OPENAI_API_KEY"]
        ),
        #[allow(unreachable_patterns)]
        other => {
            return Err(MedleyError::Config(format!(
                "adapter kind {other:?} is not enabled in this build"
            )));
        }
    };
    Ok(adapter)
}

/// Builds a ready router: registers one descriptor and one adapter per
/// configured provider, wiring the cooldown from the settings.
pub fn build_router(settings: &RouterSettings, env: &Env) -> Result<ServiceRouter> {
    let registry = Arc::new(ProviderRegistry::new());
    let mut router = ServiceRouter::new(Arc::clone(&registry))
        .with_cooldown(Duration::from_secs(settings.cooldown_seconds));

    for provider in &settings.providers {
        if provider.capability != provider.adapter.capability() {
            return Err(MedleyError::Config(format!(
                "provider {:?} declares capability {} but adapter {:?} serves {}",
                provider.name,
                provider.capability,
                provider.adapter,
                provider.adapter.capability()
            )));
        }
        registry.register(ProviderDescriptor::new(
            provider.name.clone(),
            provider.capability,
            provider.unit_cost_usd_micros,
            provider.quality,
            provider.avg_latency_ms,
        ))?;
        router.register_adapter_arc(instantiate_adapter(provider, env)?);
    }

    Ok(router)
}
