#[cfg(feature = "provider-d-id")]
pub mod did;
#[cfg(feature = "provider-elevenlabs")]
pub mod elevenlabs;
#[cfg(feature = "provider-gemini")]
pub mod gemini;
#[cfg(feature = "provider-openai-speech")]
pub mod openai_speech;
#[cfg(feature = "provider-runway")]
pub mod runway;
#[cfg(feature = "provider-stability")]
pub mod stability;
#[cfg(feature = "provider-veo")]
pub mod veo;

#[cfg(feature = "provider-d-id")]
pub use did::DidVideo;
#[cfg(feature = "provider-elevenlabs")]
pub use elevenlabs::ElevenLabsSpeech;
#[cfg(feature = "provider-gemini")]
pub use gemini::GeminiImage;
#[cfg(feature = "provider-openai-speech")]
pub use openai_speech::OpenAiSpeech;
#[cfg(feature = "provider-runway")]
pub use runway::RunwayVideo;
#[cfg(feature = "provider-stability")]
pub use stability::StabilityImage;
#[cfg(feature = "provider-veo")]
pub use veo::VeoVideo;
