pub mod elevenlabs_tts_repository;
pub mod minimax_tts_repository;
pub mod openai_script_repository;
pub mod rss_news_repository;
pub mod tts_repository;

pub use elevenlabs_tts_repository::ElevenLabsTtsRepository;
pub use minimax_tts_repository::MiniMaxTtsRepository;
pub use openai_script_repository::OpenAiScriptRepository;
pub use rss_news_repository::RssNewsRepository;
pub use tts_repository::SynthesisJobClient;

use crate::domain::script::Speaker;
use crate::domain::voice::VoiceMap;
use crate::infrastructure::config::{Config, TtsProvider};
use anyhow::{anyhow, Context};
use std::sync::Arc;

/// Job client and voice table for the configured provider
pub fn build_synthesis_client(
    config: &Config,
    http: reqwest::Client,
) -> anyhow::Result<(Arc<dyn SynthesisJobClient>, VoiceMap)> {
    let provider = config.active_provider();
    let api_key = provider
        .api_key
        .clone()
        .ok_or_else(|| anyhow!("no API key configured for TTS provider {}", config.tts.provider))?;

    let voices = VoiceMap::new([
        (Speaker::Luoyonghao, provider.voice_luo.as_str()),
        (Speaker::Wangziru, provider.voice_ziru.as_str()),
    ]);
    if voices.is_empty() {
        return Err(anyhow!("no voices configured for TTS provider {}", config.tts.provider));
    }

    let client: Arc<dyn SynthesisJobClient> = match config.tts.provider {
        TtsProvider::MiniMax => Arc::new(MiniMaxTtsRepository::new(
            http,
            &provider.base_url,
            api_key,
            provider.model.clone(),
        )),
        TtsProvider::ElevenLabs => Arc::new(ElevenLabsTtsRepository::new(
            http,
            &provider.base_url,
            api_key,
            provider.model.clone(),
        )),
    };

    Ok((client, voices))
}

/// Shared HTTP client for every outbound call
pub fn build_http_client(config: &Config) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.http_timeout)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build HTTP client")
}
