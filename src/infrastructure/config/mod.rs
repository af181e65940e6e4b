use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub output_root: PathBuf,
    pub host: String,
    pub port: u16,
    pub log_format: LogFormat,
    pub tts: TtsConfig,
    pub news: NewsConfig,
    pub llm: LlmConfig,
    pub assembly: AssemblyConfig,
    pub http_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct TtsConfig {
    pub provider: TtsProvider,
    pub minimax: ProviderConfig,
    pub elevenlabs: ProviderConfig,
    pub max_concurrent: usize,
    pub poll_interval: Duration,
    pub job_timeout: Duration,
    pub max_poll_errors: u32,
}

/// Credentials, endpoint and voices of one TTS provider
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub voice_luo: String,
    pub voice_ziru: String,
}

#[derive(Debug, Clone)]
pub struct NewsConfig {
    pub rss_url: String,
    pub limit: usize,
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct AssemblyConfig {
    pub intro_path: PathBuf,
    pub ffmpeg_path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtsProvider {
    MiniMax,
    ElevenLabs,
}

impl TtsProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            TtsProvider::MiniMax => "minimax",
            TtsProvider::ElevenLabs => "elevenlabs",
        }
    }
}

impl FromStr for TtsProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "minimax" => Ok(TtsProvider::MiniMax),
            "elevenlabs" => Ok(TtsProvider::ElevenLabs),
            other => Err(format!("unknown TTS provider '{}'", other)),
        }
    }
}

impl std::fmt::Display for TtsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let config = Config {
            output_root: PathBuf::from(var_or("OUTPUT_ROOT", "data/output")),
            host: var_or("HOST", "0.0.0.0"),
            port: var_or("PORT", "8080").parse()?,
            log_format: match var_or("LOG_FORMAT", "pretty").as_str() {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
            tts: TtsConfig {
                provider: var_or("TTS_PROVIDER", "minimax").parse()?,
                minimax: ProviderConfig {
                    api_key: optional_var("MINIMAX_API_KEY"),
                    base_url: var_or("MINIMAX_BASE_URL", "https://api.minimaxi.com"),
                    model: var_or("MINIMAX_MODEL", "speech-2.6-hd"),
                    voice_luo: var_or("MINIMAX_VOICE_LUO", "luoyonghao2"),
                    voice_ziru: var_or("MINIMAX_VOICE_ZIRU", "wangziru_test"),
                },
                elevenlabs: ProviderConfig {
                    api_key: optional_var("ELEVENLABS_API_KEY"),
                    base_url: var_or("ELEVENLABS_BASE_URL", "https://api.elevenlabs.io"),
                    model: var_or("ELEVENLABS_MODEL", "eleven_monolingual_v1"),
                    voice_luo: var_or("ELEVENLABS_VOICE_LUO", ""),
                    voice_ziru: var_or("ELEVENLABS_VOICE_ZIRU", ""),
                },
                max_concurrent: var_or("TTS_MAX_CONCURRENT", "5").parse()?,
                poll_interval: Duration::from_secs(var_or("TTS_POLL_INTERVAL_SECS", "2").parse()?),
                job_timeout: Duration::from_secs(var_or("TTS_JOB_TIMEOUT_SECS", "600").parse()?),
                max_poll_errors: var_or("TTS_MAX_POLL_ERRORS", "3").parse()?,
            },
            news: NewsConfig {
                rss_url: var_or(
                    "RSS_URL",
                    "https://kejikuaixun.blogspot.com/feeds/posts/default?alt=rss",
                ),
                limit: var_or("NEWS_LIMIT", "10").parse()?,
            },
            llm: LlmConfig {
                api_key: optional_var("DEEPSEEK_API_KEY"),
                base_url: var_or("LLM_BASE_URL", "https://api.deepseek.com"),
                model: var_or("LLM_MODEL", "deepseek-chat"),
            },
            assembly: AssemblyConfig {
                intro_path: PathBuf::from(var_or("INTRO_AUDIO_PATH", "voices/intro/intro_final.mp3")),
                ffmpeg_path: var_or("FFMPEG_PATH", "ffmpeg"),
            },
            http_timeout: Duration::from_secs(var_or("HTTP_TIMEOUT_SECS", "180").parse()?),
        };

        Ok(config)
    }

    /// Settings of the provider currently selected
    pub fn active_provider(&self) -> &ProviderConfig {
        match self.tts.provider {
            TtsProvider::MiniMax => &self.tts.minimax,
            TtsProvider::ElevenLabs => &self.tts.elevenlabs,
        }
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Unset and blank are the same
fn optional_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
