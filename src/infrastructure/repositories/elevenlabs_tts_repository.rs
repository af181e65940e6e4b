use super::tts_repository::SynthesisJobClient;
use crate::domain::synthesis::{JobHandle, JobStatus, ResultHandle, SynthesisError};
use crate::domain::voice::VoiceId;
use async_trait::async_trait;
use moka::future::Cache;
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Debug, Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
    style: f32,
    use_speaker_boost: bool,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: 0.5,
            similarity_boost: 0.5,
            style: 0.0,
            use_speaker_boost: true,
        }
    }
}

/// ElevenLabs text-to-speech behind the job contract.
///
/// The API answers synchronously, so `submit` does the synthesis and parks
/// the audio in memory until `fetch` takes it. Parked audio nobody fetches
/// expires after an hour.
pub struct ElevenLabsTtsRepository {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    results: Cache<String, Vec<u8>>,
}

impl ElevenLabsTtsRepository {
    pub fn new(http: reqwest::Client, base_url: &str, api_key: String, model: String) -> Self {
        let results = Cache::builder()
            .max_capacity(1_000)
            .time_to_live(Duration::from_secs(60 * 60))
            .build();

        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
            results,
        }
    }

    async fn synthesize(&self, text: &str, voice: &VoiceId) -> Result<Vec<u8>, String> {
        let url = format!("{}/v1/text-to-speech/{}", self.base_url, voice.as_str());
        let payload = SpeechRequest {
            text,
            model_id: &self.model,
            voice_settings: VoiceSettings::default(),
        };

        let response = self
            .http
            .post(url)
            .header("xi-api-key", &self.api_key)
            .header(reqwest::header::ACCEPT, "audio/mpeg")
            .json(&payload)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("HTTP {}: {}", status, body));
        }

        let audio = response.bytes().await.map_err(|e| e.to_string())?;
        Ok(audio.to_vec())
    }
}

#[async_trait]
impl SynthesisJobClient for ElevenLabsTtsRepository {
    fn provider(&self) -> &'static str {
        "elevenlabs"
    }

    async fn submit(&self, text: &str, voice: &VoiceId) -> Result<JobHandle, SynthesisError> {
        let start_time = std::time::Instant::now();

        let audio = self.synthesize(text, voice).await.map_err(|e| {
            tracing::error!(voice = %voice, error = %e, "ElevenLabs synthesis failed");
            SynthesisError::Submission(e)
        })?;

        let job_id = Uuid::new_v4().to_string();
        tracing::debug!(
            job_id = %job_id,
            audio_size = audio.len(),
            latency_ms = start_time.elapsed().as_millis() as u64,
            "ElevenLabs audio received"
        );
        self.results.insert(job_id.clone(), audio).await;

        Ok(JobHandle(job_id))
    }

    async fn poll(&self, job: &JobHandle) -> Result<JobStatus, SynthesisError> {
        if self.results.contains_key(&job.0) {
            Ok(JobStatus::Succeeded(ResultHandle(job.0.clone())))
        } else {
            Ok(JobStatus::Failed("audio no longer available".to_string()))
        }
    }

    async fn fetch(&self, result: &ResultHandle) -> Result<Vec<u8>, SynthesisError> {
        self.results
            .remove(&result.0)
            .await
            .ok_or_else(|| SynthesisError::Download(format!("no audio parked for {}", result)))
    }
}
