use super::tts_repository::SynthesisJobClient;
use crate::domain::synthesis::{JobHandle, JobStatus, ResultHandle, SynthesisError};
use crate::domain::voice::VoiceId;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const UPLOAD_PURPOSE: &str = "t2a_async_input";

#[derive(Debug, Clone, Serialize)]
struct CreateTaskRequest<'a> {
    model: &'a str,
    text_file_id: &'a str,
    voice_setting: VoiceSetting<'a>,
    audio_setting: AudioSetting,
}

#[derive(Debug, Clone, Serialize)]
struct VoiceSetting<'a> {
    voice_id: &'a str,
    speed: f32,
    vol: f32,
    pitch: i32,
}

#[derive(Debug, Clone, Serialize)]
struct AudioSetting {
    sample_rate: u32,
    format: &'static str,
    bitrate: u32,
    channel: u8,
}

impl Default for AudioSetting {
    fn default() -> Self {
        Self {
            sample_rate: 32000,
            format: "mp3",
            bitrate: 128000,
            channel: 1,
        }
    }
}

#[derive(Debug, Deserialize)]
struct BaseResp {
    status_code: i64,
    #[serde(default)]
    status_msg: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file: Option<UploadedFile>,
    base_resp: Option<BaseResp>,
}

#[derive(Debug, Deserialize)]
struct UploadedFile {
    file_id: Value,
}

#[derive(Debug, Deserialize)]
struct CreateTaskResponse {
    task_id: Option<Value>,
    base_resp: Option<BaseResp>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    status: String,
    file_id: Option<Value>,
    base_resp: Option<BaseResp>,
}

/// MiniMax asynchronous long-text TTS: upload text file, create task, query
/// task, retrieve audio file.
pub struct MiniMaxTtsRepository {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl MiniMaxTtsRepository {
    pub fn new(http: reqwest::Client, base_url: &str, api_key: String, model: String) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn upload_text(&self, text: &str) -> Result<String, String> {
        let part = Part::bytes(text.as_bytes().to_vec())
            .file_name("dialogue.txt")
            .mime_str("text/plain")
            .map_err(|e| e.to_string())?;
        let form = Form::new().text("purpose", UPLOAD_PURPOSE).part("file", part);

        let response = self
            .http
            .post(self.url("/v1/files/upload"))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let body: UploadResponse = read_json(response).await?;
        check_base_resp(body.base_resp.as_ref())?;

        body.file
            .and_then(|file| id_string(&file.file_id))
            .ok_or_else(|| "response has no file id".to_string())
    }

    async fn create_task(&self, file_id: &str, voice: &VoiceId) -> Result<String, String> {
        let payload = CreateTaskRequest {
            model: &self.model,
            text_file_id: file_id,
            voice_setting: VoiceSetting {
                voice_id: voice.as_str(),
                speed: 1.0,
                vol: 1.0,
                pitch: 0,
            },
            audio_setting: AudioSetting::default(),
        };

        let response = self
            .http
            .post(self.url("/v1/t2a_async_v2"))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let body: CreateTaskResponse = read_json(response).await?;
        check_base_resp(body.base_resp.as_ref())?;

        body.task_id
            .as_ref()
            .and_then(id_string)
            .ok_or_else(|| "response has no task id".to_string())
    }
}

#[async_trait]
impl SynthesisJobClient for MiniMaxTtsRepository {
    fn provider(&self) -> &'static str {
        "minimax"
    }

    async fn submit(&self, text: &str, voice: &VoiceId) -> Result<JobHandle, SynthesisError> {
        tracing::debug!(voice = %voice, text_length = text.chars().count(), "Uploading dialogue text");

        let file_id = self
            .upload_text(text)
            .await
            .map_err(SynthesisError::Upload)?;

        let task_id = self
            .create_task(&file_id, voice)
            .await
            .map_err(SynthesisError::Submission)?;

        tracing::debug!(file_id = %file_id, task_id = %task_id, "Created synthesis task");
        Ok(JobHandle(task_id))
    }

    async fn poll(&self, job: &JobHandle) -> Result<JobStatus, SynthesisError> {
        let response = self
            .http
            .get(self.url("/v1/query/t2a_async_query_v2"))
            .query(&[("task_id", job.0.as_str())])
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| SynthesisError::Poll(e.to_string()))?;

        let body: QueryResponse = read_json(response).await.map_err(SynthesisError::Poll)?;
        check_base_resp(body.base_resp.as_ref()).map_err(SynthesisError::Poll)?;

        match body.status.as_str() {
            "Success" => body
                .file_id
                .as_ref()
                .and_then(id_string)
                .map(|id| JobStatus::Succeeded(ResultHandle(id)))
                .ok_or_else(|| SynthesisError::Poll("finished task has no file id".to_string())),
            "Fail" | "Failed" | "Expired" => Ok(JobStatus::Failed(format!("task status {}", body.status))),
            _ => Ok(JobStatus::Pending),
        }
    }

    async fn fetch(&self, result: &ResultHandle) -> Result<Vec<u8>, SynthesisError> {
        let response = self
            .http
            .get(self.url("/v1/files/retrieve_content"))
            .query(&[("file_id", result.0.as_str())])
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| SynthesisError::Download(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SynthesisError::Download(format!("HTTP {}", status)));
        }

        // Errors come back as a JSON body with a 200 status
        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("application/json"));

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SynthesisError::Download(e.to_string()))?;

        if is_json {
            let message = serde_json::from_slice::<Value>(&bytes)
                .ok()
                .and_then(|v| v.get("base_resp").and_then(|b| b.get("status_msg")).cloned())
                .and_then(|m| m.as_str().map(str::to_string))
                .unwrap_or_else(|| "unexpected JSON body".to_string());
            return Err(SynthesisError::Download(message));
        }

        Ok(bytes.to_vec())
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T, String> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(format!("HTTP {}: {}", status, body));
    }
    response.json::<T>().await.map_err(|e| e.to_string())
}

fn check_base_resp(base_resp: Option<&BaseResp>) -> Result<(), String> {
    match base_resp {
        Some(resp) if resp.status_code != 0 => {
            Err(format!("status {}: {}", resp.status_code, resp.status_msg))
        }
        _ => Ok(()),
    }
}

/// Ids arrive as numbers or strings depending on the endpoint
fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
