use async_trait::async_trait;
use parking_lot::Mutex;
use podcast_studio::domain::assembly::{AssemblyError, AudioConcatenator};
use podcast_studio::domain::synthesis::{JobHandle, JobStatus, ResultHandle, SynthesisError};
use podcast_studio::domain::voice::VoiceId;
use podcast_studio::infrastructure::repositories::SynthesisJobClient;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::watch;

/// Job client whose audio is the submitted text itself.
///
/// Texts containing `FAIL` are rejected at submission. Downloads block while
/// the gate is held.
pub struct FakeJobClient {
    submits: AtomicUsize,
    gate: watch::Sender<bool>,
    voices: Mutex<Vec<String>>,
}

impl Default for FakeJobClient {
    fn default() -> Self {
        let (gate, _) = watch::channel(true);
        Self {
            submits: AtomicUsize::new(0),
            gate,
            voices: Mutex::new(Vec::new()),
        }
    }
}

impl FakeJobClient {
    pub fn submit_count(&self) -> usize {
        self.submits.load(Ordering::SeqCst)
    }

    pub fn voices(&self) -> Vec<String> {
        self.voices.lock().clone()
    }

    pub fn hold_downloads(&self) {
        self.gate.send_replace(false);
    }

    pub fn release_downloads(&self) {
        self.gate.send_replace(true);
    }
}

#[async_trait]
impl SynthesisJobClient for FakeJobClient {
    fn provider(&self) -> &'static str {
        "fake"
    }

    async fn submit(&self, text: &str, voice: &VoiceId) -> Result<JobHandle, SynthesisError> {
        self.submits.fetch_add(1, Ordering::SeqCst);
        self.voices.lock().push(voice.as_str().to_string());
        if text.contains("FAIL") {
            return Err(SynthesisError::Submission("rejected by fake".to_string()));
        }
        Ok(JobHandle(text.to_string()))
    }

    async fn poll(&self, job: &JobHandle) -> Result<JobStatus, SynthesisError> {
        Ok(JobStatus::Succeeded(ResultHandle(job.0.clone())))
    }

    async fn fetch(&self, result: &ResultHandle) -> Result<Vec<u8>, SynthesisError> {
        let mut gate = self.gate.subscribe();
        gate.wait_for(|open| *open)
            .await
            .map_err(|e| SynthesisError::Download(e.to_string()))?;
        Ok(format!("[{}]", result.0).into_bytes())
    }
}

/// Concatenates by appending raw bytes. Blocks while the gate is held.
pub struct FakeConcatenator {
    calls: AtomicUsize,
    gate: watch::Sender<bool>,
}

impl Default for FakeConcatenator {
    fn default() -> Self {
        let (gate, _) = watch::channel(true);
        Self {
            calls: AtomicUsize::new(0),
            gate,
        }
    }
}

impl FakeConcatenator {
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn hold_merges(&self) {
        self.gate.send_replace(false);
    }

    pub fn release_merges(&self) {
        self.gate.send_replace(true);
    }
}

#[async_trait]
impl AudioConcatenator for FakeConcatenator {
    async fn concat(&self, inputs: &[PathBuf], output: &Path) -> Result<(), AssemblyError> {
        let mut gate = self.gate.subscribe();
        if gate.wait_for(|open| *open).await.is_err() {
            return Err(AssemblyError::MergeFailure {
                status: "gate closed".to_string(),
                diagnostics: String::new(),
            });
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut merged = Vec::new();
        for input in inputs {
            merged.extend(tokio::fs::read(input).await?);
        }
        tokio::fs::write(output, merged).await?;
        Ok(())
    }
}
