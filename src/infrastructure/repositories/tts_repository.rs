use crate::domain::synthesis::{JobHandle, JobStatus, ResultHandle, SynthesisError};
use crate::domain::voice::VoiceId;
use async_trait::async_trait;

/// Remote asynchronous TTS jobs.
/// Abstracts the underlying TTS provider (MiniMax, ElevenLabs, etc.)
///
/// Implementations perform exactly one remote interaction per call and never
/// retry; retry and timeout policy belongs to the orchestrator.
#[async_trait]
pub trait SynthesisJobClient: Send + Sync {
    /// Provider name for logs
    fn provider(&self) -> &'static str;

    /// Upload `text` and create one synthesis job for `voice`.
    ///
    /// # Errors
    /// `SynthesisError::Upload` or `SynthesisError::Submission`
    async fn submit(&self, text: &str, voice: &VoiceId) -> Result<JobHandle, SynthesisError>;

    /// Single non-blocking status check
    ///
    /// # Errors
    /// `SynthesisError::Poll` when the status could not be read
    async fn poll(&self, job: &JobHandle) -> Result<JobStatus, SynthesisError>;

    /// Download the audio payload of a finished job (MP3)
    ///
    /// # Errors
    /// `SynthesisError::Download`
    async fn fetch(&self, result: &ResultHandle) -> Result<Vec<u8>, SynthesisError>;
}
