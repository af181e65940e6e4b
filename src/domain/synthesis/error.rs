use crate::domain::voice::UnknownSpeakerError;

#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    #[error("upload failed: {0}")]
    Upload(String),
    #[error("job submission failed: {0}")]
    Submission(String),
    #[error("status check failed: {0}")]
    Poll(String),
    #[error("job {job_id} did not finish within {waited_secs}s")]
    PollTimeout { job_id: String, waited_secs: u64 },
    #[error("remote job {job_id} failed: {reason}")]
    RemoteJobFailure { job_id: String, reason: String },
    #[error("download failed: {0}")]
    Download(String),
    #[error(transparent)]
    UnknownSpeaker(#[from] UnknownSpeakerError),
    #[error("segment storage error: {0}")]
    Io(#[from] std::io::Error),
    #[error("all {} dialogue units failed", .failures.len())]
    AllUnitsFailed { failures: Vec<UnitFailure> },
}

impl SynthesisError {
    /// Short machine-readable name used in logs and API responses
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Upload(_) => "upload",
            Self::Submission(_) => "submission",
            Self::Poll(_) => "poll",
            Self::PollTimeout { .. } => "timeout",
            Self::RemoteJobFailure { .. } => "remote_failure",
            Self::Download(_) => "download",
            Self::UnknownSpeaker(_) => "unknown_speaker",
            Self::Io(_) => "io",
            Self::AllUnitsFailed { .. } => "all_failed",
        }
    }
}

/// Outcome of a unit that did not produce a segment
#[derive(Debug, thiserror::Error)]
#[error("unit {index}: {error}")]
pub struct UnitFailure {
    pub index: usize,
    pub error: SynthesisError,
}

impl UnitFailure {
    pub fn new(index: usize, error: SynthesisError) -> Self {
        Self { index, error }
    }
}
