use serde::{Deserialize, Serialize};

/// Remote identifier of a submitted synthesis job
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobHandle(pub String);

/// Remote identifier of a finished job's audio payload
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResultHandle(pub String);

impl std::fmt::Display for JobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for ResultHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Answer of a single status check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Succeeded(ResultHandle),
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Submitted,
    Pending,
    Succeeded,
    Failed,
}

/// Tracks one dialogue unit's remote job during a single run
#[derive(Debug, Clone)]
pub struct SynthesisJob {
    pub unit_index: usize,
    pub remote_job_id: JobHandle,
    state: JobState,
    result_handle: Option<ResultHandle>,
}

impl SynthesisJob {
    pub fn submitted(unit_index: usize, remote_job_id: JobHandle) -> Self {
        Self {
            unit_index,
            remote_job_id,
            state: JobState::Submitted,
            result_handle: None,
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// Set only once the job has succeeded
    pub fn result_handle(&self) -> Option<&ResultHandle> {
        self.result_handle.as_ref()
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, JobState::Succeeded | JobState::Failed)
    }

    pub fn mark_pending(&mut self) {
        if !self.is_terminal() {
            self.state = JobState::Pending;
        }
    }

    pub fn succeed(&mut self, result: ResultHandle) {
        if !self.is_terminal() {
            self.state = JobState::Succeeded;
            self.result_handle = Some(result);
        }
    }

    pub fn fail(&mut self) {
        if !self.is_terminal() {
            self.state = JobState::Failed;
        }
    }
}
