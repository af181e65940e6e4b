pub mod error;
pub mod job;
pub mod orchestrator;

pub use error::{SynthesisError, UnitFailure};
pub use job::{JobHandle, JobState, JobStatus, ResultHandle, SynthesisJob};
pub use orchestrator::{JobOrchestrator, OrchestratorSettings, SynthesisReport};
