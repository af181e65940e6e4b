pub mod assembler;
pub mod error;

pub use assembler::{AudioAssembler, MergeOutcome};
pub use error::AssemblyError;

use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Joins audio files end to end into one output file
#[async_trait]
pub trait AudioConcatenator: Send + Sync {
    /// Concatenate `inputs` in the given order into `output`.
    ///
    /// # Errors
    /// `AssemblyError::MergeFailure` when the underlying tool fails
    async fn concat(&self, inputs: &[PathBuf], output: &Path) -> Result<(), AssemblyError>;

    /// Whether the concatenator can run on this host
    async fn probe(&self) -> bool {
        true
    }
}
