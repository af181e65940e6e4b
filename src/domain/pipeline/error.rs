use crate::domain::assembly::AssemblyError;
use crate::domain::news::NewsError;
use crate::domain::synthesis::SynthesisError;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("script not found: {}", .0.display())]
    MissingScript(PathBuf),

    #[error("news list not found: {}", .0.display())]
    MissingNews(PathBuf),

    #[error("script at {} contains no dialogue", .0.display())]
    EmptyScript(PathBuf),

    /// 1-based part numbers, as in the segment file names
    #[error("missing segments for parts {parts:?}")]
    MissingSegments { parts: Vec<usize> },

    #[error("news error: {0}")]
    News(NewsError),

    #[error("script writer error: {0}")]
    ScriptWriter(NewsError),

    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    #[error(transparent)]
    Assembly(#[from] AssemblyError),

    #[error("{0} is not configured")]
    Configuration(&'static str),

    #[error("file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
