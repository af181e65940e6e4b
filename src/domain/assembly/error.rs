use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum AssemblyError {
    #[error("audio merge failed ({status}): {diagnostics}")]
    MergeFailure { status: String, diagnostics: String },
    #[error("input audio not found: {}", .0.display())]
    MissingInput(PathBuf),
    #[error("no segments to merge")]
    NoSegments,
    #[error("not a segment file name: {}", .0.display())]
    UnrecognizedSegment(PathBuf),
    #[error("audio file error: {0}")]
    Io(#[from] std::io::Error),
}
