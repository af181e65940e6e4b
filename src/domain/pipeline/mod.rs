pub mod error;
pub mod layout;
pub mod service;

pub use error::PipelineError;
pub use layout::RunLayout;
pub use service::{
    MergeSummary, PipelineDriver, PipelineMode, PipelineOptions, PipelineRequest, PipelineSummary,
};
