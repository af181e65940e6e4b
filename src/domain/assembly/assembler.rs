use super::{AssemblyError, AudioConcatenator};
use crate::domain::shared::{scan_segments, SegmentFile};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Output already existed and was left untouched
    Skipped,
    Merged { inputs: usize },
}

/// Reassembles segment files into one ordered audio file.
///
/// Ordering comes from the index embedded in each segment's file name, never
/// from the order the caller passes or the directory listing returns.
pub struct AudioAssembler {
    concatenator: Arc<dyn AudioConcatenator>,
}

impl AudioAssembler {
    pub fn new(concatenator: Arc<dyn AudioConcatenator>) -> Self {
        Self { concatenator }
    }

    pub async fn probe(&self) -> bool {
        self.concatenator.probe().await
    }

    pub async fn merge(
        &self,
        segment_files: &[PathBuf],
        output: &Path,
        skip_if_exists: bool,
    ) -> Result<MergeOutcome, AssemblyError> {
        if skip_if_exists && file_exists(output).await {
            tracing::info!(output = %output.display(), "Output exists, skipping merge");
            return Ok(MergeOutcome::Skipped);
        }

        if segment_files.is_empty() {
            return Err(AssemblyError::NoSegments);
        }

        let mut segments = Vec::with_capacity(segment_files.len());
        for path in segment_files {
            if !file_exists(path).await {
                return Err(AssemblyError::MissingInput(path.clone()));
            }
            let segment = SegmentFile::from_path(path)
                .ok_or_else(|| AssemblyError::UnrecognizedSegment(path.clone()))?;
            segments.push(segment);
        }
        segments.sort_by_key(|segment| segment.index);

        let ordered: Vec<PathBuf> = segments.into_iter().map(|segment| segment.path).collect();
        self.concat_atomically(&ordered, output).await?;

        tracing::info!(
            segments = ordered.len(),
            output = %output.display(),
            "Merged segments"
        );

        Ok(MergeOutcome::Merged {
            inputs: ordered.len(),
        })
    }

    /// Prepends `intro` to `body`. Both inputs are checked before any output
    /// is created.
    pub async fn merge_with_intro(
        &self,
        intro: &Path,
        body: &Path,
        output: &Path,
        skip_if_exists: bool,
    ) -> Result<MergeOutcome, AssemblyError> {
        for input in [intro, body] {
            if !file_exists(input).await {
                return Err(AssemblyError::MissingInput(input.to_path_buf()));
            }
        }

        if skip_if_exists && file_exists(output).await {
            tracing::info!(output = %output.display(), "Output exists, skipping intro merge");
            return Ok(MergeOutcome::Skipped);
        }

        let inputs = [intro.to_path_buf(), body.to_path_buf()];
        self.concat_atomically(&inputs, output).await?;

        tracing::info!(
            intro = %intro.display(),
            output = %output.display(),
            "Prepended intro"
        );

        Ok(MergeOutcome::Merged {
            inputs: inputs.len(),
        })
    }

    /// Merges whatever segment files `dir` currently holds
    pub async fn merge_directory(
        &self,
        dir: &Path,
        output: &Path,
        skip_if_exists: bool,
    ) -> Result<MergeOutcome, AssemblyError> {
        if skip_if_exists && file_exists(output).await {
            tracing::info!(output = %output.display(), "Output exists, skipping merge");
            return Ok(MergeOutcome::Skipped);
        }

        if !file_exists(dir).await {
            return Err(AssemblyError::NoSegments);
        }

        let paths: Vec<PathBuf> = scan_segments(dir)
            .await?
            .into_iter()
            .map(|segment| segment.path)
            .collect();

        self.merge(&paths, output, false).await
    }

    async fn concat_atomically(&self, inputs: &[PathBuf], output: &Path) -> Result<(), AssemblyError> {
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let staging = staging_path(output);
        if let Err(err) = self.concatenator.concat(inputs, &staging).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(err);
        }

        if let Err(err) = tokio::fs::rename(&staging, output).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(err.into());
        }

        Ok(())
    }
}

/// `episode.mp3` is staged as `episode.partial.mp3` so the concatenator still
/// sees the real extension.
fn staging_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "merged".to_string());
    let name = match output.extension() {
        Some(ext) => format!("{}.partial.{}", stem, ext.to_string_lossy()),
        None => format!("{}.partial", stem),
    };
    output.with_file_name(name)
}

async fn file_exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}
