use crate::domain::assembly::{AssemblyError, AudioConcatenator};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Lines of stderr kept in a `MergeFailure`
const DIAGNOSTIC_TAIL_LINES: usize = 20;

/// Concatenates MP3 files with the ffmpeg concat demuxer, re-encoding to
/// 44.1 kHz stereo.
pub struct FfmpegConcatenator {
    program: String,
}

impl FfmpegConcatenator {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn list_path(output: &Path) -> PathBuf {
        let stem = output
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        output.with_file_name(format!("{}_concat_list.txt", stem))
    }

    async fn run(&self, list: &Path, output: &Path) -> Result<(), AssemblyError> {
        let result = Command::new(&self.program)
            .arg("-y")
            .args(["-f", "concat", "-safe", "0", "-i"])
            .arg(list)
            .args(["-acodec", "libmp3lame", "-q:a", "2", "-ar", "44100", "-ac", "2"])
            .arg(output)
            .kill_on_drop(true)
            .output()
            .await;

        let output_result = match result {
            Ok(output_result) => output_result,
            Err(e) => {
                tracing::error!(program = %self.program, error = %e, "Failed to start ffmpeg");
                return Err(AssemblyError::MergeFailure {
                    status: "not started".to_string(),
                    diagnostics: e.to_string(),
                });
            }
        };

        if !output_result.status.success() {
            let diagnostics = stderr_tail(&output_result.stderr);
            tracing::error!(
                status = %output_result.status,
                diagnostics = %diagnostics,
                "ffmpeg exited with failure"
            );
            return Err(AssemblyError::MergeFailure {
                status: output_result.status.to_string(),
                diagnostics,
            });
        }

        Ok(())
    }
}

#[async_trait]
impl AudioConcatenator for FfmpegConcatenator {
    async fn concat(&self, inputs: &[PathBuf], output: &Path) -> Result<(), AssemblyError> {
        let mut absolute = Vec::with_capacity(inputs.len());
        for input in inputs {
            absolute.push(tokio::fs::canonicalize(input).await?);
        }

        let list = Self::list_path(output);
        tokio::fs::write(&list, render_concat_list(&absolute)).await?;

        tracing::debug!(
            inputs = inputs.len(),
            list = %list.display(),
            output = %output.display(),
            "Running ffmpeg concat"
        );

        let result = self.run(&list, output).await;
        if let Err(e) = tokio::fs::remove_file(&list).await {
            tracing::warn!(list = %list.display(), error = %e, "Failed to remove concat list");
        }
        result
    }

    async fn probe(&self) -> bool {
        Command::new(&self.program)
            .arg("-version")
            .output()
            .await
            .map(|out| out.status.success())
            .unwrap_or(false)
    }
}

/// One `file '<path>'` line per input, in order
pub fn render_concat_list(inputs: &[PathBuf]) -> String {
    inputs
        .iter()
        .map(|path| {
            let escaped = path.to_string_lossy().replace('\'', "'\\''");
            format!("file '{}'\n", escaped)
        })
        .collect()
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(DIAGNOSTIC_TAIL_LINES);
    lines[start..].join("\n")
}
