use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::pipeline::{
    PipelineDriver, PipelineError, PipelineMode, PipelineRequest, PipelineSummary,
};
use crate::domain::shared::{segment_file_name, SegmentFile};
use crate::domain::synthesis::SynthesisError;
use crate::error::{AppError, AppResult};
use crate::infrastructure::http::RequestId;
use tracing::Instrument;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Idle,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentStatus {
    Pending,
    Completed,
    Failed,
}

#[derive(Debug, Clone)]
struct RunState {
    status: RunStatus,
    error: Option<String>,
    /// Unit indices the last run could not synthesize
    failed: HashSet<usize>,
}

impl RunState {
    fn running() -> Self {
        Self {
            status: RunStatus::Running,
            error: None,
            failed: HashSet::new(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SegmentResponse {
    pub index: usize,
    pub file: String,
    pub status: SegmentStatus,
}

#[derive(Debug, Serialize)]
pub struct EpisodeStatusResponse {
    pub date: String,
    pub script: bool,
    pub dialogue_units: usize,
    pub merged: bool,
    pub run_status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub segments: Vec<SegmentResponse>,
}

#[derive(Debug, Serialize)]
pub struct RunAcceptedResponse {
    pub date: String,
    pub run_status: RunStatus,
}

pub struct EpisodeController {
    driver: Arc<PipelineDriver>,
    runs: RwLock<HashMap<String, RunState>>,
}

impl EpisodeController {
    pub fn new(driver: Arc<PipelineDriver>) -> Self {
        Self {
            driver,
            runs: RwLock::new(HashMap::new()),
        }
    }

    /// GET /api/episodes/{date} - Script, segment and run status
    pub async fn get_status(
        State(controller): State<Arc<EpisodeController>>,
        Path(date): Path<String>,
    ) -> AppResult<Json<EpisodeStatusResponse>> {
        validate_date(&date)?;
        let layout = controller.driver.layout(&date);
        let units = controller.driver.episode_units(&date).await?;

        let run = controller.runs.read().await.get(&date).cloned();
        let failed = run.as_ref().map(|r| r.failed.clone()).unwrap_or_default();

        let mut segments = Vec::new();
        for unit in units.iter().flatten() {
            let segment = SegmentFile::for_unit(&layout.splits_dir(), unit.index);
            let status = if segment.exists().await {
                SegmentStatus::Completed
            } else if failed.contains(&unit.index) {
                SegmentStatus::Failed
            } else {
                SegmentStatus::Pending
            };
            segments.push(SegmentResponse {
                index: unit.index,
                file: segment_file_name(unit.index),
                status,
            });
        }

        Ok(Json(EpisodeStatusResponse {
            date: date.clone(),
            script: units.is_some(),
            dialogue_units: units.as_ref().map_or(0, Vec::len),
            merged: tokio::fs::try_exists(layout.final_audio_path())
                .await
                .unwrap_or(false),
            run_status: run.as_ref().map_or(RunStatus::Idle, |r| r.status),
            last_error: run.and_then(|r| r.error),
            segments,
        }))
    }

    /// POST /api/episodes/{date}/audio - Synthesize and merge in the background
    pub async fn start_audio(
        State(controller): State<Arc<EpisodeController>>,
        Extension(request_id): Extension<RequestId>,
        Path(date): Path<String>,
    ) -> AppResult<(StatusCode, Json<RunAcceptedResponse>)> {
        validate_date(&date)?;
        if controller.driver.episode_units(&date).await?.is_none() {
            return Err(AppError::NotFound(format!("no script for episode {}", date)));
        }

        controller.begin_run(&date).await?;

        let background = controller.clone();
        let run_date = date.clone();
        let span = tracing::info_span!("audio_run", request_id = %request_id.0, date = %date);
        tokio::spawn(
            async move {
                let request = PipelineRequest::new(run_date, PipelineMode::AudioOnly);
                let result = background.driver.run(&request).await;
                background.finish_run(&request, &result).await;
            }
            .instrument(span),
        );

        tracing::info!(date = %date, "Audio run accepted");

        Ok((
            StatusCode::ACCEPTED,
            Json(RunAcceptedResponse {
                date,
                run_status: RunStatus::Running,
            }),
        ))
    }

    /// POST /api/episodes/{date}/merge - Merge existing segments now
    ///
    /// Takes the episode's run slot like an audio run. Runs on its own task,
    /// so the slot is released even if the client disconnects.
    pub async fn merge(
        State(controller): State<Arc<EpisodeController>>,
        Path(date): Path<String>,
    ) -> AppResult<Json<PipelineSummary>> {
        validate_date(&date)?;
        controller.begin_run(&date).await?;

        let background = controller.clone();
        let result = tokio::spawn(async move {
            let request = PipelineRequest::new(date, PipelineMode::MergeOnly);
            let result = background.driver.run(&request).await;
            background.finish_run(&request, &result).await;
            result
        })
        .await
        .map_err(|e| AppError::Internal(format!("merge task failed: {}", e)))?;

        Ok(Json(result?))
    }

    async fn begin_run(&self, date: &str) -> AppResult<()> {
        let mut runs = self.runs.write().await;
        if runs.get(date).is_some_and(|run| run.status == RunStatus::Running) {
            return Err(AppError::Conflict(format!("episode {} is already running", date)));
        }
        runs.insert(date.to_string(), RunState::running());
        Ok(())
    }

    async fn finish_run(
        &self,
        request: &PipelineRequest,
        result: &Result<PipelineSummary, PipelineError>,
    ) {
        let date = request.date.as_str();
        let state = match result {
            Ok(summary) => {
                tracing::info!(
                    date = %date,
                    mode = ?request.mode,
                    synthesized = summary.synthesized,
                    "Episode run completed"
                );
                RunState {
                    status: RunStatus::Completed,
                    error: None,
                    failed: summary.failed.iter().copied().collect(),
                }
            }
            Err(err) => {
                tracing::error!(date = %date, mode = ?request.mode, error = %err, "Episode run failed");
                let failed = match err {
                    PipelineError::MissingSegments { parts } => {
                        parts.iter().map(|part| part - 1).collect()
                    }
                    PipelineError::Synthesis(SynthesisError::AllUnitsFailed { failures }) => {
                        failures.iter().map(|f| f.index).collect()
                    }
                    _ => HashSet::new(),
                };
                RunState {
                    status: RunStatus::Failed,
                    error: Some(err.to_string()),
                    failed,
                }
            }
        };

        self.runs.write().await.insert(date.to_string(), state);
    }
}

/// Dates double as directory names, so only `%Y-%m-%d` is accepted
fn validate_date(date: &str) -> AppResult<()> {
    chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| AppError::BadRequest(format!("invalid date '{}', expected YYYY-MM-DD", date)))
}
