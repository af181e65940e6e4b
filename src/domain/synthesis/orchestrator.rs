use super::error::{SynthesisError, UnitFailure};
use super::job::{JobStatus, SynthesisJob};
use crate::domain::script::DialogueUnit;
use crate::domain::shared::SegmentFile;
use crate::domain::voice::VoiceMap;
use crate::infrastructure::repositories::SynthesisJobClient;
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::HashSet;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::Instant;

const DEFAULT_CONCURRENCY_LIMIT: usize = 5;
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
const DEFAULT_JOB_TIMEOUT: Duration = Duration::from_secs(600);
const DEFAULT_MAX_POLL_ERRORS: u32 = 3;

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Simultaneous remote operations (submit, poll call or download)
    pub concurrency_limit: usize,
    pub poll_interval: Duration,
    /// Per-job wait budget, measured from the first poll
    pub job_timeout: Duration,
    /// Consecutive failed status checks tolerated before a job is given up
    pub max_poll_errors: u32,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            job_timeout: DEFAULT_JOB_TIMEOUT,
            max_poll_errors: DEFAULT_MAX_POLL_ERRORS,
        }
    }
}

/// Per-unit outcome of one orchestrator run
#[derive(Debug, Default)]
pub struct SynthesisReport {
    /// Segments written by this run, ascending by index
    pub segments: Vec<SegmentFile>,
    /// Segments that already existed and were not requested again
    pub skipped: Vec<SegmentFile>,
    /// Units that produced no segment, ascending by index
    pub failures: Vec<UnitFailure>,
}

impl SynthesisReport {
    pub fn succeeded_count(&self) -> usize {
        self.segments.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failures.len()
    }

    pub fn failed_indices(&self) -> Vec<usize> {
        self.failures.iter().map(|f| f.index).collect()
    }
}

/// Drives dialogue units through submit, wait and download against a
/// `SynthesisJobClient`, sharing one bounded pool of slots between phases.
///
/// One unit's failure never affects its siblings. The run only fails as a
/// whole when every attempted unit failed.
pub struct JobOrchestrator {
    client: Arc<dyn SynthesisJobClient>,
    voices: VoiceMap,
    settings: OrchestratorSettings,
}

impl JobOrchestrator {
    pub fn new(
        client: Arc<dyn SynthesisJobClient>,
        voices: VoiceMap,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            client,
            voices,
            settings,
        }
    }

    pub fn provider(&self) -> &'static str {
        self.client.provider()
    }

    pub async fn run(
        &self,
        units: Vec<DialogueUnit>,
        output_dir: &Path,
    ) -> Result<SynthesisReport, SynthesisError> {
        tokio::fs::create_dir_all(output_dir).await?;

        let (pending, skipped) = self.partition_existing(units, output_dir).await;
        let mut report = SynthesisReport {
            skipped,
            ..Default::default()
        };

        if pending.is_empty() {
            tracing::info!(
                skipped = report.skipped.len(),
                "All segments already exist, nothing to synthesize"
            );
            return Ok(report);
        }

        let start_time = std::time::Instant::now();
        tracing::info!(
            provider = self.provider(),
            units = pending.len(),
            skipped = report.skipped.len(),
            concurrency = self.settings.concurrency_limit,
            "Starting synthesis run"
        );

        let slots = Semaphore::new(self.settings.concurrency_limit.max(1));

        let submitted = self.submit_all(&pending, &slots, &mut report.failures).await;
        let finished = self.wait_all(submitted, &slots, &mut report.failures).await;
        report.segments = self
            .download_all(finished, output_dir, &slots, &mut report.failures)
            .await;

        report.segments.sort_by_key(|segment| segment.index);
        report.failures.sort_by_key(|failure| failure.index);

        tracing::info!(
            provider = self.provider(),
            succeeded = report.succeeded_count(),
            failed = report.failed_count(),
            skipped = report.skipped.len(),
            latency_secs = start_time.elapsed().as_secs_f64(),
            "Synthesis run finished"
        );

        if report.segments.is_empty() {
            return Err(SynthesisError::AllUnitsFailed {
                failures: report.failures,
            });
        }

        Ok(report)
    }

    /// Drops units whose segment is already on disk, and repeated indices
    async fn partition_existing(
        &self,
        units: Vec<DialogueUnit>,
        output_dir: &Path,
    ) -> (Vec<DialogueUnit>, Vec<SegmentFile>) {
        let mut seen = HashSet::new();
        let mut pending = Vec::new();
        let mut skipped = Vec::new();

        for unit in units {
            if !seen.insert(unit.index) {
                tracing::warn!(index = unit.index, "Duplicate dialogue index, keeping the first");
                continue;
            }

            let segment = SegmentFile::for_unit(output_dir, unit.index);
            if segment.exists().await {
                tracing::debug!(path = %segment.path.display(), "Segment exists, skipping");
                skipped.push(segment);
            } else {
                pending.push(unit);
            }
        }

        (pending, skipped)
    }

    async fn submit_all(
        &self,
        units: &[DialogueUnit],
        slots: &Semaphore,
        failures: &mut Vec<UnitFailure>,
    ) -> Vec<SynthesisJob> {
        let total = units.len();
        let mut in_flight: FuturesUnordered<_> = units
            .iter()
            .map(|unit| async move {
                let outcome = with_slot(slots, self.submit_unit(unit)).await;
                (unit.index, outcome)
            })
            .collect();

        let mut jobs = Vec::with_capacity(total);
        while let Some((index, outcome)) = in_flight.next().await {
            match outcome {
                Ok(job) => {
                    tracing::info!(
                        part = index + 1,
                        total = total,
                        job_id = %job.remote_job_id,
                        "Submitted"
                    );
                    jobs.push(job);
                }
                Err(error) => {
                    tracing::warn!(
                        part = index + 1,
                        kind = error.kind(),
                        error = %error,
                        "Submission failed"
                    );
                    failures.push(UnitFailure::new(index, error));
                }
            }
        }

        tracing::info!(submitted = jobs.len(), total = total, "Submit phase complete");
        jobs
    }

    async fn submit_unit(&self, unit: &DialogueUnit) -> Result<SynthesisJob, SynthesisError> {
        let voice = self.voices.lookup(unit.speaker)?;
        let handle = self.client.submit(&unit.text, voice).await?;
        Ok(SynthesisJob::submitted(unit.index, handle))
    }

    /// Every job waits in its own loop, so slow jobs never hold back fast ones
    async fn wait_all(
        &self,
        jobs: Vec<SynthesisJob>,
        slots: &Semaphore,
        failures: &mut Vec<UnitFailure>,
    ) -> Vec<SynthesisJob> {
        let total = jobs.len();
        let mut waiting: FuturesUnordered<_> = jobs
            .into_iter()
            .map(|job| self.wait_for_job(job, slots))
            .collect();

        let mut finished = Vec::with_capacity(total);
        while let Some(outcome) = waiting.next().await {
            match outcome {
                Ok(job) => {
                    tracing::info!(
                        part = job.unit_index + 1,
                        total = total,
                        state = ?job.state(),
                        "Done"
                    );
                    finished.push(job);
                }
                Err(failure) => {
                    tracing::warn!(
                        part = failure.index + 1,
                        kind = failure.error.kind(),
                        error = %failure.error,
                        "Job failed"
                    );
                    failures.push(failure);
                }
            }
        }

        tracing::info!(completed = finished.len(), total = total, "Wait phase complete");
        finished
    }

    async fn wait_for_job(
        &self,
        mut job: SynthesisJob,
        slots: &Semaphore,
    ) -> Result<SynthesisJob, UnitFailure> {
        tracing::debug!(part = job.unit_index + 1, job_id = %job.remote_job_id, "Waiting");

        let started = Instant::now();
        let mut consecutive_errors = 0u32;

        loop {
            match with_slot(slots, self.client.poll(&job.remote_job_id)).await {
                Ok(JobStatus::Succeeded(result)) => {
                    job.succeed(result);
                    return Ok(job);
                }
                Ok(JobStatus::Failed(reason)) => {
                    job.fail();
                    let error = SynthesisError::RemoteJobFailure {
                        job_id: job.remote_job_id.0.clone(),
                        reason,
                    };
                    return Err(UnitFailure::new(job.unit_index, error));
                }
                Ok(JobStatus::Pending) => {
                    consecutive_errors = 0;
                    job.mark_pending();
                }
                Err(error) => {
                    consecutive_errors += 1;
                    tracing::warn!(
                        part = job.unit_index + 1,
                        attempt = consecutive_errors,
                        error = %error,
                        "Status check failed"
                    );
                    if consecutive_errors >= self.settings.max_poll_errors.max(1) {
                        job.fail();
                        return Err(UnitFailure::new(job.unit_index, error));
                    }
                }
            }

            if started.elapsed() >= self.settings.job_timeout {
                tracing::debug!(part = job.unit_index + 1, state = ?job.state(), "Giving up on job");
                job.fail();
                let error = SynthesisError::PollTimeout {
                    job_id: job.remote_job_id.0.clone(),
                    waited_secs: self.settings.job_timeout.as_secs(),
                };
                return Err(UnitFailure::new(job.unit_index, error));
            }

            tokio::time::sleep(self.settings.poll_interval).await;
        }
    }

    async fn download_all(
        &self,
        jobs: Vec<SynthesisJob>,
        output_dir: &Path,
        slots: &Semaphore,
        failures: &mut Vec<UnitFailure>,
    ) -> Vec<SegmentFile> {
        let total = jobs.len();
        let mut downloads: FuturesUnordered<_> = jobs
            .into_iter()
            .map(|job| async move {
                let outcome = with_slot(slots, self.download_job(&job, output_dir)).await;
                (job.unit_index, outcome)
            })
            .collect();

        let mut segments = Vec::with_capacity(total);
        while let Some((index, outcome)) = downloads.next().await {
            match outcome {
                Ok(segment) => {
                    tracing::info!(
                        part = index + 1,
                        path = %segment.path.display(),
                        "Downloaded"
                    );
                    segments.push(segment);
                }
                Err(error) => {
                    tracing::warn!(
                        part = index + 1,
                        kind = error.kind(),
                        error = %error,
                        "Download failed"
                    );
                    failures.push(UnitFailure::new(index, error));
                }
            }
        }

        segments
    }

    async fn download_job(
        &self,
        job: &SynthesisJob,
        output_dir: &Path,
    ) -> Result<SegmentFile, SynthesisError> {
        let result = job.result_handle().ok_or_else(|| {
            SynthesisError::Download(format!("job {} has no result handle", job.remote_job_id))
        })?;

        let audio = self.client.fetch(result).await?;
        if audio.is_empty() {
            return Err(SynthesisError::Download(format!(
                "empty audio payload for {}",
                result
            )));
        }

        let segment = SegmentFile::for_unit(output_dir, job.unit_index);
        segment.write(&audio).await?;
        Ok(segment)
    }
}

/// Runs `operation` while holding one slot of the run's pool
async fn with_slot<F: Future>(slots: &Semaphore, operation: F) -> F::Output {
    // The pool lives for the whole run and is never closed.
    let _permit = slots.acquire().await.ok();
    operation.await
}
