use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use resourcery_core::{ProcessResult, StepError, StepResult};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::time::Instant;

use crate::atomic::create_bytes_atomic;
use crate::error::Result;
use crate::task::StepTask;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// How long a step may keep running after its result was read.
const FINISH_GRACE: Duration = Duration::from_secs(2);

/// Result files under a project's `storage/app` directory.
#[derive(Debug, Clone)]
pub struct ResultChannel {
    dir: PathBuf,
    poll_interval: Duration,
}

impl ResultChannel {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn step_path(&self, step_id: &str) -> PathBuf {
        self.dir.join(format!("builder_step_{step_id}.json"))
    }

    pub fn process_path(&self, process_id: &str) -> PathBuf {
        self.dir.join(format!("builder_result_{process_id}.json"))
    }

    pub fn publish_step(&self, step_id: &str, result: &StepResult) -> Result<PathBuf> {
        publish(&self.step_path(step_id), result)
    }

    pub fn publish_process(&self, process_id: &str, result: &ProcessResult) -> Result<PathBuf> {
        publish(&self.process_path(process_id), result)
    }

    /// Claim and consume a step result. `None` if nothing was published or
    /// the result was already consumed.
    pub fn take_step(&self, step_id: &str) -> Result<Option<StepResult>> {
        take(&self.step_path(step_id))
    }

    pub fn take_process(&self, process_id: &str) -> Result<Option<ProcessResult>> {
        take(&self.process_path(process_id))
    }

    /// Poll for a step result until `timeout`. `None` on timeout.
    pub async fn wait_step(&self, step_id: &str, timeout: Duration) -> Result<Option<StepResult>> {
        self.wait(&self.step_path(step_id), timeout, None).await
    }

    pub async fn wait_process(
        &self,
        process_id: &str,
        timeout: Duration,
    ) -> Result<Option<ProcessResult>> {
        self.wait(&self.process_path(process_id), timeout, None).await
    }

    /// Wait for the result of a running step. On timeout the step is
    /// cancelled and a synthetic failure is returned.
    pub async fn await_step(&self, mut task: StepTask, step_id: &str, timeout: Duration) -> StepResult {
        let path = self.step_path(step_id);
        match self.wait(&path, timeout, Some(&mut task)).await {
            Ok(Some(result)) => {
                task.finish(FINISH_GRACE).await;
                result
            }
            Ok(None) if task.is_finished() => {
                tracing::warn!(event = "step_silent", step_id, "step exited without a result");
                StepResult::failure("Step exited without reporting a result")
            }
            Ok(None) => {
                task.cancel();
                tracing::warn!(
                    event = "step_timeout",
                    step_id,
                    timeout_secs = timeout.as_secs(),
                    "step wait timed out; step cancelled"
                );
                StepResult::from_error(&StepError::Timeout {
                    seconds: timeout.as_secs(),
                })
            }
            Err(err) => {
                task.cancel();
                StepResult::failure(err.to_string())
            }
        }
    }

    /// Wait for the result of a running pipeline. On timeout the pipeline is
    /// cancelled and an error result is returned.
    pub async fn await_process(
        &self,
        mut task: StepTask,
        process_id: &str,
        timeout: Duration,
    ) -> ProcessResult {
        let path = self.process_path(process_id);
        match self.wait(&path, timeout, Some(&mut task)).await {
            Ok(Some(result)) => {
                task.finish(FINISH_GRACE).await;
                result
            }
            Ok(None) if task.is_finished() => {
                ProcessResult::error("Process exited without reporting a result")
            }
            Ok(None) => {
                task.cancel();
                tracing::warn!(
                    event = "process_timeout",
                    process_id,
                    timeout_secs = timeout.as_secs(),
                    "process wait timed out; process cancelled"
                );
                ProcessResult::error(
                    StepError::Timeout {
                        seconds: timeout.as_secs(),
                    }
                    .to_string(),
                )
            }
            Err(err) => {
                task.cancel();
                ProcessResult::error(err.to_string())
            }
        }
    }

    async fn wait<T: DeserializeOwned>(
        &self,
        path: &Path,
        timeout: Duration,
        mut task: Option<&mut StepTask>,
    ) -> Result<Option<T>> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(value) = take(path)? {
                return Ok(Some(value));
            }
            // the producer may have exited right after publishing
            if let Some(task) = task.as_deref_mut() {
                if task.is_finished() {
                    return take(path);
                }
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            tokio::time::sleep(self.poll_interval.min(remaining)).await;
        }
    }
}

fn publish<T: Serialize>(path: &Path, value: &T) -> Result<PathBuf> {
    let data = serde_json::to_vec(value)?;
    create_bytes_atomic(path, &data)?;
    tracing::debug!(path = %path.display(), "result published");
    Ok(path.to_path_buf())
}

fn take<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let claimed = claimed_path(path);
    match std::fs::rename(path, &claimed) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    }

    let contents = std::fs::read(&claimed);
    let removed = std::fs::remove_file(&claimed);
    let contents = contents?;
    removed?;
    Ok(Some(serde_json::from_slice(&contents)?))
}

fn claimed_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(format!(".{}.claimed", std::process::id()));
    path.with_file_name(name)
}
