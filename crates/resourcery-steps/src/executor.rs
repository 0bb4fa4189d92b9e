use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use resourcery_channel::{ResultChannel, StepInvocation, StepKind, StepLauncher};
use resourcery_core::{Result, StepError, StepResult};
use tokio::task::JoinHandle;

use crate::DEFAULT_SEED_COUNT;
use crate::console::Console;
use crate::factory_seeder::FactorySeederStep;
use crate::layout::ProjectLayout;
use crate::migration::{ApplyMigrationStep, MigrationStep};
use crate::model::ModelStep;
use crate::policy::PolicyStep;
use crate::resource::ResourceStep;
use crate::view_page::ViewPageStep;

/// Shared context for every step.
#[derive(Clone)]
pub struct StepEnv {
    pub layout: ProjectLayout,
    pub console: Arc<dyn Console>,
    pub channel: ResultChannel,
    /// Starts nested steps (the resource step's view page).
    pub launcher: Option<Arc<dyn StepLauncher>>,
    pub step_timeout: Duration,
    pub seed_count: u32,
}

impl StepEnv {
    pub fn new(layout: ProjectLayout, console: Arc<dyn Console>) -> Self {
        let channel = ResultChannel::new(layout.storage_app_dir());
        Self {
            layout,
            console,
            channel,
            launcher: None,
            step_timeout: Duration::from_secs(5),
            seed_count: DEFAULT_SEED_COUNT,
        }
    }

    pub fn with_channel(mut self, channel: ResultChannel) -> Self {
        self.channel = channel;
        self
    }

    pub fn with_launcher(mut self, launcher: Arc<dyn StepLauncher>) -> Self {
        self.launcher = Some(launcher);
        self
    }

    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = timeout;
        self
    }

    pub fn with_seed_count(mut self, count: u32) -> Self {
        self.seed_count = count;
        self
    }
}

/// One generation step.
#[async_trait]
pub trait StepExecutor: Send + Sync {
    fn kind(&self) -> StepKind;

    /// Do the work and describe the outcome. Errors are turned into failed
    /// results by [`run_step`].
    async fn execute(&self, env: &StepEnv, invocation: &StepInvocation) -> Result<StepResult>;
}

static MODEL: ModelStep = ModelStep;
static MIGRATION: MigrationStep = MigrationStep;
static APPLY_MIGRATION: ApplyMigrationStep = ApplyMigrationStep;
static RESOURCE: ResourceStep = ResourceStep;
static VIEW_PAGE: ViewPageStep = ViewPageStep;
static POLICY: PolicyStep = PolicyStep;
static FACTORY_SEEDER: FactorySeederStep = FactorySeederStep;

pub fn executor_for(kind: StepKind) -> &'static dyn StepExecutor {
    match kind {
        StepKind::Model => &MODEL,
        StepKind::Migration => &MIGRATION,
        StepKind::ApplyMigration => &APPLY_MIGRATION,
        StepKind::Resource => &RESOURCE,
        StepKind::ViewPage => &VIEW_PAGE,
        StepKind::Policy => &POLICY,
        StepKind::FactorySeeder => &FACTORY_SEEDER,
    }
}

/// Run a step to completion without publishing, converting errors and
/// panics into a failed result.
pub async fn execute_step(env: &StepEnv, invocation: &StepInvocation) -> StepResult {
    let task_env = env.clone();
    let task_invocation = invocation.clone();
    let handle = tokio::spawn(async move {
        executor_for(task_invocation.kind)
            .execute(&task_env, &task_invocation)
            .await
    });
    let mut guard = AbortOnDrop(handle);

    match (&mut guard.0).await {
        Ok(Ok(result)) => result,
        Ok(Err(err)) => {
            tracing::warn!(
                event = "step_failed",
                step = %invocation.kind,
                step_id = %invocation.step_id,
                error_kind = err.kind(),
                error = %err
            );
            StepResult::from_error(&err)
        }
        Err(join_err) => {
            let message = if join_err.is_panic() {
                panic_message(join_err.into_panic())
            } else {
                "step task was cancelled".to_string()
            };
            tracing::error!(
                event = "step_panicked",
                step = %invocation.kind,
                step_id = %invocation.step_id,
                error = %message
            );
            StepResult::from_error(&StepError::Unhandled(format!("Exception: {message}")))
        }
    }
}

/// Run a step and publish its result under the invocation's step id.
pub async fn run_step(env: &StepEnv, invocation: &StepInvocation) -> StepResult {
    let started = Instant::now();
    tracing::info!(
        event = "step_started",
        step = %invocation.kind,
        step_id = %invocation.step_id,
        entity = %invocation.entity
    );

    let result = execute_step(env, invocation).await;

    if let Err(err) = env.channel.publish_step(&invocation.step_id, &result) {
        tracing::error!(
            event = "step_publish_failed",
            step_id = %invocation.step_id,
            error = %err
        );
    }
    tracing::info!(
        event = "step_finished",
        step = %invocation.kind,
        step_id = %invocation.step_id,
        success = result.success,
        elapsed_ms = started.elapsed().as_millis() as u64,
        message = %result.message
    );
    result
}

/// Aborts the inner task when the outer future is cancelled.
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "step panicked".to_string()
    }
}
