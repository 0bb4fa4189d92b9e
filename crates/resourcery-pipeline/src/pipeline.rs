use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use resourcery_channel::{ResultChannel, StepInvocation, StepKind, StepLauncher, StepTask, new_step_id};
use resourcery_core::{
    GenerationRequest, ProcessArtifacts, ProcessResult, StepError, StepResult, validate_request,
};
use resourcery_steps::{DEFAULT_SEED_COUNT, ProjectLayout};

use crate::compensation::{Compensation, CompensationLog};
use crate::error::Result;

pub const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_POLICY_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_PIPELINE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Bound on each step's result wait.
    pub step_timeout: Duration,
    /// Records created by the sample-data step.
    pub seed_count: u32,
    /// Undo artifacts of succeeded steps when a later step fails.
    pub compensate_on_failure: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            step_timeout: DEFAULT_STEP_TIMEOUT,
            seed_count: DEFAULT_SEED_COUNT,
            compensate_on_failure: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Running(StepKind),
    Succeeded,
    /// `step` is `None` when the request was rejected before any step ran.
    Failed { step: Option<StepKind> },
}

impl PipelineState {
    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Succeeded | PipelineState::Failed { .. })
    }
}

/// Runs the generation steps for one request, strictly in order, stopping at
/// the first failure.
pub struct Pipeline {
    launcher: Arc<dyn StepLauncher>,
    channel: ResultChannel,
    layout: ProjectLayout,
    options: PipelineOptions,
    state: PipelineState,
    compensations: CompensationLog,
}

impl Pipeline {
    pub fn new(launcher: Arc<dyn StepLauncher>, layout: ProjectLayout) -> Self {
        let channel = ResultChannel::new(layout.storage_app_dir());
        Self {
            launcher,
            channel,
            layout,
            options: PipelineOptions::default(),
            state: PipelineState::Idle,
            compensations: CompensationLog::new(),
        }
    }

    pub fn with_channel(mut self, channel: ResultChannel) -> Self {
        self.channel = channel;
        self
    }

    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn channel(&self) -> &ResultChannel {
        &self.channel
    }

    /// Run every step for `request`. A pipeline runs once; later calls fail
    /// without touching the project.
    pub async fn run(&mut self, request: &GenerationRequest) -> ProcessResult {
        if self.state != PipelineState::Idle {
            tracing::warn!(event = "pipeline_rerun_rejected", state = ?self.state);
            return ProcessResult::error("Pipeline has already run");
        }

        let started = Instant::now();
        let entity = request.entity_name.as_str();
        tracing::info!(
            event = "pipeline_started",
            entity,
            fields = request.fields.len(),
            soft_deletes = request.soft_deletes,
            view_page = request.flags.view_page,
            factory_seeder = request.flags.factory_seeder
        );

        let report = validate_request(request);
        if !report.is_ok() {
            self.state = PipelineState::Failed { step: None };
            tracing::warn!(event = "pipeline_rejected", entity, issues = report.errors.len());
            return ProcessResult::error(StepError::Validation(report).to_string());
        }

        let mut artifacts = ProcessArtifacts::default();
        let mut stages = vec![
            StepKind::Model,
            StepKind::Migration,
            StepKind::ApplyMigration,
            StepKind::Resource,
        ];
        if request.flags.factory_seeder {
            stages.push(StepKind::FactorySeeder);
        }

        let mut schema_applied = false;
        for kind in stages {
            self.state = PipelineState::Running(kind);
            let fresh = self.fresh_outputs(kind, entity);
            let result = self.dispatch(self.invocation(kind, request)).await;

            if !result.success {
                self.state = PipelineState::Failed { step: Some(kind) };
                return self.fail(kind, &result, fresh, schema_applied, &artifacts);
            }
            self.record(kind, &result, fresh, &mut artifacts);
            if kind == StepKind::ApplyMigration {
                schema_applied = true;
            }
        }

        self.state = PipelineState::Succeeded;
        tracing::info!(
            event = "pipeline_finished",
            entity,
            status = "success",
            duration_ms = started.elapsed().as_millis() as u64
        );
        ProcessResult::success(success_message(request), artifacts)
    }

    /// Run and publish the outcome under `process_id`.
    pub async fn run_and_publish(
        &mut self,
        request: &GenerationRequest,
        process_id: &str,
    ) -> Result<ProcessResult> {
        let result = self.run(request).await;
        self.channel.publish_process(process_id, &result)?;
        Ok(result)
    }

    /// Run on a tokio task that publishes under `process_id`.
    pub fn spawn(mut self, request: GenerationRequest, process_id: String) -> StepTask {
        StepTask::local(tokio::spawn(async move {
            if let Err(err) = self.run_and_publish(&request, &process_id).await {
                tracing::error!(event = "process_publish_failed", process_id = %process_id, error = %err);
            }
        }))
    }

    fn invocation(&self, kind: StepKind, request: &GenerationRequest) -> StepInvocation {
        let invocation = StepInvocation::new(kind, new_step_id(), request.entity_name.clone());
        match kind {
            StepKind::Model | StepKind::Migration => invocation
                .with_fields(request.fields.clone())
                .with_soft_deletes(request.soft_deletes),
            StepKind::Resource => invocation
                .with_fields(request.fields.clone())
                .with_soft_deletes(request.soft_deletes)
                .with_view_page(request.flags.view_page),
            StepKind::FactorySeeder => invocation
                .with_fields(request.fields.clone())
                .with_seed_count(self.options.seed_count),
            StepKind::ApplyMigration | StepKind::ViewPage | StepKind::Policy => invocation,
        }
    }

    async fn dispatch(&self, invocation: StepInvocation) -> StepResult {
        let step_id = invocation.step_id.clone();
        let kind = invocation.kind;
        tracing::info!(event = "step_dispatched", step = %kind, step_id = %step_id);

        let task = match self.launcher.launch(invocation).await {
            Ok(task) => task,
            Err(err) => {
                tracing::error!(event = "step_launch_failed", step = %kind, error = %err);
                return StepResult::failure(err.to_string());
            }
        };
        self.channel
            .await_step(task, &step_id, self.options.step_timeout)
            .await
    }

    /// Outputs of `kind` that do not exist yet, as the compensations that
    /// would remove them.
    fn fresh_outputs(&self, kind: StepKind, entity: &str) -> Vec<Compensation> {
        let candidates = match kind {
            StepKind::Model => vec![Compensation::RemoveFile(self.layout.model_path(entity))],
            StepKind::Resource => vec![
                Compensation::RemoveFile(self.layout.resource_path(entity)),
                Compensation::RemoveDir(self.layout.resource_dir(entity)),
            ],
            StepKind::FactorySeeder => vec![
                Compensation::RemoveFile(self.layout.factory_path(entity)),
                Compensation::RemoveFile(self.layout.seeder_path(entity)),
            ],
            StepKind::Migration
            | StepKind::ApplyMigration
            | StepKind::ViewPage
            | StepKind::Policy => Vec::new(),
        };
        candidates
            .into_iter()
            .filter(|compensation| !compensation.path().exists())
            .collect()
    }

    fn record(
        &mut self,
        kind: StepKind,
        result: &StepResult,
        fresh: Vec<Compensation>,
        artifacts: &mut ProcessArtifacts,
    ) {
        for compensation in fresh {
            self.compensations.register(kind, compensation);
        }
        let path = |key: &str| result.str_field(key).map(str::to_string);
        match kind {
            StepKind::Model => artifacts.model = path("modelPath"),
            StepKind::Migration => {
                artifacts.migration = path("migrationPath");
                if let Some(migration) = &artifacts.migration {
                    self.compensations
                        .register(kind, Compensation::RemoveFile(PathBuf::from(migration)));
                }
            }
            StepKind::ApplyMigration => {
                // the schema change is permanent, so its sources stay too
                self.compensations.forget(StepKind::Model);
                self.compensations.forget(StepKind::Migration);
            }
            StepKind::Resource => {
                artifacts.resource = path("resourcePath");
                artifacts.view_page = path("viewPagePath");
            }
            StepKind::FactorySeeder => {
                artifacts.factory = path("factoryPath");
                artifacts.seeder = path("seederPath");
                artifacts.records_seeded = result.u64_field("recordsCreated");
            }
            StepKind::ViewPage | StepKind::Policy => {}
        }
    }

    fn fail(
        &mut self,
        kind: StepKind,
        result: &StepResult,
        partial: Vec<Compensation>,
        schema_applied: bool,
        artifacts: &ProcessArtifacts,
    ) -> ProcessResult {
        let message = format!("{}{}", failure_label(kind), result.message);
        tracing::warn!(
            event = "pipeline_failed",
            step = %kind,
            schema_applied,
            remaining = ?artifacts,
            message = %message
        );
        if schema_applied {
            tracing::warn!(event = "schema_left_applied", step = %kind, "applied schema change remains in place");
        }
        if self.options.compensate_on_failure {
            for compensation in partial {
                self.compensations.register(kind, compensation);
            }
            let undone = self.compensations.unwind();
            tracing::info!(event = "pipeline_compensated", undone = undone.len());
        }
        ProcessResult::error(message)
    }
}

fn failure_label(kind: StepKind) -> &'static str {
    match kind {
        StepKind::Model => "Model generation failed: ",
        StepKind::Migration => "Migration modification failed: ",
        StepKind::ApplyMigration => "Migration failed: ",
        StepKind::Resource => "Resource generation failed: ",
        StepKind::FactorySeeder => "Factory/Seeder generation failed: ",
        StepKind::ViewPage => "View page generation failed: ",
        StepKind::Policy => "Policy generation failed: ",
    }
}

fn success_message(request: &GenerationRequest) -> &'static str {
    match (request.flags.view_page, request.flags.factory_seeder) {
        (false, false) => "Model, migration, and Filament resource created successfully",
        (true, false) => "Model, migration, Filament resource with view action created successfully",
        (false, true) => "Model, migration, Filament resource, factory, and seeder created successfully",
        (true, true) => {
            "Model, migration, Filament resource with view action, factory, and seeder created successfully"
        }
    }
}
