use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use resourcery_core::{FieldSpec, RolePermissions};
use tokio::process::Child;
use tokio::task::JoinHandle;

use crate::error::Result;

/// The independent generation steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    Model,
    Migration,
    ApplyMigration,
    Resource,
    ViewPage,
    Policy,
    FactorySeeder,
}

impl StepKind {
    /// Subcommand that runs this step.
    pub fn command(self) -> &'static str {
        match self {
            StepKind::Model => "generate-model",
            StepKind::Migration => "generate-migration",
            StepKind::ApplyMigration => "apply-migration",
            StepKind::Resource => "generate-resource",
            StepKind::ViewPage => "generate-view-page",
            StepKind::Policy => "generate-policy",
            StepKind::FactorySeeder => "generate-factory-seeder",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.command())
    }
}

/// Everything needed to run one step, in or out of process.
#[derive(Debug, Clone, PartialEq)]
pub struct StepInvocation {
    pub kind: StepKind,
    pub step_id: String,
    pub entity: String,
    pub fields: Vec<FieldSpec>,
    pub soft_deletes: bool,
    pub view_page: bool,
    pub role_permissions: Option<RolePermissions>,
    pub seed_count: Option<u32>,
}

impl StepInvocation {
    pub fn new(kind: StepKind, step_id: impl Into<String>, entity: impl Into<String>) -> Self {
        Self {
            kind,
            step_id: step_id.into(),
            entity: entity.into(),
            fields: Vec::new(),
            soft_deletes: false,
            view_page: false,
            role_permissions: None,
            seed_count: None,
        }
    }

    pub fn with_fields(mut self, fields: Vec<FieldSpec>) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_soft_deletes(mut self, enabled: bool) -> Self {
        self.soft_deletes = enabled;
        self
    }

    pub fn with_view_page(mut self, enabled: bool) -> Self {
        self.view_page = enabled;
        self
    }

    pub fn with_role_permissions(mut self, permissions: RolePermissions) -> Self {
        self.role_permissions = Some(permissions);
        self
    }

    pub fn with_seed_count(mut self, count: u32) -> Self {
        self.seed_count = Some(count);
        self
    }

    /// Command-line arguments for the step subcommand.
    pub fn to_args(&self) -> serde_json::Result<Vec<String>> {
        let mut args = vec![self.kind.command().to_string()];
        let fields = serde_json::to_string(&self.fields)?;
        match self.kind {
            StepKind::Model | StepKind::Migration => {
                args.extend([self.entity.clone(), fields, self.step_id.clone()]);
                if self.soft_deletes {
                    args.push("--soft-deletes".to_string());
                }
            }
            StepKind::ApplyMigration => args.push(self.step_id.clone()),
            StepKind::Resource => {
                args.extend([self.entity.clone(), self.step_id.clone()]);
                if self.soft_deletes {
                    args.push("--soft-deletes".to_string());
                }
                if self.view_page {
                    args.push("--view".to_string());
                }
                if !self.fields.is_empty() {
                    args.extend(["--fields".to_string(), fields]);
                }
            }
            StepKind::ViewPage => {
                args.extend([self.entity.clone(), fields, self.step_id.clone()]);
            }
            StepKind::Policy => {
                let roles = match &self.role_permissions {
                    Some(permissions) => serde_json::to_string(permissions)?,
                    None => "{}".to_string(),
                };
                args.extend([self.entity.clone(), self.step_id.clone(), roles]);
            }
            StepKind::FactorySeeder => {
                args.extend([self.entity.clone(), fields, self.step_id.clone()]);
                if let Some(count) = self.seed_count {
                    args.extend(["--count".to_string(), count.to_string()]);
                }
            }
        }
        Ok(args)
    }
}

/// Starts step invocations.
#[async_trait]
pub trait StepLauncher: Send + Sync {
    /// Start `invocation` and return a handle to the running step. The step
    /// reports its outcome through the result channel, not the handle.
    async fn launch(&self, invocation: StepInvocation) -> Result<StepTask>;
}

/// Handle to a running step.
#[derive(Debug)]
pub struct StepTask {
    handle: TaskHandle,
}

#[derive(Debug)]
enum TaskHandle {
    Local(JoinHandle<()>),
    Child(Child),
    Detached,
}

impl StepTask {
    pub fn local(handle: JoinHandle<()>) -> Self {
        Self {
            handle: TaskHandle::Local(handle),
        }
    }

    pub fn child(child: Child) -> Self {
        Self {
            handle: TaskHandle::Child(child),
        }
    }

    /// A step that cannot be observed or cancelled.
    pub fn detached() -> Self {
        Self {
            handle: TaskHandle::Detached,
        }
    }

    /// True once the underlying task or process has exited.
    pub fn is_finished(&mut self) -> bool {
        match &mut self.handle {
            TaskHandle::Local(handle) => handle.is_finished(),
            TaskHandle::Child(child) => matches!(child.try_wait(), Ok(Some(_))),
            TaskHandle::Detached => false,
        }
    }

    /// Stop the step at its next await point (or kill the child process).
    pub fn cancel(self) {
        match self.handle {
            TaskHandle::Local(handle) => handle.abort(),
            TaskHandle::Child(mut child) => {
                if let Err(err) = child.start_kill() {
                    tracing::warn!(error = %err, "failed to kill step process");
                }
            }
            TaskHandle::Detached => {}
        }
    }

    /// Give a step that already reported its result `grace` to exit, then
    /// cancel it.
    pub async fn finish(self, grace: Duration) {
        match self.handle {
            TaskHandle::Local(mut handle) => {
                if tokio::time::timeout(grace, &mut handle).await.is_err() {
                    handle.abort();
                }
            }
            TaskHandle::Child(mut child) => {
                if tokio::time::timeout(grace, child.wait()).await.is_err() {
                    if let Err(err) = child.start_kill() {
                        tracing::warn!(error = %err, "failed to kill step process");
                    }
                }
            }
            TaskHandle::Detached => {}
        }
    }
}
