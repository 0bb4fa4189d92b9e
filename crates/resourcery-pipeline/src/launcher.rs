use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use resourcery_channel::{ChannelError, StepInvocation, StepLauncher, StepTask};
use resourcery_core::GenerationRequest;
use resourcery_steps::{StepEnv, run_step};
use tokio::process::Command;

/// Runs steps on tokio tasks inside the current process.
#[derive(Clone)]
pub struct InProcessLauncher {
    env: StepEnv,
}

impl InProcessLauncher {
    pub fn new(env: StepEnv) -> Self {
        Self { env }
    }

    pub fn env(&self) -> &StepEnv {
        &self.env
    }
}

#[async_trait]
impl StepLauncher for InProcessLauncher {
    async fn launch(&self, invocation: StepInvocation) -> resourcery_channel::Result<StepTask> {
        // nested steps launch the same way
        let env = self.env.clone().with_launcher(Arc::new(self.clone()));
        tracing::debug!(step = %invocation.kind, step_id = %invocation.step_id, "launching in process");
        let handle = tokio::spawn(async move {
            run_step(&env, &invocation).await;
        });
        Ok(StepTask::local(handle))
    }
}

/// Re-invokes a `resourcery` binary for every step.
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    program: PathBuf,
    global_args: Vec<String>,
}

impl ProcessLauncher {
    /// `global_args` go before the subcommand (e.g. `--project <dir>`).
    pub fn new(program: impl Into<PathBuf>, global_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            global_args,
        }
    }

    /// Launcher for the running executable.
    pub fn current(global_args: Vec<String>) -> std::io::Result<Self> {
        Ok(Self::new(std::env::current_exe()?, global_args))
    }

    /// Start `master` for a whole request. The pipeline reports through the
    /// process result file named by `process_id`.
    pub fn launch_master(
        &self,
        request: &GenerationRequest,
        process_id: &str,
    ) -> resourcery_channel::Result<StepTask> {
        self.spawn(master_args(request, process_id)?)
    }

    fn spawn(&self, args: Vec<String>) -> resourcery_channel::Result<StepTask> {
        tracing::debug!(program = %self.program.display(), args = ?args, "spawning step process");
        let child = Command::new(&self.program)
            .args(&self.global_args)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| ChannelError::Launch(format!("{}: {err}", self.program.display())))?;
        Ok(StepTask::child(child))
    }
}

#[async_trait]
impl StepLauncher for ProcessLauncher {
    async fn launch(&self, invocation: StepInvocation) -> resourcery_channel::Result<StepTask> {
        self.spawn(invocation.to_args()?)
    }
}

/// Arguments of the `master` subcommand for `request`.
pub fn master_args(request: &GenerationRequest, process_id: &str) -> serde_json::Result<Vec<String>> {
    let mut args = vec![
        "master".to_string(),
        request.entity_name.clone(),
        request.fields_json()?,
        process_id.to_string(),
    ];
    if request.soft_deletes {
        args.push("--soft-deletes".to_string());
    }
    if request.flags.factory_seeder {
        args.push("--generate-factory-seeder".to_string());
    }
    if request.flags.view_page {
        args.push("--generate-view".to_string());
    }
    Ok(args)
}

#[cfg(test)]
mod tests {
    use resourcery_core::{FieldSpec, FieldType, GenerationFlags};

    use super::*;

    #[test]
    fn master_args_carry_flags() {
        let request = GenerationRequest::new("Post", vec![FieldSpec::new("title", FieldType::String)])
            .with_soft_deletes(true)
            .with_flags(GenerationFlags {
                factory_seeder: true,
                view_page: false,
            });
        let args = master_args(&request, "proc_1").expect("args");
        assert_eq!(&args[..2], ["master", "Post"]);
        assert_eq!(args[3], "proc_1");
        assert!(args.contains(&"--soft-deletes".to_string()));
        assert!(args.contains(&"--generate-factory-seeder".to_string()));
        assert!(!args.contains(&"--generate-view".to_string()));
    }
}
