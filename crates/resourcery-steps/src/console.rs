use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use resourcery_core::{Result, StepError};
use tokio::process::Command;

use crate::layout::ProjectLayout;

/// An invocation of the project's console (scaffold, migrate, seed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    MakeModel {
        name: String,
        with_migration: bool,
    },
    MakeResource {
        name: String,
        soft_deletes: bool,
        view: bool,
    },
    MakePolicy {
        name: String,
        model: String,
    },
    MakeFactory {
        name: String,
        model: String,
    },
    MakeSeeder {
        name: String,
    },
    Migrate,
    Seed {
        class: String,
    },
}

impl ConsoleCommand {
    /// Console arguments after the `artisan` script.
    pub fn args(&self) -> Vec<String> {
        match self {
            ConsoleCommand::MakeModel {
                name,
                with_migration,
            } => {
                let mut args = vec!["make:model".to_string(), name.clone()];
                if *with_migration {
                    args.push("-m".to_string());
                }
                args
            }
            ConsoleCommand::MakeResource {
                name,
                soft_deletes,
                view,
            } => {
                let mut args = vec![
                    "make:filament-resource".to_string(),
                    name.clone(),
                    "--generate".to_string(),
                ];
                if *soft_deletes {
                    args.push("--soft-deletes".to_string());
                }
                if *view {
                    args.push("--view".to_string());
                }
                args
            }
            ConsoleCommand::MakePolicy { name, model } => {
                vec!["make:policy".to_string(), name.clone(), format!("--model={model}")]
            }
            ConsoleCommand::MakeFactory { name, model } => {
                vec!["make:factory".to_string(), name.clone(), format!("--model={model}")]
            }
            ConsoleCommand::MakeSeeder { name } => vec!["make:seeder".to_string(), name.clone()],
            ConsoleCommand::Migrate => vec!["migrate".to_string(), "--force".to_string()],
            ConsoleCommand::Seed { class } => vec![
                "db:seed".to_string(),
                format!("--class={class}"),
                "--force".to_string(),
            ],
        }
    }

    /// The console command name, e.g. `make:model`.
    pub fn name(&self) -> &'static str {
        match self {
            ConsoleCommand::MakeModel { .. } => "make:model",
            ConsoleCommand::MakeResource { .. } => "make:filament-resource",
            ConsoleCommand::MakePolicy { .. } => "make:policy",
            ConsoleCommand::MakeFactory { .. } => "make:factory",
            ConsoleCommand::MakeSeeder { .. } => "make:seeder",
            ConsoleCommand::Migrate => "migrate",
            ConsoleCommand::Seed { .. } => "db:seed",
        }
    }
}

impl fmt::Display for ConsoleCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.args().join(" "))
    }
}

/// Exit status and captured output of a console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleOutput {
    pub status: i32,
    pub output: String,
}

impl ConsoleOutput {
    pub fn ok() -> Self {
        Self {
            status: 0,
            output: String::new(),
        }
    }

    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// The external scaffold generator, schema migrator and seeder.
#[async_trait]
pub trait Console: Send + Sync {
    /// Run one command inside the project. A nonzero exit is reported in
    /// the output, not as an error; errors mean the command never ran.
    async fn run(&self, layout: &ProjectLayout, command: &ConsoleCommand) -> Result<ConsoleOutput>;
}

/// Runs commands through `php artisan`.
#[derive(Debug, Clone)]
pub struct ArtisanConsole {
    php: PathBuf,
    artisan: PathBuf,
}

impl ArtisanConsole {
    pub fn new(php: impl Into<PathBuf>, artisan: impl Into<PathBuf>) -> Self {
        Self {
            php: php.into(),
            artisan: artisan.into(),
        }
    }
}

impl Default for ArtisanConsole {
    fn default() -> Self {
        Self::new("php", "artisan")
    }
}

#[async_trait]
impl Console for ArtisanConsole {
    async fn run(&self, layout: &ProjectLayout, command: &ConsoleCommand) -> Result<ConsoleOutput> {
        tracing::debug!(command = %command, "running artisan");
        let output = Command::new(&self.php)
            .arg(&self.artisan)
            .args(command.args())
            .arg("--no-interaction")
            .current_dir(layout.root())
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|err| {
                StepError::Execution(format!("failed to start {}: {err}", command.name()))
            })?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(ConsoleOutput {
            status: output.status.code().unwrap_or(-1),
            output: text.trim().to_string(),
        })
    }
}
