use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;
use resourcery_channel::{StepInvocation, StepKind};
use resourcery_core::naming::table_name;
use resourcery_core::{FieldSpec, Result, StepError, StepResult};
use resourcery_mutate::{Anchor, Mutation};

use crate::artifact::{check_entity, check_fields, display, mutate};
use crate::console::ConsoleCommand;
use crate::executor::{StepEnv, StepExecutor};

/// `generate-migration`: fills the entity's create-table migration with one
/// column line per field.
#[derive(Debug, Default)]
pub struct MigrationStep;

#[async_trait]
impl StepExecutor for MigrationStep {
    fn kind(&self) -> StepKind {
        StepKind::Migration
    }

    async fn execute(&self, env: &StepEnv, invocation: &StepInvocation) -> Result<StepResult> {
        check_entity(&invocation.entity)?;
        check_fields(&invocation.fields)?;
        let table = table_name(&invocation.entity);

        let path = latest_migration(&env.layout.migrations_dir(), &table)
            .await?
            .ok_or_else(|| StepError::ArtifactMissing("Migration file not found".to_string()))?;

        let lines = column_lines(&invocation.fields, invocation.soft_deletes);
        let mutation = Mutation::replace_between(
            Anchor::loose("$table->id();"),
            Anchor::loose("$table->timestamps();"),
            format!("\n{}\n            ", lines.join("\n")),
        );
        mutate(&path, "migration file", &[mutation]).await?;

        tracing::info!(
            event = "migration_modified",
            table = %table,
            path = %path.display(),
            columns = lines.len()
        );
        Ok(StepResult::success("Migration modified successfully")
            .with("migrationPath", display(&path))
            .with("columns", lines.len() as u64))
    }
}

/// `apply-migration`: runs the schema migrator.
#[derive(Debug, Default)]
pub struct ApplyMigrationStep;

#[async_trait]
impl StepExecutor for ApplyMigrationStep {
    fn kind(&self) -> StepKind {
        StepKind::ApplyMigration
    }

    async fn execute(&self, env: &StepEnv, _invocation: &StepInvocation) -> Result<StepResult> {
        let output = env.console.run(&env.layout, &ConsoleCommand::Migrate).await?;
        if !output.success() {
            tracing::warn!(event = "migrate_failed", status = output.status, output = %output.output);
            return Err(StepError::Execution(format!(
                "Migration command failed with exit code: {}",
                output.status
            )));
        }
        Ok(StepResult::success("Migration executed successfully").with("output", output.output))
    }
}

/// One `$table->...;` line per field, plus `softDeletes()` when requested.
pub fn column_lines(fields: &[FieldSpec], soft_deletes: bool) -> Vec<String> {
    let mut lines: Vec<String> = fields.iter().map(column_line).collect();
    if soft_deletes {
        lines.push("            $table->softDeletes();".to_string());
    }
    lines
}

fn column_line(field: &FieldSpec) -> String {
    let mut line = format!(
        "            $table->{}('{}')",
        field.field_type.migration_method(),
        field.name
    );
    if field.nullable {
        line.push_str("->nullable()");
    }
    if field.unique {
        line.push_str("->unique()");
    }
    if let Some(default) = &field.default {
        line.push_str(&format!("->default({})", default.php_literal(field.field_type)));
    }
    line.push(';');
    line
}

/// Newest `*create_<table>_table*` migration by modification time, ties
/// broken by file name (and so by its timestamp prefix).
async fn latest_migration(dir: &Path, table: &str) -> Result<Option<PathBuf>> {
    let needle = format!("create_{table}_table");
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };

    let mut best: Option<(SystemTime, String, PathBuf)> = None;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.contains(&needle) {
            continue;
        }
        let metadata = entry.metadata().await?;
        if !metadata.is_file() {
            continue;
        }
        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        let newer = match &best {
            Some((best_time, best_name, _)) => (modified, &name) > (*best_time, best_name),
            None => true,
        };
        if newer {
            best = Some((modified, name, entry.path()));
        }
    }
    Ok(best.map(|(_, _, path)| path))
}
