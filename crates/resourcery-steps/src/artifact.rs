use std::path::Path;

use resourcery_core::{
    FieldSpec, Result, RolePermissions, StepError, ValidationReport, validate_entity_name,
    validate_fields, validate_role_permissions,
};
use resourcery_mutate::{Mutation, rewrite};

use crate::console::ConsoleCommand;
use crate::executor::StepEnv;

/// Run a scaffold command, mapping a nonzero exit to `failure`.
pub(crate) async fn scaffold(env: &StepEnv, command: ConsoleCommand, failure: &str) -> Result<()> {
    let output = env.console.run(&env.layout, &command).await?;
    if output.success() {
        return Ok(());
    }
    tracing::warn!(
        event = "console_failed",
        command = %command,
        status = output.status,
        output = %output.output
    );
    Err(StepError::Execution(failure.to_string()))
}

pub(crate) async fn require(path: &Path, missing: &str) -> Result<()> {
    if tokio::fs::try_exists(path).await? {
        Ok(())
    } else {
        Err(StepError::ArtifactMissing(missing.to_string()))
    }
}

pub(crate) async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

/// Apply `mutations` to the file at `path` in place.
pub(crate) async fn mutate(path: &Path, label: &str, mutations: &[Mutation]) -> Result<()> {
    let original = tokio::fs::read_to_string(path).await?;
    let rewritten = rewrite(&original, mutations).map_err(|err| StepError::mutation(label, err))?;
    tokio::fs::write(path, rewritten).await?;
    tracing::debug!(path = %path.display(), mutations = mutations.len(), "artifact rewritten");
    Ok(())
}

pub(crate) fn display(path: &Path) -> String {
    path.display().to_string()
}

/// Reject an entity name that is not a PascalCase identifier. Every path and
/// class name a step derives comes from it.
pub(crate) fn check_entity(entity: &str) -> Result<()> {
    into_result(validate_entity_name(entity))
}

/// Reject a field schema that fails validation. Warnings are logged.
pub(crate) fn check_fields(fields: &[FieldSpec]) -> Result<()> {
    into_result(validate_fields(fields))
}

pub(crate) fn check_roles(permissions: &RolePermissions) -> Result<()> {
    into_result(validate_role_permissions(permissions))
}

fn into_result(report: ValidationReport) -> Result<()> {
    for warning in &report.warnings {
        tracing::warn!(code = %warning.code, path = %warning.path, "{}", warning.message);
    }
    if report.is_ok() {
        Ok(())
    } else {
        Err(StepError::Validation(report))
    }
}
