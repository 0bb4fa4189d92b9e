use std::time::Duration;

use resourcery_channel::{ResultChannel, StepInvocation, StepKind, StepLauncher, new_step_id};
use resourcery_core::{
    RolePermissions, StepError, StepResult, validate_entity_name, validate_role_permissions,
};

/// Generate an authorization policy for `entity` as its own step and wait up
/// to `timeout` for the outcome.
pub async fn generate_policy(
    launcher: &dyn StepLauncher,
    channel: &ResultChannel,
    entity: &str,
    permissions: RolePermissions,
    timeout: Duration,
) -> StepResult {
    let mut report = validate_entity_name(entity);
    report.merge(validate_role_permissions(&permissions));
    if !report.is_ok() {
        return StepResult::from_error(&StepError::Validation(report));
    }

    let step_id = new_step_id();
    tracing::info!(
        event = "policy_requested",
        entity,
        step_id = %step_id,
        roles = permissions.roles().count()
    );
    let invocation = StepInvocation::new(StepKind::Policy, step_id.clone(), entity)
        .with_role_permissions(permissions);
    let task = match launcher.launch(invocation).await {
        Ok(task) => task,
        Err(err) => return StepResult::failure(err.to_string()),
    };
    channel.await_step(task, &step_id, timeout).await
}
