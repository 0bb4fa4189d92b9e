use async_trait::async_trait;
use resourcery_channel::{StepInvocation, StepKind};
use resourcery_core::naming::{camel, prose_plural};
use resourcery_core::{
    PolicyAction, Result, RolePermissions, StepError, StepResult, ValidationIssue,
    ValidationReport,
};
use resourcery_mutate::{Anchor, Mutation};

use crate::artifact::{check_entity, check_roles, display, mutate, require, scaffold};
use crate::console::ConsoleCommand;
use crate::executor::{StepEnv, StepExecutor};

/// Role list rendered when no role may perform an action.
pub const NO_ACCESS_ROLE: &str = "no_access";

/// `generate-policy`: scaffolds the entity policy and rewrites every method
/// as a role check.
#[derive(Debug, Default)]
pub struct PolicyStep;

#[async_trait]
impl StepExecutor for PolicyStep {
    fn kind(&self) -> StepKind {
        StepKind::Policy
    }

    async fn execute(&self, env: &StepEnv, invocation: &StepInvocation) -> Result<StepResult> {
        check_entity(&invocation.entity)?;
        let permissions = match &invocation.role_permissions {
            Some(permissions) => permissions,
            None => {
                let mut report = ValidationReport::default();
                report.push(ValidationIssue::error(
                    "role_permissions_empty",
                    "",
                    "Invalid role permissions format",
                ));
                return Err(StepError::Validation(report));
            }
        };
        check_roles(permissions)?;
        let entity = invocation.entity.as_str();

        scaffold(
            env,
            ConsoleCommand::MakePolicy {
                name: format!("{entity}Policy"),
                model: entity.to_string(),
            },
            "Failed to generate policy",
        )
        .await?;

        let path = env.layout.policy_path(entity);
        require(&path, "Policy file was not created").await?;

        let class = Anchor::pattern(&format!(r"class\s+{entity}Policy\b"))
            .map_err(|err| StepError::mutation("policy", err))?;
        let mutations = [
            Mutation::ensure_import("App\\Models\\User", None),
            Mutation::ensure_import(format!("App\\Models\\{entity}"), None),
            Mutation::replace_block_body(class, format!("\n{}\n", policy_methods(entity, permissions))),
        ];
        mutate(&path, "policy", &mutations).await?;

        tracing::info!(
            event = "policy_modified",
            entity,
            roles = permissions.roles().count()
        );
        Ok(StepResult::success("Policy generated and modified successfully")
            .with("policyPath", display(&path)))
    }
}

/// All ten authorization methods, in fixed order.
pub fn policy_methods(entity: &str, permissions: &RolePermissions) -> String {
    PolicyAction::ALL
        .iter()
        .map(|action| policy_method(entity, *action, &permissions.roles_for(*action)))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn policy_method(entity: &str, action: PolicyAction, roles: &[&str]) -> String {
    let subject = match action {
        PolicyAction::Create => prose_plural(entity),
        _ if action.takes_record() => format!("the {}", entity.to_lowercase()),
        _ => format!("any {}", prose_plural(entity)),
    };
    let record_param = if action.takes_record() {
        format!(", {entity} ${}", camel(entity))
    } else {
        String::new()
    };
    let roles = if roles.is_empty() {
        format!("'{NO_ACCESS_ROLE}'")
    } else {
        roles
            .iter()
            .map(|role| format!("'{role}'"))
            .collect::<Vec<_>>()
            .join(", ")
    };

    format!(
        "    /**\n     * Determine whether the user can {verb} {subject}.\n     */\n    \
         public function {method}(User $user{record_param}): bool\n    {{\n        \
         return $user->hasAnyRole([{roles}]);\n    }}",
        verb = action.verb_phrase(),
        method = action.method_name(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_actions_take_the_model() {
        let method = policy_method("BlogPost", PolicyAction::Update, &["admin", "editor"]);
        assert!(method.contains("Determine whether the user can update the blogpost."));
        assert!(method.contains("public function update(User $user, BlogPost $blogPost): bool"));
        assert!(method.contains("return $user->hasAnyRole(['admin', 'editor']);"));
    }

    #[test]
    fn collection_actions_use_the_plural() {
        let method = policy_method("Post", PolicyAction::ForceDeleteAny, &[]);
        assert!(method.contains("can permanently delete any posts."));
        assert!(method.contains("public function forceDeleteAny(User $user): bool"));
        assert!(method.contains("hasAnyRole(['no_access'])"));

        let create = policy_method("Post", PolicyAction::Create, &["admin"]);
        assert!(create.contains("can create posts."));
    }

    #[test]
    fn every_action_gets_a_method() {
        let permissions = RolePermissions::new().grant("admin", &PolicyAction::ALL);
        let methods = policy_methods("Post", &permissions);
        assert_eq!(methods.matches("public function").count(), 10);
        assert!(!methods.contains("no_access"));
    }
}
