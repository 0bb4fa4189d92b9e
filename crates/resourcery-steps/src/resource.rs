use std::path::Path;

use async_trait::async_trait;
use resourcery_channel::{StepInvocation, StepKind, new_step_id};
use resourcery_core::{Result, StepError, StepResult};
use resourcery_mutate::{Anchor, Mutation};

use crate::artifact::{check_entity, display, exists, mutate, require, scaffold};
use crate::console::ConsoleCommand;
use crate::executor::{StepEnv, StepExecutor};

const STOCK_NAVIGATION_ICON: &str =
    "protected static ?string $navigationIcon = 'heroicon-o-rectangle-stack';";
const EDIT_ROW_ACTION: &str = "                Tables\\Actions\\EditAction::make(),";

const REDIRECT_METHOD: &str = "
    protected function getRedirectUrl(): string
    {
        return $this->previousUrl ?? $this->getResource()::getUrl('index');
    }";

const CREATED_TITLE_METHOD: &str = "
    protected function getCreatedNotificationTitle(): ?string
    {
        return 'Record created successfully';
    }";

const SAVED_TITLE_METHOD: &str = "
    protected function getSavedNotificationTitle(): ?string
    {
        return 'Record updated successfully';
    }";

/// `generate-resource`: scaffolds the admin resource and its pages, then
/// sets navigation, row actions and page behaviour.
#[derive(Debug, Default)]
pub struct ResourceStep;

#[async_trait]
impl StepExecutor for ResourceStep {
    fn kind(&self) -> StepKind {
        StepKind::Resource
    }

    async fn execute(&self, env: &StepEnv, invocation: &StepInvocation) -> Result<StepResult> {
        check_entity(&invocation.entity)?;
        let entity = invocation.entity.as_str();

        scaffold(
            env,
            ConsoleCommand::MakeResource {
                name: entity.to_string(),
                soft_deletes: invocation.soft_deletes,
                view: invocation.view_page,
            },
            "Failed to generate Filament resource",
        )
        .await?;

        let resource_path = env.layout.resource_path(entity);
        require(&resource_path, "Resource file was not created").await?;

        mutate(
            &resource_path,
            "resource navigation",
            &[Mutation::replace(
                Anchor::loose(STOCK_NAVIGATION_ICON),
                navigation_properties(entity),
            )],
        )
        .await?;

        // failures past this point only warn
        mutate_or_warn(
            &resource_path,
            "resource table actions",
            &[Mutation::replace(
                Anchor::literal(EDIT_ROW_ACTION),
                row_actions(invocation.soft_deletes),
            )],
        )
        .await;

        let create_page = env.layout.create_page_path(entity);
        if exists(&create_page).await {
            mutate_or_warn(&create_page, "create page", &create_page_mutations()?).await;
        }

        let edit_page = env.layout.edit_page_path(entity);
        if exists(&edit_page).await {
            let mutations = edit_page_mutations(&tokio::fs::read_to_string(&edit_page).await?);
            mutate_or_warn(&edit_page, "edit page", &mutations).await;
        }

        let view_page = env.layout.view_page_path(entity);
        let view_exists = invocation.view_page && exists(&view_page).await;
        if view_exists && !invocation.fields.is_empty() {
            generate_view_schema(env, invocation).await;
        }

        let mut result = StepResult::success("Filament resource generated and modified successfully")
            .with("resourcePath", display(&resource_path))
            .with("createPagePath", display(&create_page))
            .with("editPagePath", display(&edit_page));
        if view_exists {
            result = result.with("viewPagePath", display(&view_page));
        }
        Ok(result)
    }
}

fn navigation_properties(entity: &str) -> String {
    format!(
        "protected static ?string $navigationGroup = '{entity}';\n\n    \
         protected static ?int $navigationSort = 1;\n\n    \
         protected static ?string $navigationIcon = 'heroicon-s-arrow-path';"
    )
}

/// Edit and delete, plus force-delete and restore for soft-deleting entities.
fn row_actions(soft_deletes: bool) -> String {
    let mut actions = vec![
        EDIT_ROW_ACTION.to_string(),
        "                Tables\\Actions\\DeleteAction::make(),".to_string(),
    ];
    if soft_deletes {
        actions.push("                Tables\\Actions\\ForceDeleteAction::make(),".to_string());
        actions.push("                Tables\\Actions\\RestoreAction::make(),".to_string());
    }
    actions.join("\n")
}

fn create_page_mutations() -> Result<Vec<Mutation>> {
    let resource_property = Anchor::pattern(r"protected static string \$resource[^;]+;")
        .map_err(|err| StepError::mutation("create page", err))?;
    Ok(vec![
        Mutation::insert_after(
            resource_property,
            "\n\n    protected static bool $canCreateAnother = false;",
        ),
        Mutation::append_to_class(format!("\n{REDIRECT_METHOD}\n{CREATED_TITLE_METHOD}")),
    ])
}

fn edit_page_mutations(contents: &str) -> Vec<Mutation> {
    let methods = format!("{REDIRECT_METHOD}\n{SAVED_TITLE_METHOD}");
    let header_actions = Anchor::loose("protected function getHeaderActions(): array");
    if header_actions.is_present(contents) {
        vec![Mutation::insert_before(
            header_actions,
            format!("{}\n\n    ", methods.trim_start()),
        )]
    } else {
        vec![Mutation::append_to_class(format!("\n{methods}"))]
    }
}

async fn mutate_or_warn(path: &Path, label: &str, mutations: &[Mutation]) {
    if let Err(err) = mutate(path, label, mutations).await {
        tracing::warn!(event = "customization_skipped", path = %path.display(), error = %err);
    }
}

/// Run the view-schema step as its own step and wait on its result. Any
/// failure is logged and otherwise ignored.
async fn generate_view_schema(env: &StepEnv, invocation: &StepInvocation) {
    let Some(launcher) = env.launcher.as_ref() else {
        tracing::warn!(event = "view_schema_skipped", "no step launcher configured");
        return;
    };

    let step_id = new_step_id();
    let nested = StepInvocation::new(StepKind::ViewPage, step_id.clone(), invocation.entity.clone())
        .with_fields(invocation.fields.clone());
    let task = match launcher.launch(nested).await {
        Ok(task) => task,
        Err(err) => {
            tracing::warn!(event = "view_schema_failed", step_id = %step_id, error = %err);
            return;
        }
    };

    let result = env.channel.await_step(task, &step_id, env.step_timeout).await;
    if result.success {
        tracing::info!(event = "view_schema_generated", step_id = %step_id);
    } else {
        tracing::warn!(
            event = "view_schema_failed",
            step_id = %step_id,
            message = %result.message,
            "view page was created but infolist generation had issues"
        );
    }
}
