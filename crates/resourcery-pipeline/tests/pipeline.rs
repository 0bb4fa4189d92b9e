use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use resourcery_channel::{ResultChannel, StepInvocation, StepKind, StepLauncher, StepTask};
use resourcery_core::{
    FieldSpec, FieldType, GenerationFlags, GenerationRequest, PolicyAction, RolePermissions,
};
use resourcery_pipeline::{
    InProcessLauncher, Pipeline, PipelineOptions, PipelineState, generate_policy,
};
use resourcery_steps::{ProjectLayout, SkeletonConsole, StepEnv};

fn launcher(dir: &std::path::Path, console: SkeletonConsole) -> InProcessLauncher {
    InProcessLauncher::new(StepEnv::new(ProjectLayout::new(dir), Arc::new(console)))
}

fn post_request() -> GenerationRequest {
    GenerationRequest::new(
        "Post",
        vec![
            FieldSpec::new("title", FieldType::String),
            FieldSpec::new("price", FieldType::Decimal),
            FieldSpec::new("is_featured", FieldType::Boolean).nullable(),
        ],
    )
}

/// Delegates to an inner launcher but never reports for `stalled` steps.
struct StallingLauncher {
    inner: InProcessLauncher,
    stalled: StepKind,
}

#[async_trait]
impl StepLauncher for StallingLauncher {
    async fn launch(&self, invocation: StepInvocation) -> resourcery_channel::Result<StepTask> {
        if invocation.kind == self.stalled {
            return Ok(StepTask::local(tokio::spawn(async {
                tokio::time::sleep(Duration::from_secs(60)).await;
            })));
        }
        self.inner.launch(invocation).await
    }
}

#[tokio::test]
async fn post_request_generates_every_artifact() {
    let dir = tempfile::tempdir().expect("tempdir");
    let layout = ProjectLayout::new(dir.path());
    let mut pipeline = Pipeline::new(
        Arc::new(launcher(dir.path(), SkeletonConsole::new())),
        layout.clone(),
    );

    let result = pipeline.run(&post_request()).await;
    assert!(result.is_success(), "{}", result.message);
    assert_eq!(
        result.message,
        "Model, migration, and Filament resource created successfully"
    );
    assert_eq!(pipeline.state(), PipelineState::Succeeded);

    let model = std::fs::read_to_string(layout.model_path("Post")).expect("model");
    assert!(model.contains("'price' => 'decimal:2'"));
    assert!(!model.contains("'is_featured' =>"));
    assert!(!model.contains("'title' =>"));

    let migration_path = result.artifacts.migration.as_deref().expect("migration path");
    let migration = std::fs::read_to_string(migration_path).expect("migration");
    assert!(migration.contains("$table->string('title');"));
    assert!(migration.contains("$table->decimal('price');"));
    assert!(migration.contains("$table->boolean('is_featured')->nullable();"));

    let resource = std::fs::read_to_string(layout.resource_path("Post")).expect("resource");
    assert!(resource.contains("EditAction::make()"));
    assert!(resource.contains("DeleteAction::make()"));
    assert!(!resource.contains("ForceDeleteAction"));
    assert!(result.artifacts.factory.is_none());
}

#[tokio::test]
async fn stalled_resource_times_out_after_schema_applied() {
    let dir = tempfile::tempdir().expect("tempdir");
    let layout = ProjectLayout::new(dir.path());
    let launcher = StallingLauncher {
        inner: launcher(dir.path(), SkeletonConsole::new()),
        stalled: StepKind::Resource,
    };
    let mut pipeline = Pipeline::new(Arc::new(launcher), layout.clone())
        .with_channel(
            ResultChannel::new(layout.storage_app_dir()).with_poll_interval(Duration::from_millis(20)),
        )
        .with_options(PipelineOptions {
            step_timeout: Duration::from_secs(1),
            ..PipelineOptions::default()
        });

    let result = pipeline.run(&post_request()).await;
    assert!(!result.is_success());
    assert!(
        result.message.starts_with("Resource generation failed: "),
        "{}",
        result.message
    );
    assert!(result.message.contains("timed out"));
    assert_eq!(
        pipeline.state(),
        PipelineState::Failed {
            step: Some(StepKind::Resource)
        }
    );
    assert!(layout.model_path("Post").is_file());
    assert!(!layout.resource_path("Post").exists());
}

#[tokio::test]
async fn failed_migrate_stops_before_resource() {
    let dir = tempfile::tempdir().expect("tempdir");
    let layout = ProjectLayout::new(dir.path());
    let mut pipeline = Pipeline::new(
        Arc::new(launcher(dir.path(), SkeletonConsole::new().failing("migrate"))),
        layout.clone(),
    );

    let result = pipeline.run(&post_request()).await;
    assert_eq!(
        result.message,
        "Migration failed: Migration command failed with exit code: 1"
    );
    assert!(!layout.resource_path("Post").exists());
}

#[tokio::test]
async fn invalid_request_runs_no_step() {
    let dir = tempfile::tempdir().expect("tempdir");
    let layout = ProjectLayout::new(dir.path());
    let mut pipeline = Pipeline::new(
        Arc::new(launcher(dir.path(), SkeletonConsole::new())),
        layout.clone(),
    );
    let request = GenerationRequest::new("post", vec![FieldSpec::new("title", FieldType::String)]);

    let result = pipeline.run(&request).await;
    assert!(!result.is_success());
    assert_eq!(pipeline.state(), PipelineState::Failed { step: None });
    assert!(!layout.models_dir().exists());
}

#[tokio::test]
async fn compensation_removes_resource_files_but_keeps_applied_sources() {
    let dir = tempfile::tempdir().expect("tempdir");
    let layout = ProjectLayout::new(dir.path());
    let mut pipeline = Pipeline::new(
        Arc::new(launcher(dir.path(), SkeletonConsole::new().failing("db:seed"))),
        layout.clone(),
    )
    .with_options(PipelineOptions {
        compensate_on_failure: true,
        ..PipelineOptions::default()
    });
    let request = post_request().with_flags(GenerationFlags {
        factory_seeder: true,
        view_page: false,
    });

    let result = pipeline.run(&request).await;
    assert!(
        result.message.starts_with("Factory/Seeder generation failed: "),
        "{}",
        result.message
    );
    assert!(layout.model_path("Post").is_file());
    assert!(!layout.resource_path("Post").exists());
    assert!(!layout.resource_dir("Post").exists());
    assert!(!layout.factory_path("Post").exists());
    assert!(!layout.seeder_path("Post").exists());
}

#[tokio::test]
async fn compensation_keeps_files_that_predate_the_request() {
    let dir = tempfile::tempdir().expect("tempdir");
    let layout = ProjectLayout::new(dir.path());
    std::fs::create_dir_all(layout.resource_pages_dir("Post")).expect("pages dir");
    let custom = layout.resource_pages_dir("Post").join("Custom.php");
    std::fs::write(&custom, "<?php").expect("custom page");

    let mut pipeline = Pipeline::new(
        Arc::new(launcher(dir.path(), SkeletonConsole::new().failing("db:seed"))),
        layout.clone(),
    )
    .with_options(PipelineOptions {
        compensate_on_failure: true,
        ..PipelineOptions::default()
    });
    let request = post_request().with_flags(GenerationFlags {
        factory_seeder: true,
        view_page: false,
    });

    let result = pipeline.run(&request).await;
    assert!(!result.is_success());
    assert!(custom.is_file());
    assert!(!layout.resource_path("Post").exists());
}

#[tokio::test]
async fn pipeline_runs_once() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut pipeline = Pipeline::new(
        Arc::new(launcher(dir.path(), SkeletonConsole::new())),
        ProjectLayout::new(dir.path()),
    );
    assert!(pipeline.run(&post_request()).await.is_success());

    let again = pipeline.run(&post_request()).await;
    assert_eq!(again.message, "Pipeline has already run");
    assert_eq!(pipeline.state(), PipelineState::Succeeded);
}

#[tokio::test]
async fn spawned_pipeline_publishes_process_result() {
    let dir = tempfile::tempdir().expect("tempdir");
    let layout = ProjectLayout::new(dir.path());
    let channel = ResultChannel::new(layout.storage_app_dir());
    let pipeline = Pipeline::new(
        Arc::new(launcher(dir.path(), SkeletonConsole::new())),
        layout,
    );

    let task = pipeline.spawn(post_request(), "process_test".to_string());
    let result = channel
        .await_process(task, "process_test", Duration::from_secs(30))
        .await;
    assert!(result.is_success(), "{}", result.message);
    assert!(result.artifacts.resource.is_some());
}

#[tokio::test]
async fn policy_boundary_writes_policy() {
    let dir = tempfile::tempdir().expect("tempdir");
    let layout = ProjectLayout::new(dir.path());
    let launcher = launcher(dir.path(), SkeletonConsole::new());
    let channel = ResultChannel::new(layout.storage_app_dir());
    let permissions = RolePermissions::new().grant("admin", &[PolicyAction::ViewAny]);

    let result = generate_policy(
        &launcher,
        &channel,
        "Post",
        permissions,
        Duration::from_secs(10),
    )
    .await;
    assert!(result.success, "{}", result.message);
    assert!(layout.policy_path("Post").is_file());
}

#[tokio::test]
async fn policy_boundary_rejects_bad_entity() {
    let dir = tempfile::tempdir().expect("tempdir");
    let layout = ProjectLayout::new(dir.path());
    let launcher = launcher(dir.path(), SkeletonConsole::new());
    let channel = ResultChannel::new(layout.storage_app_dir());
    let permissions = RolePermissions::new().grant("admin", &[PolicyAction::ViewAny]);

    let result = generate_policy(&launcher, &channel, "", permissions, Duration::from_secs(1)).await;
    assert!(!result.success);
    assert!(!layout.policies_dir().exists());
}

#[tokio::test]
async fn view_flag_adds_sectioned_infolist_page() {
    let dir = tempfile::tempdir().expect("tempdir");
    let layout = ProjectLayout::new(dir.path());
    let mut pipeline = Pipeline::new(
        Arc::new(launcher(dir.path(), SkeletonConsole::new())),
        layout.clone(),
    );
    let request = post_request().with_flags(GenerationFlags {
        factory_seeder: false,
        view_page: true,
    });

    let result = pipeline.run(&request).await;
    assert!(result.is_success(), "{}", result.message);
    assert_eq!(
        result.message,
        "Model, migration, Filament resource with view action created successfully"
    );
    let view_path = result.artifacts.view_page.as_deref().expect("view page path");
    assert!(view_path.ends_with("ViewPost.php"), "{view_path}");

    let view = std::fs::read_to_string(layout.view_page_path("Post")).expect("view page");
    assert!(view.contains("public function infolist(Infolist $infolist): Infolist"));
    assert!(view.contains("use Filament\\Infolists\\Components\\TextEntry;"));
    assert!(view.contains("Section::make('Basic Information')"));
    assert!(view.contains("Section::make('Numeric Data')"));
    assert!(view.contains("TextEntry::make('price')"));

    let resource = std::fs::read_to_string(layout.resource_path("Post")).expect("resource");
    assert!(resource.contains("ViewAction::make()"));
}

#[tokio::test]
async fn policy_boundary_rejects_role_that_is_not_an_identifier() {
    let dir = tempfile::tempdir().expect("tempdir");
    let layout = ProjectLayout::new(dir.path());
    let launcher = launcher(dir.path(), SkeletonConsole::new());
    let channel = ResultChannel::new(layout.storage_app_dir());
    let permissions = RolePermissions::new().grant("admin'])", &[PolicyAction::ViewAny]);

    let result = generate_policy(
        &launcher,
        &channel,
        "Post",
        permissions,
        Duration::from_secs(1),
    )
    .await;
    assert!(!result.success);
    assert!(result.message.contains("not a valid identifier"), "{}", result.message);
    assert!(!layout.policies_dir().exists());
}
