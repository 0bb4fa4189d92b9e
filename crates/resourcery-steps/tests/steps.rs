use std::sync::Arc;

use resourcery_channel::{StepInvocation, StepKind};
use resourcery_core::{DefaultValue, FieldSpec, FieldType, PolicyAction, RolePermissions};
use resourcery_steps::{ProjectLayout, SkeletonConsole, StepEnv, execute_step, run_step};

fn env(dir: &std::path::Path, console: SkeletonConsole) -> StepEnv {
    StepEnv::new(ProjectLayout::new(dir), Arc::new(console))
}

fn post_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::new("title", FieldType::String),
        FieldSpec::new("body", FieldType::Text).nullable(),
        FieldSpec::new("price", FieldType::Decimal)
            .with_default(DefaultValue::Text("9.99".to_string())),
    ]
}

#[tokio::test]
async fn model_step_declares_fillable_and_casts() {
    let dir = tempfile::tempdir().expect("tempdir");
    let env = env(dir.path(), SkeletonConsole::new());
    let invocation = StepInvocation::new(StepKind::Model, "step_model", "Post")
        .with_fields(post_fields())
        .with_soft_deletes(true);

    let result = run_step(&env, &invocation).await;
    assert!(result.success, "{}", result.message);
    assert_eq!(result.message, "Model created and modified successfully");

    let model = std::fs::read_to_string(env.layout.model_path("Post")).expect("model");
    assert!(model.contains("use Illuminate\\Database\\Eloquent\\Model;\nuse Illuminate\\Database\\Eloquent\\SoftDeletes;"));
    assert!(model.contains("use HasFactory, SoftDeletes;\n\n    protected $fillable = ["));
    assert!(model.contains("        'title',\n        'body',\n        'price'\n    ];"));
    assert!(model.contains("'price' => 'decimal:2'"));
    assert!(!model.contains("'title' =>"));

    // the result was published on the channel
    let published = env.channel.take_step("step_model").expect("take");
    assert_eq!(published, Some(result));
}

#[tokio::test]
async fn migration_step_fills_columns_between_anchors() {
    let dir = tempfile::tempdir().expect("tempdir");
    let env = env(dir.path(), SkeletonConsole::new());
    let fields = post_fields();

    let model = StepInvocation::new(StepKind::Model, "step_1", "Post").with_fields(fields.clone());
    assert!(execute_step(&env, &model).await.success);

    let migration = StepInvocation::new(StepKind::Migration, "step_2", "Post")
        .with_fields(fields)
        .with_soft_deletes(true);
    let result = execute_step(&env, &migration).await;
    assert!(result.success, "{}", result.message);
    assert_eq!(result.u64_field("columns"), Some(4));

    let path = result.str_field("migrationPath").expect("migration path");
    let contents = std::fs::read_to_string(path).expect("migration");
    assert!(contents.contains(
        "$table->id();\n            $table->string('title');\n            $table->text('body')->nullable();\n            $table->decimal('price')->default(9.99);\n            $table->softDeletes();\n            $table->timestamps();"
    ));
}

#[tokio::test]
async fn migration_step_without_migration_reports_missing_artifact() {
    let dir = tempfile::tempdir().expect("tempdir");
    let env = env(dir.path(), SkeletonConsole::new());
    let invocation =
        StepInvocation::new(StepKind::Migration, "step_m", "Invoice").with_fields(post_fields());

    let result = execute_step(&env, &invocation).await;
    assert!(!result.success);
    assert_eq!(result.message, "Migration file not found");
}

#[tokio::test]
async fn failed_migrate_is_an_execution_failure() {
    let dir = tempfile::tempdir().expect("tempdir");
    let env = env(dir.path(), SkeletonConsole::new().failing("migrate"));
    let invocation = StepInvocation::new(StepKind::ApplyMigration, "step_a", "Post");

    let result = execute_step(&env, &invocation).await;
    assert!(!result.success);
    assert_eq!(result.message, "Migration command failed with exit code: 1");
}

#[tokio::test]
async fn silent_scaffold_reports_missing_model() {
    let dir = tempfile::tempdir().expect("tempdir");
    let env = env(dir.path(), SkeletonConsole::new().silent("make:model"));
    let invocation = StepInvocation::new(StepKind::Model, "step_s", "Post").with_fields(post_fields());

    let result = execute_step(&env, &invocation).await;
    assert!(!result.success);
    assert_eq!(result.message, "Model file was not created");
}

#[tokio::test]
async fn drifted_model_is_a_mutation_failure() {
    let dir = tempfile::tempdir().expect("tempdir");
    let env = env(dir.path(), SkeletonConsole::new());
    let path = env.layout.model_path("Post");
    std::fs::create_dir_all(env.layout.models_dir()).expect("models dir");
    std::fs::write(&path, "<?php\n\nnamespace App\\Models;\n\nclass Post\n{\n}\n").expect("write");

    let invocation = StepInvocation::new(StepKind::Model, "step_d", "Post").with_fields(post_fields());
    let result = execute_step(&env, &invocation).await;
    assert!(!result.success);
    assert!(result.message.starts_with("Failed to modify model file:"), "{}", result.message);
}

#[tokio::test]
async fn resource_step_customizes_resource_and_pages() {
    let dir = tempfile::tempdir().expect("tempdir");
    let env = env(dir.path(), SkeletonConsole::new());
    let invocation = StepInvocation::new(StepKind::Resource, "step_r", "Post").with_soft_deletes(true);

    let result = execute_step(&env, &invocation).await;
    assert!(result.success, "{}", result.message);
    assert!(result.str_field("viewPagePath").is_none());

    let resource = std::fs::read_to_string(env.layout.resource_path("Post")).expect("resource");
    assert!(resource.contains("protected static ?string $navigationGroup = 'Post';"));
    assert!(resource.contains("protected static ?int $navigationSort = 1;"));
    assert!(resource.contains("'heroicon-s-arrow-path'"));
    assert!(!resource.contains("heroicon-o-rectangle-stack"));
    assert!(resource.contains("Tables\\Actions\\ForceDeleteAction::make(),"));
    assert!(resource.contains("Tables\\Actions\\RestoreAction::make(),"));

    let create = std::fs::read_to_string(env.layout.create_page_path("Post")).expect("create page");
    assert!(create.contains("protected static bool $canCreateAnother = false;"));
    assert!(create.contains("return 'Record created successfully';"));

    let edit = std::fs::read_to_string(env.layout.edit_page_path("Post")).expect("edit page");
    let saved = edit.find("getSavedNotificationTitle").expect("saved title");
    let header = edit.find("getHeaderActions").expect("header actions");
    assert!(saved < header);
}

#[tokio::test]
async fn view_page_step_appends_infolist_once_per_import() {
    let dir = tempfile::tempdir().expect("tempdir");
    let env = env(dir.path(), SkeletonConsole::new());
    let resource = StepInvocation::new(StepKind::Resource, "step_r", "Post").with_view_page(true);
    assert!(execute_step(&env, &resource).await.success);

    let invocation = StepInvocation::new(StepKind::ViewPage, "step_v", "Post").with_fields(post_fields());
    let result = execute_step(&env, &invocation).await;
    assert!(result.success, "{}", result.message);

    let page = std::fs::read_to_string(env.layout.view_page_path("Post")).expect("view page");
    assert_eq!(page.matches("use Filament\\Infolists\\Infolist;").count(), 1);
    assert!(page.contains("use Filament\\Resources\\Pages\\ViewRecord;\nuse Filament\\Infolists\\Infolist;"));
    assert!(page.contains("public function infolist(Infolist $infolist): Infolist"));
    assert!(page.contains("Section::make('Numeric Data')"));
    assert!(page.trim_end().ends_with('}'));
}

#[tokio::test]
async fn view_page_step_requires_the_page() {
    let dir = tempfile::tempdir().expect("tempdir");
    let env = env(dir.path(), SkeletonConsole::new());
    let invocation = StepInvocation::new(StepKind::ViewPage, "step_v", "Post").with_fields(post_fields());

    let result = execute_step(&env, &invocation).await;
    assert!(!result.success);
    assert_eq!(result.message, "View page file does not exist");
}

#[tokio::test]
async fn policy_step_renders_sentinel_for_unassigned_actions() {
    let dir = tempfile::tempdir().expect("tempdir");
    let env = env(dir.path(), SkeletonConsole::new());
    let permissions = RolePermissions::new()
        .grant("editor", &[PolicyAction::ViewAny, PolicyAction::Update])
        .grant("admin", &[PolicyAction::ViewAny]);
    let invocation =
        StepInvocation::new(StepKind::Policy, "step_p", "Post").with_role_permissions(permissions);

    let result = execute_step(&env, &invocation).await;
    assert!(result.success, "{}", result.message);

    let policy = std::fs::read_to_string(env.layout.policy_path("Post")).expect("policy");
    assert_eq!(policy.matches("public function").count(), 10);
    assert!(policy.contains("public function viewAny(User $user): bool\n    {\n        return $user->hasAnyRole(['admin', 'editor']);"));
    assert!(policy.contains("public function forceDelete(User $user, Post $post): bool\n    {\n        return $user->hasAnyRole(['no_access']);"));
    assert_eq!(policy.matches("use App\\Models\\User;").count(), 1);
}

#[tokio::test]
async fn policy_step_rejects_empty_permissions() {
    let dir = tempfile::tempdir().expect("tempdir");
    let env = env(dir.path(), SkeletonConsole::new());
    let invocation = StepInvocation::new(StepKind::Policy, "step_p", "Post")
        .with_role_permissions(RolePermissions::new());

    let result = execute_step(&env, &invocation).await;
    assert!(!result.success);
    assert!(result.message.contains("Invalid role permissions format"));
}

#[tokio::test]
async fn factory_seeder_step_seeds_requested_count() {
    let dir = tempfile::tempdir().expect("tempdir");
    let env = env(dir.path(), SkeletonConsole::new());
    let invocation = StepInvocation::new(StepKind::FactorySeeder, "step_f", "Post")
        .with_fields(post_fields())
        .with_seed_count(3);

    let result = execute_step(&env, &invocation).await;
    assert!(result.success, "{}", result.message);
    assert_eq!(result.u64_field("recordsCreated"), Some(3));

    let factory = std::fs::read_to_string(env.layout.factory_path("Post")).expect("factory");
    assert!(factory.contains("'title' => fake()->text(100),"));
    assert!(factory.contains("'price' => 9.99,"));
    let seeder = std::fs::read_to_string(env.layout.seeder_path("Post")).expect("seeder");
    assert!(seeder.contains("use App\\Models\\Post;"));
    assert!(seeder.contains("Post::factory()\n            ->count(3)\n            ->create();"));
}

#[tokio::test]
async fn failed_seed_reports_exit_code() {
    let dir = tempfile::tempdir().expect("tempdir");
    let env = env(dir.path(), SkeletonConsole::new().failing("db:seed"));
    let invocation =
        StepInvocation::new(StepKind::FactorySeeder, "step_f", "Post").with_fields(post_fields());

    let result = execute_step(&env, &invocation).await;
    assert!(!result.success);
    assert_eq!(
        result.message,
        "Seeder execution failed: Seeder command failed with exit code: 1"
    );
}

#[tokio::test]
async fn entity_that_is_not_an_identifier_writes_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path().join("project");
    std::fs::create_dir_all(&root).expect("project root");
    let env = env(&root, SkeletonConsole::new());

    for kind in [
        StepKind::Model,
        StepKind::Migration,
        StepKind::Resource,
        StepKind::FactorySeeder,
        StepKind::ViewPage,
    ] {
        for entity in ["../../Escape", "post", "Blog Post"] {
            let invocation = StepInvocation::new(kind, "step_bad", entity).with_fields(post_fields());
            let result = execute_step(&env, &invocation).await;
            assert!(!result.success, "{kind:?} accepted {entity}");
            assert!(result.message.starts_with("invalid input: "), "{}", result.message);
        }
    }

    let policy = StepInvocation::new(StepKind::Policy, "step_bad", "../Escape")
        .with_role_permissions(RolePermissions::new().grant("admin", &[PolicyAction::ViewAny]));
    assert!(!execute_step(&env, &policy).await.success);

    assert!(!env.layout.models_dir().exists());
    assert!(!env.layout.policies_dir().exists());
    assert!(!env.layout.resources_dir().exists());
    assert!(!dir.path().join("Escape.php").exists());
    assert!(!dir.path().join("app").exists());
}

#[tokio::test]
async fn policy_rejects_role_names_that_are_not_identifiers() {
    let dir = tempfile::tempdir().expect("tempdir");
    let env = env(dir.path(), SkeletonConsole::new());
    let permissions = RolePermissions::new()
        .grant("admin'])", &[PolicyAction::ViewAny])
        .grant("editor", &[PolicyAction::Update]);
    let invocation =
        StepInvocation::new(StepKind::Policy, "step_p", "Post").with_role_permissions(permissions);

    let result = execute_step(&env, &invocation).await;
    assert!(!result.success);
    assert!(
        result.message.contains("role 'admin'])' is not a valid identifier"),
        "{}",
        result.message
    );
    assert!(!env.layout.policy_path("Post").exists());
}
