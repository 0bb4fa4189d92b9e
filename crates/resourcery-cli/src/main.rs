mod config;
mod input;
mod logging;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use config::{ConfigError, SETTINGS_FILE, Settings, load_settings, save_settings};
use input::read_input;
use logging::{LoggingError, init_logging};
use resourcery_channel::{
    ChannelError, ResultChannel, StepInvocation, StepKind, StepLauncher, new_process_id,
};
use resourcery_core::{
    FieldSpec, GenerationFlags, GenerationRequest, ProcessResult, RolePermissions, StepError,
    StepResult, parse_fields, parse_role_permissions,
};
use resourcery_pipeline::{
    InProcessLauncher, Pipeline, PipelineError, ProcessLauncher, generate_policy,
};
use resourcery_steps::{
    ArtisanConsole, Console, ProjectLayout, SkeletonConsole, StepEnv, run_step,
    scan_policy_inventory,
};
use thiserror::Error;

#[derive(Debug, Error)]
enum CliError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("logging error: {0}")]
    Logging(#[from] LoggingError),
    #[error("channel error: {0}")]
    Channel(#[from] ChannelError),
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
    #[error("{0}")]
    Step(#[from] StepError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Parser, Debug)]
#[command(name = "resourcery", version, about = "Resourcery CLI")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Clone)]
struct GlobalArgs {
    /// Laravel project root.
    #[arg(long, global = true, default_value = ".")]
    project: PathBuf,
    /// Settings file (defaults to <project>/resourcery.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Use the built-in skeleton console instead of `php artisan`.
    #[arg(long, global = true, default_value_t = false)]
    offline: bool,
    /// Run steps on tasks inside this process instead of child processes.
    #[arg(long, global = true, default_value_t = false)]
    in_process: bool,
}

impl GlobalArgs {
    fn settings_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| self.project.join(SETTINGS_FILE))
    }

    /// Flags a child `resourcery` process needs to see the same project.
    fn forwarded(&self) -> Vec<String> {
        let mut args = vec![
            "--project".to_string(),
            self.project.display().to_string(),
        ];
        if let Some(config) = &self.config {
            args.extend(["--config".to_string(), config.display().to_string()]);
        }
        if self.offline {
            args.push("--offline".to_string());
        }
        args
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scaffold the model and declare fillable attributes and casts.
    GenerateModel(SchemaStepArgs),
    /// Fill the newest migration with one column per field.
    GenerateMigration(SchemaStepArgs),
    /// Apply pending migrations to the database.
    ApplyMigration(ApplyMigrationArgs),
    /// Scaffold and customize the admin resource and its pages.
    GenerateResource(ResourceArgs),
    /// Add a read-only infolist to the resource's view page.
    GenerateViewPage(FieldStepArgs),
    /// Scaffold an authorization policy from role permissions.
    GeneratePolicy(PolicyStepArgs),
    /// Generate a factory and seeder, then seed sample records.
    GenerateFactorySeeder(FactorySeederArgs),
    /// Run the whole pipeline and publish a process result.
    Master(MasterArgs),
    /// Launch the pipeline for an entity and print its result.
    Build(BuildArgs),
    /// Generate a policy for an existing model and print the step result.
    Policy(PolicyArgs),
    /// List models and whether they have a policy.
    Policies,
    /// Write the default settings file.
    InitConfig(InitConfigArgs),
}

#[derive(Args, Debug)]
struct SchemaStepArgs {
    entity: String,
    /// Field schema JSON, or @file.
    fields: String,
    step_id: String,
    #[arg(long, default_value_t = false)]
    soft_deletes: bool,
}

#[derive(Args, Debug)]
struct FieldStepArgs {
    entity: String,
    /// Field schema JSON, or @file.
    fields: String,
    step_id: String,
}

#[derive(Args, Debug)]
struct ApplyMigrationArgs {
    step_id: String,
}

#[derive(Args, Debug)]
struct ResourceArgs {
    entity: String,
    step_id: String,
    #[arg(long, default_value_t = false)]
    soft_deletes: bool,
    /// Also generate the view page infolist.
    #[arg(long, default_value_t = false)]
    view: bool,
    /// Field schema JSON, or @file, for the view page.
    #[arg(long)]
    fields: Option<String>,
}

#[derive(Args, Debug)]
struct PolicyStepArgs {
    entity: String,
    step_id: String,
    /// Role-permission JSON, or @file.
    roles: String,
}

#[derive(Args, Debug)]
struct FactorySeederArgs {
    entity: String,
    /// Field schema JSON, or @file.
    fields: String,
    step_id: String,
    /// Records to seed (defaults to the configured count).
    #[arg(long)]
    count: Option<u32>,
}

#[derive(Args, Debug)]
struct MasterArgs {
    entity: String,
    /// Field schema JSON, or @file.
    fields: String,
    process_id: String,
    #[arg(long, default_value_t = false)]
    soft_deletes: bool,
    #[arg(long, default_value_t = false)]
    generate_factory_seeder: bool,
    #[arg(long, default_value_t = false)]
    generate_view: bool,
}

#[derive(Args, Debug)]
struct BuildArgs {
    entity: String,
    /// Field schema JSON, or @file.
    #[arg(long)]
    fields: String,
    #[arg(long, default_value_t = false)]
    soft_deletes: bool,
    /// Generate a factory and seeder and seed sample records.
    #[arg(long, default_value_t = false)]
    factory_seeder: bool,
    /// Generate the view page infolist.
    #[arg(long, default_value_t = false)]
    view: bool,
}

#[derive(Args, Debug)]
struct PolicyArgs {
    entity: String,
    /// Role-permission JSON, or @file.
    #[arg(long)]
    roles: String,
}

#[derive(Args, Debug)]
struct InitConfigArgs {
    /// Overwrite an existing settings file.
    #[arg(long, default_value_t = false)]
    force: bool,
}

/// Everything a command needs about the target project.
struct Context {
    global: GlobalArgs,
    settings: Settings,
    layout: ProjectLayout,
}

impl Context {
    fn new(mut global: GlobalArgs) -> Result<Self, CliError> {
        global.project = std::path::absolute(&global.project)?;
        let settings = load_settings(&global.settings_path())?;
        let layout = ProjectLayout::new(global.project.clone());
        Ok(Self {
            global,
            settings,
            layout,
        })
    }

    fn console(&self) -> Arc<dyn Console> {
        if self.global.offline {
            Arc::new(SkeletonConsole::new())
        } else {
            let console = &self.settings.console;
            Arc::new(ArtisanConsole::new(&console.php, &console.artisan))
        }
    }

    fn channel(&self) -> ResultChannel {
        ResultChannel::new(self.layout.storage_app_dir())
            .with_poll_interval(self.settings.channel.poll_interval())
    }

    fn step_env(&self) -> StepEnv {
        StepEnv::new(self.layout.clone(), self.console())
            .with_channel(self.channel())
            .with_step_timeout(self.settings.channel.step_timeout())
            .with_seed_count(self.settings.seeder.count)
    }

    fn launcher(&self) -> Result<Arc<dyn StepLauncher>, CliError> {
        if self.global.in_process {
            Ok(Arc::new(InProcessLauncher::new(self.step_env())))
        } else {
            Ok(Arc::new(ProcessLauncher::current(self.global.forwarded())?))
        }
    }

    fn pipeline(&self) -> Result<Pipeline, CliError> {
        Ok(Pipeline::new(self.launcher()?, self.layout.clone())
            .with_channel(self.channel())
            .with_options(self.settings.pipeline_options()))
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode, CliError> {
    let cli = Cli::parse();
    let ctx = Context::new(cli.global)?;
    init_logging(&ctx.layout.logs_dir())?;

    match cli.command {
        Command::GenerateModel(args) => {
            let invocation = schema_step(StepKind::Model, args);
            run_step_command(&ctx, invocation).await
        }
        Command::GenerateMigration(args) => {
            let invocation = schema_step(StepKind::Migration, args);
            run_step_command(&ctx, invocation).await
        }
        Command::ApplyMigration(args) => {
            let invocation = StepInvocation::new(StepKind::ApplyMigration, args.step_id, "");
            run_step_command(&ctx, Ok(invocation)).await
        }
        Command::GenerateResource(args) => {
            let invocation = resource_step(args);
            run_step_command(&ctx, invocation).await
        }
        Command::GenerateViewPage(args) => {
            let invocation = parse_field_input(&args.fields).map(|fields| {
                StepInvocation::new(StepKind::ViewPage, args.step_id.clone(), args.entity)
                    .with_fields(fields)
            });
            run_step_command(&ctx, failed_with_id(invocation, &args.step_id)).await
        }
        Command::GeneratePolicy(args) => {
            let invocation = parse_roles_input(&args.roles).map(|permissions| {
                StepInvocation::new(StepKind::Policy, args.step_id.clone(), args.entity)
                    .with_role_permissions(permissions)
            });
            run_step_command(&ctx, failed_with_id(invocation, &args.step_id)).await
        }
        Command::GenerateFactorySeeder(args) => {
            let invocation = parse_field_input(&args.fields).map(|fields| {
                let invocation =
                    StepInvocation::new(StepKind::FactorySeeder, args.step_id.clone(), args.entity)
                        .with_fields(fields);
                match args.count {
                    Some(count) => invocation.with_seed_count(count),
                    None => invocation,
                }
            });
            run_step_command(&ctx, failed_with_id(invocation, &args.step_id)).await
        }
        Command::Master(args) => run_master(&ctx, args).await,
        Command::Build(args) => run_build(&ctx, args).await,
        Command::Policy(args) => run_policy(&ctx, args).await,
        Command::Policies => run_policies(&ctx),
        Command::InitConfig(args) => run_init_config(&ctx, args),
    }
}

/// A step invocation, or the step id to report a rejected input under.
type PendingStep = Result<StepInvocation, (String, StepError)>;

fn failed_with_id(invocation: Result<StepInvocation, StepError>, step_id: &str) -> PendingStep {
    invocation.map_err(|err| (step_id.to_string(), err))
}

fn schema_step(kind: StepKind, args: SchemaStepArgs) -> PendingStep {
    let fields = parse_field_input(&args.fields);
    failed_with_id(
        fields.map(|fields| {
            StepInvocation::new(kind, args.step_id.clone(), args.entity)
                .with_fields(fields)
                .with_soft_deletes(args.soft_deletes)
        }),
        &args.step_id,
    )
}

fn resource_step(args: ResourceArgs) -> PendingStep {
    let fields = match &args.fields {
        Some(raw) => parse_field_input(raw),
        None => Ok(Vec::new()),
    };
    failed_with_id(
        fields.map(|fields| {
            StepInvocation::new(StepKind::Resource, args.step_id.clone(), args.entity)
                .with_fields(fields)
                .with_soft_deletes(args.soft_deletes)
                .with_view_page(args.view)
        }),
        &args.step_id,
    )
}

fn parse_field_input(raw: &str) -> Result<Vec<FieldSpec>, StepError> {
    parse_fields(&read_input(raw)?).map_err(StepError::Validation)
}

fn parse_roles_input(raw: &str) -> Result<RolePermissions, StepError> {
    parse_role_permissions(&read_input(raw)?).map_err(StepError::Validation)
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Run one step and publish its result. Rejected input is published as a
/// failed result too, so the waiting orchestrator never times out on it.
async fn run_step_command(ctx: &Context, pending: PendingStep) -> Result<ExitCode, CliError> {
    let result = match pending {
        Ok(invocation) => {
            let env = ctx.step_env().with_launcher(ctx.launcher()?);
            run_step(&env, &invocation).await
        }
        Err((step_id, err)) => {
            tracing::warn!(event = "step_rejected", step_id = %step_id, error = %err);
            let result = StepResult::from_error(&err);
            ctx.channel().publish_step(&step_id, &result)?;
            result
        }
    };
    Ok(exit_code(result.success))
}

async fn run_master(ctx: &Context, args: MasterArgs) -> Result<ExitCode, CliError> {
    let fields = match parse_field_input(&args.fields) {
        Ok(fields) => fields,
        Err(err) => {
            tracing::warn!(event = "process_rejected", process_id = %args.process_id, error = %err);
            ctx.channel()
                .publish_process(&args.process_id, &ProcessResult::error(err.to_string()))?;
            return Ok(ExitCode::FAILURE);
        }
    };
    let request = GenerationRequest::new(args.entity, fields)
        .with_soft_deletes(args.soft_deletes)
        .with_flags(GenerationFlags {
            factory_seeder: args.generate_factory_seeder,
            view_page: args.generate_view,
        });

    let mut pipeline = ctx.pipeline()?;
    let result = pipeline.run_and_publish(&request, &args.process_id).await?;
    Ok(exit_code(result.is_success()))
}

async fn run_build(ctx: &Context, args: BuildArgs) -> Result<ExitCode, CliError> {
    let fields = parse_field_input(&args.fields)?;
    let request = GenerationRequest::new(args.entity, fields)
        .with_soft_deletes(args.soft_deletes)
        .with_flags(GenerationFlags {
            factory_seeder: args.factory_seeder,
            view_page: args.view,
        });

    let process_id = new_process_id();
    tracing::info!(event = "build_started", process_id = %process_id, entity = %request.entity_name);
    let task = if ctx.global.in_process {
        ctx.pipeline()?.spawn(request, process_id.clone())
    } else {
        ProcessLauncher::current(ctx.global.forwarded())?.launch_master(&request, &process_id)?
    };

    let result = ctx
        .channel()
        .await_process(task, &process_id, ctx.settings.channel.pipeline_timeout())
        .await;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(exit_code(result.is_success()))
}

async fn run_policy(ctx: &Context, args: PolicyArgs) -> Result<ExitCode, CliError> {
    let permissions = parse_roles_input(&args.roles)?;
    let launcher = ctx.launcher()?;
    let result = generate_policy(
        launcher.as_ref(),
        &ctx.channel(),
        &args.entity,
        permissions,
        ctx.settings.channel.policy_timeout(),
    )
    .await;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(exit_code(result.success))
}

fn run_policies(ctx: &Context) -> Result<ExitCode, CliError> {
    let inventory = scan_policy_inventory(&ctx.layout)?;
    let report = serde_json::json!({
        "availableModels": inventory.available,
        "modelsWithPolicy": inventory.with_policy,
        "stats": inventory.stats(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(ExitCode::SUCCESS)
}

fn run_init_config(ctx: &Context, args: InitConfigArgs) -> Result<ExitCode, CliError> {
    let path = ctx.global.settings_path();
    if path.exists() && !args.force {
        return Err(CliError::InvalidConfig(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    save_settings(&path, &Settings::default())?;
    tracing::info!(event = "settings_written", path = %path.display());
    println!("{}", path.display());
    Ok(ExitCode::SUCCESS)
}
