use async_trait::async_trait;
use resourcery_channel::{StepInvocation, StepKind};
use resourcery_core::{FieldSpec, Result, StepError, StepResult};
use resourcery_mutate::{Anchor, Mutation};
use resourcery_rules::cast_map;

use crate::artifact::{check_entity, check_fields, display, mutate, require, scaffold};
use crate::console::ConsoleCommand;
use crate::executor::{StepEnv, StepExecutor};

const MODEL_IMPORT: &str = "Illuminate\\Database\\Eloquent\\Model";
const SOFT_DELETES_IMPORT: &str = "Illuminate\\Database\\Eloquent\\SoftDeletes";

/// `generate-model`: scaffolds the model (and its migration) and declares the
/// fillable attributes and casts.
#[derive(Debug, Default)]
pub struct ModelStep;

#[async_trait]
impl StepExecutor for ModelStep {
    fn kind(&self) -> StepKind {
        StepKind::Model
    }

    async fn execute(&self, env: &StepEnv, invocation: &StepInvocation) -> Result<StepResult> {
        check_entity(&invocation.entity)?;
        check_fields(&invocation.fields)?;
        let entity = invocation.entity.as_str();

        scaffold(
            env,
            ConsoleCommand::MakeModel {
                name: entity.to_string(),
                with_migration: true,
            },
            "Failed to generate model",
        )
        .await?;

        let path = env.layout.model_path(entity);
        require(&path, "Model file was not created").await?;

        let mutations = model_mutations(&invocation.fields, invocation.soft_deletes)?;
        mutate(&path, "model file", &mutations).await?;

        tracing::info!(
            event = "model_modified",
            entity,
            fields = invocation.fields.len(),
            soft_deletes = invocation.soft_deletes
        );
        Ok(StepResult::success("Model created and modified successfully")
            .with("modelPath", display(&path)))
    }
}

fn model_mutations(fields: &[FieldSpec], soft_deletes: bool) -> Result<Vec<Mutation>> {
    let mut mutations = Vec::new();
    if soft_deletes {
        mutations.push(Mutation::ensure_import(
            SOFT_DELETES_IMPORT,
            Some(MODEL_IMPORT),
        ));
        mutations.push(Mutation::replace(
            Anchor::loose("use HasFactory;"),
            "use HasFactory, SoftDeletes;",
        ));
    }

    let trait_use =
        Anchor::pattern(r"use\s+HasFactory[^;]*;").map_err(|err| StepError::mutation("model file", err))?;
    mutations.push(Mutation::insert_after(trait_use, properties(fields)));
    Ok(mutations)
}

/// `$fillable` for every field, then `$casts` when any column needs one.
fn properties(fields: &[FieldSpec]) -> String {
    let fillable = fields
        .iter()
        .map(|field| format!("        '{}'", field.name))
        .collect::<Vec<_>>()
        .join(",\n");
    let mut out = format!("\n\n    protected $fillable = [\n{fillable}\n    ];");

    let casts = cast_map(fields);
    if !casts.is_empty() {
        let casts = casts
            .iter()
            .map(|(name, cast)| format!("        '{name}' => '{cast}'"))
            .collect::<Vec<_>>()
            .join(",\n");
        out.push_str(&format!("\n\n    protected $casts = [\n{casts}\n    ];"));
    }
    out
}
