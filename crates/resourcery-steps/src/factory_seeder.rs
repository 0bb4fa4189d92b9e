use async_trait::async_trait;
use resourcery_channel::{StepInvocation, StepKind};
use resourcery_core::{FieldSpec, Result, StepError, StepResult};
use resourcery_mutate::{Anchor, Mutation};
use resourcery_rules::fake_value;

use crate::artifact::{check_entity, check_fields, display, mutate, require, scaffold};
use crate::console::ConsoleCommand;
use crate::executor::{StepEnv, StepExecutor};

/// `generate-factory-seeder`: builds a sample-data factory and seeder, then
/// runs the seeder against the live database.
#[derive(Debug, Default)]
pub struct FactorySeederStep;

#[async_trait]
impl StepExecutor for FactorySeederStep {
    fn kind(&self) -> StepKind {
        StepKind::FactorySeeder
    }

    async fn execute(&self, env: &StepEnv, invocation: &StepInvocation) -> Result<StepResult> {
        check_entity(&invocation.entity)?;
        check_fields(&invocation.fields)?;
        let entity = invocation.entity.as_str();
        let count = invocation.seed_count.unwrap_or(env.seed_count);

        scaffold(
            env,
            ConsoleCommand::MakeFactory {
                name: format!("{entity}Factory"),
                model: entity.to_string(),
            },
            "Failed to generate factory",
        )
        .await?;
        let factory_path = env.layout.factory_path(entity);
        require(&factory_path, "Factory file was not created").await?;
        mutate(
            &factory_path,
            "factory",
            &[Mutation::replace_block_body(
                Anchor::loose("public function definition(): array"),
                definition_body(&invocation.fields),
            )],
        )
        .await?;

        scaffold(
            env,
            ConsoleCommand::MakeSeeder {
                name: format!("{entity}Seeder"),
            },
            "Failed to generate seeder",
        )
        .await?;
        let seeder_path = env.layout.seeder_path(entity);
        require(&seeder_path, "Seeder file was not created").await?;
        mutate(
            &seeder_path,
            "seeder",
            &[
                Mutation::ensure_import(
                    format!("App\\Models\\{entity}"),
                    Some("Illuminate\\Database\\Seeder"),
                ),
                Mutation::replace_block_body(Anchor::loose("public function run(): void"), run_body(entity, count)),
            ],
        )
        .await?;

        let seed = ConsoleCommand::Seed {
            class: format!("{entity}Seeder"),
        };
        let output = env.console.run(&env.layout, &seed).await?;
        if !output.success() {
            tracing::warn!(event = "seed_failed", entity, status = output.status, output = %output.output);
            return Err(StepError::Execution(format!(
                "Seeder execution failed: Seeder command failed with exit code: {}",
                output.status
            )));
        }

        tracing::info!(event = "records_seeded", entity, count);
        Ok(
            StepResult::success("Factory and Seeder generated and executed successfully")
                .with("factoryPath", display(&factory_path))
                .with("seederPath", display(&seeder_path))
                .with("recordsCreated", u64::from(count)),
        )
    }
}

/// Body of the factory's `definition()` method.
pub fn definition_body(fields: &[FieldSpec]) -> String {
    let attributes = fields
        .iter()
        .map(|field| {
            let selection = fake_value(field);
            tracing::trace!(field = %field.name, rule = selection.rule, "fake value selected");
            format!(
                "            '{}' => {},",
                field.name,
                selection.outcome.render(field.nullable)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!("\n        return [\n{attributes}\n        ];\n    ")
}

fn run_body(entity: &str, count: u32) -> String {
    format!("\n        {entity}::factory()\n            ->count({count})\n            ->create();\n    ")
}

#[cfg(test)]
mod tests {
    use resourcery_core::{DefaultValue, FieldType};

    use super::*;

    #[test]
    fn definition_lists_one_attribute_per_field() {
        let fields = vec![
            FieldSpec::new("email", FieldType::String).unique(),
            FieldSpec::new("bio", FieldType::Text).nullable(),
            FieldSpec::new("status", FieldType::String)
                .with_default(DefaultValue::Text("draft".to_string())),
        ];
        let body = definition_body(&fields);
        assert!(body.contains("            'email' => fake()->unique()->safeEmail(),"));
        assert!(body.contains("            'bio' => fake()->optional()->paragraph(),"));
        assert!(body.contains("            'status' => 'draft',"));
    }

    #[test]
    fn run_body_creates_requested_count() {
        assert!(run_body("Post", 25).contains("Post::factory()\n            ->count(25)\n            ->create();"));
    }
}
