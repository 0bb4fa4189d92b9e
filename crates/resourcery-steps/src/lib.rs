//! Step executors for Resourcery.
//!
//! Each step ensures a base artifact exists through the project console,
//! computes a snippet from the field schema or role permissions, injects it
//! with the mutation engine and reports one [`StepResult`] on the result
//! channel. Failures never cross a step boundary: they become failed
//! results.
//!
//! [`StepResult`]: resourcery_core::StepResult

mod artifact;
pub mod console;
pub mod executor;
pub mod factory_seeder;
pub mod inventory;
pub mod layout;
pub mod migration;
pub mod model;
pub mod policy;
pub mod resource;
pub mod skeleton;
pub mod view_page;

pub use console::{ArtisanConsole, Console, ConsoleCommand, ConsoleOutput};
pub use executor::{StepEnv, StepExecutor, execute_step, executor_for, run_step};
pub use inventory::{PolicyInventory, PolicyStats, scan_policy_inventory};
pub use layout::ProjectLayout;
pub use skeleton::SkeletonConsole;

/// Records created by the sample-data seeder when no count is given.
pub const DEFAULT_SEED_COUNT: u32 = 10;
