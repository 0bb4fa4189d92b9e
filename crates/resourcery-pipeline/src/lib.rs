//! Orchestration of the generation steps.
//!
//! A [`Pipeline`] validates a request, then launches the model, migration,
//! apply-migration, resource and (optionally) factory/seeder steps one at a
//! time through a [`StepLauncher`](resourcery_channel::StepLauncher), waiting
//! on each step's result file before moving on. The first failure ends the
//! run with an error result.

mod boundary;
mod compensation;
mod error;
mod launcher;
mod pipeline;

pub use boundary::generate_policy;
pub use compensation::{Compensation, CompensationLog};
pub use error::{PipelineError, Result};
pub use launcher::{InProcessLauncher, ProcessLauncher, master_args};
pub use pipeline::{
    DEFAULT_PIPELINE_TIMEOUT, DEFAULT_POLICY_TIMEOUT, DEFAULT_STEP_TIMEOUT, Pipeline,
    PipelineOptions, PipelineState,
};
