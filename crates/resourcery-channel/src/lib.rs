//! File-backed result channel between the orchestrator and its steps.
//!
//! Every step invocation is correlated with its result by a caller-generated
//! identifier. Producers publish a JSON payload exactly once with an atomic
//! write; consumers poll for it, claim it with a rename, read it and delete
//! it, so a payload is observed at most once. Waits are bounded and tied to
//! a [`StepTask`] that is cancelled when the deadline passes.

mod atomic;
mod channel;
mod error;
mod ids;
mod task;

pub use atomic::{create_bytes_atomic, write_bytes_atomic};
pub use channel::{DEFAULT_POLL_INTERVAL, ResultChannel};
pub use error::{ChannelError, Result};
pub use ids::{new_process_id, new_step_id};
pub use task::{StepInvocation, StepKind, StepLauncher, StepTask};
