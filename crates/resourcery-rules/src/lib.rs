//! Ordered heuristic rule tables.
//!
//! Each table is a static list of `(name, predicate, outcome)` rules resolved
//! by [`resolve`]: the first rule whose predicate holds wins. Tables are
//! independent of the steps that consume them.

pub mod cast;
pub mod fake;
pub mod group;
pub mod rule;

pub use cast::{CAST_RULES, StorageCast, cast_map, storage_cast};
pub use fake::{FAKE_VALUE_RULES, FakeValue, fake_value};
pub use group::{DISPLAY_GROUP_RULES, DisplayGroup, display_group};
pub use rule::{Rule, Selection, resolve};
