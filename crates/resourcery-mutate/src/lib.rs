//! Structured rewriting of scaffolded PHP sources.
//!
//! A file is parsed into a [`SourceDocument`] (header, import list, body),
//! typed [`Mutation`]s are applied against it, and the result is rendered
//! back to text. Everything outside the touched spans is preserved byte for
//! byte.

pub mod anchor;
pub mod block;
pub mod document;
pub mod error;
pub mod mutation;

pub use anchor::Anchor;
pub use document::{Import, SourceDocument};
pub use error::{MutationError, Result};
pub use mutation::{Applied, Mutation, rewrite};
