//! Construct tree: scopes, paths and logical ids.
//!
//! Every declared resource lives at a [`ConstructPath`] below a stack, and the
//! stack lives below the [`App`] root. Logical ids used in synthesized
//! templates are derived from those paths so they stay stable across runs.

mod app;
mod path;

use thiserror::Error;

pub use app::App;
pub use path::{ConstructPath, LogicalId, PATH_SEPARATOR};

/// Errors raised while building the construct tree.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConstructError {
  #[error("construct id must not be empty (scope: {scope})")]
  EmptyId { scope: String },

  #[error("construct id '{id}' must not contain '/'")]
  InvalidId { id: String },

  #[error("there is already a construct with id '{id}' in scope '{scope}'")]
  DuplicateId { scope: String, id: String },

  #[error("cannot derive a logical id for '{path}': it has no components below the stack")]
  NoLogicalId { path: String },
}
