use crate::manifest::StackManifest;

use super::{ConstructError, ConstructPath};

const APP_SCOPE: &str = "App";

/// Root of the construct tree.
///
/// The app owns every composed stack's declaration graph. Stack ids are
/// unique within an app.
#[derive(Debug, Default)]
pub struct App {
  stacks: Vec<StackManifest>,
}

impl App {
  pub fn new() -> Self {
    Self::default()
  }

  /// Reserve a path for a new stack.
  ///
  /// Fails if the id is invalid or a stack with that id was already added.
  pub fn stack_path(&self, id: &str) -> Result<ConstructPath, ConstructError> {
    let path = ConstructPath::stack(id)?;
    if self.stack(id).is_some() {
      return Err(ConstructError::DuplicateId {
        scope: APP_SCOPE.to_string(),
        id: id.to_string(),
      });
    }
    Ok(path)
  }

  /// Register a composed stack.
  pub fn add_stack(&mut self, manifest: StackManifest) -> Result<(), ConstructError> {
    self.stack_path(&manifest.stack_id)?;
    self.stacks.push(manifest);
    Ok(())
  }

  pub fn stacks(&self) -> &[StackManifest] {
    &self.stacks
  }

  pub fn stack(&self, id: &str) -> Option<&StackManifest> {
    self.stacks.iter().find(|s| s.stack_id == id)
  }
}
