//! Diff computation between stack manifests.
//!
//! Compares the freshly composed manifest with the one recorded in the
//! assembly directory and works out what the orchestrator will have to do.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::construct::LogicalId;
use crate::manifest::{ResourceEntry, StackManifest};
use crate::resource::ResourceKind;
use crate::util::hash::{HashError, Hashable, ObjectHash};

/// A resource that appears in a diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceChange {
  pub logical_id: LogicalId,
  pub kind: ResourceKind,
  pub path: String,
}

impl From<&ResourceEntry> for ResourceChange {
  fn from(entry: &ResourceEntry) -> Self {
    Self {
      logical_id: entry.logical_id.clone(),
      kind: entry.kind(),
      path: entry.path.to_string(),
    }
  }
}

/// Diff between desired and previously synthesized state.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct StackDiff {
  /// In desired, not in current.
  pub to_create: Vec<ResourceChange>,

  /// Same logical id in both, different definition.
  pub to_update: Vec<ResourceChange>,

  /// In current, not in desired.
  pub to_delete: Vec<ResourceChange>,

  /// Same logical id and definition in both.
  pub unchanged: Vec<LogicalId>,

  /// Outputs that were added, removed or changed.
  pub outputs_changed: Vec<String>,

  /// Stack-level settings (`description`, `env`, `tags`) that changed.
  ///
  /// These are rendered into the template (tags on the bucket and function,
  /// description at the top) without being part of any resource entry.
  pub settings_changed: Vec<String>,
}

impl StackDiff {
  /// Returns true if there are no changes to make.
  pub fn is_empty(&self) -> bool {
    self.to_create.is_empty()
      && self.to_update.is_empty()
      && self.to_delete.is_empty()
      && self.outputs_changed.is_empty()
      && self.settings_changed.is_empty()
  }

  /// Resource changes plus changed stack settings.
  pub fn change_count(&self) -> usize {
    self.to_create.len() + self.to_update.len() + self.to_delete.len() + self.settings_changed.len()
  }
}

/// Compute the diff between `desired` and `current`.
///
/// `current` is `None` when the stack was never synthesized, in which case
/// everything is created. Resources are matched by logical id and compared by
/// content hash. Created, updated and unchanged resources keep desired order;
/// deleted ones keep current order. Stack settings are only compared against
/// an existing manifest.
pub fn compute_diff(desired: &StackManifest, current: Option<&StackManifest>) -> Result<StackDiff, HashError> {
  let mut diff = StackDiff::default();

  let current_hashes: HashMap<&LogicalId, ObjectHash> = match current {
    Some(manifest) => manifest
      .resources
      .iter()
      .map(|entry| -> Result<_, HashError> { Ok((&entry.logical_id, entry.compute_hash()?)) })
      .collect::<Result<_, HashError>>()?,
    None => HashMap::new(),
  };

  for entry in &desired.resources {
    match current_hashes.get(&entry.logical_id) {
      None => diff.to_create.push(entry.into()),
      Some(hash) if *hash != entry.compute_hash()? => diff.to_update.push(entry.into()),
      Some(_) => diff.unchanged.push(entry.logical_id.clone()),
    }
  }

  if let Some(manifest) = current {
    let desired_ids: HashSet<&LogicalId> = desired.resources.iter().map(|r| &r.logical_id).collect();
    diff.to_delete = manifest
      .resources
      .iter()
      .filter(|entry| !desired_ids.contains(&entry.logical_id))
      .map(ResourceChange::from)
      .collect();
  }

  let empty = Default::default();
  let current_outputs = current.map(|m| &m.outputs).unwrap_or(&empty);
  let mut names: Vec<&String> = desired.outputs.keys().chain(current_outputs.keys()).collect();
  names.sort();
  names.dedup();
  for name in names {
    if desired.outputs.get(name) != current_outputs.get(name) {
      diff.outputs_changed.push(name.clone());
    }
  }

  if let Some(manifest) = current {
    diff.settings_changed = changed_settings(desired, manifest);
  }

  Ok(diff)
}

fn changed_settings(desired: &StackManifest, current: &StackManifest) -> Vec<String> {
  let mut changed = Vec::new();
  if desired.description != current.description {
    changed.push("description".to_string());
  }
  if desired.env != current.env {
    changed.push("env".to_string());
  }
  if desired.tags != current.tags {
    changed.push("tags".to_string());
  }
  changed
}
