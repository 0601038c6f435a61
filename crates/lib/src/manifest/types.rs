//! Manifest types for lambdastack.
//!
//! The manifest is the central data structure that captures the complete
//! desired state of a stack. It's produced by the composer and consumed by
//! synthesis, the dependency DAG and the diff.
//!
//! # Ordering
//!
//! Resources are kept in a `Vec` in declaration order, which is also the
//! creation order handed to the orchestrator. A resource may only reference
//! resources declared before it, so the manifest can never contain a forward
//! reference or a cycle when built through [`StackManifest::declare`].
//!
//! # Serialization
//!
//! The manifest is fully serializable and can be:
//! - Written to the assembly directory next to the template
//! - Diffed against the previously synthesized manifest
//! - Hashed for quick equality checks

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::construct::{ConstructPath, LogicalId};
use crate::resource::{Expr, Resource, ResourceKind};
use crate::util::hash::Hashable;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ManifestError {
  #[error("logical id {0} is already declared")]
  DuplicateLogicalId(LogicalId),

  #[error("{from} references {to}, which is not declared before it")]
  UnknownReference { from: String, to: LogicalId },

  #[error("output '{0}' is already defined")]
  DuplicateOutput(String),

  #[error("output name '{0}' has no alphanumeric characters")]
  InvalidOutputName(String),

  #[error("output '{name}' collides with '{existing}': both render as '{key}'")]
  OutputKeyCollision { name: String, existing: String, key: String },
}

/// Template key of a stack output: the name reduced to ASCII alphanumerics.
pub fn output_key(name: &str) -> String {
  name.chars().filter(char::is_ascii_alphanumeric).collect()
}

/// Target account and region of a stack.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
  pub account: Option<String>,
  pub region: Option<String>,
}

/// One declared resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceEntry {
  pub logical_id: LogicalId,
  pub path: ConstructPath,
  #[serde(flatten)]
  pub resource: Resource,
}

impl Hashable for ResourceEntry {}

impl ResourceEntry {
  pub fn kind(&self) -> ResourceKind {
    self.resource.kind()
  }
}

/// A named value exported by the stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputDef {
  pub value: Expr,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
}

impl Hashable for OutputDef {}

/// The complete declaration graph of one stack.
///
/// # Example
///
/// ```json
/// {
///   "stack_id": "GoLambdaStack",
///   "resources": [
///     { "logical_id": "MyBucket1A2B3C4D", "path": ["GoLambdaStack", "MyBucket"],
///       "kind": "storage_container", "bucket_name": "...", "versioned": true }
///   ],
///   "outputs": { "lambda-url": { "value": { "join": [...] } } }
/// }
/// ```
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackManifest {
  pub stack_id: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub env: Option<Environment>,
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub tags: BTreeMap<String, String>,
  #[serde(default)]
  pub resources: Vec<ResourceEntry>,
  #[serde(default)]
  pub outputs: BTreeMap<String, OutputDef>,
}

impl Hashable for StackManifest {}

impl StackManifest {
  pub fn new(stack_id: &str) -> Self {
    Self {
      stack_id: stack_id.to_string(),
      ..Self::default()
    }
  }

  /// Append a resource.
  ///
  /// The logical id must be new and every reference must point at a resource
  /// already in the manifest.
  pub fn declare(&mut self, entry: ResourceEntry) -> Result<(), ManifestError> {
    if self.get(&entry.logical_id).is_some() {
      return Err(ManifestError::DuplicateLogicalId(entry.logical_id));
    }
    for reference in entry.resource.references() {
      if self.get(reference).is_none() {
        return Err(ManifestError::UnknownReference {
          from: entry.logical_id.to_string(),
          to: reference.clone(),
        });
      }
    }
    self.resources.push(entry);
    Ok(())
  }

  /// Register a stack output.
  ///
  /// References must resolve to declared resources, and the name must map to
  /// a template key no other output uses.
  pub fn add_output(&mut self, name: &str, output: OutputDef) -> Result<(), ManifestError> {
    if self.outputs.contains_key(name) {
      return Err(ManifestError::DuplicateOutput(name.to_string()));
    }
    let key = output_key(name);
    if key.is_empty() {
      return Err(ManifestError::InvalidOutputName(name.to_string()));
    }
    if let Some(existing) = self.outputs.keys().find(|other| output_key(other) == key) {
      return Err(ManifestError::OutputKeyCollision {
        name: name.to_string(),
        existing: existing.clone(),
        key,
      });
    }
    for reference in output.value.references() {
      if self.get(reference).is_none() {
        return Err(ManifestError::UnknownReference {
          from: format!("output {}", name),
          to: reference.clone(),
        });
      }
    }
    self.outputs.insert(name.to_string(), output);
    Ok(())
  }

  pub fn get(&self, logical_id: &LogicalId) -> Option<&ResourceEntry> {
    self.resources.iter().find(|r| &r.logical_id == logical_id)
  }

  /// Resource kinds in declaration order.
  pub fn kinds(&self) -> Vec<ResourceKind> {
    self.resources.iter().map(ResourceEntry::kind).collect()
  }

  pub fn of_kind(&self, kind: ResourceKind) -> impl Iterator<Item = &ResourceEntry> {
    self.resources.iter().filter(move |r| r.kind() == kind)
  }

  /// Verify that no two resources share a logical id.
  ///
  /// Manifests read back from disk bypass [`StackManifest::declare`].
  pub fn check_unique_ids(&self) -> Result<(), ManifestError> {
    let mut seen = HashSet::new();
    for entry in &self.resources {
      if !seen.insert(&entry.logical_id) {
        return Err(ManifestError::DuplicateLogicalId(entry.logical_id.clone()));
      }
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::resource::{BucketDef, GatewayDef};

  fn bucket_entry(id: &str) -> ResourceEntry {
    let path = ConstructPath::stack("S").unwrap().child(id).unwrap();
    ResourceEntry {
      logical_id: path.logical_id().unwrap(),
      path,
      resource: Resource::StorageContainer(BucketDef {
        bucket_name: id.to_lowercase(),
        versioned: true,
      }),
    }
  }

  fn gateway_entry(id: &str, function: &LogicalId) -> ResourceEntry {
    let path = ConstructPath::stack("S").unwrap().child(id).unwrap();
    ResourceEntry {
      logical_id: path.logical_id().unwrap(),
      path,
      resource: Resource::GatewayEndpoint(GatewayDef {
        function: function.clone(),
        description: String::new(),
        stage_name: "prod".to_string(),
      }),
    }
  }

  #[test]
  fn declare_keeps_order() {
    let mut manifest = StackManifest::new("S");
    manifest.declare(bucket_entry("A")).unwrap();
    manifest.declare(bucket_entry("B")).unwrap();
    let ids: Vec<&str> = manifest.resources.iter().map(|r| r.path.id()).collect();
    assert_eq!(ids, vec!["A", "B"]);
  }

  #[test]
  fn duplicate_logical_id_is_rejected() {
    let mut manifest = StackManifest::new("S");
    manifest.declare(bucket_entry("A")).unwrap();
    let err = manifest.declare(bucket_entry("A")).unwrap_err();
    assert!(matches!(err, ManifestError::DuplicateLogicalId(_)));
    assert_eq!(manifest.resources.len(), 1);
  }

  #[test]
  fn forward_reference_is_rejected() {
    let mut manifest = StackManifest::new("S");
    let missing = LogicalId("NotYet".to_string());
    let err = manifest.declare(gateway_entry("Api", &missing)).unwrap_err();
    assert_eq!(
      err,
      ManifestError::UnknownReference {
        from: gateway_entry("Api", &missing).logical_id.to_string(),
        to: missing,
      }
    );
    assert!(manifest.resources.is_empty());
  }

  #[test]
  fn output_references_must_resolve() {
    let mut manifest = StackManifest::new("S");
    let output = OutputDef {
      value: Expr::Ref(LogicalId("Missing".to_string())),
      description: None,
    };
    assert!(matches!(
      manifest.add_output("url", output),
      Err(ManifestError::UnknownReference { .. })
    ));

    let bucket = bucket_entry("A");
    let id = bucket.logical_id.clone();
    manifest.declare(bucket).unwrap();
    let output = OutputDef {
      value: Expr::Ref(id),
      description: None,
    };
    manifest.add_output("name", output.clone()).unwrap();
    assert_eq!(
      manifest.add_output("name", output),
      Err(ManifestError::DuplicateOutput("name".to_string()))
    );
  }

  #[test]
  fn colliding_output_keys_are_rejected() {
    let mut manifest = StackManifest::new("S");
    let output = OutputDef {
      value: Expr::literal("x"),
      description: None,
    };
    manifest.add_output("lambda-url", output.clone()).unwrap();

    assert_eq!(
      manifest.add_output("lambdaurl", output.clone()),
      Err(ManifestError::OutputKeyCollision {
        name: "lambdaurl".to_string(),
        existing: "lambda-url".to_string(),
        key: "lambdaurl".to_string(),
      })
    );
    assert_eq!(
      manifest.add_output("--", output),
      Err(ManifestError::InvalidOutputName("--".to_string()))
    );
    assert_eq!(manifest.outputs.len(), 1);
  }

  #[test]
  fn output_key_strips_punctuation() {
    assert_eq!(output_key("lambda-url"), "lambdaurl");
    assert_eq!(output_key("a_b.c"), "abc");
  }

  #[test]
  fn manifest_round_trips_through_json() {
    let mut manifest = StackManifest::new("S");
    manifest.declare(bucket_entry("A")).unwrap();
    let json = serde_json::to_string(&manifest).unwrap();
    let back: StackManifest = serde_json::from_str(&json).unwrap();
    assert_eq!(back, manifest);
    assert_eq!(back.compute_hash().unwrap(), manifest.compute_hash().unwrap());
  }

  #[test]
  fn check_unique_ids_catches_hand_edited_manifests() {
    let mut manifest = StackManifest::new("S");
    manifest.resources.push(bucket_entry("A"));
    manifest.resources.push(bucket_entry("A"));
    assert!(matches!(
      manifest.check_unique_ids(),
      Err(ManifestError::DuplicateLogicalId(_))
    ));
  }
}
