use std::fmt;

use serde::{Deserialize, Serialize};

use crate::consts::LOGICAL_ID_HASH_LEN;
use crate::util::hash::short_digest;

use super::ConstructError;

pub const PATH_SEPARATOR: char = '/';

/// Identifier of a resource inside a synthesized template.
///
/// Logical ids are alphanumeric, e.g. `"MyBucketA1B2C3D4"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LogicalId(pub String);

impl LogicalId {
  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for LogicalId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Location of a construct in the tree, root first.
///
/// The first component is the stack id; resources sit below it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConstructPath(Vec<String>);

impl ConstructPath {
  /// Path of a stack directly below the app root.
  pub fn stack(id: &str) -> Result<Self, ConstructError> {
    validate_id(id, "")?;
    Ok(Self(vec![id.to_string()]))
  }

  /// Path of a child construct.
  pub fn child(&self, id: &str) -> Result<Self, ConstructError> {
    validate_id(id, &self.to_string())?;
    let mut components = self.0.clone();
    components.push(id.to_string());
    Ok(Self(components))
  }

  pub fn components(&self) -> &[String] {
    &self.0
  }

  /// The last component.
  pub fn id(&self) -> &str {
    self.0.last().map(String::as_str).unwrap_or_default()
  }

  /// Id of the stack this path belongs to.
  pub fn stack_id(&self) -> &str {
    self.0.first().map(String::as_str).unwrap_or_default()
  }

  /// Derive the template logical id for this path.
  ///
  /// Components below the stack are stripped of non-alphanumeric characters
  /// and concatenated, then suffixed with a hash of the unstripped path so that
  /// `backend-api` and `backendapi` never collide.
  pub fn logical_id(&self) -> Result<LogicalId, ConstructError> {
    let below_stack = self.0.get(1..).unwrap_or_default();
    if below_stack.is_empty() {
      return Err(ConstructError::NoLogicalId { path: self.to_string() });
    }

    let human: String = below_stack
      .iter()
      .flat_map(|c| c.chars())
      .filter(char::is_ascii_alphanumeric)
      .collect();
    let suffix = short_digest(below_stack.join("/").as_bytes(), LOGICAL_ID_HASH_LEN);

    Ok(LogicalId(format!("{}{}", human, suffix)))
  }
}

impl fmt::Display for ConstructPath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0.join("/"))
  }
}

fn validate_id(id: &str, scope: &str) -> Result<(), ConstructError> {
  if id.is_empty() {
    return Err(ConstructError::EmptyId { scope: scope.to_string() });
  }
  if id.contains(PATH_SEPARATOR) {
    return Err(ConstructError::InvalidId { id: id.to_string() });
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn child_paths_join_with_separator() {
    let path = ConstructPath::stack("GoLambdaStack").unwrap().child("MyBucket").unwrap();
    assert_eq!(path.to_string(), "GoLambdaStack/MyBucket");
    assert_eq!(path.id(), "MyBucket");
    assert_eq!(path.stack_id(), "GoLambdaStack");
  }

  #[test]
  fn ids_with_separator_are_rejected() {
    let stack = ConstructPath::stack("S").unwrap();
    assert_eq!(
      stack.child("a/b").unwrap_err(),
      ConstructError::InvalidId { id: "a/b".to_string() }
    );
    assert!(matches!(stack.child(""), Err(ConstructError::EmptyId { .. })));
  }

  #[test]
  fn logical_id_strips_punctuation_and_appends_hash() {
    let path = ConstructPath::stack("S").unwrap().child("backend-api").unwrap();
    let id = path.logical_id().unwrap();
    assert!(id.as_str().starts_with("backendapi"));
    assert_eq!(id.as_str().len(), "backendapi".len() + LOGICAL_ID_HASH_LEN);
  }

  #[test]
  fn logical_id_ignores_stack_name() {
    let a = ConstructPath::stack("A").unwrap().child("MyBucket").unwrap();
    let b = ConstructPath::stack("B").unwrap().child("MyBucket").unwrap();
    assert_eq!(a.logical_id().unwrap(), b.logical_id().unwrap());
  }

  #[test]
  fn stripped_collisions_get_distinct_hashes() {
    let stack = ConstructPath::stack("S").unwrap();
    let a = stack.child("backend-api").unwrap().logical_id().unwrap();
    let b = stack.child("backendapi").unwrap().logical_id().unwrap();
    assert_ne!(a, b);
  }

  #[test]
  fn stack_path_has_no_logical_id() {
    let stack = ConstructPath::stack("S").unwrap();
    assert!(matches!(stack.logical_id(), Err(ConstructError::NoLogicalId { .. })));
  }
}
