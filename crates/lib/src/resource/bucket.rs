use serde::{Deserialize, Serialize};

use crate::construct::LogicalId;

/// Declaration of a storage container (versioned object bucket).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketDef {
  pub bucket_name: String,
  pub versioned: bool,
}

/// Reference to a declared storage container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketHandle {
  logical_id: LogicalId,
  bucket_name: String,
}

impl BucketHandle {
  pub(crate) fn new(logical_id: LogicalId, bucket_name: &str) -> Self {
    Self {
      logical_id,
      bucket_name: bucket_name.to_string(),
    }
  }

  pub fn logical_id(&self) -> &LogicalId {
    &self.logical_id
  }

  pub fn bucket_name(&self) -> &str {
    &self.bucket_name
  }
}
