use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::consts::{ARTIFACT_KEY, FUNCTION_MEMORY_MB, FUNCTION_TIMEOUT_SECS};
use crate::construct::LogicalId;
use crate::target::{Runtime, RuntimeTarget};

/// Where the function package lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeLocation {
  /// The storage container holding the artifact.
  pub bucket: LogicalId,
  /// Object key of the artifact inside the container.
  pub key: String,
}

/// Declaration of a compute unit (managed function).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDef {
  pub function_name: String,
  /// Entry point the runtime invokes.
  pub handler: String,
  pub runtime: Runtime,
  pub target: RuntimeTarget,
  pub code: CodeLocation,
  pub memory_size: u32,
  pub timeout_secs: u32,
  pub environment: BTreeMap<String, String>,
}

impl FunctionDef {
  /// A Go function packaged at the standard artifact key.
  ///
  /// Limits are fixed at 128 MB and 10 seconds and the environment is derived
  /// solely from the runtime target.
  pub fn go_lambda(function_name: &str, handler: &str, bucket: &LogicalId) -> Self {
    let target = RuntimeTarget::lambda();
    Self {
      function_name: function_name.to_string(),
      handler: handler.to_string(),
      runtime: Runtime::Go1x,
      environment: target.environment(),
      target,
      code: CodeLocation {
        bucket: bucket.clone(),
        key: ARTIFACT_KEY.to_string(),
      },
      memory_size: FUNCTION_MEMORY_MB,
      timeout_secs: FUNCTION_TIMEOUT_SECS,
    }
  }
}

/// Reference to a declared compute unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputeUnitHandle {
  logical_id: LogicalId,
  function_name: String,
  entry_point: String,
  environment: BTreeMap<String, String>,
}

impl ComputeUnitHandle {
  pub(crate) fn new(logical_id: LogicalId, def: &FunctionDef) -> Self {
    Self {
      logical_id,
      function_name: def.function_name.clone(),
      entry_point: def.handler.clone(),
      environment: def.environment.clone(),
    }
  }

  pub fn logical_id(&self) -> &LogicalId {
    &self.logical_id
  }

  pub fn function_name(&self) -> &str {
    &self.function_name
  }

  pub fn entry_point(&self) -> &str {
    &self.entry_point
  }

  pub fn environment(&self) -> &BTreeMap<String, String> {
    &self.environment
  }
}
