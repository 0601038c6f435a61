use std::fmt;

use serde::{Deserialize, Serialize};

use crate::construct::LogicalId;

/// Stages of the deployment pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PipelineStage {
  /// Reads the artifact from the storage container.
  Source,
  /// Invokes the compute unit.
  Deploy,
}

impl PipelineStage {
  pub const ALL: [PipelineStage; 2] = [PipelineStage::Source, PipelineStage::Deploy];

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Source => "Source",
      Self::Deploy => "Deploy",
    }
  }
}

impl fmt::Display for PipelineStage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// Declaration of the optional two-stage deployment pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineDef {
  pub source_bucket: LogicalId,
  pub source_key: String,
  pub function: LogicalId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineHandle {
  logical_id: LogicalId,
}

impl PipelineHandle {
  pub(crate) fn new(logical_id: LogicalId) -> Self {
    Self { logical_id }
  }

  pub fn logical_id(&self) -> &LogicalId {
    &self.logical_id
  }

  pub fn stages(&self) -> &'static [PipelineStage] {
    &PipelineStage::ALL
  }
}
