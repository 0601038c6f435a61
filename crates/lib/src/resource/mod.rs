//! Resource declarations.
//!
//! Each resource kind has a serializable definition (`*Def`) stored in the
//! stack manifest, and a lightweight handle returned to the composer so later
//! declarations can reference it.

mod bucket;
pub mod expr;
mod function;
mod gateway;
mod pipeline;
mod subscription;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::construct::LogicalId;

pub use bucket::{BucketDef, BucketHandle};
pub use expr::{Expr, Pseudo};
pub use function::{CodeLocation, ComputeUnitHandle, FunctionDef};
pub use gateway::{GatewayDef, GatewayHandle};
pub use pipeline::{PipelineDef, PipelineHandle, PipelineStage};
pub use subscription::{EventType, SubscriptionDef, SubscriptionHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
  StorageContainer,
  ComputeUnit,
  EventSubscription,
  GatewayEndpoint,
  Pipeline,
}

impl ResourceKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::StorageContainer => "storage-container",
      Self::ComputeUnit => "compute-unit",
      Self::EventSubscription => "event-subscription",
      Self::GatewayEndpoint => "gateway-endpoint",
      Self::Pipeline => "pipeline",
    }
  }
}

impl fmt::Display for ResourceKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// A declared resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Resource {
  StorageContainer(BucketDef),
  ComputeUnit(FunctionDef),
  EventSubscription(SubscriptionDef),
  GatewayEndpoint(GatewayDef),
  Pipeline(PipelineDef),
}

impl Resource {
  pub fn kind(&self) -> ResourceKind {
    match self {
      Self::StorageContainer(_) => ResourceKind::StorageContainer,
      Self::ComputeUnit(_) => ResourceKind::ComputeUnit,
      Self::EventSubscription(_) => ResourceKind::EventSubscription,
      Self::GatewayEndpoint(_) => ResourceKind::GatewayEndpoint,
      Self::Pipeline(_) => ResourceKind::Pipeline,
    }
  }

  /// Logical ids of the resources this one depends on.
  pub fn references(&self) -> Vec<&LogicalId> {
    match self {
      Self::StorageContainer(_) => Vec::new(),
      Self::ComputeUnit(def) => vec![&def.code.bucket],
      Self::EventSubscription(def) => vec![&def.bucket, &def.function],
      Self::GatewayEndpoint(def) => vec![&def.function],
      Self::Pipeline(def) => vec![&def.source_bucket, &def.function],
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn id(s: &str) -> LogicalId {
    LogicalId(s.to_string())
  }

  #[test]
  fn gateway_references_exactly_one_function() {
    let resource = Resource::GatewayEndpoint(GatewayDef {
      function: id("Fn"),
      description: "api".to_string(),
      stage_name: "prod".to_string(),
    });
    assert_eq!(resource.kind(), ResourceKind::GatewayEndpoint);
    assert_eq!(resource.references(), vec![&id("Fn")]);
  }

  #[test]
  fn serialized_form_is_tagged_by_kind() {
    let resource = Resource::StorageContainer(BucketDef {
      bucket_name: "b".to_string(),
      versioned: true,
    });
    let json = serde_json::to_value(&resource).unwrap();
    assert_eq!(json["kind"], "storage_container");
    assert_eq!(json["bucket_name"], "b");

    let back: Resource = serde_json::from_value(json).unwrap();
    assert_eq!(back, resource);
  }
}
