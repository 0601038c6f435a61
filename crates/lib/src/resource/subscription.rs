use std::fmt;

use serde::{Deserialize, Serialize};

use crate::construct::LogicalId;

/// Storage mutation events a subscription can listen to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
  /// Any object creation.
  ObjectCreated,
  /// Object created through a `PUT` request.
  ObjectCreatedPut,
}

impl EventType {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::ObjectCreated => "s3:ObjectCreated:*",
      Self::ObjectCreatedPut => "s3:ObjectCreated:Put",
    }
  }
}

impl fmt::Display for EventType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// Declaration of an event subscription: bucket mutation invokes a function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionDef {
  pub bucket: LogicalId,
  pub event: EventType,
  pub function: LogicalId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionHandle {
  logical_id: LogicalId,
  event: EventType,
}

impl SubscriptionHandle {
  pub(crate) fn new(logical_id: LogicalId, event: EventType) -> Self {
    Self { logical_id, event }
  }

  pub fn logical_id(&self) -> &LogicalId {
    &self.logical_id
  }

  pub fn event(&self) -> EventType {
    self.event
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn event_names_match_notification_format() {
    assert_eq!(EventType::ObjectCreatedPut.to_string(), "s3:ObjectCreated:Put");
    assert_eq!(EventType::ObjectCreated.as_str(), "s3:ObjectCreated:*");
  }
}
