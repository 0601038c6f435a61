use serde::{Deserialize, Serialize};

use crate::construct::LogicalId;

use super::expr::{Expr, Pseudo};

/// Declaration of a gateway endpoint.
///
/// The gateway proxies every path and method to its single backing function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayDef {
  pub function: LogicalId,
  pub description: String,
  pub stage_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayHandle {
  logical_id: LogicalId,
  function: LogicalId,
  stage_name: String,
}

impl GatewayHandle {
  pub(crate) fn new(logical_id: LogicalId, def: &GatewayDef) -> Self {
    Self {
      logical_id,
      function: def.function.clone(),
      stage_name: def.stage_name.clone(),
    }
  }

  pub fn logical_id(&self) -> &LogicalId {
    &self.logical_id
  }

  /// The compute unit behind this endpoint.
  pub fn backing_function(&self) -> &LogicalId {
    &self.function
  }

  pub fn stage_name(&self) -> &str {
    &self.stage_name
  }

  /// Externally reachable address of the deployed stage.
  pub fn url(&self) -> Expr {
    Expr::Join(vec![
      Expr::literal("https://"),
      Expr::Ref(self.logical_id.clone()),
      Expr::literal(".execute-api."),
      Expr::Pseudo(Pseudo::Region),
      Expr::literal("."),
      Expr::Pseudo(Pseudo::UrlSuffix),
      Expr::literal(format!("/{}/", self.stage_name)),
    ])
  }
}
