//! Template expressions.
//!
//! Values that are only known at deploy time (resource names, ARNs, URLs) are
//! declared as [`Expr`] trees and rendered into template intrinsics during
//! synthesis.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::construct::LogicalId;

/// Deploy-time parameters provided by the orchestration engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pseudo {
  AccountId,
  Partition,
  Region,
  UrlSuffix,
}

impl Pseudo {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::AccountId => "AWS::AccountId",
      Self::Partition => "AWS::Partition",
      Self::Region => "AWS::Region",
      Self::UrlSuffix => "AWS::URLSuffix",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
  Literal(String),
  /// The primary identifier of a resource.
  Ref(LogicalId),
  /// A named attribute of a resource.
  GetAtt(LogicalId, String),
  Pseudo(Pseudo),
  /// Concatenation with an empty delimiter.
  Join(Vec<Expr>),
}

impl Expr {
  pub fn literal(value: impl Into<String>) -> Self {
    Self::Literal(value.into())
  }

  pub fn get_att(id: &LogicalId, attribute: &str) -> Self {
    Self::GetAtt(id.clone(), attribute.to_string())
  }

  /// Every logical id this expression refers to, in order of appearance.
  pub fn references(&self) -> Vec<&LogicalId> {
    match self {
      Self::Ref(id) | Self::GetAtt(id, _) => vec![id],
      Self::Join(parts) => parts.iter().flat_map(Expr::references).collect(),
      Self::Literal(_) | Self::Pseudo(_) => Vec::new(),
    }
  }

  /// Render into template intrinsic-function form.
  pub fn render(&self) -> Value {
    match self {
      Self::Literal(s) => Value::String(s.clone()),
      Self::Ref(id) => json!({ "Ref": id.as_str() }),
      Self::GetAtt(id, attr) => json!({ "Fn::GetAtt": [id.as_str(), attr] }),
      Self::Pseudo(p) => json!({ "Ref": p.as_str() }),
      Self::Join(parts) => {
        let rendered: Vec<Value> = parts.iter().map(Expr::render).collect();
        json!({ "Fn::Join": ["", rendered] })
      }
    }
  }
}

impl From<&str> for Expr {
  fn from(value: &str) -> Self {
    Self::Literal(value.to_string())
  }
}

/// `arn:<partition>:<service>:<region>:<account>:<resource...>`
pub fn arn(service: &str, resource: Vec<Expr>) -> Expr {
  let mut parts = vec![
    Expr::literal("arn:"),
    Expr::Pseudo(Pseudo::Partition),
    Expr::literal(format!(":{}:", service)),
    Expr::Pseudo(Pseudo::Region),
    Expr::literal(":"),
    Expr::Pseudo(Pseudo::AccountId),
    Expr::literal(":"),
  ];
  parts.extend(resource);
  Expr::Join(parts)
}
