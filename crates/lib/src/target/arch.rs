use std::fmt;

use serde::{Deserialize, Serialize};

/// CPU architectures a function package can be compiled for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
  X86_64,
  Aarch64,
}

impl Arch {
  /// Returns the identifier the Go toolchain expects in `GOARCH`
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::X86_64 => "amd64",
      Self::Aarch64 => "arm64",
    }
  }

  /// Returns the architecture name used by the function service
  pub fn service_name(&self) -> &'static str {
    match self {
      Self::X86_64 => "x86_64",
      Self::Aarch64 => "arm64",
    }
  }
}

impl fmt::Display for Arch {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}
