use std::fmt;

use serde::{Deserialize, Serialize};

/// Operating systems a function package can be compiled for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
  Linux,
  MacOs,
}

impl Os {
  /// Returns the identifier the Go toolchain expects in `GOOS`
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Linux => "linux",
      Self::MacOs => "darwin",
    }
  }
}

impl fmt::Display for Os {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn macos_uses_darwin_identifier() {
    assert_eq!(Os::MacOs.as_str(), "darwin");
    assert_eq!(Os::Linux.to_string(), "linux");
  }
}
