//! Runtime targets for compute units.
//!
//! A [`RuntimeTarget`] describes what the function artifact was cross-compiled
//! for. It is handed to the function as a fixed set of environment variables.

pub mod arch;
pub mod os;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub use arch::Arch;
pub use os::Os;

pub const CGO_ENABLED: &str = "CGO_ENABLED";
pub const GOOS: &str = "GOOS";
pub const GOARCH: &str = "GOARCH";

/// Managed runtime the function service executes the artifact with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Runtime {
  #[serde(rename = "go1.x")]
  Go1x,
}

impl Runtime {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Go1x => "go1.x",
    }
  }
}

impl fmt::Display for Runtime {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// Cross-compilation target (OS, architecture, native interop flag).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuntimeTarget {
  pub os: Os,
  pub arch: Arch,
  /// Whether the artifact links against native libraries.
  pub cgo: bool,
}

impl RuntimeTarget {
  /// Statically linked linux/amd64, the only target the function service runs.
  pub const fn lambda() -> Self {
    Self {
      os: Os::Linux,
      arch: Arch::X86_64,
      cgo: false,
    }
  }

  /// Environment variables describing this target.
  ///
  /// Always exactly three entries: `CGO_ENABLED`, `GOOS` and `GOARCH`.
  pub fn environment(&self) -> BTreeMap<String, String> {
    let cgo = if self.cgo { "1" } else { "0" };
    BTreeMap::from([
      (CGO_ENABLED.to_string(), cgo.to_string()),
      (GOOS.to_string(), self.os.as_str().to_string()),
      (GOARCH.to_string(), self.arch.as_str().to_string()),
    ])
  }
}

impl fmt::Display for RuntimeTarget {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}", self.os, self.arch)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn lambda_target_environment() {
    let env = RuntimeTarget::lambda().environment();
    assert_eq!(env.len(), 3);
    assert_eq!(env[CGO_ENABLED], "0");
    assert_eq!(env[GOOS], "linux");
    assert_eq!(env[GOARCH], "amd64");
  }

  #[test]
  fn environment_always_has_three_keys() {
    let target = RuntimeTarget {
      os: Os::MacOs,
      arch: Arch::Aarch64,
      cgo: true,
    };
    let env = target.environment();
    assert_eq!(env.keys().collect::<Vec<_>>(), vec![CGO_ENABLED, GOARCH, GOOS]);
    assert_eq!(env[CGO_ENABLED], "1");
  }

  #[test]
  fn runtime_serializes_to_service_identifier() {
    assert_eq!(serde_json::to_string(&Runtime::Go1x).unwrap(), "\"go1.x\"");
    assert_eq!(Runtime::Go1x.to_string(), "go1.x");
  }
}
