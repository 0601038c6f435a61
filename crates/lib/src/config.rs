//! Stack-level configuration.
//!
//! Options are read from a JSON file (`stack.json` by convention). Every
//! field is optional; missing fields fall back to the defaults of the Go
//! Lambda stack. A few values can be overridden from the environment:
//!
//! - `LAMBDASTACK_ACCOUNT`: target account id
//! - `LAMBDASTACK_REGION`: target region
//! - `LAMBDASTACK_PIPELINE`: `true`/`false`, include the deployment pipeline

use std::collections::BTreeMap;
use std::env::VarError;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::consts::{DEFAULT_BUCKET_NAME, DEFAULT_FUNCTION_NAME, DEFAULT_HANDLER, DEFAULT_STACK_ID};
use crate::manifest::Environment;

pub const ACCOUNT_ENV: &str = "LAMBDASTACK_ACCOUNT";
pub const REGION_ENV: &str = "LAMBDASTACK_REGION";
pub const PIPELINE_ENV: &str = "LAMBDASTACK_PIPELINE";

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config {}: {source}", path.display())]
  Read { path: PathBuf, source: std::io::Error },

  #[error("failed to parse config {}: {source}", path.display())]
  Parse { path: PathBuf, source: serde_json::Error },

  #[error("invalid value for {var}: '{value}' (expected {expected})")]
  InvalidEnv {
    var: String,
    value: String,
    expected: &'static str,
  },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StackOptions {
  pub stack_id: String,
  pub description: Option<String>,
  pub bucket_name: String,
  pub function_name: String,
  /// Entry point of the compute unit.
  pub handler: String,
  /// Include the deployment pipeline.
  pub pipeline: bool,
  pub env: Option<Environment>,
  pub tags: BTreeMap<String, String>,
}

impl Default for StackOptions {
  fn default() -> Self {
    Self {
      stack_id: DEFAULT_STACK_ID.to_string(),
      description: None,
      bucket_name: DEFAULT_BUCKET_NAME.to_string(),
      function_name: DEFAULT_FUNCTION_NAME.to_string(),
      handler: DEFAULT_HANDLER.to_string(),
      pipeline: false,
      env: None,
      tags: BTreeMap::new(),
    }
  }
}

impl StackOptions {
  /// Load options from a JSON file.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    let options = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })?;
    debug!(path = %path.display(), "loaded stack options");
    Ok(options)
  }

  /// Apply `LAMBDASTACK_*` environment overrides.
  pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
    let account = env_var(ACCOUNT_ENV)?;
    let region = env_var(REGION_ENV)?;
    if account.is_some() || region.is_some() {
      let env = self.env.get_or_insert_with(Environment::default);
      if account.is_some() {
        env.account = account;
      }
      if region.is_some() {
        env.region = region;
      }
    }

    if let Some(value) = env_var(PIPELINE_ENV)? {
      self.pipeline = parse_bool(&value).ok_or_else(|| ConfigError::InvalidEnv {
        var: PIPELINE_ENV.to_string(),
        value: value.clone(),
        expected: "true or false",
      })?;
    }

    Ok(self)
  }
}

/// Read an environment variable. Unset is `None`; non-Unicode is an error.
fn env_var(var: &str) -> Result<Option<String>, ConfigError> {
  match std::env::var(var) {
    Ok(value) => Ok(Some(value)),
    Err(VarError::NotPresent) => Ok(None),
    Err(VarError::NotUnicode(raw)) => Err(ConfigError::InvalidEnv {
      var: var.to_string(),
      value: raw.to_string_lossy().into_owned(),
      expected: "valid unicode",
    }),
  }
}

fn parse_bool(value: &str) -> Option<bool> {
  match value.trim().to_ascii_lowercase().as_str() {
    "1" | "true" | "yes" | "on" => Some(true),
    "0" | "false" | "no" | "off" => Some(false),
    _ => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;
  use tempfile::TempDir;

  #[test]
  fn defaults_describe_the_go_lambda_stack() {
    let options = StackOptions::default();
    assert_eq!(options.stack_id, "GoLambdaStack");
    assert_eq!(options.function_name, "helloHandler");
    assert_eq!(options.handler, "main");
    assert!(!options.pipeline);
  }

  #[test]
  fn partial_file_keeps_defaults() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("stack.json");
    fs::write(&path, r#"{ "pipeline": true, "tags": { "team": "api" } }"#).unwrap();

    let options = StackOptions::load(&path).unwrap();
    assert!(options.pipeline);
    assert_eq!(options.tags["team"], "api");
    assert_eq!(options.bucket_name, DEFAULT_BUCKET_NAME);
  }

  #[test]
  fn unknown_fields_are_rejected() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("stack.json");
    fs::write(&path, r#"{ "memory": 512 }"#).unwrap();

    assert!(matches!(StackOptions::load(&path), Err(ConfigError::Parse { .. })));
  }

  #[test]
  fn missing_file_is_a_read_error() {
    let temp = TempDir::new().unwrap();
    let err = StackOptions::load(&temp.path().join("nope.json")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
    assert!(err.to_string().contains("nope.json"));
  }

  #[test]
  #[serial]
  fn env_overrides_account_region_and_pipeline() {
    temp_env::with_vars(
      [
        (ACCOUNT_ENV, Some("123456789012")),
        (REGION_ENV, Some("eu-west-1")),
        (PIPELINE_ENV, Some("yes")),
      ],
      || {
        let options = StackOptions::default().with_env_overrides().unwrap();
        let env = options.env.unwrap();
        assert_eq!(env.account.as_deref(), Some("123456789012"));
        assert_eq!(env.region.as_deref(), Some("eu-west-1"));
        assert!(options.pipeline);
      },
    );
  }

  #[test]
  #[serial]
  fn env_region_keeps_configured_account() {
    temp_env::with_vars(
      [
        (ACCOUNT_ENV, None),
        (REGION_ENV, Some("us-east-2")),
        (PIPELINE_ENV, None),
      ],
      || {
        let options = StackOptions {
          env: Some(Environment {
            account: Some("111".to_string()),
            region: Some("us-east-1".to_string()),
          }),
          pipeline: true,
          ..StackOptions::default()
        }
        .with_env_overrides()
        .unwrap();
        let env = options.env.unwrap();
        assert_eq!(env.account.as_deref(), Some("111"));
        assert_eq!(env.region.as_deref(), Some("us-east-2"));
        assert!(options.pipeline);
      },
    );
  }

  #[test]
  #[serial]
  fn invalid_pipeline_env_is_an_error() {
    temp_env::with_var(PIPELINE_ENV, Some("maybe"), || {
      let err = StackOptions::default().with_env_overrides().unwrap_err();
      assert!(matches!(err, ConfigError::InvalidEnv { .. }));
    });
  }

  #[cfg(unix)]
  #[test]
  #[serial]
  fn non_unicode_env_is_an_error() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let raw = OsStr::from_bytes(&[0x66, 0x6f, 0xff]);
    for var in [ACCOUNT_ENV, REGION_ENV, PIPELINE_ENV] {
      let vars = [ACCOUNT_ENV, REGION_ENV, PIPELINE_ENV].map(|name| (name, (name == var).then_some(raw)));
      temp_env::with_vars(vars, || {
        let err = StackOptions::default().with_env_overrides().unwrap_err();
        assert!(
          matches!(&err, ConfigError::InvalidEnv { var: v, expected: "valid unicode", .. } if v == var),
          "unexpected error for {}: {}",
          var,
          err
        );
      });
    }
  }

  #[test]
  #[serial]
  fn no_env_leaves_options_untouched() {
    temp_env::with_vars(
      [(ACCOUNT_ENV, None::<&str>), (REGION_ENV, None), (PIPELINE_ENV, None)],
      || {
        let options = StackOptions::default().with_env_overrides().unwrap();
        assert_eq!(options, StackOptions::default());
      },
    );
  }
}
