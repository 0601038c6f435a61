//! Initialize a new stack configuration directory.
//!
//! Writes a sample `stack.json` that the CLI picks up from the working
//! directory.

mod templates;

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::consts::CONFIG_FILE_NAME;

pub use templates::STACK_JSON_TEMPLATE;

/// Errors that can occur during initialization.
#[derive(Debug, Error)]
pub enum InitError {
  #[error("file already exists: {}", path.display())]
  PathExists { path: PathBuf },

  #[error("failed to create directory {}: {source}", path.display())]
  CreateDir { path: PathBuf, source: std::io::Error },

  #[error("failed to write file {}: {source}", path.display())]
  WriteFile { path: PathBuf, source: std::io::Error },
}

/// Result of a successful initialization.
#[derive(Debug)]
pub struct InitResult {
  pub config_dir: PathBuf,
  /// Path to the created `stack.json`
  pub config_file: PathBuf,
}

/// Create `dir` if needed and write `stack.json` into it.
///
/// # Errors
///
/// Fails if `stack.json` already exists or the file system refuses.
pub fn init(dir: &Path) -> Result<InitResult, InitError> {
  fs::create_dir_all(dir).map_err(|source| InitError::CreateDir {
    path: dir.to_path_buf(),
    source,
  })?;

  let config_file = dir.join(CONFIG_FILE_NAME);
  if config_file.exists() {
    return Err(InitError::PathExists { path: config_file });
  }

  fs::write(&config_file, STACK_JSON_TEMPLATE).map_err(|source| InitError::WriteFile {
    path: config_file.clone(),
    source,
  })?;
  info!(path = %config_file.display(), "wrote stack config");

  Ok(InitResult {
    config_dir: dir.to_path_buf(),
    config_file,
  })
}
