mod diff;
mod init;
mod list;
mod synth;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tracing::debug;

use lambdastack_lib::compose::LambdaStack;
use lambdastack_lib::config::StackOptions;
use lambdastack_lib::consts::{CONFIG_FILE_NAME, DEFAULT_OUT_DIR};
use lambdastack_lib::construct::App;

use crate::output::OutputFormat;

pub use diff::cmd_diff;
pub use init::cmd_init;
pub use list::cmd_list;
pub use synth::cmd_synth;

/// Options shared by every command that composes the stack.
#[derive(Debug, Args)]
pub struct StackArgs {
  /// Stack configuration file (default: ./stack.json if present)
  #[arg(short, long)]
  pub config: Option<PathBuf>,

  /// Assembly output directory
  #[arg(long, default_value = DEFAULT_OUT_DIR)]
  pub out: PathBuf,

  /// Override the stack id
  #[arg(long)]
  pub stack: Option<String>,

  /// Include the deployment pipeline
  #[arg(long)]
  pub pipeline: bool,

  /// Output format
  #[arg(short, long, value_enum, default_value_t)]
  pub output: OutputFormat,
}

impl StackArgs {
  /// Resolve options: config file, then environment, then flags.
  pub fn options(&self) -> Result<StackOptions> {
    let default_config = Path::new(CONFIG_FILE_NAME);
    let options = match &self.config {
      Some(path) => StackOptions::load(path)?,
      None if default_config.exists() => StackOptions::load(default_config)?,
      None => StackOptions::default(),
    };

    let mut options = options
      .with_env_overrides()
      .context("Failed to apply environment overrides")?;
    if self.pipeline {
      options.pipeline = true;
    }
    if let Some(stack) = &self.stack {
      options.stack_id = stack.clone();
    }

    debug!(?options, "resolved stack options");
    Ok(options)
  }

  /// Compose the stack and register it with a fresh app.
  pub fn compose(&self) -> Result<(App, LambdaStack)> {
    let options = self.options()?;
    let mut app = App::new();
    let stack = LambdaStack::compose(&app, &options.stack_id, Some(&options))
      .with_context(|| format!("Failed to compose stack {}", options.stack_id))?;
    app.add_stack(stack.manifest.clone())?;
    Ok((app, stack))
  }
}
