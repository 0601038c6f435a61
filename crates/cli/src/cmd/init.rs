//! Implementation of the `lstack init` command.
//!
//! Writes a sample `stack.json` into the given directory.

use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;

use lambdastack_lib::init::init;

use crate::output::symbols;

pub fn cmd_init(path: &Path) -> Result<()> {
  let result = init(path).context("Failed to initialize configuration")?;

  println!(
    "{} {}",
    symbols::SUCCESS.green(),
    "Initialized stack configuration!".green().bold()
  );
  println!();
  println!(
    "  {} Config directory: {}",
    symbols::INFO.cyan(),
    result.config_dir.display()
  );
  println!(
    "  {} Config file:      {}",
    symbols::INFO.cyan(),
    result.config_file.display()
  );
  println!();
  println!("Run `lstack synth` in that directory to render the template.");

  Ok(())
}
