//! Diff command implementation.
//!
//! Compares the freshly composed stack against the manifest recorded in the
//! assembly directory by the last `synth`.

use anyhow::{Context, Result};
use owo_colors::{OwoColorize, Stream};

use lambdastack_lib::diff::{ResourceChange, StackDiff, compute_diff};
use lambdastack_lib::synth::Assembly;

use crate::output::{print_info, print_json, symbols};

use super::StackArgs;

pub fn cmd_diff(args: &StackArgs) -> Result<()> {
  let (_, stack) = args.compose()?;
  let stack_id = &stack.manifest.stack_id;

  let current = Assembly::new(&args.out)
    .read_stack(stack_id)
    .with_context(|| format!("Failed to read assembly at {}", args.out.display()))?;
  let diff = compute_diff(&stack.manifest, current.as_ref()).context("Failed to compute diff")?;

  if args.output.is_json() {
    let output = serde_json::json!({
      "stack": stack_id,
      "previously_synthesized": current.is_some(),
      "diff": diff,
    });
    return print_json(&output);
  }

  if current.is_none() {
    print_info(&format!("{} has not been synthesized yet", stack_id));
  }
  print_human_diff(stack_id, &diff);
  Ok(())
}

fn print_human_diff(stack_id: &str, diff: &StackDiff) {
  println!("Stack {}", stack_id);

  if diff.is_empty() {
    println!("No changes.");
    return;
  }

  for change in &diff.to_create {
    print_change(symbols::ADD.if_supports_color(Stream::Stdout, |s| s.green()), change);
  }
  for change in &diff.to_update {
    print_change(symbols::MODIFY.if_supports_color(Stream::Stdout, |s| s.yellow()), change);
  }
  for change in &diff.to_delete {
    print_change(symbols::REMOVE.if_supports_color(Stream::Stdout, |s| s.red()), change);
  }
  for name in &diff.settings_changed {
    println!(
      "  {} stack {}",
      symbols::MODIFY.if_supports_color(Stream::Stdout, |s| s.yellow()),
      name
    );
  }
  for name in &diff.outputs_changed {
    println!(
      "  {} output {}",
      symbols::MODIFY.if_supports_color(Stream::Stdout, |s| s.yellow()),
      name
    );
  }

  println!();
  println!(
    "{} to create, {} to update, {} to delete, {} unchanged",
    diff.to_create.len(),
    diff.to_update.len(),
    diff.to_delete.len(),
    diff.unchanged.len()
  );
}

fn print_change(symbol: impl std::fmt::Display, change: &ResourceChange) {
  println!(
    "  {} {} {} {}",
    symbol,
    change.kind,
    change.logical_id,
    format!("({})", change.path).if_supports_color(Stream::Stdout, |s| s.dimmed())
  );
}
