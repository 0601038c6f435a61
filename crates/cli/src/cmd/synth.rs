//! Implementation of the `lstack synth` command.
//!
//! Composes the stack, renders its template and writes the assembly
//! directory for the external orchestrator.

use anyhow::{Context, Result};

use lambdastack_lib::synth::Assembly;

use crate::output::{print_json, print_stat, print_success, truncate_hash};

use super::StackArgs;

pub fn cmd_synth(args: &StackArgs) -> Result<()> {
  let (app, stack) = args.compose()?;

  let assembly = Assembly::new(&args.out);
  let synthesized = assembly
    .write(app.stacks())
    .with_context(|| format!("Failed to write assembly to {}", args.out.display()))?;

  let Some(synthesized) = synthesized.into_iter().next() else {
    return Ok(());
  };

  if args.output.is_json() {
    return print_json(&synthesized.template);
  }

  let stack_id = &stack.manifest.stack_id;
  print_success(&format!("Synthesized {}", stack_id));
  print_stat("Resources", &stack.manifest.resources.len().to_string());
  print_stat("Template resources", &synthesized.template.resources.len().to_string());
  print_stat("Pipeline", if stack.pipeline.is_some() { "enabled" } else { "disabled" });
  print_stat("Gateway stage", stack.gateway.stage_name());
  print_stat("Hash", truncate_hash(&synthesized.hash.0));
  print_stat("Assembly", &assembly.dir().display().to_string());
  print_stat("Template", &assembly.template_path(stack_id).display().to_string());

  Ok(())
}
