//! Implementation of the `lstack list` command.
//!
//! Prints the declared resources in creation order together with the
//! deployment wave each one lands in.

use anyhow::{Context, Result};
use owo_colors::{OwoColorize, Stream};
use serde::Serialize;

use lambdastack_lib::construct::LogicalId;
use lambdastack_lib::dag::DeclarationDag;
use lambdastack_lib::resource::ResourceKind;

use crate::output::{print_json, symbols};

use super::StackArgs;

#[derive(Serialize)]
struct ListedResource {
  logical_id: LogicalId,
  kind: ResourceKind,
  path: String,
  wave: usize,
  depends_on: Vec<LogicalId>,
}

pub fn cmd_list(args: &StackArgs) -> Result<()> {
  let (_, stack) = args.compose()?;
  let dag = DeclarationDag::from_manifest(&stack.manifest).context("Invalid dependency graph")?;
  let waves = dag.wave_index()?;

  let listed: Vec<ListedResource> = stack
    .manifest
    .resources
    .iter()
    .map(|entry| ListedResource {
      logical_id: entry.logical_id.clone(),
      kind: entry.kind(),
      path: entry.path.to_string(),
      wave: waves.get(&entry.logical_id).copied().unwrap_or_default(),
      depends_on: dag.dependencies(&entry.logical_id),
    })
    .collect();

  if args.output.is_json() {
    return print_json(&listed);
  }

  for resource in &listed {
    let deps = if resource.depends_on.is_empty() {
      String::new()
    } else {
      let ids: Vec<String> = resource.depends_on.iter().map(ToString::to_string).collect();
      format!(" {} {}", symbols::ARROW, ids.join(", "))
    };
    println!(
      "[{}] {:<20} {}{}",
      resource.wave,
      resource.kind.to_string(),
      resource.logical_id.if_supports_color(Stream::Stdout, |s| s.bold()),
      deps.if_supports_color(Stream::Stdout, |s| s.dimmed())
    );
  }

  Ok(())
}
