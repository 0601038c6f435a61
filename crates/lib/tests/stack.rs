//! End-to-end tests for the public lambdastack-lib API.
//!
//! These compose the stack, synthesize it into an assembly directory and read
//! it back the way the CLI does.

use lambdastack_lib::compose::LambdaStack;
use lambdastack_lib::config::StackOptions;
use lambdastack_lib::construct::App;
use lambdastack_lib::dag::DeclarationDag;
use lambdastack_lib::diff::compute_diff;
use lambdastack_lib::resource::ResourceKind;
use lambdastack_lib::synth::Assembly;
use tempfile::TempDir;

fn compose(pipeline: bool) -> LambdaStack {
  let options = StackOptions {
    pipeline,
    ..StackOptions::default()
  };
  LambdaStack::compose(&App::new(), "GoLambdaStack", Some(&options)).unwrap()
}

#[test]
fn deployment_waves_follow_creation_order() {
  let stack = compose(true);
  let dag = DeclarationDag::from_manifest(&stack.manifest).unwrap();
  let waves = dag.waves().unwrap();

  // bucket -> function -> {subscription, gateway, pipeline}
  assert_eq!(waves.len(), 3);
  assert_eq!(waves[0], vec![stack.bucket.logical_id().clone()]);
  assert_eq!(waves[1], vec![stack.function.logical_id().clone()]);
  assert_eq!(
    waves[2],
    vec![
      stack.subscription.logical_id().clone(),
      stack.gateway.logical_id().clone(),
      stack.pipeline.as_ref().unwrap().logical_id().clone(),
    ]
  );

  let declared: Vec<_> = stack.manifest.resources.iter().map(|r| r.logical_id.clone()).collect();
  assert_eq!(dag.topological_order().unwrap(), declared);
}

#[test]
fn synth_then_diff_round_trip() {
  let temp = TempDir::new().unwrap();
  let assembly = Assembly::new(temp.path().join("stack.out"));

  let mut app = App::new();
  let stack = compose(false);
  app.add_stack(stack.manifest.clone()).unwrap();
  assembly.write(app.stacks()).unwrap();

  let stored = assembly.read_stack("GoLambdaStack").unwrap();
  assert!(compute_diff(&stack.manifest, stored.as_ref()).unwrap().is_empty());

  let with_pipeline = compose(true);
  let diff = compute_diff(&with_pipeline.manifest, stored.as_ref()).unwrap();
  let created: Vec<_> = diff.to_create.iter().map(|c| c.kind).collect();
  assert_eq!(created, vec![ResourceKind::Pipeline]);
}

#[test]
fn multiple_stacks_share_an_assembly() {
  let temp = TempDir::new().unwrap();
  let assembly = Assembly::new(temp.path());

  let mut app = App::new();
  for id in ["Staging", "Production"] {
    let stack = LambdaStack::compose(&app, id, None).unwrap();
    app.add_stack(stack.manifest).unwrap();
  }
  assembly.write(app.stacks()).unwrap();

  let stored = assembly.read().unwrap().unwrap();
  assert_eq!(stored.stacks.len(), 2);
  assert!(assembly.template_path("Staging").exists());
  assert!(assembly.template_path("Production").exists());
}
