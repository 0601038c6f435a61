//! Stack composition.
//!
//! [`StackBuilder`] appends resource declarations to a stack manifest and hands
//! back typed handles. [`LambdaStack::compose`] drives it through the fixed
//! sequence that makes up the Go Lambda stack:
//!
//! 1. storage container holding the function artifact
//! 2. compute unit packaged from that container
//! 3. event subscription: object-created events invoke the compute unit
//! 4. gateway endpoint in front of the compute unit
//! 5. optionally, a deployment pipeline
//!
//! Composition only builds the in-memory declaration graph. Nothing is
//! provisioned here; any error aborts the whole pass.

use std::collections::HashSet;

use thiserror::Error;
use tracing::{debug, info};

use crate::config::StackOptions;
use crate::consts::{ARTIFACT_KEY, GATEWAY_STAGE_NAME, URL_OUTPUT_NAME};
use crate::construct::{App, ConstructError, ConstructPath, LogicalId};
use crate::manifest::{ManifestError, OutputDef, ResourceEntry, StackManifest};
use crate::resource::{
  BucketDef, BucketHandle, ComputeUnitHandle, EventType, Expr, FunctionDef, GatewayDef, GatewayHandle, PipelineDef,
  PipelineHandle, Resource, SubscriptionDef, SubscriptionHandle,
};

pub const BUCKET_ID: &str = "MyBucket";
pub const FUNCTION_ID: &str = "backend-api";
pub const SUBSCRIPTION_ID: &str = "BucketNotifications";
pub const GATEWAY_ID: &str = "backend-api-endpoint";
pub const GATEWAY_DESCRIPTION: &str = "Exposed endpoint for your GO lambda API";
pub const PIPELINE_ID: &str = "DeployPipeline";

#[derive(Debug, Error)]
pub enum ComposeError {
  #[error(transparent)]
  Construct(#[from] ConstructError),

  #[error(transparent)]
  Manifest(#[from] ManifestError),
}

/// Write-once builder for one stack's declaration graph.
pub struct StackBuilder {
  path: ConstructPath,
  manifest: StackManifest,
  child_ids: HashSet<String>,
}

impl StackBuilder {
  pub fn new(path: ConstructPath, options: &StackOptions) -> Self {
    let mut manifest = StackManifest::new(path.stack_id());
    manifest.description = options.description.clone();
    manifest.env = options.env.clone();
    manifest.tags = options.tags.clone();

    Self {
      path,
      manifest,
      child_ids: HashSet::new(),
    }
  }

  fn declare(&mut self, id: &str, resource: Resource) -> Result<LogicalId, ComposeError> {
    let path = self.path.child(id)?;
    if !self.child_ids.insert(id.to_string()) {
      return Err(
        ConstructError::DuplicateId {
          scope: self.path.to_string(),
          id: id.to_string(),
        }
        .into(),
      );
    }

    let logical_id = path.logical_id()?;
    let kind = resource.kind();
    self.manifest.declare(ResourceEntry {
      logical_id: logical_id.clone(),
      path,
      resource,
    })?;

    debug!(stack = %self.path, id, logical_id = %logical_id, kind = %kind, "declared resource");
    Ok(logical_id)
  }

  pub fn provision_storage_container(
    &mut self,
    id: &str,
    bucket_name: &str,
    versioned: bool,
  ) -> Result<BucketHandle, ComposeError> {
    let def = BucketDef {
      bucket_name: bucket_name.to_string(),
      versioned,
    };
    let logical_id = self.declare(id, Resource::StorageContainer(def))?;
    Ok(BucketHandle::new(logical_id, bucket_name))
  }

  /// Declare a Go compute unit whose package lives at `api/function.zip`
  /// inside `storage`.
  ///
  /// The runtime target is fixed (static linux/amd64) as are the limits
  /// (128 MB, 10 s). Nothing else is validated here; the provider rejects bad
  /// packages at apply time.
  pub fn provision_compute_unit(
    &mut self,
    id: &str,
    name: &str,
    entry_point: &str,
    storage: &BucketHandle,
  ) -> Result<ComputeUnitHandle, ComposeError> {
    let def = FunctionDef::go_lambda(name, entry_point, storage.logical_id());
    let handle_def = def.clone();
    let logical_id = self.declare(id, Resource::ComputeUnit(def))?;
    Ok(ComputeUnitHandle::new(logical_id, &handle_def))
  }

  /// Invoke `function` whenever `event` happens in `bucket`.
  pub fn subscribe(
    &mut self,
    id: &str,
    bucket: &BucketHandle,
    event: EventType,
    function: &ComputeUnitHandle,
  ) -> Result<SubscriptionHandle, ComposeError> {
    let def = SubscriptionDef {
      bucket: bucket.logical_id().clone(),
      event,
      function: function.logical_id().clone(),
    };
    let logical_id = self.declare(id, Resource::EventSubscription(def))?;
    Ok(SubscriptionHandle::new(logical_id, event))
  }

  /// Declare a gateway endpoint whose sole backing target is `function`.
  pub fn provision_gateway_endpoint(
    &mut self,
    id: &str,
    function: &ComputeUnitHandle,
    description: &str,
  ) -> Result<GatewayHandle, ComposeError> {
    let def = GatewayDef {
      function: function.logical_id().clone(),
      description: description.to_string(),
      stage_name: GATEWAY_STAGE_NAME.to_string(),
    };
    let handle_def = def.clone();
    let logical_id = self.declare(id, Resource::GatewayEndpoint(def))?;
    Ok(GatewayHandle::new(logical_id, &handle_def))
  }

  /// Declare a pipeline that sources the artifact from `bucket` and deploys
  /// by invoking `function`.
  pub fn provision_pipeline(
    &mut self,
    id: &str,
    bucket: &BucketHandle,
    function: &ComputeUnitHandle,
  ) -> Result<PipelineHandle, ComposeError> {
    let def = PipelineDef {
      source_bucket: bucket.logical_id().clone(),
      source_key: ARTIFACT_KEY.to_string(),
      function: function.logical_id().clone(),
    };
    let logical_id = self.declare(id, Resource::Pipeline(def))?;
    Ok(PipelineHandle::new(logical_id))
  }

  pub fn add_output(&mut self, name: &str, value: Expr, description: Option<&str>) -> Result<(), ComposeError> {
    self.manifest.add_output(
      name,
      OutputDef {
        value,
        description: description.map(str::to_string),
      },
    )?;
    Ok(())
  }

  pub fn finish(self) -> StackManifest {
    self.manifest
  }
}

/// The composed Go Lambda stack: its declaration graph plus a handle to each
/// declared entity.
#[derive(Debug, Clone)]
pub struct LambdaStack {
  pub manifest: StackManifest,
  pub bucket: BucketHandle,
  pub function: ComputeUnitHandle,
  pub subscription: SubscriptionHandle,
  pub gateway: GatewayHandle,
  pub pipeline: Option<PipelineHandle>,
}

impl LambdaStack {
  /// Compose the stack below `scope`.
  ///
  /// The stack is not registered with the app; pass `manifest` to
  /// [`App::add_stack`] for that.
  pub fn compose(scope: &App, id: &str, options: Option<&StackOptions>) -> Result<Self, ComposeError> {
    let defaults = StackOptions::default();
    let options = options.unwrap_or(&defaults);
    let mut stack = StackBuilder::new(scope.stack_path(id)?, options);

    let bucket = stack.provision_storage_container(BUCKET_ID, &options.bucket_name, true)?;
    let function = stack.provision_compute_unit(FUNCTION_ID, &options.function_name, &options.handler, &bucket)?;
    let subscription = stack.subscribe(SUBSCRIPTION_ID, &bucket, EventType::ObjectCreatedPut, &function)?;
    let gateway = stack.provision_gateway_endpoint(GATEWAY_ID, &function, GATEWAY_DESCRIPTION)?;
    let pipeline = if options.pipeline {
      Some(stack.provision_pipeline(PIPELINE_ID, &bucket, &function)?)
    } else {
      None
    };

    stack.add_output(URL_OUTPUT_NAME, gateway.url(), None)?;

    let manifest = stack.finish();
    info!(
      stack = id,
      resources = manifest.resources.len(),
      pipeline = pipeline.is_some(),
      "composed stack"
    );

    Ok(Self {
      manifest,
      bucket,
      function,
      subscription,
      gateway,
      pipeline,
    })
  }
}
