//! Rendering a stack manifest into a provider template.
//!
//! Each declared resource expands into one or more template resources:
//!
//! | Declared            | Template resources                                        |
//! |---------------------|-----------------------------------------------------------|
//! | storage container   | `AWS::S3::Bucket`                                          |
//! | compute unit        | `AWS::IAM::Role`, `AWS::Lambda::Function`                  |
//! | event subscription  | `AWS::Lambda::Permission`, `Custom::S3BucketNotifications` |
//! | gateway endpoint    | rest API, `{proxy+}` resource, two `ANY` methods,          |
//! |                     | deployment, stage, `AWS::Lambda::Permission`               |
//! | pipeline            | `AWS::IAM::Role`, `AWS::CodePipeline::Pipeline`            |

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use thiserror::Error;

use crate::consts::TEMPLATE_FORMAT_VERSION;
use crate::construct::{ConstructError, LogicalId};
use crate::manifest::{ManifestError, ResourceEntry, StackManifest, output_key};
use crate::resource::expr::arn;
use crate::resource::{
  BucketDef, Expr, FunctionDef, GatewayDef, PipelineDef, PipelineStage, Pseudo, Resource, SubscriptionDef,
};

#[derive(Debug, Error)]
pub enum SynthError {
  #[error("failed to derive a template id: {0}")]
  Construct(#[from] ConstructError),

  #[error("{from} references {to}, which is not declared")]
  UnknownReference { from: LogicalId, to: LogicalId },

  #[error(transparent)]
  Manifest(#[from] ManifestError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateResource {
  #[serde(rename = "Type")]
  pub resource_type: String,
  #[serde(rename = "Properties")]
  pub properties: Map<String, Value>,
  #[serde(rename = "DependsOn", default, skip_serializing_if = "Vec::is_empty")]
  pub depends_on: Vec<String>,
  #[serde(rename = "DeletionPolicy", default, skip_serializing_if = "Option::is_none")]
  pub deletion_policy: Option<String>,
  #[serde(rename = "UpdateReplacePolicy", default, skip_serializing_if = "Option::is_none")]
  pub update_replace_policy: Option<String>,
}

impl TemplateResource {
  fn new(resource_type: &str, properties: Value) -> Self {
    let properties = match properties {
      Value::Object(map) => map,
      _ => Map::new(),
    };
    Self {
      resource_type: resource_type.to_string(),
      properties,
      depends_on: Vec::new(),
      deletion_policy: None,
      update_replace_policy: None,
    }
  }

  fn depends_on(mut self, ids: &[&LogicalId]) -> Self {
    for id in ids {
      if !self.depends_on.iter().any(|d| d == id.as_str()) {
        self.depends_on.push(id.to_string());
      }
    }
    self
  }

  fn retain(mut self) -> Self {
    self.deletion_policy = Some("Retain".to_string());
    self.update_replace_policy = Some("Retain".to_string());
    self
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateOutput {
  #[serde(rename = "Value")]
  pub value: Value,
  #[serde(rename = "Description", default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
}

/// A synthesized provider template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
  #[serde(rename = "AWSTemplateFormatVersion")]
  pub format_version: String,
  #[serde(rename = "Description", default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(rename = "Resources")]
  pub resources: BTreeMap<String, TemplateResource>,
  #[serde(rename = "Outputs", default, skip_serializing_if = "BTreeMap::is_empty")]
  pub outputs: BTreeMap<String, TemplateOutput>,
}

impl Template {
  /// Template resources of the given type, sorted by id.
  pub fn resources_of_type<'a>(
    &'a self,
    resource_type: &'a str,
  ) -> impl Iterator<Item = (&'a String, &'a TemplateResource)> {
    self.resources.iter().filter(move |(_, r)| r.resource_type == resource_type)
  }
}

/// Render `manifest` into a template.
///
/// Pure: the same manifest always yields the same template.
pub fn synthesize(manifest: &StackManifest) -> Result<Template, SynthError> {
  manifest.check_unique_ids()?;
  let mut resources = BTreeMap::new();

  for entry in &manifest.resources {
    for reference in entry.resource.references() {
      if manifest.get(reference).is_none() {
        return Err(SynthError::UnknownReference {
          from: entry.logical_id.clone(),
          to: reference.clone(),
        });
      }
    }

    let rendered = match &entry.resource {
      Resource::StorageContainer(def) => bucket_resources(entry, def, manifest),
      Resource::ComputeUnit(def) => function_resources(entry, def, manifest)?,
      Resource::EventSubscription(def) => subscription_resources(entry, def)?,
      Resource::GatewayEndpoint(def) => gateway_resources(entry, def)?,
      Resource::Pipeline(def) => pipeline_resources(entry, def)?,
    };
    resources.extend(rendered.into_iter().map(|(id, r)| (id.0, r)));
  }

  let outputs = manifest
    .outputs
    .iter()
    .map(|(name, output)| {
      (
        output_key(name),
        TemplateOutput {
          value: output.value.render(),
          description: output.description.clone(),
        },
      )
    })
    .collect();

  Ok(Template {
    format_version: TEMPLATE_FORMAT_VERSION.to_string(),
    description: manifest.description.clone(),
    resources,
    outputs,
  })
}

fn tags(manifest: &StackManifest) -> Option<Value> {
  if manifest.tags.is_empty() {
    return None;
  }
  let tags: Vec<Value> = manifest
    .tags
    .iter()
    .map(|(key, value)| json!({ "Key": key, "Value": value }))
    .collect();
  Some(Value::Array(tags))
}

fn sub_id(entry: &ResourceEntry, child: &str) -> Result<LogicalId, SynthError> {
  Ok(entry.path.child(child)?.logical_id()?)
}

fn service_role(principal: &str, managed_policies: &[&str]) -> TemplateResource {
  let mut properties = json!({
    "AssumeRolePolicyDocument": {
      "Version": "2012-10-17",
      "Statement": [{
        "Action": "sts:AssumeRole",
        "Effect": "Allow",
        "Principal": { "Service": principal },
      }],
    },
  });
  if !managed_policies.is_empty() {
    let arns: Vec<Value> = managed_policies
      .iter()
      .map(|policy| {
        Expr::Join(vec![
          Expr::literal("arn:"),
          Expr::Pseudo(Pseudo::Partition),
          Expr::literal(format!(":iam::aws:policy/{}", policy)),
        ])
        .render()
      })
      .collect();
    properties["ManagedPolicyArns"] = Value::Array(arns);
  }
  TemplateResource::new("AWS::IAM::Role", properties)
}

fn invoke_permission(function: &LogicalId, principal: &str, source_arn: Expr) -> TemplateResource {
  TemplateResource::new(
    "AWS::Lambda::Permission",
    json!({
      "Action": "lambda:InvokeFunction",
      "FunctionName": Expr::get_att(function, "Arn").render(),
      "Principal": principal,
      "SourceArn": source_arn.render(),
    }),
  )
}

fn bucket_resources(
  entry: &ResourceEntry,
  def: &BucketDef,
  manifest: &StackManifest,
) -> Vec<(LogicalId, TemplateResource)> {
  let mut properties = json!({ "BucketName": def.bucket_name });
  if def.versioned {
    properties["VersioningConfiguration"] = json!({ "Status": "Enabled" });
  }
  if let Some(tags) = tags(manifest) {
    properties["Tags"] = tags;
  }
  let bucket = TemplateResource::new("AWS::S3::Bucket", properties).retain();
  vec![(entry.logical_id.clone(), bucket)]
}

fn function_resources(
  entry: &ResourceEntry,
  def: &FunctionDef,
  manifest: &StackManifest,
) -> Result<Vec<(LogicalId, TemplateResource)>, SynthError> {
  let role_id = sub_id(entry, "ServiceRole")?;
  let role = service_role(
    "lambda.amazonaws.com",
    &["service-role/AWSLambdaBasicExecutionRole"],
  );

  let mut properties = json!({
    "Code": {
      "S3Bucket": Expr::Ref(def.code.bucket.clone()).render(),
      "S3Key": def.code.key,
    },
    "FunctionName": def.function_name,
    "Handler": def.handler,
    "Runtime": def.runtime.as_str(),
    "Architectures": [def.target.arch.service_name()],
    "MemorySize": def.memory_size,
    "Timeout": def.timeout_secs,
    "Environment": { "Variables": def.environment },
    "Role": Expr::get_att(&role_id, "Arn").render(),
  });
  if let Some(tags) = tags(manifest) {
    properties["Tags"] = tags;
  }

  let function = TemplateResource::new("AWS::Lambda::Function", properties).depends_on(&[&role_id, &def.code.bucket]);

  Ok(vec![(role_id, role), (entry.logical_id.clone(), function)])
}

fn subscription_resources(
  entry: &ResourceEntry,
  def: &SubscriptionDef,
) -> Result<Vec<(LogicalId, TemplateResource)>, SynthError> {
  let permission_id = sub_id(entry, "InvokePermission")?;
  let permission = invoke_permission(
    &def.function,
    "s3.amazonaws.com",
    Expr::get_att(&def.bucket, "Arn"),
  );

  let notifications = TemplateResource::new(
    "Custom::S3BucketNotifications",
    json!({
      "BucketName": Expr::Ref(def.bucket.clone()).render(),
      "NotificationConfiguration": {
        "LambdaFunctionConfigurations": [{
          "Events": [def.event.as_str()],
          "LambdaFunctionArn": Expr::get_att(&def.function, "Arn").render(),
        }],
      },
      "Managed": true,
    }),
  )
  .depends_on(&[&permission_id, &def.bucket, &def.function]);

  Ok(vec![(permission_id, permission), (entry.logical_id.clone(), notifications)])
}

fn gateway_resources(
  entry: &ResourceEntry,
  def: &GatewayDef,
) -> Result<Vec<(LogicalId, TemplateResource)>, SynthError> {
  let api = &entry.logical_id;
  let proxy_id = sub_id(entry, "ProxyResource")?;
  let proxy_method_id = sub_id(entry, "ProxyAnyMethod")?;
  let root_method_id = sub_id(entry, "RootAnyMethod")?;
  let deployment_id = sub_id(entry, "Deployment")?;
  let stage_id = sub_id(entry, "DeploymentStage")?;
  let permission_id = sub_id(entry, "InvokePermission")?;

  let rest_api = TemplateResource::new(
    "AWS::ApiGateway::RestApi",
    json!({
      "Name": entry.path.id(),
      "Description": def.description,
    }),
  );

  let proxy = TemplateResource::new(
    "AWS::ApiGateway::Resource",
    json!({
      "ParentId": Expr::get_att(api, "RootResourceId").render(),
      "PathPart": "{proxy+}",
      "RestApiId": Expr::Ref(api.clone()).render(),
    }),
  )
  .depends_on(&[api]);

  // Integration ARNs carry no account component.
  let integration_uri = Expr::Join(vec![
    Expr::literal("arn:"),
    Expr::Pseudo(Pseudo::Partition),
    Expr::literal(":apigateway:"),
    Expr::Pseudo(Pseudo::Region),
    Expr::literal(":lambda:path/2015-03-31/functions/"),
    Expr::get_att(&def.function, "Arn"),
    Expr::literal("/invocations"),
  ]);

  let any_method = |resource_id: Value| {
    TemplateResource::new(
      "AWS::ApiGateway::Method",
      json!({
        "HttpMethod": "ANY",
        "ResourceId": resource_id,
        "RestApiId": Expr::Ref(api.clone()).render(),
        "AuthorizationType": "NONE",
        "Integration": {
          "IntegrationHttpMethod": "POST",
          "Type": "AWS_PROXY",
          "Uri": integration_uri.render(),
        },
      }),
    )
  };
  let proxy_method = any_method(Expr::Ref(proxy_id.clone()).render()).depends_on(&[&proxy_id, &def.function]);
  let root_method = any_method(Expr::get_att(api, "RootResourceId").render()).depends_on(&[api, &def.function]);

  let deployment = TemplateResource::new(
    "AWS::ApiGateway::Deployment",
    json!({
      "RestApiId": Expr::Ref(api.clone()).render(),
      "Description": "Automatically created by the RestApi construct",
    }),
  )
  .depends_on(&[&proxy_method_id, &root_method_id]);

  let stage = TemplateResource::new(
    "AWS::ApiGateway::Stage",
    json!({
      "RestApiId": Expr::Ref(api.clone()).render(),
      "DeploymentId": Expr::Ref(deployment_id.clone()).render(),
      "StageName": def.stage_name,
    }),
  )
  .depends_on(&[&deployment_id]);

  let permission = invoke_permission(
    &def.function,
    "apigateway.amazonaws.com",
    arn(
      "execute-api",
      vec![Expr::Ref(api.clone()), Expr::literal("/*/*")],
    ),
  );

  Ok(vec![
    (api.clone(), rest_api),
    (proxy_id, proxy),
    (proxy_method_id, proxy_method),
    (root_method_id, root_method),
    (deployment_id, deployment),
    (stage_id, stage),
    (permission_id, permission),
  ])
}

fn pipeline_resources(
  entry: &ResourceEntry,
  def: &PipelineDef,
) -> Result<Vec<(LogicalId, TemplateResource)>, SynthError> {
  let role_id = sub_id(entry, "Role")?;
  let role = service_role("codepipeline.amazonaws.com", &[]);

  let stages: Vec<Value> = PipelineStage::ALL
    .iter()
    .map(|stage| match stage {
      PipelineStage::Source => json!({
        "Name": stage.as_str(),
        "Actions": [{
          "Name": "S3Source",
          "ActionTypeId": { "Category": "Source", "Owner": "AWS", "Provider": "S3", "Version": "1" },
          "Configuration": {
            "S3Bucket": Expr::Ref(def.source_bucket.clone()).render(),
            "S3ObjectKey": def.source_key,
          },
          "OutputArtifacts": [{ "Name": "SourceArtifact" }],
          "RunOrder": 1,
        }],
      }),
      PipelineStage::Deploy => json!({
        "Name": stage.as_str(),
        "Actions": [{
          "Name": "InvokeFunction",
          "ActionTypeId": { "Category": "Invoke", "Owner": "AWS", "Provider": "Lambda", "Version": "1" },
          "Configuration": { "FunctionName": Expr::Ref(def.function.clone()).render() },
          "InputArtifacts": [{ "Name": "SourceArtifact" }],
          "RunOrder": 1,
        }],
      }),
    })
    .collect();

  let pipeline = TemplateResource::new(
    "AWS::CodePipeline::Pipeline",
    json!({
      "RoleArn": Expr::get_att(&role_id, "Arn").render(),
      "ArtifactStore": {
        "Type": "S3",
        "Location": Expr::Ref(def.source_bucket.clone()).render(),
      },
      "Stages": stages,
    }),
  )
  .depends_on(&[&role_id, &def.source_bucket, &def.function]);

  Ok(vec![(role_id, role), (entry.logical_id.clone(), pipeline)])
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::compose::LambdaStack;
  use crate::config::StackOptions;
  use crate::construct::App;

  fn template(pipeline: bool) -> (LambdaStack, Template) {
    let options = StackOptions {
      pipeline,
      ..StackOptions::default()
    };
    let stack = LambdaStack::compose(&App::new(), "GoLambdaStack", Some(&options)).unwrap();
    let template = synthesize(&stack.manifest).unwrap();
    (stack, template)
  }

  #[test]
  fn function_resource_carries_fixed_configuration() {
    let (stack, template) = template(false);
    let function = &template.resources[stack.function.logical_id().as_str()];
    assert_eq!(function.resource_type, "AWS::Lambda::Function");

    let props = &function.properties;
    assert_eq!(props["FunctionName"], "helloHandler");
    assert_eq!(props["Handler"], "main");
    assert_eq!(props["Runtime"], "go1.x");
    assert_eq!(props["MemorySize"], 128);
    assert_eq!(props["Timeout"], 10);
    assert_eq!(props["Code"]["S3Key"], "api/function.zip");
    assert_eq!(
      props["Code"]["S3Bucket"],
      json!({ "Ref": stack.bucket.logical_id().as_str() })
    );
    assert_eq!(
      props["Environment"]["Variables"],
      json!({ "CGO_ENABLED": "0", "GOARCH": "amd64", "GOOS": "linux" })
    );
    assert!(function.depends_on.contains(&stack.bucket.logical_id().to_string()));
  }

  #[test]
  fn bucket_is_versioned_and_retained() {
    let (stack, template) = template(false);
    let bucket = &template.resources[stack.bucket.logical_id().as_str()];
    assert_eq!(bucket.resource_type, "AWS::S3::Bucket");
    assert_eq!(bucket.properties["BucketName"], "golambdastack-mybucketf68f3ff0-brgzmehpfrup");
    assert_eq!(bucket.properties["VersioningConfiguration"]["Status"], "Enabled");
    assert_eq!(bucket.deletion_policy.as_deref(), Some("Retain"));
  }

  #[test]
  fn gateway_methods_all_integrate_with_the_one_function() {
    let (stack, template) = template(true);
    let function_arn = json!({ "Fn::GetAtt": [stack.function.logical_id().as_str(), "Arn"] });

    let methods: Vec<_> = template.resources_of_type("AWS::ApiGateway::Method").collect();
    assert_eq!(methods.len(), 2);
    for (_, method) in methods {
      let uri = &method.properties["Integration"]["Uri"]["Fn::Join"][1];
      let parts = uri.as_array().unwrap();
      assert!(parts.contains(&function_arn));
    }
    assert_eq!(template.resources_of_type("AWS::ApiGateway::RestApi").count(), 1);
    assert_eq!(template.resources_of_type("AWS::ApiGateway::Stage").count(), 1);
  }

  #[test]
  fn url_output_is_rendered() {
    let (stack, template) = template(false);
    let output = &template.outputs["lambdaurl"];
    assert_eq!(output.value, stack.gateway.url().render());
  }

  #[test]
  fn subscription_renders_put_notification() {
    let (stack, template) = template(false);
    let notifications = &template.resources[stack.subscription.logical_id().as_str()];
    assert_eq!(notifications.resource_type, "Custom::S3BucketNotifications");
    assert_eq!(
      notifications.properties["NotificationConfiguration"]["LambdaFunctionConfigurations"][0]["Events"],
      json!(["s3:ObjectCreated:Put"])
    );
  }

  #[test]
  fn pipeline_has_source_then_deploy() {
    let (stack, template) = template(true);
    let pipeline_id = stack.pipeline.unwrap().logical_id().to_string();
    let pipeline = &template.resources[&pipeline_id];
    let stages = pipeline.properties["Stages"].as_array().unwrap();
    let names: Vec<&str> = stages.iter().map(|s| s["Name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Source", "Deploy"]);
    assert_eq!(stages[0]["Actions"][0]["Configuration"]["S3ObjectKey"], "api/function.zip");
  }

  #[test]
  fn pipeline_toggle_only_adds_resources() {
    let (_, without) = template(false);
    let (_, with) = template(true);
    for (id, resource) in &without.resources {
      assert_eq!(with.resources.get(id), Some(resource), "{} differs", id);
    }
    assert_eq!(with.resources.len(), without.resources.len() + 2);
  }

  #[test]
  fn synthesis_is_deterministic() {
    let (_, a) = template(true);
    let (_, b) = template(true);
    assert_eq!(
      serde_json::to_string(&a).unwrap(),
      serde_json::to_string(&b).unwrap()
    );
  }

  #[test]
  fn dangling_reference_is_rejected() {
    let (stack, _) = template(false);
    let mut manifest = stack.manifest.clone();
    manifest.resources.remove(0);
    assert!(matches!(
      synthesize(&manifest),
      Err(SynthError::UnknownReference { .. })
    ));
  }

  #[test]
  fn duplicate_logical_id_is_rejected() {
    let (stack, _) = template(false);
    let mut manifest = stack.manifest.clone();
    manifest.resources.push(manifest.resources[0].clone());
    assert!(matches!(
      synthesize(&manifest),
      Err(SynthError::Manifest(ManifestError::DuplicateLogicalId(_)))
    ));
  }

  #[test]
  fn tags_are_applied_to_bucket_and_function() {
    let options = StackOptions {
      tags: [("team".to_string(), "api".to_string())].into(),
      ..StackOptions::default()
    };
    let stack = LambdaStack::compose(&App::new(), "S", Some(&options)).unwrap();
    let template = synthesize(&stack.manifest).unwrap();
    let expected = json!([{ "Key": "team", "Value": "api" }]);
    assert_eq!(template.resources[stack.bucket.logical_id().as_str()].properties["Tags"], expected);
    assert_eq!(template.resources[stack.function.logical_id().as_str()].properties["Tags"], expected);
  }
}
