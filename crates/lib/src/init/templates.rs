//! Template content for the init command.

/// Sample `stack.json`. Every field is optional.
pub const STACK_JSON_TEMPLATE: &str = r#"{
  "stack_id": "GoLambdaStack",
  "description": "Go function behind a REST gateway",
  "bucket_name": "golambdastack-mybucketf68f3ff0-brgzmehpfrup",
  "function_name": "helloHandler",
  "handler": "main",
  "pipeline": false,
  "tags": {}
}
"#;
