//! Shared constants.

/// Length of the truncated content hash used for manifests and resources.
pub const OBJ_HASH_PREFIX_LEN: usize = 20;

/// Number of hex characters appended to a logical id.
pub const LOGICAL_ID_HASH_LEN: usize = 8;

pub const DEFAULT_STACK_ID: &str = "GoLambdaStack";
pub const DEFAULT_BUCKET_NAME: &str = "golambdastack-mybucketf68f3ff0-brgzmehpfrup";
pub const DEFAULT_FUNCTION_NAME: &str = "helloHandler";
pub const DEFAULT_HANDLER: &str = "main";

/// Location of the deployment artifact inside the storage container.
pub const ARTIFACT_KEY: &str = "api/function.zip";

pub const FUNCTION_MEMORY_MB: u32 = 128;
pub const FUNCTION_TIMEOUT_SECS: u32 = 10;

pub const GATEWAY_STAGE_NAME: &str = "prod";

/// Name of the stack output carrying the gateway URL.
pub const URL_OUTPUT_NAME: &str = "lambda-url";

pub const CONFIG_FILE_NAME: &str = "stack.json";
pub const DEFAULT_OUT_DIR: &str = "stack.out";
pub const ASSEMBLY_MANIFEST_FILE: &str = "manifest.json";
pub const ASSEMBLY_VERSION: &str = "1";

pub const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";
