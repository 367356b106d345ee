//! Global constants used throughout the resnames codebase.
//!
//! Naming conventions, reserved keys and file names that more than one module
//! needs live here so the conventions are discoverable in one place.

/// Separator used by the case converter when deriving environment keys.
pub const ENV_KEY_SEPARATOR: &str = "_";

/// Separator between the prefix, identifier and stage of a physical name.
pub const NAME_SEPARATOR: &str = "-";

/// Stage used when neither `--stage` nor `provider.stage` is set.
///
/// Matches the default stage of the deployment framework.
pub const DEFAULT_STAGE: &str = "dev";

/// Suffix of the environment key carrying a resource ARN.
pub const ARN_SUFFIX: &str = "_ARN";

/// Suffix of the environment key carrying a queue URL.
pub const URL_SUFFIX: &str = "_URL";

/// Suffix SQS requires on FIFO queue names.
pub const FIFO_SUFFIX: &str = ".fifo";

/// Tag key used by tag-based naming strategies.
pub const NAME_TAG_KEY: &str = "Name";

/// Key of the resources mapping inside each resource document.
pub const RESOURCES_KEY: &str = "Resources";

/// Key under `custom` holding the naming settings.
pub const NAMING_SECTION: &str = "resourceNames";

/// Variable source resolving `name:<logicalId>`.
pub const NAME_SOURCE: &str = "name";

/// Variable source resolving `topic:<logicalId>[.<property>]`.
pub const TOPIC_SOURCE: &str = "topic";

/// Service definition file names tried, in order, when `--service` is absent.
pub const SERVICE_FILE_CANDIDATES: &[&str] =
    &["serverless.yml", "serverless.yaml", "serverless.json"];

/// Environment variable overriding the global config file location.
pub const CONFIG_PATH_ENV: &str = "RESNAMES_CONFIG";

/// Resource type tags with side channels.
pub mod types {
    /// SQS queues emit `_ARN` and `_URL` and honor `FifoQueue`.
    pub const SQS_QUEUE: &str = "AWS::SQS::Queue";
    /// SNS topics emit `_ARN` and are registered for `topic:` lookups.
    pub const SNS_TOPIC: &str = "AWS::SNS::Topic";
}
