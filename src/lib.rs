//! resnames - deterministic resource names for serverless services
//!
//! Given a service definition (the `serverless.yml` of a deployment framework),
//! resnames computes a conventional physical name for every declared resource,
//! writes it into the resource where that resource type expects it, and exposes it
//! as environment variables so the functions can find their tables, queues and
//! topics at runtime.
//!
//! # Naming
//!
//! ```text
//! <prefix>-<kebab-case logical id>-<stage>      (lowercased)
//! ```
//!
//! The prefix comes from `custom.resourceNames.prefix` or the service name, the stage
//! from `--stage`, `provider.stage` or `dev`. A name already present in the resource
//! is kept. Environment keys are the upper-snake-case form of the logical id.
//!
//! | Resource | Keys |
//! |----------|------|
//! | any named resource | `KEY` = effective name |
//! | `AWS::SQS::Queue` | also `KEY_ARN` and `KEY_URL` |
//! | `AWS::SNS::Topic` | also `KEY_ARN` |
//!
//! # Core Modules
//!
//! - [`naming`] - case conversion, deploy-time expressions, placement strategies and
//!   the per-resource resolver
//! - [`inject`] - the single-flight injection coordinator and `name:`/`topic:` lookups
//! - [`variables`] - `${source:address}` substitution with `opt`, `env` and `self`
//! - [`service`] - loading and editing the service definition
//! - [`config`] - global config file and per-service settings
//! - [`hooks`] - lifecycle events the plugin reacts to
//! - [`plugin`] - the plugin facade tying the above together
//! - [`cli`] - the `resnames` command line
//! - [`core`] - error types and user-facing error display
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use resnames_cli::config::{NamingConfig, Settings};
//! use resnames_cli::inject::InjectionCoordinator;
//! use resnames_cli::plugin::ResourceNamesPlugin;
//! use resnames_cli::service::ServiceDefinition;
//! use resnames_cli::variables::VariableRegistry;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let service = ServiceDefinition::from_yaml_str(
//!     "resources:\n  Resources:\n    UserTable:\n      Type: AWS::DynamoDB::Table\n",
//! )?;
//! let settings = Arc::new(Settings::new(NamingConfig::new("svc", "dev")));
//! let coordinator = Arc::new(InjectionCoordinator::new(settings, service));
//! let plugin = ResourceNamesPlugin::new(coordinator, VariableRegistry::new());
//!
//! let name = plugin.references().resolve_name("UserTable").await?;
//! assert_eq!(name, "svc-user-table-dev");
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod hooks;
pub mod inject;
pub mod naming;
pub mod plugin;
pub mod service;
pub mod variables;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
