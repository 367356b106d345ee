//! Configuration management for resnames
//!
//! Naming behavior is configured in layers, lowest precedence first:
//!
//! 1. **Built-in defaults** - unknown types fail, names merge into the provider
//!    environment, the built-in strategy table
//! 2. **Global configuration** (`~/.resnames/config.toml`) - user-wide policies and
//!    extra strategies, see [`GlobalConfig`]
//! 3. **Service section** (`custom.resourceNames` in the service definition) - prefix,
//!    policies and strategies for one service
//! 4. **Command-line overrides** - `--stage` and `--region`
//!
//! The result is a [`Settings`] value that stays immutable for the whole run.
//!
//! # Service Section
//!
//! ```yaml
//! custom:
//!   resourceNames:
//!     prefix: orders          # defaults to the service name
//!     unknownTypes: skip      # or: fail (default)
//!     mergeTarget: functions  # or: provider (default)
//!     strategies:
//!       AWS::Events::EventBus: { field: Name }
//!       AWS::Glue::Table: { path: TableInput.Name }
//!       AWS::EC2::VPC: { tag: Name }
//! ```
//!
//! # Global Configuration
//!
//! ```toml
//! unknown_types = "skip"
//! merge_target = "provider"
//!
//! [strategies]
//! "AWS::Events::EventBus" = { field = "Name" }
//! ```

pub mod global;

pub use global::GlobalConfig;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{DEFAULT_STAGE, NAMING_SECTION};
use crate::core::ResnamesError;
use crate::naming::StrategyRegistry;
use crate::service::ServiceDefinition;

/// What to do with a resource whose type has no naming strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownTypePolicy {
    /// Abort the injection run with [`ResnamesError::MissingStrategy`].
    #[default]
    Fail,
    /// Leave the resource untouched and emit no environment key.
    Skip,
}

/// Where computed names are merged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeTarget {
    /// `provider.environment`, shared by every function.
    #[default]
    Provider,
    /// `functions.<name>.environment` of every declared function.
    Functions,
}

/// Declarative form of a naming strategy.
///
/// Exactly one of the fields must be set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StrategySpec {
    /// Top-level property holding the name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Nested property path holding the name, e.g. `TableInput.Name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Tag key holding the name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl StrategySpec {
    /// A scalar-field strategy.
    pub fn field(field: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            ..Self::default()
        }
    }

    /// A nested-path strategy.
    pub fn path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// A tag strategy.
    pub fn tag(key: impl Into<String>) -> Self {
        Self {
            tag: Some(key.into()),
            ..Self::default()
        }
    }
}

/// `custom.resourceNames` as written in a service definition.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceNamesSection {
    /// Name prefix; defaults to the service name.
    #[serde(default)]
    pub prefix: Option<String>,
    /// Unknown-type policy.
    #[serde(default)]
    pub unknown_types: Option<UnknownTypePolicy>,
    /// Merge target.
    #[serde(default)]
    pub merge_target: Option<MergeTarget>,
    /// Additional or overriding strategies keyed by resource type.
    #[serde(default)]
    pub strategies: BTreeMap<String, StrategySpec>,
}

/// Prefix and stage used to build physical names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingConfig {
    /// Leading name component, usually the service name.
    pub prefix: String,
    /// Trailing name component, the deployment stage.
    pub stage: String,
}

impl NamingConfig {
    /// Create a naming config.
    pub fn new(prefix: impl Into<String>, stage: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            stage: stage.into(),
        }
    }
}

/// Values given on the command line that win over the service definition.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// `--stage`
    pub stage: Option<String>,
    /// `--region`
    pub region: Option<String>,
}

/// Fully resolved, immutable settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Prefix and stage.
    pub naming: NamingConfig,
    /// Unknown-type policy.
    pub unknown_types: UnknownTypePolicy,
    /// Merge target.
    pub merge_target: MergeTarget,
    /// Strategy table, built-ins plus configured ones.
    pub strategies: StrategyRegistry,
}

impl Settings {
    /// Settings with built-in strategies and default policies.
    #[must_use]
    pub fn new(naming: NamingConfig) -> Self {
        Self {
            naming,
            unknown_types: UnknownTypePolicy::default(),
            merge_target: MergeTarget::default(),
            strategies: StrategyRegistry::builtin(),
        }
    }

    /// Set the unknown-type policy.
    #[must_use]
    pub fn with_unknown_types(mut self, policy: UnknownTypePolicy) -> Self {
        self.unknown_types = policy;
        self
    }

    /// Set the merge target.
    #[must_use]
    pub fn with_merge_target(mut self, target: MergeTarget) -> Self {
        self.merge_target = target;
        self
    }

    /// Layer global config, service section and overrides.
    ///
    /// # Errors
    ///
    /// Fails when the service has neither a name nor a configured prefix, when the
    /// `custom.resourceNames` section has the wrong shape, or when a configured
    /// strategy is invalid.
    pub fn resolve(
        global: &GlobalConfig,
        service: &ServiceDefinition,
        overrides: &Overrides,
    ) -> Result<Self, ResnamesError> {
        let section = match service.naming_section() {
            Some(value) => serde_json::from_value::<ResourceNamesSection>(value.clone()).map_err(|e| {
                ResnamesError::config(format!("custom.{NAMING_SECTION}: {e}"))
            })?,
            None => ResourceNamesSection::default(),
        };

        let prefix = section
            .prefix
            .clone()
            .or_else(|| service.service_name().map(str::to_string))
            .ok_or_else(|| {
                ResnamesError::config(format!(
                    "the service has no name and custom.{NAMING_SECTION}.prefix is not set"
                ))
            })?;

        let stage = overrides
            .stage
            .clone()
            .or_else(|| service.provider_stage().map(str::to_string))
            .unwrap_or_else(|| DEFAULT_STAGE.to_string());

        let mut strategies = StrategyRegistry::builtin();
        strategies.extend_from_specs(&global.strategies)?;
        strategies.extend_from_specs(&section.strategies)?;

        let settings = Self {
            naming: NamingConfig::new(prefix, stage),
            unknown_types: section.unknown_types.or(global.unknown_types).unwrap_or_default(),
            merge_target: section.merge_target.or(global.merge_target).unwrap_or_default(),
            strategies,
        };

        debug!(
            "Naming with prefix '{}' and stage '{}' ({} strategies, unknown types: {:?}, merge target: {:?})",
            settings.naming.prefix,
            settings.naming.stage,
            settings.strategies.len(),
            settings.unknown_types,
            settings.merge_target
        );

        Ok(settings)
    }
}
