//! Global configuration management for resnames.
//!
//! The global configuration file holds user-wide naming policies and extra naming
//! strategies that apply to every service on the machine, for example strategies for
//! in-house custom resource types.
//!
//! # Configuration File Location
//!
//! - **Unix/macOS**: `~/.resnames/config.toml`
//! - **Windows**: `%LOCALAPPDATA%\resnames\config.toml`
//!
//! The location can be overridden with `--config` or the `RESNAMES_CONFIG`
//! environment variable. A missing file is not an error; defaults apply.
//!
//! # File Format
//!
//! ```toml
//! unknown_types = "skip"
//! merge_target = "functions"
//!
//! [strategies]
//! "Custom::Database" = { field = "DatabaseName" }
//! "AWS::Glue::Table" = { path = "TableInput.Name" }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;

use super::{MergeTarget, StrategySpec, UnknownTypePolicy};
use crate::constants::CONFIG_PATH_ENV;

/// User-wide defaults, read from `config.toml`.
///
/// Values set here are overridden by the service's `custom.resourceNames` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlobalConfig {
    /// Default unknown-type policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unknown_types: Option<UnknownTypePolicy>,

    /// Default merge target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_target: Option<MergeTarget>,

    /// Extra strategies keyed by resource type.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub strategies: BTreeMap<String, StrategySpec>,
}

impl GlobalConfig {
    /// Load from an explicit path, `RESNAMES_CONFIG`, or the default location.
    ///
    /// An explicit path must exist; the environment and default locations are
    /// optional and fall back to [`GlobalConfig::default`].
    ///
    /// # Errors
    ///
    /// Returns an error if the chosen file cannot be read or parsed, or if an
    /// explicit path does not exist.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from(&path).await;
        }

        let path = match std::env::var_os(CONFIG_PATH_ENV) {
            Some(from_env) => PathBuf::from(from_env),
            None => match Self::default_path() {
                Ok(path) => path,
                Err(e) => {
                    debug!("No default global config location: {e}");
                    return Ok(Self::default());
                }
            },
        };

        if fs::try_exists(&path).await.unwrap_or(false) {
            Self::load_from(&path).await
        } else {
            debug!("Global config {} not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains invalid TOML.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read global config from {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse global config from {}", path.display()))?;

        debug!("Loaded global config from {} ({} strategies)", path.display(), config.strategies.len());
        Ok(config)
    }

    /// Platform-specific default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the home (or local data) directory cannot be determined.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine local data directory"))?
                .join("resnames")
        } else {
            dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?
                .join(".resnames")
        };

        Ok(config_dir.join("config.toml"))
    }
}
