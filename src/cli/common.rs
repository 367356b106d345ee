//! Shared setup for CLI commands.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::debug;

use super::CliConfig;
use crate::config::{GlobalConfig, Overrides, Settings};
use crate::constants::NAMING_SECTION;
use crate::inject::InjectionCoordinator;
use crate::plugin::ResourceNamesPlugin;
use crate::service::ServiceDefinition;
use crate::variables::{EnvSource, OptSource, SelfSource, VariableRegistry};

/// Values that decide naming and therefore must be resolved before injection.
const NAMING_INPUTS: [&str; 3] = ["/service", "/provider/stage", "/provider/region"];

/// Everything a command needs: the loaded service, settings and the plugin.
#[derive(Debug)]
pub struct CommandContext {
    /// Path of the service definition
    pub service_path: PathBuf,
    /// Resolved naming settings
    pub settings: Arc<Settings>,
    /// Plugin wired to the loaded service
    pub plugin: ResourceNamesPlugin,
}

impl CommandContext {
    /// Load the service definition and configuration described by `config`.
    ///
    /// # Errors
    ///
    /// Fails if the service definition or global configuration cannot be found or
    /// parsed, if a naming input uses an unresolvable variable, or if the settings are
    /// invalid.
    pub async fn load(config: &CliConfig) -> Result<Self> {
        let service_path = match &config.service_path {
            Some(path) => path.clone(),
            None => {
                let cwd = std::env::current_dir().context("Failed to determine current directory")?;
                ServiceDefinition::discover(&cwd).await?
            }
        };

        let mut service = ServiceDefinition::load(&service_path).await?;
        apply_overrides(&mut service, &config.overrides)?;

        let global = GlobalConfig::load_with_optional(config.config_path.clone()).await?;
        let host = host_variables(&service, &config.overrides);
        resolve_naming_inputs(&host, &mut service).await?;

        let settings = Arc::new(Settings::resolve(&global, &service, &config.overrides)?);
        let service_region = service.provider_region().map(str::to_string);
        let coordinator = Arc::new(InjectionCoordinator::new(Arc::clone(&settings), service));
        let plugin = ResourceNamesPlugin::new(coordinator, host);

        debug!(
            "Loaded {} (region: {}) with {:?}",
            service_path.display(),
            service_region.as_deref().unwrap_or("unset"),
            plugin.variables()
        );
        Ok(Self {
            service_path,
            settings,
            plugin,
        })
    }
}

/// `opt`, `env` and `self` sources for a service.
#[must_use]
pub fn host_variables(service: &ServiceDefinition, overrides: &Overrides) -> VariableRegistry {
    let mut registry = VariableRegistry::new();
    registry.register(
        "opt",
        Arc::new(OptSource::new([
            ("stage", overrides.stage.clone()),
            ("region", overrides.region.clone()),
        ])),
    );
    registry.register("env", Arc::new(EnvSource));
    registry.register("self", Arc::new(SelfSource::new(service.clone())));
    registry
}

fn apply_overrides(service: &mut ServiceDefinition, overrides: &Overrides) -> Result<()> {
    if let Some(stage) = &overrides.stage {
        service.set_provider_field("stage", Value::String(stage.clone()))?;
    }
    if let Some(region) = &overrides.region {
        service.set_provider_field("region", Value::String(region.clone()))?;
    }
    Ok(())
}

async fn resolve_naming_inputs(host: &VariableRegistry, service: &mut ServiceDefinition) -> Result<()> {
    let naming_section = format!("/custom/{NAMING_SECTION}");
    let pointers = NAMING_INPUTS
        .iter()
        .copied()
        .chain(std::iter::once(naming_section.as_str()));

    for pointer in pointers {
        if let Some(value) = service.root_mut().pointer_mut(pointer) {
            host.populate(value)
                .await
                .with_context(|| format!("Failed to resolve {}", pointer.trim_start_matches('/').replace('/', ".")))?;
        }
    }
    Ok(())
}
