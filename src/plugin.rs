//! The resource-names plugin as the deployment framework sees it.
//!
//! [`ResourceNamesPlugin`] bundles the injection coordinator, the `name:`/`topic:`
//! variable sources and the hook table, and runs hook actions on dispatch.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::debug;

use crate::config::MergeTarget;
use crate::constants::{NAME_SOURCE, TOPIC_SOURCE};
use crate::hooks::{HookAction, LifecycleEvent, hook_table};
use crate::inject::{InjectionCoordinator, NameSource, ReferenceResolver, TopicSource};
use crate::naming::EnvironmentMap;
use crate::service::ServiceDefinition;
use crate::variables::VariableRegistry;

/// Plugin instance for one run.
#[derive(Debug, Clone)]
pub struct ResourceNamesPlugin {
    coordinator: Arc<InjectionCoordinator>,
    references: ReferenceResolver,
    variables: VariableRegistry,
}

impl ResourceNamesPlugin {
    /// Create the plugin and register its variable sources on top of the host's.
    #[must_use]
    pub fn new(coordinator: Arc<InjectionCoordinator>, host_variables: VariableRegistry) -> Self {
        let references = ReferenceResolver::new(Arc::clone(&coordinator));
        let mut variables = host_variables;
        variables.register(NAME_SOURCE, Arc::new(NameSource(references.clone())));
        variables.register(TOPIC_SOURCE, Arc::new(TopicSource(references.clone())));

        Self {
            coordinator,
            references,
            variables,
        }
    }

    /// The injection coordinator.
    #[must_use]
    pub fn coordinator(&self) -> &Arc<InjectionCoordinator> {
        &self.coordinator
    }

    /// Lookup of `name:` and `topic:` addresses.
    #[must_use]
    pub fn references(&self) -> &ReferenceResolver {
        &self.references
    }

    /// All variable sources, host and plugin.
    #[must_use]
    pub fn variables(&self) -> &VariableRegistry {
        &self.variables
    }

    /// The hook table.
    #[must_use]
    pub fn hooks(&self) -> Vec<(LifecycleEvent, HookAction)> {
        hook_table()
    }

    /// Run the hook registered for `event`, if any.
    ///
    /// Returns whether a hook ran. Output of [`HookAction::PrintEnvironment`] goes to
    /// `out`.
    ///
    /// # Errors
    ///
    /// Returns the hook's failure.
    pub async fn dispatch(&self, event: &str, out: &mut dyn Write) -> Result<bool> {
        let Ok(event) = event.parse::<LifecycleEvent>() else {
            debug!("No hook for lifecycle event '{event}'");
            return Ok(false);
        };
        let Some((_, action)) = self.hooks().into_iter().find(|(hooked, _)| *hooked == event) else {
            return Ok(false);
        };

        debug!("Running {action:?} for {event}");
        match action {
            HookAction::Inject => {
                self.coordinator.ensure_injected().await?;
            }
            HookAction::PrintEnvironment => self.print_environment(out).await?,
        }
        Ok(true)
    }

    /// The service definition after injection and variable substitution.
    ///
    /// # Errors
    ///
    /// Fails if injection or any variable fails.
    pub async fn rendered_service(&self) -> Result<ServiceDefinition> {
        self.coordinator.ensure_injected().await?;
        let mut service = self.coordinator.service_snapshot().await;
        self.variables
            .populate_service(&mut service)
            .await
            .context("Failed to resolve variables in the service definition")?;
        Ok(service)
    }

    /// The environment functions will see: the provider environment with computed
    /// names layered on top.
    ///
    /// Only the printed entries go through variable substitution, so sources used
    /// elsewhere in the service need not be resolvable here.
    ///
    /// # Errors
    ///
    /// Fails if injection fails or a variable in the environment cannot be resolved.
    pub async fn merged_environment(&self) -> Result<EnvironmentMap> {
        let state = self.coordinator.ensure_injected().await?;
        let service = self.coordinator.service_snapshot().await;

        let mut provider = Value::Object(service.provider_environment().cloned().unwrap_or_default());
        self.variables
            .populate(&mut provider)
            .await
            .context("Failed to resolve variables in provider.environment")?;

        let mut environment = provider
            .as_object()
            .map(EnvironmentMap::from_json_map)
            .unwrap_or_default();
        if self.coordinator.settings().merge_target == MergeTarget::Functions {
            environment.extend(state.environment());
        }
        Ok(environment)
    }

    /// Print `KEY=value` for every entry of [`ResourceNamesPlugin::merged_environment`].
    ///
    /// # Errors
    ///
    /// Fails if the environment cannot be computed or written.
    pub async fn print_environment(&self, out: &mut dyn Write) -> Result<()> {
        let environment = self.merged_environment().await?;
        for (key, value) in environment.iter() {
            let rendered = value
                .to_shell_value()
                .with_context(|| format!("Failed to render value of {key}"))?;
            writeln!(out, "{key}={rendered}")?;
        }
        Ok(())
    }
}
