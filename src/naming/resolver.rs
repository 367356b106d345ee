//! Per-resource name resolution.
//!
//! [`ResourceNameResolver`] turns one resource declaration into a physical name, writes
//! it into the resource, and records the name plus any type-specific side channels in
//! the [`InjectionState`].

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use super::case::env_key;
use super::expr::{EnvValue, Expr};
use super::strategy::EffectiveName;
use crate::config::{Settings, UnknownTypePolicy};
use crate::constants::{ARN_SUFFIX, ENV_KEY_SEPARATOR, FIFO_SUFFIX, NAME_SEPARATOR, URL_SUFFIX, types};
use crate::core::ResnamesError;
use crate::inject::{InjectionState, ResolvedResource, TopicRecord};

const TYPE_KEY: &str = "Type";
const PROPERTIES_KEY: &str = "Properties";
const FIFO_FLAG: &str = "FifoQueue";

/// Resolves a single resource declaration.
///
/// The coordinator drives an implementation of this trait over every resource; it is
/// a trait so that alternative resolvers (or counting wrappers in tests) can be
/// swapped in.
pub trait ResolveResource: Send + Sync {
    /// Name `resource` and record the outcome in `state`.
    fn resolve(
        &self,
        logical_id: &str,
        resource: &mut Value,
        state: &mut InjectionState,
    ) -> Result<(), ResnamesError>;
}

/// The convention-based resolver: `<prefix>-<logical-id>-<stage>`.
#[derive(Debug, Clone)]
pub struct ResourceNameResolver {
    settings: Arc<Settings>,
}

impl ResourceNameResolver {
    /// Create a resolver over the given settings.
    #[must_use]
    pub fn new(settings: Arc<Settings>) -> Self {
        Self { settings }
    }

    /// The conventional physical name for an environment key.
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use resnames_cli::config::{NamingConfig, Settings};
    /// use resnames_cli::naming::ResourceNameResolver;
    ///
    /// let resolver = ResourceNameResolver::new(Arc::new(Settings::new(NamingConfig::new("svc", "dev"))));
    /// assert_eq!(resolver.candidate_name("USER_TABLE"), "svc-user-table-dev");
    /// ```
    #[must_use]
    pub fn candidate_name(&self, env_key: &str) -> String {
        let naming = &self.settings.naming;
        [
            naming.prefix.as_str(),
            &env_key.replace(ENV_KEY_SEPARATOR, NAME_SEPARATOR),
            naming.stage.as_str(),
        ]
        .join(NAME_SEPARATOR)
        .to_lowercase()
    }
}

impl ResolveResource for ResourceNameResolver {
    fn resolve(
        &self,
        logical_id: &str,
        resource: &mut Value,
        state: &mut InjectionState,
    ) -> Result<(), ResnamesError> {
        let resource = resource.as_object_mut().ok_or_else(|| {
            ResnamesError::malformed(format!("resource '{logical_id}' must be a mapping"))
        })?;
        let resource_type = match resource.get(TYPE_KEY) {
            Some(Value::String(t)) => t.clone(),
            Some(_) => {
                return Err(ResnamesError::malformed(format!(
                    "resource '{logical_id}' has a non-string Type"
                )));
            }
            None => {
                return Err(ResnamesError::malformed(format!("resource '{logical_id}' has no Type")));
            }
        };

        let Some(placement) = self.settings.strategies.get(&resource_type) else {
            return match self.settings.unknown_types {
                UnknownTypePolicy::Fail => Err(ResnamesError::MissingStrategy {
                    resource_type,
                    logical_id: logical_id.to_string(),
                }),
                UnknownTypePolicy::Skip => {
                    debug!("Skipping {logical_id}: no name strategy for {resource_type}");
                    Ok(())
                }
            };
        };

        let key = env_key(logical_id);
        let candidate = self.candidate_name(&key);

        let properties = resource
            .entry(PROPERTIES_KEY.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if properties.is_null() {
            *properties = Value::Object(Map::new());
        }
        if !properties.is_object() {
            return Err(ResnamesError::malformed(format!(
                "Properties of '{logical_id}' must be a mapping"
            )));
        }

        let mut name = match placement.apply(&candidate, properties)? {
            EffectiveName::Literal(name) => name,
            EffectiveName::Deferred(value) => {
                debug!("{logical_id} ({resource_type}) keeps a deployment-time name via {placement}");
                state.expose(key.clone(), EnvValue::from_json(value.clone()), logical_id)?;
                state.record_deferred_name(
                    ResolvedResource {
                        logical_id: logical_id.to_string(),
                        resource_type,
                        env_key: key,
                        name: value.to_string(),
                    },
                    value,
                );
                return Ok(());
            }
        };

        match resource_type.as_str() {
            types::SQS_QUEUE => {
                if is_fifo(properties) && !name.ends_with(FIFO_SUFFIX) {
                    name.push_str(FIFO_SUFFIX);
                    placement.write(&name, properties)?;
                }
                state.expose(format!("{key}{ARN_SUFFIX}"), Expr::get_att(logical_id, "Arn"), logical_id)?;
                state.expose(format!("{key}{URL_SUFFIX}"), Expr::reference(logical_id), logical_id)?;
            }
            types::SNS_TOPIC => {
                let arn = Expr::sns_topic_arn(&name);
                state.expose(format!("{key}{ARN_SUFFIX}"), arn.clone(), logical_id)?;
                state.register_topic(
                    logical_id,
                    TopicRecord {
                        topic_name: name.clone(),
                        arn,
                    },
                );
            }
            _ => {}
        }

        debug!("{logical_id} ({resource_type}) -> {name} via {placement}");
        state.expose(key.clone(), name.as_str(), logical_id)?;
        state.record_name(ResolvedResource {
            logical_id: logical_id.to_string(),
            resource_type,
            env_key: key,
            name,
        });
        Ok(())
    }
}

fn is_fifo(properties: &Value) -> bool {
    match properties.get(FIFO_FLAG) {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::String(flag)) => flag == "true",
        _ => false,
    }
}
