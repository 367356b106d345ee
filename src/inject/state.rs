//! Registries produced by one injection run.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::{Value, json};

use crate::core::ResnamesError;
use crate::naming::{EnvValue, EnvironmentMap, Expr};

/// Name and ARN of a topic resolved in this run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicRecord {
    /// Effective physical topic name
    pub topic_name: String,
    /// Deploy-time ARN expression
    pub arn: Expr,
}

impl TopicRecord {
    /// The whole record as `{topicName, arn}`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({ "topicName": self.topic_name, "arn": self.arn.to_json() })
    }

    /// A single property, or `None` if it is unknown or empty.
    #[must_use]
    pub fn property(&self, property: &str) -> Option<Value> {
        match property {
            "topicName" if !self.topic_name.is_empty() => Some(Value::String(self.topic_name.clone())),
            "arn" => Some(self.arn.to_json()),
            _ => None,
        }
    }
}

/// One resource that received a name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedResource {
    /// Logical id in the resource collection
    pub logical_id: String,
    /// Resource type tag
    pub resource_type: String,
    /// Environment key the name is exposed under
    pub env_key: String,
    /// Effective physical name, or the JSON text of a deployment-time name
    pub name: String,
}

/// Everything one injection run computed.
///
/// Built by the coordinator and shared read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct InjectionState {
    environment: EnvironmentMap,
    key_owners: HashMap<String, String>,
    names: HashMap<String, Value>,
    topics: HashMap<String, TopicRecord>,
    resources: Vec<ResolvedResource>,
}

impl InjectionState {
    /// Empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a computed environment entry on behalf of `logical_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ResnamesError::DuplicateEnvironmentKey`] if another resource already
    /// produced `key` in this run.
    pub fn expose(
        &mut self,
        key: impl Into<String>,
        value: impl Into<EnvValue>,
        logical_id: &str,
    ) -> Result<(), ResnamesError> {
        let key = key.into();
        if let Some(first) = self.key_owners.get(&key) {
            return Err(ResnamesError::DuplicateEnvironmentKey {
                key,
                first: first.clone(),
                second: logical_id.to_string(),
            });
        }
        self.key_owners.insert(key.clone(), logical_id.to_string());
        self.environment.insert(key, value);
        Ok(())
    }

    /// Record the effective name of a resource.
    pub fn record_name(&mut self, resource: ResolvedResource) {
        let name = Value::String(resource.name.clone());
        self.record_deferred_name(resource, name);
    }

    /// Record a resource whose name is a deployment-time expression.
    ///
    /// `name:` lookups return `value`; the listing shows its JSON text.
    pub fn record_deferred_name(&mut self, resource: ResolvedResource, value: Value) {
        self.names.insert(resource.logical_id.clone(), value);
        self.resources.push(resource);
    }

    /// Register a topic for `topic:` lookups.
    pub fn register_topic(&mut self, logical_id: impl Into<String>, record: TopicRecord) {
        self.topics.insert(logical_id.into(), record);
    }

    /// Computed environment in resolution order.
    #[must_use]
    pub fn environment(&self) -> &EnvironmentMap {
        &self.environment
    }

    /// Effective name of a logical id, usually a string.
    #[must_use]
    pub fn name(&self, logical_id: &str) -> Option<&Value> {
        self.names.get(logical_id)
    }

    /// Topic record of a logical id.
    #[must_use]
    pub fn topic(&self, logical_id: &str) -> Option<&TopicRecord> {
        self.topics.get(logical_id)
    }

    /// Logical ids with a recorded name.
    pub fn named_ids(&self) -> impl Iterator<Item = &str> {
        self.resources.iter().map(|r| r.logical_id.as_str())
    }

    /// Logical ids with a registered topic.
    pub fn topic_ids(&self) -> impl Iterator<Item = &str> {
        self.topics.keys().map(String::as_str)
    }

    /// Resolved resources in declaration order.
    #[must_use]
    pub fn resources(&self) -> &[ResolvedResource] {
        &self.resources
    }
}
