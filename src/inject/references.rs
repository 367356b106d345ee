//! `name:` and `topic:` references.
//!
//! Other configuration values can point at computed names by symbolic address:
//!
//! - `name:<logicalId>` resolves to the effective physical name
//! - `topic:<logicalId>` resolves to `{topicName, arn}`
//! - `topic:<logicalId>.topicName` and `topic:<logicalId>.arn` resolve to one field
//!
//! Every lookup makes sure injection has run first.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;
use strsim::levenshtein;

use super::coordinator::InjectionCoordinator;
use crate::constants::{NAME_SOURCE, TOPIC_SOURCE};
use crate::core::ResnamesError;
use crate::variables::VariableResolver;

/// Maximum edit distance, as a percentage of the requested id, for a suggestion.
const SIMILARITY_THRESHOLD_PERCENT: usize = 50;

/// A parsed `name:` or `topic:` address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolicAddress {
    /// `name:<logicalId>`
    Name(String),
    /// `topic:<logicalId>[.<property>]`
    Topic {
        /// Topic logical id
        topic: String,
        /// Requested property, if any
        property: Option<String>,
    },
}

impl SymbolicAddress {
    /// Parse the part after `topic:`.
    #[must_use]
    pub fn topic(body: &str) -> Self {
        match body.split_once('.') {
            Some((topic, property)) => Self::Topic {
                topic: topic.to_string(),
                property: Some(property.to_string()),
            },
            None => Self::Topic {
                topic: body.to_string(),
                property: None,
            },
        }
    }
}

impl FromStr for SymbolicAddress {
    type Err = ResnamesError;

    fn from_str(address: &str) -> Result<Self, Self::Err> {
        match address.split_once(':') {
            Some((NAME_SOURCE, id)) => Ok(Self::Name(id.to_string())),
            Some((TOPIC_SOURCE, body)) => Ok(Self::topic(body)),
            Some((source, _)) => Err(ResnamesError::UnknownVariableSource {
                source_name: source.to_string(),
            }),
            None => Err(ResnamesError::InvalidVariable {
                expression: address.to_string(),
                reason: format!("expected '{NAME_SOURCE}:<id>' or '{TOPIC_SOURCE}:<id>[.<property>]'"),
            }),
        }
    }
}

impl fmt::Display for SymbolicAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(id) => write!(f, "{NAME_SOURCE}:{id}"),
            Self::Topic { topic, property: None } => write!(f, "{TOPIC_SOURCE}:{topic}"),
            Self::Topic {
                topic,
                property: Some(property),
            } => write!(f, "{TOPIC_SOURCE}:{topic}.{property}"),
        }
    }
}

/// Looks up computed names and topics, injecting first if needed.
#[derive(Debug, Clone)]
pub struct ReferenceResolver {
    coordinator: Arc<InjectionCoordinator>,
}

impl ReferenceResolver {
    /// Resolver backed by `coordinator`.
    #[must_use]
    pub fn new(coordinator: Arc<InjectionCoordinator>) -> Self {
        Self { coordinator }
    }

    /// Effective name of `logical_id`.
    ///
    /// # Errors
    ///
    /// Fails with the injection error, or [`ResnamesError::UnknownNameReference`].
    pub async fn resolve_name(&self, logical_id: &str) -> Result<Value, ResnamesError> {
        let state = self.coordinator.ensure_injected().await?;
        match state.name(logical_id) {
            Some(name) => Ok(name.clone()),
            None => Err(ResnamesError::UnknownNameReference {
                logical_id: logical_id.to_string(),
                suggestion: closest(logical_id, state.named_ids()),
            }),
        }
    }

    /// Topic record of `topic`, or one of its properties.
    ///
    /// # Errors
    ///
    /// Fails with the injection error, [`ResnamesError::UnknownTopicReference`] or
    /// [`ResnamesError::UnknownTopicProperty`].
    pub async fn resolve_topic(&self, topic: &str, property: Option<&str>) -> Result<Value, ResnamesError> {
        let state = self.coordinator.ensure_injected().await?;
        let record = state.topic(topic).ok_or_else(|| ResnamesError::UnknownTopicReference {
            topic: topic.to_string(),
            suggestion: closest(topic, state.topic_ids()),
        })?;

        match property {
            None => Ok(record.to_json()),
            Some(property) => record.property(property).ok_or_else(|| ResnamesError::UnknownTopicProperty {
                topic: topic.to_string(),
                property: property.to_string(),
            }),
        }
    }

    /// Resolve a parsed address.
    ///
    /// # Errors
    ///
    /// See [`ReferenceResolver::resolve_name`] and [`ReferenceResolver::resolve_topic`].
    pub async fn resolve(&self, address: &SymbolicAddress) -> Result<Value, ResnamesError> {
        match address {
            SymbolicAddress::Name(id) => self.resolve_name(id).await,
            SymbolicAddress::Topic { topic, property } => self.resolve_topic(topic, property.as_deref()).await,
        }
    }
}

/// `${name:<logicalId>}` variable source.
#[derive(Debug, Clone)]
pub struct NameSource(pub ReferenceResolver);

impl VariableResolver for NameSource {
    fn resolve<'a>(&'a self, address: &'a str) -> BoxFuture<'a, anyhow::Result<Value>> {
        Box::pin(async move { Ok(self.0.resolve_name(address).await?) })
    }
}

/// `${topic:<logicalId>[.<property>]}` variable source.
#[derive(Debug, Clone)]
pub struct TopicSource(pub ReferenceResolver);

impl VariableResolver for TopicSource {
    fn resolve<'a>(&'a self, address: &'a str) -> BoxFuture<'a, anyhow::Result<Value>> {
        Box::pin(async move { Ok(self.0.resolve(&SymbolicAddress::topic(address)).await?) })
    }
}

fn closest<'a>(target: &str, candidates: impl Iterator<Item = &'a str>) -> Option<String> {
    candidates
        .map(|candidate| (levenshtein(target, candidate), candidate))
        .filter(|(distance, _)| *distance <= target.len() * SIMILARITY_THRESHOLD_PERCENT / 100)
        .min()
        .map(|(_, candidate)| candidate.to_string())
}
