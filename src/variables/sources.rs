//! Host variable sources: `opt`, `env` and `self`.

use std::collections::HashMap;

use anyhow::{Result, anyhow};
use futures::future::BoxFuture;
use serde_json::Value;

use super::VariableResolver;
use crate::service::ServiceDefinition;

/// `${opt:<name>}`: command-line options such as `stage` and `region`.
#[derive(Debug, Clone, Default)]
pub struct OptSource {
    options: HashMap<String, String>,
}

impl OptSource {
    /// Build from `name -> value` pairs; unset options are simply absent.
    pub fn new<I, K, V>(options: I) -> Self
    where
        I: IntoIterator<Item = (K, Option<V>)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            options: options
                .into_iter()
                .filter_map(|(k, v)| Some((k.into(), v?.into())))
                .collect(),
        }
    }
}

impl VariableResolver for OptSource {
    fn resolve<'a>(&'a self, address: &'a str) -> BoxFuture<'a, Result<Value>> {
        Box::pin(async move {
            self.options
                .get(address)
                .map(|v| Value::String(v.clone()))
                .ok_or_else(|| anyhow!("option '--{address}' was not given"))
        })
    }
}

/// `${env:<NAME>}`: process environment variables.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSource;

impl VariableResolver for EnvSource {
    fn resolve<'a>(&'a self, address: &'a str) -> BoxFuture<'a, Result<Value>> {
        Box::pin(async move {
            std::env::var(address)
                .map(Value::String)
                .map_err(|_| anyhow!("environment variable '{address}' is not set"))
        })
    }
}

/// `${self:<path>}`: values from a snapshot of the service definition.
#[derive(Debug, Clone)]
pub struct SelfSource {
    service: ServiceDefinition,
}

impl SelfSource {
    /// Snapshot `service` as it is now.
    #[must_use]
    pub fn new(service: ServiceDefinition) -> Self {
        Self { service }
    }
}

impl VariableResolver for SelfSource {
    fn resolve<'a>(&'a self, address: &'a str) -> BoxFuture<'a, Result<Value>> {
        Box::pin(async move {
            match self.service.lookup(address) {
                Some(Value::Null) | None => Err(anyhow!("'{address}' is not set in the service definition")),
                Some(value) => Ok(value.clone()),
            }
        })
    }
}
