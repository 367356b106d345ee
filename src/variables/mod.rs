//! `${source:address}` variable substitution.
//!
//! String values in a service definition may reference values from named sources:
//!
//! ```yaml
//! provider:
//!   stage: ${opt:stage, 'dev'}
//! custom:
//!   ordersQueue: ${name:OrdersQueue}
//!   alertsArn: ${topic:Alerts.arn}
//!   banner: "orders-${self:provider.stage}"
//! ```
//!
//! A string that is exactly one expression is replaced by the resolved value, which may
//! be any JSON value (an ARN expression is a mapping). An expression embedded in a longer
//! string must resolve to a string, number or boolean. Innermost expressions resolve
//! first, so `${self:custom.${opt:stage}}` works. A trailing `, 'fallback'` is used when
//! the source fails to produce a value.
//!
//! Sources implement [`VariableResolver`] and are registered by prefix in a
//! [`VariableRegistry`].

pub mod sources;

pub use sources::{EnvSource, OptSource, SelfSource};

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use anyhow::Result;
use futures::future::BoxFuture;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::core::ResnamesError;
use crate::service::{RESOURCES_SECTION, ServiceDefinition};

/// Substitution passes per string before giving up.
const MAX_DEPTH: usize = 10;

static EXPRESSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^${}]+)\}").expect("variable pattern is valid"));

/// A named source of variable values.
pub trait VariableResolver: Send + Sync {
    /// Resolve the part of the expression after `source:`.
    fn resolve<'a>(&'a self, address: &'a str) -> BoxFuture<'a, Result<Value>>;
}

/// Registered variable sources, keyed by prefix.
#[derive(Clone, Default)]
pub struct VariableRegistry {
    sources: HashMap<String, Arc<dyn VariableResolver>>,
}

impl std::fmt::Debug for VariableRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.sources.keys().collect();
        names.sort();
        f.debug_struct("VariableRegistry").field("sources", &names).finish()
    }
}

impl VariableRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a source.
    pub fn register(&mut self, source: impl Into<String>, resolver: Arc<dyn VariableResolver>) {
        self.sources.insert(source.into(), resolver);
    }

    /// Whether a source is registered.
    #[must_use]
    pub fn contains(&self, source: &str) -> bool {
        self.sources.contains_key(source)
    }

    /// Resolve one expression body such as `opt:stage, 'dev'`.
    ///
    /// # Errors
    ///
    /// Fails on syntax errors, unknown sources, and source failures when no fallback
    /// is given.
    pub async fn resolve_expression(&self, expression: &str) -> Result<Value> {
        let invalid = |reason: &str| ResnamesError::InvalidVariable {
            expression: expression.to_string(),
            reason: reason.to_string(),
        };

        let (reference, fallback) = match expression.split_once(',') {
            Some((reference, fallback)) => {
                let fallback = parse_fallback(fallback.trim())
                    .ok_or_else(|| invalid("fallback must be a quoted string, number or boolean"))?;
                (reference.trim(), Some(fallback))
            }
            None => (expression.trim(), None),
        };
        let (source, address) = reference
            .split_once(':')
            .ok_or_else(|| invalid("expected 'source:address'"))?;
        let source = source.trim();
        let resolver = self.sources.get(source).ok_or_else(|| ResnamesError::UnknownVariableSource {
            source_name: source.to_string(),
        })?;

        match resolver.resolve(address.trim()).await {
            Ok(value) => Ok(value),
            Err(e) => match fallback {
                Some(fallback) => {
                    debug!("Using fallback for '{reference}': {e}");
                    Ok(fallback)
                }
                None => Err(e),
            },
        }
    }

    /// Substitute every expression in one string.
    ///
    /// # Errors
    ///
    /// See [`VariableRegistry::resolve_expression`]; also fails when an embedded
    /// expression resolves to a structured value or nesting is too deep.
    pub async fn resolve_string(&self, text: &str) -> Result<Value> {
        let mut current = text.to_string();
        for _ in 0..MAX_DEPTH {
            let found = EXPRESSION
                .captures(&current)
                .and_then(|caps| Some((caps.get(0)?.range(), caps.get(1)?.as_str().to_string())));
            let Some((whole, body)) = found else {
                return Ok(Value::String(current));
            };
            let value = self.resolve_expression(&body).await?;

            if whole.start == 0 && whole.end == current.len() {
                match value {
                    Value::String(s) => current = s,
                    other => return Ok(other),
                }
                continue;
            }

            let text = match &value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => {
                    return Err(ResnamesError::InvalidVariable {
                        expression: body,
                        reason: "a value embedded in a string must be a string, number or boolean".to_string(),
                    }
                    .into());
                }
            };
            current.replace_range(whole, &text);
        }

        Err(ResnamesError::InvalidVariable {
            expression: text.to_string(),
            reason: format!("still unresolved after {MAX_DEPTH} passes"),
        }
        .into())
    }

    /// Substitute expressions in every string of `value`, in place.
    ///
    /// # Errors
    ///
    /// Returns the first failure, naming the location of the offending string.
    pub async fn populate(&self, value: &mut Value) -> Result<()> {
        let mut pointers = Vec::new();
        collect_templated(value, String::new(), &mut pointers);

        for pointer in pointers {
            let Some(Value::String(text)) = value.pointer(&pointer) else {
                continue;
            };
            let resolved = self
                .resolve_string(text)
                .await
                .map_err(|e| e.context(format!("while resolving {}", display_pointer(&pointer))))?;
            if let Some(slot) = value.pointer_mut(&pointer) {
                *slot = resolved;
            }
        }
        Ok(())
    }

    /// Substitute expressions across a service definition, leaving `resources` for
    /// the deployment engine.
    ///
    /// # Errors
    ///
    /// See [`VariableRegistry::populate`].
    pub async fn populate_service(&self, service: &mut ServiceDefinition) -> Result<()> {
        let Some(root) = service.root_mut().as_object_mut() else {
            return Ok(());
        };
        for (key, value) in root.iter_mut() {
            if key == RESOURCES_SECTION {
                continue;
            }
            self.populate(value)
                .await
                .map_err(|e| e.context(format!("in section '{key}'")))?;
        }
        Ok(())
    }
}

fn parse_fallback(text: &str) -> Option<Value> {
    for quote in ['\'', '"'] {
        if let Some(inner) = text.strip_prefix(quote).and_then(|t| t.strip_suffix(quote)) {
            return Some(Value::String(inner.to_string()));
        }
    }
    match text {
        "true" => Some(Value::Bool(true)),
        "false" => Some(Value::Bool(false)),
        _ => serde_json::from_str::<serde_json::Number>(text).ok().map(Value::Number),
    }
}

fn collect_templated(value: &Value, pointer: String, out: &mut Vec<String>) {
    match value {
        Value::String(s) if s.contains("${") => out.push(pointer),
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                collect_templated(item, format!("{pointer}/{i}"), out);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                let escaped = key.replace('~', "~0").replace('/', "~1");
                collect_templated(item, format!("{pointer}/{escaped}"), out);
            }
        }
        _ => {}
    }
}

fn display_pointer(pointer: &str) -> String {
    pointer
        .trim_start_matches('/')
        .split('/')
        .map(|p| p.replace("~1", "/").replace("~0", "~"))
        .collect::<Vec<_>>()
        .join(".")
}
