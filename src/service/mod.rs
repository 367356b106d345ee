//! Service definition model.
//!
//! A service definition is the YAML (or JSON) file describing a deployable service:
//! its name, provider settings, functions and the `resources` collection. It is kept
//! as an order-preserving [`serde_json::Value`] so that rendering it back out keeps the
//! author's key order, and accessed through the typed helpers below.
//!
//! # Resource Collections
//!
//! `resources` is either a single document or a sequence of documents. Each document
//! holds a `Resources` mapping from logical id to declaration:
//!
//! ```yaml
//! resources:
//!   Resources:
//!     UserTable:
//!       Type: AWS::DynamoDB::Table
//! ```
//!
//! ```yaml
//! resources:
//!   - Resources:
//!       UserTable: { Type: AWS::DynamoDB::Table }
//!   - Resources:
//!       Jobs: { Type: AWS::SQS::Queue }
//!   - Outputs: {}
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use tokio::fs;
use tracing::debug;

use crate::constants::{NAMING_SECTION, RESOURCES_KEY, SERVICE_FILE_CANDIDATES};
use crate::core::ResnamesError;
use crate::naming::PropertyPath;

/// Top-level key holding the resource collection.
pub const RESOURCES_SECTION: &str = "resources";

const ENVIRONMENT_KEY: &str = "environment";

/// A loaded service definition.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceDefinition {
    path: Option<PathBuf>,
    root: Value,
}

impl ServiceDefinition {
    /// Wrap an already parsed document.
    ///
    /// An empty document (`null`) becomes an empty mapping.
    ///
    /// # Errors
    ///
    /// Returns [`ResnamesError::ServiceParseError`] if the document is not a mapping.
    pub fn from_value(root: Value) -> Result<Self, ResnamesError> {
        let root = match root {
            Value::Null => Value::Object(Map::new()),
            Value::Object(_) => root,
            other => {
                return Err(ResnamesError::ServiceParseError {
                    file: "<inline>".to_string(),
                    reason: format!("top level must be a mapping, found {}", kind(&other)),
                });
            }
        };
        Ok(Self { path: None, root })
    }

    /// Parse YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`ResnamesError::ServiceParseError`] on invalid YAML or a non-mapping
    /// document.
    pub fn from_yaml_str(text: &str) -> Result<Self, ResnamesError> {
        let root: Value = serde_yaml::from_str(text).map_err(|e| ResnamesError::ServiceParseError {
            file: "<inline>".to_string(),
            reason: e.to_string(),
        })?;
        Self::from_value(root)
    }

    /// Parse JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`ResnamesError::ServiceParseError`] on invalid JSON or a non-mapping
    /// document.
    pub fn from_json_str(text: &str) -> Result<Self, ResnamesError> {
        let root: Value = serde_json::from_str(text).map_err(|e| ResnamesError::ServiceParseError {
            file: "<inline>".to_string(),
            reason: e.to_string(),
        })?;
        Self::from_value(root)
    }

    /// Load a service definition, choosing the parser by file extension.
    ///
    /// `.json` files are parsed as JSON; everything else as YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub async fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read service definition {}", path.display()))?;

        let is_json = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let parsed = if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_yaml_str(&text)
        };

        let mut service = parsed.map_err(|e| match e {
            ResnamesError::ServiceParseError { reason, .. } => ResnamesError::ServiceParseError {
                file: path.display().to_string(),
                reason,
            },
            other => other,
        })?;
        service.path = Some(path.to_path_buf());

        debug!("Loaded service definition from {}", path.display());
        Ok(service)
    }

    /// Find the service definition file in `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`ResnamesError::ServiceNotFound`] if none of the candidate names exist.
    pub async fn discover(dir: &Path) -> Result<PathBuf, ResnamesError> {
        for candidate in SERVICE_FILE_CANDIDATES {
            let path = dir.join(candidate);
            if fs::try_exists(&path).await.unwrap_or(false) {
                return Ok(path);
            }
        }
        Err(ResnamesError::ServiceNotFound {
            path: dir.display().to_string(),
        })
    }

    /// File this definition was loaded from, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The whole document.
    #[must_use]
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// The whole document, mutably.
    pub fn root_mut(&mut self) -> &mut Value {
        &mut self.root
    }

    /// Service name; `service` may be a string or `{ name: ... }`.
    #[must_use]
    pub fn service_name(&self) -> Option<&str> {
        match self.root.get("service")? {
            Value::String(name) => Some(name),
            Value::Object(map) => map.get("name").and_then(Value::as_str),
            _ => None,
        }
    }

    /// `provider.stage`
    #[must_use]
    pub fn provider_stage(&self) -> Option<&str> {
        self.root.get("provider")?.get("stage")?.as_str()
    }

    /// `provider.region`
    #[must_use]
    pub fn provider_region(&self) -> Option<&str> {
        self.root.get("provider")?.get("region")?.as_str()
    }

    /// `custom.resourceNames`
    #[must_use]
    pub fn naming_section(&self) -> Option<&Value> {
        self.root.get("custom")?.get(NAMING_SECTION).filter(|v| !v.is_null())
    }

    /// Look up a dotted path such as `provider.stage`; the empty path is the root.
    #[must_use]
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        if path.is_empty() {
            return Some(&self.root);
        }
        path.parse::<PropertyPath>().ok()?.get(&self.root)
    }

    /// `Resources` mappings of every resource document, in declaration order.
    ///
    /// A missing `resources` section yields no documents. In a sequence, documents
    /// without `Resources` (for example an `Outputs`-only document) are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ResnamesError::MalformedResourceTree`] if `resources` is a single
    /// mapping without `Resources`, or if any part has the wrong type.
    pub fn resource_documents_mut(&mut self) -> Result<Vec<&mut Map<String, Value>>, ResnamesError> {
        let Some(collection) = self.root.get_mut(RESOURCES_SECTION) else {
            return Ok(Vec::new());
        };

        match collection {
            Value::Null => Ok(Vec::new()),
            Value::Object(document) => {
                let resources = document.get_mut(RESOURCES_KEY).ok_or_else(|| {
                    ResnamesError::malformed(format!("'{RESOURCES_SECTION}' has no '{RESOURCES_KEY}' mapping"))
                })?;
                Ok(resources_map(resources, 0)?.into_iter().collect())
            }
            Value::Array(documents) => {
                let mut maps = Vec::with_capacity(documents.len());
                for (index, document) in documents.iter_mut().enumerate() {
                    let document = document.as_object_mut().ok_or_else(|| {
                        ResnamesError::malformed(format!("resource document #{index} must be a mapping"))
                    })?;
                    match document.get_mut(RESOURCES_KEY) {
                        Some(resources) => maps.extend(resources_map(resources, index)?),
                        None => debug!("Resource document #{index} has no {RESOURCES_KEY}, skipping"),
                    }
                }
                Ok(maps)
            }
            other => Err(ResnamesError::malformed(format!(
                "'{RESOURCES_SECTION}' must be a mapping or a sequence, found {}",
                kind(other)
            ))),
        }
    }

    /// Set `provider.<key>`, creating `provider` if absent.
    ///
    /// # Errors
    ///
    /// Returns [`ResnamesError::MalformedResourceTree`] if `provider` is not a mapping.
    pub fn set_provider_field(&mut self, key: &str, value: Value) -> Result<(), ResnamesError> {
        let root = self
            .root
            .as_object_mut()
            .ok_or_else(|| ResnamesError::malformed("service definition must be a mapping"))?;
        child_mapping(root, "provider", "provider")?.insert(key.to_string(), value);
        Ok(())
    }

    /// `provider.environment`, if present.
    #[must_use]
    pub fn provider_environment(&self) -> Option<&Map<String, Value>> {
        self.root.get("provider")?.get(ENVIRONMENT_KEY)?.as_object()
    }

    /// `provider.environment`, created if absent.
    ///
    /// # Errors
    ///
    /// Returns [`ResnamesError::MalformedResourceTree`] if `provider` or its
    /// `environment` is not a mapping.
    pub fn provider_environment_mut(&mut self) -> Result<&mut Map<String, Value>, ResnamesError> {
        let root = self
            .root
            .as_object_mut()
            .ok_or_else(|| ResnamesError::malformed("service definition must be a mapping"))?;
        let provider = child_mapping(root, "provider", "provider")?;
        child_mapping(provider, ENVIRONMENT_KEY, "provider.environment")
    }

    /// Names of declared functions, in declaration order.
    #[must_use]
    pub fn function_names(&self) -> Vec<&str> {
        self.root
            .get("functions")
            .and_then(Value::as_object)
            .map(|functions| functions.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// `functions.<name>.environment` of every function, each created if absent.
    ///
    /// # Errors
    ///
    /// Returns [`ResnamesError::MalformedResourceTree`] if a function or its
    /// environment is not a mapping.
    pub fn function_environments_mut(&mut self) -> Result<Vec<&mut Map<String, Value>>, ResnamesError> {
        let Some(functions) = self.root.get_mut("functions") else {
            return Ok(Vec::new());
        };
        let Some(functions) = functions.as_object_mut() else {
            return Err(ResnamesError::malformed("'functions' must be a mapping"));
        };

        let mut environments = Vec::with_capacity(functions.len());
        for (name, function) in functions.iter_mut() {
            if function.is_null() {
                *function = Value::Object(Map::new());
            }
            let function = function
                .as_object_mut()
                .ok_or_else(|| ResnamesError::malformed(format!("function '{name}' must be a mapping")))?;
            environments.push(child_mapping(function, ENVIRONMENT_KEY, &format!("functions.{name}.environment"))?);
        }
        Ok(environments)
    }

    /// Render as YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(&self.root).context("Failed to render service definition as YAML")
    }

    /// Render as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.root).context("Failed to render service definition as JSON")
    }
}

fn resources_map(resources: &mut Value, index: usize) -> Result<Option<&mut Map<String, Value>>, ResnamesError> {
    match resources {
        Value::Null => {
            debug!("'{RESOURCES_KEY}' of resource document #{index} is empty");
            Ok(None)
        }
        Value::Object(map) => Ok(Some(map)),
        other => Err(ResnamesError::malformed(format!(
            "'{RESOURCES_KEY}' of resource document #{index} must be a mapping, found {}",
            kind(other)
        ))),
    }
}

fn child_mapping<'a>(
    parent: &'a mut Map<String, Value>,
    key: &str,
    display: &str,
) -> Result<&'a mut Map<String, Value>, ResnamesError> {
    let child = parent.entry(key.to_string()).or_insert_with(|| Value::Object(Map::new()));
    if child.is_null() {
        *child = Value::Object(Map::new());
    }
    child
        .as_object_mut()
        .ok_or_else(|| ResnamesError::malformed(format!("'{display}' must be a mapping")))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_service_name_forms() {
        let svc = ServiceDefinition::from_yaml_str("service: orders").unwrap();
        assert_eq!(svc.service_name(), Some("orders"));
        let svc = ServiceDefinition::from_yaml_str("service:\n  name: orders\n").unwrap();
        assert_eq!(svc.service_name(), Some("orders"));
        let svc = ServiceDefinition::from_yaml_str("provider: {}").unwrap();
        assert_eq!(svc.service_name(), None);
    }

    #[test]
    fn test_non_mapping_document_is_rejected() {
        let err = ServiceDefinition::from_yaml_str("- a\n- b\n").unwrap_err();
        assert!(matches!(err, ResnamesError::ServiceParseError { .. }));
    }

    #[test]
    fn test_single_document_resources() {
        let mut svc = ServiceDefinition::from_yaml_str(
            "resources:\n  Resources:\n    A: { Type: AWS::S3::Bucket }\n    B: { Type: AWS::S3::Bucket }\n",
        )
        .unwrap();
        let docs = svc.resource_documents_mut().unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].keys().collect::<Vec<_>>(), vec!["A", "B"]);
    }

    #[test]
    fn test_multi_document_resources_skip_outputs() {
        let mut svc = ServiceDefinition::from_value(json!({
            "resources": [
                {"Resources": {"A": {"Type": "AWS::S3::Bucket"}}},
                {"Outputs": {}},
                {"Resources": {"B": {"Type": "AWS::S3::Bucket"}}}
            ]
        }))
        .unwrap();
        assert_eq!(svc.resource_documents_mut().unwrap().len(), 2);
    }

    #[test]
    fn test_missing_resources_section_is_empty() {
        let mut svc = ServiceDefinition::from_yaml_str("service: s").unwrap();
        assert!(svc.resource_documents_mut().unwrap().is_empty());
    }

    #[test]
    fn test_null_resources_mapping_is_empty() {
        let mut svc = ServiceDefinition::from_yaml_str("resources:\n  Resources:\n").unwrap();
        assert!(svc.resource_documents_mut().unwrap().is_empty());
    }

    #[test]
    fn test_provider_accessors() {
        let svc = ServiceDefinition::from_yaml_str("provider:\n  stage: prod\n  region: eu-west-1\n").unwrap();
        assert_eq!(svc.provider_stage(), Some("prod"));
        assert_eq!(svc.provider_region(), Some("eu-west-1"));
        assert_eq!(ServiceDefinition::from_yaml_str("service: s").unwrap().provider_region(), None);
    }

    #[test]
    fn test_resources_without_resources_key_is_malformed() {
        let mut svc = ServiceDefinition::from_yaml_str("resources:\n  Outputs: {}\n").unwrap();
        let err = svc.resource_documents_mut().unwrap_err();
        assert!(matches!(err, ResnamesError::MalformedResourceTree { .. }));
    }

    #[test]
    fn test_provider_environment_is_created() {
        let mut svc = ServiceDefinition::from_yaml_str("service: s").unwrap();
        svc.provider_environment_mut().unwrap().insert("A".into(), json!("1"));
        assert_eq!(svc.root()["provider"]["environment"]["A"], "1");
    }

    #[test]
    fn test_function_environments() {
        let mut svc = ServiceDefinition::from_yaml_str(
            "functions:\n  api:\n    handler: api.handler\n  worker:\n    environment:\n      X: '1'\n",
        )
        .unwrap();
        assert_eq!(svc.function_names(), vec!["api", "worker"]);
        let envs = svc.function_environments_mut().unwrap();
        assert_eq!(envs.len(), 2);
        assert!(envs[0].is_empty());
        assert_eq!(envs[1]["X"], "1");
    }

    #[test]
    fn test_lookup() {
        let svc = ServiceDefinition::from_yaml_str("provider:\n  stage: prod\n  tags: [a, b]\n").unwrap();
        assert_eq!(svc.lookup("provider.stage"), Some(&json!("prod")));
        assert_eq!(svc.lookup("provider.tags[1]"), Some(&json!("b")));
        assert_eq!(svc.lookup("provider.nope"), None);
        assert!(svc.lookup("").is_some());
    }

    #[tokio::test]
    async fn test_load_and_discover() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            ServiceDefinition::discover(temp.path()).await,
            Err(ResnamesError::ServiceNotFound { .. })
        ));

        let path = temp.path().join("serverless.json");
        std::fs::write(&path, r#"{"service": "orders", "provider": {"stage": "qa"}}"#).unwrap();
        let found = ServiceDefinition::discover(temp.path()).await.unwrap();
        assert_eq!(found, path);

        let svc = ServiceDefinition::load(&found).await.unwrap();
        assert_eq!(svc.provider_stage(), Some("qa"));
        assert_eq!(svc.path(), Some(path.as_path()));
    }

    #[tokio::test]
    async fn test_load_reports_file_on_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("serverless.yml");
        std::fs::write(&path, "service: [unclosed").unwrap();
        let err = ServiceDefinition::load(&path).await.unwrap_err();
        let err = err.downcast_ref::<ResnamesError>().unwrap();
        match err {
            ResnamesError::ServiceParseError { file, .. } => assert!(file.ends_with("serverless.yml")),
            other => panic!("unexpected error {other}"),
        }
    }
}
