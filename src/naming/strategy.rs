//! Name placement strategies.
//!
//! A [`Placement`] knows where a resource type keeps its physical name and how to write
//! a candidate name there without clobbering a name the user already chose. The
//! [`StrategyRegistry`] maps resource type tags to placements.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};
use tracing::{trace, warn};

use crate::config::StrategySpec;
use crate::constants::NAME_TAG_KEY;
use crate::core::ResnamesError;

const TAGS_KEY: &str = "Tags";

/// One step of a [`PropertyPath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Mapping key
    Key(String),
    /// Sequence index
    Index(usize),
}

/// A dotted/bracketed path into a property tree, e.g. `DatabaseInput.Name` or
/// `Config.Targets[0].Id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyPath {
    raw: String,
    segments: Vec<PathSegment>,
}

impl PropertyPath {
    /// The parsed segments.
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Look up the value at this path, if every step exists.
    #[must_use]
    pub fn get<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.segments.iter().try_fold(root, |current, segment| match segment {
            PathSegment::Key(key) => current.as_object()?.get(key),
            PathSegment::Index(index) => current.as_array()?.get(*index),
        })
    }

    /// Assign `value` at this path, creating missing intermediate containers.
    ///
    /// Missing or null intermediates become mappings (or sequences when the next step
    /// is an index). An existing scalar in the way is an error.
    pub fn set(&self, root: &mut Value, value: Value) -> Result<(), ResnamesError> {
        let (last, parents) = self
            .segments
            .split_last()
            .ok_or_else(|| ResnamesError::config("empty property path"))?;

        let mut current = root;
        for (i, segment) in parents.iter().enumerate() {
            let next_is_index = matches!(self.segments[i + 1], PathSegment::Index(_));
            current = self.child_mut(current, segment, next_is_index)?;
        }

        match last {
            PathSegment::Key(key) => {
                self.container_object(current)?.insert(key.clone(), value);
            }
            PathSegment::Index(index) => {
                let array = self.container_array(current)?;
                if array.len() <= *index {
                    array.resize(*index + 1, Value::Null);
                }
                array[*index] = value;
            }
        }
        Ok(())
    }

    fn child_mut<'a>(
        &self,
        current: &'a mut Value,
        segment: &PathSegment,
        next_is_index: bool,
    ) -> Result<&'a mut Value, ResnamesError> {
        let empty = || if next_is_index { Value::Array(Vec::new()) } else { Value::Object(Map::new()) };
        let child = match segment {
            PathSegment::Key(key) => {
                self.container_object(current)?.entry(key.clone()).or_insert_with(empty)
            }
            PathSegment::Index(index) => {
                let array = self.container_array(current)?;
                if array.len() <= *index {
                    array.resize(*index + 1, Value::Null);
                }
                &mut array[*index]
            }
        };
        if child.is_null() {
            *child = empty();
        }
        Ok(child)
    }

    fn container_object<'a>(&self, value: &'a mut Value) -> Result<&'a mut Map<String, Value>, ResnamesError> {
        if value.is_null() {
            *value = Value::Object(Map::new());
        }
        value
            .as_object_mut()
            .ok_or_else(|| ResnamesError::malformed(format!("path '{}' is blocked by a non-mapping value", self.raw)))
    }

    fn container_array<'a>(&self, value: &'a mut Value) -> Result<&'a mut Vec<Value>, ResnamesError> {
        if value.is_null() {
            *value = Value::Array(Vec::new());
        }
        value
            .as_array_mut()
            .ok_or_else(|| ResnamesError::malformed(format!("path '{}' is blocked by a non-sequence value", self.raw)))
    }
}

impl FromStr for PropertyPath {
    type Err = ResnamesError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = |why: &str| ResnamesError::config(format!("invalid property path '{raw}': {why}"));
        let mut segments = Vec::new();

        for part in raw.split('.') {
            let (key, mut rest) = match part.find('[') {
                Some(pos) => part.split_at(pos),
                None => (part, ""),
            };
            if key.is_empty() && segments.is_empty() {
                return Err(invalid("path must start with a key"));
            }
            if !key.is_empty() {
                segments.push(PathSegment::Key(key.to_string()));
            } else if rest.is_empty() {
                return Err(invalid("empty segment"));
            }
            while !rest.is_empty() {
                let close = rest.find(']').ok_or_else(|| invalid("unclosed '['"))?;
                let index = rest[1..close].parse::<usize>().map_err(|_| invalid("index must be a number"))?;
                segments.push(PathSegment::Index(index));
                rest = &rest[close + 1..];
                if !rest.is_empty() && !rest.starts_with('[') {
                    return Err(invalid("unexpected text after ']'"));
                }
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// The name a placement settled on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EffectiveName {
    /// A physical name known now.
    Literal(String),
    /// A name only the deployment engine can compute, such as `Fn::Sub` in a tag.
    Deferred(Value),
}

impl EffectiveName {
    /// The literal name, if known now.
    #[must_use]
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Self::Literal(name) => Some(name),
            Self::Deferred(_) => None,
        }
    }
}

impl fmt::Display for EffectiveName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(name) => write!(f, "'{name}'"),
            Self::Deferred(value) => write!(f, "{value}"),
        }
    }
}

impl PartialEq<&str> for EffectiveName {
    fn eq(&self, other: &&str) -> bool {
        self.as_literal() == Some(*other)
    }
}

/// Where a resource type keeps its physical name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// A top-level property such as `QueueName`.
    ScalarField(String),
    /// A nested property such as `DatabaseInput.Name`.
    NestedPath(PropertyPath),
    /// A `{Key, Value}` entry in `Tags` under the given key.
    TagByKey(String),
}

impl Placement {
    /// Place `candidate` into `properties` unless a name is already set.
    ///
    /// Returns the effective name: the existing explicit name if there is one,
    /// otherwise `candidate`. `properties` must be a mapping.
    pub fn apply(&self, candidate: &str, properties: &mut Value) -> Result<EffectiveName, ResnamesError> {
        if let Some(existing) = self.existing_name(properties)? {
            trace!("keeping explicit name {existing} at {self}");
            return Ok(existing);
        }

        match self {
            Self::ScalarField(_) | Self::NestedPath(_) => self.write(candidate, properties)?,
            Self::TagByKey(key) => {
                let tags = tags_mut(properties)?;
                let mut tag = Map::new();
                tag.insert("Key".to_string(), Value::String(key.clone()));
                tag.insert("Value".to_string(), Value::String(candidate.to_string()));
                tags.insert(0, Value::Object(tag));
            }
        }
        Ok(EffectiveName::Literal(candidate.to_string()))
    }

    /// Unconditionally write `name`, replacing whatever is there.
    pub fn write(&self, name: &str, properties: &mut Value) -> Result<(), ResnamesError> {
        let name = Value::String(name.to_string());
        match self {
            Self::ScalarField(field) => {
                let map = properties
                    .as_object_mut()
                    .ok_or_else(|| ResnamesError::malformed("Properties must be a mapping"))?;
                map.insert(field.clone(), name);
            }
            Self::NestedPath(path) => path.set(properties, name)?,
            Self::TagByKey(key) => {
                let tags = tags_mut(properties)?;
                match tags.iter_mut().find(|tag| tag_key(tag) == Some(key.as_str())) {
                    Some(tag) => {
                        if let Some(map) = tag.as_object_mut() {
                            map.insert("Value".to_string(), name);
                        }
                    }
                    None => {
                        let mut tag = Map::new();
                        tag.insert("Key".to_string(), Value::String(key.clone()));
                        tag.insert("Value".to_string(), name);
                        tags.insert(0, Value::Object(tag));
                    }
                }
            }
        }
        Ok(())
    }

    /// The explicit name already present at this placement, if any.
    ///
    /// For fields and paths, empty strings and nulls count as unset, and a non-string
    /// value (for example an intrinsic function) is rejected. A tag counts as present
    /// as soon as its key exists; its value is taken as is, and a non-literal value is
    /// kept as a deployment-time name.
    pub fn existing_name(&self, properties: &Value) -> Result<Option<EffectiveName>, ResnamesError> {
        let existing = match self {
            Self::ScalarField(field) => properties.get(field),
            Self::NestedPath(path) => path.get(properties),
            Self::TagByKey(key) => {
                let Some(tag) = properties
                    .get(TAGS_KEY)
                    .and_then(Value::as_array)
                    .and_then(|tags| tags.iter().find(|tag| tag_key(tag) == Some(key.as_str())))
                else {
                    return Ok(None);
                };
                return Ok(Some(match tag.get("Value") {
                    Some(Value::String(s)) => EffectiveName::Literal(s.clone()),
                    Some(Value::Number(n)) => EffectiveName::Literal(n.to_string()),
                    None | Some(Value::Null) => {
                        warn!("tag '{key}' has no value, keeping it unchanged");
                        EffectiveName::Literal(String::new())
                    }
                    Some(other) => EffectiveName::Deferred(other.clone()),
                }));
            }
        };

        match existing {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) if s.is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(EffectiveName::Literal(s.clone()))),
            Some(Value::Number(n)) => Ok(Some(EffectiveName::Literal(n.to_string()))),
            Some(other) => Err(ResnamesError::malformed(format!(
                "name at {self} must be a literal string, found {other}"
            ))),
        }
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ScalarField(field) => write!(f, "field '{field}'"),
            Self::NestedPath(path) => write!(f, "path '{path}'"),
            Self::TagByKey(key) => write!(f, "tag '{key}'"),
        }
    }
}

impl TryFrom<&StrategySpec> for Placement {
    type Error = ResnamesError;

    fn try_from(spec: &StrategySpec) -> Result<Self, Self::Error> {
        match (&spec.field, &spec.path, &spec.tag) {
            (Some(field), None, None) => Ok(Self::ScalarField(field.clone())),
            (None, Some(path), None) => Ok(Self::NestedPath(path.parse()?)),
            (None, None, Some(tag)) => Ok(Self::TagByKey(tag.clone())),
            _ => Err(ResnamesError::config(
                "a strategy needs exactly one of 'field', 'path' or 'tag'",
            )),
        }
    }
}

fn tag_key(tag: &Value) -> Option<&str> {
    tag.get("Key").and_then(Value::as_str)
}

fn tags_mut(properties: &mut Value) -> Result<&mut Vec<Value>, ResnamesError> {
    let map = properties
        .as_object_mut()
        .ok_or_else(|| ResnamesError::malformed("Properties must be a mapping"))?;
    let tags = map.entry(TAGS_KEY.to_string()).or_insert_with(|| Value::Array(Vec::new()));
    if tags.is_null() {
        *tags = Value::Array(Vec::new());
    }
    tags.as_array_mut().ok_or_else(|| ResnamesError::malformed("Tags must be a list of {Key, Value}"))
}

/// Registry from resource type tag to [`Placement`].
#[derive(Debug, Clone, Default)]
pub struct StrategyRegistry {
    placements: HashMap<String, Placement>,
}

impl StrategyRegistry {
    /// An empty registry.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in table of known resource types.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        for (resource_type, field) in [
            ("AWS::SQS::Queue", "QueueName"),
            ("AWS::S3::Bucket", "BucketName"),
            ("AWS::SNS::Topic", "TopicName"),
            ("AWS::DocDB::DBCluster", "DBClusterIdentifier"),
            ("AWS::DocDB::DBInstance", "DBInstanceIdentifier"),
            ("AWS::DynamoDB::Table", "TableName"),
            ("AWS::IAM::Role", "RoleName"),
            ("AWS::Kinesis::Stream", "Name"),
            ("AWS::Logs::LogGroup", "LogGroupName"),
        ] {
            registry.register(resource_type, Placement::ScalarField(field.to_string()));
        }
        registry.register(
            "AWS::Glue::Database",
            Placement::NestedPath(PropertyPath {
                raw: "DatabaseInput.Name".to_string(),
                segments: vec![
                    PathSegment::Key("DatabaseInput".to_string()),
                    PathSegment::Key("Name".to_string()),
                ],
            }),
        );
        registry.register("AWS::EC2::Instance", Placement::TagByKey(NAME_TAG_KEY.to_string()));
        registry
    }

    /// Register (or replace) the placement for a type.
    pub fn register(&mut self, resource_type: impl Into<String>, placement: Placement) {
        self.placements.insert(resource_type.into(), placement);
    }

    /// Register every configured strategy, replacing built-ins of the same type.
    pub fn extend_from_specs<'a>(
        &mut self,
        specs: impl IntoIterator<Item = (&'a String, &'a StrategySpec)>,
    ) -> Result<(), ResnamesError> {
        for (resource_type, spec) in specs {
            let placement = Placement::try_from(spec).map_err(|e| {
                ResnamesError::config(format!("strategy for {resource_type}: {e}"))
            })?;
            self.register(resource_type.clone(), placement);
        }
        Ok(())
    }

    /// Placement for a type, if registered.
    #[must_use]
    pub fn get(&self, resource_type: &str) -> Option<&Placement> {
        self.placements.get(resource_type)
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.placements.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }
}
