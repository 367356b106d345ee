//! Deferred expressions and environment values.
//!
//! Some environment values cannot be known until deploy time (a queue URL, a topic
//! ARN). They are carried as [`Expr`] values and only turned into the template's
//! intrinsic-function shape (`Ref`, `Fn::GetAtt`, `Fn::Join`) when serialized.

use serde::{Serialize, Serializer};
use serde_json::{Map, Number, Value, json};

const REF: &str = "Ref";
const GET_ATT: &str = "Fn::GetAtt";
const JOIN: &str = "Fn::Join";

/// A value that is resolved by the deployment engine, not by resnames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// A plain string part, only meaningful inside a [`Expr::Join`].
    Literal(String),
    /// Join the parts with `delimiter`.
    Join {
        /// Delimiter placed between parts
        delimiter: String,
        /// Parts in order
        parts: Vec<Expr>,
    },
    /// A runtime attribute of a resource.
    GetAtt {
        /// Logical id of the resource
        logical_id: String,
        /// Attribute name, e.g. `Arn`
        attribute: String,
    },
    /// The default reference value of a resource or pseudo parameter.
    Ref(String),
}

impl Expr {
    /// `Ref` to a logical id or pseudo parameter.
    pub fn reference(target: impl Into<String>) -> Self {
        Self::Ref(target.into())
    }

    /// `Fn::GetAtt` of a logical id.
    pub fn get_att(logical_id: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::GetAtt {
            logical_id: logical_id.into(),
            attribute: attribute.into(),
        }
    }

    /// `Fn::Join` of the given parts.
    pub fn join(delimiter: impl Into<String>, parts: Vec<Expr>) -> Self {
        Self::Join {
            delimiter: delimiter.into(),
            parts,
        }
    }

    /// ARN of an SNS topic in the deploying account and region.
    ///
    /// ```rust
    /// use resnames_cli::naming::Expr;
    ///
    /// let arn = Expr::sns_topic_arn("svc-orders-dev");
    /// assert_eq!(
    ///     arn.to_json(),
    ///     serde_json::json!({"Fn::Join": [":", [
    ///         "arn", "aws", "sns",
    ///         {"Ref": "AWS::Region"}, {"Ref": "AWS::AccountId"},
    ///         "svc-orders-dev"
    ///     ]]})
    /// );
    /// ```
    pub fn sns_topic_arn(topic_name: &str) -> Self {
        Self::join(
            ":",
            vec![
                Self::Literal("arn".to_string()),
                Self::Literal("aws".to_string()),
                Self::Literal("sns".to_string()),
                Self::reference("AWS::Region"),
                Self::reference("AWS::AccountId"),
                Self::Literal(topic_name.to_string()),
            ],
        )
    }

    /// Render in the template's intrinsic-function shape.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Literal(s) => Value::String(s.clone()),
            Self::Join { delimiter, parts } => {
                let parts: Vec<Value> = parts.iter().map(Self::to_json).collect();
                json!({ JOIN: [delimiter, parts] })
            }
            Self::GetAtt { logical_id, attribute } => json!({ GET_ATT: [logical_id, attribute] }),
            Self::Ref(target) => json!({ REF: target }),
        }
    }

    /// Recognize the intrinsic-function shapes produced by [`Expr::to_json`].
    ///
    /// Anything else (including other intrinsics) returns `None`.
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::Literal(s.clone())),
            Value::Object(map) if map.len() == 1 => {
                let (key, inner) = map.iter().next()?;
                match key.as_str() {
                    REF => inner.as_str().map(Self::reference),
                    GET_ATT => match inner.as_array()?.as_slice() {
                        [Value::String(id), Value::String(attr)] => Some(Self::get_att(id, attr)),
                        _ => None,
                    },
                    JOIN => match inner.as_array()?.as_slice() {
                        [Value::String(delimiter), Value::Array(parts)] => {
                            let parts = parts.iter().map(Self::from_json).collect::<Option<Vec<_>>>()?;
                            Some(Self::join(delimiter, parts))
                        }
                        _ => None,
                    },
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

impl Serialize for Expr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// A value in the environment map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvValue {
    /// A literal string, e.g. a physical name
    String(String),
    /// A number from the base environment
    Number(Number),
    /// A boolean from the base environment
    Bool(bool),
    /// A deploy-time expression
    Deferred(Expr),
    /// Any other structured value from the base environment
    Structured(Value),
}

impl EnvValue {
    /// Classify a JSON value from a service definition.
    #[must_use]
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::String(s) => Self::String(s),
            Value::Number(n) => Self::Number(n),
            Value::Bool(b) => Self::Bool(b),
            other => match Expr::from_json(&other) {
                Some(expr) => Self::Deferred(expr),
                None => Self::Structured(other),
            },
        }
    }

    /// Convert back into the service definition's JSON shape.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::String(s) => Value::String(s.clone()),
            Self::Number(n) => Value::Number(n.clone()),
            Self::Bool(b) => Value::Bool(*b),
            Self::Deferred(expr) => expr.to_json(),
            Self::Structured(value) => value.clone(),
        }
    }

    /// Render the right-hand side of a `KEY=value` line.
    ///
    /// Strings are wrapped in double quotes as-is, numbers and booleans are bare, and
    /// structured values are JSON-encoded twice so they print as one escaped literal.
    pub fn to_shell_value(&self) -> Result<String, serde_json::Error> {
        Ok(match self {
            Self::String(s) => format!("\"{s}\""),
            Self::Number(n) => n.to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Deferred(_) | Self::Structured(_) => {
                let once = serde_json::to_string(&self.to_json())?;
                serde_json::to_string(&once)?
            }
        })
    }
}

impl From<&str> for EnvValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<Expr> for EnvValue {
    fn from(value: Expr) -> Self {
        Self::Deferred(value)
    }
}

/// Ordered environment map.
///
/// Re-inserting an existing key replaces its value but keeps its original position,
/// which is how an object spread of a base environment and computed names behaves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentMap {
    entries: Vec<(String, EnvValue)>,
}

impl EnvironmentMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON mapping, classifying every value.
    #[must_use]
    pub fn from_json_map(map: &Map<String, Value>) -> Self {
        let mut env = Self::new();
        for (key, value) in map {
            env.insert(key.clone(), EnvValue::from_json(value.clone()));
        }
        env
    }

    /// Insert or replace a value, returning the previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<EnvValue>) -> Option<EnvValue> {
        let key = key.into();
        let value = value.into();
        if let Some((_, slot)) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            return Some(std::mem::replace(slot, value));
        }
        self.entries.push((key, value));
        None
    }

    /// Look up a value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&EnvValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Whether the key is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &EnvValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Layer `other` on top of `self`; `other` wins on collisions.
    pub fn extend(&mut self, other: &EnvironmentMap) {
        for (key, value) in other.iter() {
            self.insert(key, value.clone());
        }
    }

    /// Merge into a JSON mapping in place; computed values win on collisions.
    pub fn merge_into(&self, target: &mut Map<String, Value>) {
        for (key, value) in self.iter() {
            target.insert(key.to_string(), value.to_json());
        }
    }

    /// Convert to a JSON mapping.
    #[must_use]
    pub fn to_json_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        self.merge_into(&mut map);
        map
    }
}

impl Serialize for EnvironmentMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json_map().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expr_shapes() {
        assert_eq!(Expr::reference("MyQueue").to_json(), json!({"Ref": "MyQueue"}));
        assert_eq!(
            Expr::get_att("MyQueue", "Arn").to_json(),
            json!({"Fn::GetAtt": ["MyQueue", "Arn"]})
        );
    }

    #[test]
    fn test_expr_from_json_inverts_to_json() {
        let arn = Expr::sns_topic_arn("svc-order-topic-dev");
        assert_eq!(Expr::from_json(&arn.to_json()), Some(arn));

        let unknown = json!({"Fn::Sub": "${AWS::StackName}"});
        assert_eq!(Expr::from_json(&unknown), None);
    }

    #[test]
    fn test_env_value_classification() {
        assert_eq!(EnvValue::from_json(json!("x")), EnvValue::String("x".into()));
        assert_eq!(EnvValue::from_json(json!(true)), EnvValue::Bool(true));
        assert!(matches!(EnvValue::from_json(json!({"Ref": "A"})), EnvValue::Deferred(_)));
        assert!(matches!(EnvValue::from_json(json!({"Fn::Sub": "x"})), EnvValue::Structured(_)));
        assert!(matches!(EnvValue::from_json(Value::Null), EnvValue::Structured(Value::Null)));
    }

    #[test]
    fn test_shell_rendering() {
        assert_eq!(EnvValue::from("svc-users-dev").to_shell_value().unwrap(), "\"svc-users-dev\"");
        assert_eq!(EnvValue::from_json(json!(42)).to_shell_value().unwrap(), "42");
        assert_eq!(EnvValue::Bool(false).to_shell_value().unwrap(), "false");
        assert_eq!(
            EnvValue::from(Expr::reference("MyQueue")).to_shell_value().unwrap(),
            r#""{\"Ref\":\"MyQueue\"}""#
        );
    }

    #[test]
    fn test_environment_map_keeps_first_position_on_replace() {
        let mut env = EnvironmentMap::new();
        env.insert("A", "1");
        env.insert("B", "2");
        let previous = env.insert("A", "3");

        assert_eq!(previous, Some(EnvValue::from("1")));
        assert_eq!(env.keys().collect::<Vec<_>>(), vec!["A", "B"]);
        assert_eq!(env.get("A"), Some(&EnvValue::from("3")));
    }

    #[test]
    fn test_merge_into_json_computed_wins() {
        let mut base = Map::new();
        base.insert("LOG_LEVEL".into(), json!("debug"));
        base.insert("USER_TABLE".into(), json!("override-me"));

        let mut computed = EnvironmentMap::new();
        computed.insert("USER_TABLE", "svc-user-table-dev");
        computed.merge_into(&mut base);

        assert_eq!(base["LOG_LEVEL"], json!("debug"));
        assert_eq!(base["USER_TABLE"], json!("svc-user-table-dev"));
        assert_eq!(base.keys().collect::<Vec<_>>(), vec!["LOG_LEVEL", "USER_TABLE"]);
    }
}
