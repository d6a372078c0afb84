//! Property trees and lens resolution
//!
//! A manifest's `properties` sections are schema-free: any job may carry any
//! nesting of mappings, sequences and scalars. This module keeps them as a
//! tagged [`Value`] tree and resolves dotted paths ("lenses") such as
//! `mysql.port` or `cf.uaa.clients.admin.secret` against it.
//!
//! # Lens semantics
//!
//! - A lens is split on `.`; each segment is a mapping key.
//! - Every segment but the last must name a nested mapping. Descending into
//!   anything else is a [`ManifestError::TypeMismatch`], which is fatal: the
//!   caller's idea of the manifest shape is wrong.
//! - A missing key at any depth is a recoverable
//!   [`ManifestError::PropertyNotFound`].
//! - Typed accessors report a recoverable [`ManifestError::WrongType`] when the
//!   value exists but has another type. Nothing is coerced.

use serde::de::{self, Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use super::error::{ManifestError, Result};

/// A dynamically-typed manifest value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Tree(Properties),
    Sequence(Vec<Value>),
}

/// The runtime type of a [`Value`], used in error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    Float,
    String,
    Tree,
    Sequence,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Null => write!(f, "null"),
            ValueKind::Bool => write!(f, "a boolean"),
            ValueKind::Int => write!(f, "an integer"),
            ValueKind::Float => write!(f, "a float"),
            ValueKind::String => write!(f, "a string"),
            ValueKind::Tree => write!(f, "a mapping"),
            ValueKind::Sequence => write!(f, "a sequence"),
        }
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::String(_) => ValueKind::String,
            Value::Tree(_) => ValueKind::Tree,
            Value::Sequence(_) => ValueKind::Sequence,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_tree(&self) -> Option<&Properties> {
        match self {
            Value::Tree(tree) => Some(tree),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// A mapping from string keys to [`Value`]s
///
/// Keys are kept sorted, so iteration and display are deterministic no matter
/// how the source document ordered them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties(BTreeMap<String, Value>);

impl Properties {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builder-style insert, used when constructing trees by hand
    pub fn with<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Parse a YAML (or JSON) mapping into a property tree
    ///
    /// An empty or null document yields an empty tree.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Direct key lookup, without lens splitting
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Resolve a dotted lens to a value
    pub fn find(&self, lens: &str) -> Result<&Value> {
        self.find_from(lens, lens)
    }

    fn find_from<'a>(&'a self, lens: &str, remaining: &str) -> Result<&'a Value> {
        let not_found = || ManifestError::PropertyNotFound {
            lens: lens.to_string(),
        };

        match remaining.split_once('.') {
            None => self.0.get(remaining).ok_or_else(not_found),
            Some((segment, rest)) => match self.0.get(segment) {
                None => Err(not_found()),
                Some(Value::Tree(next)) => next.find_from(lens, rest),
                Some(other) => Err(ManifestError::TypeMismatch {
                    lens: lens.to_string(),
                    segment: segment.to_string(),
                    actual: other.kind(),
                }),
            },
        }
    }

    pub fn find_string(&self, lens: &str) -> Result<&str> {
        match self.find(lens)? {
            Value::String(s) => Ok(s),
            other => Err(wrong_type(lens, ValueKind::String, other)),
        }
    }

    pub fn find_int(&self, lens: &str) -> Result<i64> {
        match self.find(lens)? {
            Value::Int(i) => Ok(*i),
            other => Err(wrong_type(lens, ValueKind::Int, other)),
        }
    }

    pub fn find_bool(&self, lens: &str) -> Result<bool> {
        match self.find(lens)? {
            Value::Bool(b) => Ok(*b),
            other => Err(wrong_type(lens, ValueKind::Bool, other)),
        }
    }

    pub fn find_tree(&self, lens: &str) -> Result<&Properties> {
        match self.find(lens)? {
            Value::Tree(tree) => Ok(tree),
            other => Err(wrong_type(lens, ValueKind::Tree, other)),
        }
    }

    pub fn find_sequence(&self, lens: &str) -> Result<&[Value]> {
        match self.find(lens)? {
            Value::Sequence(items) => Ok(items),
            other => Err(wrong_type(lens, ValueKind::Sequence, other)),
        }
    }

    /// Whether a value exists at `lens`
    ///
    /// Absence is `Ok(false)`; a structural mismatch is still an error.
    pub fn contains(&self, lens: &str) -> Result<bool> {
        match self.find(lens) {
            Ok(_) => Ok(true),
            Err(ManifestError::PropertyNotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

fn wrong_type(lens: &str, expected: ValueKind, actual: &Value) -> ManifestError {
    ManifestError::WrongType {
        lens: lens.to_string(),
        expected,
        actual: actual.kind(),
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Properties> for Value {
    fn from(tree: Properties) -> Self {
        Value::Tree(tree)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Sequence(items.into_iter().map(Into::into).collect())
    }
}

impl TryFrom<serde_yaml::Value> for Value {
    type Error = ManifestError;

    fn try_from(raw: serde_yaml::Value) -> Result<Self> {
        let value = match raw {
            serde_yaml::Value::Null => Value::Null,
            serde_yaml::Value::Bool(b) => Value::Bool(b),
            serde_yaml::Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => Value::Int(i),
                (None, Some(f)) => Value::Float(f),
                (None, None) => {
                    return Err(ManifestError::invalid_document(format!(
                        "unrepresentable number {}",
                        n
                    )));
                }
            },
            serde_yaml::Value::String(s) => Value::String(s),
            serde_yaml::Value::Sequence(items) => Value::Sequence(
                items
                    .into_iter()
                    .map(Value::try_from)
                    .collect::<Result<Vec<_>>>()?,
            ),
            serde_yaml::Value::Mapping(mapping) => Value::Tree(Properties::try_from(mapping)?),
            serde_yaml::Value::Tagged(tagged) => Value::try_from(tagged.value)?,
        };
        Ok(value)
    }
}

impl TryFrom<serde_yaml::Mapping> for Properties {
    type Error = ManifestError;

    fn try_from(mapping: serde_yaml::Mapping) -> Result<Self> {
        let mut entries = BTreeMap::new();
        for (key, value) in mapping {
            let key = mapping_key(key)?;
            let value = Value::try_from(value)?;
            if entries.insert(key.clone(), value).is_some() {
                return Err(ManifestError::invalid_document(format!(
                    "duplicate property key '{}'",
                    key
                )));
            }
        }
        Ok(Self(entries))
    }
}

/// Scalar keys are addressed by their text, so `80: x` is reachable as lens `80`
fn mapping_key(key: serde_yaml::Value) -> Result<String> {
    match key {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Tagged(tagged) => mapping_key(tagged.value),
        other => Err(ManifestError::invalid_document(format!(
            "unsupported mapping key {:?}",
            other
        ))),
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = serde_yaml::Value::deserialize(deserializer)?;
        Value::try_from(raw).map_err(de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for Properties {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Tree(tree) => Ok(tree),
            Value::Null => Ok(Properties::new()),
            other => Err(de::Error::custom(format!(
                "expected a mapping of properties, found {}",
                other.kind()
            ))),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Tree(tree) => tree.serialize(serializer),
            Value::Sequence(items) => serializer.collect_seq(items),
        }
    }
}

impl Serialize for Properties {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(&self.0)
    }
}

impl fmt::Display for Value {
    /// Scalars print bare; mappings and sequences print as YAML
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => write!(f, "{}", s),
            Value::Tree(_) | Value::Sequence(_) => {
                let yaml = serde_yaml::to_string(self).map_err(|_| fmt::Error)?;
                write!(f, "{}", yaml.trim_end())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_scalars_keep_their_type() {
        let props = Properties::from_yaml(
            r#"
port: 3306
enabled: true
name: mysql
ratio: 0.5
nothing: ~
"#,
        )
        .unwrap();

        assert_eq!(props.get("port"), Some(&Value::Int(3306)));
        assert_eq!(props.get("enabled"), Some(&Value::Bool(true)));
        assert_eq!(props.get("name"), Some(&Value::String("mysql".to_string())));
        assert_eq!(props.get("ratio"), Some(&Value::Float(0.5)));
        assert_eq!(props.get("nothing"), Some(&Value::Null));
    }

    #[test]
    fn test_non_string_keys_become_text() {
        let props = Properties::from_yaml("ports:\n  80: http\n  443: https\n").unwrap();
        assert_eq!(props.find_string("ports.443").unwrap(), "https");
    }

    #[test]
    fn test_colliding_keys_are_rejected() {
        let result = Properties::from_yaml("80: a\n\"80\": b\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_null_document_is_empty_tree() {
        assert!(Properties::from_yaml("~").unwrap().is_empty());
    }

    #[test]
    fn test_scalar_document_is_not_a_tree() {
        assert!(Properties::from_yaml("just a string").is_err());
    }

    #[test]
    fn test_tags_are_stripped() {
        let props = Properties::from_yaml("secret: !vault s3cr3t\n").unwrap();
        assert_eq!(props.find_string("secret").unwrap(), "s3cr3t");
    }

    #[test]
    fn test_builder_and_iterator_construction_agree() {
        let built = Properties::new().with("a", 1).with("b", "two");
        let collected: Properties = vec![("b", Value::from("two")), ("a", Value::from(1))]
            .into_iter()
            .collect();
        assert_eq!(built, collected);
        assert_eq!(built.keys().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::from("x").to_string(), "x");
        assert_eq!(Value::from(31).to_string(), "31");
        assert_eq!(Value::from(vec!["foo", "bar"]).to_string(), "- foo\n- bar");
        let tree = Value::from(Properties::new().with("port", 3306));
        assert_eq!(tree.to_string(), "port: 3306");
    }
}
