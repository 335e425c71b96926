//! Caller-supplied options and their value kinds
//!
//! Options are a string-keyed bag of typed [`Value`]s. They are checked and
//! defaulted by a compiled [`Schema`](crate::schema::Schema) before a token
//! is issued or verified, so a bag may be built in code or loaded from a JSON
//! configuration document.

use crate::error::{Error, Result};
use regex::Regex;
use std::collections::BTreeMap;

/// Semantic kind of an option value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    String,
    Number,
    Boolean,
    StringList,
    Pattern,
    PatternList,
    Bytes,
}

impl ValueKind {
    /// Convert to string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::Number => "number",
            ValueKind::Boolean => "boolean",
            ValueKind::StringList => "string list",
            ValueKind::Pattern => "pattern",
            ValueKind::PatternList => "pattern list",
            ValueKind::Bytes => "bytes",
        }
    }

    /// Lists, patterns and byte buffers are composite.
    ///
    /// A schema may only default a composite field through a generator.
    pub const fn is_composite(&self) -> bool {
        !matches!(
            self,
            ValueKind::String | ValueKind::Number | ValueKind::Boolean
        )
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single option value
#[derive(Debug, Clone)]
pub enum Value {
    String(String),
    Number(f64),
    Boolean(bool),
    StringList(Vec<String>),
    Pattern(Regex),
    PatternList(Vec<Regex>),
    Bytes(Vec<u8>),
}

impl Value {
    /// Kind of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::String(_) => ValueKind::String,
            Value::Number(_) => ValueKind::Number,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::StringList(_) => ValueKind::StringList,
            Value::Pattern(_) => ValueKind::Pattern,
            Value::PatternList(_) => ValueKind::PatternList,
            Value::Bytes(_) => ValueKind::Bytes,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_string_list(&self) -> Option<&[String]> {
        match self {
            Value::StringList(list) => Some(list),
            _ => None,
        }
    }
}

// Patterns compare by source text
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::StringList(a), Value::StringList(b)) => a == b,
            (Value::Pattern(a), Value::Pattern(b)) => a.as_str() == b.as_str(),
            (Value::PatternList(a), Value::PatternList(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.as_str() == y.as_str())
            }
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(f64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value as f64)
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::Number(value as f64)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<Vec<String>> for Value {
    fn from(value: Vec<String>) -> Self {
        Value::StringList(value)
    }
}

impl From<Vec<&str>> for Value {
    fn from(value: Vec<&str>) -> Self {
        Value::StringList(value.into_iter().map(String::from).collect())
    }
}

impl From<Regex> for Value {
    fn from(value: Regex) -> Self {
        Value::Pattern(value)
    }
}

impl From<Vec<Regex>> for Value {
    fn from(value: Vec<Regex>) -> Self {
        Value::PatternList(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

/// Input bag of options for signing or verification
///
/// # Example
///
/// ```
/// use jwtpolicy::Options;
///
/// let options = Options::new()
///     .with("audience", "my-api")
///     .with("expiresIn", "1h");
/// assert_eq!(options.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Options {
    entries: BTreeMap<String, Value>,
}

impl Options {
    /// Create an empty option bag
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an option, consuming and returning the bag
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Add or replace an option in place
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load options from a JSON object
    ///
    /// Strings, numbers, booleans and arrays of strings map to the matching
    /// [`ValueKind`]. `null` entries are skipped as if they were absent.
    /// Patterns and byte buffers cannot be expressed in JSON.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| Error::InvalidOption {
            option: "<root>".into(),
            reason: "expected a JSON object".into(),
        })?;

        let mut options = Self::new();
        for (key, entry) in object {
            if let Some(value) = json_to_value(key, entry)? {
                options.entries.insert(key.clone(), value);
            }
        }

        Ok(options)
    }

    /// Parse a JSON document into options
    pub fn from_json_str(input: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(input).map_err(|e| {
            Error::InvalidOption {
                option: "<root>".into(),
                reason: format!("invalid JSON: {e}"),
            }
        })?;
        Self::from_json(&value)
    }
}

fn json_to_value(key: &str, entry: &serde_json::Value) -> Result<Option<Value>> {
    use serde_json::Value as Json;

    let invalid = |reason: &str| Error::InvalidOption {
        option: key.to_string(),
        reason: reason.to_string(),
    };

    match entry {
        Json::Null => Ok(None),
        Json::Bool(b) => Ok(Some(Value::Boolean(*b))),
        Json::Number(n) => n
            .as_f64()
            .map(|n| Some(Value::Number(n)))
            .ok_or_else(|| invalid("number out of range")),
        Json::String(s) => Ok(Some(Value::String(s.clone()))),
        Json::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(String::from))
            .collect::<Option<Vec<_>>>()
            .map(|list| Some(Value::StringList(list)))
            .ok_or_else(|| invalid("arrays may only contain strings")),
        Json::Object(_) => Err(invalid("nested objects are not supported")),
    }
}
