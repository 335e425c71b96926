//! Declarative option schemas
//!
//! A [`Schema`] lists the options an operation accepts, in declaration order,
//! together with their accepted [`ValueKind`]s, defaults, predicates and the
//! required flag. [`Schema::compile`] resolves every entry into a canonical
//! field once; the resulting [`Validator`] is immutable and can be applied
//! to any number of [`Options`] bags from any thread.
//!
//! ```
//! use jwtpolicy::schema::{FieldDef, Schema};
//! use jwtpolicy::{Options, ValueKind};
//!
//! let validator = Schema::new()
//!     .field("issuer", ValueKind::String)
//!     .field("maxAge", vec![ValueKind::Number, ValueKind::String])
//!     .field("tolerance", FieldDef::new([ValueKind::Number]).default_value(0))
//!     .field("strict", ValueKind::Boolean)
//!     .compile()?;
//!
//! let record = validator.apply(&Options::new().with("issuer", "me"))?;
//! assert_eq!(record.get_str("issuer"), Some("me"));
//! assert_eq!(record.get_f64("tolerance"), Some(0.0));
//! assert_eq!(record.get_bool("strict"), Some(false));
//! assert!(!record.contains("maxAge"));
//! # Ok::<(), jwtpolicy::Error>(())
//! ```

use crate::error::{Error, Result};
use crate::options::{Options, Value, ValueKind};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::trace;

/// Predicate evaluated against a present option value
#[allow(clippy::type_complexity)]
pub type Predicate = Arc<dyn Fn(&Value) -> bool + Send + Sync + 'static>;

/// Zero-argument producer of a fresh default value
pub type Generator = Arc<dyn Fn() -> Value + Send + Sync + 'static>;

/// Default for an option that the caller left out
#[derive(Clone)]
pub enum DefaultValue {
    /// Scalar literal (string, number or boolean)
    Literal(Value),
    /// Invoked on every application
    Generated(Generator),
}

impl DefaultValue {
    fn resolve(&self) -> Value {
        match self {
            DefaultValue::Literal(value) => value.clone(),
            DefaultValue::Generated(generate) => generate(),
        }
    }
}

/// Full field definition
#[derive(Clone, Default)]
pub struct FieldDef {
    types: Vec<ValueKind>,
    default: Option<DefaultValue>,
    validator: Option<Predicate>,
    required: bool,
}

impl FieldDef {
    /// Create a definition accepting the given kinds
    pub fn new(types: impl Into<Vec<ValueKind>>) -> Self {
        Self {
            types: types.into(),
            ..Self::default()
        }
    }

    /// Scalar default used when the option is omitted
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::Literal(value.into()));
        self
    }

    /// Default produced by `generator` each time the option is omitted
    pub fn default_with<F>(mut self, generator: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.default = Some(DefaultValue::Generated(Arc::new(generator)));
        self
    }

    /// Custom predicate; a `false` result rejects the option
    pub fn validator<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(predicate));
        self
    }

    /// Fail when the option is omitted and has no default
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// A schema entry as written by the schema author
pub enum FieldSpec {
    /// A single accepted kind, no default
    Shorthand(ValueKind),
    /// Several accepted kinds, no default
    ShorthandUnion(Vec<ValueKind>),
    /// Everything spelled out
    Full(FieldDef),
}

impl From<ValueKind> for FieldSpec {
    fn from(kind: ValueKind) -> Self {
        FieldSpec::Shorthand(kind)
    }
}

impl From<Vec<ValueKind>> for FieldSpec {
    fn from(kinds: Vec<ValueKind>) -> Self {
        FieldSpec::ShorthandUnion(kinds)
    }
}

impl From<FieldDef> for FieldSpec {
    fn from(def: FieldDef) -> Self {
        FieldSpec::Full(def)
    }
}

impl From<FieldSpec> for FieldDef {
    fn from(spec: FieldSpec) -> Self {
        match spec {
            FieldSpec::Shorthand(kind) => FieldDef::new([kind]),
            FieldSpec::ShorthandUnion(kinds) => FieldDef::new(kinds),
            FieldSpec::Full(def) => def,
        }
    }
}

/// Ordered list of option fields, not yet checked
#[derive(Default)]
pub struct Schema {
    fields: Vec<(String, FieldSpec)>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the next field
    pub fn field(mut self, name: impl Into<String>, spec: impl Into<FieldSpec>) -> Self {
        self.fields.push((name.into(), spec.into()));
        self
    }

    /// Resolve every entry into its canonical form
    ///
    /// Fails with [`Error::SchemaDefinition`] when a field is declared twice,
    /// accepts no kinds, or has a literal default that is composite or not
    /// one of its accepted kinds.
    pub fn compile(self) -> Result<Validator> {
        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(self.fields.len());

        for (name, spec) in self.fields {
            if !seen.insert(name.clone()) {
                return Err(definition_error(&name, "declared more than once"));
            }
            fields.push(CompiledField::compile(name, spec.into())?);
        }

        Ok(Validator { fields })
    }
}

fn definition_error(field: &str, reason: impl Into<String>) -> Error {
    Error::SchemaDefinition {
        field: field.to_string(),
        reason: reason.into(),
    }
}

#[derive(Clone)]
struct CompiledField {
    name: String,
    types: Vec<ValueKind>,
    default: Option<DefaultValue>,
    validator: Option<Predicate>,
    required: bool,
}

impl CompiledField {
    fn compile(name: String, def: FieldDef) -> Result<Self> {
        let FieldDef {
            types,
            mut default,
            validator,
            required,
        } = def;

        if types.is_empty() {
            return Err(definition_error(&name, "no accepted types"));
        }

        if let Some(DefaultValue::Literal(value)) = &default {
            let kind = value.kind();
            if kind.is_composite() {
                return Err(definition_error(
                    &name,
                    format!("{kind} defaults must be produced by a generator"),
                ));
            }
            if !types.contains(&kind) {
                return Err(definition_error(
                    &name,
                    format!("default of kind {kind} is not an accepted type"),
                ));
            }
        }

        // omitting a pure boolean switch means "off"
        if default.is_none() && types == [ValueKind::Boolean] {
            default = Some(DefaultValue::Literal(Value::Boolean(false)));
        }

        Ok(Self {
            name,
            types,
            default,
            validator,
            required,
        })
    }

    fn accepts(&self, value: &Value) -> bool {
        self.types.contains(&value.kind())
    }
}

/// Compiled schema
#[derive(Clone)]
pub struct Validator {
    fields: Vec<CompiledField>,
}

impl Validator {
    /// Check and default `input`, failing on the first violation
    ///
    /// Fields are visited in declaration order. Options not named by the
    /// schema are ignored.
    pub fn apply(&self, input: &Options) -> Result<OptionsRecord> {
        let mut values = BTreeMap::new();

        for field in &self.fields {
            let value = match input.get(&field.name) {
                Some(value) => value.clone(),
                None => match &field.default {
                    Some(default) => {
                        trace!(option = %field.name, "applying default");
                        default.resolve()
                    }
                    None if field.required => {
                        return Err(Error::SchemaRequired(field.name.clone()));
                    }
                    None => continue,
                },
            };

            if !field.accepts(&value) {
                return Err(Error::SchemaType(field.name.clone()));
            }

            if let Some(predicate) = &field.validator {
                if !predicate(&value) {
                    return Err(Error::SchemaValidation(field.name.clone()));
                }
            }

            values.insert(field.name.clone(), value);
        }

        Ok(OptionsRecord { values })
    }

    /// Field names in declaration order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.fields.iter().map(|field| (&field.name, &field.types)))
            .finish()
    }
}

/// Validated, defaulted options for one call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionsRecord {
    values: BTreeMap<String, Value>,
}

impl OptionsRecord {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_f64)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    pub fn get_string_list(&self, name: &str) -> Option<&[String]> {
        self.get(name).and_then(Value::as_string_list)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_shorthand_fields_are_optional() {
        let validator = Schema::new()
            .field("issuer", ValueKind::String)
            .field("audience", vec![ValueKind::String, ValueKind::StringList])
            .compile()
            .unwrap();

        let record = validator.apply(&Options::new()).unwrap();
        assert!(record.is_empty());

        let record = validator
            .apply(&Options::new().with("audience", vec!["a", "b"]))
            .unwrap();
        assert_eq!(
            record.get_string_list("audience"),
            Some(&["a".to_string(), "b".to_string()][..])
        );
    }

    #[test]
    fn test_type_mismatch() {
        let validator = Schema::new()
            .field("issuer", ValueKind::String)
            .compile()
            .unwrap();

        let result = validator.apply(&Options::new().with("issuer", 42));
        assert_eq!(result, Err(Error::SchemaType("issuer".into())));
    }

    #[test]
    fn test_unknown_options_are_ignored() {
        let validator = Schema::new()
            .field("issuer", ValueKind::String)
            .compile()
            .unwrap();

        let record = validator
            .apply(&Options::new().with("issuer", "me").with("other", true))
            .unwrap();
        assert_eq!(record.len(), 1);
        assert!(!record.contains("other"));
    }

    #[test]
    fn test_literal_default() {
        let validator = Schema::new()
            .field(
                "algorithm",
                FieldDef::new([ValueKind::String]).default_value("HS256"),
            )
            .compile()
            .unwrap();

        let record = validator.apply(&Options::new()).unwrap();
        assert_eq!(record.get_str("algorithm"), Some("HS256"));

        let record = validator
            .apply(&Options::new().with("algorithm", "HS512"))
            .unwrap();
        assert_eq!(record.get_str("algorithm"), Some("HS512"));
    }

    #[test]
    fn test_generator_invoked_per_call() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let validator = Schema::new()
            .field(
                "scopes",
                FieldDef::new([ValueKind::StringList]).default_with(move || {
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    Value::StringList(vec![format!("scope-{n}")])
                }),
            )
            .compile()
            .unwrap();

        let first = validator.apply(&Options::new()).unwrap();
        let second = validator.apply(&Options::new()).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(
            first.get("scopes"),
            Some(&Value::from(vec!["scope-0"]))
        );
        assert_eq!(
            second.get("scopes"),
            Some(&Value::from(vec!["scope-1"]))
        );

        // Supplied values never call the generator
        validator
            .apply(&Options::new().with("scopes", vec!["x"]))
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_generated_default_is_type_checked() {
        let validator = Schema::new()
            .field(
                "clock",
                FieldDef::new([ValueKind::Number]).default_with(|| Value::from("now")),
            )
            .compile()
            .unwrap();

        assert_eq!(
            validator.apply(&Options::new()),
            Err(Error::SchemaType("clock".into()))
        );
    }

    #[test]
    fn test_boolean_defaults_to_false() {
        let validator = Schema::new()
            .field("ignoreExpire", ValueKind::Boolean)
            .field(
                "timestamp",
                FieldDef::new([ValueKind::Boolean]).default_value(true),
            )
            .field("mixed", vec![ValueKind::Boolean, ValueKind::String])
            .compile()
            .unwrap();

        let record = validator.apply(&Options::new()).unwrap();
        assert_eq!(record.get_bool("ignoreExpire"), Some(false));
        assert_eq!(record.get_bool("timestamp"), Some(true));
        assert!(!record.contains("mixed"));
    }

    #[test]
    fn test_required() {
        let validator = Schema::new()
            .field("subject", FieldDef::new([ValueKind::String]).required())
            .field(
                "algorithm",
                FieldDef::new([ValueKind::String])
                    .default_value("HS256")
                    .required(),
            )
            .compile()
            .unwrap();

        assert_eq!(
            validator.apply(&Options::new()),
            Err(Error::SchemaRequired("subject".into()))
        );

        let record = validator
            .apply(&Options::new().with("subject", "user"))
            .unwrap();
        assert_eq!(record.get_str("algorithm"), Some("HS256"));
    }

    #[test]
    fn test_predicate() {
        let validator = Schema::new()
            .field(
                "nonce",
                FieldDef::new([ValueKind::String])
                    .validator(|v| v.as_str().is_some_and(|s| !s.trim().is_empty())),
            )
            .compile()
            .unwrap();

        assert!(validator.apply(&Options::new()).is_ok());
        assert!(validator.apply(&Options::new().with("nonce", "abc")).is_ok());
        assert_eq!(
            validator.apply(&Options::new().with("nonce", "   ")),
            Err(Error::SchemaValidation("nonce".into()))
        );
    }

    #[test]
    fn test_type_checked_before_predicate() {
        let validator = Schema::new()
            .field(
                "nonce",
                FieldDef::new([ValueKind::String]).validator(|_| false),
            )
            .compile()
            .unwrap();

        assert_eq!(
            validator.apply(&Options::new().with("nonce", 1)),
            Err(Error::SchemaType("nonce".into()))
        );
    }

    #[test]
    fn test_first_violation_in_declaration_order() {
        let validator = Schema::new()
            .field("b", ValueKind::String)
            .field("a", ValueKind::Number)
            .compile()
            .unwrap();

        let result = validator.apply(&Options::new().with("a", "x").with("b", 1));
        assert_eq!(result, Err(Error::SchemaType("b".into())));

        let names: Vec<_> = validator.field_names().collect();
        assert_eq!(names, ["b", "a"]);
    }

    #[test]
    fn test_invalid_schemas_rejected_at_compile() {
        let empty = Schema::new().field("x", Vec::<ValueKind>::new()).compile();
        assert!(matches!(empty, Err(Error::SchemaDefinition { field, .. }) if field == "x"));

        let composite = Schema::new()
            .field(
                "audience",
                FieldDef::new([ValueKind::StringList]).default_value(vec!["a"]),
            )
            .compile();
        assert!(matches!(composite, Err(Error::SchemaDefinition { .. })));

        let wrong_kind = Schema::new()
            .field("maxAge", FieldDef::new([ValueKind::Number]).default_value("1h"))
            .compile();
        assert!(matches!(wrong_kind, Err(Error::SchemaDefinition { .. })));

        let duplicate = Schema::new()
            .field("issuer", ValueKind::String)
            .field("issuer", ValueKind::StringList)
            .compile();
        assert!(matches!(
            duplicate,
            Err(Error::SchemaDefinition { field, .. }) if field == "issuer"
        ));
    }

    #[test]
    fn test_validator_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Validator>();
        assert_send_sync::<OptionsRecord>();
    }
}
