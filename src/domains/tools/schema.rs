//! Declarative parameter schemas for tools.
//!
//! Every tool declares the shape of its input as a [`ParamSchema`]: a list of
//! [`Field`]s, each with a primitive kind, an optional/required flag and a set
//! of refinement [`Constraint`]s. The schema is used twice:
//!
//! - rendered as JSON Schema for the MCP `tools/list` response
//! - run against the raw, untyped arguments of every `tools/call` before the
//!   handler sees them
//!
//! Validation collects every violation instead of stopping at the first one,
//! and its only output is either a [`ValidatedParams`] record or a
//! [`ValidationError`]. Defaults are applied only where a field declares one.

use std::collections::HashSet;
use std::fmt;

use regex::Regex;
use rmcp::model::JsonObject;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use thiserror::Error;

// ============================================================================
// Field kinds and constraints
// ============================================================================

/// Primitive kind of a field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// A JSON string.
    String,
    /// Any JSON number.
    Number,
    /// A JSON number without a fractional part.
    Integer,
    /// A JSON boolean.
    Boolean,
    /// A JSON array whose elements are all strings.
    StringArray,
    /// A JSON string restricted to one of the listed values.
    Enum(Vec<String>),
}

impl FieldKind {
    fn json_type(&self) -> &'static str {
        match self {
            Self::String | Self::Enum(_) => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::StringArray => "array",
        }
    }

    fn expectation(&self) -> String {
        match self {
            Self::String => "must be a string".to_string(),
            Self::Number => "must be a number".to_string(),
            Self::Integer => "must be an integer".to_string(),
            Self::Boolean => "must be a boolean".to_string(),
            Self::StringArray => "must be an array of strings".to_string(),
            Self::Enum(values) => format!("must be one of: {}", values.join(", ")),
        }
    }

    /// Whether `value` has this kind (enum membership included).
    fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Boolean => value.is_boolean(),
            Self::StringArray => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
            Self::Enum(values) => value
                .as_str()
                .is_some_and(|s| values.iter().any(|allowed| allowed == s)),
        }
    }
}

/// A regular expression constraint, compiled when it is declared.
///
/// A pattern that fails to compile is kept with its error so that
/// [`ParamSchema::check`] can reject the schema at registration.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    compiled: Result<Regex, String>,
}

impl Pattern {
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let compiled = Regex::new(&source).map_err(|e| e.to_string());
        Self { source, compiled }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// The compiled expression, if the source is valid.
    pub fn regex(&self) -> Option<&Regex> {
        self.compiled.as_ref().ok()
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

/// Refinement applied to a value after its kind has been checked.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// String must not be empty, array must have at least one element.
    NonEmpty,
    /// String must have at least this many characters.
    MinLength(usize),
    /// String must match this regular expression.
    Pattern(Pattern),
    /// Number must not be NaN or infinite.
    Finite,
    /// Array must have at least this many elements.
    MinItems(usize),
}

impl Constraint {
    /// Check `value` (already known to have the field's kind).
    ///
    /// Returns a human-readable violation message on failure.
    fn check(&self, value: &Value) -> Option<String> {
        match (self, value) {
            (Self::NonEmpty, Value::String(s)) if s.is_empty() => {
                Some("must not be empty".to_string())
            }
            (Self::NonEmpty, Value::Array(items)) if items.is_empty() => {
                Some("must contain at least one element".to_string())
            }
            (Self::MinLength(min), Value::String(s)) if s.chars().count() < *min => {
                Some(format!("must be at least {} characters long", min))
            }
            (Self::Pattern(pattern), Value::String(s)) => match pattern.regex() {
                Some(re) if re.is_match(s) => None,
                Some(_) => Some(format!("must match pattern {}", pattern.as_str())),
                None => Some(format!("has an invalid pattern {}", pattern.as_str())),
            },
            (Self::Finite, Value::Number(n)) if !n.as_f64().is_some_and(f64::is_finite) => {
                Some("must be a finite number".to_string())
            }
            (Self::MinItems(min), Value::Array(items)) if items.len() < *min => Some(format!(
                "must contain at least {} element{}",
                min,
                if *min == 1 { "" } else { "s" }
            )),
            _ => None,
        }
    }
}

// ============================================================================
// Field
// ============================================================================

/// A single declared parameter.
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    kind: FieldKind,
    description: Option<String>,
    required: bool,
    default: Option<Value>,
    empty_as_absent: bool,
    constraints: Vec<Constraint>,
}

impl Field {
    fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            description: None,
            required: true,
            default: None,
            empty_as_absent: false,
            constraints: Vec::new(),
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::String)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Number)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Integer)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    pub fn string_array(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::StringArray)
    }

    /// A string field restricted to `values`.
    pub fn enumeration(name: impl Into<String>, values: &[&str]) -> Self {
        Self::new(
            name,
            FieldKind::Enum(values.iter().map(|v| v.to_string()).collect()),
        )
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Mark the field as optional (absent values are simply omitted).
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Value used when the field is absent. Implies optional.
    pub fn default_value(mut self, value: Value) -> Self {
        self.required = false;
        self.default = Some(value);
        self
    }

    /// Treat an explicit empty string exactly like an absent field.
    pub fn empty_as_absent(mut self) -> Self {
        self.empty_as_absent = true;
        self
    }

    pub fn non_empty(self) -> Self {
        self.constraint(Constraint::NonEmpty)
    }

    pub fn min_length(self, min: usize) -> Self {
        self.constraint(Constraint::MinLength(min))
    }

    pub fn pattern(self, pattern: impl Into<String>) -> Self {
        self.constraint(Constraint::Pattern(Pattern::new(pattern)))
    }

    pub fn finite(self) -> Self {
        self.constraint(Constraint::Finite)
    }

    pub fn min_items(self, min: usize) -> Self {
        self.constraint(Constraint::MinItems(min))
    }

    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    fn is_absent(&self, value: Option<&Value>) -> bool {
        match value {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => self.empty_as_absent && s.is_empty(),
            Some(_) => false,
        }
    }

    fn to_json_schema(&self) -> Value {
        let mut property = JsonObject::new();
        property.insert("type".into(), json!(self.kind.json_type()));

        if let Some(description) = &self.description {
            property.insert("description".into(), json!(description));
        }
        match &self.kind {
            FieldKind::Enum(values) => {
                property.insert("enum".into(), json!(values));
            }
            FieldKind::StringArray => {
                property.insert("items".into(), json!({ "type": "string" }));
            }
            _ => {}
        }

        for constraint in &self.constraints {
            match (constraint, &self.kind) {
                (Constraint::NonEmpty, FieldKind::StringArray) => {
                    property.insert("minItems".into(), json!(1));
                }
                (Constraint::NonEmpty, _) => {
                    property.insert("minLength".into(), json!(1));
                }
                (Constraint::MinLength(min), _) => {
                    property.insert("minLength".into(), json!(min));
                }
                (Constraint::Pattern(pattern), _) => {
                    property.insert("pattern".into(), json!(pattern.as_str()));
                }
                (Constraint::MinItems(min), _) => {
                    property.insert("minItems".into(), json!(min));
                }
                // JSON numbers are always finite; nothing to advertise.
                (Constraint::Finite, _) => {}
            }
        }

        if let Some(default) = &self.default {
            property.insert("default".into(), default.clone());
        }

        Value::Object(property)
    }
}

// ============================================================================
// Errors
// ============================================================================

/// A schema that cannot be registered.
#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("field name must not be empty")]
    EmptyFieldName,

    #[error("field '{0}' is declared more than once")]
    DuplicateField(String),

    #[error("enum field '{0}' declares no allowed values")]
    EmptyEnum(String),

    #[error("field '{field}' has an invalid pattern: {reason}")]
    InvalidPattern { field: String, reason: String },

    #[error("default value of field '{0}' does not match its kind")]
    DefaultKindMismatch(String),
}

/// One violated constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' {}", self.field, self.message)
    }
}

/// Rejection of a payload, listing every violated constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    violations: Vec<FieldViolation>,
}

impl ValidationError {
    pub fn new(violations: Vec<FieldViolation>) -> Self {
        Self { violations }
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(vec![FieldViolation::new(field, message)])
    }

    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    /// Whether any violation concerns `field`.
    pub fn mentions(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid parameters: ")?;
        for (i, violation) in self.violations.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", violation)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

// ============================================================================
// Validated parameters
// ============================================================================

/// Arguments that passed schema validation, with declared defaults applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedParams(JsonObject);

impl ValidatedParams {
    pub fn as_object(&self) -> &JsonObject {
        &self.0
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Convert into a tool's typed parameter struct.
    pub fn deserialize<T: DeserializeOwned>(self) -> Result<T, ValidationError> {
        serde_json::from_value(Value::Object(self.0))
            .map_err(|e| ValidationError::single("arguments", e.to_string()))
    }
}

// ============================================================================
// Schema
// ============================================================================

/// Declared input shape of a tool.
#[derive(Debug, Clone, Default)]
pub struct ParamSchema {
    fields: Vec<Field>,
}

impl ParamSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Reject schemas that could never validate consistently.
    pub fn check(&self) -> Result<(), SchemaError> {
        let mut seen = HashSet::new();

        for field in &self.fields {
            if field.name.is_empty() {
                return Err(SchemaError::EmptyFieldName);
            }
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField(field.name.clone()));
            }
            if let FieldKind::Enum(values) = &field.kind {
                if values.is_empty() {
                    return Err(SchemaError::EmptyEnum(field.name.clone()));
                }
            }
            for constraint in &field.constraints {
                if let Constraint::Pattern(Pattern {
                    compiled: Err(reason),
                    ..
                }) = constraint
                {
                    return Err(SchemaError::InvalidPattern {
                        field: field.name.clone(),
                        reason: reason.clone(),
                    });
                }
            }
            if let Some(default) = &field.default {
                if !field.kind.accepts(default) {
                    return Err(SchemaError::DefaultKindMismatch(field.name.clone()));
                }
            }
        }

        Ok(())
    }

    /// Render as a JSON Schema object for `tools/list`.
    pub fn to_json_schema(&self) -> JsonObject {
        let properties: JsonObject = self
            .fields
            .iter()
            .map(|field| (field.name.clone(), field.to_json_schema()))
            .collect();

        let required: Vec<&str> = self
            .fields
            .iter()
            .filter(|field| field.required)
            .map(|field| field.name.as_str())
            .collect();

        let mut schema = JsonObject::new();
        schema.insert("type".into(), json!("object"));
        schema.insert("properties".into(), Value::Object(properties));
        if !required.is_empty() {
            schema.insert("required".into(), json!(required));
        }
        schema.insert("additionalProperties".into(), json!(false));
        schema
    }

    /// Validate raw arguments.
    ///
    /// A missing argument object is treated as an empty one. Unknown fields
    /// are violations. Every violation is reported.
    pub fn validate(&self, payload: Option<&JsonObject>) -> Result<ValidatedParams, ValidationError> {
        let empty = JsonObject::new();
        let payload = payload.unwrap_or(&empty);

        let mut violations = Vec::new();
        let mut validated = JsonObject::new();

        for field in &self.fields {
            let value = payload.get(&field.name);

            if field.is_absent(value) {
                if let Some(default) = &field.default {
                    validated.insert(field.name.clone(), default.clone());
                } else if field.required {
                    violations.push(FieldViolation::new(&field.name, "is required"));
                }
                continue;
            }

            // Absent values were handled above.
            let Some(value) = value else { continue };

            if !field.kind.accepts(value) {
                violations.push(FieldViolation::new(&field.name, field.kind.expectation()));
                continue;
            }

            let before = violations.len();
            for constraint in &field.constraints {
                if let Some(message) = constraint.check(value) {
                    violations.push(FieldViolation::new(&field.name, message));
                }
            }
            if violations.len() == before {
                validated.insert(field.name.clone(), value.clone());
            }
        }

        for key in payload.keys() {
            if !self.fields.iter().any(|field| &field.name == key) {
                violations.push(FieldViolation::new(key, "is not a recognised parameter"));
            }
        }

        if violations.is_empty() {
            Ok(ValidatedParams(validated))
        } else {
            Err(ValidationError::new(violations))
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
