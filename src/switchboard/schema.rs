//! Structural validation of untrusted agent arguments.
//!
//! Arguments reach the dispatcher as loosely typed JSON (from the router, an HTTP body, or an
//! LLM tool call). A [`Schema`] checks that JSON against declared [`FieldSpec`]s and either
//! returns a cleaned value (unknown keys dropped, defaults filled in) or the complete list of
//! field-level [`Violation`]s. Agents then deserialize the cleaned value into their typed input.
//!
//! ```rust
//! use switchboard::schema::{FieldSpec, FieldType, ObjectSchema, Schema};
//! use serde_json::json;
//!
//! let schema = Schema::Object(
//!     ObjectSchema::new()
//!         .field(FieldSpec::new("query", FieldType::String).required())
//!         .field(FieldSpec::new("limit", FieldType::Integer).with_default(json!(5))),
//! );
//!
//! let cleaned = schema.validate(&json!({ "query": "rust", "extra": true })).unwrap();
//! assert_eq!(cleaned, json!({ "query": "rust", "limit": 5 }));
//!
//! let violations = schema.validate(&json!({ "limit": "ten" })).unwrap_err();
//! assert_eq!(violations.len(), 2);
//! ```

use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// JSON type a field must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

impl FieldType {
    fn name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Integer => "integer",
            FieldType::Boolean => "boolean",
            FieldType::Array => "array",
            FieldType::Object => "object",
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Number => value.is_number(),
            FieldType::Integer => value.is_i64() || value.is_u64(),
            FieldType::Boolean => value.is_boolean(),
            FieldType::Array => value.is_array(),
            FieldType::Object => value.is_object(),
        }
    }
}

fn received(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A single failed check, addressed by its path inside the validated value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub path: Vec<String>,
    pub message: String,
}

impl Violation {
    pub fn new(path: Vec<String>, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
        }
    }

    /// Dotted path, `"(root)"` for violations on the value itself.
    pub fn path_string(&self) -> String {
        if self.path.is_empty() {
            "(root)".to_string()
        } else {
            self.path.join(".")
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.path_string(), self.message)
    }
}

/// Join violations into the `path (message), path (message)` form used in error messages.
pub fn describe_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Declaration of one field.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub field_type: FieldType,
    pub description: Option<String>,
    pub required: bool,
    pub default: Option<Value>,
    /// Closed set of accepted values.
    pub allowed: Option<Vec<Value>>,
    /// For array fields, the spec every element must satisfy.
    pub items: Option<Box<FieldSpec>>,
    /// For object fields, the nested properties.
    pub properties: Option<Vec<FieldSpec>>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            description: None,
            required: false,
            default: None,
            allowed: None,
            items: None,
            properties: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Value used when the field is absent (or null).
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Restrict the field to the given string literals.
    pub fn one_of(mut self, values: &[&str]) -> Self {
        self.allowed = Some(values.iter().map(|v| Value::from(*v)).collect());
        self
    }

    pub fn with_items(mut self, items: FieldSpec) -> Self {
        self.items = Some(Box::new(items));
        self
    }

    pub fn with_properties(mut self, properties: Vec<FieldSpec>) -> Self {
        self.properties = Some(properties);
        self
    }

    /// Validate a present value at `path`, pushing every violation found.
    fn check(&self, value: &Value, path: &[String], violations: &mut Vec<Violation>) -> Value {
        if !self.field_type.accepts(value) {
            violations.push(Violation::new(
                path.to_vec(),
                format!(
                    "Expected {}, received {}",
                    self.field_type.name(),
                    received(value)
                ),
            ));
            return value.clone();
        }

        if let Some(allowed) = &self.allowed {
            if !allowed.contains(value) {
                let expected = allowed
                    .iter()
                    .map(|v| match v {
                        Value::String(s) => format!("'{}'", s),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(" | ");
                violations.push(Violation::new(
                    path.to_vec(),
                    format!("Invalid enum value. Expected {}, received {}", expected, value),
                ));
            }
        }

        match (value, &self.items, &self.properties) {
            (Value::Array(elements), Some(items), _) => Value::Array(
                elements
                    .iter()
                    .enumerate()
                    .map(|(i, element)| {
                        let mut element_path = path.to_vec();
                        element_path.push(i.to_string());
                        items.check(element, &element_path, violations)
                    })
                    .collect(),
            ),
            (Value::Object(map), _, Some(properties)) => {
                Value::Object(check_fields(properties, map, path, violations))
            }
            _ => value.clone(),
        }
    }

    /// JSON-Schema rendering of this field.
    pub fn to_json_schema(&self) -> Value {
        let mut schema = Map::new();
        schema.insert("type".into(), Value::from(self.field_type.name()));
        if let Some(description) = &self.description {
            schema.insert("description".into(), Value::from(description.as_str()));
        }
        if let Some(allowed) = &self.allowed {
            schema.insert("enum".into(), Value::Array(allowed.clone()));
        }
        if let Some(default) = &self.default {
            schema.insert("default".into(), default.clone());
        }
        if let Some(items) = &self.items {
            schema.insert("items".into(), items.to_json_schema());
        }
        if let Some(properties) = &self.properties {
            let (props, required) = render_properties(properties);
            schema.insert("properties".into(), props);
            schema.insert("required".into(), required);
        }
        Value::Object(schema)
    }
}

fn check_fields(
    fields: &[FieldSpec],
    input: &Map<String, Value>,
    path: &[String],
    violations: &mut Vec<Violation>,
) -> Map<String, Value> {
    let mut cleaned = Map::new();
    for field in fields {
        let mut field_path = path.to_vec();
        field_path.push(field.name.clone());

        match input.get(&field.name).filter(|v| !v.is_null()) {
            Some(value) => {
                let checked = field.check(value, &field_path, violations);
                cleaned.insert(field.name.clone(), checked);
            }
            None => {
                if let Some(default) = &field.default {
                    cleaned.insert(field.name.clone(), default.clone());
                } else if field.required {
                    violations.push(Violation::new(field_path, "Required"));
                }
            }
        }
    }
    cleaned
}

fn render_properties(fields: &[FieldSpec]) -> (Value, Value) {
    let mut props = Map::new();
    let mut required = Vec::new();
    for field in fields {
        props.insert(field.name.clone(), field.to_json_schema());
        if field.required {
            required.push(Value::from(field.name.as_str()));
        }
    }
    (Value::Object(props), Value::Array(required))
}

/// Cross-field check run once every field passed.
pub type Refinement = Arc<dyn Fn(&Map<String, Value>) -> Option<Violation> + Send + Sync>;

/// An object with declared fields plus optional cross-field refinements.
#[derive(Clone, Default)]
pub struct ObjectSchema {
    pub fields: Vec<FieldSpec>,
    refinements: Vec<Refinement>,
}

impl fmt::Debug for ObjectSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectSchema")
            .field("fields", &self.fields)
            .field("refinements", &self.refinements.len())
            .finish()
    }
}

impl ObjectSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn refine<F>(mut self, check: F) -> Self
    where
        F: Fn(&Map<String, Value>) -> Option<Violation> + Send + Sync + 'static,
    {
        self.refinements.push(Arc::new(check));
        self
    }

    fn check(&self, value: &Value, violations: &mut Vec<Violation>) -> Map<String, Value> {
        let map = match value {
            Value::Object(map) => map,
            other => {
                violations.push(Violation::new(
                    Vec::new(),
                    format!("Expected object, received {}", received(other)),
                ));
                return Map::new();
            }
        };

        let before = violations.len();
        let cleaned = check_fields(&self.fields, map, &[], violations);
        if violations.len() == before {
            for refinement in &self.refinements {
                if let Some(violation) = refinement(&cleaned) {
                    violations.push(violation);
                }
            }
        }
        cleaned
    }
}

/// Top-level shape accepted or produced by an agent.
#[derive(Debug, Clone)]
pub enum Schema {
    /// A single object.
    Object(ObjectSchema),
    /// One of several objects selected by a string tag field.
    Tagged {
        tag: String,
        variants: Vec<(String, ObjectSchema)>,
    },
    /// A bare value (string, array, ...).
    Value(FieldSpec),
}

impl Schema {
    /// Validate `value`, returning the cleaned value or every violation found.
    pub fn validate(&self, value: &Value) -> Result<Value, Vec<Violation>> {
        let mut violations = Vec::new();
        let cleaned = match self {
            Schema::Object(object) => Value::Object(object.check(value, &mut violations)),
            Schema::Tagged { tag, variants } => {
                let selected = value
                    .get(tag)
                    .and_then(Value::as_str)
                    .and_then(|t| variants.iter().find(|(name, _)| name == t));
                match (value, selected) {
                    (Value::Object(_), Some((_, variant))) => {
                        Value::Object(variant.check(value, &mut violations))
                    }
                    (Value::Object(_), None) => {
                        let expected = variants
                            .iter()
                            .map(|(name, _)| format!("'{}'", name))
                            .collect::<Vec<_>>()
                            .join(" | ");
                        violations.push(Violation::new(
                            vec![tag.clone()],
                            format!("Invalid discriminator value. Expected {}", expected),
                        ));
                        Value::Null
                    }
                    (other, _) => {
                        violations.push(Violation::new(
                            Vec::new(),
                            format!("Expected object, received {}", received(other)),
                        ));
                        Value::Null
                    }
                }
            }
            Schema::Value(spec) => spec.check(value, &[], &mut violations),
        };

        if violations.is_empty() {
            Ok(cleaned)
        } else {
            Err(violations)
        }
    }

    /// JSON-Schema rendering, suitable for LLM function/tool declarations.
    ///
    /// Tagged schemas are flattened into one object whose tag is an enum of every variant and
    /// whose remaining properties are optional.
    pub fn to_json_schema(&self) -> Value {
        match self {
            Schema::Object(object) => {
                let (props, required) = render_properties(&object.fields);
                serde_json::json!({ "type": "object", "properties": props, "required": required })
            }
            Schema::Tagged { tag, variants } => {
                let mut props = Map::new();
                let names: Vec<Value> = variants
                    .iter()
                    .map(|(name, _)| Value::from(name.as_str()))
                    .collect();
                props.insert(
                    tag.clone(),
                    serde_json::json!({ "type": "string", "enum": names }),
                );
                for (_, variant) in variants {
                    for field in variant.fields.iter().filter(|f| &f.name != tag) {
                        props
                            .entry(field.name.clone())
                            .or_insert_with(|| field.to_json_schema());
                    }
                }
                serde_json::json!({ "type": "object", "properties": props, "required": [tag] })
            }
            Schema::Value(spec) => spec.to_json_schema(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn weather_like() -> Schema {
        Schema::Object(
            ObjectSchema::new()
                .field(FieldSpec::new("location", FieldType::String))
                .field(
                    FieldSpec::new("unit", FieldType::String)
                        .one_of(&["celsius", "fahrenheit"])
                        .with_default(json!("fahrenheit")),
                )
                .field(FieldSpec::new("latitude", FieldType::Number))
                .field(FieldSpec::new("longitude", FieldType::Number))
                .refine(|m| {
                    let has_coords = m.contains_key("latitude") && m.contains_key("longitude");
                    (!m.contains_key("location") && !has_coords).then(|| {
                        Violation::new(vec![], "Either location or both latitude and longitude must be provided.")
                    })
                }),
        )
    }

    #[test]
    fn test_defaults_filled_and_unknown_keys_dropped() {
        let cleaned = weather_like()
            .validate(&json!({ "location": "Oslo", "mood": "sunny" }))
            .unwrap();
        assert_eq!(cleaned, json!({ "location": "Oslo", "unit": "fahrenheit" }));
    }

    #[test]
    fn test_enum_violation_names_expected_values() {
        let violations = weather_like()
            .validate(&json!({ "location": "Oslo", "unit": "kelvin" }))
            .unwrap_err();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, vec!["unit".to_string()]);
        assert!(violations[0].message.contains("'celsius' | 'fahrenheit'"));
    }

    #[test]
    fn test_refinement_runs_only_after_fields_pass() {
        let violations = weather_like().validate(&json!({ "unit": "celsius" })).unwrap_err();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path_string(), "(root)");

        let violations = weather_like().validate(&json!({ "latitude": "north" })).unwrap_err();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path_string(), "latitude");
    }

    #[test]
    fn test_non_object_rejected() {
        let violations = weather_like().validate(&json!("Paris")).unwrap_err();
        assert_eq!(violations[0].message, "Expected object, received string");
    }

    #[test]
    fn test_nested_array_paths() {
        let schema = Schema::Object(ObjectSchema::new().field(
            FieldSpec::new("context", FieldType::Array)
                .required()
                .with_items(FieldSpec::new("turn", FieldType::Object).with_properties(vec![
                    FieldSpec::new("role", FieldType::String).required(),
                    FieldSpec::new("content", FieldType::String).required(),
                ])),
        ));

        let violations = schema
            .validate(&json!({ "context": [{ "role": "user", "content": "hi" }, { "role": 3 }] }))
            .unwrap_err();
        let paths: Vec<String> = violations.iter().map(|v| v.path_string()).collect();
        assert_eq!(paths, vec!["context.1.role", "context.1.content"]);
        assert_eq!(
            describe_violations(&violations[1..]),
            "context.1.content (Required)"
        );
    }

    #[test]
    fn test_tagged_selects_variant() {
        let schema = Schema::Tagged {
            tag: "action".into(),
            variants: vec![
                (
                    "list".into(),
                    ObjectSchema::new().field(FieldSpec::new("action", FieldType::String).required()),
                ),
                (
                    "create".into(),
                    ObjectSchema::new()
                        .field(FieldSpec::new("action", FieldType::String).required())
                        .field(FieldSpec::new("content", FieldType::String).required()),
                ),
            ],
        };

        assert!(schema.validate(&json!({ "action": "list" })).is_ok());
        let violations = schema.validate(&json!({ "action": "create" })).unwrap_err();
        assert_eq!(violations[0].path_string(), "content");
        let violations = schema.validate(&json!({ "action": "delete" })).unwrap_err();
        assert_eq!(violations[0].path_string(), "action");

        let rendered = schema.to_json_schema();
        assert_eq!(rendered["properties"]["action"]["enum"], json!(["list", "create"]));
        assert_eq!(rendered["required"], json!(["action"]));
    }

    #[test]
    fn test_integer_rejects_fraction() {
        let schema = Schema::Value(FieldSpec::new("n", FieldType::Integer));
        assert!(schema.validate(&json!(3)).is_ok());
        assert!(schema.validate(&json!(3.5)).is_err());
    }
}
