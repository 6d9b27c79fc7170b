//! Function declarations to Messages API tool definitions.
//!
//! A declaration's structured `parameters` schema takes precedence over its
//! raw `parameters_json_schema`. The structured path carries the full keyword
//! set (bounds, pattern, `anyOf`); the typed JSON-schema path only carries
//! type, description, enum, items, properties and required. Keywords the
//! typed path drops are logged at debug level rather than silently equalized.

use crate::wire::{InputSchema, ToolParam};
use parley_core::schema::*;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Convert tool groups to tool definitions, one per function declaration
pub fn tools_to_params(tools: &[Tool]) -> Vec<ToolParam> {
    tools
        .iter()
        .flat_map(|tool| tool.function_declarations.iter())
        .map(function_declaration_to_tool)
        .collect()
}

/// Convert a single function declaration.
///
/// Never fails: malformed or missing schemas degrade to an empty object schema.
pub fn function_declaration_to_tool(decl: &FunctionDeclaration) -> ToolParam {
    let mut input_schema = InputSchema::default();

    if let Some(params) = &decl.parameters {
        if let Some(props) = schema_properties_to_map(&params.properties) {
            input_schema.properties = props;
        }
        input_schema.required = params.required.clone();
        if decl.parameters_json_schema.is_some() {
            tracing::debug!(
                tool = %decl.name,
                "structured parameters take precedence; ignoring raw JSON schema"
            );
        }
    } else if let Some(raw) = &decl.parameters_json_schema {
        let normalized = NormalizedJsonSchema::from(raw);
        if let Some(props) = normalized.properties {
            input_schema.properties = props;
        }
        input_schema.required = normalized.required;
    }

    ToolParam {
        name: decl.name.clone(),
        description: Some(decl.description.clone()).filter(|d| !d.is_empty()),
        input_schema,
    }
}

/// Both raw JSON-schema shapes reduced to the two fields the root needs
struct NormalizedJsonSchema {
    properties: Option<Map<String, Value>>,
    required: Vec<String>,
}

impl From<&ParametersJsonSchema> for NormalizedJsonSchema {
    fn from(raw: &ParametersJsonSchema) -> Self {
        match raw {
            ParametersJsonSchema::Value(value) => Self {
                properties: value
                    .get("properties")
                    .and_then(Value::as_object)
                    .cloned(),
                required: extract_required_fields(value.get("required")),
            },
            ParametersJsonSchema::Schema(schema) => Self {
                properties: json_schema_to_properties(schema),
                required: schema.required.clone(),
            },
        }
    }
}

/// Required field names from a generic `required` value.
///
/// Accepts a list of strings, or a list of arbitrary values of which only the
/// strings are kept. Anything else yields no required fields.
fn extract_required_fields(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

fn json_schema_to_properties(schema: &JsonSchema) -> Option<Map<String, Value>> {
    let properties = schema.properties.as_ref()?;
    Some(
        properties
            .iter()
            .map(|(name, prop)| (name.clone(), Value::Object(json_schema_property_to_map(prop))))
            .collect(),
    )
}

fn json_schema_property_to_map(schema: &JsonSchema) -> Map<String, Value> {
    let mut result = Map::new();

    if !schema.type_.is_empty() {
        result.insert("type".into(), Value::String(schema.type_.clone()));
    }
    if !schema.description.is_empty() {
        result.insert("description".into(), Value::String(schema.description.clone()));
    }
    if !schema.enum_values.is_empty() {
        result.insert("enum".into(), Value::Array(schema.enum_values.clone()));
    }
    if let Some(items) = &schema.items {
        result.insert("items".into(), Value::Object(json_schema_property_to_map(items)));
    }
    if let Some(props) = json_schema_to_properties(schema) {
        result.insert("properties".into(), Value::Object(props));
    }
    if !schema.required.is_empty() {
        result.insert("required".into(), strings(&schema.required));
    }

    let dropped = dropped_keywords(schema);
    if !dropped.is_empty() {
        tracing::debug!(?dropped, "JSON-schema keywords not carried to tool schema");
    }

    result
}

fn dropped_keywords(schema: &JsonSchema) -> Vec<&'static str> {
    let mut dropped = Vec::new();
    if schema.minimum.is_some() {
        dropped.push("minimum");
    }
    if schema.maximum.is_some() {
        dropped.push("maximum");
    }
    if schema.min_length.is_some() {
        dropped.push("minLength");
    }
    if schema.max_length.is_some() {
        dropped.push("maxLength");
    }
    if schema.pattern.is_some() {
        dropped.push("pattern");
    }
    if !schema.any_of.is_empty() {
        dropped.push("anyOf");
    }
    dropped
}

fn schema_properties_to_map(props: &HashMap<String, Schema>) -> Option<Map<String, Value>> {
    if props.is_empty() {
        return None;
    }
    Some(
        props
            .iter()
            .map(|(name, schema)| (name.clone(), Value::Object(schema_to_map(schema))))
            .collect(),
    )
}

/// Convert a structured schema node, recursively
pub fn schema_to_map(schema: &Schema) -> Map<String, Value> {
    let mut result = Map::new();

    if let Some(type_) = schema.type_ {
        result.insert("type".into(), Value::String(type_.as_str().to_lowercase()));
    }
    if !schema.description.is_empty() {
        result.insert("description".into(), Value::String(schema.description.clone()));
    }
    if !schema.enum_values.is_empty() {
        result.insert("enum".into(), strings(&schema.enum_values));
    }
    if !schema.format.is_empty() {
        result.insert("format".into(), Value::String(schema.format.clone()));
    }
    if let Some(items) = &schema.items {
        result.insert("items".into(), Value::Object(schema_to_map(items)));
    }
    if let Some(props) = schema_properties_to_map(&schema.properties) {
        result.insert("properties".into(), Value::Object(props));
    }
    if !schema.required.is_empty() {
        result.insert("required".into(), strings(&schema.required));
    }
    if schema.nullable == Some(true) {
        result.insert("nullable".into(), Value::Bool(true));
    }
    if let Some(default) = &schema.default {
        result.insert("default".into(), default.clone());
    }

    for (key, bound) in [("minimum", schema.minimum), ("maximum", schema.maximum)] {
        if let Some(n) = bound.and_then(serde_json::Number::from_f64) {
            result.insert(key.into(), Value::Number(n));
        }
    }
    for (key, bound) in [
        ("minLength", schema.min_length),
        ("maxLength", schema.max_length),
        ("minItems", schema.min_items),
        ("maxItems", schema.max_items),
    ] {
        if let Some(n) = bound {
            result.insert(key.into(), Value::from(n));
        }
    }

    if !schema.pattern.is_empty() {
        result.insert("pattern".into(), Value::String(schema.pattern.clone()));
    }

    let any_of: Vec<Value> = schema
        .any_of
        .iter()
        .map(|alt| Value::Object(schema_to_map(alt)))
        .collect();
    if !any_of.is_empty() {
        result.insert("anyOf".into(), Value::Array(any_of));
    }

    result
}

fn strings(values: &[String]) -> Value {
    Value::Array(values.iter().cloned().map(Value::String).collect())
}
