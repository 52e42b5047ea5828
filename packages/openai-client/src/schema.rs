//! Strict JSON schemas for OpenAI structured outputs.
//!
//! `schemars` describes a Rust type; OpenAI's strict mode wants a slightly
//! different dialect:
//! 1. `additionalProperties: false` on every object
//! 2. every property listed in `required` (optional ones included)
//! 3. no `$ref`, no `definitions`, no `$schema`
//! 4. no `default` values (serde defaults stay on the Rust side)
//!
//! [`StructuredOutput::openai_schema`] performs that rewrite.

use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::types::ResponseFormat;

/// Types that can be requested as OpenAI structured output.
///
/// Implemented for anything that is `JsonSchema + DeserializeOwned`.
pub trait StructuredOutput: JsonSchema + DeserializeOwned {
    /// OpenAI-compatible JSON schema for this type.
    fn openai_schema() -> Value {
        let mut value = serde_json::to_value(schema_for!(Self)).unwrap_or_default();

        let definitions = value
            .as_object_mut()
            .and_then(|root| root.remove("definitions"))
            .unwrap_or(Value::Null);

        inline_refs(&mut value, &definitions);
        make_strict(&mut value);

        if let Value::Object(root) = &mut value {
            root.remove("$schema");
        }

        value
    }

    /// `response_format` payload requesting this type.
    fn response_format() -> ResponseFormat {
        ResponseFormat::json_schema(Self::type_name(), Self::openai_schema())
    }

    /// Schema name for this type.
    fn type_name() -> String {
        <Self as JsonSchema>::schema_name()
    }
}

impl<T: JsonSchema + DeserializeOwned> StructuredOutput for T {}

/// Replace `{"$ref": "#/definitions/X"}` nodes with the definition of `X`.
fn inline_refs(value: &mut Value, definitions: &Value) {
    match value {
        Value::Object(map) => {
            let target = map
                .get("$ref")
                .and_then(Value::as_str)
                .and_then(|path| path.strip_prefix("#/definitions/"))
                .and_then(|name| definitions.get(name))
                .cloned();

            if let Some(mut definition) = target {
                inline_refs(&mut definition, definitions);
                *value = definition;
                return;
            }

            map.values_mut().for_each(|v| inline_refs(v, definitions));
        }
        Value::Array(items) => items.iter_mut().for_each(|v| inline_refs(v, definitions)),
        _ => {}
    }
}

/// Close every object schema and require all of its properties.
fn make_strict(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if map.contains_key("type") {
                map.remove("default");
            }

            if is_object_schema(map) {
                map.insert("additionalProperties".to_string(), Value::Bool(false));

                let keys: Vec<Value> = map
                    .get("properties")
                    .and_then(Value::as_object)
                    .map(|props| props.keys().cloned().map(Value::String).collect())
                    .unwrap_or_default();
                map.insert("required".to_string(), Value::Array(keys));
            }

            map.values_mut().for_each(make_strict);
        }
        Value::Array(items) => items.iter_mut().for_each(make_strict),
        _ => {}
    }
}

fn is_object_schema(map: &Map<String, Value>) -> bool {
    match map.get("type") {
        Some(Value::String(t)) => t == "object",
        Some(Value::Array(types)) => types.iter().any(|t| t == "object"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, JsonSchema)]
    #[allow(dead_code)]
    struct Practice {
        name: String,
        url: Option<String>,
    }

    #[derive(Deserialize, JsonSchema)]
    #[allow(dead_code)]
    struct Profile {
        #[serde(default)]
        narrative: String,
        practices: Vec<Practice>,
    }

    fn required_of(schema: &Value) -> Vec<&str> {
        schema["required"]
            .as_array()
            .expect("required array")
            .iter()
            .filter_map(Value::as_str)
            .collect()
    }

    #[test]
    fn test_root_is_closed_and_fully_required() {
        let schema = Profile::openai_schema();

        assert_eq!(schema["additionalProperties"], Value::Bool(false));
        let required = required_of(&schema);
        assert!(required.contains(&"narrative"), "defaulted fields are still required");
        assert!(required.contains(&"practices"));
    }

    #[test]
    fn test_definitions_and_meta_removed() {
        let schema = Profile::openai_schema();
        let root = schema.as_object().unwrap();

        assert!(!root.contains_key("definitions"));
        assert!(!root.contains_key("$schema"));
        assert!(!serde_json::to_string(&schema).unwrap().contains("$ref"));
    }

    #[test]
    fn test_nested_struct_inlined_and_strict() {
        let schema = Profile::openai_schema();
        let item = &schema["properties"]["practices"]["items"];

        assert_eq!(item["type"], "object");
        assert_eq!(item["additionalProperties"], Value::Bool(false));
        let required = required_of(item);
        assert!(required.contains(&"name"));
        assert!(required.contains(&"url"), "Option fields must be required too");
    }

    #[test]
    fn test_serde_defaults_not_emitted() {
        let schema = Profile::openai_schema();
        assert!(schema["properties"]["narrative"].get("default").is_none());
    }

    #[test]
    fn test_response_format_uses_type_name() {
        let format = Profile::response_format();
        assert_eq!(format.format_type, "json_schema");
        assert_eq!(format.json_schema.name, "Profile");
        assert!(format.json_schema.strict);
    }
}
