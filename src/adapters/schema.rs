//! Tool argument schemas
//!
//! Schemas are generated from the input types with schemars, fully inlined and without
//! a `$schema` marker so every provider accepts them. Arguments travel as `{"params": {...}}`.

use schemars::gen::SchemaSettings;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::agents::error::ToolError;

#[derive(JsonSchema)]
#[allow(dead_code)]
struct Params<T> {
    params: T,
}

/// JSON Schema of `{"params": T}`
pub fn parameters_schema<T: JsonSchema>() -> Value {
    let settings = SchemaSettings::draft07().with(|s| {
        s.inline_subschemas = true;
        s.meta_schema = None;
    });
    let root = settings.into_generator().into_root_schema_for::<Params<T>>();
    serde_json::to_value(root).unwrap_or_else(|_| serde_json::json!({ "type": "object" }))
}

/// Decode tool arguments, accepting both the `params` envelope and flat arguments
pub fn parse_params<T: DeserializeOwned>(args: Value) -> Result<T, ToolError> {
    let inner = match args {
        Value::Object(mut obj) if obj.len() == 1 && obj.contains_key("params") => {
            obj.remove("params").unwrap_or(Value::Null)
        }
        other => other,
    };
    serde_json::from_value(inner).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}
