//! Delivery schema the structured output is constrained to.
//!
//! The schema is an opaque contract between this service and the model; it
//! is only checked to be a JSON object before being forwarded.

use serde_json::Value as JsonValue;

use crate::SchemaError;

/// Schema shipped with the crate, used when no override is configured
pub const BUNDLED_SCHEMA: &str = include_str!("../schema/diagnostic.schema.json");

#[derive(Debug, Clone, PartialEq)]
pub struct DeliverySchema(JsonValue);

impl DeliverySchema {
    /// Parse a schema document. `origin` names where it came from for error
    /// messages (an env var, a file path).
    pub fn parse(text: &str, origin: &str) -> Result<Self, SchemaError> {
        let value: JsonValue = serde_json::from_str(text).map_err(|e| SchemaError::Parse {
            origin: origin.to_string(),
            message: e.to_string(),
        })?;

        if !value.is_object() {
            return Err(SchemaError::NotAnObject {
                origin: origin.to_string(),
            });
        }

        Ok(Self(value))
    }

    pub fn bundled() -> Result<Self, SchemaError> {
        Self::parse(BUNDLED_SCHEMA, "bundled schema")
    }

    pub fn as_value(&self) -> &JsonValue {
        &self.0
    }
}
