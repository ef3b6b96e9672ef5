//! Declared response shapes for schema-constrained generation.
//!
//! A [`ResponseSchema`] is sent with a request to tell Gemini what JSON to
//! emit, and is consulted again on the way back to verify the top-level
//! envelope. That round trip is the only structural guarantee this layer
//! makes: the values inside are whatever the model produced.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Primitive and container types understood by the Gemini schema declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SchemaType {
    Object,
    Array,
    String,
    Number,
    Integer,
    Boolean,
}

/// A JSON shape declaration in the Gemini wire format.
///
/// # Example
///
/// ```
/// use led_scout::gemini::schema::ResponseSchema;
///
/// let schema = ResponseSchema::array(ResponseSchema::object([
///     ("id", ResponseSchema::string()),
///     ("score", ResponseSchema::number()),
/// ]));
/// let wire = serde_json::to_value(&schema).unwrap();
/// assert_eq!(wire["type"], "ARRAY");
/// assert_eq!(wire["items"]["properties"]["score"]["type"], "NUMBER");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseSchema {
    #[serde(rename = "type")]
    pub schema_type: SchemaType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, ResponseSchema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<ResponseSchema>>,
}

impl ResponseSchema {
    fn leaf(schema_type: SchemaType) -> Self {
        Self {
            schema_type,
            properties: None,
            items: None,
        }
    }

    pub fn string() -> Self {
        Self::leaf(SchemaType::String)
    }

    pub fn number() -> Self {
        Self::leaf(SchemaType::Number)
    }

    pub fn integer() -> Self {
        Self::leaf(SchemaType::Integer)
    }

    pub fn boolean() -> Self {
        Self::leaf(SchemaType::Boolean)
    }

    /// An object with the given named properties.
    pub fn object<I>(properties: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, ResponseSchema)>,
    {
        Self {
            schema_type: SchemaType::Object,
            properties: Some(
                properties
                    .into_iter()
                    .map(|(name, schema)| (name.to_string(), schema))
                    .collect(),
            ),
            items: None,
        }
    }

    /// An array whose elements all follow `items`.
    pub fn array(items: ResponseSchema) -> Self {
        Self {
            schema_type: SchemaType::Array,
            properties: None,
            items: Some(Box::new(items)),
        }
    }

    pub fn array_of_strings() -> Self {
        Self::array(Self::string())
    }

    /// Checks a parsed response against the declared top level only.
    ///
    /// Nested fields are deliberately not checked; consumers default
    /// missing fields rather than rejecting the whole payload.
    pub fn matches_root(&self, value: &Value) -> bool {
        match self.schema_type {
            SchemaType::Object => value.is_object(),
            SchemaType::Array => value.is_array(),
            SchemaType::String => value.is_string(),
            SchemaType::Number | SchemaType::Integer => value.is_number(),
            SchemaType::Boolean => value.is_boolean(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_object_declaration() {
        let schema = ResponseSchema::object([
            ("suggested_name", ResponseSchema::string()),
            ("fields_to_extract", ResponseSchema::array_of_strings()),
        ]);

        let wire = serde_json::to_value(&schema).unwrap();
        assert_eq!(wire["type"], "OBJECT");
        assert_eq!(wire["properties"]["suggested_name"]["type"], "STRING");
        assert_eq!(wire["properties"]["fields_to_extract"]["type"], "ARRAY");
        assert_eq!(
            wire["properties"]["fields_to_extract"]["items"]["type"],
            "STRING"
        );
    }

    #[test]
    fn leaves_omit_empty_containers() {
        let wire = serde_json::to_value(ResponseSchema::number()).unwrap();
        assert_eq!(wire, json!({"type": "NUMBER"}));
    }

    #[test]
    fn root_matching_distinguishes_envelopes() {
        let object = ResponseSchema::object([("a", ResponseSchema::string())]);
        assert!(object.matches_root(&json!({"a": "x"})));
        assert!(!object.matches_root(&json!([{"a": "x"}])));

        let array = ResponseSchema::array(ResponseSchema::object([]));
        assert!(array.matches_root(&json!([])));
        assert!(!array.matches_root(&json!({})));
    }
}
