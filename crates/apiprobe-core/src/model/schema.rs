//! Recursive schema model lowered from an OpenAPI document.
//!
//! Every schema object in the document is lowered exactly once into a
//! [`SchemaNode`]: a tagged variant over the JSON kinds plus `$ref` and the
//! composition keywords, with exhaustive matching downstream instead of
//! ad-hoc property probing. Nodes are immutable after lowering.

use serde_json::Value;

/// Cross-kind annotations plus the kind-specific payload.
///
/// `enum_values`, `example` and `default` apply to every kind and take
/// precedence over type-specific synthesis, in that order.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    pub kind: SchemaKind,
    pub enum_values: Vec<Value>,
    pub example: Option<Value>,
    pub default: Option<Value>,
}

/// Which composition keyword produced a [`SchemaKind::FirstOf`] node.
///
/// Only the first alternative is ever evaluated; the distinction is kept
/// for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositionKeyword {
    OneOf,
    AnyOf,
}

/// Tagged schema kind.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaKind {
    String {
        format: Option<String>,
        pattern: Option<String>,
        min_length: Option<usize>,
        max_length: Option<usize>,
    },
    Number(NumericBounds),
    Integer(NumericBounds),
    Boolean,
    Array {
        items: Option<Box<SchemaNode>>,
        min_items: Option<usize>,
        max_items: Option<usize>,
    },
    Object {
        /// Declared properties in declaration order.
        properties: Vec<(String, SchemaNode)>,
        required: Vec<String>,
        additional: AdditionalProperties,
    },
    /// A `$ref` pointer into the same document.
    Reference {
        pointer: String,
    },
    /// `allOf`: all parts contribute; merged shallowly by the resolver.
    AllOf(Vec<SchemaNode>),
    /// `oneOf`/`anyOf`: only the first alternative is evaluated.
    FirstOf {
        keyword: CompositionKeyword,
        alternatives: Vec<SchemaNode>,
    },
    /// A schema with no recognizable type. Synthesis falls back to
    /// `example`/`default`/null; validation has nothing to check.
    Untyped,
}

/// Numeric constraints shared by `number` and `integer`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NumericBounds {
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub exclusive_minimum: Option<f64>,
    pub exclusive_maximum: Option<f64>,
    pub multiple_of: Option<f64>,
}

/// The three shapes `additionalProperties` takes in a document.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AdditionalProperties {
    #[default]
    Denied,
    Allowed,
    Schema(Box<SchemaNode>),
}

impl SchemaNode {
    /// Lower a raw schema object into a node. Total: anything that is not a
    /// recognizable schema becomes [`SchemaKind::Untyped`].
    pub fn from_value(v: &Value) -> SchemaNode {
        let Some(obj) = v.as_object() else {
            return SchemaNode {
                kind: SchemaKind::Untyped,
                enum_values: Vec::new(),
                example: None,
                default: None,
            };
        };

        let enum_values = obj
            .get("enum")
            .and_then(Value::as_array)
            .map(|a| a.to_vec())
            .unwrap_or_default();
        let example = obj.get("example").cloned();
        let default = obj.get("default").cloned();

        let kind = if let Some(pointer) = obj.get("$ref").and_then(Value::as_str) {
            SchemaKind::Reference {
                pointer: pointer.to_string(),
            }
        } else if let Some(parts) = obj.get("allOf").and_then(Value::as_array) {
            SchemaKind::AllOf(parts.iter().map(SchemaNode::from_value).collect())
        } else if let Some(parts) = obj.get("oneOf").and_then(Value::as_array) {
            SchemaKind::FirstOf {
                keyword: CompositionKeyword::OneOf,
                alternatives: parts.iter().map(SchemaNode::from_value).collect(),
            }
        } else if let Some(parts) = obj.get("anyOf").and_then(Value::as_array) {
            SchemaKind::FirstOf {
                keyword: CompositionKeyword::AnyOf,
                alternatives: parts.iter().map(SchemaNode::from_value).collect(),
            }
        } else {
            match obj.get("type").and_then(Value::as_str) {
                Some("string") => SchemaKind::String {
                    format: obj.get("format").and_then(Value::as_str).map(String::from),
                    pattern: obj.get("pattern").and_then(Value::as_str).map(String::from),
                    min_length: read_usize(obj.get("minLength")),
                    max_length: read_usize(obj.get("maxLength")),
                },
                Some("number") => SchemaKind::Number(read_bounds(obj)),
                Some("integer") => SchemaKind::Integer(read_bounds(obj)),
                Some("boolean") => SchemaKind::Boolean,
                Some("array") => SchemaKind::Array {
                    items: obj.get("items").map(|i| Box::new(SchemaNode::from_value(i))),
                    min_items: read_usize(obj.get("minItems")),
                    max_items: read_usize(obj.get("maxItems")),
                },
                Some("object") => read_object(obj),
                // A typeless schema carrying properties is treated as an object.
                _ if obj.contains_key("properties") => read_object(obj),
                _ => SchemaKind::Untyped,
            }
        };

        SchemaNode {
            kind,
            enum_values,
            example,
            default,
        }
    }
}

fn read_object(obj: &serde_json::Map<String, Value>) -> SchemaKind {
    let properties = obj
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| {
            props
                .iter()
                .map(|(k, v)| (k.clone(), SchemaNode::from_value(v)))
                .collect()
        })
        .unwrap_or_default();

    let required = obj
        .get("required")
        .and_then(Value::as_array)
        .map(|a| {
            a.iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    let additional = match obj.get("additionalProperties") {
        Some(Value::Bool(true)) => AdditionalProperties::Allowed,
        Some(v) if v.is_object() => {
            AdditionalProperties::Schema(Box::new(SchemaNode::from_value(v)))
        }
        _ => AdditionalProperties::Denied,
    };

    SchemaKind::Object {
        properties,
        required,
        additional,
    }
}

fn read_bounds(obj: &serde_json::Map<String, Value>) -> NumericBounds {
    let minimum = obj.get("minimum").and_then(Value::as_f64);
    let maximum = obj.get("maximum").and_then(Value::as_f64);

    // OpenAPI 2.0 uses boolean exclusive flags qualifying minimum/maximum;
    // 3.x drafts carry the exclusive bound as a number.
    let exclusive_minimum = match obj.get("exclusiveMinimum") {
        Some(Value::Bool(true)) => minimum,
        Some(v) => v.as_f64(),
        None => None,
    };
    let exclusive_maximum = match obj.get("exclusiveMaximum") {
        Some(Value::Bool(true)) => maximum,
        Some(v) => v.as_f64(),
        None => None,
    };

    NumericBounds {
        minimum: if matches!(obj.get("exclusiveMinimum"), Some(Value::Bool(true))) {
            None
        } else {
            minimum
        },
        maximum: if matches!(obj.get("exclusiveMaximum"), Some(Value::Bool(true))) {
            None
        } else {
            maximum
        },
        exclusive_minimum,
        exclusive_maximum,
        multiple_of: obj.get("multipleOf").and_then(Value::as_f64),
    }
}

fn read_usize(v: Option<&Value>) -> Option<usize> {
    v.and_then(Value::as_u64).map(|n| n as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lowers_string_with_constraints() {
        let node = SchemaNode::from_value(&json!({
            "type": "string", "format": "email", "minLength": 3, "maxLength": 40
        }));
        match node.kind {
            SchemaKind::String {
                format,
                min_length,
                max_length,
                ..
            } => {
                assert_eq!(format.as_deref(), Some("email"));
                assert_eq!(min_length, Some(3));
                assert_eq!(max_length, Some(40));
            }
            other => panic!("expected string kind, got {other:?}"),
        }
    }

    #[test]
    fn lowers_ref() {
        let node = SchemaNode::from_value(&json!({ "$ref": "#/definitions/Pet" }));
        assert_eq!(
            node.kind,
            SchemaKind::Reference {
                pointer: "#/definitions/Pet".to_string()
            }
        );
    }

    #[test]
    fn typeless_properties_become_object() {
        let node = SchemaNode::from_value(&json!({
            "properties": { "id": { "type": "integer" } },
            "required": ["id"]
        }));
        match node.kind {
            SchemaKind::Object {
                properties,
                required,
                ..
            } => {
                assert_eq!(properties.len(), 1);
                assert_eq!(required, vec!["id".to_string()]);
            }
            other => panic!("expected object kind, got {other:?}"),
        }
    }

    #[test]
    fn boolean_exclusive_minimum_is_folded() {
        let node = SchemaNode::from_value(&json!({
            "type": "integer", "minimum": 5, "exclusiveMinimum": true
        }));
        match node.kind {
            SchemaKind::Integer(bounds) => {
                assert_eq!(bounds.minimum, None);
                assert_eq!(bounds.exclusive_minimum, Some(5.0));
            }
            other => panic!("expected integer kind, got {other:?}"),
        }
    }

    #[test]
    fn enum_and_example_are_preserved() {
        let node = SchemaNode::from_value(&json!({
            "type": "string", "enum": ["a", "b"], "example": "b"
        }));
        assert_eq!(node.enum_values, vec![json!("a"), json!("b")]);
        assert_eq!(node.example, Some(json!("b")));
    }

    #[test]
    fn non_object_is_untyped() {
        let node = SchemaNode::from_value(&json!(true));
        assert_eq!(node.kind, SchemaKind::Untyped);
    }
}
