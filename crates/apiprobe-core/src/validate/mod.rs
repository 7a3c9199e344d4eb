//! Structural validation of a response payload against a declared schema.
//!
//! Validation is a boolean judgement, never an error: a schema that cannot
//! be interpreted (dangling `$ref`, circular chain, no usable type) yields
//! `true`, since there is nothing to check. Unknown properties are ignored.
//! The same resolver used for generation serves validation, so both sides
//! agree on `definitions` and `components.schemas` pointers.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::model::schema::{SchemaKind, SchemaNode};
use crate::model::SpecDocument;
use crate::resolve::Resolver;

pub struct Validator<'a> {
    resolver: Resolver<'a>,
}

impl<'a> Validator<'a> {
    pub fn new(doc: &'a SpecDocument) -> Self {
        Self {
            resolver: Resolver::new(doc),
        }
    }

    /// True when the value structurally conforms to the schema.
    pub fn validate(&self, value: &Value, schema: &SchemaNode) -> bool {
        let mut visited = BTreeSet::new();
        self.validate_inner(value, schema, &mut visited)
    }

    fn validate_inner(
        &self,
        value: &Value,
        schema: &SchemaNode,
        visited: &mut BTreeSet<String>,
    ) -> bool {
        match &schema.kind {
            SchemaKind::Array { items, .. } => {
                let Some(arr) = value.as_array() else {
                    return false;
                };
                match items {
                    Some(items) => arr.iter().all(|item| self.validate_inner(item, items, visited)),
                    None => true,
                }
            }
            SchemaKind::Object {
                properties,
                required,
                ..
            } => {
                let Some(obj) = value.as_object() else {
                    return false;
                };
                if !required.iter().all(|name| obj.contains_key(name)) {
                    return false;
                }
                properties.iter().all(|(name, prop_schema)| match obj.get(name) {
                    Some(present) => self.validate_inner(present, prop_schema, visited),
                    None => true,
                })
            }
            SchemaKind::String { .. } => value.is_string(),
            SchemaKind::Integer(_) => is_whole_number(value),
            SchemaKind::Number(_) => value.is_number(),
            SchemaKind::Boolean => value.is_boolean(),
            SchemaKind::Reference { pointer } => {
                if !visited.insert(pointer.clone()) {
                    // Circular chain: nothing further to check.
                    return true;
                }
                let out = match self.resolver.resolve(pointer) {
                    Ok(resolved) => self.validate_inner(value, &resolved, visited),
                    // Dangling pointer: no usable schema.
                    Err(_) => true,
                };
                visited.remove(pointer);
                out
            }
            SchemaKind::AllOf(parts) => match self.resolver.merge_all_of(parts, visited) {
                Ok(merged) => self.validate_inner(value, &merged, visited),
                Err(_) => true,
            },
            SchemaKind::FirstOf { alternatives, .. } => {
                match self.resolver.pick_composition(alternatives) {
                    Some(first) => self.validate_inner(value, first, visited),
                    None => true,
                }
            }
            SchemaKind::Untyped => true,
        }
    }
}

/// `integer` requires a whole-number value, not a numeric string.
fn is_whole_number(value: &Value) -> bool {
    match value.as_f64() {
        Some(n) => n.fract() == 0.0,
        None => false,
    }
}
