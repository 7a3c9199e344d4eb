//! `$ref` and composition resolution.
//!
//! One resolver serves both generation and validation, so the two sides
//! agree on which pointers are reachable. Supported pointer prefixes:
//! `#/definitions/...` (OpenAPI 2.0), `#/components/schemas/...` (3.0.x),
//! and a generic `#/...` walk over the raw document for anything else.
//!
//! Cycle handling: traversals thread a visited-pointer set; revisiting a
//! pointer on the current resolution path fails with a circular-reference
//! error instead of recursing without bound.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::errors::{EngineError, EngineResult};
use crate::model::schema::{AdditionalProperties, SchemaKind, SchemaNode};
use crate::model::SpecDocument;

pub struct Resolver<'a> {
    doc: &'a SpecDocument,
}

impl<'a> Resolver<'a> {
    pub fn new(doc: &'a SpecDocument) -> Self {
        Self { doc }
    }

    /// Look up a single pointer and lower its target. Does not recurse;
    /// chains of references are followed by the traversal that owns the
    /// visited set.
    pub fn resolve(&self, pointer: &str) -> EngineResult<SchemaNode> {
        let raw = self.doc.raw();

        let target = if let Some(name) = pointer.strip_prefix("#/definitions/") {
            raw.get("definitions").and_then(|d| d.get(name))
        } else if let Some(name) = pointer.strip_prefix("#/components/schemas/") {
            raw.get("components")
                .and_then(|c| c.get("schemas"))
                .and_then(|s| s.get(name))
        } else if let Some(rest) = pointer.strip_prefix("#/") {
            walk(raw, rest)
        } else {
            None
        };

        target
            .map(SchemaNode::from_value)
            .ok_or_else(|| EngineError::unresolved_reference(pointer))
    }

    /// Shallow union of `properties` and `required` across `allOf` parts.
    /// On key collision the later entry overrides the earlier. This is a
    /// documented simplification, not a deep merge.
    pub fn merge_all_of(
        &self,
        parts: &[SchemaNode],
        visited: &mut BTreeSet<String>,
    ) -> EngineResult<SchemaNode> {
        let mut properties: Vec<(String, SchemaNode)> = Vec::new();
        let mut required: Vec<String> = Vec::new();
        let mut additional = AdditionalProperties::Denied;

        for part in parts {
            self.merge_part(part, visited, &mut properties, &mut required, &mut additional)?;
        }

        Ok(SchemaNode {
            kind: SchemaKind::Object {
                properties,
                required,
                additional,
            },
            enum_values: Vec::new(),
            example: None,
            default: None,
        })
    }

    fn merge_part(
        &self,
        part: &SchemaNode,
        visited: &mut BTreeSet<String>,
        properties: &mut Vec<(String, SchemaNode)>,
        required: &mut Vec<String>,
        additional: &mut AdditionalProperties,
    ) -> EngineResult<()> {
        match &part.kind {
            SchemaKind::Reference { pointer } => {
                if !visited.insert(pointer.clone()) {
                    return Err(EngineError::circular_reference(pointer));
                }
                let resolved = self.resolve(pointer)?;
                let out = self.merge_part(&resolved, visited, properties, required, additional);
                visited.remove(pointer);
                out
            }
            SchemaKind::AllOf(sub) => {
                for s in sub {
                    self.merge_part(s, visited, properties, required, additional)?;
                }
                Ok(())
            }
            SchemaKind::Object {
                properties: part_props,
                required: part_required,
                additional: part_additional,
            } => {
                for (name, schema) in part_props {
                    match properties.iter_mut().find(|(n, _)| n == name) {
                        Some((_, existing)) => *existing = schema.clone(),
                        None => properties.push((name.clone(), schema.clone())),
                    }
                }
                for name in part_required {
                    if !required.contains(name) {
                        required.push(name.clone());
                    }
                }
                if !matches!(part_additional, AdditionalProperties::Denied) {
                    *additional = part_additional.clone();
                }
                Ok(())
            }
            // Non-object parts contribute nothing to the shallow union.
            _ => Ok(()),
        }
    }

    /// `oneOf`/`anyOf`: the first alternative only. The evaluator never
    /// explores or unions other branches.
    pub fn pick_composition<'n>(&self, alternatives: &'n [SchemaNode]) -> Option<&'n SchemaNode> {
        alternatives.first()
    }
}

/// Generic JSON-pointer walk (RFC 6901 escaping) over the raw document.
fn walk<'v>(raw: &'v Value, rest: &str) -> Option<&'v Value> {
    let mut current = raw;
    for part in rest.split('/') {
        let key = part.replace("~1", "/").replace("~0", "~");
        current = match current {
            Value::Object(map) => map.get(&key)?,
            Value::Array(items) => items.get(key.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(extra: Value) -> SpecDocument {
        let mut raw = json!({
            "servers": [{ "url": "http://localhost" }],
            "paths": { "/x": { "get": {} } }
        });
        if let (Some(dst), Some(src)) = (raw.as_object_mut(), extra.as_object()) {
            for (k, v) in src {
                dst.insert(k.clone(), v.clone());
            }
        }
        SpecDocument::from_value(raw).unwrap()
    }

    #[test]
    fn resolves_definitions_pointer() {
        let d = doc(json!({
            "definitions": { "Pet": { "type": "string" } }
        }));
        let node = Resolver::new(&d).resolve("#/definitions/Pet").unwrap();
        assert!(matches!(node.kind, SchemaKind::String { .. }));
    }

    #[test]
    fn resolves_components_pointer() {
        let d = doc(json!({
            "components": { "schemas": { "Pet": { "type": "integer" } } }
        }));
        let node = Resolver::new(&d)
            .resolve("#/components/schemas/Pet")
            .unwrap();
        assert!(matches!(node.kind, SchemaKind::Integer(_)));
    }

    #[test]
    fn resolves_generic_pointer() {
        let d = doc(json!({
            "components": { "parameters": { "Page": { "type": "integer" } } }
        }));
        let node = Resolver::new(&d)
            .resolve("#/components/parameters/Page")
            .unwrap();
        assert!(matches!(node.kind, SchemaKind::Integer(_)));
    }

    #[test]
    fn dangling_pointer_fails() {
        let d = doc(json!({}));
        let err = Resolver::new(&d).resolve("#/definitions/Missing").unwrap_err();
        assert!(matches!(err, EngineError::UnresolvedReference { .. }));
    }

    #[test]
    fn reference_chain_cycle_is_detected_during_merge() {
        let d = doc(json!({
            "definitions": {
                "A": { "allOf": [{ "$ref": "#/definitions/B" }] },
                "B": { "allOf": [{ "$ref": "#/definitions/A" }] }
            }
        }));
        let resolver = Resolver::new(&d);
        let parts = vec![SchemaNode::from_value(&json!({ "$ref": "#/definitions/A" }))];
        let err = resolver
            .merge_all_of(&parts, &mut BTreeSet::new())
            .unwrap_err();
        assert!(matches!(err, EngineError::CircularReference { .. }));
    }

    #[test]
    fn merge_all_of_unions_properties_later_wins() {
        let d = doc(json!({}));
        let resolver = Resolver::new(&d);
        let parts = vec![
            SchemaNode::from_value(&json!({
                "type": "object",
                "properties": { "a": { "type": "string" }, "b": { "type": "string" } },
                "required": ["a"]
            })),
            SchemaNode::from_value(&json!({
                "type": "object",
                "properties": { "b": { "type": "integer" } },
                "required": ["b"]
            })),
        ];
        let merged = resolver
            .merge_all_of(&parts, &mut BTreeSet::new())
            .unwrap();
        let SchemaKind::Object {
            properties,
            required,
            ..
        } = merged.kind
        else {
            panic!("expected object");
        };
        assert_eq!(properties.len(), 2);
        let b = &properties.iter().find(|(n, _)| n == "b").unwrap().1;
        assert!(matches!(b.kind, SchemaKind::Integer(_)));
        assert_eq!(required, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn pick_composition_takes_first() {
        let d = doc(json!({}));
        let resolver = Resolver::new(&d);
        let alts = vec![
            SchemaNode::from_value(&json!({ "type": "string" })),
            SchemaNode::from_value(&json!({ "type": "integer" })),
        ];
        let picked = resolver.pick_composition(&alts).unwrap();
        assert!(matches!(picked.kind, SchemaKind::String { .. }));
    }
}
