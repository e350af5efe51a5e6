//! JSON Schema (Draft 2020-12) checks for wire inputs.
//!
//! Schemas are embedded from `<crate>/schemas/`. Only the first violation is
//! reported, with its JSON Pointer. Without the `schemaval` feature every check
//! passes and shape errors surface later from serde.

use serde_json::Value;

use crate::IoResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    PolicyConfig,
    Manifest,
}

impl SchemaKind {
    pub fn source(self) -> &'static str {
        match self {
            SchemaKind::PolicyConfig => include_str!("../schemas/policy_config.schema.json"),
            SchemaKind::Manifest => include_str!("../schemas/manifest.schema.json"),
        }
    }
}

#[cfg(feature = "schemaval")]
pub fn validate_value(kind: SchemaKind, instance: &Value) -> IoResult<()> {
    use jsonschema::{Draft, JSONSchema};

    use crate::IoError;

    let schema: Value = serde_json::from_str(kind.source())?;
    let compiled = JSONSchema::options()
        .with_draft(Draft::Draft202012)
        .compile(&schema)
        .map_err(|e| IoError::Schema { pointer: "#".into(), msg: format!("{kind:?} schema does not compile: {e}") })?;

    if let Err(mut errors) = compiled.validate(instance) {
        if let Some(err) = errors.next() {
            let ptr = err.instance_path.to_string();
            return Err(IoError::Schema {
                pointer: if ptr.is_empty() { "/".into() } else { ptr },
                msg: err.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(not(feature = "schemaval"))]
pub fn validate_value(_kind: SchemaKind, _instance: &Value) -> IoResult<()> {
    Ok(())
}

#[cfg(all(test, feature = "schemaval"))]
mod tests {
    use super::*;
    use crate::IoError;
    use serde_json::json;

    #[test]
    fn accepts_minimal_config() {
        let v = json!({"policies": [{"name": "TOD", "distance_column": "distance_to_light_rail",
            "rings": [{"distance_ft": 660, "height_stories": 8, "zone_label": "C-MX-8x"}]}]});
        validate_value(SchemaKind::PolicyConfig, &v).unwrap();
    }

    #[test]
    fn reports_pointer_of_first_violation() {
        let v = json!({"policies": [{"name": "TOD", "distance_column": "d",
            "rings": [{"distance_ft": "far", "height_stories": 8, "zone_label": "x"}]}]});
        match validate_value(SchemaKind::PolicyConfig, &v) {
            Err(IoError::Schema { pointer, .. }) => assert_eq!(pointer, "/policies/0/rings/0/distance_ft"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_tier() {
        let v = json!({"policies": [{"name": "TOD", "distance_column": "d",
            "rings": [{"distance_ft": 1, "height_stories": 8, "zone_label": "x", "density_tier": "extreme"}]}]});
        assert!(validate_value(SchemaKind::PolicyConfig, &v).is_err());
    }

    #[test]
    fn manifest_schema_compiles() {
        let v = json!({"parcels_path": "p.json", "policies_path": "c.json"});
        validate_value(SchemaKind::Manifest, &v).unwrap();
    }
}
