//! Loader: read local JSON inputs (manifest → parcels → policy configuration),
//! validate, normalize, and return a typed `LoadedContext` for the pipeline.
//! No network I/O.
//!
//! Parcel inputs may be any of:
//! - a JSON array of parcel records;
//! - `{"parcels": [...]}`;
//! - a GeoJSON `FeatureCollection` (record = `properties`, `geometry` feeds compactness).
//!
//! Flat `distance_to_*` keys are folded into the record's `distances` map.
//! A record that does not deserialize is logged and skipped; only container
//! shape and duplicate ids fail the load.

#![forbid(unsafe_code)]

use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use uz_core::{
    geometry::polsby_popper,
    parcel::{Parcel, COMPACT_FALLBACK, DISTANCE_PREFIX},
    policy::{validate_domains, EvaluationConfig},
};

use crate::{manifest, schema, IoError, IoResult};

/// Upper bound on any single input file.
pub const MAX_INPUT_BYTES: u64 = 512 * 1024 * 1024;

/// Log code for a parcel record dropped at load.
pub const MALFORMED_RECORD: &str = "Parcel.Malformed";
/// Log code for geometry that cannot be scored.
pub const MALFORMED_GEOMETRY: &str = "Parcel.MalformedGeometry";

/// Canonical-JSON sha256 of each input file, recorded in the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputDigests {
    pub parcels_sha256: String,
    pub policies_sha256: String,
}

/// Loaded, validated, normalized context for the pipeline.
#[derive(Debug, Clone)]
pub struct LoadedContext {
    pub parcels: Vec<Parcel>,
    pub config: EvaluationConfig,
    pub digests: InputDigests,
    pub manifest_id: Option<String>,
    /// Parcel records dropped as malformed.
    pub skipped_records: usize,
}

/// Parcels accepted from one input, plus the count of dropped records.
#[derive(Debug, Clone, PartialEq)]
pub struct ParcelRows {
    pub parcels: Vec<Parcel>,
    pub skipped: usize,
}

// ----------------------------- Orchestration -----------------------------

/// Manifest → (verify digests) → parcels + policies.
pub fn load_all_from_manifest(path: &Path) -> IoResult<LoadedContext> {
    let resolved = manifest::load_verify_manifest(path)?;
    let mut ctx = load_all(&resolved.parcels_path, &resolved.policies_path)?;
    ctx.manifest_id = resolved.id;
    Ok(ctx)
}

/// Load both inputs from explicit paths.
pub fn load_all(parcels_path: &Path, policies_path: &Path) -> IoResult<LoadedContext> {
    let parcels_raw = read_json_value_with_limits(parcels_path)?;
    let policies_raw = read_json_value_with_limits(policies_path)?;

    let digests = InputDigests {
        parcels_sha256: crate::try_sha256_canonical(&parcels_raw)?,
        policies_sha256: crate::try_sha256_canonical(&policies_raw)?,
    };

    let config = policies_from_value(policies_raw)?;
    let ParcelRows { parcels, skipped } = parcels_from_value(parcels_raw)?;
    info!(
        parcels = parcels.len(),
        skipped,
        policies = config.policies.len(),
        parcels_path = %parcels_path.display(),
        policies_path = %policies_path.display(),
        "inputs loaded"
    );

    Ok(LoadedContext { parcels, config, digests, manifest_id: None, skipped_records: skipped })
}

// ----------------------------- Value loaders -----------------------------

/// Schema → serde → domain checks.
pub fn policies_from_value(v: Value) -> IoResult<EvaluationConfig> {
    schema::validate_value(schema::SchemaKind::PolicyConfig, &v)?;
    let cfg: EvaluationConfig = serde_json::from_value(v)?;
    validate_domains(&cfg).map_err(|e| IoError::Invalid(e.to_string()))?;
    Ok(cfg)
}

/// Accept any supported parcel container; parcels come back sorted ↑ parcel_id.
pub fn parcels_from_value(v: Value) -> IoResult<ParcelRows> {
    let records: Vec<Record> = match v {
        Value::Array(items) => plain_records(items, ""),
        Value::Object(mut obj) => {
            let is_feature_collection = obj.get("type").and_then(Value::as_str) == Some("FeatureCollection");
            if is_feature_collection {
                feature_records(obj.remove("features"))?
            } else if let Some(Value::Array(items)) = obj.remove("parcels") {
                plain_records(items, "/parcels")
            } else {
                return Err(IoError::Json {
                    pointer: "/".into(),
                    msg: "expected an array, {\"parcels\": [...]}, or a FeatureCollection".into(),
                });
            }
        }
        _ => {
            return Err(IoError::Json { pointer: "/".into(), msg: "parcel input must be an array or object".into() })
        }
    };

    let mut parcels = Vec::with_capacity(records.len());
    let mut skipped = 0;
    let mut seen = BTreeSet::new();
    for (pointer, record, geometry) in records {
        let p = match parcel_from_record(record, geometry.as_ref(), &pointer) {
            Ok(p) => p,
            Err(e) => {
                warn!(at = %pointer, code = MALFORMED_RECORD, "record skipped: {e}");
                skipped += 1;
                continue;
            }
        };
        if !seen.insert(p.parcel_id.clone()) {
            return Err(IoError::Invalid(format!("duplicate parcel_id {} at {pointer}", p.parcel_id)));
        }
        parcels.push(p);
    }
    parcels.sort_by(|a, b| a.parcel_id.cmp(&b.parcel_id));
    Ok(ParcelRows { parcels, skipped })
}

/// (JSON pointer, raw record, optional GeoJSON geometry)
type Record = (String, Value, Option<Value>);

fn plain_records(items: Vec<Value>, prefix: &str) -> Vec<Record> {
    items.into_iter().enumerate().map(|(i, it)| (format!("{prefix}/{i}"), it, None)).collect()
}

fn feature_records(features: Option<Value>) -> IoResult<Vec<Record>> {
    let Some(Value::Array(features)) = features else {
        return Err(IoError::Json { pointer: "/features".into(), msg: "FeatureCollection without features array".into() });
    };
    Ok(features
        .into_iter()
        .enumerate()
        .map(|(i, f)| match f {
            Value::Object(mut feat) => {
                let geometry = feat.remove("geometry").filter(|g| !g.is_null());
                let props = match feat.remove("properties") {
                    Some(Value::Null) | None => Value::Object(Map::new()),
                    Some(other) => other,
                };
                (format!("/features/{i}/properties"), props, geometry)
            }
            other => (format!("/features/{i}"), other, None),
        })
        .collect())
}

/// Fold flat distance columns, derive compactness from geometry when absent, then deserialize.
fn parcel_from_record(record: Value, geometry: Option<&Value>, pointer: &str) -> IoResult<Parcel> {
    let Value::Object(mut record) = record else {
        return Err(IoError::Json { pointer: pointer.to_string(), msg: "parcel record must be an object".into() });
    };
    // assessor schedule numbers often arrive as JSON integers
    if let Some(n) = record.get("parcel_id").and_then(Value::as_u64) {
        record.insert("parcel_id".into(), Value::String(n.to_string()));
    }

    let flat: Vec<String> = record.keys().filter(|k| k.starts_with(DISTANCE_PREFIX)).cloned().collect();
    if !flat.is_empty() {
        let mut distances = match record.remove("distances") {
            Some(Value::Object(m)) => m,
            Some(Value::Null) | None => Map::new(),
            Some(_) => {
                return Err(IoError::Json { pointer: format!("{pointer}/distances"), msg: "distances must be an object".into() })
            }
        };
        for k in flat {
            if let Some(v) = record.remove(&k) {
                distances.entry(k).or_insert(v);
            }
        }
        record.insert("distances".into(), Value::Object(distances));
    }

    let has_score = record.get("compactness_score").is_some_and(|v| !v.is_null());
    if !has_score {
        let score = match geometry.map(compactness_from_geometry) {
            Some(Ok(score)) => score,
            Some(Err(msg)) => {
                warn!(at = %pointer, code = MALFORMED_GEOMETRY, "{msg}; assuming compact");
                Some(COMPACT_FALLBACK)
            }
            None => None,
        };
        if let Some(score) = score {
            record.insert("compactness_score".into(), Value::from(score));
        }
    }

    serde_json::from_value(Value::Object(record))
        .map_err(|e| IoError::Json { pointer: pointer.to_string(), msg: e.to_string() })
}

/// Polsby–Popper over the outer ring of the first polygon.
///
/// `Ok(None)` for geometry types without an area. Any malformed vertex
/// rejects the whole geometry rather than scoring a smaller polygon.
pub fn compactness_from_geometry(geometry: &Value) -> Result<Option<f64>, &'static str> {
    let kind = geometry.get("type").and_then(Value::as_str).ok_or("geometry without a type")?;
    let coords = geometry.get("coordinates").ok_or("geometry without coordinates")?;
    let outer = match kind {
        "Polygon" => coords.get(0),
        "MultiPolygon" => coords.get(0).and_then(|poly| poly.get(0)),
        other => {
            debug!(geometry_type = other, "no compactness for geometry type");
            return Ok(None);
        }
    };
    let outer = outer.and_then(Value::as_array).ok_or("coordinates do not hold a linear ring")?;
    let ring = outer
        .iter()
        .map(|pt| match pt.as_array().map(Vec::as_slice) {
            Some([x, y, ..]) => Some([x.as_f64()?, y.as_f64()?]),
            _ => None,
        })
        .collect::<Option<Vec<[f64; 2]>>>()
        .ok_or("vertex is not an [x, y] number pair")?;
    Ok(Some(polsby_popper(&ring)))
}

// ----------------------------- Reading -----------------------------

/// Read a JSON file with a hard byte limit.
pub fn read_json_value_with_limits(path: &Path) -> IoResult<Value> {
    let f = File::open(path).map_err(|e| IoError::Path(format!("{}: {e}", path.display())))?;
    let mut buf = Vec::new();
    f.take(MAX_INPUT_BYTES + 1).read_to_end(&mut buf)?;
    if buf.len() as u64 > MAX_INPUT_BYTES {
        return Err(IoError::Limit { path: path.display().to_string(), limit: MAX_INPUT_BYTES });
    }
    serde_json::from_slice(&buf).map_err(|e| IoError::Json { pointer: "/".into(), msg: format!("{}: {e}", path.display()) })
}
