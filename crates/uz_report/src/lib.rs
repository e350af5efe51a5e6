//! uz_report: offline report model + renderers (JSON/HTML).
//!
//! - Input is the parsed `result.json` (`serde_json::Value`), so this crate does
//!   not depend on the pipeline's concrete types.
//! - No I/O. Callers read the artifact and write the rendered string.
//! - Numbers are preformatted here (thousands separators, one-decimal acres) so
//!   both renderers show identical text.

#![deny(unsafe_code)]

use std::fmt;

use serde::Serialize;
use serde_json::Value;

#[cfg(feature = "render_html")]
mod render_html;
#[cfg(feature = "render_json")]
mod render_json;

#[cfg(feature = "render_html")]
pub use render_html::render_html;
#[cfg(feature = "render_json")]
pub use render_json::render_json;

pub type ResultArtifact = Value;

// ===== Errors =====

#[derive(Debug)]
pub enum ReportError {
    Template(String),
    MissingField(&'static str),
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportError::Template(m) => write!(f, "template error: {m}"),
            ReportError::MissingField(p) => write!(f, "result is missing {p}"),
        }
    }
}

impl std::error::Error for ReportError {}

// ===== Model =====

#[derive(Clone, Debug, Serialize)]
pub struct ReportModel {
    pub cover: SectionCover,
    pub totals: SectionTotals,
    pub groups: Vec<Row>,
    pub tiers: Vec<Row>,
    pub passes: Vec<PassRow>,
    pub warnings: Vec<String>,
    pub integrity: SectionIntegrity,
}

#[derive(Clone, Debug, Serialize)]
pub struct SectionCover {
    pub title: String,
    /// "manifest <id>", "preset <name>" or "paths".
    pub source: String,
    pub policies: Vec<String>,
    pub exclude_unlikely: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct SectionTotals {
    pub parcels: String,
    pub units: String,
    pub baseline_units: String,
    pub additional_units: String,
    pub acres: String,
}

/// One line of a breakdown table.
#[derive(Clone, Debug, Serialize)]
pub struct Row {
    pub name: String,
    pub parcels: String,
    pub units: String,
    pub acres: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct PassRow {
    pub policy: String,
    pub candidates: String,
    pub qualified: String,
    pub excluded: String,
    pub won: String,
    pub rings: Vec<Row>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SectionIntegrity {
    pub result_id: String,
    pub parcels_sha256: String,
    pub policies_sha256: String,
    pub engine: String,
}

// ===== API =====

const TIER_ORDER: [&str; 3] = ["high", "med", "low"];

/// Build the report model from a result artifact (pure, offline).
///
/// `id`, `summary` and `inputs` are required; everything else degrades to
/// empty sections.
pub fn build_model(result: &ResultArtifact) -> Result<ReportModel, ReportError> {
    let result_id = get_str(result, "/id").ok_or(ReportError::MissingField("/id"))?;
    let summary = result.pointer("/summary").ok_or(ReportError::MissingField("/summary"))?;
    let inputs = result.pointer("/inputs").ok_or(ReportError::MissingField("/inputs"))?;

    let source = match get_str(inputs, "/source").unwrap_or("paths") {
        "manifest" => format!("manifest {}", get_str(inputs, "/manifest_id").unwrap_or("(unnamed)")),
        "preset" => format!("preset {}", get_str(inputs, "/preset").unwrap_or("(unknown)")),
        other => other.to_string(),
    };
    let policies = result
        .pointer("/config/policies")
        .and_then(Value::as_array)
        .map(|ps| ps.iter().filter_map(|p| get_str(p, "/name").map(str::to_string)).collect())
        .unwrap_or_default();
    let cover = SectionCover {
        title: "Upzoning capacity estimate".to_string(),
        source,
        policies,
        exclude_unlikely: result.pointer("/config/exclude_unlikely").and_then(Value::as_bool).unwrap_or(true),
    };

    let totals = SectionTotals {
        parcels: thousands(get_u64(summary, "/total_parcels")),
        units: thousands(get_u64(summary, "/total_units")),
        baseline_units: thousands(get_u64(summary, "/total_baseline_units")),
        additional_units: thousands(get_u64(summary, "/additional_units")),
        acres: one_decimal(get_f64(summary, "/total_acres")),
    };

    let groups = summary
        .pointer("/by_group")
        .and_then(Value::as_object)
        .map(|m| m.iter().map(|(k, v)| totals_row(k, v)).collect())
        .unwrap_or_default();
    let tiers = TIER_ORDER
        .iter()
        .filter_map(|t| summary.pointer(&format!("/by_tier/{t}")).map(|v| totals_row(t, v)))
        .collect();

    let passes = result
        .pointer("/passes")
        .and_then(Value::as_array)
        .map(|ps| ps.iter().map(pass_row).collect())
        .unwrap_or_default();

    let skipped = get_u64(inputs, "/skipped_records");
    let mut warnings: Vec<String> = Vec::new();
    if skipped > 0 {
        warnings.push(format!("{} malformed parcel record(s) skipped at load", thousands(skipped)));
    }
    let issues: Vec<String> = result
        .pointer("/validation/issues")
        .and_then(Value::as_array)
        .map(|is| {
            is.iter()
                .map(|i| {
                    format!(
                        "{} at {}: {}",
                        get_str(i, "/code").unwrap_or("?"),
                        get_str(i, "/where").unwrap_or("/"),
                        get_str(i, "/message").unwrap_or("")
                    )
                })
                .collect()
        })
        .unwrap_or_default();
    warnings.extend(issues);

    let engine = format!(
        "{}/{} v{} ({})",
        get_str(result, "/engine/vendor").unwrap_or("uz"),
        get_str(result, "/engine/name").unwrap_or("uz-engine"),
        get_str(result, "/engine/version").unwrap_or("0"),
        get_str(result, "/engine/build").unwrap_or("dev"),
    );
    let integrity = SectionIntegrity {
        result_id: result_id.to_string(),
        parcels_sha256: get_str(inputs, "/parcels_sha256").unwrap_or("").to_string(),
        policies_sha256: get_str(inputs, "/policies_sha256").unwrap_or("").to_string(),
        engine,
    };

    Ok(ReportModel { cover, totals, groups, tiers, passes, warnings, integrity })
}

fn totals_row(name: &str, v: &Value) -> Row {
    Row {
        name: name.to_string(),
        parcels: thousands(get_u64(v, "/parcels")),
        units: thousands(get_u64(v, "/units")),
        acres: one_decimal(get_f64(v, "/acres")),
    }
}

fn pass_row(p: &Value) -> PassRow {
    let excluded: u64 = ["/excluded", "/defects"]
        .iter()
        .filter_map(|ptr| p.pointer(ptr).and_then(Value::as_object))
        .flat_map(|m| m.values().filter_map(Value::as_u64))
        .sum();
    let rings = p
        .pointer("/rings")
        .and_then(Value::as_array)
        .map(|rs| {
            rs.iter()
                .map(|r| Row {
                    name: format!(
                        "{} (≤ {} ft, {} stories)",
                        get_str(r, "/ring").unwrap_or("Ring"),
                        get_f64(r, "/distance_ft"),
                        get_f64(r, "/height_stories")
                    ),
                    parcels: thousands(get_u64(r, "/parcels")),
                    units: thousands(get_u64(r, "/units")),
                    acres: String::new(),
                })
                .collect()
        })
        .unwrap_or_default();
    PassRow {
        policy: get_str(p, "/policy").unwrap_or("?").to_string(),
        candidates: thousands(get_u64(p, "/candidates")),
        qualified: thousands(get_u64(p, "/qualified")),
        excluded: thousands(excluded),
        won: thousands(get_u64(p, "/inserted") + get_u64(p, "/replaced")),
        rings,
    }
}

// ===== Helpers =====

fn get_str<'a>(root: &'a Value, ptr: &str) -> Option<&'a str> {
    root.pointer(ptr).and_then(Value::as_str)
}

fn get_u64(root: &Value, ptr: &str) -> u64 {
    root.pointer(ptr).and_then(Value::as_u64).unwrap_or(0)
}

fn get_f64(root: &Value, ptr: &str) -> f64 {
    root.pointer(ptr).and_then(Value::as_f64).unwrap_or(0.0)
}

/// `1234567` → `"1,234,567"`.
pub fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn one_decimal(x: f64) -> String {
    if x.is_finite() {
        format!("{x:.1}")
    } else {
        "—".to_string()
    }
}

#[cfg(test)]
pub(crate) fn sample_result() -> Value {
    serde_json::json!({
        "id": format!("RES:{}", "a".repeat(64)),
        "engine": {"vendor": "uz", "name": "uz-engine", "version": "0.1.0", "build": "dev"},
        "inputs": {"source": "preset", "preset": "ballot-measure", "parcel_count": 3, "skipped_records": 2,
                   "parcels_sha256": "b".repeat(64), "policies_sha256": "c".repeat(64)},
        "config": {"policies": [{"name": "TOD"}, {"name": "POD-Regional"}], "exclude_unlikely": true},
        "validation": {"pass": true, "issues": [
            {"severity": "warning", "code": "Policy.NoRings", "message": "policy X has no rings", "where": "/policies/1"}
        ]},
        "passes": [{
            "policy": "TOD", "candidates": 3, "qualified": 2,
            "excluded": {"Exclude.Sliver": 1}, "defects": {},
            "inserted": 2, "replaced": 0, "kept": 0,
            "rings": [{"ring": "Ring 1", "distance_ft": 660.0, "height_stories": 8.0, "parcels": 2, "units": 1520}]
        }],
        "summary": {
            "total_parcels": 2, "total_units": 1520, "total_baseline_units": 330,
            "additional_units": 1190, "total_acres": 9.5,
            "by_group": {"TOD": {"parcels": 2, "units": 1520, "acres": 9.5}},
            "by_tier": {"high": {"parcels": 2, "units": 1520, "acres": 9.5}}
        },
        "entries": []
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_formatting() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1000), "1,000");
        assert_eq!(thousands(1234567), "1,234,567");
        assert_eq!(one_decimal(9.46), "9.5");
        assert_eq!(one_decimal(f64::NAN), "—");
    }

    #[test]
    fn builds_model_from_result() {
        let m = build_model(&sample_result()).unwrap();
        assert_eq!(m.cover.source, "preset ballot-measure");
        assert_eq!(m.cover.policies, vec!["TOD", "POD-Regional"]);
        assert_eq!(m.totals.units, "1,520");
        assert_eq!(m.totals.additional_units, "1,190");
        assert_eq!(m.groups[0].name, "TOD");
        assert_eq!(m.tiers.len(), 1);
        assert_eq!(m.passes[0].excluded, "1");
        assert_eq!(m.passes[0].rings[0].name, "Ring 1 (≤ 660 ft, 8 stories)");
        assert_eq!(m.warnings.len(), 2);
        assert_eq!(m.warnings[0], "2 malformed parcel record(s) skipped at load");
        assert!(m.integrity.result_id.starts_with("RES:"));
    }

    #[test]
    fn missing_summary_is_an_error() {
        let v = serde_json::json!({"id": "RES:x", "inputs": {}});
        assert!(matches!(build_model(&v), Err(ReportError::MissingField("/summary"))));
    }
}
