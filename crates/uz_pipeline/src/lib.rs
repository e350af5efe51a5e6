//! uz_pipeline: deterministic run surface
//! (load → enrich → validate → evaluate policies → merge → summarize → result).
//!
//! File formats, schemas and hashing live in `uz_io`; the per-parcel math lives
//! in `uz_algo`. Everything here is request-scoped: the registry and the zoning
//! cache are created per run and dropped with it.

use std::fmt;
use std::path::Path;

use serde::Serialize;
use tracing::{info, info_span, warn};

use uz_core::ids::ResultId;
use uz_core::parcel::Parcel;
use uz_core::policy::EvaluationConfig;
use uz_io::{hasher, loader::LoadedContext, IoError};

pub mod evaluate;
pub mod load;
pub mod presets;
pub mod registry;
pub mod summarize;
pub mod validate;

pub use evaluate::{evaluate_all, evaluate_policy, Evaluation, PolicyPassStats, RingStats};
pub use registry::{MergeOutcome, Registry, RegistryEntry};
pub use summarize::{summarize, Summary, Totals};
pub use validate::{validate, Severity, ValidationIssue, ValidationReport};

/// Engine identifiers echoed into every result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineMeta {
    pub vendor: String,
    pub name: String,
    pub version: String,
    pub build: String,
}

/// Identifiers of this build.
pub fn engine_identifiers() -> EngineMeta {
    EngineMeta {
        vendor: "uz".to_string(),
        name: "uz-engine".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        build: option_env!("UZ_BUILD_ID").unwrap_or("dev").to_string(),
    }
}

/// Where the inputs came from and their canonical digests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputsEcho {
    /// "manifest" | "paths" | "preset"
    pub source: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
    pub parcel_count: usize,
    /// Parcel records dropped at load as malformed.
    pub skipped_records: usize,
    pub parcels_sha256: String,
    pub policies_sha256: String,
}

/// Inputs are already loaded and schema-checked by `uz_io`.
#[derive(Debug, Clone)]
pub struct PipelineCtx {
    pub parcels: Vec<Parcel>,
    pub config: EvaluationConfig,
    pub inputs: InputsEcho,
    pub engine_meta: EngineMeta,
}

impl PipelineCtx {
    fn from_loaded(loaded: LoadedContext, source: &'static str) -> Self {
        PipelineCtx {
            inputs: InputsEcho {
                source,
                manifest_id: loaded.manifest_id,
                preset: None,
                parcel_count: loaded.parcels.len(),
                skipped_records: loaded.skipped_records,
                parcels_sha256: loaded.digests.parcels_sha256,
                policies_sha256: loaded.digests.policies_sha256,
            },
            parcels: loaded.parcels,
            config: loaded.config,
            engine_meta: engine_identifiers(),
        }
    }
}

/// Everything in the result except its own id.
#[derive(Debug, Clone, Serialize)]
pub struct ResultBody {
    pub engine: EngineMeta,
    pub inputs: InputsEcho,
    pub config: EvaluationConfig,
    pub validation: ValidationReport,
    pub passes: Vec<PolicyPassStats>,
    pub summary: Summary,
    /// Ascending parcel id.
    pub entries: Vec<RegistryEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResultDoc {
    /// "RES:" + sha256 of the canonical body.
    pub id: ResultId,
    #[serde(flatten)]
    pub body: ResultBody,
}

#[derive(Debug, Clone)]
pub struct PipelineOutputs {
    pub result: ResultDoc,
}

/// Single error surface for the pipeline orchestration.
#[derive(Debug)]
pub enum PipelineError {
    Io(String),
    Schema(String),
    Manifest(String),
    Config(String),
    Validation(ValidationReport),
    Integrity(String),
    Build(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Io(m) => write!(f, "io: {m}"),
            PipelineError::Schema(m) => write!(f, "schema: {m}"),
            PipelineError::Manifest(m) => write!(f, "manifest: {m}"),
            PipelineError::Config(m) => write!(f, "config: {m}"),
            PipelineError::Validation(r) => {
                write!(f, "validation failed with {} error(s)", r.errors().count())
            }
            PipelineError::Integrity(m) => write!(f, "integrity: {m}"),
            PipelineError::Build(m) => write!(f, "build: {m}"),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<IoError> for PipelineError {
    fn from(e: IoError) -> Self {
        use PipelineError::*;
        match e {
            IoError::Path(m) => Io(m),
            IoError::Limit { .. } => Io(e.to_string()),
            IoError::Json { pointer, msg } => Schema(format!("json {pointer}: {msg}")),
            IoError::Schema { pointer, msg } => Schema(format!("{pointer}: {msg}")),
            IoError::Manifest(m) => Manifest(m),
            IoError::Invalid(m) => Config(m),
            IoError::Hash(m) => Integrity(m),
        }
    }
}

// -------------------------------------- Context builders --------------------------------------

pub fn ctx_from_manifest(path: &Path) -> Result<PipelineCtx, PipelineError> {
    Ok(PipelineCtx::from_loaded(load::load_from_manifest(path)?, "manifest"))
}

pub fn ctx_from_paths(parcels: &Path, policies: &Path) -> Result<PipelineCtx, PipelineError> {
    Ok(PipelineCtx::from_loaded(load::load_from_paths(parcels, policies)?, "paths"))
}

/// Parcels from disk, configuration from a built-in preset. The policies digest
/// covers the preset's canonical JSON.
pub fn ctx_from_preset(parcels_path: &Path, preset: &str) -> Result<PipelineCtx, PipelineError> {
    let config = presets::preset_by_name(preset)?;
    let raw = uz_io::loader::read_json_value_with_limits(parcels_path)?;
    let parcels_sha256 = uz_io::try_sha256_canonical(&raw)?;
    let policies_sha256 = uz_io::try_sha256_canonical(&config)?;
    let uz_io::loader::ParcelRows { parcels, skipped } = uz_io::loader::parcels_from_value(raw)?;
    info!(parcels = parcels.len(), skipped, preset, "inputs loaded");

    Ok(PipelineCtx {
        inputs: InputsEcho {
            source: "preset",
            manifest_id: None,
            preset: Some(preset.to_string()),
            parcel_count: parcels.len(),
            skipped_records: skipped,
            parcels_sha256,
            policies_sha256,
        },
        parcels,
        config,
        engine_meta: engine_identifiers(),
    })
}

// -------------------------------------- Public API --------------------------------------

/// Run the pipeline on a loaded context.
///
/// Fails with `PipelineError::Validation` before evaluating anything when the
/// configuration report has errors.
pub fn run_with_ctx(mut ctx: PipelineCtx) -> Result<PipelineOutputs, PipelineError> {
    let span = info_span!("run", source = ctx.inputs.source, parcels = ctx.parcels.len());
    let _guard = span.enter();

    let report = validate(&ctx.config);
    for i in &report.issues {
        warn!(code = i.code, at = %i.where_, severity = ?i.severity, "{}", i.message);
    }
    if !report.pass {
        return Err(PipelineError::Validation(report));
    }

    load::enrich_parcels(&mut ctx.parcels);
    let Evaluation { registry, passes } = evaluate_all(&ctx.config, &ctx.parcels);
    let summary = summarize(&registry);
    info!(
        entries = summary.total_parcels,
        units = summary.total_units,
        additional = summary.additional_units,
        "summary"
    );

    let body = ResultBody {
        engine: ctx.engine_meta,
        inputs: ctx.inputs,
        config: ctx.config,
        validation: report,
        passes,
        summary,
        entries: registry.into_entries(),
    };
    let id = hasher::res_id_from_canonical(&body)?;
    Ok(PipelineOutputs { result: ResultDoc { id, body } })
}

pub fn run_from_manifest_path(path: &Path) -> Result<PipelineOutputs, PipelineError> {
    run_with_ctx(ctx_from_manifest(path)?)
}

pub fn run_from_paths(parcels: &Path, policies: &Path) -> Result<PipelineOutputs, PipelineError> {
    run_with_ctx(ctx_from_paths(parcels, policies)?)
}

/// Recompute the id of a finished result from its body.
pub fn recompute_result_id(doc: &ResultDoc) -> Result<ResultId, PipelineError> {
    Ok(hasher::res_id_from_canonical(&doc.body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uz_core::policy::{Policy, Ring};

    fn ctx(parcels: Vec<Parcel>, config: EvaluationConfig) -> PipelineCtx {
        PipelineCtx {
            inputs: InputsEcho {
                source: "paths",
                manifest_id: None,
                preset: None,
                parcel_count: parcels.len(),
                skipped_records: 0,
                parcels_sha256: "0".repeat(64),
                policies_sha256: "1".repeat(64),
            },
            parcels,
            config,
            engine_meta: engine_identifiers(),
        }
    }

    fn parcel(id: &str) -> Parcel {
        let mut p = Parcel::new(id.parse().unwrap());
        p.zone_district = Some("U-SU-C".into());
        p.land_area_acres = Some(0.5);
        p.distances.insert("distance_to_light_rail".into(), Some(100.0));
        p
    }

    fn tod() -> EvaluationConfig {
        EvaluationConfig::with_policies(vec![Policy::new(
            "TOD".parse().unwrap(),
            "distance_to_light_rail",
            vec![Ring::new(660.0, 8.0, "C-MX-8x")],
        )])
    }

    #[test]
    fn result_id_is_stable_and_verifiable() {
        let a = run_with_ctx(ctx(vec![parcel("A"), parcel("B")], tod())).unwrap();
        let b = run_with_ctx(ctx(vec![parcel("A"), parcel("B")], tod())).unwrap();
        assert_eq!(a.result.id, b.result.id);
        assert_eq!(recompute_result_id(&a.result).unwrap(), a.result.id);

        let v = serde_json::to_value(&a.result).unwrap();
        assert_eq!(v["summary"]["total_units"], 160);
        assert_eq!(v["entries"][0]["parcel_id"], "A");
        assert!(v["id"].as_str().unwrap().starts_with("RES:"));
    }

    #[test]
    fn validation_errors_stop_the_run() {
        let mut cfg = tod();
        cfg.policies[0].rings[0].height_stories = 0.0;
        match run_with_ctx(ctx(vec![parcel("A")], cfg)) {
            Err(PipelineError::Validation(r)) => assert!(!r.pass),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn owner_names_feed_the_unlikely_screen() {
        let mut govt = parcel("G");
        govt.owner_name = Some("CITY AND COUNTY OF DENVER".into());
        let out = run_with_ctx(ctx(vec![govt.clone(), parcel("A")], tod())).unwrap();
        assert_eq!(out.result.body.entries.len(), 1);

        let mut cfg = tod();
        cfg.exclude_unlikely = false;
        let out = run_with_ctx(ctx(vec![govt, parcel("A")], cfg)).unwrap();
        assert_eq!(out.result.body.entries.len(), 2);
    }

    #[test]
    fn io_errors_map_to_buckets() {
        assert!(matches!(PipelineError::from(IoError::Hash("x".into())), PipelineError::Integrity(_)));
        assert!(matches!(PipelineError::from(IoError::Invalid("x".into())), PipelineError::Config(_)));
        assert!(matches!(PipelineError::from(IoError::Path("x".into())), PipelineError::Io(_)));
    }
}
