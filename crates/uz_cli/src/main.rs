// crates/uz_cli/src/main.rs
//
// uz: load → validate → evaluate → write result.json (canonical) → self-verify →
// optional reports. Exit codes: 0 ok, 2 validation, 3 self-verify, 4 I/O, 5 input/config.

mod args;

mod exitcodes {
    pub const OK: i32 = 0;
    pub const VALIDATION: i32 = 2;
    pub const SELF_VERIFY: i32 = 3;
    pub const IO: i32 = 4;
    pub const INPUT: i32 = 5;
}

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use args::{parse_and_validate as parse_cli, Args};

use uz_io::canonical_json;
use uz_pipeline::{
    ctx_from_manifest, ctx_from_paths, ctx_from_preset, recompute_result_id, run_with_ctx, validate,
    PipelineCtx, PipelineError, PipelineOutputs, ValidationReport,
};
use uz_report::{build_model, ReportError, ReportModel};

/// Central error type for CLI → exit-code mapping.
#[derive(Debug)]
enum MainError {
    /// Configuration report has errors.
    Validation(String),
    /// Written artifact does not match what was computed, or an input digest mismatched.
    SelfVerify(String),
    Io(String),
    /// Schema, manifest shape or configuration domain failures.
    Input(String),
    Render(String),
}

impl std::fmt::Display for MainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MainError::Validation(m) => write!(f, "validation: {m}"),
            MainError::SelfVerify(m) => write!(f, "self-verify: {m}"),
            MainError::Io(m) => write!(f, "io: {m}"),
            MainError::Input(m) => write!(f, "{m}"),
            MainError::Render(m) => write!(f, "render: {m}"),
        }
    }
}

fn main() -> ExitCode {
    let args = match parse_cli() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("uz: error: {e}");
            return ExitCode::from(exitcodes::VALIDATION as u8);
        }
    };
    init_tracing(args.log_level());

    let outcome = if args.validate_only { validate_only(&args) } else { run_once(&args) };
    let rc = match outcome {
        Ok(()) => exitcodes::OK,
        Err(e) => {
            error!("{e}");
            map_error(&e)
        }
    };
    ExitCode::from(rc as u8)
}

/// Compact stderr logging; `RUST_LOG` overrides the flag-derived level.
fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_target(false).with_writer(std::io::stderr))
        .try_init();
}

fn map_error(e: &MainError) -> i32 {
    use exitcodes::*;
    match e {
        MainError::Validation(_) => VALIDATION,
        MainError::SelfVerify(_) => SELF_VERIFY,
        MainError::Io(_) | MainError::Render(_) => IO,
        MainError::Input(_) => INPUT,
    }
}

fn map_pipeline_err(e: PipelineError) -> MainError {
    match e {
        PipelineError::Validation(report) => {
            print_report(&report);
            MainError::Validation(format!("{} configuration error(s)", report.errors().count()))
        }
        PipelineError::Io(m) => MainError::Io(m),
        PipelineError::Integrity(m) | PipelineError::Build(m) => MainError::SelfVerify(m),
        e @ (PipelineError::Schema(_) | PipelineError::Manifest(_) | PipelineError::Config(_)) => {
            MainError::Input(e.to_string())
        }
    }
}

fn map_report_err(e: ReportError) -> MainError {
    MainError::Render(e.to_string())
}

fn load_ctx(args: &Args) -> Result<PipelineCtx, MainError> {
    let mut ctx = match (&args.manifest, &args.parcels, &args.policies, &args.preset) {
        (Some(m), ..) => ctx_from_manifest(m),
        (None, Some(p), Some(c), _) => ctx_from_paths(p, c),
        (None, Some(p), None, Some(preset)) => ctx_from_preset(p, preset),
        _ => return Err(MainError::Input("no input source".into())),
    }
    .map_err(map_pipeline_err)?;

    if let Some(flag) = args.unlikely_override() {
        info!(exclude_unlikely = flag, "command-line override");
        ctx.config.exclude_unlikely = flag;
    }
    Ok(ctx)
}

/// Load inputs and print the configuration report to stdout. Exit 2 when it has errors.
fn validate_only(args: &Args) -> Result<(), MainError> {
    let ctx = load_ctx(args)?;
    let report = validate(&ctx.config);
    let text = serde_json::to_string_pretty(&report).map_err(|e| MainError::Io(e.to_string()))?;
    println!("{text}");
    if report.pass {
        info!(parcels = ctx.parcels.len(), policies = ctx.config.policies.len(), "inputs OK");
        Ok(())
    } else {
        Err(MainError::Validation(format!("{} configuration error(s)", report.errors().count())))
    }
}

fn run_once(args: &Args) -> Result<(), MainError> {
    let ctx = load_ctx(args)?;
    let outs = run_with_ctx(ctx).map_err(map_pipeline_err)?;

    let result_path = write_result(&args.out, &outs)?;
    self_verify(&result_path, &outs)?;
    maybe_render_reports(args, &outs)?;

    let s = &outs.result.body.summary;
    info!(
        id = %outs.result.id,
        parcels = s.total_parcels,
        units = s.total_units,
        additional = s.additional_units,
        out = %args.out.display(),
        "result written"
    );
    if !args.quiet {
        println!("{}", outs.result.id);
    }
    Ok(())
}

fn write_result(out_dir: &Path, outs: &PipelineOutputs) -> Result<std::path::PathBuf, MainError> {
    fs::create_dir_all(out_dir).map_err(|e| MainError::Io(format!("mkdir {}: {e}", out_dir.display())))?;
    let path = out_dir.join("result.json");
    canonical_json::write_canonical_file(&path, &outs.result)
        .map_err(|e| MainError::Io(format!("write result.json: {e}")))?;
    Ok(path)
}

/// The bytes on disk must be the canonical bytes of the in-memory result, and
/// the id must hash back from the body.
fn self_verify(path: &Path, outs: &PipelineOutputs) -> Result<(), MainError> {
    let on_disk = fs::read(path).map_err(|e| MainError::Io(format!("read back {}: {e}", path.display())))?;
    let expected = canonical_json::to_canonical_bytes(&outs.result).map_err(|e| MainError::SelfVerify(e.to_string()))?;
    if on_disk != expected {
        return Err(MainError::SelfVerify("result.json differs from computed bytes".into()));
    }
    let id = recompute_result_id(&outs.result).map_err(map_pipeline_err)?;
    if id != outs.result.id {
        return Err(MainError::SelfVerify(format!("result id mismatch: {} vs {id}", outs.result.id)));
    }
    Ok(())
}

fn maybe_render_reports(args: &Args, outs: &PipelineOutputs) -> Result<(), MainError> {
    if args.render.is_empty() {
        return Ok(());
    }
    let value = serde_json::to_value(&outs.result).map_err(|e| MainError::Render(format!("result to JSON: {e}")))?;
    let model = build_model(&value).map_err(map_report_err)?;

    for fmt in &args.render {
        match fmt.as_str() {
            "json" => render_json_report(&model, &args.out)?,
            "html" => render_html_report(&model, &args.out)?,
            other => return Err(MainError::Render(format!("unknown renderer: {other}"))),
        }
    }
    Ok(())
}

fn render_json_report(model: &ReportModel, out_dir: &Path) -> Result<(), MainError> {
    #[cfg(feature = "report-json")]
    {
        let text = uz_report::render_json(model).map_err(map_report_err)?;
        write_text(&out_dir.join("report.json"), &text)
    }
    #[cfg(not(feature = "report-json"))]
    {
        let _ = (model, out_dir);
        Err(MainError::Render("json renderer not enabled (build with feature `report-json`)".into()))
    }
}

fn render_html_report(model: &ReportModel, out_dir: &Path) -> Result<(), MainError> {
    #[cfg(feature = "report-html")]
    {
        let text = uz_report::render_html(model).map_err(map_report_err)?;
        write_text(&out_dir.join("report.html"), &text)
    }
    #[cfg(not(feature = "report-html"))]
    {
        let _ = (model, out_dir);
        Err(MainError::Render("html renderer not enabled (build with feature `report-html`)".into()))
    }
}

#[allow(dead_code)]
fn write_text(path: &Path, text: &str) -> Result<(), MainError> {
    canonical_json::write_atomic(path, text.as_bytes())
        .map_err(|e| MainError::Io(format!("write {}: {e}", path.display())))
}

fn print_report(report: &ValidationReport) {
    for i in &report.issues {
        eprintln!("{:?} {} at {}: {}", i.severity, i.code, i.where_, i.message);
    }
}
