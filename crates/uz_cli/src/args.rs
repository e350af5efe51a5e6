// crates/uz_cli/src/args.rs
//
// Offline CLI argument surface.
// - No networked paths (any scheme:// is rejected, `--out` included).
// - Exactly one of: --manifest  XOR  (--parcels + (--policies XOR --preset)).
// - Output: --out dir, --render [json|html]*.
// - --validate-only loads inputs and prints the configuration report without evaluating.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use clap::builder::PossibleValuesParser;
use clap::{ArgAction, Parser};

use uz_pipeline::presets::PRESET_NAMES;

/// Parsed CLI arguments (raw).
#[derive(Debug, Parser, Clone)]
#[command(
    name = "uz",
    version,
    disable_help_subcommand = true,
    about = "Offline upzoning capacity engine (TOD/POD/BOD ring assignment)"
)]
pub struct Args {
    /// Manifest JSON naming the parcel and policy files.
    #[arg(long, conflicts_with_all = ["parcels", "policies", "preset"])]
    pub manifest: Option<PathBuf>,

    /// Parcel records: JSON array, {"parcels": [...]}, or a GeoJSON FeatureCollection.
    #[arg(long)]
    pub parcels: Option<PathBuf>,
    /// Policy configuration JSON.
    #[arg(long, conflicts_with = "preset")]
    pub policies: Option<PathBuf>,
    /// Built-in policy configuration instead of --policies.
    #[arg(long, value_parser = PossibleValuesParser::new(PRESET_NAMES.iter().copied()))]
    pub preset: Option<String>,

    /// Output directory (default: current directory).
    #[arg(long, default_value = ".")]
    pub out: PathBuf,
    /// Report renderer(s) to emit next to result.json.
    #[arg(long, value_parser = ["json", "html"], num_args = 0..=2)]
    pub render: Vec<String>,

    /// Force the "unlikely to redevelop" screens on.
    #[arg(long, conflicts_with = "include_unlikely")]
    pub exclude_unlikely: bool,
    /// Force the "unlikely to redevelop" screens off.
    #[arg(long)]
    pub include_unlikely: bool,

    /// Load and validate inputs only; do not evaluate.
    #[arg(long)]
    pub validate_only: bool,

    /// Only warnings and errors on stderr.
    #[arg(long, conflicts_with = "verbose")]
    pub quiet: bool,
    /// More logging (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// `Some(flag)` when the command line overrides the configuration.
    pub fn unlikely_override(&self) -> Option<bool> {
        match (self.exclude_unlikely, self.include_unlikely) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }

    /// Default log directive for this verbosity.
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "warn";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

/// Errors surfaced by argument validation. Messages are short and stable.
#[derive(Debug)]
pub enum CliError {
    Missing(&'static str),
    PolicySource,
    NonLocalPath(String),
    NotFound(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use CliError::*;
        match self {
            Missing(s) => write!(f, "missing required flag: {s}"),
            PolicySource => write!(f, "exactly one of --policies or --preset is required with --parcels"),
            NonLocalPath(p) => write!(f, "path must be local file (no scheme): {p}"),
            NotFound(p) => write!(f, "file not found: {p}"),
        }
    }
}

impl std::error::Error for CliError {}

/// Entry point used by main.rs.
pub fn parse_and_validate() -> Result<Args, CliError> {
    validate(Args::parse())
}

/// Scheme checks, mode checks, existence checks, then path normalization.
pub fn validate(mut args: Args) -> Result<Args, CliError> {
    for p in iter_all_paths(&args) {
        ensure_local_path(p)?;
    }

    if let Some(m) = &args.manifest {
        ensure_local_exists(m, "--manifest")?;
        args.manifest = args.manifest.take().map(|p| normalize_path(&p));
    } else {
        let parcels = args.parcels.as_ref().ok_or(CliError::Missing("--manifest or --parcels"))?;
        if args.policies.is_some() == args.preset.is_some() {
            return Err(CliError::PolicySource);
        }
        ensure_local_exists(parcels, "--parcels")?;
        if let Some(p) = &args.policies {
            ensure_local_exists(p, "--policies")?;
        }
        args.parcels = args.parcels.take().map(|p| normalize_path(&p));
        args.policies = args.policies.take().map(|p| normalize_path(&p));
    }

    args.out = normalize_path(&args.out);
    Ok(args)
}

#[inline]
fn has_scheme(s: &str) -> bool {
    let lower = s.trim().to_ascii_lowercase();
    lower.contains("://") || lower.starts_with("http:") || lower.starts_with("https:") || lower.starts_with("file:")
}

#[inline]
fn ensure_local_path(p: &Path) -> Result<(), CliError> {
    match p.to_str() {
        Some(s) if has_scheme(s) => Err(CliError::NonLocalPath(s.to_string())),
        _ => Ok(()),
    }
}

fn iter_all_paths(args: &Args) -> impl Iterator<Item = &Path> {
    [args.manifest.as_deref(), args.parcels.as_deref(), args.policies.as_deref(), Some(args.out.as_path())]
        .into_iter()
        .flatten()
}

fn ensure_local_exists(p: &Path, label: &'static str) -> Result<(), CliError> {
    let meta = fs::metadata(p).map_err(|_| CliError::NotFound(format!("{label} {}", p.display())))?;
    if !meta.is_file() {
        return Err(CliError::NotFound(format!("{label} {}", p.display())));
    }
    Ok(())
}

/// Absolute path; falls back to CWD-relative when the path does not exist yet.
fn normalize_path(p: &Path) -> PathBuf {
    fs::canonicalize(p).unwrap_or_else(|_| {
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            env::current_dir().unwrap_or_else(|_| PathBuf::from(".")).join(p)
        }
    })
}
