// crates/uz_io/src/manifest.rs
//
// Run manifest: where the parcels and the policy configuration live.
//
// - Inputs are local paths only; any "<scheme>://" is rejected.
// - Relative paths resolve against the manifest's directory.
// - Optional digests (lowercase 64-hex) are verified over canonical JSON bytes,
//   which is also what the result records as input digests.
// - With `path_utf8`, resolved paths must be valid UTF-8 so they can be echoed
//   verbatim into artifacts.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use uz_core::ids::is_valid_sha256;

/// External manifest accepted by the loader. `id` is informational only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub id: Option<String>,
    pub parcels_path: String,
    pub policies_path: String,
    #[serde(default)]
    pub inputs_sha256: Option<InputDigests>,
}

/// Expected canonical digests, keyed like the path fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputDigests {
    #[serde(default)]
    pub parcels_path: Option<String>,
    #[serde(default)]
    pub policies_path: Option<String>,
}

/// Manifest with paths resolved and existence-checked.
#[derive(Debug, Clone)]
pub struct ResolvedManifest {
    pub id: Option<String>,
    pub parcels_path: PathBuf,
    pub policies_path: PathBuf,
    pub digests: Option<InputDigests>,
}

#[derive(Debug)]
pub enum ManifestError {
    Empty(&'static str),
    UrlPath(&'static str, String),
    Io(&'static str, String),
    NotAFile(&'static str, String),
    NonUtf8(&'static str, String),
    TooLarge(String),
    Schema(String),
    DigestShape(&'static str, String),
    DigestMismatch(&'static str, String),
}

impl std::fmt::Display for ManifestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use ManifestError::*;
        match self {
            Empty(k) => write!(f, "field must not be empty: {k}"),
            UrlPath(k, v) => write!(f, "path must be offline (no scheme) for {k}: {v}"),
            Io(k, v) => write!(f, "cannot access {k}: {v}"),
            NotAFile(k, v) => write!(f, "path is not a file for {k}: {v}"),
            NonUtf8(k, v) => write!(f, "path is not valid UTF-8 for {k}: {v}"),
            TooLarge(v) => write!(f, "manifest exceeds {MAX_MANIFEST_BYTES} bytes: {v}"),
            Schema(v) => write!(f, "manifest does not match schema: {v}"),
            DigestShape(k, v) => write!(f, "invalid sha256 format for {k}: {v}"),
            DigestMismatch(k, v) => write!(f, "sha256 mismatch for {k}: {v}"),
        }
    }
}

impl std::error::Error for ManifestError {}

pub const MAX_MANIFEST_BYTES: u64 = 4 * 1024 * 1024;

// ---------- validation (shape & offline policy, no I/O) ----------

pub fn validate_manifest(man: &Manifest) -> Result<(), ManifestError> {
    for (label, path) in [("parcels_path", &man.parcels_path), ("policies_path", &man.policies_path)] {
        if path.trim().is_empty() {
            return Err(ManifestError::Empty(label));
        }
        if crate::looks_like_url_strict(path) {
            return Err(ManifestError::UrlPath(label, path.clone()));
        }
    }
    if let Some(d) = &man.inputs_sha256 {
        for (label, hex) in [("parcels_path", &d.parcels_path), ("policies_path", &d.policies_path)] {
            if let Some(h) = hex {
                if !is_valid_sha256(h) {
                    return Err(ManifestError::DigestShape(label, h.clone()));
                }
            }
        }
    }
    Ok(())
}

// ---------- resolution ----------

/// Resolve under `base_dir` and check that both inputs are existing files.
pub fn resolve_paths(base_dir: &Path, man: &Manifest) -> Result<ResolvedManifest, ManifestError> {
    let parcels = join_under(base_dir, &man.parcels_path, "parcels_path")?;
    let policies = join_under(base_dir, &man.policies_path, "policies_path")?;
    must_exist_file("parcels_path", &parcels)?;
    must_exist_file("policies_path", &policies)?;
    Ok(ResolvedManifest {
        id: man.id.clone(),
        parcels_path: parcels,
        policies_path: policies,
        digests: man.inputs_sha256.clone(),
    })
}

#[cfg(feature = "path_utf8")]
fn join_under(base: &Path, rel: &str, label: &'static str) -> Result<PathBuf, ManifestError> {
    use camino::{Utf8Path, Utf8PathBuf};

    let base = Utf8PathBuf::from_path_buf(base.to_path_buf())
        .map_err(|p| ManifestError::NonUtf8(label, p.display().to_string()))?;
    let rel = Utf8Path::new(rel);
    let joined = if rel.is_absolute() { rel.to_path_buf() } else { base.join(rel) };
    Ok(joined.into_std_path_buf())
}

#[cfg(not(feature = "path_utf8"))]
fn join_under(base: &Path, rel: &str, _label: &'static str) -> Result<PathBuf, ManifestError> {
    let p = Path::new(rel);
    Ok(if p.is_absolute() { p.to_path_buf() } else { base.join(p) })
}

fn must_exist_file(label: &'static str, p: &Path) -> Result<(), ManifestError> {
    let md = fs::metadata(p).map_err(|e| ManifestError::Io(label, format!("{} ({e})", p.display())))?;
    if !md.is_file() {
        return Err(ManifestError::NotAFile(label, p.display().to_string()));
    }
    Ok(())
}

// ---------- digests ----------

/// Verify the provided digests over canonical JSON bytes. No-op without digests.
pub fn verify_digests(resolved: &ResolvedManifest) -> Result<(), ManifestError> {
    let Some(d) = &resolved.digests else { return Ok(()); };
    let checks = [
        ("parcels_path", &resolved.parcels_path, &d.parcels_path),
        ("policies_path", &resolved.policies_path, &d.policies_path),
    ];
    for (label, path, expect) in checks {
        let Some(expect) = expect else { continue };
        let got = canonical_digest_of_file(label, path)?;
        if &got != expect {
            return Err(ManifestError::DigestMismatch(label, format!("expected={expect} got={got}")));
        }
    }
    Ok(())
}

/// SHA-256 of a JSON file's canonical form.
pub fn canonical_digest_of_file(label: &'static str, p: &Path) -> Result<String, ManifestError> {
    let buf = fs::read(p).map_err(|e| ManifestError::Io(label, format!("{} ({e})", p.display())))?;
    let v: serde_json::Value = serde_json::from_slice(&buf)
        .map_err(|e| ManifestError::Io(label, format!("{} ({e})", p.display())))?;
    crate::try_sha256_canonical(&v).map_err(|e| ManifestError::Io(label, e.to_string()))
}

// ---------- top-level ----------

/// Read (size-limited), validate and resolve a manifest. Does not verify digests.
pub fn load_and_resolve_manifest(manifest_path: &Path) -> Result<ResolvedManifest, ManifestError> {
    let f = fs::File::open(manifest_path)
        .map_err(|e| ManifestError::Io("manifest", format!("{} ({e})", manifest_path.display())))?;
    let mut buf = Vec::new();
    f.take(MAX_MANIFEST_BYTES + 1)
        .read_to_end(&mut buf)
        .map_err(|e| ManifestError::Io("manifest", format!("{} ({e})", manifest_path.display())))?;
    if buf.len() as u64 > MAX_MANIFEST_BYTES {
        return Err(ManifestError::TooLarge(manifest_path.display().to_string()));
    }

    let raw: serde_json::Value = serde_json::from_slice(&buf)
        .map_err(|e| ManifestError::Io("manifest", format!("{} ({e})", manifest_path.display())))?;
    crate::schema::validate_value(crate::schema::SchemaKind::Manifest, &raw)
        .map_err(|e| ManifestError::Schema(e.to_string()))?;
    let man: Manifest = serde_json::from_value(raw)
        .map_err(|e| ManifestError::Io("manifest", format!("{} ({e})", manifest_path.display())))?;
    validate_manifest(&man)?;

    let base = match manifest_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    resolve_paths(&base, &man)
}

/// Load, resolve, then verify digests.
pub fn load_verify_manifest(manifest_path: &Path) -> Result<ResolvedManifest, ManifestError> {
    let resolved = load_and_resolve_manifest(manifest_path)?;
    verify_digests(&resolved)?;
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn man(parcels: &str, policies: &str) -> Manifest {
        Manifest {
            id: None,
            parcels_path: parcels.into(),
            policies_path: policies.into(),
            inputs_sha256: None,
        }
    }

    #[test]
    fn rejects_urls_and_empty_paths() {
        assert!(matches!(
            validate_manifest(&man("https://example.org/p.json", "c.json")),
            Err(ManifestError::UrlPath("parcels_path", _))
        ));
        assert!(matches!(
            validate_manifest(&man("p.json", "file:///c.json")),
            Err(ManifestError::UrlPath("policies_path", _))
        ));
        assert!(matches!(validate_manifest(&man(" ", "c.json")), Err(ManifestError::Empty(_))));
    }

    #[test]
    fn rejects_bad_digest_shape() {
        let mut m = man("p.json", "c.json");
        m.inputs_sha256 = Some(InputDigests { parcels_path: Some("ABC".into()), policies_path: None });
        assert!(matches!(validate_manifest(&m), Err(ManifestError::DigestShape(..))));
    }

    #[test]
    fn unknown_fields_rejected() {
        let r: Result<Manifest, _> =
            serde_json::from_str(r#"{"parcels_path":"p","policies_path":"c","tally_path":"t"}"#);
        assert!(r.is_err());
    }

    #[test]
    fn resolves_relative_to_manifest_and_verifies() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("parcels.json"), r#"[ {"parcel_id": "A"} ]"#).unwrap();
        fs::write(dir.path().join("policies.json"), r#"{"policies": []}"#).unwrap();
        let good = canonical_digest_of_file("policies_path", &dir.path().join("policies.json")).unwrap();

        let mpath = dir.path().join("manifest.json");
        let body = format!(
            r#"{{"parcels_path":"parcels.json","policies_path":"policies.json","inputs_sha256":{{"policies_path":"{good}"}}}}"#
        );
        fs::write(&mpath, body).unwrap();
        let r = load_verify_manifest(&mpath).unwrap();
        assert!(r.parcels_path.ends_with("parcels.json"));

        let bad = format!(
            r#"{{"parcels_path":"parcels.json","policies_path":"policies.json","inputs_sha256":{{"parcels_path":"{good}"}}}}"#
        );
        fs::write(&mpath, bad).unwrap();
        assert!(matches!(load_verify_manifest(&mpath), Err(ManifestError::DigestMismatch(..))));
    }

    #[test]
    fn schema_rejects_unknown_keys_before_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let mpath = dir.path().join("manifest.json");
        fs::write(&mpath, r#"{"parcels_path":"p.json","policies_path":"c.json","extra":1}"#).unwrap();
        let err = load_and_resolve_manifest(&mpath).unwrap_err();
        if cfg!(feature = "schemaval") {
            assert!(matches!(err, ManifestError::Schema(_)));
        } else {
            assert!(matches!(err, ManifestError::Io("manifest", _)));
        }
    }

    #[test]
    fn missing_input_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mpath = dir.path().join("manifest.json");
        fs::write(&mpath, r#"{"parcels_path":"nope.json","policies_path":"nope2.json"}"#).unwrap();
        assert!(matches!(load_and_resolve_manifest(&mpath), Err(ManifestError::Io("parcels_path", _))));
    }
}
