//! crates/uz_io/src/lib.rs
//! Local-file I/O for the upzoning engine.
//!
//! - Shared error type (`IoError`) with `From` conversions used across modules.
//! - Canonical JSON, hashing, manifest resolution, schema checks, loaders.
//! - Offline only: nothing here opens a socket.

#![forbid(unsafe_code)]

use thiserror::Error;

/// Unified error for uz_io (canonical_json/hasher/manifest/schema/loader).
#[derive(Debug, Error)]
pub enum IoError {
    /// Filesystem / path errors (open, create_dir_all, rename, fsync, ...).
    #[error("io/path error: {0}")]
    Path(String),

    /// JSON parse/shape errors with a JSON Pointer to the offending value.
    #[error("json error at {pointer}: {msg}")]
    Json { pointer: String, msg: String },

    #[error("hash error: {0}")]
    Hash(String),

    /// JSON Schema validation failures (first violation).
    #[error("schema error at {pointer}: {msg}")]
    Schema { pointer: String, msg: String },

    #[error("manifest error: {0}")]
    Manifest(String),

    /// Domain / invariant violations found after parsing.
    #[error("invalid: {0}")]
    Invalid(String),

    #[error("input too large: {path} exceeds {limit} bytes")]
    Limit { path: String, limit: u64 },
}

pub type IoResult<T> = Result<T, IoError>;

/* ---------------- From conversions (used by file modules) ---------------- */

impl From<std::io::Error> for IoError {
    fn from(e: std::io::Error) -> Self {
        IoError::Path(e.to_string())
    }
}

impl From<serde_json::Error> for IoError {
    fn from(e: serde_json::Error) -> Self {
        // serde_json keeps line/column, not a pointer
        IoError::Json { pointer: "/".to_string(), msg: e.to_string() }
    }
}

impl From<manifest::ManifestError> for IoError {
    fn from(e: manifest::ManifestError) -> Self {
        match e {
            // integrity failures stay distinguishable from shape/path problems
            manifest::ManifestError::DigestMismatch(..) => IoError::Hash(e.to_string()),
            _ => IoError::Manifest(e.to_string()),
        }
    }
}

pub mod canonical_json;
#[cfg(feature = "hash")]
pub mod hasher;
pub mod manifest;
pub mod schema;
pub mod loader;

/* ---------------- Fallible hash wrappers ----------------
   Digests are part of every result; callers use these so a build without
   the `hash` feature fails loudly instead of emitting empty digests.
--------------------------------------------------------- */

/// SHA-256 hex of `bytes`, or an error when hashing is compiled out.
pub fn try_sha256_hex(bytes: &[u8]) -> IoResult<String> {
    #[cfg(feature = "hash")]
    {
        Ok(hasher::sha256_hex(bytes))
    }
    #[cfg(not(feature = "hash"))]
    {
        let _ = bytes;
        Err(IoError::Hash("hash feature disabled".into()))
    }
}

/// SHA-256 hex over the canonical JSON form of `value`.
pub fn try_sha256_canonical<T: serde::Serialize>(value: &T) -> IoResult<String> {
    let bytes = canonical_json::to_canonical_bytes(value)?;
    try_sha256_hex(&bytes)
}

/// Returns true if `s` looks like a URL (any `<scheme>://`, including `file://`).
#[inline]
pub fn looks_like_url_strict(s: &str) -> bool {
    let s = s.trim();
    s.contains("://") || s.starts_with("http:") || s.starts_with("https:")
}

pub mod prelude {
    pub use crate::{looks_like_url_strict, try_sha256_canonical, try_sha256_hex, IoError, IoResult};

    pub use crate::canonical_json::{to_canonical_bytes, write_canonical_file};
    pub use crate::loader::{load_all, load_all_from_manifest, InputDigests, LoadedContext, ParcelRows};
    pub use crate::manifest::{Manifest, ManifestError, ResolvedManifest};
}
