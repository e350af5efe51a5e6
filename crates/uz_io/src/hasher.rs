//! crates/uz_io/src/hasher.rs
//!
//! SHA-256 digests and artifact IDs.
//!
//! - `sha256_canonical(..)` hashes JSON values/structs through canonical_json.
//! - `sha256_hex(..)` hashes raw bytes.
//! - Hex output is always lowercase.

#![forbid(unsafe_code)]

use digest::Digest;
use serde::Serialize;
use sha2::Sha256;

use uz_core::ids::ResultId;

use crate::canonical_json::to_canonical_bytes;
use crate::{IoError, IoResult};

/// SHA-256 over raw bytes.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// SHA-256 over the canonical JSON bytes of any serializable value.
pub fn sha256_canonical<T: Serialize + ?Sized>(value: &T) -> IoResult<String> {
    Ok(sha256_hex(&to_canonical_bytes(value)?))
}

/// `RES:<hex>` over the canonical bytes of the result body (the body must not
/// contain its own id).
pub fn res_id_from_canonical<T: Serialize + ?Sized>(body: &T) -> IoResult<ResultId> {
    let hex = sha256_canonical(body)?;
    format!("RES:{hex}")
        .parse()
        .map_err(|e| IoError::Hash(format!("result id: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hex_is_lowercase_sha256() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn canonical_hash_ignores_key_order() {
        #[derive(Serialize)]
        struct Entry {
            policy: &'static str,
            height: u32,
        }
        let a = sha256_canonical(&Entry { policy: "TOD", height: 8 }).unwrap();
        let b = sha256_canonical(&json!({"height": 8, "policy": "TOD"})).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn result_id_shape() {
        let id = res_id_from_canonical(&json!({"entries": []})).unwrap();
        assert!(id.as_str().starts_with("RES:"));
        assert_eq!(id.as_hex().len(), 64);
    }
}
