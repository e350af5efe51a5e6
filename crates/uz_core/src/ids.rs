//! crates/uz_core/src/ids.rs
//! Parcel/policy identifiers and output IDs.
//! ASCII-only, strict shapes; no I/O.

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Errors returned when validating or parsing IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdError {
    NonAscii,
    TooLong,
    BadShape,
}

impl fmt::Display for IdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdError::NonAscii => f.write_str("id must be ASCII without NUL"),
            IdError::TooLong => f.write_str("id too long"),
            IdError::BadShape => f.write_str("id has invalid shape"),
        }
    }
}

impl std::error::Error for IdError {}

const MAX_ID_LEN: usize = 256;
const HEX64_LEN: usize = 64;
const TOKEN_MAX_LEN: usize = 64;

#[inline]
fn is_ascii_no_nul(s: &str) -> bool {
    !s.as_bytes().iter().any(|&b| b == 0 || b > 0x7F)
}

/// Lowercase hex (length must be exactly 64).
#[inline]
pub fn is_valid_sha256(s: &str) -> bool {
    s.len() == HEX64_LEN && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Token for ParcelId/PolicyName: ^[A-Za-z0-9_.:-]{1,64}$
#[inline]
pub fn is_valid_token(s: &str) -> bool {
    let len = s.len();
    (1..=TOKEN_MAX_LEN).contains(&len)
        && s.bytes().all(|b| {
            b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b':' | b'-')
        })
}

macro_rules! simple_string_newtype {
    ($(#[$m:meta])* $name:ident) => {
        $(#[$m])*
        #[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        #[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
        pub struct $name(String);

        impl $name {
            #[inline] pub fn as_str(&self) -> &str { &self.0 }
        }

        impl fmt::Display for $name {
            #[inline]
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
        }

        impl TryFrom<&str> for $name {
            type Error = IdError;
            #[inline]
            fn try_from(value: &str) -> Result<Self, Self::Error> { value.parse() }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;
            #[inline]
            fn try_from(value: String) -> Result<Self, Self::Error> { value.parse() }
        }

        impl From<$name> for String {
            #[inline]
            fn from(v: $name) -> String { v.0 }
        }
    }
}

#[inline]
fn check_common(s: &str) -> Result<(), IdError> {
    if !is_ascii_no_nul(s) { return Err(IdError::NonAscii); }
    if s.len() > MAX_ID_LEN { return Err(IdError::TooLong); }
    Ok(())
}

// === Token IDs ===

simple_string_newtype!(
    /// Stable parcel identity (assessor schedule number or similar token).
    ParcelId
);
simple_string_newtype!(
    /// Policy name, e.g. `TOD`, `POD-Regional`, `BOD-Bus`.
    PolicyName
);

impl FromStr for ParcelId {
    type Err = IdError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        check_common(s)?;
        if !is_valid_token(s) { return Err(IdError::BadShape); }
        Ok(ParcelId(s.to_owned()))
    }
}

impl FromStr for PolicyName {
    type Err = IdError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        check_common(s)?;
        if !is_valid_token(s) { return Err(IdError::BadShape); }
        Ok(PolicyName(s.to_owned()))
    }
}

impl PolicyName {
    /// Reporting group: the segment before the first `-` (`POD-Regional` → `POD`).
    /// Names without a dash are their own group.
    pub fn group(&self) -> &str {
        match self.0.split_once('-') {
            Some((head, _)) if !head.is_empty() => head,
            _ => &self.0,
        }
    }
}

// === Digests / output IDs ===

simple_string_newtype!(
    /// Generic 64-hex lowercase SHA-256 digest.
    Sha256
);
simple_string_newtype!(
    /// "RES:" + 64-hex lowercase
    ResultId
);

impl FromStr for Sha256 {
    type Err = IdError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        check_common(s)?;
        if !is_valid_sha256(s) { return Err(IdError::BadShape); }
        Ok(Sha256(s.to_owned()))
    }
}

impl Sha256 {
    #[inline] pub fn as_hex(&self) -> &str { &self.0 }
}

impl FromStr for ResultId {
    type Err = IdError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        check_common(s)?;
        match s.strip_prefix("RES:") {
            Some(hex) if is_valid_sha256(hex) => Ok(ResultId(s.to_owned())),
            _ => Err(IdError::BadShape),
        }
    }
}

impl ResultId {
    #[inline] pub fn as_hex(&self) -> &str { &self.0[4..] }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEX: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcd";

    #[test]
    fn tokens() {
        for ok in ["0214300001000", "TOD", "POD-Regional", "a.b:c_d"] {
            let _p: ParcelId = ok.parse().unwrap();
            let _n: PolicyName = ok.parse().unwrap();
        }
        for bad in ["", " ", "é", "has space"] {
            assert!(bad.parse::<ParcelId>().is_err());
            assert!(bad.parse::<PolicyName>().is_err());
        }
    }

    #[test]
    fn policy_groups() {
        let p: PolicyName = "POD-Regional".parse().unwrap();
        assert_eq!(p.group(), "POD");
        let t: PolicyName = "TOD".parse().unwrap();
        assert_eq!(t.group(), "TOD");
        let odd: PolicyName = "-x".parse().unwrap();
        assert_eq!(odd.group(), "-x");
    }

    #[test]
    fn result_and_sha() {
        let res: ResultId = format!("RES:{HEX}").parse().unwrap();
        assert_eq!(res.as_hex(), HEX);
        let sha: Sha256 = HEX.parse().unwrap();
        assert_eq!(sha.to_string(), HEX);
        assert!("RES:DEADBEEF".parse::<ResultId>().is_err());
        assert!("0123XYZ".parse::<Sha256>().is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_validates_on_read() {
        let ok: ParcelId = serde_json::from_str("\"0501200012000\"").unwrap();
        assert_eq!(ok.as_str(), "0501200012000");
        assert!(serde_json::from_str::<ParcelId>("\"bad id\"").is_err());
        assert_eq!(serde_json::to_string(&ok).unwrap(), "\"0501200012000\"");
    }
}
