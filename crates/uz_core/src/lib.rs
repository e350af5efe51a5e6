//! uz_core: core types for the TOD/POD/BOD upzoning engine.
//!
//! This crate is **I/O-free**. It defines the stable types shared across the
//! engine (`uz_algo`, `uz_io`, `uz_pipeline`, `uz_report`, `uz_cli`).
//!
//! - Identifiers: `ParcelId`, `PolicyName`, `ResultId` (`RES:`), `Sha256`
//! - Parcel input rows with precomputed distance columns
//! - Policy rings and the evaluation-wide configuration (with documented defaults)
//! - Polsby–Popper compactness from polygon coordinates
//! - Deterministic ring ordering
//!
//! Serialization derives are gated behind the `serde` feature (on by default).

pub mod ids;
pub mod parcel;
pub mod policy;
pub mod geometry;
pub mod determinism;

pub mod prelude {
    pub use crate::ids::{ParcelId, PolicyName, ResultId, Sha256};
    pub use crate::parcel::{OwnerType, Parcel, ParcelDefect};
    pub use crate::policy::{ConfigError, DensityTier, EvaluationConfig, Policy, Ring};
    pub use crate::determinism::{cmp_f64_total, ring_order};
    pub use crate::geometry::polsby_popper;
}
