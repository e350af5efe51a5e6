// crates/uz_algo/src/lib.rs
#![forbid(unsafe_code)]

//! Pure algorithms behind a policy pass. Nothing here performs I/O or logs;
//! the pipeline owns orchestration and reporting.

pub use uz_core::{
    ids::{ParcelId, PolicyName},
    parcel::{OwnerType, Parcel},
    policy::{DensityTier, EvaluationConfig, Policy, Ring},
};

// ----------------------------- Zoning & units ---------------------------------------

pub mod zoning;
pub mod units;

pub use zoning::{max_current_stories, ZoningResolver, ZONE_RULES};
pub use units::{potential_units, units_per_acre, UNITS_PER_ACRE};

// ----------------------------- Rings & screens --------------------------------------

pub mod rings;
pub mod eligibility;

pub use rings::{contextual_zone_label, RingMatch, RingSet, CONTEXT_PLACEHOLDER};
pub use eligibility::{screen, Exclusion};

// ----------------------------- Classification ---------------------------------------

pub mod classify;

pub use classify::{classify_owner_type, classify_property_type, PropertyKind};
