//! Policy rings and the evaluation-wide configuration.
//!
//! Notes:
//! - Rings are interpreted as concentric bands once sorted ascending by
//!   `distance_ft`; the first ring whose threshold is ≥ the parcel distance applies.
//! - The core does not reject overlapping/unsorted rings; the pipeline's
//!   validation report flags them at the boundary.
//! - Every optional knob has a documented default (see the `default_*` fns).

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::ids::PolicyName;

/// ------------ Macros ------------

/// Define an enum with explicit wire tokens.
macro_rules! wire_enum {
    ($(#[$m:meta])* $name:ident => { $($variant:ident = $token:expr),+ $(,)? }) => {
        $(#[$m])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        pub enum $name {
            $(
                #[cfg_attr(feature = "serde", serde(rename = $token))]
                $variant,
            )+
        }

        impl $name {
            pub fn as_str(self) -> &'static str {
                match self { $( $name::$variant => $token, )+ }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
        }
    };
}

wire_enum!(
    /// Coarse density bucket. Ordered high → low so reports list the dense tier first.
    DensityTier => {
        High = "high",
        Med  = "med",
        Low  = "low"
    }
);

/// Height at or above which a parcel is reported as `high`.
pub const TIER_HIGH_MIN_STORIES: f64 = 8.0;
/// Height at or above which a parcel is reported as `med`.
pub const TIER_MED_MIN_STORIES: f64 = 5.0;

impl DensityTier {
    /// Fixed 8/5 split on assigned height (not derived from the ring configuration).
    pub fn from_height(stories: f64) -> Self {
        if stories >= TIER_HIGH_MIN_STORIES {
            DensityTier::High
        } else if stories >= TIER_MED_MIN_STORIES {
            DensityTier::Med
        } else {
            DensityTier::Low
        }
    }
}

/// One distance band of a policy.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(deny_unknown_fields))]
pub struct Ring {
    /// Outer edge of the band, in feet (inclusive).
    pub distance_ft: f64,
    /// Height granted inside the band, in stories.
    pub height_stories: f64,
    /// Zone label granted; may contain `{context}` (see `uz_algo::rings`).
    pub zone_label: String,
    /// Tier echoed onto registry entries; derived from height when omitted.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub density_tier: Option<DensityTier>,
}

impl Ring {
    pub fn new(distance_ft: f64, height_stories: f64, zone_label: impl Into<String>) -> Self {
        Ring { distance_ft, height_stories, zone_label: zone_label.into(), density_tier: None }
    }

    pub fn with_tier(mut self, tier: DensityTier) -> Self {
        self.density_tier = Some(tier);
        self
    }

    /// Configured tier, or the height-derived one.
    pub fn effective_tier(&self) -> DensityTier {
        self.density_tier.unwrap_or_else(|| DensityTier::from_height(self.height_stories))
    }
}

/// A named policy: which distance column to read and which rings to apply.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(deny_unknown_fields))]
pub struct Policy {
    pub name: PolicyName,
    pub distance_column: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub rings: Vec<Ring>,
    #[cfg_attr(feature = "serde", serde(default = "default_true"))]
    pub enabled: bool,
}

impl Policy {
    pub fn new(name: PolicyName, distance_column: impl Into<String>, rings: Vec<Ring>) -> Self {
        Policy { name, distance_column: distance_column.into(), rings, enabled: true }
    }
}

/// Evaluation-wide settings plus the ordered policy list.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(deny_unknown_fields))]
pub struct EvaluationConfig {
    /// Evaluated strictly in this order; order only matters for equal-height ties.
    pub policies: Vec<Policy>,
    #[cfg_attr(feature = "serde", serde(default = "default_true"))]
    pub exclude_unlikely: bool,
    #[cfg_attr(feature = "serde", serde(default = "default_min_improvement_to_land_ratio"))]
    pub min_improvement_to_land_ratio: f64,
    #[cfg_attr(feature = "serde", serde(default = "default_recent_construction_cutoff_year"))]
    pub recent_construction_cutoff_year: i32,
    #[cfg_attr(feature = "serde", serde(default = "default_min_compactness"))]
    pub min_compactness: f64,
}

fn default_true() -> bool { true }

/// Improvement/land ratio above which redevelopment is assumed uneconomical.
pub fn default_min_improvement_to_land_ratio() -> f64 { 1.5 }

/// Parcels built after this year are assumed unlikely to redevelop soon.
pub fn default_recent_construction_cutoff_year() -> i32 { 2011 }

/// Polsby–Popper score below which a parcel is treated as a sliver.
pub fn default_min_compactness() -> f64 { 0.3 }

impl Default for EvaluationConfig {
    fn default() -> Self {
        EvaluationConfig {
            policies: Vec::new(),
            exclude_unlikely: true,
            min_improvement_to_land_ratio: default_min_improvement_to_land_ratio(),
            recent_construction_cutoff_year: default_recent_construction_cutoff_year(),
            min_compactness: default_min_compactness(),
        }
    }
}

impl EvaluationConfig {
    pub fn with_policies(policies: Vec<Policy>) -> Self {
        EvaluationConfig { policies, ..Default::default() }
    }
}

/// Domain errors on the global knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Domain(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Domain(m) => write!(f, "config domain error: {m}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Check value domains of the evaluation-wide knobs. Ring/policy structure is
/// checked separately by the pipeline's validation report.
pub fn validate_domains(cfg: &EvaluationConfig) -> Result<(), ConfigError> {
    let r = cfg.min_improvement_to_land_ratio;
    if !(r.is_finite() && r > 0.0) {
        return Err(ConfigError::Domain(format!("min_improvement_to_land_ratio must be > 0, got {r}")));
    }
    let c = cfg.min_compactness;
    if !(0.0..=1.0).contains(&c) {
        return Err(ConfigError::Domain(format!("min_compactness must be in [0,1], got {c}")));
    }
    let y = cfg.recent_construction_cutoff_year;
    if !(1800..=2200).contains(&y) {
        return Err(ConfigError::Domain(format!("recent_construction_cutoff_year out of range: {y}")));
    }
    Ok(())
}
