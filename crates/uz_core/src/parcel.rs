//! Parcel input rows.
//!
//! A parcel is read-only for the engine. Distances are precomputed upstream and
//! arrive keyed by column name (`distance_to_light_rail`, ...). A `null` distance
//! means "not applicable / out of range"; a column that is absent altogether is a
//! data defect for any policy that selects it.

use std::collections::BTreeMap;
use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::ids::ParcelId;

/// Prefix used by upstream distance columns.
pub const DISTANCE_PREFIX: &str = "distance_to_";

/// Score used when no compactness is available (treated as compact).
pub const COMPACT_FALLBACK: f64 = 1.0;

/// Owner category used by the "unlikely to redevelop" heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum OwnerType {
    School,
    Govt,
    Church,
    Rtd,
    Private,
    #[cfg_attr(feature = "serde", serde(other))]
    Other,
}

impl OwnerType {
    /// School and government owners are assumed not to redevelop.
    pub fn is_public_institution(self) -> bool {
        matches!(self, OwnerType::School | OwnerType::Govt)
    }
}

/// One parcel row as consumed by the evaluator.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Parcel {
    pub parcel_id: ParcelId,
    #[cfg_attr(feature = "serde", serde(default))]
    pub zone_district: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub land_area_acres: Option<f64>,
    /// Polsby–Popper score in [0,1]; `None` when upstream supplied neither a score nor a geometry.
    #[cfg_attr(feature = "serde", serde(default))]
    pub compactness_score: Option<f64>,
    /// `distance_to_<feature>` → feet (or null).
    #[cfg_attr(feature = "serde", serde(default))]
    pub distances: BTreeMap<String, Option<f64>>,

    #[cfg_attr(feature = "serde", serde(default))]
    pub owner_type: Option<OwnerType>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub improvement_value: Option<f64>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub land_value: Option<f64>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub res_orig_year_built: Option<i32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub com_orig_year_built: Option<i32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub current_units: u32,

    // Pass-through display fields. `property_class` is also read by the category blocklist.
    #[cfg_attr(feature = "serde", serde(default))]
    pub address: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub owner_name: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub property_class: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub property_type: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub building_sqft: Option<f64>,
}

/// Per-parcel data problems. These skip the parcel for one policy pass; they never abort a run.
#[derive(Debug, Clone, PartialEq)]
pub enum ParcelDefect {
    MissingDistance(String),
    BadDistance(String, f64),
    MissingLandArea,
    BadLandArea(f64),
}

impl ParcelDefect {
    /// Stable reason code (used in logs and pass statistics).
    pub fn code(&self) -> &'static str {
        match self {
            ParcelDefect::MissingDistance(_) => "Parcel.MissingDistance",
            ParcelDefect::BadDistance(..) => "Parcel.BadDistance",
            ParcelDefect::MissingLandArea => "Parcel.MissingLandArea",
            ParcelDefect::BadLandArea(_) => "Parcel.BadLandArea",
        }
    }
}

impl fmt::Display for ParcelDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParcelDefect::MissingDistance(c) => write!(f, "distance column {c} missing"),
            ParcelDefect::BadDistance(c, v) => write!(f, "distance column {c} has invalid value {v}"),
            ParcelDefect::MissingLandArea => f.write_str("land_area_acres missing"),
            ParcelDefect::BadLandArea(v) => write!(f, "land_area_acres has invalid value {v}"),
        }
    }
}

impl Parcel {
    /// Minimal constructor; every optional attribute starts empty.
    pub fn new(parcel_id: ParcelId) -> Self {
        Parcel {
            parcel_id,
            zone_district: None,
            land_area_acres: None,
            compactness_score: None,
            distances: BTreeMap::new(),
            owner_type: None,
            improvement_value: None,
            land_value: None,
            res_orig_year_built: None,
            com_orig_year_built: None,
            current_units: 0,
            address: None,
            owner_name: None,
            property_class: None,
            property_type: None,
            building_sqft: None,
        }
    }

    /// Look up a distance column. Accepts either the full column name or the bare
    /// feature name (`light_rail` resolves `distance_to_light_rail`).
    ///
    /// - `Ok(None)`: column present but null.
    /// - `Err(MissingDistance)`: column absent.
    /// - `Err(BadDistance)`: negative or non-finite.
    pub fn distance_ft(&self, column: &str) -> Result<Option<f64>, ParcelDefect> {
        let raw = match self.distances.get(column) {
            Some(v) => *v,
            None => {
                let prefixed = format!("{DISTANCE_PREFIX}{column}");
                match self.distances.get(&prefixed) {
                    Some(v) => *v,
                    None => return Err(ParcelDefect::MissingDistance(column.to_string())),
                }
            }
        };
        match raw {
            None => Ok(None),
            Some(d) if d.is_finite() && d >= 0.0 => Ok(Some(d)),
            Some(d) => Err(ParcelDefect::BadDistance(column.to_string(), d)),
        }
    }

    /// Land area in acres; must be present, finite and non-negative.
    pub fn acres(&self) -> Result<f64, ParcelDefect> {
        match self.land_area_acres {
            None => Err(ParcelDefect::MissingLandArea),
            Some(a) if a.is_finite() && a >= 0.0 => Ok(a),
            Some(a) => Err(ParcelDefect::BadLandArea(a)),
        }
    }

    /// Compactness score, falling back to compact when unknown.
    pub fn compactness(&self) -> f64 {
        self.compactness_score.unwrap_or(COMPACT_FALLBACK)
    }

    /// Most recent construction year across residential/commercial, whichever are defined.
    pub fn latest_year_built(&self) -> Option<i32> {
        match (self.res_orig_year_built, self.com_orig_year_built) {
            (Some(r), Some(c)) => Some(r.max(c)),
            (Some(y), None) | (None, Some(y)) => Some(y),
            (None, None) => None,
        }
    }

    /// Improvement value divided by land value. `None` when either is missing or land value is not positive.
    pub fn improvement_to_land_ratio(&self) -> Option<f64> {
        let imp = self.improvement_value?;
        let land = self.land_value?;
        if land > 0.0 && imp.is_finite() {
            Some(imp / land)
        } else {
            None
        }
    }

    /// Upper-cased zone code, trimmed; `None` when absent or blank.
    pub fn zone_upper(&self) -> Option<String> {
        self.zone_district
            .as_deref()
            .map(str::trim)
            .filter(|z| !z.is_empty())
            .map(str::to_ascii_uppercase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parcel() -> Parcel {
        Parcel::new("P1".parse().unwrap())
    }

    #[test]
    fn distance_lookup_variants() {
        let mut p = parcel();
        p.distances.insert("distance_to_light_rail".into(), Some(420.0));
        p.distances.insert("distance_to_brt".into(), None);
        p.distances.insert("distance_to_park".into(), Some(-3.0));

        assert_eq!(p.distance_ft("distance_to_light_rail"), Ok(Some(420.0)));
        assert_eq!(p.distance_ft("light_rail"), Ok(Some(420.0)));
        assert_eq!(p.distance_ft("brt"), Ok(None));
        assert!(matches!(p.distance_ft("park"), Err(ParcelDefect::BadDistance(..))));
        assert!(matches!(p.distance_ft("school"), Err(ParcelDefect::MissingDistance(_))));
    }

    #[test]
    fn year_and_ratio_helpers() {
        let mut p = parcel();
        assert_eq!(p.latest_year_built(), None);
        p.res_orig_year_built = Some(1952);
        assert_eq!(p.latest_year_built(), Some(1952));
        p.com_orig_year_built = Some(2015);
        assert_eq!(p.latest_year_built(), Some(2015));

        p.improvement_value = Some(300_000.0);
        assert_eq!(p.improvement_to_land_ratio(), None);
        p.land_value = Some(0.0);
        assert_eq!(p.improvement_to_land_ratio(), None);
        p.land_value = Some(100_000.0);
        assert_eq!(p.improvement_to_land_ratio(), Some(3.0));
    }

    #[test]
    fn compactness_fallback_and_zone() {
        let mut p = parcel();
        assert_eq!(p.compactness(), 1.0);
        p.compactness_score = Some(0.12);
        assert_eq!(p.compactness(), 0.12);
        assert_eq!(p.zone_upper(), None);
        p.zone_district = Some(" c-mx-8 ".into());
        assert_eq!(p.zone_upper().as_deref(), Some("C-MX-8"));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn owner_type_wire_tokens() {
        let o: OwnerType = serde_json::from_str("\"govt\"").unwrap();
        assert_eq!(o, OwnerType::Govt);
        let x: OwnerType = serde_json::from_str("\"utility\"").unwrap();
        assert_eq!(x, OwnerType::Other);
        assert!(OwnerType::School.is_public_institution());
        assert!(!OwnerType::Rtd.is_public_institution());
    }
}
