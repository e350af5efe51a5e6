//! Parcel screens applied before ring assignment.
//!
//! Order: category blocklist (always) → unlikely-to-redevelop (when enabled) →
//! compactness. The first failing screen names the exclusion.

use core::fmt;

use uz_core::parcel::Parcel;
use uz_core::policy::EvaluationConfig;

/// Zone prefixes never upzoned: campus, historic, civic/public, airport, open space, planned units.
pub const EXCLUDED_ZONE_PREFIXES: [&str; 6] = ["CMP", "H-", "CPV", "DIA", "OS-", "PUD"];

/// Zones excluded by exact match.
pub const EXCLUDED_ZONES: [&str; 4] = ["I-A", "I-B", "FX-1", "FX-2"];

pub const COMMON_ELEMENTS_CLASS: &str = "VACANT LAND /GENERAL COMMON ELEMENTS";

/// Why a parcel was screened out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Exclusion {
    Zone,
    PropertyClass,
    ZeroLandArea,
    PublicOwner,
    RecentConstruction,
    ImprovementRatio,
    Sliver,
}

impl Exclusion {
    /// Stable reason code (logs and pass statistics).
    pub fn code(self) -> &'static str {
        match self {
            Exclusion::Zone => "Exclude.Zone",
            Exclusion::PropertyClass => "Exclude.PropertyClass",
            Exclusion::ZeroLandArea => "Exclude.ZeroLandArea",
            Exclusion::PublicOwner => "Exclude.PublicOwner",
            Exclusion::RecentConstruction => "Exclude.RecentConstruction",
            Exclusion::ImprovementRatio => "Exclude.ImprovementRatio",
            Exclusion::Sliver => "Exclude.Sliver",
        }
    }
}

impl fmt::Display for Exclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Category blocklist. Always applied.
pub fn category_exclusion(p: &Parcel) -> Option<Exclusion> {
    if let Some(zone) = p.zone_upper() {
        if EXCLUDED_ZONE_PREFIXES.iter().any(|pre| zone.starts_with(pre))
            || EXCLUDED_ZONES.contains(&zone.as_str())
        {
            return Some(Exclusion::Zone);
        }
    }
    if let Some(class) = p.property_class.as_deref() {
        let class = class.trim().to_ascii_uppercase();
        if class.contains("CONDOMINIUM") || class == COMMON_ELEMENTS_CLASS {
            return Some(Exclusion::PropertyClass);
        }
    }
    if p.land_area_acres.is_some_and(|a| a <= 0.0) {
        return Some(Exclusion::ZeroLandArea);
    }
    None
}

/// Redevelopment-likelihood heuristics. Only applied when `exclude_unlikely` is set.
pub fn unlikely_exclusion(p: &Parcel, cfg: &EvaluationConfig) -> Option<Exclusion> {
    if p.owner_type.is_some_and(|o| o.is_public_institution()) {
        return Some(Exclusion::PublicOwner);
    }
    if p
        .latest_year_built()
        .is_some_and(|y| y > cfg.recent_construction_cutoff_year)
    {
        return Some(Exclusion::RecentConstruction);
    }
    // null or zero land value yields no ratio and passes
    if p
        .improvement_to_land_ratio()
        .is_some_and(|r| r > cfg.min_improvement_to_land_ratio)
    {
        return Some(Exclusion::ImprovementRatio);
    }
    None
}

pub fn compactness_exclusion(p: &Parcel, min_compactness: f64) -> Option<Exclusion> {
    (p.compactness() < min_compactness).then_some(Exclusion::Sliver)
}

/// All screens in order.
pub fn screen(p: &Parcel, cfg: &EvaluationConfig) -> Option<Exclusion> {
    category_exclusion(p)
        .or_else(|| if cfg.exclude_unlikely { unlikely_exclusion(p, cfg) } else { None })
        .or_else(|| compactness_exclusion(p, cfg.min_compactness))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uz_core::parcel::OwnerType;

    fn parcel() -> Parcel {
        let mut p = Parcel::new("P1".parse().unwrap());
        p.zone_district = Some("U-SU-C".into());
        p.land_area_acres = Some(0.2);
        p.compactness_score = Some(0.8);
        p
    }

    #[test]
    fn clean_parcel_passes() {
        assert_eq!(screen(&parcel(), &EvaluationConfig::default()), None);
    }

    #[test]
    fn blocklisted_zones() {
        let cfg = EvaluationConfig::default();
        for z in ["CMP-EI", "H-1-A", "CPV-C", "DIA", "OS-A", "PUD 12", "I-A", "i-b", "FX-1", "FX-2"] {
            let mut p = parcel();
            p.zone_district = Some(z.into());
            assert_eq!(screen(&p, &cfg), Some(Exclusion::Zone), "{z}");
        }
        let mut p = parcel();
        p.zone_district = Some("I-MX-3".into());
        assert_eq!(screen(&p, &cfg), None);
    }

    #[test]
    fn blocklisted_property_classes() {
        let cfg = EvaluationConfig::default();
        let mut p = parcel();
        p.property_class = Some("Residential Condominium".into());
        assert_eq!(screen(&p, &cfg), Some(Exclusion::PropertyClass));
        p.property_class = Some("VACANT LAND /GENERAL COMMON ELEMENTS".into());
        assert_eq!(screen(&p, &cfg), Some(Exclusion::PropertyClass));
        p.property_class = Some("VACANT LAND".into());
        assert_eq!(screen(&p, &cfg), None);
    }

    #[test]
    fn zero_area_excluded() {
        let mut p = parcel();
        p.land_area_acres = Some(0.0);
        assert_eq!(screen(&p, &EvaluationConfig::default()), Some(Exclusion::ZeroLandArea));
    }

    #[test]
    fn unlikely_screens_toggle() {
        let on = EvaluationConfig::default();
        let off = EvaluationConfig { exclude_unlikely: false, ..Default::default() };

        let mut p = parcel();
        p.owner_type = Some(OwnerType::Govt);
        assert_eq!(screen(&p, &on), Some(Exclusion::PublicOwner));
        assert_eq!(screen(&p, &off), None);

        let mut p = parcel();
        p.owner_type = Some(OwnerType::Church);
        p.res_orig_year_built = Some(1950);
        p.com_orig_year_built = Some(2015);
        assert_eq!(screen(&p, &on), Some(Exclusion::RecentConstruction));
        p.com_orig_year_built = Some(2011);
        assert_eq!(screen(&p, &on), None);
    }

    #[test]
    fn ratio_is_strict_and_null_land_passes() {
        let cfg = EvaluationConfig::default();
        let mut p = parcel();
        p.improvement_value = Some(150.0);
        p.land_value = Some(100.0);
        assert_eq!(screen(&p, &cfg), None);
        p.improvement_value = Some(151.0);
        assert_eq!(screen(&p, &cfg), Some(Exclusion::ImprovementRatio));
        p.land_value = Some(0.0);
        assert_eq!(screen(&p, &cfg), None);
        p.land_value = None;
        assert_eq!(screen(&p, &cfg), None);
    }

    #[test]
    fn slivers_excluded_even_without_unlikely_screen() {
        let cfg = EvaluationConfig { exclude_unlikely: false, ..Default::default() };
        let mut p = parcel();
        p.compactness_score = Some(0.12);
        assert_eq!(screen(&p, &cfg), Some(Exclusion::Sliver));
        p.compactness_score = Some(0.3);
        assert_eq!(screen(&p, &cfg), None);
        p.compactness_score = None;
        assert_eq!(screen(&p, &cfg), None);
    }
}
