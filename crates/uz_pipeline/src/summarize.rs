//! Cross-policy summary over the final registry.

use std::collections::BTreeMap;

use serde::Serialize;

use uz_core::policy::DensityTier;

use crate::registry::Registry;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Totals {
    pub parcels: u64,
    pub units: u64,
    pub acres: f64,
}

impl Totals {
    fn add(&mut self, units: u64, acres: f64) {
        self.parcels += 1;
        self.units += units;
        self.acres += acres;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub total_parcels: u64,
    pub total_units: u64,
    pub total_baseline_units: u64,
    /// `total_units - total_baseline_units`, floored at zero.
    pub additional_units: u64,
    pub total_acres: f64,
    /// Policy group (`POD-Regional` → `POD`) → totals.
    pub by_group: BTreeMap<String, Totals>,
    /// Tier from assigned height (8/5 split), high first.
    pub by_tier: BTreeMap<DensityTier, Totals>,
}

/// Reduce the registry. Iterates in parcel-id order so float sums are stable.
pub fn summarize(registry: &Registry) -> Summary {
    let mut s = Summary::default();
    for e in registry.entries() {
        s.total_parcels += 1;
        s.total_units += e.potential_units;
        s.total_baseline_units += e.baseline_units;
        s.total_acres += e.land_area_acres;

        s.by_group
            .entry(e.policy.group().to_string())
            .or_default()
            .add(e.potential_units, e.land_area_acres);
        s.by_tier
            .entry(DensityTier::from_height(e.assigned_height_stories))
            .or_default()
            .add(e.potential_units, e.land_area_acres);
    }
    s.additional_units = s.total_units.saturating_sub(s.total_baseline_units);
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::entry;

    #[test]
    fn groups_roll_up_by_prefix() {
        let mut r = Registry::new();
        r.merge(entry("A", "POD-Regional", 5.0));
        r.merge(entry("B", "POD-Community", 3.0));
        r.merge(entry("C", "TOD", 8.0));
        let s = summarize(&r);

        assert_eq!(s.total_parcels, 3);
        assert_eq!(s.total_units, 30);
        assert_eq!(s.total_baseline_units, 9);
        assert_eq!(s.additional_units, 21);
        assert_eq!(s.by_group["POD"].parcels, 2);
        assert_eq!(s.by_group["TOD"].units, 10);
        assert_eq!(s.by_tier[&DensityTier::High].parcels, 1);
        assert_eq!(s.by_tier[&DensityTier::Med].parcels, 1);
        assert_eq!(s.by_tier[&DensityTier::Low].parcels, 1);
    }

    #[test]
    fn additional_units_saturate() {
        let mut r = Registry::new();
        let mut e = entry("A", "TOD", 3.0);
        e.baseline_units = 50;
        r.merge(e);
        assert_eq!(summarize(&r).additional_units, 0);
    }

    #[test]
    fn empty_registry_is_all_zero() {
        assert_eq!(summarize(&Registry::new()), Summary::default());
    }
}
