//! Winning ring assignment per parcel, shared across policy passes.
//!
//! Merge rule: insert when absent; replace only on a strictly greater height;
//! otherwise keep. Equal heights therefore keep the first policy that won.
//! Entries are immutable snapshots of the winning pass.

use std::collections::BTreeMap;

use serde::Serialize;

use uz_core::ids::{ParcelId, PolicyName};
use uz_core::parcel::Parcel;
use uz_core::policy::DensityTier;

/// One parcel's winning assignment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistryEntry {
    pub parcel_id: ParcelId,
    pub policy: PolicyName,
    /// 1-based ring position inside the winning policy.
    pub ring: usize,
    pub assigned_height_stories: f64,
    pub assigned_zone: String,
    pub density_tier: DensityTier,
    pub potential_units: u64,
    pub distance_ft: f64,

    pub current_zone: Option<String>,
    pub current_max_stories: f64,
    pub baseline_units: u64,
    pub land_area_acres: f64,
    pub compactness_score: f64,
    pub current_units: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub building_sqft: Option<f64>,
}

impl RegistryEntry {
    /// Copy the pass-through display fields from the source parcel.
    pub fn with_passthrough(mut self, p: &Parcel) -> Self {
        self.address = p.address.clone();
        self.owner_name = p.owner_name.clone();
        self.property_class = p.property_class.clone();
        self.property_type = p.property_type.clone();
        self.building_sqft = p.building_sqft;
        self.current_units = p.current_units;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Inserted,
    Replaced,
    Kept,
}

/// Parcel → winning entry, ordered by parcel id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Registry {
    entries: BTreeMap<ParcelId, RegistryEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&mut self, entry: RegistryEntry) -> MergeOutcome {
        match self.entries.get_mut(&entry.parcel_id) {
            None => {
                self.entries.insert(entry.parcel_id.clone(), entry);
                MergeOutcome::Inserted
            }
            Some(existing) if entry.assigned_height_stories > existing.assigned_height_stories => {
                *existing = entry;
                MergeOutcome::Replaced
            }
            Some(_) => MergeOutcome::Kept,
        }
    }

    pub fn get(&self, id: &ParcelId) -> Option<&RegistryEntry> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in ascending parcel-id order.
    pub fn entries(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.entries.values()
    }

    pub fn into_entries(self) -> Vec<RegistryEntry> {
        self.entries.into_values().collect()
    }
}

#[cfg(test)]
pub(crate) fn entry(id: &str, policy: &str, height: f64) -> RegistryEntry {
    RegistryEntry {
        parcel_id: id.parse().unwrap(),
        policy: policy.parse().unwrap(),
        ring: 1,
        assigned_height_stories: height,
        assigned_zone: format!("X-{height}"),
        density_tier: DensityTier::from_height(height),
        potential_units: 10,
        distance_ft: 100.0,
        current_zone: None,
        current_max_stories: 2.5,
        baseline_units: 3,
        land_area_acres: 0.1,
        compactness_score: 1.0,
        current_units: 0,
        address: None,
        owner_name: None,
        property_class: None,
        property_type: None,
        building_sqft: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_replace_keep() {
        let mut r = Registry::new();
        assert_eq!(r.merge(entry("P1", "TOD", 5.0)), MergeOutcome::Inserted);
        assert_eq!(r.merge(entry("P1", "POD-Regional", 8.0)), MergeOutcome::Replaced);
        assert_eq!(r.merge(entry("P1", "BOD-Bus", 3.0)), MergeOutcome::Kept);
        let e = r.get(&"P1".parse().unwrap()).unwrap();
        assert_eq!(e.policy.as_str(), "POD-Regional");
        assert_eq!(e.assigned_height_stories, 8.0);
    }

    #[test]
    fn equal_height_keeps_first_writer() {
        let mut r = Registry::new();
        r.merge(entry("P1", "TOD", 5.0));
        assert_eq!(r.merge(entry("P1", "BOD-BRT", 5.0)), MergeOutcome::Kept);
        assert_eq!(r.get(&"P1".parse().unwrap()).unwrap().policy.as_str(), "TOD");
    }

    #[test]
    fn entries_are_ordered_by_id() {
        let mut r = Registry::new();
        r.merge(entry("B", "TOD", 5.0));
        r.merge(entry("A", "TOD", 5.0));
        let ids: Vec<&str> = r.entries().map(|e| e.parcel_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B"]);
        assert_eq!(r.len(), 2);
    }
}
