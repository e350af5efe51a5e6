//! Spatial policy evaluator.
//!
//! One pass per enabled policy, in configuration order:
//! candidates → category/unlikely/compactness screens → land area → ring
//! assignment → upzone filter → units → registry merge. Per-parcel defects skip the parcel
//! for the current pass only.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use uz_algo::{contextual_zone_label, potential_units, screen, RingSet, ZoningResolver};
use uz_core::ids::PolicyName;
use uz_core::parcel::Parcel;
use uz_core::policy::{EvaluationConfig, Policy};

use crate::registry::{MergeOutcome, Registry, RegistryEntry};

/// Per-ring tally for one pass. Counts every parcel that qualified in the
/// ring, whether or not it won the merge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RingStats {
    pub ring: String,
    pub distance_ft: f64,
    pub height_stories: f64,
    pub parcels: u64,
    pub units: u64,
}

/// What one policy pass did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyPassStats {
    pub policy: PolicyName,
    pub distance_column: String,
    pub candidates: u64,
    pub qualified: u64,
    /// Screen reason code → parcels.
    pub excluded: BTreeMap<String, u64>,
    /// Data-defect reason code → parcels.
    pub defects: BTreeMap<String, u64>,
    pub not_upzoned: u64,
    pub no_ring: u64,
    pub inserted: u64,
    pub replaced: u64,
    pub kept: u64,
    pub rings: Vec<RingStats>,
}

impl PolicyPassStats {
    fn new(policy: &Policy, ring_set: &RingSet<'_>) -> Self {
        PolicyPassStats {
            policy: policy.name.clone(),
            distance_column: policy.distance_column.clone(),
            candidates: 0,
            qualified: 0,
            excluded: BTreeMap::new(),
            defects: BTreeMap::new(),
            not_upzoned: 0,
            no_ring: 0,
            inserted: 0,
            replaced: 0,
            kept: 0,
            rings: ring_set
                .iter()
                .enumerate()
                .map(|(i, r)| RingStats {
                    ring: format!("Ring {}", i + 1),
                    distance_ft: r.distance_ft,
                    height_stories: r.height_stories,
                    parcels: 0,
                    units: 0,
                })
                .collect(),
        }
    }

    fn record_merge(&mut self, outcome: MergeOutcome) {
        match outcome {
            MergeOutcome::Inserted => self.inserted += 1,
            MergeOutcome::Replaced => self.replaced += 1,
            MergeOutcome::Kept => self.kept += 1,
        }
    }
}

fn bump(map: &mut BTreeMap<String, u64>, code: &str) {
    *map.entry(code.to_string()).or_insert(0) += 1;
}

/// Run one policy over `parcels`, merging winners into `registry`.
///
/// A policy without rings is a silent no-op (empty statistics).
pub fn evaluate_policy(
    policy: &Policy,
    parcels: &[Parcel],
    cfg: &EvaluationConfig,
    resolver: &mut ZoningResolver,
    registry: &mut Registry,
) -> PolicyPassStats {
    let ring_set = RingSet::new(&policy.rings);
    let mut stats = PolicyPassStats::new(policy, &ring_set);
    if ring_set.is_empty() {
        debug!(policy = %policy.name, "policy has no rings");
        return stats;
    }

    let span = info_span!("policy_pass", policy = %policy.name, column = %policy.distance_column);
    let _guard = span.enter();

    for p in parcels {
        let distance = match p.distance_ft(&policy.distance_column) {
            Ok(Some(d)) => d,
            Ok(None) => continue,
            Err(defect) => {
                warn!(parcel = %p.parcel_id, code = defect.code(), "{defect}");
                bump(&mut stats.defects, defect.code());
                continue;
            }
        };
        if !ring_set.covers(distance) {
            continue;
        }
        stats.candidates += 1;

        if let Some(reason) = screen(p, cfg) {
            debug!(parcel = %p.parcel_id, code = reason.code(), "screened out");
            bump(&mut stats.excluded, reason.code());
            continue;
        }

        let acres = match p.acres() {
            Ok(a) => a,
            Err(defect) => {
                warn!(parcel = %p.parcel_id, code = defect.code(), "{defect}");
                bump(&mut stats.defects, defect.code());
                continue;
            }
        };

        let Some(m) = ring_set.assign(distance) else {
            debug!(parcel = %p.parcel_id, distance, "no ring");
            stats.no_ring += 1;
            continue;
        };

        let current = resolver.max_current_stories(p.zone_district.as_deref());
        let height = m.ring.height_stories;
        if height <= current {
            debug!(parcel = %p.parcel_id, height, current, "not an upzone");
            stats.not_upzoned += 1;
            continue;
        }

        let units = potential_units(acres, height);
        let baseline_units = if current > 0.0 { potential_units(acres, current) } else { 0 };
        let entry = RegistryEntry {
            parcel_id: p.parcel_id.clone(),
            policy: policy.name.clone(),
            ring: m.ordinal,
            assigned_height_stories: height,
            assigned_zone: contextual_zone_label(&m.ring.zone_label, p.zone_district.as_deref()),
            density_tier: m.ring.effective_tier(),
            potential_units: units,
            distance_ft: distance,
            current_zone: p.zone_district.clone(),
            current_max_stories: current,
            baseline_units,
            land_area_acres: acres,
            compactness_score: p.compactness(),
            current_units: 0,
            address: None,
            owner_name: None,
            property_class: None,
            property_type: None,
            building_sqft: None,
        }
        .with_passthrough(p);

        stats.qualified += 1;
        if let Some(rs) = stats.rings.get_mut(m.ordinal - 1) {
            rs.parcels += 1;
            rs.units += units;
        }
        let outcome = registry.merge(entry);
        stats.record_merge(outcome);
    }

    info!(
        candidates = stats.candidates,
        qualified = stats.qualified,
        inserted = stats.inserted,
        replaced = stats.replaced,
        kept = stats.kept,
        "policy pass complete"
    );
    stats
}

/// Outcome of running every enabled policy.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub registry: Registry,
    pub passes: Vec<PolicyPassStats>,
}

/// Fresh registry and resolver, every enabled policy in configuration order.
pub fn evaluate_all(cfg: &EvaluationConfig, parcels: &[Parcel]) -> Evaluation {
    let mut registry = Registry::new();
    let mut resolver = ZoningResolver::new();
    let mut passes = Vec::with_capacity(cfg.policies.len());

    for policy in &cfg.policies {
        if !policy.enabled {
            info!(policy = %policy.name, "policy disabled; skipped");
            continue;
        }
        passes.push(evaluate_policy(policy, parcels, cfg, &mut resolver, &mut registry));
    }
    debug!(zones_cached = resolver.cached(), entries = registry.len(), "evaluation done");
    Evaluation { registry, passes }
}
