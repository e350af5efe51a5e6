//! Ring assignment for one policy.
//!
//! Rings are ordered ascending by threshold once per policy pass. A distance
//! falls in the first ring whose threshold is ≥ the distance (boundaries are
//! inclusive); equal thresholds keep configuration order.

use uz_core::determinism::ring_order;
use uz_core::policy::Ring;

/// Placeholder in a ring's zone label replaced by the parcel's zone context.
pub const CONTEXT_PLACEHOLDER: &str = "{context}";

/// Context used when the parcel has no current zone.
pub const DEFAULT_CONTEXT: &str = "G";

/// Rings of one policy in canonical order.
#[derive(Debug, Clone)]
pub struct RingSet<'a> {
    sorted: Vec<&'a Ring>,
}

/// The ring a distance fell into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingMatch<'a> {
    /// 1-based position in ascending order ("Ring 1" is innermost).
    pub ordinal: usize,
    pub ring: &'a Ring,
}

impl<'a> RingSet<'a> {
    pub fn new(rings: &'a [Ring]) -> Self {
        RingSet { sorted: ring_order(rings).into_iter().map(|i| &rings[i]).collect() }
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    /// Outermost threshold; `None` when the policy has no rings.
    pub fn max_threshold(&self) -> Option<f64> {
        self.sorted.last().map(|r| r.distance_ft)
    }

    /// Inclusive candidate test used before any screening.
    pub fn covers(&self, distance_ft: f64) -> bool {
        self.max_threshold().is_some_and(|m| distance_ft <= m)
    }

    pub fn assign(&self, distance_ft: f64) -> Option<RingMatch<'a>> {
        self.sorted
            .iter()
            .position(|r| distance_ft <= r.distance_ft)
            .map(|i| RingMatch { ordinal: i + 1, ring: self.sorted[i] })
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Ring> + '_ {
        self.sorted.iter().copied()
    }
}

/// Substitute `{context}` with the first dash-separated segment of the parcel's
/// current zone (`U-SU-C` → `U`), or `G` when the zone is absent.
pub fn contextual_zone_label(label: &str, current_zone: Option<&str>) -> String {
    if !label.contains(CONTEXT_PLACEHOLDER) {
        return label.to_string();
    }
    let context = current_zone
        .map(str::trim)
        .and_then(|z| z.split('-').next())
        .filter(|seg| !seg.is_empty())
        .map(str::to_ascii_uppercase)
        .unwrap_or_else(|| DEFAULT_CONTEXT.to_string());
    label.replace(CONTEXT_PLACEHOLDER, &context)
}
