//! Determinism utilities: stable ring ordering.
//!
//! This module is **I/O-free**. It provides:
//! - A total order on `f64` (NaN sorts last, via `total_cmp`)
//! - Canonical ring ordering (ascending threshold, ties keep configuration order)

use core::cmp::Ordering;

use crate::policy::Ring;

/// Total order on floats (IEEE 754 `totalOrder`).
#[inline]
pub fn cmp_f64_total(a: f64, b: f64) -> Ordering {
    a.total_cmp(&b)
}

/* -------------------------------------------------------------------------- */
/*                              Ring ordering                                  */
/* -------------------------------------------------------------------------- */

/// Indices of `rings` ordered by ascending `distance_ft`. Equal thresholds keep
/// their configuration order, so the earlier ring wins a shared boundary.
pub fn ring_order(rings: &[Ring]) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..rings.len()).collect();
    idx.sort_by(|&a, &b| {
        match cmp_f64_total(rings[a].distance_ft, rings[b].distance_ft) {
            Ordering::Equal => a.cmp(&b),
            o => o,
        }
    });
    idx
}

/* ---------------------------------- Tests --------------------------------- */
