//! Polsby–Popper compactness: `4π·A / P²`.
//!
//! 1.0 is a circle, ~0.785 a square, and values under 0.3 are thin strips
//! (road/rail right-of-way remnants). Degenerate input yields 1.0 so that a
//! parcel with unusable geometry is never dropped as a sliver.

use core::f64::consts::PI;

use crate::parcel::COMPACT_FALLBACK;

/// Score one linear ring of `[x, y]` vertices. The ring may be open or closed.
pub fn polsby_popper(ring: &[[f64; 2]]) -> f64 {
    let pts = match ring {
        [first, .., last] if first == last => &ring[..ring.len() - 1],
        _ => ring,
    };
    if pts.len() < 3 {
        return COMPACT_FALLBACK;
    }

    let mut twice_area = 0.0;
    let mut perimeter = 0.0;
    for (i, a) in pts.iter().enumerate() {
        let b = &pts[(i + 1) % pts.len()];
        twice_area += a[0] * b[1] - b[0] * a[1];
        perimeter += (b[0] - a[0]).hypot(b[1] - a[1]);
    }
    let area = twice_area.abs() / 2.0;

    if perimeter > 0.0 && area > 0.0 && area.is_finite() && perimeter.is_finite() {
        (4.0 * PI * area) / (perimeter * perimeter)
    } else {
        COMPACT_FALLBACK
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_scores_pi_over_four() {
        let sq = [[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0], [0.0, 0.0]];
        let s = polsby_popper(&sq);
        assert!((s - PI / 4.0).abs() < 1e-12);
        // open ring gives the same answer
        assert!((polsby_popper(&sq[..4]) - s).abs() < 1e-12);
    }

    #[test]
    fn sliver_is_below_threshold() {
        let strip = [[0.0, 0.0], [500.0, 0.0], [500.0, 5.0], [0.0, 5.0]];
        assert!(polsby_popper(&strip) < 0.3);
    }

    #[test]
    fn degenerate_is_compact() {
        assert_eq!(polsby_popper(&[]), 1.0);
        assert_eq!(polsby_popper(&[[0.0, 0.0], [1.0, 1.0]]), 1.0);
        assert_eq!(polsby_popper(&[[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]]), 1.0);
    }
}
