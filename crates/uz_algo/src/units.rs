//! Potential housing units from land area and building height.
//!
//! Contract:
//! - Rates come from a fixed story → units-per-acre table.
//! - Heights below/above the table use the first/last rate; heights in between
//!   use the nearest key, and an exact midpoint takes the lower key.
//! - `round(acres × rate)` with ties to even. No upper clamp.

/// Story key → units per acre, ascending by key.
pub const UNITS_PER_ACRE: &[(f64, u32)] = &[
    (2.0, 30),
    (2.5, 35),
    (3.0, 60),
    (5.0, 100),
    (7.0, 160),
    (8.0, 160),
    (10.0, 160),
    (12.0, 220),
    (16.0, 280),
    (20.0, 350),
    (30.0, 450),
];

/// Density rate for a height in stories.
pub fn units_per_acre(stories: f64) -> u32 {
    let (min_key, min_rate) = UNITS_PER_ACRE[0];
    let (max_key, max_rate) = UNITS_PER_ACRE[UNITS_PER_ACRE.len() - 1];
    if stories < min_key {
        return min_rate;
    }
    if stories > max_key {
        return max_rate;
    }
    let mut best = (f64::INFINITY, min_rate);
    for &(key, rate) in UNITS_PER_ACRE {
        let d = (key - stories).abs();
        // strict: the lower key keeps an exact midpoint
        if d < best.0 {
            best = (d, rate);
        }
    }
    best.1
}

/// Units for `acres` at `stories`. Negative or non-finite products yield 0.
pub fn potential_units(acres: f64, stories: f64) -> u64 {
    let raw = (acres * f64::from(units_per_acre(stories))).round_ties_even();
    if raw.is_finite() && raw > 0.0 {
        raw as u64
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn exact_keys() {
        assert_eq!(units_per_acre(8.0), 160);
        assert_eq!(units_per_acre(12.0), 220);
        assert_eq!(units_per_acre(2.5), 35);
        assert_eq!(potential_units(2.0, 8.0), 320);
        assert_eq!(potential_units(0.5, 5.0), 50);
    }

    #[test]
    fn clamps_at_both_ends() {
        assert_eq!(units_per_acre(1.0), 30);
        assert_eq!(units_per_acre(0.0), 30);
        assert_eq!(units_per_acre(45.0), 450);
    }

    #[test]
    fn nearest_key_and_midpoint() {
        assert_eq!(units_per_acre(4.0), 60); // 3 and 5 equidistant → 3
        assert_eq!(units_per_acre(4.2), 100);
        assert_eq!(units_per_acre(14.0), 220); // 12 and 16 → 12
        assert_eq!(units_per_acre(25.0), 350); // 20 and 30 → 20
        assert_eq!(units_per_acre(6.0), 100);
    }

    #[test]
    fn rounding_is_half_even() {
        // 7.5 → 8, 17.5 → 18, 52.5 → 52
        assert_eq!(potential_units(0.25, 2.0), 8);
        assert_eq!(potential_units(0.5, 2.5), 18);
        assert_eq!(potential_units(1.5, 2.5), 52);
        assert_eq!(potential_units(0.0, 8.0), 0);
    }

    proptest! {
        #[test]
        fn units_monotone_in_height(
            acres in 0.0f64..50.0,
            h1 in 0.0f64..40.0,
            h2 in 0.0f64..40.0,
        ) {
            let (lo, hi) = if h1 <= h2 { (h1, h2) } else { (h2, h1) };
            prop_assert!(potential_units(acres, lo) <= potential_units(acres, hi));
        }
    }
}
