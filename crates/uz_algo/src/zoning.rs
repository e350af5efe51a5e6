//! Current zoning capacity: zone code → maximum stories allowed today.
//!
//! Contract:
//! - Total: any input yields a value; empty/absent input yields 0.
//! - Codes are trimmed and upper-cased before matching.
//! - Rules run in table order and the first rule returning `Some` wins. Order
//!   matters: `R-MU-20` must hit the legacy rule before the `MU-` family rule,
//!   and `I-MX-8` must hit the family rule before the industrial rule.
//!
//! Determinism:
//! - Pure functions; the resolver's cache only memoizes them.

use std::collections::HashMap;

/// A single capacity rule. Returns `None` to fall through to the next rule.
pub type ZoneRule = fn(&str) -> Option<f64>;

/// Fallback when no rule matches.
pub const DEFAULT_STORIES: f64 = 2.5;

/// Ordered rule table.
pub const ZONE_RULES: &[(&str, ZoneRule)] = &[
    ("legacy", legacy),
    ("downtown", downtown),
    ("mixed_use_family", mixed_use_family),
    ("residential", residential),
    ("industrial", industrial),
    ("planned_development", planned_development),
];

const FAMILY_MARKERS: [&str; 5] = ["MX-", "RX-", "MS-", "MU-", "CC-"];

/// Uncached resolution. Returns the stories and the name of the rule that decided.
pub fn resolve(zone: Option<&str>) -> (f64, &'static str) {
    let code = match normalize(zone) {
        Some(c) => c,
        None => return (0.0, "empty"),
    };
    for (name, rule) in ZONE_RULES {
        if let Some(stories) = rule(&code) {
            return (stories, name);
        }
    }
    (DEFAULT_STORIES, "default")
}

/// Uncached convenience form of [`ZoningResolver::max_current_stories`].
pub fn max_current_stories(zone: Option<&str>) -> f64 {
    resolve(zone).0
}

/// Memoizing resolver. One instance per evaluation; the cache never outlives it.
#[derive(Debug, Default)]
pub struct ZoningResolver {
    cache: HashMap<String, f64>,
}

impl ZoningResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_current_stories(&mut self, zone: Option<&str>) -> f64 {
        let code = match normalize(zone) {
            Some(c) => c,
            None => return 0.0,
        };
        if let Some(&v) = self.cache.get(&code) {
            return v;
        }
        let v = resolve(Some(&code)).0;
        self.cache.insert(code, v);
        v
    }

    /// Number of distinct zone codes resolved so far.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

fn normalize(zone: Option<&str>) -> Option<String> {
    let z = zone?.trim();
    if z.is_empty() {
        None
    } else {
        Some(z.to_ascii_uppercase())
    }
}

/// Leading number of `s`: digits, optionally followed by `.digits` when `decimal` is set.
fn leading_number(s: &str, decimal: bool) -> Option<f64> {
    let bytes = s.as_bytes();
    let mut end = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
    if end == 0 {
        return None;
    }
    if decimal && bytes.get(end) == Some(&b'.') {
        let frac = bytes[end + 1..].iter().take_while(|b| b.is_ascii_digit()).count();
        if frac > 0 {
            end += 1 + frac;
        }
    }
    s[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}

/// First `<marker><number>` occurrence anywhere in `code`.
fn number_after(code: &str, marker: &str, decimal: bool) -> Option<f64> {
    code.match_indices(marker)
        .find_map(|(i, m)| leading_number(&code[i + m.len()..], decimal))
}

// ----------------------------- Rules ------------------------------------------------

fn legacy(code: &str) -> Option<f64> {
    if code.contains("R-MU-20") {
        Some(5.0)
    } else if code.contains("R-MU-30") {
        Some(12.0)
    } else if code.starts_with("B-A") {
        Some(2.5)
    } else if code.starts_with("B-4") {
        Some(5.0)
    } else {
        None
    }
}

fn downtown(code: &str) -> Option<f64> {
    code.starts_with("D-").then_some(20.0)
}

/// Story count follows the family marker (`C-MX-8`, `G-RX-5`, `CC-3`).
/// A marker without a number falls through.
fn mixed_use_family(code: &str) -> Option<f64> {
    FAMILY_MARKERS.iter().find_map(|m| number_after(code, m, false))
}

fn residential(code: &str) -> Option<f64> {
    if code.contains("RH-") || code.contains("TH-") {
        return Some(
            number_after(code, "RH-", true)
                .or_else(|| number_after(code, "TH-", true))
                .unwrap_or(DEFAULT_STORIES),
        );
    }
    if code.contains("TU-") || code.starts_with("TU") {
        return Some(number_after(code, "TU-", true).unwrap_or(DEFAULT_STORIES));
    }
    if code.contains("SU-") || code.starts_with("SU") {
        return Some(DEFAULT_STORIES);
    }
    None
}

fn industrial(code: &str) -> Option<f64> {
    if !code.starts_with("I-") {
        return None;
    }
    match code {
        // light industrial: FAR-based estimate
        "I-A" | "I-B" => Some(2.0),
        _ => Some(3.0),
    }
}

fn planned_development(code: &str) -> Option<f64> {
    (code.starts_with("PUD") || code.starts_with("GDP")).then_some(10.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn s(z: &str) -> f64 {
        max_current_stories(Some(z))
    }

    #[test]
    fn empty_is_zero() {
        assert_eq!(max_current_stories(None), 0.0);
        assert_eq!(s(""), 0.0);
        assert_eq!(s("   "), 0.0);
    }

    #[test]
    fn family_markers_parse_story_count() {
        assert_eq!(s("C-MX-8"), 8.0);
        assert_eq!(s("g-mx-5"), 5.0);
        assert_eq!(s("MX-12"), 12.0);
        assert_eq!(s("C-RX-8"), 8.0);
        assert_eq!(s("E-MS-3"), 3.0);
        assert_eq!(s("G-MU-3"), 3.0);
        assert_eq!(s("CC-5"), 5.0);
        assert_eq!(s("I-MX-8"), 8.0);
    }

    #[test]
    fn rule_priority() {
        assert_eq!(resolve(Some("R-MU-20")), (5.0, "legacy"));
        assert_eq!(s("R-MU-30"), 12.0);
        assert_eq!(s("B-A-2"), 2.5);
        assert_eq!(s("B-4"), 5.0);
        assert_eq!(resolve(Some("D-C")), (20.0, "downtown"));
        assert_eq!(resolve(Some("D-TD")).1, "downtown");
    }

    #[test]
    fn residential_families() {
        assert_eq!(s("U-RH-2.5"), 2.5);
        assert_eq!(s("G-RH-3"), 3.0);
        assert_eq!(s("U-TH-2.5"), 2.5);
        assert_eq!(s("E-TU-C"), 2.5);
        assert_eq!(s("U-SU-C1"), 2.5);
        assert_eq!(resolve(Some("E-SU-D")).1, "residential");
    }

    #[test]
    fn industrial_and_planned() {
        assert_eq!(s("I-A"), 2.0);
        assert_eq!(s("I-B"), 2.0);
        assert_eq!(s("I-MX-3"), 3.0);
        assert_eq!(resolve(Some("I-X")), (3.0, "industrial"));
        assert_eq!(s("PUD 512"), 10.0);
        assert_eq!(s("GDP"), 10.0);
    }

    #[test]
    fn fallthrough_to_default() {
        // marker without a number falls through to later rules
        assert_eq!(resolve(Some("C-MX-X")), (DEFAULT_STORIES, "default"));
        assert_eq!(s("OS-A"), DEFAULT_STORIES);
        assert_eq!(s("CMP-EI"), DEFAULT_STORIES);
    }

    #[test]
    fn resolver_caches_normalized_codes() {
        let mut r = ZoningResolver::new();
        assert_eq!(r.max_current_stories(Some("c-mx-8")), 8.0);
        assert_eq!(r.max_current_stories(Some(" C-MX-8 ")), 8.0);
        assert_eq!(r.max_current_stories(None), 0.0);
        assert_eq!(r.cached(), 1);
    }

    proptest! {
        #[test]
        fn resolver_is_total_and_consistent(code in "\\PC{0,24}") {
            let direct = max_current_stories(Some(&code));
            prop_assert!(direct.is_finite() && direct >= 0.0);
            let mut r = ZoningResolver::new();
            prop_assert_eq!(r.max_current_stories(Some(&code)), direct);
            prop_assert_eq!(r.max_current_stories(Some(&code)), direct);
        }
    }
}
