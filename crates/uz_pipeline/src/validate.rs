//! crates/uz_pipeline/src/validate.rs
//! Structural checks on the policy configuration before any evaluation.
//! `pass` = no Error; issue order is stable so reports are byte-identical.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Serialize, Serializer};

use uz_core::determinism::ring_order;
use uz_core::policy::{EvaluationConfig, Policy};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Where the issue occurred. Policies are referenced by position because names may repeat.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntityRef {
    Root,
    Param(&'static str),
    Policy(usize),
    /// (policy index, ring index as configured)
    Ring(usize, usize),
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityRef::Root => f.write_str("/"),
            EntityRef::Param(name) => write!(f, "/{name}"),
            EntityRef::Policy(p) => write!(f, "/policies/{p}"),
            EntityRef::Ring(p, r) => write!(f, "/policies/{p}/rings/{r}"),
        }
    }
}

impl Serialize for EntityRef {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub code: &'static str,
    pub message: String,
    #[serde(rename = "where")]
    pub where_: EntityRef,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub pass: bool,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }
}

/// Top-level entry point.
pub fn validate(cfg: &EvaluationConfig) -> ValidationReport {
    let mut issues = Vec::new();

    issues.extend(check_params(cfg));
    issues.extend(check_policy_names(&cfg.policies));
    for (pi, policy) in cfg.policies.iter().enumerate() {
        issues.extend(check_policy(pi, policy));
        issues.extend(check_rings(pi, policy));
    }

    sort_issues_stably(&mut issues);
    ValidationReport { pass: !issues.iter().any(|i| i.severity == Severity::Error), issues }
}

fn issue(severity: Severity, code: &'static str, message: String, where_: EntityRef) -> ValidationIssue {
    ValidationIssue { severity, code, message, where_ }
}

fn check_params(cfg: &EvaluationConfig) -> Vec<ValidationIssue> {
    let mut out = Vec::new();
    let r = cfg.min_improvement_to_land_ratio;
    if !(r.is_finite() && r > 0.0) {
        out.push(issue(
            Severity::Error,
            "Config.RatioOutOfRange",
            format!("min_improvement_to_land_ratio must be > 0, got {r}"),
            EntityRef::Param("min_improvement_to_land_ratio"),
        ));
    }
    let c = cfg.min_compactness;
    if !(0.0..=1.0).contains(&c) {
        out.push(issue(
            Severity::Error,
            "Config.CompactnessOutOfRange",
            format!("min_compactness must be within [0, 1], got {c}"),
            EntityRef::Param("min_compactness"),
        ));
    }
    out
}

/// Later duplicates are flagged; the first occurrence is the reference.
fn check_policy_names(policies: &[Policy]) -> Vec<ValidationIssue> {
    let mut seen = BTreeSet::new();
    policies
        .iter()
        .enumerate()
        .filter(|(_, p)| !seen.insert(p.name.as_str()))
        .map(|(pi, p)| {
            issue(Severity::Warning, "Policy.DuplicateName", format!("policy name {} repeats", p.name), EntityRef::Policy(pi))
        })
        .collect()
}

fn check_policy(pi: usize, policy: &Policy) -> Vec<ValidationIssue> {
    let mut out = Vec::new();
    if policy.distance_column.trim().is_empty() {
        out.push(issue(
            Severity::Error,
            "Policy.EmptyDistanceColumn",
            format!("policy {} has no distance column", policy.name),
            EntityRef::Policy(pi),
        ));
    }
    if policy.rings.is_empty() {
        out.push(issue(
            Severity::Warning,
            "Policy.NoRings",
            format!("policy {} has no rings and will not assign anything", policy.name),
            EntityRef::Policy(pi),
        ));
    }
    out
}

/// Per-ring value checks, then shape checks in ascending-threshold order.
///
/// Errors: `Ring.NegativeDistance`, `Ring.NonPositiveHeight`.
/// Warnings: `Ring.DuplicateThreshold`, `Ring.HeightIncreasesOutward`.
fn check_rings(pi: usize, policy: &Policy) -> Vec<ValidationIssue> {
    let mut out = Vec::new();
    for (ri, ring) in policy.rings.iter().enumerate() {
        if !(ring.distance_ft.is_finite() && ring.distance_ft >= 0.0) {
            out.push(issue(
                Severity::Error,
                "Ring.NegativeDistance",
                format!("distance_ft must be a non-negative number, got {}", ring.distance_ft),
                EntityRef::Ring(pi, ri),
            ));
        }
        if !(ring.height_stories.is_finite() && ring.height_stories > 0.0) {
            out.push(issue(
                Severity::Error,
                "Ring.NonPositiveHeight",
                format!("height_stories must be > 0, got {}", ring.height_stories),
                EntityRef::Ring(pi, ri),
            ));
        }
    }

    let order = ring_order(&policy.rings);
    for pair in order.windows(2) {
        let (inner, outer) = (&policy.rings[pair[0]], &policy.rings[pair[1]]);
        if inner.distance_ft == outer.distance_ft {
            out.push(issue(
                Severity::Warning,
                "Ring.DuplicateThreshold",
                format!("two rings share threshold {} ft; the first configured wins", outer.distance_ft),
                EntityRef::Ring(pi, pair[1]),
            ));
        } else if outer.height_stories > inner.height_stories {
            out.push(issue(
                Severity::Warning,
                "Ring.HeightIncreasesOutward",
                format!(
                    "ring at {} ft grants {} stories, more than {} at {} ft",
                    outer.distance_ft, outer.height_stories, inner.height_stories, inner.distance_ft
                ),
                EntityRef::Ring(pi, pair[1]),
            ));
        }
    }
    out
}

// ------------------------------------------------------------------------------------------------
// Utilities
// ------------------------------------------------------------------------------------------------

fn sort_issues_stably(issues: &mut [ValidationIssue]) {
    issues.sort_by(|a, b| {
        a.code
            .cmp(b.code)
            .then_with(|| cmp_where(&a.where_, &b.where_))
            .then_with(|| a.message.cmp(&b.message))
    });
}

fn cmp_where(a: &EntityRef, b: &EntityRef) -> core::cmp::Ordering {
    use core::cmp::Ordering::*;
    use EntityRef::*;
    match (a, b) {
        (Root, Root) => Equal,
        (Root, _) => Less,
        (_, Root) => Greater,
        (Param(pa), Param(pb)) => pa.cmp(pb),
        (Param(_), _) => Less,
        (_, Param(_)) => Greater,
        (Policy(pa), Policy(pb)) => pa.cmp(pb),
        (Policy(_), _) => Less,
        (_, Policy(_)) => Greater,
        (Ring(a1, a2), Ring(b1, b2)) => a1.cmp(b1).then(a2.cmp(b2)),
    }
}
