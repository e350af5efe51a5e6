//! Built-in policy configurations.

use uz_core::ids::{IdError, PolicyName};
use uz_core::policy::{DensityTier, EvaluationConfig, Policy, Ring};

use crate::PipelineError;

/// Preset names accepted by `preset_by_name` (and by the CLI's `--preset`).
pub const PRESET_NAMES: &[&str] = &["ballot-measure"];

fn policy(name: &str, column: &str, rings: Vec<Ring>) -> Result<Policy, IdError> {
    let name: PolicyName = name.parse()?;
    Ok(Policy::new(name, column, rings))
}

/// The ballot-measure package: transit, park and bus-corridor upzoning.
///
/// TOD heights follow the measure text. The POD/BOD heights are the
/// illustrative values used for the published estimates.
pub fn ballot_measure() -> Result<EvaluationConfig, IdError> {
    let policies = [
        policy(
            "TOD",
            "distance_to_light_rail",
            vec![
                Ring::new(660.0, 8.0, "C-MX-8x").with_tier(DensityTier::High),
                Ring::new(1320.0, 5.0, "G-RX-5x").with_tier(DensityTier::Med),
                Ring::new(1980.0, 3.0, "G-MU-3x").with_tier(DensityTier::Low),
            ],
        ),
        policy(
            "POD-Regional",
            "distance_to_regional_park",
            vec![Ring::new(250.0, 5.0, "{context}-RX-5x"), Ring::new(750.0, 3.0, "{context}-MU-3x")],
        ),
        policy("POD-Community", "distance_to_community_park", vec![Ring::new(250.0, 3.0, "{context}-MU-3x")]),
        policy(
            "BOD-BRT",
            "distance_to_brt",
            vec![Ring::new(250.0, 5.0, "{context}-MX-5x"), Ring::new(750.0, 3.0, "{context}-MX-3x")],
        ),
        policy("BOD-Bus", "distance_to_frequent_bus", vec![Ring::new(250.0, 3.0, "{context}-MX-3x")]),
    ];
    Ok(EvaluationConfig::with_policies(policies.into_iter().collect::<Result<_, _>>()?))
}

pub fn preset_by_name(name: &str) -> Result<EvaluationConfig, PipelineError> {
    match name {
        "ballot-measure" => ballot_measure().map_err(|e| PipelineError::Config(format!("preset {name}: {e}"))),
        _ => Err(PipelineError::Config(format!("unknown preset {name}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ballot_measure_shape() {
        let cfg = ballot_measure().unwrap();
        let names: Vec<&str> = cfg.policies.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["TOD", "POD-Regional", "POD-Community", "BOD-BRT", "BOD-Bus"]);
        let tod: Vec<f64> = cfg.policies[0].rings.iter().map(|r| r.distance_ft).collect();
        assert_eq!(tod, vec![660.0, 1320.0, 1980.0]);
        assert!(cfg.exclude_unlikely);
        assert!(crate::validate::validate(&cfg).pass);
    }

    #[test]
    fn lookup_by_name() {
        for name in PRESET_NAMES {
            assert!(preset_by_name(name).is_ok(), "{name}");
        }
        assert!(matches!(preset_by_name("nope"), Err(PipelineError::Config(_))));
    }
}
