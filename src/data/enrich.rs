//! Snapshot enrichment: derived fields and legacy aliases.
//!
//! Pure functions. The input snapshot is never mutated; a new one is returned.

use crate::data::snapshot::{Field, Snapshot};

/// `target = source * factor`, filled only when `target` is absent.
pub struct Derivation {
    pub target: Field,
    pub source: Field,
    pub factor: f64,
}

/// Copy a legacy key into its canonical field when the canonical one is absent.
pub struct Alias {
    pub canonical: Field,
    pub legacy: &'static str,
}

pub const DERIVATIONS: &[Derivation] = &[
    Derivation {
        target: Field::FanSpeedPercent,
        source: Field::FanSpeed,
        factor: 100.0,
    },
    Derivation {
        target: Field::HeaterDutyPercent,
        source: Field::HeaterDuty,
        factor: 100.0,
    },
];

pub const ALIASES: &[Alias] = &[
    Alias {
        canonical: Field::FanSpeed,
        legacy: "final_fan_speed",
    },
    Alias {
        canonical: Field::HeaterDuty,
        legacy: "final_pwm_duty",
    },
    Alias {
        canonical: Field::FeedforwardSpeed,
        legacy: "feedforward_speed_last",
    },
    Alias {
        canonical: Field::PidOutput,
        legacy: "pid_output_last",
    },
    Alias {
        canonical: Field::CurrentTemperature,
        legacy: "temperature",
    },
    Alias {
        canonical: Field::CurrentHumidity,
        legacy: "humidity",
    },
];

/// Return `raw` plus every alias and derived field that can be computed.
///
/// Aliases run first so a legacy duty value still produces its percentage.
/// Missing or non-finite sources skip the rule silently.
pub fn enrich(raw: &Snapshot) -> Snapshot {
    let mut out = raw.clone();

    for alias in ALIASES {
        if out.number(alias.canonical).is_some() {
            continue;
        }
        if let Some(v) = raw.extra_number(alias.legacy) {
            out.set_number(alias.canonical, v);
        }
    }

    for rule in DERIVATIONS {
        if out.number(rule.target).is_some() {
            continue;
        }
        if let Some(v) = out.number(rule.source) {
            out.set_number(rule.target, v * rule.factor);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(json: &str) -> Snapshot {
        Snapshot::from_json_str(json).unwrap()
    }

    #[test]
    fn derives_fan_percent_from_fraction() {
        let out = enrich(&snap(r#"{"fan_speed": 0.25}"#));
        assert_eq!(out.number(Field::FanSpeedPercent), Some(25.0));
    }

    #[test]
    fn existing_percent_is_not_overwritten() {
        let out = enrich(&snap(r#"{"fan_speed": 0.25, "fan_speed_percent": 30.0}"#));
        assert_eq!(out.number(Field::FanSpeedPercent), Some(30.0));
    }

    #[test]
    fn legacy_alias_feeds_derivation() {
        let out = enrich(&snap(r#"{"final_pwm_duty": 0.5}"#));
        assert_eq!(out.number(Field::HeaterDuty), Some(0.5));
        assert_eq!(out.number(Field::HeaterDutyPercent), Some(50.0));
    }

    #[test]
    fn non_finite_source_is_skipped() {
        let out = enrich(&snap(r#"{"fan_speed": "nan", "final_fan_speed": "inf"}"#));
        assert_eq!(out.number(Field::FanSpeed), None);
        assert_eq!(out.number(Field::FanSpeedPercent), None);
    }

    #[test]
    fn input_is_left_untouched() {
        let raw = snap(r#"{"fan_speed": 0.1}"#);
        let before = raw.clone();
        let _ = enrich(&raw);
        assert_eq!(raw, before);
    }
}
