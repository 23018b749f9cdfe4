//! Display formatting policy for inbound telemetry.
//!
//! Only inbound values are formatted. Operator input goes out exactly as typed
//! (see [`crate::data::commands`]).

use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};

use crate::data::snapshot::Field;

// ─────────────────────────────────────────────────────────────────────────────
// Precision
// ─────────────────────────────────────────────────────────────────────────────

/// Decimal places shown on the primary (temperature) axis.
///
/// Always within `0..=3`.
///
/// ```
/// # use chamberscope::data::format::Precision;
/// assert_eq!(Precision::new(7).get(), 3);
/// assert_eq!(Precision::default().format(21.456), "21.46");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub struct Precision(u8);

impl Precision {
    pub const MIN: u8 = 0;
    pub const MAX: u8 = 3;

    pub fn new(decimals: u8) -> Self {
        Self(decimals.clamp(Self::MIN, Self::MAX))
    }

    #[inline]
    pub fn get(self) -> u8 {
        self.0
    }

    #[inline]
    pub fn decimals(self) -> usize {
        self.0 as usize
    }

    /// One more decimal, saturating at [`Precision::MAX`].
    pub fn increment(self) -> Self {
        Self::new(self.0.saturating_add(1))
    }

    /// One fewer decimal, saturating at [`Precision::MIN`].
    pub fn decrement(self) -> Self {
        Self::new(self.0.saturating_sub(1))
    }

    pub fn format(self, value: f64) -> String {
        format!("{:.*}", self.decimals(), value)
    }

    pub fn format_with_unit(self, value: f64, unit: &str) -> String {
        format!("{:.*} {}", self.decimals(), value, unit)
    }
}

impl Default for Precision {
    fn default() -> Self {
        Self(2)
    }
}

impl From<u8> for Precision {
    fn from(v: u8) -> Self {
        Self::new(v)
    }
}

impl From<Precision> for u8 {
    fn from(p: Precision) -> Self {
        p.0
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Per-field readout formats
// ─────────────────────────────────────────────────────────────────────────────

/// Fixed decimals plus an optional unit suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldFormat {
    pub decimals: usize,
    pub suffix: &'static str,
}

impl FieldFormat {
    const fn new(decimals: usize, suffix: &'static str) -> Self {
        Self { decimals, suffix }
    }

    pub fn apply(&self, value: f64) -> String {
        if self.suffix.is_empty() {
            format!("{:.*}", self.decimals, value)
        } else {
            format!("{:.*} {}", self.decimals, value, self.suffix)
        }
    }
}

/// Readout format for a known numeric field, if it has a dedicated one.
pub fn field_format(field: Field) -> Option<FieldFormat> {
    use Field::*;
    let fmt = match field {
        CurrentTemperature | TargetTemperature | EnvTemperature | PtcTemperature => {
            FieldFormat::new(2, "°C")
        }
        WarmingThreshold | HysteresisBand | WarmingBias | HeatingBias => FieldFormat::new(2, "°C"),
        CurrentHumidity => FieldFormat::new(1, "%RH"),
        FanSpeedPercent | HeaterDutyPercent => FieldFormat::new(1, "%"),
        FanSpeed | HeaterDuty | FeedforwardSpeed | PidOutput | IntegralError | PreviousError => {
            FieldFormat::new(4, "")
        }
        FanSpeedCirculation | FanMin | FanMax | FanSmoothAlpha => FieldFormat::new(4, ""),
        PidKp | PidKi | PidKd => FieldFormat::new(6, ""),
        PtcState | BtmPtcState | ControlState => return None,
    };
    Some(fmt)
}

/// Fallback for numbers without a dedicated format: integers as-is, the rest
/// with two decimals.
pub fn format_plain_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}

pub fn format_field(field: Field, value: f64) -> String {
    match field_format(field) {
        Some(fmt) => fmt.apply(value),
        None => format_plain_number(value),
    }
}

/// Render an arbitrary JSON value from the extension map.
pub fn format_json_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Number(n) => match n.as_f64() {
            Some(v) if v.is_finite() => format_plain_number(v),
            _ => n.to_string(),
        },
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => "—".to_string(),
        other => other.to_string(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Time labels
// ─────────────────────────────────────────────────────────────────────────────

/// Local wall-clock `HH:MM` label for a bucket start in epoch milliseconds.
pub fn format_bucket_time(epoch_ms: i64) -> String {
    match Local.timestamp_millis_opt(epoch_ms).single() {
        Some(dt) => dt.format("%H:%M").to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precision_is_clamped() {
        assert_eq!(Precision::new(0).get(), 0);
        assert_eq!(Precision::new(200).get(), 3);
        assert_eq!(Precision::new(3).increment().get(), 3);
        assert_eq!(Precision::new(0).decrement().get(), 0);
        assert_eq!(Precision::new(1).format(21.46), "21.5");
    }

    #[test]
    fn precision_deserializes_clamped() {
        let p: Precision = serde_yaml::from_str("9").unwrap();
        assert_eq!(p.get(), 3);
    }

    #[test]
    fn known_fields_use_their_format() {
        assert_eq!(format_field(Field::CurrentTemperature, 21.456), "21.46 °C");
        assert_eq!(format_field(Field::FanSpeedPercent, 42.26), "42.3 %");
        assert_eq!(format_field(Field::PidKp, 1.37), "1.370000");
        assert_eq!(format_field(Field::PidOutput, 0.5), "0.5000");
    }

    #[test]
    fn plain_numbers() {
        assert_eq!(format_plain_number(3.0), "3");
        assert_eq!(format_plain_number(3.14159), "3.14");
        assert_eq!(format_json_value(&serde_json::json!("ON")), "ON");
        assert_eq!(format_json_value(&serde_json::json!(12)), "12");
    }
}
