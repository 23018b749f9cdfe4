//! Typed telemetry snapshot.
//!
//! The controller emits one flat JSON object per message. Known keys are
//! mapped onto [`Field`]; everything else is kept verbatim in
//! [`Snapshot::extra`] so newer firmware fields survive the trip to the
//! display layer.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value};

use crate::error::{DashboardError, Result};

/// Whether a field carries a number or a text label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Number,
    Text,
}

/// Telemetry keys the dashboard understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    CurrentTemperature,
    TargetTemperature,
    CurrentHumidity,
    EnvTemperature,
    PtcTemperature,
    FanSpeed,
    FanSpeedPercent,
    HeaterDuty,
    HeaterDutyPercent,
    FeedforwardSpeed,
    PidOutput,
    PidKp,
    PidKi,
    PidKd,
    IntegralError,
    PreviousError,
    WarmingThreshold,
    HysteresisBand,
    WarmingBias,
    HeatingBias,
    FanSpeedCirculation,
    FanMin,
    FanMax,
    FanSmoothAlpha,
    PtcState,
    BtmPtcState,
    ControlState,
}

impl Field {
    /// Every known field, in display order.
    pub const ALL: [Field; 27] = [
        Field::CurrentTemperature,
        Field::TargetTemperature,
        Field::CurrentHumidity,
        Field::EnvTemperature,
        Field::PtcTemperature,
        Field::FanSpeed,
        Field::FanSpeedPercent,
        Field::HeaterDuty,
        Field::HeaterDutyPercent,
        Field::FeedforwardSpeed,
        Field::PidOutput,
        Field::PidKp,
        Field::PidKi,
        Field::PidKd,
        Field::IntegralError,
        Field::PreviousError,
        Field::WarmingThreshold,
        Field::HysteresisBand,
        Field::WarmingBias,
        Field::HeatingBias,
        Field::FanSpeedCirculation,
        Field::FanMin,
        Field::FanMax,
        Field::FanSmoothAlpha,
        Field::PtcState,
        Field::BtmPtcState,
        Field::ControlState,
    ];

    /// Wire name of the field.
    pub const fn key(self) -> &'static str {
        match self {
            Field::CurrentTemperature => "current_temperature",
            Field::TargetTemperature => "target_temperature",
            Field::CurrentHumidity => "current_humidity",
            Field::EnvTemperature => "env_temperature",
            Field::PtcTemperature => "ptc_temperature",
            Field::FanSpeed => "fan_speed",
            Field::FanSpeedPercent => "fan_speed_percent",
            Field::HeaterDuty => "heater_duty",
            Field::HeaterDutyPercent => "heater_duty_percent",
            Field::FeedforwardSpeed => "feedforward_speed",
            Field::PidOutput => "pid_output",
            Field::PidKp => "pid_kp",
            Field::PidKi => "pid_ki",
            Field::PidKd => "pid_kd",
            Field::IntegralError => "integral_error",
            Field::PreviousError => "previous_error",
            Field::WarmingThreshold => "warming_threshold",
            Field::HysteresisBand => "hysteresis_band",
            Field::WarmingBias => "warming_bias",
            Field::HeatingBias => "heating_bias",
            Field::FanSpeedCirculation => "fan_speed_circulation",
            Field::FanMin => "fan_min",
            Field::FanMax => "fan_max",
            Field::FanSmoothAlpha => "fan_smooth_alpha",
            Field::PtcState => "ptc_state",
            Field::BtmPtcState => "btm_ptc_state",
            Field::ControlState => "control_state",
        }
    }

    /// Human-readable label used by the readout panel.
    pub const fn label(self) -> &'static str {
        match self {
            Field::CurrentTemperature => "Chamber",
            Field::TargetTemperature => "Target",
            Field::CurrentHumidity => "Humidity",
            Field::EnvTemperature => "Ambient",
            Field::PtcTemperature => "PTC",
            Field::FanSpeed => "Fan duty",
            Field::FanSpeedPercent => "Fan",
            Field::HeaterDuty => "Heater duty",
            Field::HeaterDutyPercent => "Heater",
            Field::FeedforwardSpeed => "Feed-forward",
            Field::PidOutput => "PID output",
            Field::PidKp => "Kp",
            Field::PidKi => "Ki",
            Field::PidKd => "Kd",
            Field::IntegralError => "Integral error",
            Field::PreviousError => "Previous error",
            Field::WarmingThreshold => "Warming threshold",
            Field::HysteresisBand => "Hysteresis",
            Field::WarmingBias => "Warming bias",
            Field::HeatingBias => "Heating bias",
            Field::FanSpeedCirculation => "Circulation fan",
            Field::FanMin => "Fan min",
            Field::FanMax => "Fan max",
            Field::FanSmoothAlpha => "Fan smoothing",
            Field::PtcState => "PTC relay",
            Field::BtmPtcState => "Bottom PTC",
            Field::ControlState => "State",
        }
    }

    pub const fn kind(self) -> FieldKind {
        match self {
            Field::PtcState | Field::BtmPtcState | Field::ControlState => FieldKind::Text,
            _ => FieldKind::Number,
        }
    }

    /// Look up a field by its wire name.
    pub fn from_key(key: &str) -> Option<Field> {
        Field::ALL.iter().copied().find(|f| f.key() == key)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One telemetry payload, as received.
///
/// Numeric entries are always finite: anything else is treated as absent when
/// the snapshot is built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub numbers: BTreeMap<Field, f64>,
    pub texts: BTreeMap<Field, String>,
    /// Keys the dashboard does not recognise.
    pub extra: Map<String, Value>,
}

impl Snapshot {
    /// Parse one inbound message.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Build a snapshot from an already-decoded JSON value.
    pub fn from_value(value: Value) -> Result<Self> {
        let object = match value {
            Value::Object(map) => map,
            Value::Null => return Err(DashboardError::NotAnObject("null")),
            Value::Bool(_) => return Err(DashboardError::NotAnObject("bool")),
            Value::Number(_) => return Err(DashboardError::NotAnObject("number")),
            Value::String(_) => return Err(DashboardError::NotAnObject("string")),
            Value::Array(_) => return Err(DashboardError::NotAnObject("array")),
        };

        let mut snap = Snapshot::default();
        for (key, value) in object {
            match Field::from_key(&key) {
                Some(field) => match field.kind() {
                    FieldKind::Number => {
                        if let Some(v) = finite_number(&value) {
                            snap.numbers.insert(field, v);
                        }
                    }
                    FieldKind::Text => {
                        if let Some(s) = text_value(&value) {
                            snap.texts.insert(field, s);
                        }
                    }
                },
                None => {
                    snap.extra.insert(key, value);
                }
            }
        }
        Ok(snap)
    }

    #[inline]
    pub fn number(&self, field: Field) -> Option<f64> {
        self.numbers.get(&field).copied()
    }

    #[inline]
    pub fn text(&self, field: Field) -> Option<&str> {
        self.texts.get(&field).map(String::as_str)
    }

    /// Finite numeric value of an unrecognised key, if any.
    pub fn extra_number(&self, key: &str) -> Option<f64> {
        self.extra.get(key).and_then(finite_number)
    }

    /// Insert a numeric field, ignoring non-finite values.
    pub fn set_number(&mut self, field: Field, value: f64) {
        if value.is_finite() {
            self.numbers.insert(field, value);
        }
    }

    pub fn current_temperature(&self) -> Option<f64> {
        self.number(Field::CurrentTemperature)
    }

    pub fn target_temperature(&self) -> Option<f64> {
        self.number(Field::TargetTemperature)
    }
}

/// Lenient numeric read: JSON numbers and numeric strings, finite only.
pub(crate) fn finite_number(value: &Value) -> Option<f64> {
    let v = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    v.is_finite().then_some(v)
}

fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_and_unknown_fields_are_split() {
        let snap = Snapshot::from_json_str(
            r#"{"current_temperature": 21.5, "control_state": "HEATING", "board_rev": 3}"#,
        )
        .unwrap();
        assert_eq!(snap.current_temperature(), Some(21.5));
        assert_eq!(snap.text(Field::ControlState), Some("HEATING"));
        assert_eq!(snap.extra.get("board_rev"), Some(&Value::from(3)));
    }

    #[test]
    fn non_numeric_known_field_is_absent() {
        let snap =
            Snapshot::from_json_str(r#"{"current_temperature": null, "target_temperature": "x"}"#)
                .unwrap();
        assert_eq!(snap.current_temperature(), None);
        assert_eq!(snap.target_temperature(), None);
    }

    #[test]
    fn numeric_strings_are_accepted() {
        let snap = Snapshot::from_json_str(r#"{"target_temperature": " 40.5 "}"#).unwrap();
        assert_eq!(snap.target_temperature(), Some(40.5));
    }

    #[test]
    fn non_object_payload_is_rejected() {
        assert!(matches!(
            Snapshot::from_json_str("[1,2,3]"),
            Err(DashboardError::NotAnObject("array"))
        ));
        assert!(matches!(
            Snapshot::from_json_str("{not json"),
            Err(DashboardError::Parse(_))
        ));
    }

    #[test]
    fn field_keys_round_trip() {
        for field in Field::ALL {
            assert_eq!(Field::from_key(field.key()), Some(field));
        }
        assert_eq!(Field::from_key("nope"), None);
    }
}
