//! Renderable view of one snapshot.
//!
//! Built once per render from the freshest snapshot, the current range and
//! the session precision. Only registered widgets get a part; the rest stay
//! `None`.

use crate::config::WidgetFlags;
use crate::data::candles::ChartUpdate;
use crate::data::format::{format_field, format_json_value, Precision};
use crate::data::geometry::{Band, GeometryMapper};
use crate::data::range::RangeTracker;
use crate::data::snapshot::{Field, Snapshot};

/// Unit suffix of the primary axis.
pub const PRIMARY_UNIT: &str = "°C";

/// Extension keys that are never shown as readouts.
const HIDDEN_EXTRA_KEYS: &[&str] = &["console", "timestamp"];

/// A point marker with its text label.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    /// Marker position in percent of the container height.
    pub position: f64,
    /// Label position; clamped a little further from the edges.
    pub label_position: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScaleTick {
    pub value: i64,
    pub position: f64,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThermometerView {
    /// Fill height of the current value.
    pub fill: Option<f64>,
    pub current: Option<Marker>,
    pub target: Option<Marker>,
    /// `target ± hysteresis`.
    pub band: Option<Band>,
    pub scale: Option<Vec<ScaleTick>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GaugeView {
    pub label: &'static str,
    pub fill: Option<f64>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Readout {
    pub label: String,
    pub text: String,
}

/// Everything a frame needs to draw.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardView {
    pub thermometer: Option<ThermometerView>,
    pub gauges: Option<Vec<GaugeView>>,
    pub readouts: Option<Vec<Readout>>,
    /// How the candle chart must be brought up to date, if at all.
    pub chart: Option<ChartUpdate>,
    pub control_state: Option<String>,
}

impl DashboardView {
    pub fn build(
        snap: &Snapshot,
        range: &RangeTracker,
        precision: Precision,
        widgets: &WidgetFlags,
        chart: Option<ChartUpdate>,
    ) -> Self {
        let thermometer = widgets
            .thermometer
            .then(|| thermometer(snap, range, precision, widgets));
        let gauges = widgets.gauges.then(|| gauges(snap));
        let readouts = widgets.readouts.then(|| readouts(snap));
        Self {
            thermometer,
            gauges,
            readouts,
            chart: chart.filter(|_| widgets.candles),
            control_state: snap.text(Field::ControlState).map(str::to_string),
        }
    }
}

fn marker(g: &GeometryMapper, value: f64, text: String) -> Option<Marker> {
    Some(Marker {
        position: g.marker(value)?,
        label_position: g.label(value)?,
        text,
    })
}

fn thermometer(
    snap: &Snapshot,
    range: &RangeTracker,
    precision: Precision,
    widgets: &WidgetFlags,
) -> ThermometerView {
    let g = GeometryMapper::from(range);
    let current = snap.current_temperature();
    let target = snap.target_temperature();

    let target_marker = if widgets.target_marker {
        target.and_then(|t| marker(&g, t, precision.format_with_unit(t, PRIMARY_UNIT)))
    } else {
        None
    };

    let band = match (widgets.tolerance_band, target, snap.number(Field::HysteresisBand)) {
        (true, Some(t), Some(h)) => g.band(t - h, t + h),
        _ => None,
    };

    let scale = widgets.scale_labels.then(|| {
        let unit = format!(" {PRIMARY_UNIT}");
        range
            .ticks()
            .into_iter()
            .zip(range.tick_labels(&unit))
            .map(|(value, label)| ScaleTick {
                value,
                position: g.fill(value as f64).unwrap_or(0.0),
                label,
            })
            .collect()
    });

    ThermometerView {
        fill: current.and_then(|c| g.fill(c)),
        current: current.and_then(|c| marker(&g, c, precision.format_with_unit(c, PRIMARY_UNIT))),
        target: target_marker,
        band,
        scale,
    }
}

fn gauges(snap: &Snapshot) -> Vec<GaugeView> {
    let g = GeometryMapper::percent_scale();
    [
        ("Humidity", Field::CurrentHumidity),
        ("Fan", Field::FanSpeedPercent),
        ("Heater", Field::HeaterDutyPercent),
    ]
    .into_iter()
    .map(|(label, field)| {
        let v = snap.number(field);
        GaugeView {
            label,
            fill: v.and_then(|v| g.fill(v)),
            text: v.map(|v| format_field(field, v)),
        }
    })
    .collect()
}

fn readouts(snap: &Snapshot) -> Vec<Readout> {
    let mut out = Vec::new();
    for field in Field::ALL {
        if let Some(v) = snap.number(field) {
            out.push(Readout {
                label: field.label().to_string(),
                text: format_field(field, v),
            });
        } else if let Some(t) = snap.text(field) {
            out.push(Readout {
                label: field.label().to_string(),
                text: t.to_string(),
            });
        }
    }
    for (key, value) in &snap.extra {
        if HIDDEN_EXTRA_KEYS.contains(&key.as_str()) {
            continue;
        }
        out.push(Readout {
            label: key.clone(),
            text: format_json_value(value),
        });
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
    fn missing_target_keeps_current() {
        let s = snap(r#"{"current_temperature": 40.0}"#);
        let v = DashboardView::build(
            &s,
            &RangeTracker::default(),
            Precision::default(),
            &WidgetFlags::default(),
            None,
        );
        let t = v.thermometer.unwrap();
        assert_eq!(t.fill, Some(50.0));
        assert_eq!(t.current.unwrap().text, "40.00 °C");
        assert!(t.target.is_none());
        assert!(t.band.is_none());
    }

    #[test]
    fn band_follows_hysteresis() {
        let s = snap(r#"{"target_temperature": 40.0, "hysteresis_band": 4.0}"#);
        let v = DashboardView::build(
            &s,
            &RangeTracker::default(),
            Precision::new(1),
            &WidgetFlags::default(),
            None,
        );
        let t = v.thermometer.unwrap();
        let band = t.band.unwrap();
        assert!((band.start - 45.0).abs() < 1e-9);
        assert!((band.end - 55.0).abs() < 1e-9);
        assert_eq!(t.target.unwrap().text, "40.0 °C");
    }

    #[test]
    fn unregistered_widgets_are_none() {
        let s = snap(r#"{"current_temperature": 20.0, "fan_speed_percent": 30}"#);
        let widgets = WidgetFlags {
            thermometer: false,
            gauges: false,
            ..WidgetFlags::default()
        };
        let v = DashboardView::build(
            &s,
            &RangeTracker::default(),
            Precision::default(),
            &widgets,
            None,
        );
        assert!(v.thermometer.is_none());
        assert!(v.gauges.is_none());
        assert!(v.readouts.is_some());
    }

    #[test]
    fn readouts_include_extras_but_not_console() {
        let s = snap(r#"{"control_state": "IDLE", "board_rev": 3, "console": ["x"]}"#);
        let readouts = readouts(&s);
        let labels: Vec<_> = readouts.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["State", "board_rev"]);
        assert_eq!(readouts[1].text, "3");
    }
}
