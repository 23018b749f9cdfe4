//! Configuration for the dashboard.
//!
//! Everything has a sensible default; a YAML file at
//! `~/.chamberscope/config.yaml` overrides it and command-line flags override
//! the file.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::data::candles::{DEFAULT_BUCKET_MS, DEFAULT_CANDLE_CAP};
use crate::data::format::Precision;
use crate::data::range::RangeSettings;
use crate::error::{DashboardError, Result};

pub const DEFAULT_URL: &str = "ws://localhost:8765";
const CONFIG_DIR: &str = ".chamberscope";
const CONFIG_FILE: &str = "config.yaml";

// ─────────────────────────────────────────────────────────────────────────────
// Widget registration
// ─────────────────────────────────────────────────────────────────────────────

/// Which visual targets are present.
///
/// All widgets default to `true`. A disabled widget is simply not computed or
/// drawn; it is never an error.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetFlags {
    /// Thermometer column with fill and current-value marker.
    pub thermometer: bool,
    /// Tick labels beside the thermometer.
    pub scale_labels: bool,
    /// Set-point marker on the thermometer.
    pub target_marker: bool,
    /// Tolerance band around the set-point.
    pub tolerance_band: bool,
    /// Humidity and fan duty gauges.
    pub gauges: bool,
    /// Per-field readout grid.
    pub readouts: bool,
    /// Candlestick chart of the chamber temperature.
    pub candles: bool,
    /// Operator forms.
    pub controls: bool,
    /// Controller console output.
    pub console: bool,
}

impl Default for WidgetFlags {
    fn default() -> Self {
        Self {
            thermometer: true,
            scale_labels: true,
            target_marker: true,
            tolerance_band: true,
            gauges: true,
            readouts: true,
            candles: true,
            controls: true,
            console: true,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Candle settings
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandleSettings {
    /// Bucket width in seconds.
    pub bucket_secs: u64,
    /// Number of candles kept.
    pub cap: usize,
}

impl CandleSettings {
    pub fn bucket_ms(&self) -> i64 {
        i64::try_from(self.bucket_secs.saturating_mul(1000)).unwrap_or(DEFAULT_BUCKET_MS)
    }
}

impl Default for CandleSettings {
    fn default() -> Self {
        Self {
            bucket_secs: (DEFAULT_BUCKET_MS / 1000) as u64,
            cap: DEFAULT_CANDLE_CAP,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// DashboardConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Top-level configuration.
///
/// | Field              | Purpose |
/// |--------------------|---------|
/// | `url`              | WebSocket endpoint of the controller |
/// | `range`            | Initial primary axis and widening rule |
/// | `candles`          | Bucket width and window size |
/// | `precision`        | Decimals on the primary axis |
/// | `widgets`          | Which widgets are registered |
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub url: String,
    /// Native window title.
    pub title: String,
    pub range: RangeSettings,
    pub candles: CandleSettings,
    pub precision: Precision,
    pub widgets: WidgetFlags,
    /// Rows shown in the feed-forward table editor.
    pub feedforward_rows: usize,
    /// Console lines kept before the oldest are discarded.
    pub console_lines: usize,
    /// Emission interval of the demo simulator.
    pub demo_interval_ms: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            title: "Chamberscope".to_string(),
            range: RangeSettings::default(),
            candles: CandleSettings::default(),
            precision: Precision::default(),
            widgets: WidgetFlags::default(),
            feedforward_rows: 5,
            console_lines: 200,
            demo_interval_ms: 500,
        }
    }
}

impl DashboardConfig {
    /// `~/.chamberscope/config.yaml`, or `None` when `HOME` is not set.
    pub fn default_path() -> Option<PathBuf> {
        let home = std::env::var_os("HOME")?;
        Some(PathBuf::from(home).join(CONFIG_DIR).join(CONFIG_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let s = fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&s)?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let s = serde_yaml::to_string(self)?;
        let mut f = fs::File::create(path)?;
        f.write_all(s.as_bytes())?;
        Ok(())
    }

    /// Load the default file. A missing file yields the defaults.
    pub fn load_from_default_path() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn save_to_default_path(&self) -> Result<()> {
        let path = Self::default_path().ok_or_else(|| {
            DashboardError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "HOME env var not set",
            ))
        })?;
        self.save_to(&path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let cfg: DashboardConfig = serde_yaml::from_str(
            "url: ws://chamber.local:81\nwidgets:\n  candles: false\nprecision: 1\n",
        )
        .unwrap();
        assert_eq!(cfg.url, "ws://chamber.local:81");
        assert!(!cfg.widgets.candles);
        assert!(cfg.widgets.thermometer);
        assert_eq!(cfg.precision.get(), 1);
        assert_eq!(cfg.candles, CandleSettings::default());
    }

    #[test]
    fn bucket_ms_from_seconds() {
        let c = CandleSettings {
            bucket_secs: 5,
            cap: 10,
        };
        assert_eq!(c.bucket_ms(), 5_000);
        assert_eq!(CandleSettings::default().bucket_ms(), DEFAULT_BUCKET_MS);
    }
}
