//! Candle chart of the primary temperature.
//!
//! The panel keeps its own copy of the series and brings it up to date from
//! the [`ChartUpdate`] each render produces: a full resync when a bucket
//! opened, a last-point replacement otherwise.

use egui::{Color32, Stroke, Ui};
use egui_phosphor::regular::CHART_BAR;
use egui_plot::{BoxElem, BoxPlot, BoxSpread, Plot};

use super::panel_trait::{Panel, PanelState};
use crate::config::WidgetFlags;
use crate::data::candles::{Candle, ChartUpdate};
use crate::data::format::format_bucket_time;
use crate::data::view::PRIMARY_UNIT;
use crate::engine::Engine;

const RISING: Color32 = Color32::from_rgb(38, 166, 91);
const FALLING: Color32 = Color32::from_rgb(214, 69, 65);

/// Chart-side mirror of the candle window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    pub fn apply(&mut self, update: ChartUpdate) {
        match update {
            ChartUpdate::Resync(candles) => self.candles = candles,
            ChartUpdate::Point(candle) => match self.candles.last_mut() {
                Some(last) if last.bucket_start_ms == candle.bucket_start_ms => *last = candle,
                _ => self.candles.push(candle),
            },
        }
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }
}

fn candle_elem(c: &Candle, bucket_secs: f64) -> BoxElem {
    let x = c.bucket_start_ms as f64 / 1000.0 + bucket_secs / 2.0;
    let (body_lo, body_hi) = if c.is_rising() {
        (c.open, c.close)
    } else {
        (c.close, c.open)
    };
    let color = if c.is_rising() { RISING } else { FALLING };
    BoxElem::new(x, BoxSpread::new(c.low, body_lo, c.close, body_hi, c.high))
        .box_width(bucket_secs * 0.7)
        .whisker_width(0.0)
        .fill(color.gamma_multiply(0.6))
        .stroke(Stroke::new(1.0, color))
}

pub struct CandlesPanel {
    state: PanelState,
    series: CandleSeries,
}

impl Default for CandlesPanel {
    fn default() -> Self {
        Self {
            state: PanelState::new("Candles", CHART_BAR),
            series: CandleSeries::default(),
        }
    }
}

impl CandlesPanel {
    pub fn series(&self) -> &CandleSeries {
        &self.series
    }
}

impl Panel for CandlesPanel {
    fn state(&self) -> &PanelState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut PanelState {
        &mut self.state
    }

    fn registered(&self, widgets: &WidgetFlags) -> bool {
        widgets.candles
    }

    fn sync(&mut self, engine: &mut Engine) {
        if let Some(update) = engine.take_chart_update() {
            self.series.apply(update);
        }
    }

    fn render_panel(&mut self, ui: &mut Ui, engine: &mut Engine) {
        let bucket_secs = engine.session().candles.bucket_ms() as f64 / 1000.0;
        let decimals = engine.precision().decimals();
        let boxes: Vec<BoxElem> = self
            .series
            .candles()
            .iter()
            .map(|c| candle_elem(c, bucket_secs))
            .collect();

        Plot::new("candles_plot")
            .allow_scroll(false)
            .x_axis_formatter(|x, _range| format_bucket_time((x.value * 1000.0) as i64))
            .y_axis_formatter(move |y, _range| format!("{:.*} {}", decimals, y.value, PRIMARY_UNIT))
            .show(ui, |plot_ui| {
                plot_ui.box_plot(BoxPlot::new("Temperature", boxes));
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(start: i64, open: f64, close: f64) -> Candle {
        Candle {
            bucket_start_ms: start,
            open,
            high: open.max(close),
            low: open.min(close),
            close,
        }
    }

    #[test]
    fn point_replaces_the_last_candle() {
        let mut s = CandleSeries::default();
        s.apply(ChartUpdate::Resync(vec![candle(0, 20.0, 21.0), candle(60_000, 21.0, 21.5)]));
        s.apply(ChartUpdate::Point(candle(60_000, 21.0, 22.0)));
        assert_eq!(s.len(), 2);
        assert_eq!(s.candles()[1].close, 22.0);
    }

    #[test]
    fn resync_replaces_everything() {
        let mut s = CandleSeries::default();
        s.apply(ChartUpdate::Resync(vec![candle(0, 20.0, 21.0)]));
        s.apply(ChartUpdate::Resync(vec![candle(60_000, 1.0, 2.0), candle(120_000, 2.0, 1.0)]));
        assert_eq!(s.len(), 2);
        assert_eq!(s.candles()[0].bucket_start_ms, 60_000);
    }

    #[test]
    fn point_on_empty_series_appends() {
        let mut s = CandleSeries::default();
        assert!(s.is_empty());
        s.apply(ChartUpdate::Point(candle(0, 5.0, 6.0)));
        assert_eq!(s.len(), 1);
    }
}
