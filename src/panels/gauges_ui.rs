use egui::{ProgressBar, Ui};
use egui_phosphor::regular::GAUGE;

use super::panel_trait::{Panel, PanelState};
use crate::config::WidgetFlags;
use crate::engine::Engine;

/// Humidity, fan and heater duty as horizontal bars on a fixed 0..100 scale.
pub struct GaugesPanel {
    state: PanelState,
}

impl Default for GaugesPanel {
    fn default() -> Self {
        Self {
            state: PanelState::new("Gauges", GAUGE),
        }
    }
}

impl Panel for GaugesPanel {
    fn state(&self) -> &PanelState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut PanelState {
        &mut self.state
    }

    fn registered(&self, widgets: &WidgetFlags) -> bool {
        widgets.gauges
    }

    fn render_panel(&mut self, ui: &mut Ui, engine: &mut Engine) {
        let Some(gauges) = &engine.view().gauges else {
            return;
        };
        egui::Grid::new("gauges_grid")
            .num_columns(2)
            .spacing([8.0, 6.0])
            .show(ui, |ui| {
                for g in gauges {
                    ui.label(g.label);
                    let frac = g.fill.unwrap_or(0.0) / 100.0;
                    let text = g.text.clone().unwrap_or_else(|| "—".to_string());
                    ui.add(ProgressBar::new(frac as f32).text(text).desired_width(220.0));
                    ui.end_row();
                }
            });
    }
}
