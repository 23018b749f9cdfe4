use egui::{RichText, Ui};
use egui_phosphor::regular::LIST_BULLETS;

use super::panel_trait::{Panel, PanelState};
use crate::config::WidgetFlags;
use crate::engine::Engine;

/// Every field of the last rendered snapshot, formatted.
pub struct ReadoutsPanel {
    state: PanelState,
}

impl Default for ReadoutsPanel {
    fn default() -> Self {
        Self {
            state: PanelState::new("Readouts", LIST_BULLETS),
        }
    }
}

impl Panel for ReadoutsPanel {
    fn state(&self) -> &PanelState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut PanelState {
        &mut self.state
    }

    fn registered(&self, widgets: &WidgetFlags) -> bool {
        widgets.readouts
    }

    fn render_panel(&mut self, ui: &mut Ui, engine: &mut Engine) {
        let Some(readouts) = &engine.view().readouts else {
            return;
        };
        if readouts.is_empty() {
            ui.weak("No data");
            return;
        }
        egui::ScrollArea::vertical()
            .id_salt("readouts_scroll")
            .show(ui, |ui| {
                egui::Grid::new("readouts_grid")
                    .num_columns(2)
                    .striped(true)
                    .show(ui, |ui| {
                        for r in readouts {
                            ui.label(&r.label);
                            ui.label(RichText::new(&r.text).monospace());
                            ui.end_row();
                        }
                    });
            });
    }
}
