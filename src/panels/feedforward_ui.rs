use egui::{TextEdit, Ui};
use egui_phosphor::regular::{MAGNIFYING_GLASS, TABLE};

use super::panel_trait::{Panel, PanelState};
use crate::config::WidgetFlags;
use crate::engine::Engine;

/// Editable feed-forward table; each row is sent on its own.
pub struct FeedforwardPanel {
    state: PanelState,
}

impl Default for FeedforwardPanel {
    fn default() -> Self {
        Self {
            state: PanelState::new("Feed-forward", TABLE),
        }
    }
}

impl Panel for FeedforwardPanel {
    fn state(&self) -> &PanelState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut PanelState {
        &mut self.state
    }

    fn registered(&self, widgets: &WidgetFlags) -> bool {
        widgets.controls
    }

    fn render_panel(&mut self, ui: &mut Ui, engine: &mut Engine) {
        let mut submit = None;
        egui::Grid::new("feedforward_grid")
            .num_columns(4)
            .striped(true)
            .show(ui, |ui| {
                ui.strong("#");
                ui.strong("Temperature");
                ui.strong("Fan speed");
                ui.label("");
                ui.end_row();
                for (i, row) in engine.forms.feedforward.iter_mut().enumerate() {
                    ui.label(row.index.to_string());
                    ui.add(TextEdit::singleline(&mut row.input).desired_width(70.0));
                    ui.add(TextEdit::singleline(&mut row.output).desired_width(70.0));
                    if ui.button("Set").clicked() {
                        submit = Some(i);
                    }
                    ui.end_row();
                }
            });
        if let Some(i) = submit {
            engine.submit_feedforward_row(i);
        }
        if ui.button(format!("{MAGNIFYING_GLASS} Query table")).clicked() {
            engine.query_feedforward();
        }
    }
}
