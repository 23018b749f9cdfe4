use egui::{RichText, Ui};
use egui_phosphor::regular::TERMINAL_WINDOW;

use super::panel_trait::{Panel, PanelState};
use crate::config::WidgetFlags;
use crate::data::commands::Command;
use crate::engine::Engine;

/// Controller console output plus a free-form command line.
pub struct ConsolePanel {
    state: PanelState,
    input: String,
    error: Option<String>,
}

impl Default for ConsolePanel {
    fn default() -> Self {
        Self {
            state: PanelState::new("Console", TERMINAL_WINDOW),
            input: String::new(),
            error: None,
        }
    }
}

impl Panel for ConsolePanel {
    fn state(&self) -> &PanelState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut PanelState {
        &mut self.state
    }

    fn registered(&self, widgets: &WidgetFlags) -> bool {
        widgets.console
    }

    fn render_panel(&mut self, ui: &mut Ui, engine: &mut Engine) {
        ui.horizontal(|ui| {
            let resp = ui.text_edit_singleline(&mut self.input);
            let entered = resp.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if entered || ui.button("Send").clicked() {
                match Command::parse(&self.input) {
                    Ok(cmd) => {
                        engine.send(cmd);
                        self.input.clear();
                        self.error = None;
                    }
                    Err(e) => self.error = Some(e.to_string()),
                }
            }
        });
        if let Some(err) = &self.error {
            ui.colored_label(ui.visuals().error_fg_color, err);
        }
        ui.separator();
        egui::ScrollArea::vertical()
            .id_salt("console_scroll")
            .stick_to_bottom(true)
            .show(ui, |ui| {
                for line in engine.console() {
                    ui.label(RichText::new(line).monospace());
                }
            });
    }
}
