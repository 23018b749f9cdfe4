use egui::{ComboBox, TextEdit, Ui};
use egui_phosphor::regular::{ARROWS_CLOCKWISE, SLIDERS_HORIZONTAL};

use super::panel_trait::{Panel, PanelState};
use crate::config::WidgetFlags;
use crate::data::commands::ControlMode;
use crate::engine::Engine;

const FIELD_WIDTH: f32 = 90.0;

/// Setpoint and PID gain entry.
pub struct ControlsPanel {
    state: PanelState,
}

impl Default for ControlsPanel {
    fn default() -> Self {
        Self {
            state: PanelState::new("Controls", SLIDERS_HORIZONTAL),
        }
    }
}

impl Panel for ControlsPanel {
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
        if let Some(state) = &engine.view().control_state {
            ui.label(format!("Control state: {state}"));
        }

        ui.horizontal(|ui| {
            ui.label("Target");
            ui.add(
                TextEdit::singleline(&mut engine.forms.setpoint.target).desired_width(FIELD_WIDTH),
            );
            ui.label("°C");
            if ui.button("Set").clicked() {
                engine.submit_setpoint();
            }
        });

        ui.separator();

        let mut mode = engine.forms.gains.mode();
        ComboBox::from_id_salt("control_mode")
            .selected_text(mode.label())
            .show_ui(ui, |ui| {
                for m in ControlMode::ALL {
                    ui.selectable_value(&mut mode, m, m.label());
                }
            });
        if mode != engine.forms.gains.mode() {
            engine.set_control_mode(mode);
        }

        let derivative = engine.forms.gains.derivative_enabled();
        egui::Grid::new("gains_grid").num_columns(2).show(ui, |ui| {
            let gains = &mut engine.forms.gains;
            ui.label("Kp");
            ui.add(TextEdit::singleline(&mut gains.kp).desired_width(FIELD_WIDTH));
            ui.end_row();
            ui.label("Ki");
            ui.add(TextEdit::singleline(&mut gains.ki).desired_width(FIELD_WIDTH));
            ui.end_row();
            ui.label("Kd");
            ui.add_enabled(
                derivative,
                TextEdit::singleline(&mut gains.kd).desired_width(FIELD_WIDTH),
            );
            ui.end_row();
        });

        ui.horizontal(|ui| {
            if ui.button("Apply gains").clicked() {
                engine.submit_gains();
            }
            if ui
                .button(format!("{ARROWS_CLOCKWISE} Status"))
                .clicked()
            {
                engine.request_status();
            }
        });
    }
}
