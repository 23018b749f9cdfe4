use egui::{TextEdit, Ui};
use egui_phosphor::regular::WRENCH;

use super::panel_trait::{Panel, PanelState};
use crate::config::WidgetFlags;
use crate::data::commands::{AuxGroup, AuxiliaryForm};
use crate::engine::Engine;

/// Hysteresis, biases, fan limits and smoothing, grouped the way they are sent.
pub struct AuxiliaryPanel {
    state: PanelState,
}

impl Default for AuxiliaryPanel {
    fn default() -> Self {
        Self {
            state: PanelState::new("Auxiliary", WRENCH),
        }
    }
}

fn group_fields(form: &mut AuxiliaryForm, group: AuxGroup) -> Vec<(&'static str, &mut String)> {
    match group {
        AuxGroup::Hysteresis => vec![("Band", &mut form.hysteresis)],
        AuxGroup::Bias => vec![
            ("Warming", &mut form.warm_bias),
            ("Heating", &mut form.heat_bias),
        ],
        AuxGroup::FanCurve => vec![("Min", &mut form.fan_min), ("Max", &mut form.fan_max)],
        AuxGroup::Smoothing => vec![("Alpha", &mut form.alpha)],
    }
}

impl Panel for AuxiliaryPanel {
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
        let mut apply = None;
        egui::Grid::new("auxiliary_grid").num_columns(2).show(ui, |ui| {
            for group in AuxGroup::ALL {
                ui.strong(group.label());
                ui.horizontal(|ui| {
                    for (label, value) in group_fields(&mut engine.forms.auxiliary, group) {
                        ui.label(label);
                        ui.add(TextEdit::singleline(value).desired_width(60.0));
                    }
                    if ui.button("Apply").clicked() {
                        apply = Some(group);
                    }
                });
                ui.end_row();
            }
        });
        if let Some(group) = apply {
            engine.apply_auxiliary(group);
        }
        if ui.button("Apply all").clicked() {
            engine.apply_auxiliary_all();
        }
    }
}
