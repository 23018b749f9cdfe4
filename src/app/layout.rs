//! Window layout: top bar, side panels and bottom console.

use eframe::egui;
use egui::{Color32, RichText};
use egui_phosphor::regular::{CIRCLE, MINUS, PLUS};

use crate::engine::{ConnectionStatus, Engine};
use crate::panels::Panel;

use super::DashboardApp;

const CONNECTED: Color32 = Color32::from_rgb(38, 166, 91);
const DISCONNECTED: Color32 = Color32::from_rgb(214, 69, 65);
const CONNECTING: Color32 = Color32::from_rgb(230, 160, 40);

fn status_color(status: &ConnectionStatus) -> Color32 {
    match status {
        ConnectionStatus::Connected => CONNECTED,
        ConnectionStatus::Connecting => CONNECTING,
        ConnectionStatus::Disconnected | ConnectionStatus::Error(_) => DISCONNECTED,
    }
}

/// Every visible and registered panel of `list`, stacked in collapsing sections.
fn render_stack(ui: &mut egui::Ui, list: &mut [Box<dyn Panel>], engine: &mut Engine) {
    for p in list.iter_mut() {
        if !p.state().visible || !p.registered(engine.widgets()) {
            continue;
        }
        let st = p.state();
        egui::CollapsingHeader::new(format!("{} {}", st.icon, st.title))
            .default_open(true)
            .show(ui, |ui| p.render_panel(ui, engine));
    }
}

fn any_shown(list: &[Box<dyn Panel>], engine: &Engine) -> bool {
    list.iter()
        .any(|p| p.state().visible && p.registered(engine.widgets()))
}

impl DashboardApp {
    pub(crate) fn render_top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("dashboard_top").show(ctx, |ui| {
            egui::MenuBar::new().ui(ui, |ui| {
                ui.menu_button("View", |ui| {
                    self.candles.render_menu(ui);
                    for p in self
                        .left_panels
                        .iter_mut()
                        .chain(self.right_panels.iter_mut())
                        .chain(self.bottom_panels.iter_mut())
                    {
                        p.render_menu(ui);
                    }
                });

                ui.separator();
                ui.strong(&self.title);
                ui.separator();

                let status = self.engine.status();
                ui.label(RichText::new(CIRCLE).color(status_color(status)));
                ui.label(status.label());

                ui.separator();
                let precision = self.engine.precision();
                ui.label("Precision");
                if ui.small_button(MINUS).clicked() {
                    self.engine.set_precision(precision.decrement());
                }
                ui.monospace(precision.get().to_string());
                if ui.small_button(PLUS).clicked() {
                    self.engine.set_precision(precision.increment());
                }

                let dropped = self.engine.dropped();
                if dropped > 0 {
                    ui.separator();
                    ui.colored_label(ui.visuals().warn_fg_color, format!("{dropped} dropped"));
                }
            });
        });
    }

    pub(crate) fn render_side_panels(&mut self, ctx: &egui::Context) {
        if any_shown(&self.bottom_panels, &self.engine) {
            egui::TopBottomPanel::bottom("dashboard_bottom")
                .resizable(true)
                .default_height(160.0)
                .show(ctx, |ui| {
                    render_stack(ui, &mut self.bottom_panels, &mut self.engine);
                });
        }

        if any_shown(&self.left_panels, &self.engine) {
            egui::SidePanel::left("dashboard_left")
                .resizable(true)
                .default_width(260.0)
                .min_width(180.0)
                .show(ctx, |ui| {
                    render_stack(ui, &mut self.left_panels, &mut self.engine);
                });
        }

        if any_shown(&self.right_panels, &self.engine) {
            egui::SidePanel::right("dashboard_right")
                .resizable(true)
                .default_width(340.0)
                .min_width(220.0)
                .show(ctx, |ui| {
                    egui::ScrollArea::vertical().show(ui, |ui| {
                        render_stack(ui, &mut self.right_panels, &mut self.engine);
                    });
                });
        }
    }
}
