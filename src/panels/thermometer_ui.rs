//! Vertical thermometer: fill, current and target markers, tolerance band
//! and scale labels. All positions come precomputed in percent from the view.

use egui::{pos2, vec2, Align2, Color32, FontId, Rect, Sense, Stroke, StrokeKind, Ui};
use egui_phosphor::regular::THERMOMETER;

use super::panel_trait::{Panel, PanelState};
use crate::config::WidgetFlags;
use crate::data::view::{Marker, ThermometerView};
use crate::engine::Engine;

const TUBE_WIDTH: f32 = 28.0;
const LABEL_GAP: f32 = 8.0;

const FILL_COLOR: Color32 = Color32::from_rgb(231, 111, 81);
const TARGET_COLOR: Color32 = Color32::from_rgb(42, 157, 143);
const BAND_COLOR: Color32 = Color32::from_rgba_premultiplied(42, 157, 143, 60);

pub struct ThermometerPanel {
    state: PanelState,
}

impl Default for ThermometerPanel {
    fn default() -> Self {
        Self {
            state: PanelState::new("Thermometer", THERMOMETER),
        }
    }
}

/// Screen y of a percentage measured from the bottom of `rect`.
fn y_at(rect: Rect, percent: f64) -> f32 {
    rect.bottom() - rect.height() * (percent as f32 / 100.0)
}

/// Line across the tube, label to its right.
fn draw_marker(ui: &Ui, tube: Rect, marker: &Marker, color: Color32) {
    let painter = ui.painter();
    let y = y_at(tube, marker.position);
    painter.line_segment(
        [pos2(tube.left() - 4.0, y), pos2(tube.right() + 4.0, y)],
        Stroke::new(2.0, color),
    );
    let ly = y_at(tube, marker.label_position);
    painter.text(
        pos2(tube.right() + LABEL_GAP, ly),
        Align2::LEFT_CENTER,
        &marker.text,
        FontId::proportional(13.0),
        color,
    );
}

fn draw(ui: &mut Ui, view: &ThermometerView) {
    let height = ui.available_height().max(200.0);
    let width = TUBE_WIDTH + 2.0 * 80.0;
    let (rect, _) = ui.allocate_exact_size(vec2(width, height), Sense::hover());
    let tube = Rect::from_center_size(rect.center(), vec2(TUBE_WIDTH, rect.height() - 16.0));
    let visuals = ui.visuals();
    let painter = ui.painter();

    painter.rect_filled(tube, 6.0, visuals.extreme_bg_color);

    if let Some(band) = view.band {
        let r = Rect::from_min_max(
            pos2(tube.left(), y_at(tube, band.end)),
            pos2(tube.right(), y_at(tube, band.start)),
        );
        painter.rect_filled(r, 0.0, BAND_COLOR);
    }

    if let Some(fill) = view.fill {
        let r = Rect::from_min_max(pos2(tube.left(), y_at(tube, fill)), tube.right_bottom());
        painter.rect_filled(r, 6.0, FILL_COLOR);
    }

    painter.rect_stroke(
        tube,
        6.0,
        visuals.widgets.noninteractive.bg_stroke,
        StrokeKind::Outside,
    );

    if let Some(ticks) = &view.scale {
        let color = visuals.weak_text_color();
        for tick in ticks {
            let y = y_at(tube, tick.position);
            painter.line_segment(
                [pos2(tube.left() - 3.0, y), pos2(tube.left(), y)],
                Stroke::new(1.0, color),
            );
            painter.text(
                pos2(tube.left() - LABEL_GAP, y),
                Align2::RIGHT_CENTER,
                &tick.label,
                FontId::proportional(11.0),
                color,
            );
        }
    }

    let text_color = ui.visuals().strong_text_color();
    if let Some(target) = &view.target {
        draw_marker(ui, tube, target, TARGET_COLOR);
    }
    if let Some(current) = &view.current {
        draw_marker(ui, tube, current, text_color);
    }
}

impl Panel for ThermometerPanel {
    fn state(&self) -> &PanelState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut PanelState {
        &mut self.state
    }

    fn registered(&self, widgets: &WidgetFlags) -> bool {
        widgets.thermometer
    }

    fn render_panel(&mut self, ui: &mut Ui, engine: &mut Engine) {
        match &engine.view().thermometer {
            Some(view) => draw(ui, view),
            None => {
                ui.weak("Waiting for telemetry…");
            }
        }
    }
}
