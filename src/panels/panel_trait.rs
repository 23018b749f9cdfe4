use egui::Ui;

use crate::config::WidgetFlags;
use crate::engine::Engine;

#[derive(Debug, Clone, Copy)]
pub struct PanelState {
    pub title: &'static str,
    pub icon: &'static str,
    pub visible: bool,
}

impl PanelState {
    pub fn new(title: &'static str, icon: &'static str) -> Self {
        Self {
            title,
            icon,
            visible: true,
        }
    }
}

pub trait Panel {
    fn state(&self) -> &PanelState;
    fn state_mut(&mut self) -> &mut PanelState;

    fn name(&self) -> &'static str {
        self.state().title
    }

    /// Whether the widget this panel draws is registered.
    fn registered(&self, widgets: &WidgetFlags) -> bool;

    /// Called every frame before layout, whether or not the panel is shown.
    fn sync(&mut self, _engine: &mut Engine) {}

    fn render_panel(&mut self, ui: &mut Ui, engine: &mut Engine);

    /// Visibility toggle for the View menu.
    fn render_menu(&mut self, ui: &mut Ui) {
        let st = self.state_mut();
        let label = format!("{} {}", st.icon, st.title);
        ui.checkbox(&mut st.visible, label);
    }
}
