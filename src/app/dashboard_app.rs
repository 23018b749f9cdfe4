//! Standalone dashboard application.
//!
//! [`DashboardApp`] owns the [`Engine`] and the panels, drains the telemetry
//! channel each frame and implements [`eframe::App`].

use std::sync::mpsc::Receiver;

use eframe::egui;

use crate::engine::Engine;
use crate::panels::{
    AuxiliaryPanel, CandlesPanel, ConsolePanel, ControlsPanel, FeedforwardPanel, GaugesPanel,
    Panel, ReadoutsPanel, ThermometerPanel,
};
use crate::sink::TelemetryEvent;

// ─────────────────────────────────────────────────────────────────────────────
// DashboardApp
// ─────────────────────────────────────────────────────────────────────────────

pub struct DashboardApp {
    pub engine: Engine,
    rx: Receiver<TelemetryEvent>,
    pub(crate) title: String,

    pub(crate) left_panels: Vec<Box<dyn Panel>>,
    pub(crate) right_panels: Vec<Box<dyn Panel>>,
    pub(crate) bottom_panels: Vec<Box<dyn Panel>>,
    pub(crate) candles: CandlesPanel,
}

impl DashboardApp {
    pub fn new(engine: Engine, rx: Receiver<TelemetryEvent>, title: impl Into<String>) -> Self {
        Self {
            engine,
            rx,
            title: title.into(),
            left_panels: vec![
                Box::new(ThermometerPanel::default()),
                Box::new(GaugesPanel::default()),
            ],
            right_panels: vec![
                Box::new(ControlsPanel::default()),
                Box::new(FeedforwardPanel::default()),
                Box::new(AuxiliaryPanel::default()),
                Box::new(ReadoutsPanel::default()),
            ],
            bottom_panels: vec![Box::new(ConsolePanel::default())],
            candles: CandlesPanel::default(),
        }
    }

    /// Data pass for one frame.
    ///
    /// Renders whatever the previous frames scheduled, lets every panel pick
    /// up its part of the result, then drains the channel. Returns whether a
    /// new render was scheduled.
    pub fn update_data(&mut self) -> bool {
        self.engine.poll_controller();
        self.engine.on_frame();

        self.candles.sync(&mut self.engine);
        for p in self
            .left_panels
            .iter_mut()
            .chain(self.right_panels.iter_mut())
            .chain(self.bottom_panels.iter_mut())
        {
            p.sync(&mut self.engine);
        }

        self.engine.drain(&self.rx)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// eframe integration
// ─────────────────────────────────────────────────────────────────────────────

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.update_data() {
            ctx.request_repaint();
        }

        self.render_top_bar(ctx);
        self.render_side_panels(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            if self.candles.registered(self.engine.widgets()) && self.candles.state().visible {
                self.candles.render_panel(ui, &mut self.engine);
            }
        });

        // Keep polling the channel (~60 fps).
        ctx.request_repaint_after(std::time::Duration::from_millis(16));
    }
}
