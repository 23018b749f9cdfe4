//! Entry point for running the dashboard as a native window.

use std::sync::mpsc::Receiver;

use eframe::egui;

use crate::config::DashboardConfig;
use crate::controllers::SessionController;
use crate::engine::Engine;
use crate::events::EventController;
use crate::sink::{CommandSink, TelemetryEvent};

use super::DashboardApp;

/// Optional collaborators attached to the engine before the window opens.
#[derive(Default)]
pub struct Attachments {
    pub commands: Option<CommandSink>,
    pub events: Option<EventController>,
    pub controller: Option<SessionController>,
}

/// Build the engine from `config`, open a native window and block until it
/// is closed.
pub fn run_dashboard(
    config: &DashboardConfig,
    rx: Receiver<TelemetryEvent>,
    attachments: Attachments,
) -> eframe::Result<()> {
    let mut engine = Engine::new(config);
    if let Some(sink) = attachments.commands {
        engine = engine.with_command_sink(sink);
    }
    if let Some(events) = attachments.events {
        engine = engine.with_events(events);
    }
    if let Some(ctrl) = attachments.controller {
        engine = engine.with_controller(ctrl);
    }
    let app = DashboardApp::new(engine, rx, config.title.clone());

    let opts = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size(egui::vec2(1400.0, 900.0)),
        ..Default::default()
    };

    eframe::run_native(
        &config.title,
        opts,
        Box::new(|cc| {
            // Install Phosphor icon font before creating the app.
            let mut fonts = egui::FontDefinitions::default();
            egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
            cc.egui_ctx.set_fonts(fonts);
            Ok(Box::new(app))
        }),
    )
}
