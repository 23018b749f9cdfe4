//! Chamberscope crate root: module wiring and re-exports.
//!
//! A live dashboard for a thermal test chamber controller:
//! - `sink`: channels between the transport and the UI
//! - `data`: snapshot model, enrichment, range tracking, geometry, candles,
//!   render scheduling, formatting and the command grammar
//! - `engine`: session state and the per-frame render pass
//! - `transport`: WebSocket connection to the controller
//! - `demo`: in-process simulated chamber
//! - `panels` / `app`: egui widgets and the eframe application

pub mod app;
pub mod config;
pub mod controllers;
pub mod data;
pub mod engine;
pub mod error;
pub mod events;
pub mod panels;
pub mod sink;
pub mod transport;

#[cfg(feature = "demo")]
pub mod demo;

pub use app::{run_dashboard, Attachments, DashboardApp};
pub use config::{DashboardConfig, WidgetFlags};
pub use controllers::{SessionController, SessionInfo};
pub use data::commands::{Command, ControlMode};
pub use data::format::Precision;
pub use data::snapshot::{Field, Snapshot};
pub use engine::{ConnectionStatus, Engine};
pub use error::{DashboardError, Result};
pub use events::{DashboardEvent, EventController, EventFilter, EventKind};
pub use sink::{channel_commands, channel_telemetry, CommandSink, TelemetryEvent, TelemetrySink};
