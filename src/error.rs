//! Error type shared by the parsing, configuration and transport layers.
//!
//! None of these errors is fatal to the dashboard: the engine logs them and
//! keeps going with the next message.

use thiserror::Error;

/// Errors surfaced by chamberscope.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// Inbound payload is not valid JSON.
    #[error("malformed telemetry payload: {0}")]
    Parse(#[from] serde_json::Error),

    /// Inbound payload parsed but is not a JSON object.
    #[error("telemetry payload is not a JSON object (got {0})")]
    NotAnObject(&'static str),

    /// Configuration file could not be (de)serialized.
    #[error("configuration error: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// WebSocket connection failed or dropped.
    #[error("transport error: {0}")]
    Transport(#[from] tungstenite::Error),

    /// An outbound command text could not be understood.
    #[error("invalid command: {0}")]
    Command(String),
}

pub type Result<T> = std::result::Result<T, DashboardError>;
