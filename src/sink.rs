//! Channels between the transport thread and the dashboard.
//!
//! Inbound: the transport (or the demo simulator) pushes [`TelemetryEvent`]s
//! through a [`TelemetrySink`]; the UI thread drains the receiver once per
//! frame.
//!
//! Outbound: operator actions push [`Command`]s through a [`CommandSink`];
//! the transport drains them between socket reads.

use std::sync::mpsc::{Receiver, SendError, Sender};

use crate::data::commands::Command;

/// Connection lifecycle and payloads, as seen by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelemetryEvent {
    /// Connection established.
    Opened,
    /// One text frame carrying a JSON object.
    Message(String),
    /// Peer closed the connection.
    Closed,
    /// Connection failed; carries a human-readable reason.
    Errored(String),
}

/// Sender half for inbound telemetry.
#[derive(Clone)]
pub struct TelemetrySink {
    tx: Sender<TelemetryEvent>,
}

impl TelemetrySink {
    pub fn send(&self, event: TelemetryEvent) -> Result<(), SendError<TelemetryEvent>> {
        self.tx.send(event)
    }

    pub fn opened(&self) -> Result<(), SendError<TelemetryEvent>> {
        self.send(TelemetryEvent::Opened)
    }

    /// Forward one text frame.
    pub fn message<S: Into<String>>(&self, text: S) -> Result<(), SendError<TelemetryEvent>> {
        self.send(TelemetryEvent::Message(text.into()))
    }

    pub fn closed(&self) -> Result<(), SendError<TelemetryEvent>> {
        self.send(TelemetryEvent::Closed)
    }

    pub fn errored<S: Into<String>>(&self, reason: S) -> Result<(), SendError<TelemetryEvent>> {
        self.send(TelemetryEvent::Errored(reason.into()))
    }
}

/// Create a telemetry channel: the sink goes to the producer thread, the
/// receiver to the UI.
pub fn channel_telemetry() -> (TelemetrySink, Receiver<TelemetryEvent>) {
    let (tx, rx) = std::sync::mpsc::channel();
    (TelemetrySink { tx }, rx)
}

/// Sender half for outbound commands.
#[derive(Clone)]
pub struct CommandSink {
    tx: Sender<Command>,
}

impl CommandSink {
    pub fn send(&self, command: Command) -> Result<(), SendError<Command>> {
        self.tx.send(command)
    }
}

pub fn channel_commands() -> (CommandSink, Receiver<Command>) {
    let (tx, rx) = std::sync::mpsc::channel();
    (CommandSink { tx }, rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn telemetry_events_arrive_in_order() {
        let (sink, rx) = channel_telemetry();
        sink.opened().unwrap();
        sink.message("{}").unwrap();
        sink.errored("reset by peer").unwrap();
        let got: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            got,
            vec![
                TelemetryEvent::Opened,
                TelemetryEvent::Message("{}".into()),
                TelemetryEvent::Errored("reset by peer".into()),
            ]
        );
    }

    #[test]
    fn send_fails_once_receiver_is_gone() {
        let (sink, rx) = channel_commands();
        drop(rx);
        assert!(sink.send(Command::status_query()).is_err());
    }
}
