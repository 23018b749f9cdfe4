//! WebSocket transport to the controller.
//!
//! One background thread owns the socket. It forwards every inbound text frame
//! to a [`TelemetrySink`] and, between reads, sends whatever commands are queued
//! on the outbound receiver. A short read timeout keeps the outbound side
//! responsive while the controller is quiet.
//!
//! There is no reconnect: when the connection ends the thread reports
//! `Closed` or `Errored` and exits.

use std::io::ErrorKind;
use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{debug, info, warn};
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

use crate::data::commands::Command;
use crate::error::Result;
use crate::sink::TelemetrySink;

/// How long a read may block before queued commands get a turn.
pub const READ_TIMEOUT: Duration = Duration::from_millis(50);

type Socket = WebSocket<MaybeTlsStream<TcpStream>>;

/// Handle to a running transport thread.
pub struct TransportHandle {
    stop: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

impl TransportHandle {
    /// Ask the thread to close the socket and exit.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Stop and wait for the thread.
    pub fn join(self) {
        self.stop();
        let _ = self.thread.join();
    }
}

/// Connect to `url` on a background thread.
pub fn spawn_websocket(
    url: impl Into<String>,
    sink: TelemetrySink,
    commands: Receiver<Command>,
) -> std::io::Result<TransportHandle> {
    let url = url.into();
    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = Arc::clone(&stop);
    let thread = std::thread::Builder::new()
        .name("chamberscope-ws".into())
        .spawn(move || {
            if let Err(e) = run(&url, &sink, &commands, &stop_flag) {
                warn!(%url, error = %e, "websocket transport failed");
                let _ = sink.errored(e.to_string());
            }
        })?;
    Ok(TransportHandle { stop, thread })
}

fn configure_read_timeout(socket: &mut Socket) -> Result<()> {
    if let MaybeTlsStream::Plain(stream) = socket.get_mut() {
        stream.set_read_timeout(Some(READ_TIMEOUT))?;
    }
    Ok(())
}

fn run(
    url: &str,
    sink: &TelemetrySink,
    commands: &Receiver<Command>,
    stop: &AtomicBool,
) -> Result<()> {
    info!(%url, "connecting");
    let (mut socket, response) = tungstenite::connect(url)?;
    debug!(status = %response.status(), "websocket handshake complete");
    configure_read_timeout(&mut socket)?;
    if sink.opened().is_err() {
        return Ok(());
    }

    loop {
        if stop.load(Ordering::Relaxed) {
            let _ = socket.close(None);
            let _ = socket.flush();
            let _ = sink.closed();
            return Ok(());
        }

        while let Ok(cmd) = commands.try_recv() {
            let text = cmd.to_string();
            debug!(command = %text, "writing command");
            socket.send(Message::text(text))?;
        }

        match socket.read() {
            Ok(Message::Text(text)) => {
                if sink.message(text.as_str()).is_err() {
                    // Dashboard is gone.
                    let _ = socket.close(None);
                    return Ok(());
                }
            }
            Ok(Message::Binary(bytes)) => match std::str::from_utf8(&bytes) {
                Ok(text) => {
                    let _ = sink.message(text);
                }
                Err(_) => debug!(len = bytes.len(), "ignoring non-UTF-8 binary frame"),
            },
            Ok(Message::Close(frame)) => {
                info!(?frame, "peer closed the connection");
                let _ = sink.closed();
                return Ok(());
            }
            Ok(_) => {}
            Err(tungstenite::Error::Io(err))
                if matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {}
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                let _ = sink.closed();
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{channel_commands, channel_telemetry, TelemetryEvent};

    #[test]
    fn unreachable_endpoint_reports_error() {
        let (sink, rx) = channel_telemetry();
        let (_cmd_tx, cmd_rx) = channel_commands();
        // Port 9 on localhost is almost never listening.
        let handle = spawn_websocket("ws://127.0.0.1:9/", sink, cmd_rx).unwrap();
        let evt = rx.recv_timeout(Duration::from_secs(10)).unwrap();
        assert!(matches!(evt, TelemetryEvent::Errored(_)));
        handle.join();
    }
}
