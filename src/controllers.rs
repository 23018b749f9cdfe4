//! Controller for driving a running dashboard from external code.
//!
//! The controller records requests (precision changes, commands to send)
//! that the UI picks up on its next frame, and publishes a small
//! [`SessionInfo`] summary after every frame that rendered.

use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::data::commands::Command;
use crate::data::format::Precision;

/// Summary of the running session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionInfo {
    pub status: String,
    pub precision: Precision,
    pub range: (f64, f64),
    pub candles: usize,
    pub renders: u64,
    pub dropped: u64,
}

/// Requests queued for the UI thread.
#[derive(Debug, Default)]
pub(crate) struct SessionRequests {
    pub(crate) precision: Option<Precision>,
    pub(crate) commands: Vec<Command>,
}

#[derive(Clone)]
pub struct SessionController {
    inner: Arc<Mutex<SessionCtrlInner>>,
}

struct SessionCtrlInner {
    last: Option<SessionInfo>,
    requests: SessionRequests,
    listeners: Vec<Sender<SessionInfo>>,
}

impl SessionController {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SessionCtrlInner {
                last: None,
                requests: SessionRequests::default(),
                listeners: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionCtrlInner> {
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Last published summary, if the UI has rendered at least once.
    pub fn info(&self) -> Option<SessionInfo> {
        self.lock().last.clone()
    }

    /// Change the primary-axis precision on the next frame.
    pub fn request_precision(&self, precision: Precision) {
        self.lock().requests.precision = Some(precision);
    }

    /// Send `command` through the dashboard on the next frame.
    pub fn request_command(&self, command: Command) {
        self.lock().requests.commands.push(command);
    }

    /// Receive a [`SessionInfo`] after every frame that rendered.
    pub fn subscribe(&self) -> Receiver<SessionInfo> {
        let (tx, rx) = std::sync::mpsc::channel();
        self.lock().listeners.push(tx);
        rx
    }

    pub(crate) fn take_requests(&self) -> SessionRequests {
        std::mem::take(&mut self.lock().requests)
    }

    pub(crate) fn publish(&self, info: SessionInfo) {
        let mut inner = self.lock();
        inner.listeners.retain(|tx| tx.send(info.clone()).is_ok());
        inner.last = Some(info);
    }
}

impl Default for SessionController {
    fn default() -> Self {
        Self::new()
    }
}
