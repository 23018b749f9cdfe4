//! Event subscription for code embedding the dashboard.
//!
//! Observers subscribe through [`EventController`] with an [`EventFilter`].
//! Each event carries a set of [`EventKind`] flags and is delivered when
//! `(event.kinds & filter) != 0`.

use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::data::candles::Candle;

// ─────────────────────────────────────────────────────────────────────────────
// EventKind – bitflags
// ─────────────────────────────────────────────────────────────────────────────

/// Bitflags describing the categories an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventKind(pub u64);

impl EventKind {
    // ── Connection ──────────────────────────────────────────────────────
    /// Telemetry connection opened.
    pub const CONNECTED: Self = Self(1 << 0);
    /// Telemetry connection closed or errored.
    pub const DISCONNECTED: Self = Self(1 << 1);

    // ── Telemetry ───────────────────────────────────────────────────────
    /// An inbound message could not be parsed and was discarded.
    pub const SNAPSHOT_DROPPED: Self = Self(1 << 2);
    /// A render ran with the freshest snapshot.
    pub const RENDERED: Self = Self(1 << 3);
    /// The primary axis range widened.
    pub const RANGE_CHANGED: Self = Self(1 << 4);
    /// A new candle bucket was opened.
    pub const CANDLE_APPENDED: Self = Self(1 << 5);

    // ── Operator ────────────────────────────────────────────────────────
    /// A command was handed to the transport.
    pub const COMMAND_SENT: Self = Self(1 << 6);

    /// Wildcard: matches every event kind.
    pub const ALL: Self = Self(u64::MAX);

    /// Check whether `self` contains all bits in `other`.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// At least one bit in common.
    #[inline]
    pub const fn intersects(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for EventKind {
    type Output = Self;
    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "EMPTY");
        }
        if *self == EventKind::ALL {
            return write!(f, "ALL");
        }

        let pairs: &[(EventKind, &str)] = &[
            (EventKind::CONNECTED, "CONNECTED"),
            (EventKind::DISCONNECTED, "DISCONNECTED"),
            (EventKind::SNAPSHOT_DROPPED, "SNAPSHOT_DROPPED"),
            (EventKind::RENDERED, "RENDERED"),
            (EventKind::RANGE_CHANGED, "RANGE_CHANGED"),
            (EventKind::CANDLE_APPENDED, "CANDLE_APPENDED"),
            (EventKind::COMMAND_SENT, "COMMAND_SENT"),
        ];

        let mut names = Vec::new();
        let mut known_bits: u64 = 0;
        for (kind, name) in pairs {
            known_bits |= kind.0;
            if self.contains(*kind) {
                names.push((*name).to_string());
            }
        }
        let extra = self.0 & !known_bits;
        if extra != 0 {
            names.push(format!("0x{:x}", extra));
        }
        write!(f, "{}", names.join("|"))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Metadata
// ─────────────────────────────────────────────────────────────────────────────

/// New bounds after a range change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeMeta {
    pub low: f64,
    pub high: f64,
}

/// Why a message was discarded.
#[derive(Debug, Clone)]
pub struct DropMeta {
    pub reason: String,
    /// Total messages dropped so far in this session.
    pub total: u64,
}

// ─────────────────────────────────────────────────────────────────────────────
// DashboardEvent
// ─────────────────────────────────────────────────────────────────────────────

/// An event emitted by the dashboard engine.
#[derive(Debug, Clone)]
pub struct DashboardEvent {
    pub kinds: EventKind,
    /// Seconds since the controller was created.
    pub timestamp: f64,

    pub status: Option<String>,
    pub dropped: Option<DropMeta>,
    pub range: Option<RangeMeta>,
    pub candle: Option<Candle>,
    /// Command text as sent.
    pub command: Option<String>,
}

impl DashboardEvent {
    pub fn new(kinds: EventKind) -> Self {
        Self {
            kinds,
            timestamp: 0.0,
            status: None,
            dropped: None,
            range: None,
            candle: None,
            command: None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// EventFilter
// ─────────────────────────────────────────────────────────────────────────────

/// OR-mask selecting which events a subscriber receives.
#[derive(Debug, Clone, Copy)]
pub struct EventFilter {
    pub mask: EventKind,
}

impl EventFilter {
    pub const fn all() -> Self {
        Self {
            mask: EventKind::ALL,
        }
    }

    pub const fn only(mask: EventKind) -> Self {
        Self { mask }
    }

    #[inline]
    pub fn matches(&self, event: &DashboardEvent) -> bool {
        event.kinds.intersects(self.mask)
    }
}

impl Default for EventFilter {
    fn default() -> Self {
        Self::all()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// EventController
// ─────────────────────────────────────────────────────────────────────────────

struct Subscriber {
    filter: EventFilter,
    sender: Sender<DashboardEvent>,
}

struct EventCtrlInner {
    subscribers: Vec<Subscriber>,
    start_instant: std::time::Instant,
}

/// Collects engine events and fans them out to subscribers over `mpsc`.
#[derive(Clone)]
pub struct EventController {
    inner: Arc<Mutex<EventCtrlInner>>,
}

impl EventController {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(EventCtrlInner {
                subscribers: Vec::new(),
                start_instant: std::time::Instant::now(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, EventCtrlInner> {
        // A subscriber list is still usable after a panic elsewhere.
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Subscribe to events matching `filter`.
    pub fn subscribe(&self, filter: EventFilter) -> Receiver<DashboardEvent> {
        let (tx, rx) = std::sync::mpsc::channel();
        self.lock().subscribers.push(Subscriber { filter, sender: tx });
        rx
    }

    pub fn subscribe_all(&self) -> Receiver<DashboardEvent> {
        self.subscribe(EventFilter::all())
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    /// Deliver `event` to every matching subscriber. Subscribers whose
    /// receiver is gone are dropped on their next matching event.
    pub fn emit(&self, mut event: DashboardEvent) {
        let mut inner = self.lock();
        event.timestamp = inner.start_instant.elapsed().as_secs_f64();
        inner.subscribers.retain(|sub| {
            if sub.filter.matches(&event) {
                sub.sender.send(event.clone()).is_ok()
            } else {
                true
            }
        });
    }
}

impl Default for EventController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_union_and_intersection() {
        let both = EventKind::CONNECTED | EventKind::DISCONNECTED;
        assert!(both.contains(EventKind::CONNECTED));
        assert!(both.intersects(EventKind::DISCONNECTED));
        assert!(!EventKind::RENDERED.intersects(both));
        assert!(EventKind::ALL.contains(EventKind::COMMAND_SENT));
    }

    #[test]
    fn kind_display() {
        assert_eq!(EventKind(0).to_string(), "EMPTY");
        assert_eq!(EventKind::ALL.to_string(), "ALL");
        assert_eq!(
            (EventKind::RENDERED | EventKind::RANGE_CHANGED).to_string(),
            "RENDERED|RANGE_CHANGED"
        );
    }

    #[test]
    fn subscribe_and_emit_filtered() {
        let ctrl = EventController::new();
        let rx_all = ctrl.subscribe_all();
        let rx_cmd = ctrl.subscribe(EventFilter::only(EventKind::COMMAND_SENT));

        ctrl.emit(DashboardEvent::new(EventKind::RENDERED));
        assert!(rx_all.try_recv().is_ok());
        assert!(rx_cmd.try_recv().is_err());

        let mut evt = DashboardEvent::new(EventKind::COMMAND_SENT);
        evt.command = Some("get_status".into());
        ctrl.emit(evt);
        let got = rx_cmd.try_recv().unwrap();
        assert_eq!(got.command.as_deref(), Some("get_status"));
    }

    #[test]
    fn dead_subscribers_are_pruned() {
        let ctrl = EventController::new();
        drop(ctrl.subscribe_all());
        let _keep = ctrl.subscribe_all();
        ctrl.emit(DashboardEvent::new(EventKind::CONNECTED));
        assert_eq!(ctrl.subscriber_count(), 1);
    }
}
