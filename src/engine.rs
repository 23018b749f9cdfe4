//! Dashboard engine: session state, event handling and per-frame rendering.
//!
//! Single-threaded. The UI thread feeds [`TelemetryEvent`]s in through
//! [`Engine::handle_event`] and calls [`Engine::on_frame`] once per display
//! refresh. Operator actions go out through the attached [`CommandSink`].

use std::collections::VecDeque;
use std::sync::mpsc::Receiver;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::{DashboardConfig, WidgetFlags};
use crate::controllers::{SessionController, SessionInfo};
use crate::data::candles::{Candle, CandleAggregator, ChartUpdate, IngestOutcome};
use crate::data::commands::{
    AuxGroup, AuxiliaryForm, Command, ControlMode, FeedforwardRow, GainForm, SetpointForm,
};
use crate::data::enrich::enrich;
use crate::data::format::Precision;
use crate::data::range::RangeTracker;
use crate::data::scheduler::RenderScheduler;
use crate::data::snapshot::{Field, Snapshot};
use crate::data::view::DashboardView;
use crate::events::{DashboardEvent, DropMeta, EventController, EventKind, RangeMeta};
use crate::sink::{CommandSink, TelemetryEvent};

/// Wall-clock milliseconds since the Unix epoch.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Connecting,
    Connected,
    Disconnected,
    Error(String),
}

impl ConnectionStatus {
    pub fn label(&self) -> String {
        match self {
            ConnectionStatus::Connecting => "Connecting…".to_string(),
            ConnectionStatus::Connected => "Connected".to_string(),
            ConnectionStatus::Disconnected => "Disconnected".to_string(),
            ConnectionStatus::Error(e) => format!("Error: {e}"),
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionStatus::Connected)
    }
}

/// A snapshot waiting for its render, with the time it arrived.
#[derive(Debug, Clone)]
pub struct Received {
    pub snapshot: Snapshot,
    pub received_ms: i64,
}

/// State that lives for the whole session. Never reset on disconnect.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub range: RangeTracker,
    pub candles: CandleAggregator,
    pub precision: Precision,
    /// Candles changed since the last render.
    chart_dirty: bool,
    /// A bucket opened since the last render.
    chart_resync: bool,
}

/// What one received snapshot did to the session.
#[derive(Debug, Clone, Default)]
pub struct Ingested {
    pub range_changed: bool,
    /// The candle that was opened, when the bucket rolled over.
    pub appended: Option<Candle>,
}

impl SessionState {
    pub fn new(config: &DashboardConfig) -> Self {
        Self {
            range: RangeTracker::new(config.range),
            candles: CandleAggregator::new(config.candles.bucket_ms(), config.candles.cap),
            precision: config.precision,
            chart_dirty: false,
            chart_resync: false,
        }
    }

    /// Widen the range and fold the current temperature into the candle
    /// window at `received_ms`. Runs for every snapshot, rendered or not.
    pub fn ingest(&mut self, snap: &Snapshot, received_ms: i64) -> Ingested {
        let current = snap.current_temperature();
        let range_changed = self
            .range
            .extend(current.into_iter().chain(snap.target_temperature()));

        let mut appended = None;
        if let Some(v) = current {
            match self.candles.ingest(v, received_ms) {
                IngestOutcome::Appended => {
                    self.chart_dirty = true;
                    self.chart_resync = true;
                    appended = self.candles.latest();
                }
                IngestOutcome::Updated => self.chart_dirty = true,
                IngestOutcome::Ignored => {}
            }
        }
        Ingested {
            range_changed,
            appended,
        }
    }

    /// Chart work accumulated since the last render. A full resync when any
    /// bucket opened, otherwise the in-progress candle.
    fn pending_chart_update(&mut self) -> Option<ChartUpdate> {
        let dirty = std::mem::take(&mut self.chart_dirty);
        let resync = std::mem::take(&mut self.chart_resync);
        if resync {
            Some(ChartUpdate::Resync(self.candles.series()))
        } else if dirty {
            self.candles.latest().map(ChartUpdate::Point)
        } else {
            None
        }
    }

    /// Build the view for `snap` from the session as it stands.
    pub fn render(&mut self, snap: &Snapshot, widgets: &WidgetFlags) -> DashboardView {
        let chart = self.pending_chart_update();
        DashboardView::build(snap, &self.range, self.precision, widgets, chart)
    }
}

/// Text fields the operator edits.
#[derive(Debug, Clone, Default)]
pub struct OperatorForms {
    pub setpoint: SetpointForm,
    pub gains: GainForm,
    pub feedforward: Vec<FeedforwardRow>,
    pub auxiliary: AuxiliaryForm,
}

impl OperatorForms {
    fn prefill(&mut self, snap: &Snapshot) {
        if let Some(t) = snap.target_temperature() {
            self.setpoint.prefill(t);
        }
        self.gains.prefill(
            snap.number(Field::PidKp),
            snap.number(Field::PidKi),
            snap.number(Field::PidKd),
        );
        let aux = &mut self.auxiliary;
        for (field, slot) in [
            (Field::HysteresisBand, &mut aux.hysteresis),
            (Field::WarmingBias, &mut aux.warm_bias),
            (Field::HeatingBias, &mut aux.heat_bias),
            (Field::FanMin, &mut aux.fan_min),
            (Field::FanMax, &mut aux.fan_max),
            (Field::FanSmoothAlpha, &mut aux.alpha),
        ] {
            if let Some(v) = snap.number(field) {
                *slot = v.to_string();
            }
        }
    }
}

/// Lines of controller console output carried in a `console` array.
fn console_lines(snap: &Snapshot) -> Vec<String> {
    match snap.extra.get("console") {
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        Some(Value::String(s)) => vec![s.clone()],
        _ => Vec::new(),
    }
}

pub struct Engine {
    widgets: WidgetFlags,
    feedforward_rows: usize,
    console_cap: usize,

    session: SessionState,
    scheduler: RenderScheduler<Received>,
    last: Option<Received>,
    view: DashboardView,

    pub forms: OperatorForms,
    status: ConnectionStatus,
    console: VecDeque<String>,
    dropped: u64,
    prefilled: bool,

    commands: Option<CommandSink>,
    events: Option<EventController>,
    controller: Option<SessionController>,
}

impl Engine {
    pub fn new(config: &DashboardConfig) -> Self {
        let forms = OperatorForms {
            feedforward: (0..config.feedforward_rows).map(FeedforwardRow::new).collect(),
            ..OperatorForms::default()
        };
        Self {
            widgets: config.widgets.clone(),
            feedforward_rows: config.feedforward_rows,
            console_cap: config.console_lines.max(1),
            session: SessionState::new(config),
            scheduler: RenderScheduler::new(),
            last: None,
            view: DashboardView::default(),
            forms,
            status: ConnectionStatus::default(),
            console: VecDeque::new(),
            dropped: 0,
            prefilled: false,
            commands: None,
            events: None,
            controller: None,
        }
    }

    pub fn with_command_sink(mut self, sink: CommandSink) -> Self {
        self.commands = Some(sink);
        self
    }

    pub fn with_events(mut self, events: EventController) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_controller(mut self, controller: SessionController) -> Self {
        self.controller = Some(controller);
        self
    }

    // ── Accessors ───────────────────────────────────────────────────────

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn scheduler(&self) -> &RenderScheduler<Received> {
        &self.scheduler
    }

    /// View built by the last render.
    pub fn view(&self) -> &DashboardView {
        &self.view
    }

    pub fn widgets(&self) -> &WidgetFlags {
        &self.widgets
    }

    pub fn status(&self) -> &ConnectionStatus {
        &self.status
    }

    pub fn console(&self) -> impl Iterator<Item = &str> {
        self.console.iter().map(String::as_str)
    }

    /// Messages discarded because they could not be parsed.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn precision(&self) -> Precision {
        self.session.precision
    }

    /// Take the pending chart update produced by the last render.
    pub fn take_chart_update(&mut self) -> Option<ChartUpdate> {
        self.view.chart.take()
    }

    fn emit(&self, event: DashboardEvent) {
        if let Some(events) = &self.events {
            events.emit(event);
        }
    }

    // ── Inbound ─────────────────────────────────────────────────────────

    /// Feed one connection event. Returns `true` when the caller must
    /// schedule a refresh.
    pub fn handle_event(&mut self, event: TelemetryEvent, now_ms: i64) -> bool {
        match event {
            TelemetryEvent::Opened => {
                info!("telemetry connection opened");
                self.status = ConnectionStatus::Connected;
                self.forms.feedforward = (0..self.feedforward_rows).map(FeedforwardRow::new).collect();
                self.emit(DashboardEvent::new(EventKind::CONNECTED));
                false
            }
            TelemetryEvent::Message(text) => self.handle_message(&text, now_ms),
            TelemetryEvent::Closed => {
                info!("telemetry connection closed");
                self.set_disconnected(ConnectionStatus::Disconnected);
                false
            }
            TelemetryEvent::Errored(reason) => {
                warn!(%reason, "telemetry connection error");
                self.set_disconnected(ConnectionStatus::Error(reason));
                false
            }
        }
    }

    /// Drain everything currently queued on `rx`.
    pub fn drain(&mut self, rx: &Receiver<TelemetryEvent>) -> bool {
        let mut schedule = false;
        while let Ok(event) = rx.try_recv() {
            schedule |= self.handle_event(event, now_ms());
        }
        schedule
    }

    fn set_disconnected(&mut self, status: ConnectionStatus) {
        let mut evt = DashboardEvent::new(EventKind::DISCONNECTED);
        evt.status = Some(status.label());
        self.status = status;
        self.emit(evt);
    }

    fn handle_message(&mut self, text: &str, now_ms: i64) -> bool {
        let raw = match Snapshot::from_json_str(text) {
            Ok(s) => s,
            Err(e) => {
                self.dropped += 1;
                warn!(error = %e, dropped = self.dropped, "discarding telemetry message");
                let mut evt = DashboardEvent::new(EventKind::SNAPSHOT_DROPPED);
                evt.dropped = Some(DropMeta {
                    reason: e.to_string(),
                    total: self.dropped,
                });
                self.emit(evt);
                return false;
            }
        };

        let lines = console_lines(&raw);
        if !lines.is_empty() {
            for line in lines {
                debug!(target: "chamberscope::console", "{line}");
                self.console.push_back(line);
            }
            while self.console.len() > self.console_cap {
                self.console.pop_front();
            }
        }
        // Console-only frames carry no state to render.
        if raw.numbers.is_empty() && raw.texts.is_empty() {
            return false;
        }

        let snapshot = enrich(&raw);
        if !self.prefilled {
            self.forms.prefill(&snapshot);
            self.prefilled = true;
        }

        let ingested = self.session.ingest(&snapshot, now_ms);
        if ingested.range_changed {
            let (low, high) = (self.session.range.low(), self.session.range.high());
            debug!(low, high, "primary range widened");
            let mut evt = DashboardEvent::new(EventKind::RANGE_CHANGED);
            evt.range = Some(RangeMeta { low, high });
            self.emit(evt);
        }
        if let Some(candle) = ingested.appended {
            let mut evt = DashboardEvent::new(EventKind::CANDLE_APPENDED);
            evt.candle = Some(candle);
            self.emit(evt);
        }

        self.scheduler.offer(Received {
            snapshot,
            received_ms: now_ms,
        })
    }

    // ── Render ──────────────────────────────────────────────────────────

    /// Refresh callback. Renders the freshest pending snapshot, if any.
    /// Range and candles were already updated as each snapshot arrived.
    /// Returns whether a render ran.
    pub fn on_frame(&mut self) -> bool {
        let widgets = &self.widgets;
        let session = &mut self.session;
        let Some((rec, view)) = self.scheduler.fire(|rec| {
            let view = session.render(&rec.snapshot, widgets);
            (rec, view)
        }) else {
            return false;
        };

        self.last = Some(rec);
        self.view = view;
        self.emit(DashboardEvent::new(EventKind::RENDERED));
        self.publish();
        true
    }

    fn publish(&self) {
        if let Some(ctrl) = &self.controller {
            ctrl.publish(SessionInfo {
                status: self.status.label(),
                precision: self.session.precision,
                range: (self.session.range.low(), self.session.range.high()),
                candles: self.session.candles.len(),
                renders: self.scheduler.renders(),
                dropped: self.dropped,
            });
        }
    }

    /// Change the primary-axis precision and rebuild the current view.
    pub fn set_precision(&mut self, precision: Precision) {
        if precision == self.session.precision {
            return;
        }
        self.session.precision = precision;
        if let Some(rec) = &self.last {
            let chart = self.view.chart.take();
            self.view = DashboardView::build(
                &rec.snapshot,
                &self.session.range,
                precision,
                &self.widgets,
                chart,
            );
        }
    }

    /// Apply requests queued on the attached controller.
    pub fn poll_controller(&mut self) {
        let Some(ctrl) = &self.controller else {
            return;
        };
        let req = ctrl.take_requests();
        if let Some(p) = req.precision {
            self.set_precision(p);
        }
        for cmd in req.commands {
            self.send(cmd);
        }
    }

    // ── Outbound ────────────────────────────────────────────────────────

    /// Hand `command` to the transport. Returns `false` when there is no
    /// transport or it has gone away.
    pub fn send(&mut self, command: Command) -> bool {
        let text = command.to_string();
        let Some(sink) = &self.commands else {
            warn!(command = %text, "no transport attached; command not sent");
            return false;
        };
        if sink.send(command).is_err() {
            warn!(command = %text, "transport gone; command not sent");
            return false;
        }
        info!(command = %text, "sent command");
        let mut evt = DashboardEvent::new(EventKind::COMMAND_SENT);
        evt.command = Some(text);
        self.emit(evt);
        true
    }

    fn send_opt(&mut self, command: Option<Command>) -> Option<Command> {
        let command = command?;
        self.send(command.clone()).then_some(command)
    }

    pub fn submit_setpoint(&mut self) -> Option<Command> {
        let cmd = self.forms.setpoint.encode();
        self.send_opt(cmd)
    }

    pub fn submit_gains(&mut self) -> Option<Command> {
        let cmd = self.forms.gains.encode();
        self.send_opt(cmd)
    }

    pub fn set_control_mode(&mut self, mode: ControlMode) {
        self.forms.gains.set_mode(mode);
    }

    pub fn submit_feedforward_row(&mut self, index: usize) -> Option<Command> {
        let cmd = self.forms.feedforward.get(index).and_then(FeedforwardRow::encode);
        self.send_opt(cmd)
    }

    pub fn query_feedforward(&mut self) -> Option<Command> {
        self.send_opt(Some(Command::feedforward_query()))
    }

    pub fn apply_auxiliary(&mut self, group: AuxGroup) -> Option<Command> {
        let cmd = self.forms.auxiliary.encode_group(group);
        self.send_opt(cmd)
    }

    pub fn apply_auxiliary_all(&mut self) -> Option<Command> {
        let cmd = self.forms.auxiliary.encode_all();
        self.send_opt(cmd)
    }

    pub fn request_status(&mut self) -> Option<Command> {
        self.send_opt(Some(Command::status_query()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::channel_commands;

    fn msg(json: &str) -> TelemetryEvent {
        TelemetryEvent::Message(json.to_string())
    }

    #[test]
    fn burst_renders_last_snapshot_once() {
        let mut e = Engine::new(&DashboardConfig::default());
        assert!(e.handle_event(msg(r#"{"current_temperature": 20}"#), 0));
        assert!(!e.handle_event(msg(r#"{"current_temperature": 21}"#), 1));
        assert!(!e.handle_event(msg(r#"{"current_temperature": 22}"#), 2));
        assert!(e.on_frame());
        assert!(!e.on_frame());
        let c = e.session().candles.latest().unwrap();
        assert_eq!((c.open, c.high, c.close), (20.0, 22.0, 22.0));
        assert_eq!(e.scheduler().renders(), 1);
    }

    #[test]
    fn malformed_message_is_counted_and_dropped() {
        let events = EventController::new();
        let rx = events.subscribe(crate::events::EventFilter::only(EventKind::SNAPSHOT_DROPPED));
        let mut e = Engine::new(&DashboardConfig::default()).with_events(events);
        assert!(!e.handle_event(msg("{oops"), 0));
        assert!(!e.handle_event(msg("42"), 0));
        assert_eq!(e.dropped(), 2);
        assert!(!e.scheduler().has_pending());
        assert_eq!(rx.try_iter().count(), 2);
    }

    #[test]
    fn first_snapshot_prefills_forms_once() {
        let mut e = Engine::new(&DashboardConfig::default());
        e.handle_event(
            msg(r#"{"target_temperature": 37, "pid_kp": 0.07, "hysteresis_band": 0.5}"#),
            0,
        );
        assert_eq!(e.forms.setpoint.target, "37.0");
        assert_eq!(e.forms.gains.kp, "0.070000");
        assert_eq!(e.forms.auxiliary.hysteresis, "0.5");
        e.handle_event(msg(r#"{"target_temperature": 50}"#), 1);
        assert_eq!(e.forms.setpoint.target, "37.0");
    }

    #[test]
    fn console_lines_are_collected_without_render() {
        let mut e = Engine::new(&DashboardConfig::default());
        assert!(!e.handle_event(msg(r#"{"console": ["a", "b"], "timestamp": 1.5}"#), 0));
        assert_eq!(e.console().collect::<Vec<_>>(), vec!["a", "b"]);
        assert!(!e.scheduler().is_scheduled());
    }

    #[test]
    fn disconnect_keeps_session_state() {
        let mut e = Engine::new(&DashboardConfig::default());
        e.handle_event(TelemetryEvent::Opened, 0);
        e.handle_event(msg(r#"{"current_temperature": 90}"#), 0);
        e.on_frame();
        e.handle_event(TelemetryEvent::Errored("reset".into()), 1);
        assert_eq!(e.status(), &ConnectionStatus::Error("reset".into()));
        assert_eq!(e.session().range.high(), 95.0);
        assert_eq!(e.session().candles.len(), 1);
    }

    #[test]
    fn commands_reach_the_sink() {
        let (sink, rx) = channel_commands();
        let mut e = Engine::new(&DashboardConfig::default()).with_command_sink(sink);
        assert_eq!(e.submit_setpoint(), None);
        e.forms.setpoint.target = "40".into();
        e.submit_setpoint();
        e.apply_auxiliary(AuxGroup::Smoothing);
        let sent: Vec<String> = rx.try_iter().map(|c| c.to_string()).collect();
        assert_eq!(sent, vec!["pid_tune -t 40", "fan_tune"]);
    }

    #[test]
    fn precision_change_rebuilds_view() {
        let mut e = Engine::new(&DashboardConfig::default());
        e.handle_event(msg(r#"{"current_temperature": 21.456}"#), 0);
        e.on_frame();
        e.set_precision(Precision::new(1));
        let cur = e.view().thermometer.as_ref().unwrap().current.as_ref().unwrap();
        assert_eq!(cur.text, "21.5 °C");
        assert_eq!(e.session().candles.len(), 1);
    }
}
