use chamberscope::config::DashboardConfig;
use chamberscope::events::{EventController, EventFilter, EventKind};
use chamberscope::{channel_telemetry, ConnectionStatus, Engine, TelemetryEvent};

fn snapshot(current: f64, target: f64) -> TelemetryEvent {
    TelemetryEvent::Message(format!(
        r#"{{"current_temperature": {current}, "target_temperature": {target}, "hysteresis_band": 2.0}}"#
    ))
}

#[test]
fn burst_before_refresh_renders_once_with_last_values() {
    let (sink, rx) = channel_telemetry();
    let mut engine = Engine::new(&DashboardConfig::default());

    sink.opened().unwrap();
    for i in 0..10 {
        sink.send(snapshot(20.0 + i as f64, 37.0)).unwrap();
    }
    assert!(engine.drain(&rx));
    assert_eq!(engine.scheduler().offered(), 10);
    assert_eq!(engine.scheduler().coalesced(), 9);

    assert!(engine.on_frame());
    assert!(!engine.on_frame());
    assert_eq!(engine.scheduler().renders(), 1);

    let readouts = engine.view().readouts.as_ref().unwrap();
    let current = readouts
        .iter()
        .find(|r| r.label == "Chamber")
        .unwrap();
    assert_eq!(current.text, "29.00 °C");
}

#[test]
fn second_burst_schedules_again() {
    let mut engine = Engine::new(&DashboardConfig::default());
    assert!(engine.handle_event(snapshot(21.0, 37.0), 0));
    assert!(!engine.handle_event(snapshot(22.0, 37.0), 1));
    engine.on_frame();
    assert!(engine.handle_event(snapshot(23.0, 37.0), 2));
}

#[test]
fn unregistered_widgets_are_absent_from_the_view() {
    let mut cfg = DashboardConfig::default();
    cfg.widgets.thermometer = false;
    cfg.widgets.candles = false;
    let mut engine = Engine::new(&cfg);
    engine.handle_event(snapshot(21.0, 37.0), 0);
    engine.on_frame();
    assert!(engine.view().thermometer.is_none());
    assert!(engine.view().gauges.is_some());
    assert!(engine.take_chart_update().is_none());
    // Candles are still aggregated, only the chart is not fed.
    assert_eq!(engine.session().candles.len(), 1);
}

#[test]
fn thermometer_shows_band_around_target() {
    let mut engine = Engine::new(&DashboardConfig::default());
    engine.handle_event(snapshot(30.0, 40.0), 0);
    engine.on_frame();
    let thermo = engine.view().thermometer.as_ref().unwrap();
    let band = thermo.band.unwrap();
    // 38..42 on 0..80
    assert!((band.start - 47.5).abs() < 1e-9);
    assert!((band.end - 52.5).abs() < 1e-9);
    assert_eq!(thermo.fill, Some(37.5));
    assert_eq!(thermo.target.as_ref().unwrap().text, "40.00 °C");
}

#[test]
fn lifecycle_events_reach_subscribers() {
    let events = EventController::new();
    let rx = events.subscribe(EventFilter::only(
        EventKind::CONNECTED | EventKind::DISCONNECTED | EventKind::RANGE_CHANGED,
    ));
    let mut engine = Engine::new(&DashboardConfig::default()).with_events(events);

    engine.handle_event(TelemetryEvent::Opened, 0);
    engine.handle_event(snapshot(95.0, 37.0), 0);
    engine.on_frame();
    engine.handle_event(TelemetryEvent::Closed, 1);

    let kinds: Vec<EventKind> = rx.try_iter().map(|e| e.kinds).collect();
    assert_eq!(
        kinds,
        vec![
            EventKind::CONNECTED,
            EventKind::RANGE_CHANGED,
            EventKind::DISCONNECTED
        ]
    );
    assert_eq!(engine.status(), &ConnectionStatus::Disconnected);
}

#[test]
fn controller_requests_apply_on_the_next_frame() {
    use chamberscope::{channel_commands, Precision, SessionController};

    let ctrl = SessionController::new();
    let published = ctrl.subscribe();
    let (sink, sent) = channel_commands();
    let mut engine = Engine::new(&DashboardConfig::default())
        .with_command_sink(sink)
        .with_controller(ctrl.clone());

    ctrl.request_precision(Precision::new(0));
    ctrl.request_command(chamberscope::Command::status_query());
    engine.poll_controller();
    assert_eq!(engine.precision(), Precision::new(0));
    assert_eq!(sent.try_recv().unwrap().to_string(), "get_status");

    engine.handle_event(snapshot(21.0, 37.0), 0);
    engine.on_frame();
    let info = published.try_recv().unwrap();
    assert_eq!(info.renders, 1);
    assert_eq!(info.candles, 1);
    assert_eq!(info.range, (0.0, 80.0));
    assert_eq!(ctrl.info(), Some(info));
}

#[test]
fn coalesced_snapshots_still_feed_candles_and_range() {
    use chamberscope::data::candles::ChartUpdate;

    let mut engine = Engine::new(&DashboardConfig::default());
    engine.handle_event(snapshot(20.0, 37.0), 0);
    engine.handle_event(snapshot(95.0, 37.0), 1_000);
    engine.handle_event(snapshot(21.0, 37.0), 2_000);
    assert!(engine.on_frame());
    assert_eq!(engine.scheduler().renders(), 1);

    let candle = engine.session().candles.latest().unwrap();
    assert_eq!(
        (candle.open, candle.high, candle.low, candle.close),
        (20.0, 95.0, 20.0, 21.0)
    );
    assert_eq!(engine.session().range.high(), 100.0);
    match engine.take_chart_update() {
        Some(ChartUpdate::Resync(series)) => assert_eq!(series, vec![candle]),
        other => panic!("expected resync, got {other:?}"),
    }

    // Same bucket: the next render only replaces the last point.
    engine.handle_event(snapshot(19.0, 37.0), 3_000);
    engine.handle_event(snapshot(22.0, 37.0), 4_000);
    assert!(engine.on_frame());
    match engine.take_chart_update() {
        Some(ChartUpdate::Point(c)) => assert_eq!((c.low, c.close), (19.0, 22.0)),
        other => panic!("expected point, got {other:?}"),
    }
}

#[test]
fn scale_labels_follow_the_widened_range() {
    let mut engine = Engine::new(&DashboardConfig::default());
    engine.handle_event(snapshot(85.0, 40.0), 0);
    engine.on_frame();
    let scale = engine.view().thermometer.as_ref().unwrap().scale.as_ref().unwrap();
    let labels: Vec<&str> = scale.iter().map(|t| t.label.as_str()).collect();
    assert_eq!(labels, ["0 °C", "30 °C", "59 °C", "90 °C"]);
    assert_eq!(scale[3].value, 90);
}
