use chamberscope::config::{DashboardConfig, WidgetFlags};
use chamberscope::panels::*;
use chamberscope::{channel_telemetry, DashboardApp, Engine};

#[test]
fn every_panel_starts_visible_with_an_icon() {
    let panels: Vec<Box<dyn Panel>> = vec![
        Box::new(ThermometerPanel::default()),
        Box::new(GaugesPanel::default()),
        Box::new(CandlesPanel::default()),
        Box::new(ControlsPanel::default()),
        Box::new(FeedforwardPanel::default()),
        Box::new(AuxiliaryPanel::default()),
        Box::new(ReadoutsPanel::default()),
        Box::new(ConsolePanel::default()),
    ];
    for p in &panels {
        assert!(p.state().visible, "{}", p.name());
        assert!(!p.state().icon.is_empty());
        assert_eq!(p.name(), p.state().title);
    }
}

#[test]
fn registration_follows_widget_flags() {
    let mut widgets = WidgetFlags::default();
    widgets.controls = false;
    widgets.candles = false;
    assert!(!ControlsPanel::default().registered(&widgets));
    assert!(!FeedforwardPanel::default().registered(&widgets));
    assert!(!AuxiliaryPanel::default().registered(&widgets));
    assert!(!CandlesPanel::default().registered(&widgets));
    assert!(ThermometerPanel::default().registered(&widgets));
    assert!(ConsolePanel::default().registered(&widgets));
}

#[test]
fn candle_panel_mirrors_the_aggregator() {
    let mut engine = Engine::new(&DashboardConfig::default());
    let mut panel = CandlesPanel::default();
    for (i, t) in [20.0, 20.5, 21.0].into_iter().enumerate() {
        engine.handle_event(
            chamberscope::TelemetryEvent::Message(format!(r#"{{"current_temperature": {t}}}"#)),
            i as i64 * 60_000,
        );
        engine.on_frame();
        panel.sync(&mut engine);
    }
    engine.handle_event(
        chamberscope::TelemetryEvent::Message(r#"{"current_temperature": 23.0}"#.into()),
        2 * 60_000 + 10,
    );
    engine.on_frame();
    panel.sync(&mut engine);

    let ours = panel.series().candles();
    let theirs = engine.session().candles.series();
    assert_eq!(ours, theirs.as_slice());
    assert_eq!(ours[2].close, 23.0);
}

#[test]
fn app_data_pass_renders_queued_telemetry() {
    let (sink, rx) = channel_telemetry();
    let mut app = DashboardApp::new(Engine::new(&DashboardConfig::default()), rx, "test");
    sink.opened().unwrap();
    sink.message(r#"{"current_temperature": 25.0}"#).unwrap();
    // First pass drains and schedules, second renders.
    assert!(app.update_data());
    assert!(!app.update_data());
    assert!(app.engine.view().thermometer.is_some());
}
