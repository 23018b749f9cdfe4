pub mod auxiliary_ui;
pub mod candles_ui;
pub mod console_ui;
pub mod controls_ui;
pub mod feedforward_ui;
pub mod gauges_ui;
pub mod panel_trait;
pub mod readouts_ui;
pub mod thermometer_ui;

pub use auxiliary_ui::AuxiliaryPanel;
pub use candles_ui::{CandleSeries, CandlesPanel};
pub use console_ui::ConsolePanel;
pub use controls_ui::ControlsPanel;
pub use feedforward_ui::FeedforwardPanel;
pub use gauges_ui::GaugesPanel;
pub use panel_trait::{Panel, PanelState};
pub use readouts_ui::ReadoutsPanel;
pub use thermometer_ui::ThermometerPanel;
