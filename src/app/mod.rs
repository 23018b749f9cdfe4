//! eframe application for the dashboard.
//!
//! | Sub-module        | Responsibility |
//! | ----------------- | -------------- |
//! | [`dashboard_app`] | [`DashboardApp`], the per-frame data pass and `eframe::App` |
//! | [`layout`]        | Top bar, side panels and bottom console |
//! | [`run`]           | [`run_dashboard()`] entry point |

mod dashboard_app;
mod layout;
mod run;

pub use dashboard_app::DashboardApp;
pub use run::{run_dashboard, Attachments};
