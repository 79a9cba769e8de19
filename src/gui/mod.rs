//! GUI module - User interface components

mod app;
mod control_panel;
mod dashboard;

pub use app::EpidashApp;
pub use control_panel::{ControlPanel, ControlPanelAction, UserSettings};
pub use dashboard::{DashboardView, ViewData};
