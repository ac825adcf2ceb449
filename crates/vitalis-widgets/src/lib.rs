//! Presenters for the vitalis engine: HUD, dashboard and atmosphere.

pub mod atmosphere;
pub mod bubble;
pub mod dashboard;
pub mod ecg;
pub mod format;
pub mod fx;
pub mod gauge;
pub mod hud;
pub mod presenter;

pub use atmosphere::AtmospherePresenter;
pub use dashboard::DashboardPresenter;
pub use ecg::EcgTrace;
pub use hud::HudPresenter;
pub use presenter::{FrameSlot, Presenter, Scene};
