//! Dashboard session - owns the map engine state and its lifecycle.

mod dashboard;
mod event;
mod status;

pub use dashboard::{DashboardSession, SessionConfig, EVENT_CHANNEL_CAPACITY};
pub use event::SessionEvent;
pub use status::{SessionStatus, AUTH_BANNER};
