//! Jagalari - live fleet map engine.
//!
//! Keeps a map in step with a vehicle tracking backend: device markers are
//! reconciled against each polled snapshot, optional trail discs mark where
//! each device was last seen, an uploaded GPX track is drawn as an overlay,
//! and the operator's own position is shown as a distinguished marker.
//!
//! # High-Level API
//!
//! [`session::DashboardSession`] owns all engine state and drives it from one
//! event loop:
//!
//! ```ignore
//! use std::sync::Arc;
//! use jagalari::map::HeadlessMapSurface;
//! use jagalari::location::StaticGeolocation;
//! use jagalari::session::{DashboardSession, SessionConfig};
//! use jagalari::storage::MemoryStorage;
//! use jagalari::telemetry::{TraccarClient, TraccarConfig};
//!
//! let mut session = DashboardSession::new(
//!     HeadlessMapSurface::new(),
//!     MemoryStorage::new(),
//!     Arc::new(StaticGeolocation::new(None)),
//!     SessionConfig::default(),
//! );
//! session.init();
//! session.start_polling(Arc::new(TraccarClient::new(traccar_config)?));
//! session.run().await;
//! session.dispose();
//! ```

pub mod config;
pub mod fleet;
pub mod location;
pub mod logging;
pub mod map;
pub mod markers;
pub mod session;
pub mod storage;
pub mod telemetry;
pub mod track;
pub mod trails;

/// Version of the Jagalari library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
