//! Self-Location Manager - the operator's own position on the map.

mod geolocation;
mod manager;
mod state;

pub use geolocation::{
    GeoFix, GeolocationError, GeolocationOptions, GeolocationService, StaticGeolocation,
};
pub use manager::{AcquireOutcome, SelfLocationManager};
pub use state::{PersistedLocation, SelfLocationState};
