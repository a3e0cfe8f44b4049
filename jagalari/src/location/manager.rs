//! Self-Location Manager.
//!
//! Owns the operator's own position. Acquisition is single-shot and guarded:
//! while one platform request is outstanding, further requests are rejected
//! rather than queued. Results come back to the session as
//! [`SessionEvent::Location`] and are applied with [`SelfLocationManager::complete`].
//!
//! The guard is the request task itself, so a request that is cancelled or
//! aborted stops counting as outstanding as soon as its task ends.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::geolocation::{GeoFix, GeolocationError, GeolocationOptions, GeolocationService};
use super::state::{PersistedLocation, SelfLocationState};
use crate::map::LOCATED_ZOOM;
use crate::session::SessionEvent;
use crate::storage::{ClientStorage, StorageError, SELF_LOCATION_KEY};

/// Result of [`SelfLocationManager::acquire`].
#[derive(Debug)]
pub enum AcquireOutcome {
    /// A platform request was spawned.
    Started,
    /// A request is already outstanding; nothing was spawned.
    AlreadyInFlight,
}

#[derive(Debug, Default)]
pub struct SelfLocationManager {
    state: SelfLocationState,
    options: GeolocationOptions,
    request: Option<JoinHandle<()>>,
}

impl SelfLocationManager {
    pub fn new(options: GeolocationOptions) -> Self {
        Self {
            state: SelfLocationState::default(),
            options,
            request: None,
        }
    }

    pub fn state(&self) -> &SelfLocationState {
        &self.state
    }

    /// True while a platform request task is still running.
    pub fn is_in_flight(&self) -> bool {
        self.request.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Start one platform position request.
    ///
    /// The result is sent on `events`. Cancelling `cancel` abandons the
    /// request without sending anything.
    pub fn acquire<S: GeolocationService>(
        &mut self,
        service: Arc<S>,
        events: mpsc::Sender<SessionEvent>,
        cancel: CancellationToken,
    ) -> AcquireOutcome {
        if self.is_in_flight() {
            tracing::debug!("Location request already in flight, ignoring");
            return AcquireOutcome::AlreadyInFlight;
        }

        let options = self.options.clone();
        tracing::info!(high_accuracy = options.high_accuracy, "Requesting location");

        let handle = tokio::spawn(async move {
            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("Location request cancelled");
                    return;
                }
                result = service.current_position(&options) => result,
            };
            if events.send(SessionEvent::Location(result)).await.is_err() {
                tracing::debug!("Session gone before location result arrived");
            }
        });

        self.request = Some(handle);
        AcquireOutcome::Started
    }

    /// Abandon the outstanding request, if any. Its result is never delivered.
    pub fn cancel(&mut self) {
        if let Some(task) = self.request.take() {
            if !task.is_finished() {
                tracing::debug!("Location request abandoned");
            }
            task.abort();
        }
    }

    /// Apply the result of a platform request.
    ///
    /// Returns the fix on success. Failures keep the previous coordinate.
    pub fn complete<St: ClientStorage + ?Sized>(
        &mut self,
        storage: &mut St,
        result: Result<GeoFix, GeolocationError>,
    ) -> Option<GeoFix> {
        self.request = None;

        match result {
            Ok(fix) => {
                self.state.coordinate = Some(fix.coordinate);
                self.state.accuracy_m = Some(fix.accuracy_m);
                self.state.captured_at = Some(Utc::now());
                self.state.last_error = None;
                tracing::info!(
                    location = %fix.coordinate,
                    accuracy_m = fix.accuracy_m,
                    "Location acquired"
                );
                if let Err(e) = self.persist(storage) {
                    tracing::warn!(error = %e, "Failed to persist location");
                }
                Some(fix)
            }
            Err(e) => {
                tracing::warn!(code = e.code(), error = %e, "Location request failed");
                self.state.last_error = Some(e);
                None
            }
        }
    }

    /// Load the persisted fix into state.
    ///
    /// Missing or corrupt records yield `None`. No freshness check is made.
    pub fn restore<St: ClientStorage + ?Sized>(&mut self, storage: &St) -> Option<PersistedLocation> {
        let raw = match storage.get(SELF_LOCATION_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read persisted location");
                return None;
            }
        };

        let record: PersistedLocation = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring corrupt persisted location");
                return None;
            }
        };

        if !record.coordinate().is_valid() {
            tracing::warn!(location = %record.coordinate(), "Ignoring out-of-range persisted location");
            return None;
        }

        self.state.coordinate = Some(record.coordinate());
        self.state.accuracy_m = record.accuracy_meters;
        self.state.captured_at = Some(record.captured_at);
        tracing::info!(location = %record.coordinate(), captured_at = %record.captured_at, "Restored location");

        Some(record)
    }

    /// Write the current fix to storage. Does nothing without a fix.
    pub fn persist<St: ClientStorage + ?Sized>(&self, storage: &mut St) -> Result<(), StorageError> {
        let (Some(coordinate), Some(captured_at)) = (self.state.coordinate, self.state.captured_at)
        else {
            return Ok(());
        };

        let record = PersistedLocation {
            lat: coordinate.latitude,
            lng: coordinate.longitude,
            zoom_hint: LOCATED_ZOOM,
            captured_at,
            accuracy_meters: self.state.accuracy_m,
        };
        let json = serde_json::to_string(&record)?;
        storage.set(SELF_LOCATION_KEY, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::StaticGeolocation;
    use crate::map::Coordinate;
    use crate::storage::MemoryStorage;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Geolocation that counts requests and answers after a delay.
    struct CountingGeolocation {
        calls: AtomicUsize,
        delay: Duration,
    }

    impl GeolocationService for CountingGeolocation {
        async fn current_position(
            &self,
            _options: &GeolocationOptions,
        ) -> Result<GeoFix, GeolocationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok(GeoFix {
                coordinate: Coordinate::new(-6.2, 106.8),
                accuracy_m: 8.0,
            })
        }
    }

    fn located(lat: f64, lon: f64) -> Result<GeoFix, GeolocationError> {
        Ok(GeoFix {
            coordinate: Coordinate::new(lat, lon),
            accuracy_m: 20.0,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_acquire_issues_one_request() {
        let service = Arc::new(CountingGeolocation {
            calls: AtomicUsize::new(0),
            delay: Duration::from_secs(2),
        });
        let (tx, mut rx) = mpsc::channel(4);
        let cancel = CancellationToken::new();
        let mut manager = SelfLocationManager::default();

        let first = manager.acquire(Arc::clone(&service), tx.clone(), cancel.clone());
        let second = manager.acquire(Arc::clone(&service), tx.clone(), cancel.clone());

        assert!(matches!(first, AcquireOutcome::Started));
        assert!(manager.is_in_flight());
        assert!(matches!(second, AcquireOutcome::AlreadyInFlight));

        let Some(SessionEvent::Location(result)) = rx.recv().await else {
            panic!("expected a location event");
        };
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);

        let mut storage = MemoryStorage::new();
        assert!(manager.complete(&mut storage, result).is_some());
        assert!(!manager.is_in_flight());

        let third = manager.acquire(Arc::clone(&service), tx, cancel);
        assert!(matches!(third, AcquireOutcome::Started));
        assert!(rx.recv().await.is_some());
        assert_eq!(service.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_acquire_sends_nothing() {
        let service = Arc::new(CountingGeolocation {
            calls: AtomicUsize::new(0),
            delay: Duration::from_secs(60),
        });
        let (tx, mut rx) = mpsc::channel(4);
        let cancel = CancellationToken::new();
        let mut manager = SelfLocationManager::default();

        let outcome = manager.acquire(Arc::clone(&service), tx, cancel.clone());
        assert!(matches!(outcome, AcquireOutcome::Started));
        cancel.cancel();

        assert!(rx.recv().await.is_none());
        assert!(!manager.is_in_flight());
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_request_allowed_after_cancelled_one() {
        let service = Arc::new(CountingGeolocation {
            calls: AtomicUsize::new(0),
            delay: Duration::from_secs(60),
        });
        let (tx, _rx) = mpsc::channel(4);
        let mut manager = SelfLocationManager::default();
        let stopped = CancellationToken::new();
        stopped.cancel();

        manager.acquire(Arc::clone(&service), tx.clone(), stopped);
        while manager.is_in_flight() {
            tokio::task::yield_now().await;
        }

        let retry = manager.acquire(service, tx, CancellationToken::new());
        assert!(matches!(retry, AcquireOutcome::Started));
        assert!(manager.is_in_flight());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_releases_guard() {
        let service = Arc::new(CountingGeolocation {
            calls: AtomicUsize::new(0),
            delay: Duration::from_secs(60),
        });
        let (tx, _rx) = mpsc::channel(4);
        let mut manager = SelfLocationManager::default();

        manager.acquire(Arc::clone(&service), tx.clone(), CancellationToken::new());
        manager.cancel();

        assert!(!manager.is_in_flight());
        let retry = manager.acquire(service, tx, CancellationToken::new());
        assert!(matches!(retry, AcquireOutcome::Started));
    }

    #[tokio::test]
    async fn test_static_service_delivers_event() {
        let (tx, mut rx) = mpsc::channel(1);
        let mut manager = SelfLocationManager::default();

        manager.acquire(
            Arc::new(StaticGeolocation::at(1.0, 2.0, 5.0)),
            tx,
            CancellationToken::new(),
        );

        let Some(SessionEvent::Location(Ok(fix))) = rx.recv().await else {
            panic!("expected a successful location event");
        };
        assert_eq!(fix.coordinate, Coordinate::new(1.0, 2.0));
    }

    #[test]
    fn test_success_updates_and_persists() {
        let mut storage = MemoryStorage::new();
        let mut manager = SelfLocationManager::default();
        manager.state.last_error = Some(GeolocationError::Timeout);

        manager.complete(&mut storage, located(-6.1, 106.9));

        let state = manager.state();
        assert_eq!(state.coordinate, Some(Coordinate::new(-6.1, 106.9)));
        assert_eq!(state.accuracy_m, Some(20.0));
        assert!(state.captured_at.is_some());
        assert!(state.last_error.is_none());
        assert!(!manager.is_in_flight());

        let saved = storage.get(SELF_LOCATION_KEY).unwrap().unwrap();
        let record: PersistedLocation = serde_json::from_str(&saved).unwrap();
        assert_eq!(record.coordinate(), Coordinate::new(-6.1, 106.9));
        assert_eq!(record.zoom_hint, LOCATED_ZOOM);
    }

    #[test]
    fn test_failure_keeps_previous_fix() {
        let mut storage = MemoryStorage::new();
        let mut manager = SelfLocationManager::default();
        manager.complete(&mut storage, located(-6.1, 106.9));

        let result = manager.complete(&mut storage, Err(GeolocationError::from_code(1, "")));

        assert!(result.is_none());
        let state = manager.state();
        assert_eq!(state.coordinate, Some(Coordinate::new(-6.1, 106.9)));
        assert_eq!(state.last_error, Some(GeolocationError::PermissionDenied));
        assert_eq!(
            state.last_error_message().as_deref(),
            Some("Location permission denied")
        );
    }

    #[test]
    fn test_restore_round_trip() {
        let mut storage = MemoryStorage::new();
        let mut first = SelfLocationManager::default();
        first.complete(&mut storage, located(-6.3, 106.7));

        let mut second = SelfLocationManager::default();
        let record = second.restore(&storage).unwrap();

        assert_eq!(record.coordinate(), Coordinate::new(-6.3, 106.7));
        assert_eq!(second.state().coordinate, Some(Coordinate::new(-6.3, 106.7)));
        assert!(!second.is_in_flight());
    }

    #[test]
    fn test_restore_ignores_corrupt_record() {
        let mut storage = MemoryStorage::new();
        storage.set(SELF_LOCATION_KEY, "{not json").unwrap();
        let mut manager = SelfLocationManager::default();

        assert!(manager.restore(&storage).is_none());
        assert!(manager.state().coordinate.is_none());
    }

    #[test]
    fn test_persist_without_fix_writes_nothing() {
        let mut storage = MemoryStorage::new();
        let manager = SelfLocationManager::default();

        manager.persist(&mut storage).unwrap();

        assert!(storage.is_empty());
    }
}
