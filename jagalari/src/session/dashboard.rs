//! The dashboard session: single owner of all map engine state.
//!
//! # Lifecycle
//!
//! ```text
//! new() --> init() --> [start_polling(), run() / handle_event()]* --> dispose()
//! ```
//!
//! `init` restores persisted state (self-location and the last uploaded
//! track) before any live data arrives. Background work (polling, track file
//! reads, location requests) runs in tokio tasks that report back through the
//! session's event channel; every task holds a child of the session's
//! cancellation token, so `dispose` stops them all.
//!
//! Each component owns its own map handles. The session only routes events
//! and decides which component to call.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::event::SessionEvent;
use super::status::SessionStatus;
use crate::fleet::{DeviceSummary, FleetStats, Snapshot};
use crate::location::{
    AcquireOutcome, GeoFix, GeolocationError, GeolocationOptions, GeolocationService,
    SelfLocationManager,
};
use crate::map::{DefaultViewport, MapSurface, LOCATED_ZOOM};
use crate::markers::{MarkerReconciler, ReconcileResult};
use crate::storage::{ClientStorage, TRACK_DATA_KEY, TRACK_FILENAME_KEY};
use crate::telemetry::{SnapshotPoller, SnapshotSource, TelemetryError};
use crate::track::{
    is_track_file, read_track_file, DocumentOutcome, TrackError, TrackFit, TrackOverlayManager,
    TrackUpload,
};
use crate::trails::TrailOverlayManager;

/// Capacity of the session event channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Session settings.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    pub default_viewport: DefaultViewport,
    pub geolocation: GeolocationOptions,
}

pub struct DashboardSession<M, S, G>
where
    M: MapSurface,
    S: ClientStorage,
    G: GeolocationService,
{
    surface: M,
    storage: S,
    geolocation: Arc<G>,
    default_viewport: DefaultViewport,

    markers: MarkerReconciler,
    trails: TrailOverlayManager,
    track: TrackOverlayManager,
    location: SelfLocationManager,

    last_snapshot: Option<Snapshot>,
    last_update: Option<DateTime<Utc>>,
    auth_error: bool,
    last_error: Option<String>,

    events_tx: mpsc::Sender<SessionEvent>,
    events_rx: Option<mpsc::Receiver<SessionEvent>>,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
    initialized: bool,
}

impl<M, S, G> DashboardSession<M, S, G>
where
    M: MapSurface,
    S: ClientStorage,
    G: GeolocationService,
{
    pub fn new(surface: M, storage: S, geolocation: Arc<G>, config: SessionConfig) -> Self {
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            surface,
            storage,
            geolocation,
            default_viewport: config.default_viewport,
            markers: MarkerReconciler::new(config.default_viewport),
            trails: TrailOverlayManager::new(),
            track: TrackOverlayManager::new(),
            location: SelfLocationManager::new(config.geolocation),
            last_snapshot: None,
            last_update: None,
            auth_error: false,
            last_error: None,
            events_tx,
            events_rx: Some(events_rx),
            cancel: CancellationToken::new(),
            tasks: Vec::new(),
            initialized: false,
        }
    }

    /// Restore persisted state and set the initial viewport.
    ///
    /// A persisted self-location seeds the view and a placeholder marker.
    /// Without one the default viewport is used. A saved track is rendered
    /// but not fitted.
    pub fn init(&mut self) {
        if self.initialized {
            return;
        }
        self.initialized = true;

        match self.location.restore(&self.storage) {
            Some(record) => {
                let coordinate = record.coordinate();
                self.surface.set_view(coordinate, record.zoom_hint);
                self.markers
                    .place_self_marker(&mut self.surface, coordinate, record.accuracy_meters);
            }
            None => {
                self.surface
                    .set_view(self.default_viewport.center, self.default_viewport.zoom);
            }
        }

        self.restore_track();

        tracing::info!(
            location_restored = self.location.state().coordinate.is_some(),
            track_restored = self.track.document().is_some(),
            "Session initialized"
        );
    }

    fn restore_track(&mut self) {
        let document = match self.storage.get(TRACK_DATA_KEY) {
            Ok(Some(document)) => document,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read saved track");
                return;
            }
        };
        let file_name = self.storage.get(TRACK_FILENAME_KEY).ok().flatten();

        let outcome = self.track.set_document(&mut self.surface, Some(&document));
        if !matches!(outcome, DocumentOutcome::Rejected(_)) {
            self.track.set_file_name(file_name);
        }
    }

    /// Stop all background tasks and remove everything this session drew.
    ///
    /// Persisted state is left in storage for the next session.
    pub fn dispose(&mut self) {
        self.cancel.cancel();
        for task in self.tasks.drain(..) {
            task.abort();
        }
        self.location.cancel();

        self.trails.clear(&mut self.surface);
        self.markers.clear(&mut self.surface);
        self.track.clear(&mut self.surface);
        self.initialized = false;

        tracing::info!("Session disposed");
    }

    /// Sender for feeding events and commands to this session.
    pub fn events(&self) -> mpsc::Sender<SessionEvent> {
        self.events_tx.clone()
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Spawn the telemetry poller for `source`.
    pub fn start_polling<Src: SnapshotSource>(&mut self, source: Arc<Src>) {
        let poller = SnapshotPoller::new(source, self.events_tx.clone());
        let handle = poller.start(self.cancel.child_token());
        self.track_task(handle);
    }

    /// Keep `handle` for `dispose`, dropping handles of tasks that already ended.
    fn track_task(&mut self, handle: JoinHandle<()>) {
        self.tasks.retain(|task| !task.is_finished());
        self.tasks.push(handle);
    }

    /// Number of background tasks not yet reaped.
    pub fn pending_tasks(&self) -> usize {
        self.tasks.len()
    }

    /// Process events until the session is cancelled.
    pub async fn run(&mut self) {
        let Some(mut rx) = self.events_rx.take() else {
            tracing::warn!("Session event loop is already running");
            return;
        };
        let cancel = self.cancel.clone();

        tracing::info!("Session event loop started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                event = rx.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => break,
                },
            }
        }

        self.events_rx = Some(rx);
        tracing::info!("Session event loop stopped");
    }

    /// Apply one event.
    pub fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Poll(result) => self.apply_poll(result),
            SessionEvent::Location(result) => {
                self.handle_location_result(result);
            }
            SessionEvent::TrackLoaded(result) => {
                self.handle_track_loaded(result);
            }
            SessionEvent::SetTrails(enabled) => self.set_trails_enabled(enabled),
            SessionEvent::RequestLocation => {
                self.request_location();
            }
            SessionEvent::LoadTrack(path) => self.load_track_file(path),
            SessionEvent::ClearTrack => self.clear_track(),
            SessionEvent::FitToTrack => {
                self.fit_to_track();
            }
            SessionEvent::ResetTrackFailures => {
                self.reset_track_failures();
            }
        }
    }

    /// Apply a poll result.
    ///
    /// Failures keep the last good snapshot on the map.
    pub fn apply_poll(&mut self, result: Result<Snapshot, TelemetryError>) {
        match result {
            Ok(snapshot) => {
                self.auth_error = false;
                self.last_error = None;
                self.apply_snapshot(snapshot);
            }
            Err(e) if e.is_authentication() => {
                if !self.auth_error {
                    tracing::error!(error = %e, "Telemetry authentication failed, check credentials");
                }
                self.auth_error = true;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Poll failed, keeping last snapshot");
                self.last_error = Some(e.to_string());
            }
        }
    }

    /// Reconcile markers and trails with `snapshot` and make it current.
    pub fn apply_snapshot(&mut self, snapshot: Snapshot) -> ReconcileResult {
        let result = self.markers.reconcile(&mut self.surface, &snapshot);
        self.trails.refresh(&mut self.surface, &snapshot);
        self.last_update = snapshot.received_at.or_else(|| Some(Utc::now()));

        if result.changed_membership() {
            tracing::info!(
                devices = snapshot.devices.len(),
                markers = self.markers.len(),
                created = result.created.len(),
                removed = result.removed.len(),
                "Fleet changed"
            );
        }

        self.last_snapshot = Some(snapshot);
        result
    }

    pub fn set_trails_enabled(&mut self, enabled: bool) {
        self.trails
            .set_enabled(&mut self.surface, enabled, self.last_snapshot.as_ref());
    }

    /// Load and render a track document uploaded as `file_name`.
    ///
    /// Accepted documents are saved to storage, rendered or not.
    pub fn upload_track(&mut self, file_name: &str, content: &str) -> DocumentOutcome {
        if !is_track_file(Path::new(file_name)) {
            let error = TrackError::NotGpxFile(file_name.to_string());
            tracing::warn!(error = %error, "Rejected track upload");
            return DocumentOutcome::Rejected(error);
        }

        let outcome = self.track.set_document(&mut self.surface, Some(content));
        if matches!(outcome, DocumentOutcome::Rejected(_)) {
            return outcome;
        }

        self.track.set_file_name(Some(file_name.to_string()));
        if let Err(e) = self
            .storage
            .set(TRACK_DATA_KEY, content)
            .and_then(|_| self.storage.set(TRACK_FILENAME_KEY, file_name))
        {
            tracing::warn!(error = %e, "Failed to save track");
        }

        outcome
    }

    /// Read a track file in the background; the result arrives as
    /// [`SessionEvent::TrackLoaded`].
    pub fn load_track_file(&mut self, path: PathBuf) {
        self.track.begin_load();
        let events = self.events_tx.clone();
        let cancel = self.cancel.child_token();

        let handle = tokio::spawn(async move {
            let result = tokio::select! {
                _ = cancel.cancelled() => return,
                result = read_track_file(path) => result,
            };
            if events.send(SessionEvent::TrackLoaded(result)).await.is_err() {
                tracing::debug!("Session gone before track load finished");
            }
        });
        self.track_task(handle);
    }

    pub fn handle_track_loaded(
        &mut self,
        result: Result<TrackUpload, TrackError>,
    ) -> Option<DocumentOutcome> {
        match result {
            Ok(upload) => Some(self.upload_track(&upload.file_name, &upload.content)),
            Err(e) => {
                self.track.record_load_failure(&mut self.surface, &e);
                None
            }
        }
    }

    /// Remove the track overlay and its saved copy.
    pub fn clear_track(&mut self) {
        self.track.clear(&mut self.surface);
        for key in [TRACK_DATA_KEY, TRACK_FILENAME_KEY] {
            if let Err(e) = self.storage.remove(key) {
                tracing::warn!(key, error = %e, "Failed to remove saved track");
            }
        }
    }

    pub fn fit_to_track(&mut self) -> TrackFit {
        self.track.fit_to_track(&mut self.surface)
    }

    pub fn reset_track_failures(&mut self) -> Option<DocumentOutcome> {
        self.track.reset_failures(&mut self.surface)
    }

    /// Ask the platform for the operator's position.
    pub fn request_location(&mut self) -> bool {
        let outcome = self.location.acquire(
            Arc::clone(&self.geolocation),
            self.events_tx.clone(),
            self.cancel.child_token(),
        );
        matches!(outcome, AcquireOutcome::Started)
    }

    /// Apply a location result; on success re-centre and move the marker.
    pub fn handle_location_result(
        &mut self,
        result: Result<GeoFix, GeolocationError>,
    ) -> Option<GeoFix> {
        let fix = self.location.complete(&mut self.storage, result)?;
        self.surface.set_view(fix.coordinate, LOCATED_ZOOM);
        self.markers
            .place_self_marker(&mut self.surface, fix.coordinate, Some(fix.accuracy_m));
        Some(fix)
    }

    pub fn status(&self) -> SessionStatus {
        let devices = self
            .last_snapshot
            .as_ref()
            .map(|s| s.devices.as_slice())
            .unwrap_or_default();

        SessionStatus {
            auth_error: self.auth_error,
            last_error: self.last_error.clone(),
            last_update: self.last_update,
            stats: FleetStats::from_devices(devices),
            devices: devices.iter().map(DeviceSummary::from).collect(),
            trails_enabled: self.trails.is_enabled(),
            track: self.track.status(),
            track_file: self.track.file_name().map(str::to_string),
            location: self.location.state().coordinate,
            location_error: self.location.state().last_error_message(),
        }
    }

    pub fn surface(&self) -> &M {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut M {
        &mut self.surface
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn markers(&self) -> &MarkerReconciler {
        &self.markers
    }

    pub fn trails(&self) -> &TrailOverlayManager {
        &self.trails
    }

    pub fn track(&self) -> &TrackOverlayManager {
        &self.track
    }

    pub fn location(&self) -> &SelfLocationManager {
        &self.location
    }

    pub fn last_snapshot(&self) -> Option<&Snapshot> {
        self.last_snapshot.as_ref()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fleet::fixtures::{device, position};
    use crate::location::StaticGeolocation;
    use crate::map::{Coordinate, HeadlessMapSurface, Viewport};
    use crate::storage::{MemoryStorage, SELF_LOCATION_KEY};
    use crate::track::{samples::TRACK_GPX, TrackStatus};

    type TestSession = DashboardSession<HeadlessMapSurface, MemoryStorage, StaticGeolocation>;

    fn session_with(storage: MemoryStorage) -> TestSession {
        DashboardSession::new(
            HeadlessMapSurface::new(),
            storage,
            Arc::new(StaticGeolocation::at(-6.25, 106.8, 10.0)),
            SessionConfig::default(),
        )
    }

    fn snapshot() -> Snapshot {
        Snapshot::new(
            vec![
                device(1, "Ambulance 01", "online"),
                device(2, "Motor 7", "offline"),
            ],
            vec![position(1, -6.20, 106.84), position(2, -6.21, 106.85)],
        )
    }

    #[test]
    fn test_init_without_saved_state_uses_default_view() {
        let mut session = session_with(MemoryStorage::new());
        session.init();

        let expected = DefaultViewport::default();
        assert_eq!(
            *session.surface().viewport(),
            Viewport::Centered {
                center: expected.center,
                zoom: expected.zoom
            }
        );
        assert!(session.markers().self_marker().is_none());
    }

    #[test]
    fn test_init_restores_location_marker() {
        let mut storage = MemoryStorage::new();
        storage
            .set(
                SELF_LOCATION_KEY,
                r#"{"lat":-6.3,"lng":106.7,"zoomHint":16,"capturedAt":"2024-05-01T08:00:00Z"}"#,
            )
            .unwrap();
        let mut session = session_with(storage);

        session.init();

        let marker = session.markers().self_marker().unwrap();
        assert_eq!(marker.coordinate, Coordinate::new(-6.3, 106.7));
        assert_eq!(
            *session.surface().viewport(),
            Viewport::Centered {
                center: Coordinate::new(-6.3, 106.7),
                zoom: 16
            }
        );
    }

    #[test]
    fn test_auth_failure_keeps_last_snapshot() {
        let mut session = session_with(MemoryStorage::new());
        session.init();
        session.apply_poll(Ok(snapshot()));

        session.apply_poll(Err(TelemetryError::Authentication { status: 401 }));

        let status = session.status();
        assert!(status.auth_error);
        assert!(status.auth_banner().is_some());
        assert_eq!(status.stats.total, 2);
        assert_eq!(session.markers().len(), 2);

        session.apply_poll(Ok(snapshot()));
        assert!(!session.status().auth_error);
    }

    #[test]
    fn test_transport_failure_is_contained() {
        let mut session = session_with(MemoryStorage::new());
        session.apply_poll(Ok(snapshot()));

        session.apply_poll(Err(TelemetryError::Transport("reset".into())));

        let status = session.status();
        assert!(!status.auth_error);
        assert!(status.last_error.is_some());
        assert_eq!(session.markers().len(), 2);
    }

    #[test]
    fn test_status_counts_fleet() {
        let mut session = session_with(MemoryStorage::new());
        session.apply_poll(Ok(snapshot()));

        let status = session.status();
        assert_eq!(status.stats.ambulance, 1);
        assert_eq!(status.stats.motorbike, 1);
        assert_eq!(status.stats.online, 1);
        assert_eq!(status.stats.offline, 1);
        assert_eq!(status.devices.len(), 2);
        assert!(status.last_update.is_some());
    }

    #[test]
    fn test_trails_follow_last_snapshot() {
        let mut session = session_with(MemoryStorage::new());
        session.apply_poll(Ok(snapshot()));

        session.set_trails_enabled(true);
        assert_eq!(session.trails().len(), 2);

        session.set_trails_enabled(false);
        assert!(session.trails().is_empty());
        assert_eq!(session.surface().shape_count(), 0);
    }

    #[test]
    fn test_upload_persists_and_clear_removes() {
        let mut session = session_with(MemoryStorage::new());

        let outcome = session.upload_track("loop.gpx", TRACK_GPX);
        assert!(matches!(outcome, DocumentOutcome::Rendered { .. }));
        assert_eq!(
            session.storage().get(TRACK_FILENAME_KEY).unwrap().as_deref(),
            Some("loop.gpx")
        );
        assert_eq!(session.status().track_file.as_deref(), Some("loop.gpx"));

        session.clear_track();
        assert!(session.storage().get(TRACK_DATA_KEY).unwrap().is_none());
        assert!(session.storage().get(TRACK_FILENAME_KEY).unwrap().is_none());
        assert_eq!(session.status().track, TrackStatus::Empty);
    }

    #[test]
    fn test_upload_rejects_non_gpx_names() {
        let mut session = session_with(MemoryStorage::new());

        let outcome = session.upload_track("route.kml", TRACK_GPX);

        assert!(matches!(
            outcome,
            DocumentOutcome::Rejected(TrackError::NotGpxFile(_))
        ));
        assert!(session.storage().is_empty());
    }

    #[test]
    fn test_init_restores_saved_track_without_fitting() {
        let mut storage = MemoryStorage::new();
        storage.set(TRACK_DATA_KEY, TRACK_GPX).unwrap();
        storage.set(TRACK_FILENAME_KEY, "loop.gpx").unwrap();
        let mut session = session_with(storage);

        session.init();

        assert_eq!(session.track().status(), TrackStatus::Loaded);
        assert_eq!(session.track().file_name(), Some("loop.gpx"));
        assert_eq!(session.surface().counts().fits, 0);
    }

    #[test]
    fn test_location_success_recentres_and_places_marker() {
        let mut session = session_with(MemoryStorage::new());
        session.init();

        let fix = GeoFix {
            coordinate: Coordinate::new(-6.1, 106.9),
            accuracy_m: 15.0,
        };
        session.handle_location_result(Ok(fix));

        assert_eq!(
            *session.surface().viewport(),
            Viewport::Centered {
                center: fix.coordinate,
                zoom: LOCATED_ZOOM
            }
        );
        let marker = session.markers().self_marker().unwrap();
        assert_eq!(marker.coordinate, fix.coordinate);
        assert!(session.storage().get(SELF_LOCATION_KEY).unwrap().is_some());
    }

    #[test]
    fn test_location_failure_reports_error() {
        let mut session = session_with(MemoryStorage::new());

        session.handle_location_result(Err(GeolocationError::Timeout));

        assert_eq!(
            session.status().location_error.as_deref(),
            Some("Location request timed out")
        );
        assert!(session.markers().self_marker().is_none());
    }

    #[test]
    fn test_dispose_removes_everything_drawn() {
        let mut session = session_with(MemoryStorage::new());
        session.init();
        session.apply_poll(Ok(snapshot()));
        session.set_trails_enabled(true);
        session.upload_track("loop.gpx", TRACK_GPX);

        session.dispose();

        assert_eq!(session.surface().marker_count(), 0);
        assert_eq!(session.surface().shape_count(), 0);
        assert!(session.cancel_token().is_cancelled());
        // Saved state survives for the next session
        assert!(session.storage().get(TRACK_DATA_KEY).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_finished_tasks_are_pruned() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut session = session_with(MemoryStorage::new());

        for i in 0..5 {
            session.load_track_file(temp.path().join(format!("missing-{i}.gpx")));
            let Some(SessionEvent::TrackLoaded(result)) =
                session.events_rx.as_mut().unwrap().recv().await
            else {
                panic!("expected a track load event");
            };
            session.handle_track_loaded(result);
            while session.tasks.iter().any(|task| !task.is_finished()) {
                tokio::task::yield_now().await;
            }
        }

        assert_eq!(session.pending_tasks(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispose_releases_location_guard() {
        let mut session = DashboardSession::new(
            HeadlessMapSurface::new(),
            MemoryStorage::new(),
            Arc::new(StaticGeolocation::at(-6.25, 106.8, 10.0)),
            SessionConfig::default(),
        );
        session.init();
        assert!(session.request_location());

        session.dispose();

        assert!(!session.location().is_in_flight());
    }

    #[tokio::test]
    async fn test_run_processes_commands_until_cancelled() {
        let mut session = session_with(MemoryStorage::new());
        session.init();
        let events = session.events();
        let cancel = session.cancel_token();

        events.send(SessionEvent::Poll(Ok(snapshot()))).await.unwrap();
        events.send(SessionEvent::SetTrails(true)).await.unwrap();
        cancel.cancel();
        session.run().await;

        // Cancellation may win the race against queued events; drain the rest
        while let Ok(event) = session.events_rx.as_mut().unwrap().try_recv() {
            session.handle_event(event);
        }
        assert_eq!(session.markers().len(), 2);
        assert!(session.trails().is_enabled());
    }
}
