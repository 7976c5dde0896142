use std::collections::BTreeMap;
use std::sync::Arc;

use glam::{Mat4, Vec3};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::catalog::catalog::BodyCatalog;
use crate::config::{ConfigError, EngineConfig};
use crate::feed::feed::FeedError;
use crate::feed::sequencer::{RefreshInbox, RefreshSender, RefreshTicket, RequestSequencer};
use crate::flight::flight::{focus_target, CameraFlightController};
use crate::projection::camera::PerspectiveCamera;
use crate::projection::projector::project;
use crate::ranking::ranker::DistanceRanker;
use crate::scene::backend::{NullBackend, SceneBackend};
use crate::transform::coordinates::{place_catalog, BodyPlacement};
use crate::{CameraState, CoordinateSet, RankedDistance, ReferencePoint, ScreenPosition, Viewport};

/// Coordinate feed state as shown to the presentation layer.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FeedStatus {
    #[default]
    Idle,
    Loading { sequence: u64 },
    Ready { sequence: u64, timestamp: String },
    Failed { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied,
    Failed,
    /// A newer request was issued; the response was dropped.
    Stale,
}

/// Everything the presentation layer gets for one frame, by value.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FrameSnapshot {
    pub camera: CameraState,
    pub screen_positions: BTreeMap<Arc<str>, ScreenPosition>,
    pub ranking: Vec<RankedDistance>,
    pub feed: FeedStatus,
    pub flying: bool,
}

/// Owns all mutable scene state and drives the per-frame pipeline:
/// flight tick, projection, ranking.
///
/// Everything here runs on the frame thread. Fetch workers hand their
/// results over through [`SceneStateManager::refresh_sender`].
pub struct SceneStateManager<B: SceneBackend = NullBackend> {
    catalog: BodyCatalog,
    config: EngineConfig,
    backend: B,
    camera: Option<PerspectiveCamera>,
    flight: CameraFlightController,
    reference: ReferencePoint,
    viewport: Viewport,
    placements: Vec<BodyPlacement>,
    coordinates: Option<CoordinateSet>,
    screens: Vec<ScreenPosition>,
    ranker: DistanceRanker,
    sequencer: RequestSequencer,
    inbox: RefreshInbox,
    feed: FeedStatus,
}

impl SceneStateManager<NullBackend> {
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        Self::with_backend(config, NullBackend)
    }
}

impl<B: SceneBackend> SceneStateManager<B> {
    pub fn with_backend(config: EngineConfig, backend: B) -> Result<Self, ConfigError> {
        config.validate()?;
        let catalog = config.catalog()?;
        Ok(SceneStateManager {
            viewport: config.viewport,
            catalog,
            config,
            backend,
            camera: None,
            flight: CameraFlightController::new(),
            reference: ReferencePoint::default(),
            placements: Vec::new(),
            coordinates: None,
            screens: Vec::new(),
            ranker: DistanceRanker::new(),
            sequencer: RequestSequencer::new(),
            inbox: RefreshInbox::new(),
            feed: FeedStatus::Idle,
        })
    }

    pub fn catalog(&self) -> &BodyCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn placements(&self) -> &[BodyPlacement] {
        &self.placements
    }

    pub fn coordinates(&self) -> Option<&CoordinateSet> {
        self.coordinates.as_ref()
    }

    pub fn feed_status(&self) -> &FeedStatus {
        &self.feed
    }

    pub fn is_flying(&self) -> bool {
        self.flight.is_flying()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Current camera state, or the configured default before the first
    /// dataset arrives.
    pub fn camera_state(&self) -> CameraState {
        self.camera
            .as_ref()
            .map(|c| c.state)
            .unwrap_or(self.config.default_camera)
    }

    /// Direct camera placement from user orbit controls. Ignored while a
    /// flight owns the camera.
    pub fn set_camera_state(&mut self, state: CameraState) {
        if self.flight.is_flying() {
            debug!("Camera is flying, ignoring direct placement");
            return;
        }
        match self.camera.as_mut() {
            Some(camera) => camera.state = state,
            None => self.camera = Some(PerspectiveCamera::new(state, self.config.lens, self.viewport)),
        }
    }

    pub fn reference_point(&self) -> ReferencePoint {
        self.reference
    }

    /// Latest reported position wins; no smoothing.
    pub fn set_reference_point(&mut self, position: Vec3) {
        if position.is_finite() {
            self.reference = ReferencePoint { position };
        } else {
            warn!("Ignoring non-finite reference point {position}");
        }
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.viewport = Viewport::new(width, height);
        if let Some(camera) = self.camera.as_mut() {
            camera.set_viewport(self.viewport);
        }
    }

    /// Replaces the dataset. The camera is recreated but keeps its state, and
    /// a running flight is left alone so it carries on from that state.
    pub fn rebuild_scene(&mut self, set: CoordinateSet) {
        let snapshot = self.camera_state();
        self.placements = place_catalog(&self.catalog, &set);
        self.backend.rebuild(&self.catalog, &self.placements);
        self.camera = Some(PerspectiveCamera::new(snapshot, self.config.lens, self.viewport));

        let fallbacks = self.placements.iter().filter(|p| p.fallback).count();
        info!(
            "Applied coordinates for {} ({} bodies, {} at fallback position)",
            set.timestamp,
            self.placements.len(),
            fallbacks
        );
        self.coordinates = Some(set);
    }

    /// Registers a new fetch. Only the response carrying the returned
    /// sequence number will be accepted.
    pub fn begin_refresh(&mut self, timestamp: &str) -> RefreshTicket {
        let ticket = self.sequencer.issue(timestamp);
        self.feed = FeedStatus::Loading {
            sequence: ticket.sequence,
        };
        ticket
    }

    pub fn complete_refresh(
        &mut self,
        sequence: u64,
        result: Result<CoordinateSet, FeedError>,
    ) -> RefreshOutcome {
        if !self.sequencer.is_current(sequence) {
            info!(
                "Dropping out-of-order refresh {sequence} (latest issued {})",
                self.sequencer.latest_issued()
            );
            return RefreshOutcome::Stale;
        }
        self.sequencer.settle(sequence);
        match result {
            Ok(set) => {
                let timestamp = set.timestamp.clone();
                self.rebuild_scene(set);
                self.feed = FeedStatus::Ready {
                    sequence,
                    timestamp,
                };
                RefreshOutcome::Applied
            }
            Err(err) => {
                warn!("Coordinate refresh {sequence} failed, keeping last dataset: {err}");
                self.feed = FeedStatus::Failed {
                    message: err.to_string(),
                };
                RefreshOutcome::Failed
            }
        }
    }

    pub fn refresh_sender(&self) -> RefreshSender {
        self.inbox.sender()
    }

    /// Applies whatever workers have delivered since the last call.
    pub fn pump_refreshes(&mut self) -> Vec<RefreshOutcome> {
        let deliveries: Vec<_> = self.inbox.drain().collect();
        deliveries
            .into_iter()
            .map(|d| self.complete_refresh(d.sequence, d.result))
            .collect()
    }

    /// Starts a flight framing `body_id`. Unknown ids, or no dataset yet,
    /// are a no-op and return false.
    pub fn focus(&mut self, body_id: &str, now_ms: f64) -> bool {
        let Some(idx) = self.catalog.index_of_id(body_id) else {
            debug!("Ignoring focus on unknown body {body_id}");
            return false;
        };
        let Some(placement) = self.placements.get(idx) else {
            debug!("Ignoring focus on {body_id}: no coordinates loaded");
            return false;
        };
        let body = &self.catalog.bodies[idx];
        let current = self.camera_state();
        let end = focus_target(
            placement.position.pos,
            body.radius_scale,
            self.config.focus_direction,
            self.config.focus_radius_multiple,
        );
        self.flight.start_flight(
            current,
            end.position,
            end.target,
            self.config.flight_duration_ms,
            now_ms,
        );
        true
    }

    /// Flies back to the configured default view, superseding any flight.
    pub fn return_home(&mut self, now_ms: f64) {
        let home = self.config.default_camera;
        let current = self.camera_state();
        self.flight.start_flight(
            current,
            home.position,
            home.target,
            self.config.flight_duration_ms,
            now_ms,
        );
    }

    /// One rendered frame: pending refreshes, flight tick, projection,
    /// ranking.
    pub fn frame(&mut self, now_ms: f64) -> FrameSnapshot {
        self.pump_refreshes();

        if let Some(state) = self.flight.tick(now_ms) {
            match self.camera.as_mut() {
                Some(camera) => camera.state = state,
                None => {
                    self.camera = Some(PerspectiveCamera::new(state, self.config.lens, self.viewport));
                }
            }
        }

        let camera = self.camera_state();
        let view_projection = match &self.camera {
            Some(c) => c.view_projection(),
            None => {
                return FrameSnapshot {
                    camera,
                    screen_positions: BTreeMap::new(),
                    ranking: Vec::new(),
                    feed: self.feed.clone(),
                    flying: self.flight.is_flying(),
                }
            }
        };

        self.project_all(&view_projection);

        let ranking = self
            .ranker
            .rank(
                self.catalog
                    .bodies
                    .iter()
                    .zip(&self.placements)
                    .zip(&self.screens)
                    .map(|((body, placement), screen)| (body, &placement.position, *screen)),
                self.reference.position,
            )
            .to_vec();

        let screen_positions = self
            .placements
            .iter()
            .zip(&self.screens)
            .map(|(p, s)| (p.position.body_id.clone(), *s))
            .collect();

        FrameSnapshot {
            camera,
            screen_positions,
            ranking,
            feed: self.feed.clone(),
            flying: self.flight.is_flying(),
        }
    }

    fn project_all(&mut self, view_projection: &Mat4) {
        self.screens.clear();
        for placement in &self.placements {
            let screen = project(placement.position.pos, view_projection, self.viewport);
            if screen.is_off_screen() {
                debug!("{} cannot be projected this frame", placement.position.body_id);
            }
            self.screens.push(screen);
        }
    }
}
