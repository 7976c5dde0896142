use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::CameraState;

/// Default flight length in milliseconds.
pub const DEFAULT_FLIGHT_MS: f64 = 1000.0;

/// Cubic ease-out: fast start, decelerating into the end point.
pub fn ease_out_cubic(t: f32) -> f32 {
    1.0 - (1.0 - t).powi(3)
}

/// One camera flight from a start state to an end state.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FlightAnimation {
    pub start: CameraState,
    pub end: CameraState,
    pub start_time_ms: f64,
    pub duration_ms: f64,
}

impl FlightAnimation {
    /// Linear progress in `[0, 1]`. Zero, negative or non-finite durations
    /// count as already finished.
    pub fn progress(&self, now_ms: f64) -> f32 {
        if !(self.duration_ms.is_finite() && self.duration_ms > 0.0) {
            return 1.0;
        }
        let t = (now_ms - self.start_time_ms) / self.duration_ms;
        if t.is_nan() {
            return 1.0;
        }
        t.clamp(0.0, 1.0) as f32
    }

    /// Interpolated camera state at `now_ms`; exactly `end` once finished.
    pub fn sample(&self, now_ms: f64) -> CameraState {
        let progress = self.progress(now_ms);
        if progress >= 1.0 {
            return self.end;
        }
        let eased = ease_out_cubic(progress);
        CameraState {
            position: lerp(self.start.position, self.end.position, eased),
            target: lerp(self.start.target, self.end.target, eased),
        }
    }
}

fn lerp(start: Vec3, end: Vec3, t: f32) -> Vec3 {
    start + (end - start) * t
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum FlightPhase {
    #[default]
    Idle,
    Flying(FlightAnimation),
}

/// Idle -> Flying -> Idle. A new flight replaces the active one; there is no
/// queue.
#[derive(Debug, Default)]
pub struct CameraFlightController {
    phase: FlightPhase,
}

impl CameraFlightController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &FlightPhase {
        &self.phase
    }

    pub fn is_flying(&self) -> bool {
        matches!(self.phase, FlightPhase::Flying(_))
    }

    /// Starts a flight towards `end_position` looking at `end_target`.
    ///
    /// If a flight is already running it is superseded and the new flight
    /// starts from where the old one is at `now_ms`, not from `current`, so
    /// the camera never jumps.
    pub fn start_flight(
        &mut self,
        current: CameraState,
        end_position: Vec3,
        end_target: Vec3,
        duration_ms: f64,
        now_ms: f64,
    ) {
        let start = match &self.phase {
            FlightPhase::Flying(active) => active.sample(now_ms),
            FlightPhase::Idle => current,
        };
        self.phase = FlightPhase::Flying(FlightAnimation {
            start,
            end: CameraState::new(end_position, end_target),
            start_time_ms: now_ms,
            duration_ms,
        });
    }

    /// Advances the active flight. Returns `None` while idle; the tick that
    /// completes a flight returns its exact end state and goes idle.
    pub fn tick(&mut self, now_ms: f64) -> Option<CameraState> {
        let FlightPhase::Flying(active) = self.phase else {
            return None;
        };
        let state = active.sample(now_ms);
        if active.progress(now_ms) >= 1.0 {
            self.phase = FlightPhase::Idle;
        }
        Some(state)
    }
}

/// Camera end state for framing a body: pulled back from its centre along
/// `direction` by `multiple` times its render radius, looking at it.
pub fn focus_target(
    body_position: Vec3,
    radius_scale: f32,
    direction: Vec3,
    multiple: f32,
) -> CameraState {
    let dir = direction.try_normalize().unwrap_or(Vec3::Z);
    CameraState {
        position: body_position + dir * (radius_scale * multiple),
        target: body_position,
    }
}
