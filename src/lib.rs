pub mod catalog;
pub mod config;
pub mod data;
pub mod feed;
pub mod flight;
pub mod projection;
pub mod ranking;
pub mod scene;
pub mod transform;

use std::collections::BTreeMap;
use std::f32::consts::{FRAC_PI_2, PI};
use std::sync::Arc;

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Scene units per astronomical unit.
pub const SCALE_FACTOR: f32 = 10.0;

/// Base tilt applied to every body and orbit ring: a quarter turn to lay the
/// ecliptic flat, plus Earth's 23 degree axial tilt.
pub const GLOBAL_TILT: f32 = FRAC_PI_2 + 23.0 * PI / 180.0;

/// Heliocentric position of one body at one instant, in astronomical units.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Coordinate {
    pub timestamp: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Coordinate {
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Coordinates for every body reported at one requested timestamp. Bodies
/// absent from the map are placed at the fallback position.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct CoordinateSet {
    pub timestamp: String,
    pub coordinates: BTreeMap<String, Coordinate>,
}

impl CoordinateSet {
    pub fn get(&self, body_id: &str) -> Option<&Coordinate> {
        self.coordinates.get(body_id)
    }
}

/// Position of a body in scene units (`Coordinate * SCALE_FACTOR`).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ScenePosition {
    pub body_id: Arc<str>,
    pub pos: Vec3,
}

/// Total inclination applied to a body and its orbit ring.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct OrbitTilt {
    pub body_id: Arc<str>,
    pub total_inclination_rad: f32,
}

#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CameraState {
    pub position: Vec3,
    pub target: Vec3,
}

impl CameraState {
    pub fn new(position: Vec3, target: Vec3) -> Self {
        CameraState { position, target }
    }
}

impl Default for CameraState {
    fn default() -> Self {
        CameraState {
            position: Vec3::new(0.0, 50.0, 100.0),
            target: Vec3::ZERO,
        }
    }
}

/// User-movable point that every body's distance is measured against.
#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ReferencePoint {
    pub position: Vec3,
}

#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ScreenPosition {
    pub x: f32,
    pub y: f32,
}

impl ScreenPosition {
    /// Returned for points that cannot be projected (behind the eye or a
    /// degenerate transform).
    pub const OFF_SCREEN: ScreenPosition = ScreenPosition {
        x: -10_000.0,
        y: -10_000.0,
    };

    pub fn is_off_screen(&self) -> bool {
        *self == Self::OFF_SCREEN
    }
}

/// Viewport size in pixels.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Viewport { width, height }
    }

    /// Width over height, or `None` when the viewport is collapsed.
    pub fn aspect(&self) -> Option<f32> {
        if self.width > 0.0 && self.height > 0.0 {
            Some(self.width / self.height)
        } else {
            None
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport::new(1280.0, 720.0)
    }
}

/// One row of the per-frame distance ranking.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RankedDistance {
    pub body_id: Arc<str>,
    pub name: Arc<str>,
    /// Distance to the reference point in AU, rounded to two decimals.
    pub distance_au: f32,
    pub screen_pos: ScreenPosition,
}
