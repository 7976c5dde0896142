use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::{CameraState, Viewport};

/// Perspective lens parameters.
// Squared sine of the smallest angle to Y that still yields a usable basis.
const PARALLEL_EPSILON: f32 = 1e-6;

#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Lens {
    pub fov_y_deg: f32,
    pub near: f32,
    pub far: f32,
}

impl Lens {
    pub fn is_valid(&self) -> bool {
        self.fov_y_deg > 0.0
            && self.fov_y_deg < 180.0
            && self.near > 0.0
            && self.far > self.near
            && self.far.is_finite()
    }
}

impl Default for Lens {
    fn default() -> Self {
        Lens {
            fov_y_deg: 45.0,
            near: 0.1,
            far: 10_000.0,
        }
    }
}

/// Look-at perspective camera. The scene manager recreates it on every
/// dataset swap and carries `state` across.
#[derive(Clone, Debug, PartialEq)]
pub struct PerspectiveCamera {
    pub state: CameraState,
    pub lens: Lens,
    aspect: f32,
}

impl PerspectiveCamera {
    pub fn new(state: CameraState, lens: Lens, viewport: Viewport) -> Self {
        PerspectiveCamera {
            state,
            lens,
            aspect: viewport.aspect().unwrap_or(1.0),
        }
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Updates the aspect ratio; a collapsed viewport keeps the previous one.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        if let Some(aspect) = viewport.aspect() {
            self.aspect = aspect;
        }
    }

    /// Up axis for the look-at basis. Y, unless the camera looks straight
    /// along it, in which case the basis is built around Z instead.
    pub fn up_axis(&self) -> Vec3 {
        let forward = (self.state.target - self.state.position).normalize_or_zero();
        if forward.cross(Vec3::Y).length_squared() > PARALLEL_EPSILON {
            Vec3::Y
        } else if forward.y > 0.0 {
            Vec3::Z
        } else {
            Vec3::NEG_Z
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.state.position, self.state.target, self.up_axis())
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh_gl(
            self.lens.fov_y_deg.to_radians(),
            self.aspect,
            self.lens.near,
            self.lens.far,
        )
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapsed_viewport_keeps_aspect() {
        let mut cam = PerspectiveCamera::new(CameraState::default(), Lens::default(), Viewport::new(800.0, 400.0));
        assert_eq!(cam.aspect(), 2.0);
        cam.set_viewport(Viewport::new(800.0, 0.0));
        assert_eq!(cam.aspect(), 2.0);
        cam.set_viewport(Viewport::new(300.0, 300.0));
        assert_eq!(cam.aspect(), 1.0);
    }

    #[test]
    fn vertical_view_has_finite_basis() {
        let viewport = Viewport::new(1280.0, 720.0);
        let down = PerspectiveCamera::new(
            CameraState::new(Vec3::new(0.0, 100.0, 0.0), Vec3::ZERO),
            Lens::default(),
            viewport,
        );
        assert_eq!(down.up_axis(), Vec3::NEG_Z);
        assert!(down.view_projection().is_finite());

        let up = PerspectiveCamera::new(
            CameraState::new(Vec3::new(3.0, -40.0, 2.0), Vec3::new(3.0, 10.0, 2.0)),
            Lens::default(),
            viewport,
        );
        assert_eq!(up.up_axis(), Vec3::Z);
        assert!(up.view_projection().is_finite());

        assert_eq!(PerspectiveCamera::new(CameraState::default(), Lens::default(), viewport).up_axis(), Vec3::Y);
    }

    #[test]
    fn lens_validation() {
        assert!(Lens::default().is_valid());
        assert!(!Lens { near: 0.0, ..Lens::default() }.is_valid());
        assert!(!Lens { far: 0.05, ..Lens::default() }.is_valid());
        assert!(!Lens { fov_y_deg: 180.0, ..Lens::default() }.is_valid());
    }
}
