use glam::{Mat4, Vec3};

use crate::{ScreenPosition, Viewport};

/// Clip-space `w` below this is treated as a degenerate projection.
const MIN_CLIP_W: f32 = 1e-6;

/// Normalized device coordinates of a scene point, or `None` when the point
/// sits on or behind the eye plane, or the transform is degenerate.
pub fn to_ndc(scene: Vec3, view_projection: &Mat4) -> Option<(f32, f32)> {
    let clip = *view_projection * scene.extend(1.0);
    if !clip.w.is_finite() || clip.w < MIN_CLIP_W {
        return None;
    }
    let ndc_x = clip.x / clip.w;
    let ndc_y = clip.y / clip.w;
    if ndc_x.is_finite() && ndc_y.is_finite() {
        Some((ndc_x, ndc_y))
    } else {
        None
    }
}

/// Maps NDC to pixels; screen Y grows downward.
pub fn ndc_to_screen(ndc_x: f32, ndc_y: f32, viewport: Viewport) -> ScreenPosition {
    ScreenPosition {
        x: (ndc_x * 0.5 + 0.5) * viewport.width,
        y: (-ndc_y * 0.5 + 0.5) * viewport.height,
    }
}

/// Projects a scene point to pixel coordinates. Points that cannot be
/// projected come back as [`ScreenPosition::OFF_SCREEN`].
pub fn project(scene: Vec3, view_projection: &Mat4, viewport: Viewport) -> ScreenPosition {
    match to_ndc(scene, view_projection) {
        Some((x, y)) => ndc_to_screen(x, y, viewport),
        None => ScreenPosition::OFF_SCREEN,
    }
}
