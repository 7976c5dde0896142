use std::f32::consts::FRAC_PI_2;

use glam::Vec3;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::catalog::catalog::{Body, BodyCatalog};
use crate::{Coordinate, CoordinateSet, OrbitTilt, ScenePosition, GLOBAL_TILT, SCALE_FACTOR};

/// Scene position used when a body has no usable coordinate.
pub const FALLBACK_POSITION: Vec3 = Vec3::new(10.0, 0.0, 0.0);

/// Half-width of an orbit ring in scene units.
pub const ORBIT_RING_HALF_WIDTH: f32 = 0.1;

/// Orbit ring dimensions handed to the render backend.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct OrbitRing {
    pub inner_radius: f32,
    pub outer_radius: f32,
    /// Rotation about X; the ring is drawn in its own local plane, so it
    /// carries an extra quarter turn on top of the body tilt.
    pub rotation: f32,
}

/// Everything derived for one body from one coordinate.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BodyPlacement {
    pub position: ScenePosition,
    pub tilt: OrbitTilt,
    pub orbit: OrbitRing,
    /// True when the fallback position was used.
    pub fallback: bool,
}

pub fn to_scene(coordinate: &Coordinate) -> Vec3 {
    let k = SCALE_FACTOR as f64;
    Vec3::new(
        (coordinate.x * k) as f32,
        (coordinate.y * k) as f32,
        (coordinate.z * k) as f32,
    )
}

pub fn total_inclination(inclination_deg: f32) -> f32 {
    GLOBAL_TILT + inclination_deg.to_radians()
}

pub fn orbit_ring(scene: Vec3, tilt: f32) -> OrbitRing {
    let radius = scene.length();
    OrbitRing {
        inner_radius: (radius - ORBIT_RING_HALF_WIDTH).max(0.0),
        outer_radius: radius + ORBIT_RING_HALF_WIDTH,
        rotation: FRAC_PI_2 + tilt,
    }
}

/// Converts one AU coordinate into a scene position and orbit tilt.
pub fn transform(body: &Body, coordinate: &Coordinate) -> (ScenePosition, OrbitTilt) {
    let position = ScenePosition {
        body_id: body.id.clone(),
        pos: to_scene(coordinate),
    };
    let tilt = OrbitTilt {
        body_id: body.id.clone(),
        total_inclination_rad: total_inclination(body.inclination_deg),
    };
    (position, tilt)
}

/// Places a body, substituting the fallback position when the coordinate is
/// missing or not finite.
pub fn place_body(body: &Body, coordinate: Option<&Coordinate>) -> BodyPlacement {
    let usable = match coordinate {
        Some(c) if c.is_finite() => Some(c),
        Some(c) => {
            warn!(
                "Rejecting non-finite coordinate for {} at {}: ({}, {}, {})",
                body.id, c.timestamp, c.x, c.y, c.z
            );
            None
        }
        None => {
            debug!("No coordinate for {}, using fallback position", body.id);
            None
        }
    };

    let tilt = OrbitTilt {
        body_id: body.id.clone(),
        total_inclination_rad: total_inclination(body.inclination_deg),
    };
    let (position, fallback) = match usable {
        Some(c) => (transform(body, c).0, false),
        None => (
            ScenePosition {
                body_id: body.id.clone(),
                pos: FALLBACK_POSITION,
            },
            true,
        ),
    };
    let orbit = orbit_ring(position.pos, tilt.total_inclination_rad);
    BodyPlacement {
        position,
        tilt,
        orbit,
        fallback,
    }
}

/// Places every catalog body, in catalog order.
pub fn place_catalog(catalog: &BodyCatalog, set: &CoordinateSet) -> Vec<BodyPlacement> {
    for id in set.coordinates.keys() {
        if catalog.index_of_id(id).is_none() {
            warn!("Ignoring coordinate for unknown body {id}");
        }
    }
    catalog
        .iter()
        .map(|body| place_body(body, set.get(&body.id)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use std::f32::consts::PI;

    fn coord(x: f64, y: f64, z: f64) -> Coordinate {
        Coordinate {
            timestamp: "2024-01-01T00:00:00Z".into(),
            x,
            y,
            z,
        }
    }

    #[test]
    fn scales_au_to_scene_units() {
        let catalog = BodyCatalog::solar_system();
        let earth = catalog.get("earth").unwrap();
        let (pos, tilt) = transform(earth, &coord(1.0, 0.0, 0.0));
        assert_eq!(pos.pos, Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(tilt.total_inclination_rad, GLOBAL_TILT);

        let (pos, _) = transform(earth, &coord(-0.5, 0.25, 2.0));
        assert_eq!(pos.pos, Vec3::new(-5.0, 2.5, 20.0));
    }

    #[test]
    fn tilt_adds_body_inclination() {
        let catalog = BodyCatalog::solar_system();
        let mercury = catalog.get("mercury").unwrap();
        let expected = (PI / 2.0 + 23.0 * PI / 180.0) + 7.0 * PI / 180.0;
        let placement = place_body(mercury, Some(&coord(0.3, 0.1, 0.0)));
        assert_approx_eq!(placement.tilt.total_inclination_rad, expected, 1e-6);
        assert_approx_eq!(placement.orbit.rotation, PI / 2.0 + expected, 1e-6);
    }

    #[test]
    fn missing_and_non_finite_fall_back() {
        let catalog = BodyCatalog::solar_system();
        let mars = catalog.get("mars").unwrap();

        let missing = place_body(mars, None);
        assert!(missing.fallback);
        assert_eq!(missing.position.pos, FALLBACK_POSITION);

        let nan = place_body(mars, Some(&coord(f64::NAN, 0.0, 0.0)));
        assert!(nan.fallback);
        assert_eq!(nan.position.pos, FALLBACK_POSITION);

        let inf = place_body(mars, Some(&coord(0.0, f64::INFINITY, 0.0)));
        assert!(inf.fallback);
    }

    #[test]
    fn orbit_ring_brackets_distance() {
        let ring = orbit_ring(Vec3::new(30.0, 40.0, 0.0), GLOBAL_TILT);
        assert_approx_eq!(ring.inner_radius, 49.9, 1e-4);
        assert_approx_eq!(ring.outer_radius, 50.1, 1e-4);

        let at_origin = orbit_ring(Vec3::ZERO, GLOBAL_TILT);
        assert_eq!(at_origin.inner_radius, 0.0);
    }

    #[test]
    fn place_catalog_keeps_catalog_order() {
        let catalog = BodyCatalog::solar_system();
        let mut set = CoordinateSet {
            timestamp: "2024-01-01T00:00:00Z".into(),
            ..Default::default()
        };
        set.coordinates.insert("earth".into(), coord(1.0, 0.0, 0.0));
        set.coordinates.insert("sun".into(), coord(0.0, 0.0, 0.0));
        set.coordinates.insert("vulcan".into(), coord(0.1, 0.0, 0.0));

        let placements = place_catalog(&catalog, &set);
        assert_eq!(placements.len(), catalog.len());
        let ids: Vec<&str> = placements.iter().map(|p| &*p.position.body_id).collect();
        let expected: Vec<&str> = catalog.iter().map(|b| &*b.id).collect();
        assert_eq!(ids, expected);
        assert!(!placements[0].fallback);
        assert_eq!(placements[3].position.pos, Vec3::new(10.0, 0.0, 0.0));
        assert!(placements[1].fallback);
    }
}
