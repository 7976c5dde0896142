use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Id of the single body that must sit in every catalog.
pub const SUN_ID: &str = "sun";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Body {
    pub id: Arc<str>,
    pub name: Arc<str>,
    /// Render radius in scene units.
    pub radius_scale: f32,
    pub inclination_deg: f32,
}

impl Body {
    pub fn new(id: &str, name: &str, radius_scale: f32, inclination_deg: f32) -> Self {
        Body {
            id: id.into(),
            name: name.into(),
            radius_scale,
            inclination_deg,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    #[error("catalog contains no bodies")]
    Empty,
    #[error("duplicate body id {0}")]
    DuplicateId(String),
    #[error("body {0} has a non-positive or non-finite radius scale")]
    InvalidRadius(String),
    #[error("body {0} has a non-finite inclination")]
    InvalidInclination(String),
    #[error("catalog must contain exactly one \"sun\" body, found {0}")]
    SunCount(usize),
    #[error("the sun must have zero inclination, found {0}")]
    TiltedSun(f32),
}

/// Fixed, ordered set of known bodies.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BodyCatalog {
    pub bodies: Vec<Body>,
    #[serde(skip)]
    id_index: HashMap<Arc<str>, usize>,
}

impl BodyCatalog {
    pub fn new(bodies: Vec<Body>) -> Result<Self, CatalogError> {
        let mut catalog = BodyCatalog {
            bodies,
            id_index: HashMap::new(),
        };
        catalog.rebuild_indices();
        catalog.validate()?;
        Ok(catalog)
    }

    /// Sun and the eight planets, with their orbital inclinations to the ecliptic.
    pub fn solar_system() -> Self {
        let bodies = vec![
            Body::new(SUN_ID, "Sun", 2.0, 0.0),
            Body::new("mercury", "Mercury", 0.2, 7.00),
            Body::new("venus", "Venus", 0.45, 3.39),
            Body::new("earth", "Earth", 0.5, 0.0),
            Body::new("mars", "Mars", 0.3, 1.85),
            Body::new("jupiter", "Jupiter", 1.2, 1.30),
            Body::new("saturn", "Saturn", 1.0, 2.49),
            Body::new("uranus", "Uranus", 0.8, 0.77),
            Body::new("neptune", "Neptune", 0.75, 1.77),
        ];
        let mut catalog = BodyCatalog {
            bodies,
            id_index: HashMap::new(),
        };
        catalog.rebuild_indices();
        catalog
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.bodies.is_empty() {
            return Err(CatalogError::Empty);
        }
        if self.id_index.len() != self.bodies.len() {
            let mut seen = std::collections::HashSet::new();
            for body in &self.bodies {
                if !seen.insert(body.id.clone()) {
                    return Err(CatalogError::DuplicateId(body.id.to_string()));
                }
            }
        }
        for body in &self.bodies {
            if !(body.radius_scale.is_finite() && body.radius_scale > 0.0) {
                return Err(CatalogError::InvalidRadius(body.id.to_string()));
            }
            if !body.inclination_deg.is_finite() {
                return Err(CatalogError::InvalidInclination(body.id.to_string()));
            }
        }
        let suns: Vec<&Body> = self.bodies.iter().filter(|b| &*b.id == SUN_ID).collect();
        match suns.as_slice() {
            [sun] if sun.inclination_deg != 0.0 => Err(CatalogError::TiltedSun(sun.inclination_deg)),
            [_] => Ok(()),
            other => Err(CatalogError::SunCount(other.len())),
        }
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn index_of_id(&self, id: &str) -> Option<usize> {
        self.id_index.get(id).copied()
    }

    pub fn get(&self, id: &str) -> Option<&Body> {
        self.index_of_id(id).map(|idx| &self.bodies[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Body> {
        self.bodies.iter()
    }

    pub fn rebuild_indices(&mut self) {
        self.id_index = self
            .bodies
            .iter()
            .enumerate()
            .map(|(idx, body)| (body.id.clone(), idx))
            .collect();
    }
}

impl Default for BodyCatalog {
    fn default() -> Self {
        Self::solar_system()
    }
}
