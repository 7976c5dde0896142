use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::catalog::{Body, BodyCatalog, CatalogError};
use crate::flight::flight::DEFAULT_FLIGHT_MS;
use crate::projection::camera::Lens;
use crate::{CameraState, Viewport};

/// Env var naming a JSON config file.
pub const CONFIG_ENV: &str = "ORRERY_ENGINE_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error("invalid body catalog: {0}")]
    Catalog(#[from] CatalogError),
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub flight_duration_ms: f64,
    /// Used when no camera exists yet, and as the `return_home` destination.
    pub default_camera: CameraState,
    pub lens: Lens,
    pub focus_direction: Vec3,
    /// Focus distance in multiples of the body's render radius.
    pub focus_radius_multiple: f32,
    pub viewport: Viewport,
    /// Replaces the built-in solar system catalog when set.
    pub bodies: Option<Vec<Body>>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            flight_duration_ms: DEFAULT_FLIGHT_MS,
            default_camera: CameraState::default(),
            lens: Lens::default(),
            focus_direction: Vec3::new(0.0, 0.5, 1.0),
            focus_radius_multiple: 3.0,
            viewport: Viewport::default(),
            bodies: None,
        }
    }
}

impl EngineConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Loads the file named by `ORRERY_ENGINE_CONFIG`, or defaults when unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_path(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.flight_duration_ms.is_finite() && self.flight_duration_ms > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "flight_duration_ms must be positive, got {}",
                self.flight_duration_ms
            )));
        }
        if self.viewport.aspect().is_none() {
            return Err(ConfigError::Invalid("viewport must have a non-zero size".into()));
        }
        if !self.lens.is_valid() {
            return Err(ConfigError::Invalid(format!("degenerate lens {:?}", self.lens)));
        }
        if !(self.focus_radius_multiple.is_finite() && self.focus_radius_multiple > 0.0) {
            return Err(ConfigError::Invalid("focus_radius_multiple must be positive".into()));
        }
        if self.focus_direction.try_normalize().is_none() {
            return Err(ConfigError::Invalid("focus_direction must be non-zero".into()));
        }
        if !(self.default_camera.position.is_finite() && self.default_camera.target.is_finite()) {
            return Err(ConfigError::Invalid("default_camera must be finite".into()));
        }
        self.catalog().map(|_| ())
    }

    pub fn catalog(&self) -> Result<BodyCatalog, ConfigError> {
        match &self.bodies {
            Some(bodies) => Ok(BodyCatalog::new(bodies.clone())?),
            None => Ok(BodyCatalog::solar_system()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.flight_duration_ms, 1000.0);
        assert_eq!(config.default_camera.position, Vec3::new(0.0, 50.0, 100.0));
        assert_eq!(config.catalog().unwrap().len(), 9);
    }

    #[test]
    fn partial_override() {
        let config = EngineConfig::from_json(
            r#"{"flight_duration_ms": 250, "lens": {"fov_y_deg": 60}, "viewport": {"width": 640, "height": 480}}"#,
        )
        .unwrap();
        assert_eq!(config.flight_duration_ms, 250.0);
        assert_eq!(config.lens.fov_y_deg, 60.0);
        assert_eq!(config.lens.near, 0.1);
        assert_eq!(config.viewport, Viewport::new(640.0, 480.0));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            EngineConfig::from_json(r#"{"flight_duration_ms": 0}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            EngineConfig::from_json(r#"{"focus_direction": [0, 0, 0]}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            EngineConfig::from_json(
                r#"{"bodies": [{"id": "earth", "name": "Earth", "radius_scale": 1, "inclination_deg": 0}]}"#
            ),
            Err(ConfigError::Catalog(CatalogError::SunCount(0)))
        ));
        assert!(matches!(EngineConfig::from_json("[1,"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn reads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        fs::write(&path, r#"{"focus_radius_multiple": 4.5}"#).unwrap();
        let config = EngineConfig::from_path(&path).unwrap();
        assert_eq!(config.focus_radius_multiple, 4.5);

        let missing = EngineConfig::from_path(dir.path().join("nope.json"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }
}
