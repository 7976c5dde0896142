use std::collections::BTreeMap;
use std::sync::Arc;

use glam::Vec3;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use log::warn;
use once_cell::sync::Lazy;
use orrery_engine::config::EngineConfig;
use orrery_engine::scene::manager::SceneStateManager;
use orrery_engine::transform::coordinates::BodyPlacement;
use orrery_engine::{CameraState, CoordinateSet, RankedDistance, ScreenPosition, Viewport};
use serde::{Deserialize, Serialize};

static CONFIG: Lazy<EngineConfig> = Lazy::new(|| match EngineConfig::from_env() {
    Ok(config) => config,
    Err(err) => {
        warn!("Falling back to default engine config: {err}");
        EngineConfig::default()
    }
});

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum EngineRequest {
    Snapshot {
        coordinates: CoordinateSet,
        #[serde(default)]
        reference: Vec3,
        camera: Option<CameraState>,
        viewport: Option<Viewport>,
    },
    Focus {
        coordinates: CoordinateSet,
        body_id: String,
        camera: Option<CameraState>,
    },
    Place {
        coordinates: CoordinateSet,
    },
}

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum EngineResponse {
    Snapshot {
        camera: CameraState,
        screen_positions: BTreeMap<Arc<str>, ScreenPosition>,
        ranking: Vec<RankedDistance>,
    },
    Focus {
        camera: CameraState,
    },
    Place {
        placements: Vec<BodyPlacement>,
    },
    Error {
        message: String,
    },
}

fn scene_for(
    coordinates: CoordinateSet,
    camera: Option<CameraState>,
) -> Result<SceneStateManager, Error> {
    let mut scene = SceneStateManager::new(CONFIG.clone())?;
    if let Some(state) = camera {
        scene.set_camera_state(state);
    }
    scene.rebuild_scene(coordinates);
    Ok(scene)
}

async fn handler(event: LambdaEvent<EngineRequest>) -> Result<EngineResponse, Error> {
    match event.payload {
        EngineRequest::Snapshot {
            coordinates,
            reference,
            camera,
            viewport,
        } => {
            let mut scene = scene_for(coordinates, camera)?;
            if let Some(v) = viewport {
                scene.resize(v.width, v.height);
            }
            scene.set_reference_point(reference);
            let frame = scene.frame(0.0);
            Ok(EngineResponse::Snapshot {
                camera: frame.camera,
                screen_positions: frame.screen_positions,
                ranking: frame.ranking,
            })
        }
        EngineRequest::Focus {
            coordinates,
            body_id,
            camera,
        } => {
            let mut scene = scene_for(coordinates, camera)?;
            if !scene.focus(&body_id, 0.0) {
                return Ok(EngineResponse::Error {
                    message: format!("Unknown body_id {}", body_id),
                });
            }
            let landed = scene.frame(scene.config().flight_duration_ms);
            Ok(EngineResponse::Focus {
                camera: landed.camera,
            })
        }
        EngineRequest::Place { coordinates } => {
            let scene = scene_for(coordinates, None)?;
            Ok(EngineResponse::Place {
                placements: scene.placements().to_vec(),
            })
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();
    let func = service_fn(handler);
    lambda_runtime::run(func).await
}
