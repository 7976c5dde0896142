use crate::catalog::catalog::BodyCatalog;
use crate::transform::coordinates::BodyPlacement;

/// Render side of the scene: turns placements into meshes, rings and
/// materials. Called once per accepted dataset, never per frame.
pub trait SceneBackend {
    fn rebuild(&mut self, catalog: &BodyCatalog, placements: &[BodyPlacement]);
}

/// Backend that draws nothing; for headless use.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullBackend;

impl SceneBackend for NullBackend {
    fn rebuild(&mut self, _catalog: &BodyCatalog, _placements: &[BodyPlacement]) {}
}
