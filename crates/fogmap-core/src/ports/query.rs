use crate::models::{BoundingBox, ExploredArea};

/// Port for read-only access to explored cells
///
/// The fog generator depends on this trait rather than on a concrete store,
/// so any collection of explored areas can be rendered.
pub trait ExploredAreaQuery {
    /// Areas whose decoded cell box intersects `bounds`
    fn areas_in_bounds(&self, bounds: &BoundingBox) -> Vec<ExploredArea>;
}
