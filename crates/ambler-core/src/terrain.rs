//! Terrain height queries.
//!
//! The placement planner only ever needs the ground height under a
//! prospective footprint. Perception supplies an implementation of
//! [`TerrainModel`]; the planner tolerates running without one and falls
//! back to its last per-leg ground-height estimate.

use nalgebra::Vector3;

/// Height-at-point query toward the perception stack.
pub trait TerrainModel {
    /// Ground height at the horizontal (x, y) of `position`.
    fn height_at(&self, position: &Vector3<f64>) -> f64;
}

/// Flat ground at a fixed height.
#[derive(Clone, Copy, Debug, Default)]
pub struct FlatTerrain {
    pub height: f64,
}

impl TerrainModel for FlatTerrain {
    fn height_at(&self, _position: &Vector3<f64>) -> f64 {
        self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn flat_terrain_ignores_position() {
        let terrain = FlatTerrain { height: 0.12 };
        assert_relative_eq!(terrain.height_at(&Vector3::new(1.0, -2.0, 5.0)), 0.12);
        assert_relative_eq!(terrain.height_at(&Vector3::zeros()), 0.12);
    }

    #[test]
    fn works_as_trait_object() {
        let terrain = FlatTerrain { height: -0.05 };
        let dyn_terrain: &dyn TerrainModel = &terrain;
        assert_relative_eq!(dyn_terrain.height_at(&Vector3::zeros()), -0.05);
    }
}
