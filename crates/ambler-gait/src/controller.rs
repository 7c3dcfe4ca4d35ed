//! One named gait, fully wired.
//!
//! Per tick the coordinator runs first so mode edges are fresh, then the
//! stabilizer is fed the predicted hold of the leg it plans around, and
//! the placement planner runs last against the updated modes.

use ambler_core::config::GaitConfig;
use ambler_core::error::ConfigError;
use ambler_core::terrain::TerrainModel;
use ambler_core::types::{LegGroup, TorsoState};

use crate::coordinator::LimbModeCoordinator;
use crate::placement::SwingFootPlacementPlanner;
use crate::scheduler::GaitPhaseScheduler;
use crate::stabilizer::SupportPolygonStabilizer;

/// Coordinator, stabilizer and placement planner for one gait.
#[derive(Clone, Debug)]
pub struct GaitController {
    name: String,
    coordinator: LimbModeCoordinator,
    stabilizer: SupportPolygonStabilizer,
    planner: SwingFootPlacementPlanner,
}

impl GaitController {
    pub fn from_config(name: &str, config: &GaitConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            name: name.to_owned(),
            coordinator: LimbModeCoordinator::new(GaitPhaseScheduler::new(config.timing.clone())),
            stabilizer: SupportPolygonStabilizer::new(config.stabilizer.clone()),
            planner: SwingFootPlacementPlanner::new(config.placement.clone())?,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        self.name = name.to_owned();
    }

    /// Reset all components against the current robot state.
    pub fn initialize(&mut self, legs: &mut LegGroup, torso: &mut TorsoState) {
        self.coordinator.initialize(legs, torso);
        self.stabilizer.initialize(legs, torso);
        self.planner.initialize(legs);
    }

    /// Run one control tick of `dt` seconds.
    pub fn advance(
        &mut self,
        dt: f64,
        legs: &mut LegGroup,
        torso: &mut TorsoState,
        terrain: Option<&dyn TerrainModel>,
    ) {
        self.coordinator.advance(dt, legs, torso);

        let next_swing_leg = self.stabilizer.next_swing_leg();
        let hold = self
            .planner
            .predicted_hold(next_swing_leg, legs, torso, terrain);
        self.stabilizer.set_foot_hold(next_swing_leg, &hold);
        self.stabilizer.advance(dt, legs, torso);

        self.planner.advance(dt, legs, torso, terrain);
    }

    /// Take over `endpoint`'s full parameter set, including the discrete
    /// parameters interpolation leaves alone (swing order, anchor mode,
    /// curve knot grids). Live state (stride phase, filter outputs,
    /// anchors, holds) carries across.
    pub fn adopt_parameters(&mut self, endpoint: &Self) {
        self.coordinator
            .scheduler_mut()
            .set_timing(endpoint.coordinator.scheduler().timing().clone());
        self.stabilizer.adopt_parameters(&endpoint.stabilizer);
        self.planner.adopt_parameters(&endpoint.planner);
    }

    /// Blend all component parameters between `a` and `b` at `t`.
    pub fn set_to_interpolated(&mut self, a: &Self, b: &Self, t: f64) {
        self.coordinator
            .set_to_interpolated(&a.coordinator, &b.coordinator, t);
        self.stabilizer
            .set_to_interpolated(&a.stabilizer, &b.stabilizer, t);
        self.planner.set_to_interpolated(&a.planner, &b.planner, t);
    }

    #[must_use]
    pub const fn coordinator(&self) -> &LimbModeCoordinator {
        &self.coordinator
    }

    pub fn coordinator_mut(&mut self) -> &mut LimbModeCoordinator {
        &mut self.coordinator
    }

    #[must_use]
    pub const fn stabilizer(&self) -> &SupportPolygonStabilizer {
        &self.stabilizer
    }

    #[must_use]
    pub const fn planner(&self) -> &SwingFootPlacementPlanner {
        &self.planner
    }
}
