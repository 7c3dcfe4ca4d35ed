//! Bevy ECS plugin for the gait pipeline.
//!
//! Provides [`AmblerGaitPlugin`] which ticks the full pipeline each
//! frame: limb coordination, CoM stabilization, swing-foot placement and
//! gait transitions.
//!
//! State estimation writes into [`GaitPipeline::legs`] and
//! [`GaitPipeline::torso`] before the system runs; whole-body control
//! reads the desired foot and CoM targets afterwards.

use bevy::prelude::*;

use ambler_core::terrain::FlatTerrain;
use ambler_core::types::{Leg, LegGroup, TorsoState};

use crate::switcher::GaitTransitionSwitcher;

/// Bevy plugin for static-gait locomotion control.
///
/// Add this plugin to your app, then insert a [`GaitPipeline`] resource
/// built from a gait library.
pub struct AmblerGaitPlugin;

impl Plugin for AmblerGaitPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, gait_pipeline_system);
    }
}

/// The gait switcher plus the robot state it runs against.
#[derive(Resource)]
pub struct GaitPipeline {
    /// Gait library and active controller.
    pub switcher: GaitTransitionSwitcher,
    /// Per-leg state, written by estimation and the pipeline.
    pub legs: LegGroup,
    /// Torso state, written by estimation and the pipeline.
    pub torso: TorsoState,
    /// Ground plane height fed to the placement planner.
    pub ground_height: f64,
    /// Control tick in seconds.
    pub dt: f64,
    /// When set, the pipeline holds its outputs.
    pub paused: bool,
}

impl GaitPipeline {
    #[must_use]
    pub fn new(switcher: GaitTransitionSwitcher, dt: f64) -> Self {
        Self {
            switcher,
            legs: std::array::from_fn(|_| Leg::default()),
            torso: TorsoState::default(),
            ground_height: 0.0,
            dt,
            paused: false,
        }
    }

    /// Reset the active controller against the current robot state.
    pub fn initialize(&mut self) {
        let Self {
            switcher,
            legs,
            torso,
            ..
        } = self;
        switcher.initialize(legs, torso);
    }

    /// Run one control tick.
    pub fn tick(&mut self) {
        if self.paused {
            return;
        }
        let terrain = FlatTerrain {
            height: self.ground_height,
        };
        let Self {
            switcher,
            legs,
            torso,
            dt,
            ..
        } = self;
        switcher.advance(*dt, legs, torso, Some(&terrain));
    }
}

#[allow(clippy::needless_pass_by_value)]
fn gait_pipeline_system(pipeline: Option<ResMut<GaitPipeline>>) {
    let Some(mut pipeline) = pipeline else {
        return;
    };
    pipeline.tick();
}
