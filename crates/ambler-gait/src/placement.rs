//! Swing-foot placement.
//!
//! Each swing foot is steered toward a predicted hold composed of three
//! world-frame offsets from the hip: a static per-leg stepping offset, a
//! feedforward step proportional to the desired heading speed and the
//! stance duration, and an inverted-pendulum feedback term that steps
//! into the velocity error scaled by the capture-point time
//! `sqrt(h / g)`. The foot travels from its lift-off anchor to the hold
//! through independent sagittal and coronal easings evaluated in the
//! base frame, with a parameterized height profile over the terrain.

use ambler_core::config::{AnchorMode, PlacementConfig};
use ambler_core::curve::{map_to_unit_range, PiecewiseLinear};
use ambler_core::error::ConfigError;
use ambler_core::terrain::TerrainModel;
use ambler_core::types::{Leg, LegGroup, TorsoState, LEG_COUNT};
use nalgebra::Vector3;

/// Inverted-pendulum swing-foot planner.
#[derive(Clone, Debug)]
pub struct SwingFootPlacementPlanner {
    config: PlacementConfig,
    sagittal_blend: PiecewiseLinear,
    height_profile: PiecewiseLinear,
    /// Last known ground height under each leg, world frame. Used when no
    /// terrain model is available.
    estimated_ground_height: [f64; LEG_COUNT],
}

impl SwingFootPlacementPlanner {
    pub fn new(config: PlacementConfig) -> Result<Self, ConfigError> {
        let sagittal_blend = PiecewiseLinear::new(config.sagittal_blend.clone())?;
        let height_profile = PiecewiseLinear::new(config.height_profile.clone())?;
        Ok(Self {
            config,
            sagittal_blend,
            height_profile,
            estimated_ground_height: [0.0; LEG_COUNT],
        })
    }

    /// Reset per-leg estimates and anchors.
    pub fn initialize(&mut self, legs: &mut LegGroup) {
        self.estimated_ground_height = [0.0; LEG_COUNT];
        for leg in legs.iter_mut() {
            leg.liftoff_offset = Vector3::zeros();
        }
    }

    /// Override the stored ground height under `leg`.
    pub fn set_ground_height(&mut self, leg: usize, height: f64) {
        self.estimated_ground_height[leg] = height;
    }

    /// Latch lift-off anchors and write desired positions for swing feet.
    pub fn advance(
        &mut self,
        dt: f64,
        legs: &mut LegGroup,
        torso: &TorsoState,
        terrain: Option<&dyn TerrainModel>,
    ) {
        for leg_index in 0..LEG_COUNT {
            let latch = match self.config.anchor_mode {
                AnchorMode::LatchAtSwingOnset => legs[leg_index].lifted_off(),
                AnchorMode::RelatchEveryTick => legs[leg_index].is_in_swing_mode(),
            };
            if latch {
                let leg = &mut legs[leg_index];
                let mut offset = leg.foot_position - leg.hip_position;
                offset.z = 0.0;
                leg.liftoff_offset = offset;
            }

            if legs[leg_index].is_in_swing_mode() {
                let leg = legs[leg_index].clone();
                let target = self.foot_position_for_swing_leg(leg_index, &leg, torso, dt, terrain);
                legs[leg_index].desired_foot_position = target;
            }
        }
    }

    /// Desired world position of a swinging foot for the coming tick.
    pub fn foot_position_for_swing_leg(
        &mut self,
        leg_index: usize,
        leg: &Leg,
        torso: &TorsoState,
        dt: f64,
        terrain: Option<&dyn TerrainModel>,
    ) -> Vector3<f64> {
        let hold_offset = self.hold_offset(leg_index, leg, torso, terrain);
        let reference_velocity = (leg.hip_velocity + torso.linear_velocity) / 2.0;

        let phase = (leg.swing_phase + dt).min(1.0);
        let blended = self.blend_step_offset(phase, &leg.liftoff_offset, &hold_offset, torso);

        let mut foot = leg.hip_position + reference_velocity * dt + blended;
        foot.z = self.foot_height_over_terrain(leg_index, &foot, terrain)
            + self.height_profile.evaluate(phase);
        foot
    }

    /// Predicted hold for the leg's next step, on the ground.
    pub fn predicted_hold(
        &mut self,
        leg_index: usize,
        legs: &LegGroup,
        torso: &TorsoState,
        terrain: Option<&dyn TerrainModel>,
    ) -> Vector3<f64> {
        let leg = &legs[leg_index];
        let mut hold = leg.hip_position + self.hold_offset(leg_index, leg, torso, terrain);
        hold.z = self.foot_height_over_terrain(leg_index, &hold, terrain);
        hold
    }

    /// Blend placement parameters between `a` and `b` at `t`. Ground
    /// height estimates keep their live state.
    pub fn set_to_interpolated(&mut self, a: &Self, b: &Self, t: f64) {
        let lerp = |x: f64, y: f64| x + (y - x) * t;
        self.config.feedback_scale = lerp(a.config.feedback_scale, b.config.feedback_scale);
        self.config.gravity = lerp(a.config.gravity, b.config.gravity);
        for leg in 0..LEG_COUNT {
            for axis in 0..3 {
                self.config.stepping_offsets[leg][axis] = lerp(
                    a.config.stepping_offsets[leg][axis],
                    b.config.stepping_offsets[leg][axis],
                );
            }
        }
        self.sagittal_blend
            .set_to_interpolated(&a.sagittal_blend, &b.sagittal_blend, t);
        self.height_profile
            .set_to_interpolated(&a.height_profile, &b.height_profile, t);
    }

    /// Take over `other`'s configuration and curves wholesale, keeping
    /// the per-leg ground-height estimates.
    pub fn adopt_parameters(&mut self, other: &Self) {
        self.config = other.config.clone();
        self.sagittal_blend = other.sagittal_blend.clone();
        self.height_profile = other.height_profile.clone();
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// The horizontal world-frame offset from hip to predicted hold.
    fn hold_offset(
        &mut self,
        leg_index: usize,
        leg: &Leg,
        torso: &TorsoState,
        terrain: Option<&dyn TerrainModel>,
    ) -> Vector3<f64> {
        let orientation = &torso.orientation;
        let static_offset = Vector3::from(self.config.stepping_offsets[leg_index]);

        // Inverted pendulum: step into the velocity error.
        let reference_velocity = (leg.hip_velocity + torso.linear_velocity) / 2.0;
        let ground = self.foot_height_over_terrain(leg_index, &leg.hip_position, terrain);
        let pendulum_height = (leg.hip_position.z - ground).max(0.0);
        let desired_velocity_base = Vector3::new(torso.desired_heading_speed, 0.0, 0.0);
        let velocity_error =
            reference_velocity - orientation.inverse_transform_vector(&desired_velocity_base);
        let pendulum_offset = velocity_error * (pendulum_height / self.config.gravity).sqrt();

        // Feedforward: half the net displacement per stride, as the step
        // is measured from the hip.
        let step_length = torso.desired_heading_speed * leg.stance_duration / 2.0;
        let feedforward_offset =
            orientation.inverse_transform_vector(&Vector3::new(step_length, 0.0, 0.0));

        let mut offset =
            static_offset + feedforward_offset + pendulum_offset * self.config.feedback_scale;
        offset.z = 0.0;
        offset
    }

    /// Ease from the lift-off anchor toward the hold, sagittal and
    /// coronal components independently in the base frame.
    fn blend_step_offset(
        &self,
        phase: f64,
        anchor_world: &Vector3<f64>,
        hold_world: &Vector3<f64>,
        torso: &TorsoState,
    ) -> Vector3<f64> {
        let orientation = &torso.orientation;
        let hold = orientation * hold_world;
        let anchor = orientation * anchor_world;

        let sagittal = self.sagittal_blend.evaluate(phase);
        // The coronal component holds back early in the swing.
        let coronal = map_to_unit_range(phase - 0.3, 0.0, 0.5);

        let blended = Vector3::new(
            hold.x * sagittal + anchor.x * (1.0 - sagittal),
            hold.y * coronal + anchor.y * (1.0 - coronal),
            0.0,
        );
        orientation.inverse_transform_vector(&blended)
    }

    fn foot_height_over_terrain(
        &mut self,
        leg_index: usize,
        position: &Vector3<f64>,
        terrain: Option<&dyn TerrainModel>,
    ) -> f64 {
        match terrain {
            Some(terrain) => {
                let height = terrain.height_at(position);
                self.estimated_ground_height[leg_index] = height;
                height
            }
            None => self.estimated_ground_height[leg_index],
        }
    }
}
