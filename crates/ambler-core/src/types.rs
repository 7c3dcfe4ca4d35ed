//! Leg and torso state shared by every locomotion component.
//!
//! A [`Leg`] carries both the measured quantities delivered by state
//! estimation (foot/hip kinematics, contact) and the outputs the gait core
//! writes back each tick (mode, phases, durations, foot targets). The leg
//! group and torso are owned by the caller and passed to the components by
//! reference; the components themselves never own robot state.

use nalgebra::{UnitQuaternion, Vector3};

/// Number of legs. Leg indices are fore-left = 0, fore-right = 1,
/// hind-left = 2, hind-right = 3.
pub const LEG_COUNT: usize = 4;

/// Discrete leg mode as decided by the limb coordinator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LegMode {
    /// Foot on the ground, carrying load.
    #[default]
    Stance,
    /// Foot in flight toward its next hold.
    Swing,
}

/// Per-leg state: measured inputs plus the gait core's outputs.
#[derive(Clone, Debug)]
pub struct Leg {
    /// Measured foot position, world frame.
    pub foot_position: Vector3<f64>,
    /// Measured hip position, world frame.
    pub hip_position: Vector3<f64>,
    /// Measured hip velocity, world frame.
    pub hip_velocity: Vector3<f64>,
    /// Measured ground contact.
    pub is_grounded: bool,

    /// Current mode, written by the coordinator.
    pub mode: LegMode,
    /// Mode of the previous tick, latched before `mode` is overwritten.
    pub previous_mode: LegMode,
    /// Swing phase in [0, 1], or exactly -1.0 while in stance.
    pub swing_phase: f64,
    /// Stance phase in [0, 1], or exactly -1.0 while in swing.
    pub stance_phase: f64,
    /// Whether the gait schedule wants this foot on the ground.
    pub should_be_grounded: bool,
    /// Commanded stance duration in seconds.
    pub stance_duration: f64,
    /// Commanded swing duration in seconds.
    pub swing_duration: f64,

    /// Horizontal foot offset from the hip recorded at lift-off,
    /// written by the placement planner.
    pub liftoff_offset: Vector3<f64>,
    /// Desired foot position for the current tick, world frame,
    /// written by the placement planner for swinging legs.
    pub desired_foot_position: Vector3<f64>,
}

impl Leg {
    /// Measured contact agrees with the schedule.
    #[must_use]
    pub fn is_and_should_be_grounded(&self) -> bool {
        self.is_grounded && self.should_be_grounded
    }

    #[must_use]
    pub fn is_in_stance_mode(&self) -> bool {
        self.mode == LegMode::Stance
    }

    #[must_use]
    pub fn is_in_swing_mode(&self) -> bool {
        self.mode == LegMode::Swing
    }

    /// Stance began this tick.
    #[must_use]
    pub fn touched_down(&self) -> bool {
        self.previous_mode == LegMode::Swing && self.mode == LegMode::Stance
    }

    /// Swing began this tick.
    #[must_use]
    pub fn lifted_off(&self) -> bool {
        self.previous_mode == LegMode::Stance && self.mode == LegMode::Swing
    }
}

impl Default for Leg {
    fn default() -> Self {
        Self {
            foot_position: Vector3::zeros(),
            hip_position: Vector3::zeros(),
            hip_velocity: Vector3::zeros(),
            is_grounded: false,
            mode: LegMode::Stance,
            previous_mode: LegMode::Stance,
            swing_phase: -1.0,
            stance_phase: 0.0,
            should_be_grounded: true,
            stance_duration: 0.0,
            swing_duration: 0.0,
            liftoff_offset: Vector3::zeros(),
            desired_foot_position: Vector3::zeros(),
        }
    }
}

/// The four legs, indexed by leg id.
pub type LegGroup = [Leg; LEG_COUNT];

/// Torso state: measured pose/twist plus the gait core's outputs.
#[derive(Clone, Debug)]
pub struct TorsoState {
    /// Measured base position, world frame.
    pub position: Vector3<f64>,
    /// Rotation taking world-frame vectors into the base frame.
    pub orientation: UnitQuaternion<f64>,
    /// Measured base linear velocity, world frame.
    pub linear_velocity: Vector3<f64>,

    /// Desired base linear velocity, control frame.
    pub desired_linear_velocity: Vector3<f64>,
    /// Desired heading (sagittal) speed in m/s.
    pub desired_heading_speed: f64,

    /// Global stride phase in [0, 1), written back by the coordinator.
    pub stride_phase: f64,
    /// Desired center-of-mass position, written by the stabilizer.
    pub desired_com_position: Vector3<f64>,
}

impl TorsoState {
    /// Measured sagittal speed: base velocity expressed in the base frame,
    /// heading component.
    #[must_use]
    pub fn sagittal_speed(&self) -> f64 {
        (self.orientation * self.linear_velocity).x
    }
}

impl Default for TorsoState {
    fn default() -> Self {
        Self {
            position: Vector3::zeros(),
            orientation: UnitQuaternion::identity(),
            linear_velocity: Vector3::zeros(),
            desired_linear_velocity: Vector3::zeros(),
            desired_heading_speed: 0.0,
            stride_phase: 0.0,
            desired_com_position: Vector3::zeros(),
        }
    }
}
