//! Limb mode coordination.
//!
//! Owns the gait phase scheduler and writes the per-leg schedule outputs
//! each tick: stance/swing mode, phases, durations and the grounded
//! expectation. Mode switching applies touchdown hysteresis so a foot
//! that lands early in the last tenth of its swing is treated as standing
//! instead of being driven into the ground.

use ambler_core::types::{LegGroup, LegMode, TorsoState, LEG_COUNT};

use crate::scheduler::GaitPhaseScheduler;

/// Per-leg stance/swing mode coordinator for one gait.
#[derive(Clone, Debug)]
pub struct LimbModeCoordinator {
    scheduler: GaitPhaseScheduler,
    is_updating_stride_phase: bool,
}

impl LimbModeCoordinator {
    #[must_use]
    pub fn new(scheduler: GaitPhaseScheduler) -> Self {
        Self {
            scheduler,
            is_updating_stride_phase: true,
        }
    }

    #[must_use]
    pub const fn scheduler(&self) -> &GaitPhaseScheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut GaitPhaseScheduler {
        &mut self.scheduler
    }

    /// Freeze or resume stride phase advancement. Leg fields keep being
    /// written either way.
    pub fn set_updating_stride_phase(&mut self, updating: bool) {
        self.is_updating_stride_phase = updating;
    }

    #[must_use]
    pub const fn is_updating_stride_phase(&self) -> bool {
        self.is_updating_stride_phase
    }

    /// Reset the stride phase and write the schedule into the legs.
    pub fn initialize(&mut self, legs: &mut LegGroup, torso: &mut TorsoState) {
        self.scheduler.set_stride_phase(0.0);
        self.write_schedule(legs, torso);
    }

    /// Advance the stride phase by `dt` seconds and update every leg.
    pub fn advance(&mut self, dt: f64, legs: &mut LegGroup, torso: &mut TorsoState) {
        if self.is_updating_stride_phase {
            self.scheduler.advance(dt);
        }
        self.write_schedule(legs, torso);
    }

    fn write_schedule(&self, legs: &mut LegGroup, torso: &mut TorsoState) {
        for leg_index in 0..LEG_COUNT {
            let leg = &mut legs[leg_index];
            let swing_phase = self.scheduler.swing_phase(leg_index);

            leg.should_be_grounded = self.scheduler.should_be_grounded(leg_index);
            leg.swing_phase = swing_phase;
            leg.stance_phase = self.scheduler.stance_phase(leg_index);
            leg.stance_duration = self.scheduler.stance_duration(leg_index);
            leg.swing_duration = self.scheduler.swing_duration(leg_index);

            leg.previous_mode = leg.mode;
            // Late-swing ground contact counts as stance.
            let in_stance =
                swing_phase < 0.0 || swing_phase > 1.0 || (swing_phase > 0.9 && leg.is_grounded);
            leg.mode = if in_stance {
                LegMode::Stance
            } else {
                LegMode::Swing
            };
        }
        torso.stride_phase = self.scheduler.stride_phase();
    }

    /// Blend this coordinator's timing between `a` and `b` at parameter
    /// `t`. The live stride phase is untouched.
    pub fn set_to_interpolated(&mut self, a: &Self, b: &Self, t: f64) {
        self.scheduler
            .set_to_interpolated(&a.scheduler, &b.scheduler, t);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ambler_core::config::TimingConfig;
    use ambler_core::types::Leg;
    use approx::assert_relative_eq;

    fn walk_coordinator() -> LimbModeCoordinator {
        LimbModeCoordinator::new(GaitPhaseScheduler::new(TimingConfig::default()))
    }

    fn grounded_legs() -> LegGroup {
        std::array::from_fn(|_| Leg {
            is_grounded: true,
            ..Leg::default()
        })
    }

    #[test]
    fn writes_schedule_into_legs() {
        let mut coordinator = walk_coordinator();
        let mut legs = grounded_legs();
        let mut torso = TorsoState::default();
        legs[0].is_grounded = false;

        coordinator.scheduler_mut().set_stride_phase(0.1);
        coordinator.advance(0.0, &mut legs, &mut torso);

        assert_eq!(legs[0].mode, LegMode::Swing);
        assert_relative_eq!(legs[0].swing_phase, 0.5, epsilon = 1e-12);
        assert_relative_eq!(legs[0].stance_phase, -1.0);
        assert!(!legs[0].should_be_grounded);
        assert_relative_eq!(legs[0].stance_duration, 1.6, epsilon = 1e-12);
        assert_relative_eq!(legs[0].swing_duration, 0.4, epsilon = 1e-12);

        assert_eq!(legs[1].mode, LegMode::Stance);
        assert_relative_eq!(legs[1].swing_phase, -1.0);
        assert_relative_eq!(torso.stride_phase, 0.1, epsilon = 1e-12);
    }

    #[test]
    fn early_touchdown_hysteresis() {
        let mut coordinator = walk_coordinator();
        let mut legs = grounded_legs();
        let mut torso = TorsoState::default();

        // Leg 0 at swing phase 0.95.
        coordinator.scheduler_mut().set_stride_phase(0.19);
        legs[0].is_grounded = true;
        coordinator.advance(0.0, &mut legs, &mut torso);
        assert_eq!(legs[0].mode, LegMode::Stance);
        // The schedule itself still says swing.
        assert!(!legs[0].should_be_grounded);
        assert_relative_eq!(legs[0].swing_phase, 0.95, epsilon = 1e-9);

        // Without contact the leg keeps swinging.
        legs[0].is_grounded = false;
        coordinator.advance(0.0, &mut legs, &mut torso);
        assert_eq!(legs[0].mode, LegMode::Swing);
    }

    #[test]
    fn no_hysteresis_in_early_swing() {
        let mut coordinator = walk_coordinator();
        let mut legs = grounded_legs();
        let mut torso = TorsoState::default();

        // Leg 0 at swing phase 0.5, still touching (late lift-off).
        coordinator.scheduler_mut().set_stride_phase(0.1);
        coordinator.advance(0.0, &mut legs, &mut torso);
        assert_eq!(legs[0].mode, LegMode::Swing);
    }

    #[test]
    fn mode_edges_are_observable() {
        let mut coordinator = walk_coordinator();
        let mut legs = grounded_legs();
        let mut torso = TorsoState::default();
        legs[0].is_grounded = false;

        coordinator.scheduler_mut().set_stride_phase(0.19);
        coordinator.advance(0.0, &mut legs, &mut torso);
        assert_eq!(legs[0].mode, LegMode::Swing);

        // Crossing the touchdown boundary at stride phase 0.2.
        coordinator.advance(0.04, &mut legs, &mut torso);
        assert_eq!(legs[0].mode, LegMode::Stance);
        assert!(legs[0].touched_down());
        assert!(!legs[0].lifted_off());
    }

    #[test]
    fn frozen_stride_phase_still_writes_legs() {
        let mut coordinator = walk_coordinator();
        let mut legs = grounded_legs();
        let mut torso = TorsoState::default();

        coordinator.scheduler_mut().set_stride_phase(0.3);
        coordinator.set_updating_stride_phase(false);
        coordinator.advance(1.0, &mut legs, &mut torso);
        assert_relative_eq!(torso.stride_phase, 0.3, epsilon = 1e-12);
        assert_eq!(legs[3].mode, LegMode::Swing);
    }

    #[test]
    fn initialize_resets_phase() {
        let mut coordinator = walk_coordinator();
        let mut legs = grounded_legs();
        let mut torso = TorsoState::default();

        coordinator.scheduler_mut().set_stride_phase(0.6);
        coordinator.initialize(&mut legs, &mut torso);
        assert_relative_eq!(torso.stride_phase, 0.0);
        // Leg 0 is at swing onset at stride phase 0.
        assert_eq!(legs[0].mode, LegMode::Swing);
    }
}
