//! Gait transitions.
//!
//! The switcher owns one controller per library gait plus a separate
//! active instance. A requested transition first arms, then fires when
//! the stride phase crosses the transition's phase trigger, then blends
//! the active controller's parameters between the two endpoint instances
//! over the configured interval. Live state (stride phase, filters,
//! anchors) is never interpolated, so the robot keeps walking through the
//! blend. A transition cannot be preempted; requests made while one is in
//! flight are rejected.

use std::collections::HashMap;

use ambler_core::config::{GaitLibraryConfig, TransitionConfig};
use ambler_core::error::{ConfigError, SwitchError};
use ambler_core::terrain::TerrainModel;
use ambler_core::types::{LegGroup, TorsoState};

use crate::controller::GaitController;

/// Where the switcher is in a transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionState {
    /// No transition requested.
    Idle,
    /// Waiting for the stride phase to reach the trigger.
    Armed,
    /// Blending between the two endpoint gaits.
    Interpolating,
}

/// Library-driven gait switcher.
pub struct GaitTransitionSwitcher {
    library: GaitLibraryConfig,
    endpoints: HashMap<String, GaitController>,
    active: GaitController,
    state: TransitionState,
    pending: Option<TransitionConfig>,
    elapsed: f64,
}

impl GaitTransitionSwitcher {
    /// Build the switcher and one endpoint controller per library gait.
    ///
    /// Every endpoint is constructed up front rather than on first use,
    /// so arming and interpolating transitions never fail at runtime.
    pub fn new(library: GaitLibraryConfig) -> Result<Self, ConfigError> {
        library.validate()?;
        let mut endpoints = HashMap::new();
        for (name, gait) in &library.gaits {
            endpoints.insert(name.clone(), GaitController::from_config(name, gait)?);
        }
        let active =
            GaitController::from_config(&library.initial_gait, library.gait(&library.initial_gait)?)?;
        Ok(Self {
            library,
            endpoints,
            active,
            state: TransitionState::Idle,
            pending: None,
            elapsed: 0.0,
        })
    }

    /// Load a gait library from a TOML file and build the switcher.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        Self::new(GaitLibraryConfig::from_file(path)?)
    }

    /// Reset the active controller and drop any transition in flight.
    pub fn initialize(&mut self, legs: &mut LegGroup, torso: &mut TorsoState) {
        self.state = TransitionState::Idle;
        self.pending = None;
        self.elapsed = 0.0;
        self.active.initialize(legs, torso);
    }

    /// Request a transition to `gait`.
    ///
    /// Fails if a transition is already in flight, the gait is unknown,
    /// or the library has no entry from the active gait to `gait`.
    pub fn transit_to(&mut self, gait: &str) -> Result<(), SwitchError> {
        if self.state != TransitionState::Idle {
            return Err(SwitchError::AlreadyTransiting);
        }
        if !self.library.gaits.contains_key(gait) {
            return Err(SwitchError::UnknownGait(gait.to_owned()));
        }
        let transition = self
            .library
            .transitions
            .iter()
            .find(|transition| transition.start == self.active.name() && transition.end == gait)
            .ok_or_else(|| SwitchError::TransitionNotFound {
                from: self.active.name().to_owned(),
                to: gait.to_owned(),
            })?;
        self.pending = Some(transition.clone());
        self.state = TransitionState::Armed;
        self.elapsed = 0.0;
        Ok(())
    }

    /// Run one control tick: transition machinery first, then the active
    /// controller.
    pub fn advance(
        &mut self,
        dt: f64,
        legs: &mut LegGroup,
        torso: &mut TorsoState,
        terrain: Option<&dyn TerrainModel>,
    ) {
        self.update_transition(dt, torso);
        self.active.advance(dt, legs, torso, terrain);
    }

    #[must_use]
    pub fn active_gait(&self) -> &str {
        self.active.name()
    }

    #[must_use]
    pub const fn transition_state(&self) -> TransitionState {
        self.state
    }

    #[must_use]
    pub const fn active_controller(&self) -> &GaitController {
        &self.active
    }

    pub fn active_controller_mut(&mut self) -> &mut GaitController {
        &mut self.active
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn update_transition(&mut self, dt: f64, torso: &TorsoState) {
        if self.state == TransitionState::Idle && self.library.auto_transitions {
            self.arm_on_speed(torso.sagittal_speed());
        }

        if self.state == TransitionState::Armed {
            if let Some(transition) = &self.pending {
                let trigger = transition.phase_trigger;
                let fired = if (0.0..=1.0).contains(&trigger) {
                    let stride_phase = self.active.coordinator().scheduler().stride_phase();
                    let window = dt / self.active.coordinator().scheduler().stride_duration();
                    (stride_phase - trigger).abs() < window
                } else {
                    true
                };
                if fired {
                    self.state = TransitionState::Interpolating;
                    self.elapsed = 0.0;
                }
            }
        }

        if self.state == TransitionState::Interpolating {
            if let Some(transition) = self.pending.clone() {
                self.elapsed += dt;
                let t = if transition.time_interval > 0.0 {
                    (self.elapsed / transition.time_interval).clamp(0.0, 1.0)
                } else {
                    1.0
                };
                if let (Some(start), Some(end)) = (
                    self.endpoints.get(&transition.start),
                    self.endpoints.get(&transition.end),
                ) {
                    self.active.set_to_interpolated(start, end, t);
                    // Commit takes the end gait's discrete parameters
                    // (swing order, anchor mode, curve grids) that the
                    // blend leaves alone.
                    if t >= 1.0 {
                        self.active.adopt_parameters(end);
                    }
                }
                if t >= 1.0 {
                    self.active.set_name(&transition.end);
                    self.pending = None;
                    self.state = TransitionState::Idle;
                }
            }
        }
    }

    /// Arm the first applicable speed-triggered transition out of the
    /// active gait. Negative triggers are disabled.
    fn arm_on_speed(&mut self, speed: f64) {
        let mut armed = None;
        for transition in &self.library.transitions {
            if transition.start != self.active.name() {
                continue;
            }
            let below = transition.smaller_speed_trigger >= 0.0
                && speed < transition.smaller_speed_trigger;
            let above =
                transition.larger_speed_trigger >= 0.0 && speed > transition.larger_speed_trigger;
            if below || above {
                armed = Some(transition.clone());
                break;
            }
        }
        if let Some(transition) = armed {
            self.pending = Some(transition);
            self.state = TransitionState::Armed;
            self.elapsed = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ambler_core::config::{GaitConfig, TimingConfig};
    use ambler_core::types::Leg;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    fn library(auto_transitions: bool) -> GaitLibraryConfig {
        let walk = GaitConfig::default();
        let amble = GaitConfig {
            timing: TimingConfig {
                fore_cycle_duration: 1.0,
                hind_cycle_duration: 1.0,
                duty_factors: [0.7; 4],
                ..TimingConfig::default()
            },
            ..GaitConfig::default()
        };
        GaitLibraryConfig {
            initial_gait: "walk".into(),
            auto_transitions,
            gaits: [("walk".to_owned(), walk), ("amble".to_owned(), amble)]
                .into_iter()
                .collect(),
            transitions: vec![
                TransitionConfig {
                    start: "walk".into(),
                    end: "amble".into(),
                    smaller_speed_trigger: -1.0,
                    larger_speed_trigger: 0.5,
                    phase_trigger: -1.0,
                    time_interval: 1.0,
                },
                TransitionConfig {
                    start: "amble".into(),
                    end: "walk".into(),
                    smaller_speed_trigger: 0.2,
                    larger_speed_trigger: -1.0,
                    phase_trigger: 0.5,
                    time_interval: 0.0,
                },
            ],
        }
    }

    fn home_legs() -> LegGroup {
        let feet = [
            Vector3::new(0.5, 0.3, 0.0),
            Vector3::new(0.5, -0.3, 0.0),
            Vector3::new(-0.5, 0.3, 0.0),
            Vector3::new(-0.5, -0.3, 0.0),
        ];
        std::array::from_fn(|i| Leg {
            foot_position: feet[i],
            hip_position: feet[i] + Vector3::new(0.0, 0.0, 0.42),
            is_grounded: true,
            ..Leg::default()
        })
    }

    fn switcher(auto_transitions: bool) -> (GaitTransitionSwitcher, LegGroup, TorsoState) {
        let mut switcher = GaitTransitionSwitcher::new(library(auto_transitions)).unwrap();
        let mut legs = home_legs();
        let mut torso = TorsoState::default();
        switcher.initialize(&mut legs, &mut torso);
        (switcher, legs, torso)
    }

    #[test]
    fn starts_in_the_initial_gait() {
        let (switcher, _, _) = switcher(false);
        assert_eq!(switcher.active_gait(), "walk");
        assert_eq!(switcher.transition_state(), TransitionState::Idle);
    }

    #[test]
    fn rejects_unknown_and_unlisted_transitions() {
        let (mut switcher, _, _) = switcher(false);
        assert_eq!(
            switcher.transit_to("gallop").unwrap_err(),
            SwitchError::UnknownGait("gallop".into())
        );
        // "amble" to "walk" exists, "walk" to "walk" does not.
        assert!(matches!(
            switcher.transit_to("walk").unwrap_err(),
            SwitchError::TransitionNotFound { .. }
        ));
    }

    #[test]
    fn rejects_request_while_transiting() {
        let (mut switcher, _, _) = switcher(false);
        switcher.transit_to("amble").unwrap();
        assert_eq!(
            switcher.transit_to("amble").unwrap_err(),
            SwitchError::AlreadyTransiting
        );
    }

    #[test]
    fn interpolates_over_the_configured_interval() {
        let (mut switcher, mut legs, mut torso) = switcher(false);
        switcher.transit_to("amble").unwrap();
        assert_eq!(switcher.transition_state(), TransitionState::Armed);

        // Out-of-range phase trigger fires on the first tick.
        for _ in 0..50 {
            switcher.advance(0.01, &mut legs, &mut torso, None);
        }
        assert_eq!(switcher.transition_state(), TransitionState::Interpolating);
        assert_eq!(switcher.active_gait(), "walk");
        // Halfway through the blend, stride duration is halfway too.
        assert_relative_eq!(
            switcher
                .active_controller()
                .coordinator()
                .scheduler()
                .stride_duration(),
            1.5,
            epsilon = 1e-9
        );

        for _ in 0..50 {
            switcher.advance(0.01, &mut legs, &mut torso, None);
        }
        assert_eq!(switcher.transition_state(), TransitionState::Idle);
        assert_eq!(switcher.active_gait(), "amble");
        assert_relative_eq!(
            switcher
                .active_controller()
                .coordinator()
                .scheduler()
                .stride_duration(),
            1.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn commit_adopts_the_end_gaits_swing_order() {
        let mut library = library(false);
        library.transitions[0].time_interval = 0.0;
        library.gaits.get_mut("amble").unwrap().stabilizer.swing_order = [0, 1, 3, 2];
        let mut switcher = GaitTransitionSwitcher::new(library).unwrap();
        let mut legs = home_legs();
        let mut torso = TorsoState::default();
        switcher.initialize(&mut legs, &mut torso);

        switcher.transit_to("amble").unwrap();
        switcher.advance(0.0, &mut legs, &mut torso, None);
        assert_eq!(switcher.transition_state(), TransitionState::Idle);
        assert_eq!(switcher.active_gait(), "amble");

        // Leg 0 swings at stride phase 0; under the adopted order leg 1
        // follows it, not leg 3.
        assert_eq!(
            switcher.active_controller().stabilizer().next_swing_leg(),
            1
        );
    }

    #[test]
    fn phase_trigger_waits_for_the_window() {
        let (mut switcher, mut legs, mut torso) = switcher(false);
        // Move to "amble" first so the phase-triggered entry applies.
        switcher.transit_to("amble").unwrap();
        for _ in 0..110 {
            switcher.advance(0.01, &mut legs, &mut torso, None);
        }
        assert_eq!(switcher.active_gait(), "amble");

        switcher.transit_to("walk").unwrap();
        switcher
            .active_controller_mut()
            .coordinator_mut()
            .scheduler_mut()
            .set_stride_phase(0.2);
        switcher.advance(0.01, &mut legs, &mut torso, None);
        // Far from the trigger phase of 0.5.
        assert_eq!(switcher.transition_state(), TransitionState::Armed);

        switcher
            .active_controller_mut()
            .coordinator_mut()
            .scheduler_mut()
            .set_stride_phase(0.499);
        switcher.advance(0.01, &mut legs, &mut torso, None);
        // Instantaneous interval: fired and committed in one tick.
        assert_eq!(switcher.transition_state(), TransitionState::Idle);
        assert_eq!(switcher.active_gait(), "walk");
    }

    #[test]
    fn auto_arming_on_speed_trigger() {
        let (mut switcher, mut legs, mut torso) = switcher(true);
        torso.linear_velocity = Vector3::new(0.6, 0.0, 0.0);

        for _ in 0..110 {
            switcher.advance(0.01, &mut legs, &mut torso, None);
        }
        assert_eq!(switcher.active_gait(), "amble");
    }

    #[test]
    fn no_auto_arming_when_disabled() {
        let (mut switcher, mut legs, mut torso) = switcher(false);
        torso.linear_velocity = Vector3::new(0.6, 0.0, 0.0);

        for _ in 0..20 {
            switcher.advance(0.01, &mut legs, &mut torso, None);
        }
        assert_eq!(switcher.active_gait(), "walk");
        assert_eq!(switcher.transition_state(), TransitionState::Idle);
    }
}
