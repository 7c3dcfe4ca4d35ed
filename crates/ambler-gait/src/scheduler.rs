//! Gait phase scheduler.
//!
//! Turns a single global stride phase into per-leg stance/swing phases.
//! Each leg's cycle is placed by its lag and split by its duty factor:
//! the leg is in stance while its local phase is below the duty factor
//! and in swing for the remainder. Fore and hind pairs may run on
//! different cycle durations; the fore cycle duration doubles as the
//! global stride duration.

use ambler_core::config::TimingConfig;
use ambler_core::types::LEG_COUNT;

/// Wrap a phase into [0, 1).
fn wrap01(phase: f64) -> f64 {
    phase - phase.floor()
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Phase scheduler for one gait.
#[derive(Clone, Debug)]
pub struct GaitPhaseScheduler {
    timing: TimingConfig,
    stride_phase: f64,
    cycle_count: u64,
}

impl GaitPhaseScheduler {
    #[must_use]
    pub fn new(timing: TimingConfig) -> Self {
        Self {
            timing,
            stride_phase: 0.0,
            cycle_count: 0,
        }
    }

    /// Advance the stride phase by `dt` seconds.
    pub fn advance(&mut self, dt: f64) {
        let next = self.stride_phase + dt / self.timing.fore_cycle_duration;
        self.cycle_count += next as u64;
        self.stride_phase = wrap01(next);
    }

    /// Global stride phase in [0, 1).
    #[must_use]
    pub const fn stride_phase(&self) -> f64 {
        self.stride_phase
    }

    /// Completed stride cycles since construction or the last reset.
    #[must_use]
    pub const fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    /// Set the stride phase directly, wrapping into [0, 1).
    pub fn set_stride_phase(&mut self, phase: f64) {
        self.stride_phase = wrap01(phase);
    }

    /// Stride duration in seconds.
    #[must_use]
    pub const fn stride_duration(&self) -> f64 {
        self.timing.fore_cycle_duration
    }

    #[must_use]
    pub const fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    /// Replace the timing wholesale, keeping the live stride phase.
    pub fn set_timing(&mut self, timing: TimingConfig) {
        self.timing = timing;
    }

    /// Cycle duration of `leg` in seconds. Legs 0 and 1 are the fore pair.
    #[must_use]
    pub const fn cycle_duration(&self, leg: usize) -> f64 {
        if leg < 2 {
            self.timing.fore_cycle_duration
        } else {
            self.timing.hind_cycle_duration
        }
    }

    /// The leg's local cycle phase at stride phase `stride_phase`.
    fn local_phase_at(&self, leg: usize, stride_phase: f64) -> f64 {
        wrap01(stride_phase - self.timing.lags[leg])
    }

    /// Swing phase of `leg` at stride phase `stride_phase`: in [0, 1)
    /// during swing, exactly -1.0 during stance.
    #[must_use]
    pub fn swing_phase_at(&self, leg: usize, stride_phase: f64) -> f64 {
        let local = self.local_phase_at(leg, stride_phase);
        let duty = self.timing.duty_factors[leg];
        if local < duty {
            -1.0
        } else {
            (local - duty) / (1.0 - duty)
        }
    }

    /// Swing phase of `leg` at the current stride phase.
    #[must_use]
    pub fn swing_phase(&self, leg: usize) -> f64 {
        self.swing_phase_at(leg, self.stride_phase)
    }

    /// Stance phase of `leg` at stride phase `stride_phase`: in [0, 1)
    /// during stance, exactly -1.0 during swing.
    #[must_use]
    pub fn stance_phase_at(&self, leg: usize, stride_phase: f64) -> f64 {
        let local = self.local_phase_at(leg, stride_phase);
        let duty = self.timing.duty_factors[leg];
        if local < duty {
            local / duty
        } else {
            -1.0
        }
    }

    /// Stance phase of `leg` at the current stride phase.
    #[must_use]
    pub fn stance_phase(&self, leg: usize) -> f64 {
        self.stance_phase_at(leg, self.stride_phase)
    }

    /// Whether the schedule wants `leg` on the ground right now.
    #[must_use]
    pub fn should_be_grounded(&self, leg: usize) -> bool {
        self.swing_phase(leg) < 0.0
    }

    /// Number of legs the schedule wants on the ground right now.
    #[must_use]
    pub fn stance_leg_count(&self) -> usize {
        (0..LEG_COUNT).filter(|&leg| self.should_be_grounded(leg)).count()
    }

    /// Commanded stance duration of `leg` in seconds.
    #[must_use]
    pub fn stance_duration(&self, leg: usize) -> f64 {
        self.timing.duty_factors[leg] * self.cycle_duration(leg)
    }

    /// Commanded swing duration of `leg` in seconds.
    #[must_use]
    pub fn swing_duration(&self, leg: usize) -> f64 {
        (1.0 - self.timing.duty_factors[leg]) * self.cycle_duration(leg)
    }

    /// Seconds of stance remaining for `leg`; 0 while swinging.
    #[must_use]
    pub fn time_left_in_stance(&self, leg: usize) -> f64 {
        let local = self.local_phase_at(leg, self.stride_phase);
        let duty = self.timing.duty_factors[leg];
        if local < duty {
            (duty - local) * self.cycle_duration(leg)
        } else {
            0.0
        }
    }

    /// Seconds of swing remaining for `leg`; 0 while standing.
    #[must_use]
    pub fn time_left_in_swing(&self, leg: usize) -> f64 {
        let local = self.local_phase_at(leg, self.stride_phase);
        let duty = self.timing.duty_factors[leg];
        if local < duty {
            0.0
        } else {
            (1.0 - local) * self.cycle_duration(leg)
        }
    }

    /// Seconds until `leg` next touches down. The next stance onset is at
    /// the wrap of the leg's local cycle, whether the leg is currently
    /// standing or swinging.
    #[must_use]
    pub fn time_until_next_stance(&self, leg: usize) -> f64 {
        let local = self.local_phase_at(leg, self.stride_phase);
        (1.0 - local) * self.cycle_duration(leg)
    }

    /// Seconds until `leg` next lifts off.
    #[must_use]
    pub fn time_until_next_swing(&self, leg: usize) -> f64 {
        let local = self.local_phase_at(leg, self.stride_phase);
        let duty = self.timing.duty_factors[leg];
        let delta = if local < duty {
            duty - local
        } else {
            1.0 - local + duty
        };
        delta * self.cycle_duration(leg)
    }

    /// Replace this scheduler's timing with the blend of `a` and `b` at
    /// parameter `t`. The live stride phase is untouched.
    pub fn set_to_interpolated(&mut self, a: &Self, b: &Self, t: f64) {
        self.timing.fore_cycle_duration = lerp(
            a.timing.fore_cycle_duration,
            b.timing.fore_cycle_duration,
            t,
        );
        self.timing.hind_cycle_duration = lerp(
            a.timing.hind_cycle_duration,
            b.timing.hind_cycle_duration,
            t,
        );
        for leg in 0..LEG_COUNT {
            self.timing.duty_factors[leg] =
                lerp(a.timing.duty_factors[leg], b.timing.duty_factors[leg], t);
            self.timing.lags[leg] = lerp(a.timing.lags[leg], b.timing.lags[leg], t);
        }
    }
}
