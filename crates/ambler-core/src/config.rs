//! Gait library configuration.
//!
//! A gait library is loaded once from TOML and fully validated before any
//! component touches it: every duration strictly positive, duty factors in
//! (0, 1), the swing order a permutation, transitions referencing known
//! gaits. The control loop divides by these values without re-checking.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::curve::PiecewiseLinear;
use crate::error::ConfigError;
use crate::types::LEG_COUNT;

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_swing_order() -> [usize; 4] {
    [0, 3, 1, 2]
}
const fn default_margin() -> f64 {
    0.05
}
const fn default_filter_time_constant() -> f64 {
    0.01
}
const fn default_feedback_scale() -> f64 {
    1.2
}
const fn default_gravity() -> f64 {
    9.81
}
const fn default_stepping_offsets() -> [[f64; 3]; 4] {
    [[0.0; 3]; 4]
}
fn default_sagittal_blend() -> Vec<[f64; 2]> {
    vec![[0.0, 0.0], [0.6, 1.0]]
}
fn default_height_profile() -> Vec<[f64; 2]> {
    vec![[0.0, 0.0], [0.65, 0.09], [1.0, 0.0]]
}
const fn default_speed_trigger() -> f64 {
    -1.0
}
const fn default_phase_trigger() -> f64 {
    -1.0
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.into(),
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// TimingConfig
// ---------------------------------------------------------------------------

/// Per-gait phase timing: the APS (advanced phase stepping) model.
///
/// Each leg's swing window is placed by its lag and sized by its duty
/// factor; fore and hind pairs may run on different cycle durations. The
/// fore cycle duration doubles as the global stride duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Cycle duration of the fore legs in seconds; also the stride duration.
    pub fore_cycle_duration: f64,
    /// Cycle duration of the hind legs in seconds.
    pub hind_cycle_duration: f64,
    /// Fraction of the cycle each leg spends in stance, in (0, 1).
    pub duty_factors: [f64; LEG_COUNT],
    /// Phase offset of each leg's cycle in [0, 1).
    pub lags: [f64; LEG_COUNT],
}

impl Default for TimingConfig {
    /// A conservative static walk with swing order [0, 3, 1, 2].
    fn default() -> Self {
        Self {
            fore_cycle_duration: 2.0,
            hind_cycle_duration: 2.0,
            duty_factors: [0.8; LEG_COUNT],
            lags: [0.2, 0.7, 0.95, 0.45],
        }
    }
}

impl TimingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fore_cycle_duration > 0.0) {
            return Err(invalid("timing.fore_cycle_duration", "must be > 0"));
        }
        if !(self.hind_cycle_duration > 0.0) {
            return Err(invalid("timing.hind_cycle_duration", "must be > 0"));
        }
        for (i, &duty) in self.duty_factors.iter().enumerate() {
            if !(duty > 0.0 && duty < 1.0) {
                return Err(invalid(
                    &format!("timing.duty_factors[{i}]"),
                    "must be in (0, 1)",
                ));
            }
        }
        for (i, &lag) in self.lags.iter().enumerate() {
            if !(0.0..1.0).contains(&lag) {
                return Err(invalid(&format!("timing.lags[{i}]"), "must be in [0, 1)"));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// StabilizerConfig
// ---------------------------------------------------------------------------

/// Support-polygon stabilizer parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilizerConfig {
    /// Circular swing order over the four legs.
    #[serde(default = "default_swing_order")]
    pub swing_order: [usize; 4],
    /// Safe-triangle inset distance in meters, strictly positive.
    #[serde(default = "default_margin")]
    pub margin: f64,
    /// Time constant of the CoM target low-pass filters in seconds.
    #[serde(default = "default_filter_time_constant")]
    pub filter_time_constant: f64,
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            swing_order: default_swing_order(),
            margin: default_margin(),
            filter_time_constant: default_filter_time_constant(),
        }
    }
}

impl StabilizerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = [false; LEG_COUNT];
        for &leg in &self.swing_order {
            if leg >= LEG_COUNT || seen[leg] {
                return Err(ConfigError::InvalidSwingOrder(self.swing_order));
            }
            seen[leg] = true;
        }
        if !(self.margin > 0.0) {
            return Err(invalid("stabilizer.margin", "must be > 0"));
        }
        if !(self.filter_time_constant > 0.0) {
            return Err(invalid("stabilizer.filter_time_constant", "must be > 0"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// PlacementConfig
// ---------------------------------------------------------------------------

/// When the swing lift-off anchor is captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorMode {
    /// Capture the foot-to-hip offset once at the stance-to-swing edge and
    /// hold it for the whole swing.
    LatchAtSwingOnset,
    /// Re-capture the offset from the measured foot every tick.
    RelatchEveryTick,
}

/// Swing-foot placement planner parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementConfig {
    /// Gain on the inverted-pendulum (capture point) offset.
    #[serde(default = "default_feedback_scale")]
    pub feedback_scale: f64,
    /// Gravitational acceleration in m/s^2.
    #[serde(default = "default_gravity")]
    pub gravity: f64,
    /// Static per-leg stepping offset from the hip, world frame.
    #[serde(default = "default_stepping_offsets")]
    pub stepping_offsets: [[f64; 3]; 4],
    /// Sagittal blend easing knots, [phase, blend].
    #[serde(default = "default_sagittal_blend")]
    pub sagittal_blend: Vec<[f64; 2]>,
    /// Swing height profile knots, [phase, height].
    #[serde(default = "default_height_profile")]
    pub height_profile: Vec<[f64; 2]>,
    /// Lift-off anchor capture semantics.
    #[serde(default = "default_anchor_mode")]
    pub anchor_mode: AnchorMode,
}

const fn default_anchor_mode() -> AnchorMode {
    AnchorMode::LatchAtSwingOnset
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            feedback_scale: default_feedback_scale(),
            gravity: default_gravity(),
            stepping_offsets: default_stepping_offsets(),
            sagittal_blend: default_sagittal_blend(),
            height_profile: default_height_profile(),
            anchor_mode: default_anchor_mode(),
        }
    }
}

impl PlacementConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.gravity > 0.0) {
            return Err(invalid("placement.gravity", "must be > 0"));
        }
        if !self.feedback_scale.is_finite() {
            return Err(invalid("placement.feedback_scale", "must be finite"));
        }
        PiecewiseLinear::new(self.sagittal_blend.clone())?;
        PiecewiseLinear::new(self.height_profile.clone())?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// GaitConfig
// ---------------------------------------------------------------------------

/// One named gait: timing plus the per-component parameter sections.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GaitConfig {
    pub timing: TimingConfig,
    #[serde(default)]
    pub stabilizer: StabilizerConfig,
    #[serde(default)]
    pub placement: PlacementConfig,
}

impl GaitConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.timing.validate()?;
        self.stabilizer.validate()?;
        self.placement.validate()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TransitionConfig
// ---------------------------------------------------------------------------

/// One allowed transition between two named gaits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionConfig {
    /// Gait that must be active for this transition to apply.
    pub start: String,
    /// Gait to transition to.
    pub end: String,
    /// Auto-trigger when measured sagittal speed falls below this value.
    /// Negative disables the trigger.
    #[serde(default = "default_speed_trigger")]
    pub smaller_speed_trigger: f64,
    /// Auto-trigger when measured sagittal speed exceeds this value.
    /// Negative disables the trigger.
    #[serde(default = "default_speed_trigger")]
    pub larger_speed_trigger: f64,
    /// Stride phase at which the transition is released. Values outside
    /// [0, 1] fire immediately.
    #[serde(default = "default_phase_trigger")]
    pub phase_trigger: f64,
    /// Interpolation duration in seconds; <= 0 switches instantaneously.
    #[serde(default)]
    pub time_interval: f64,
}

// ---------------------------------------------------------------------------
// GaitLibraryConfig
// ---------------------------------------------------------------------------

/// The full gait library: named gaits plus the transition table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaitLibraryConfig {
    /// Name of the gait active at startup.
    pub initial_gait: String,
    /// Enable speed-based automatic transitions.
    #[serde(default)]
    pub auto_transitions: bool,
    pub gaits: HashMap<String, GaitConfig>,
    #[serde(default)]
    pub transitions: Vec<TransitionConfig>,
}

impl GaitLibraryConfig {
    /// Validate the whole library. Returns Err on the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gaits.is_empty() {
            return Err(invalid("gaits", "at least one gait is required"));
        }
        if !self.gaits.contains_key(&self.initial_gait) {
            return Err(ConfigError::UnknownGait(self.initial_gait.clone()));
        }
        for gait in self.gaits.values() {
            gait.validate()?;
        }
        for transition in &self.transitions {
            if !self.gaits.contains_key(&transition.start) {
                return Err(ConfigError::UnknownGait(transition.start.clone()));
            }
            if !self.gaits.contains_key(&transition.end) {
                return Err(ConfigError::UnknownGait(transition.end.clone()));
            }
        }
        Ok(())
    }

    /// Load and validate from a TOML file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Look up a gait by name.
    pub fn gait(&self, name: &str) -> Result<&GaitConfig, ConfigError> {
        self.gaits
            .get(name)
            .ok_or_else(|| ConfigError::UnknownGait(name.into()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
