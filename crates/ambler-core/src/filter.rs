//! Discrete first-order low-pass filter.
//!
//! Used by the support-polygon stabilizer to decouple the event-driven
//! geometric target recompute from the tick-driven control rate.

/// First-order low-pass with configurable time constant and DC gain.
///
/// Discrete update: `y' = (tau * y + dt * gain * u) / (tau + dt)`.
#[derive(Clone, Debug)]
pub struct FirstOrderFilter {
    time_constant: f64,
    gain: f64,
    output: f64,
}

impl FirstOrderFilter {
    /// Create a filter with its output preloaded to `initial`.
    #[must_use]
    pub fn new(initial: f64, time_constant: f64, gain: f64) -> Self {
        Self {
            time_constant,
            gain,
            output: initial,
        }
    }

    /// Reset the output without touching the filter parameters.
    pub fn reset(&mut self, value: f64) {
        self.output = value;
    }

    /// Change the time constant, keeping the current output.
    pub fn set_time_constant(&mut self, time_constant: f64) {
        self.time_constant = time_constant;
    }

    #[must_use]
    pub const fn time_constant(&self) -> f64 {
        self.time_constant
    }

    /// Advance by `dt` seconds with input `input`, returning the new output.
    pub fn advance(&mut self, dt: f64, input: f64) -> f64 {
        self.output =
            (self.time_constant * self.output + dt * self.gain * input) / (self.time_constant + dt);
        self.output
    }

    #[must_use]
    pub const fn output(&self) -> f64 {
        self.output
    }
}
