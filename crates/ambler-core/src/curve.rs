//! Piecewise-linear scalar curves.
//!
//! The placement planner uses these for the sagittal step-blend easing and
//! the swing-height profile. Evaluation clamps at both ends, so a curve
//! whose last knot sits before 1.0 holds its final value for the rest of
//! the swing.

use crate::error::ConfigError;

/// Remap `value` into [0, 1] over the interval [`min`, `max`], clamped.
#[must_use]
pub fn map_to_unit_range(value: f64, min: f64, max: f64) -> f64 {
    ((value - min) / (max - min)).clamp(0.0, 1.0)
}

/// A scalar curve defined by knots with strictly increasing abscissae.
#[derive(Clone, Debug, PartialEq)]
pub struct PiecewiseLinear {
    knots: Vec<[f64; 2]>,
}

impl PiecewiseLinear {
    /// Build a curve from `[x, y]` knots.
    ///
    /// Requires at least two knots with strictly increasing `x`.
    pub fn new(knots: Vec<[f64; 2]>) -> Result<Self, ConfigError> {
        if knots.len() < 2 || knots.windows(2).any(|w| w[1][0] <= w[0][0]) {
            return Err(ConfigError::InvalidCurve);
        }
        Ok(Self { knots })
    }

    /// Evaluate at `x`, clamping outside the knot range.
    #[must_use]
    pub fn evaluate(&self, x: f64) -> f64 {
        let first = self.knots[0];
        let last = self.knots[self.knots.len() - 1];
        if x <= first[0] {
            return first[1];
        }
        if x >= last[0] {
            return last[1];
        }
        for w in self.knots.windows(2) {
            let [x0, y0] = w[0];
            let [x1, y1] = w[1];
            if x <= x1 {
                return y0 + (y1 - y0) * (x - x0) / (x1 - x0);
            }
        }
        last[1]
    }

    /// Replace this curve with the blend of `a` and `b` at parameter `t`.
    ///
    /// The result keeps `a`'s knot grid; `b` is sampled at those abscissae,
    /// so the two curves need not share a grid.
    pub fn set_to_interpolated(&mut self, a: &Self, b: &Self, t: f64) {
        self.knots = a
            .knots
            .iter()
            .map(|&[x, y]| [x, y + (b.evaluate(x) - y) * t])
            .collect();
    }

    #[must_use]
    pub fn knots(&self) -> &[[f64; 2]] {
        &self.knots
    }
}
