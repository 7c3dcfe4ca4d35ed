//! Support-polygon stabilizer.
//!
//! While one leg swings, the torso is supported by the triangle of the
//! other three feet. The stabilizer plans a horizontal center-of-mass
//! target that is statically stable for the current swing leg and for the
//! one after it: it intersects the "safe diagonals" of consecutive
//! margin-shrunk support triangles. Targets are recomputed only in the
//! all-grounded window between two swings; a pair of first-order filters
//! turns the piecewise-constant target into a smooth trajectory.

use ambler_core::config::StabilizerConfig;
use ambler_core::filter::FirstOrderFilter;
use ambler_core::types::{LegGroup, TorsoState, LEG_COUNT};
use nalgebra::{Vector2, Vector3};

/// Directions with a cross product below this are treated as parallel.
const PARALLEL_EPSILON: f64 = 1e-10;

/// Columns of the support triangle holding the rectangle diagonal
/// complementary to the swing leg. The triangle is built by skipping the
/// swing leg in ascending leg order, so the diagonal pair {1, 2} or
/// {0, 3} lands on different columns depending on which leg is skipped.
const DIAGONAL_COLUMNS: [[usize; 2]; LEG_COUNT] = [[0, 1], [0, 2], [0, 2], [1, 2]];

fn cross(a: Vector2<f64>, b: Vector2<f64>) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Intersect segment `a` with the line through `b`.
///
/// Returns the intersection point if the two are not parallel and the
/// point lies within segment `a`. Only the first segment's parameter is
/// range-checked.
fn line_intersect(a: &[Vector2<f64>; 2], b: &[Vector2<f64>; 2]) -> Option<Vector2<f64>> {
    let d1 = a[1] - a[0];
    let d2 = b[1] - b[0];
    if d1.norm_squared() == 0.0 || d2.norm_squared() == 0.0 {
        return None;
    }
    let denom = cross(d1, d2);
    if denom.abs() < PARALLEL_EPSILON {
        return None;
    }
    let t = cross(b[0] - a[0], d2) / denom;
    if (0.0..=1.0).contains(&t) {
        Some(a[0] + d1 * t)
    } else {
        None
    }
}

/// Shrink a support triangle by moving each vertex inward along its
/// angle bisector until it is `margin` away from both adjacent edges.
fn safe_triangle(triangle: &[Vector2<f64>; 3], margin: f64) -> [Vector2<f64>; 3] {
    std::array::from_fn(|k| {
        let vertex = triangle[k];
        let v1 = (triangle[(k + 1) % 3] - vertex).normalize();
        let v2 = (triangle[(k + 2) % 3] - vertex).normalize();
        let angle = v1.dot(&v2).acos();
        vertex + (v1 + v2) * (margin / angle.sin())
    })
}

/// The three stance feet when `excluded` swings, in ascending leg order.
fn support_triangle(feet: &[Vector2<f64>; LEG_COUNT], excluded: usize) -> [Vector2<f64>; 3] {
    let mut triangle = [Vector2::zeros(); 3];
    let mut j = 0;
    for (k, foot) in feet.iter().enumerate() {
        if k != excluded {
            triangle[j] = *foot;
            j += 1;
        }
    }
    triangle
}

fn diagonal_of(safe: &[Vector2<f64>; 3], swing_leg: usize) -> [Vector2<f64>; 2] {
    let [a, b] = DIAGONAL_COLUMNS[swing_leg];
    [safe[a], safe[b]]
}

/// Pick the CoM target from the three safe diagonals.
///
/// Preferred is the intersection of the just-finished and the upcoming
/// swing's diagonals. When those are parallel (the exact case on a
/// rectangular stance) the upcoming and over-next diagonals are tried,
/// and as a last resort the centroid of the current safe triangle. The
/// returned flag is true for both fallbacks.
fn select_target(
    line_last: &[Vector2<f64>; 2],
    line_next: &[Vector2<f64>; 2],
    line_over_next: &[Vector2<f64>; 2],
    safe_current: &[Vector2<f64>; 3],
) -> (Vector2<f64>, bool) {
    if let Some(intersection) = line_intersect(line_last, line_next) {
        (intersection, false)
    } else if let Some(intersection) = line_intersect(line_next, line_over_next) {
        (intersection, true)
    } else {
        let centroid = (safe_current[0] + safe_current[1] + safe_current[2]) / 3.0;
        (centroid, true)
    }
}

/// CoM-over-support-polygon stabilizer for a static gait.
#[derive(Clone, Debug)]
pub struct SupportPolygonStabilizer {
    config: StabilizerConfig,
    planned_holds: [Vector2<f64>; LEG_COUNT],

    swing_leg_last: usize,
    swing_leg_next: usize,
    swing_leg_over_next: usize,
    swing_foot_changed: bool,
    all_feet_grounded: bool,

    make_shift: bool,
    com_target: Vector2<f64>,
    filter_x: FirstOrderFilter,
    filter_y: FirstOrderFilter,
    desired_com_position: Vector3<f64>,

    support_triangle_current: [Vector2<f64>; 3],
    support_triangle_next: [Vector2<f64>; 3],
    support_triangle_over_next: [Vector2<f64>; 3],
    safe_triangle_current: [Vector2<f64>; 3],
    safe_triangle_next: [Vector2<f64>; 3],
    safe_triangle_over_next: [Vector2<f64>; 3],
}

impl SupportPolygonStabilizer {
    #[must_use]
    pub fn new(config: StabilizerConfig) -> Self {
        let tau = config.filter_time_constant;
        let swing_leg_last = config.swing_order[0];
        let mut stabilizer = Self {
            config,
            planned_holds: [Vector2::zeros(); LEG_COUNT],
            swing_leg_last,
            swing_leg_next: 0,
            swing_leg_over_next: 0,
            swing_foot_changed: false,
            all_feet_grounded: false,
            make_shift: false,
            com_target: Vector2::zeros(),
            filter_x: FirstOrderFilter::new(0.0, tau, 1.0),
            filter_y: FirstOrderFilter::new(0.0, tau, 1.0),
            desired_com_position: Vector3::zeros(),
            support_triangle_current: [Vector2::zeros(); 3],
            support_triangle_next: [Vector2::zeros(); 3],
            support_triangle_over_next: [Vector2::zeros(); 3],
            safe_triangle_current: [Vector2::zeros(); 3],
            safe_triangle_next: [Vector2::zeros(); 3],
            safe_triangle_over_next: [Vector2::zeros(); 3],
        };
        stabilizer.swing_leg_next = stabilizer.next_swing_foot(swing_leg_last);
        stabilizer.swing_leg_over_next = stabilizer.next_swing_foot(stabilizer.swing_leg_next);
        stabilizer
    }

    /// Reset against the current stance and compute a first target.
    pub fn initialize(&mut self, legs: &LegGroup, torso: &mut TorsoState) {
        self.make_shift = false;
        self.com_target = Vector2::zeros();
        self.swing_foot_changed = false;

        self.filter_x.reset(0.0);
        self.filter_y.reset(0.0);
        self.filter_x.set_time_constant(self.config.filter_time_constant);
        self.filter_y.set_time_constant(self.config.filter_time_constant);

        self.swing_leg_last = self.config.swing_order[0];
        self.swing_leg_next = self.next_swing_foot(self.swing_leg_last);
        self.swing_leg_over_next = self.next_swing_foot(self.swing_leg_next);

        for (leg_index, leg) in legs.iter().enumerate() {
            self.planned_holds[leg_index] = leg.foot_position.xy();
        }

        self.desired_com_position = Vector3::new(torso.position.x, torso.position.y, 0.0);
        torso.desired_com_position = self.desired_com_position;

        self.update_safe_support_triangles(legs);
    }

    /// Record the planned hold for a leg's next step.
    pub fn set_foot_hold(&mut self, leg: usize, hold: &Vector3<f64>) {
        self.planned_holds[leg] = hold.xy();
    }

    /// The leg that will swing next.
    #[must_use]
    pub const fn next_swing_leg(&self) -> usize {
        self.swing_leg_next
    }

    /// Track the swing schedule and move the filtered CoM target.
    ///
    /// The geometric target is recomputed only when all feet are grounded
    /// after a swing finished; the filters advance every tick regardless.
    pub fn advance(&mut self, dt: f64, legs: &LegGroup, torso: &mut TorsoState) {
        self.update_swing_leg_indexes(legs);

        if self.all_feet_grounded && self.swing_foot_changed {
            self.swing_foot_changed = false;
            self.update_safe_support_triangles(legs);
        }

        let x = self.filter_x.advance(dt, self.com_target.x);
        let y = self.filter_y.advance(dt, self.com_target.y);
        if self.make_shift {
            self.desired_com_position = Vector3::new(x, y, 0.0);
        }
        torso.desired_com_position = self.desired_com_position;
    }

    /// Blend margin and filter dynamics between `a` and `b` at `t`.
    /// Triangles, targets and filter outputs keep their live state.
    pub fn set_to_interpolated(&mut self, a: &Self, b: &Self, t: f64) {
        self.config.margin = a.config.margin + (b.config.margin - a.config.margin) * t;
        let tau = a.config.filter_time_constant
            + (b.config.filter_time_constant - a.config.filter_time_constant) * t;
        self.config.filter_time_constant = tau;
        self.filter_x.set_time_constant(tau);
        self.filter_y.set_time_constant(tau);
    }

    /// Take over `other`'s configuration wholesale, keeping live state.
    ///
    /// The upcoming swing legs are re-derived from the new order; holds,
    /// filter outputs and triangles carry over until the next
    /// all-grounded window recomputes the target.
    pub fn adopt_parameters(&mut self, other: &Self) {
        self.config = other.config.clone();
        self.filter_x.set_time_constant(self.config.filter_time_constant);
        self.filter_y.set_time_constant(self.config.filter_time_constant);
        self.swing_leg_next = self.next_swing_foot(self.swing_leg_last);
        self.swing_leg_over_next = self.next_swing_foot(self.swing_leg_next);
        self.swing_foot_changed = true;
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    #[must_use]
    pub const fn desired_com_position(&self) -> &Vector3<f64> {
        &self.desired_com_position
    }

    #[must_use]
    pub const fn com_target(&self) -> &Vector2<f64> {
        &self.com_target
    }

    /// True while the target comes from a fallback rather than the
    /// preferred diagonal intersection.
    #[must_use]
    pub const fn is_make_shift(&self) -> bool {
        self.make_shift
    }

    #[must_use]
    pub const fn all_feet_grounded(&self) -> bool {
        self.all_feet_grounded
    }

    #[must_use]
    pub const fn support_triangle_over_next(&self) -> &[Vector2<f64>; 3] {
        &self.support_triangle_over_next
    }

    #[must_use]
    pub const fn safe_triangle_current(&self) -> &[Vector2<f64>; 3] {
        &self.safe_triangle_current
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn next_swing_foot(&self, current: usize) -> usize {
        let order = &self.config.swing_order;
        let position = order
            .iter()
            .position(|&leg| leg == current)
            .unwrap_or(LEG_COUNT - 1);
        order[(position + 1) % LEG_COUNT]
    }

    fn update_swing_leg_indexes(&mut self, legs: &LegGroup) {
        let mut swing_leg = None;
        for (leg_index, leg) in legs.iter().enumerate() {
            if leg.swing_phase >= 0.0 {
                swing_leg = Some(leg_index);
            }
        }
        self.all_feet_grounded = swing_leg.is_none();
        if let Some(leg_index) = swing_leg {
            self.swing_leg_last = leg_index;
            self.swing_leg_next = self.next_swing_foot(leg_index);
            self.swing_leg_over_next = self.next_swing_foot(self.swing_leg_next);
            self.swing_foot_changed = true;
        }
    }

    fn update_safe_support_triangles(&mut self, legs: &LegGroup) {
        let mut feet_current = [Vector2::zeros(); LEG_COUNT];
        for (leg_index, leg) in legs.iter().enumerate() {
            feet_current[leg_index] = leg.foot_position.xy();
        }
        // The stance after the upcoming swing lands on its planned hold.
        let mut feet_next = feet_current;
        feet_next[self.swing_leg_next] = self.planned_holds[self.swing_leg_next];

        let margin = self.config.margin;
        self.support_triangle_current = support_triangle(&feet_current, self.swing_leg_last);
        self.safe_triangle_current = safe_triangle(&self.support_triangle_current, margin);

        self.support_triangle_next = support_triangle(&feet_current, self.swing_leg_next);
        self.safe_triangle_next = safe_triangle(&self.support_triangle_next, margin);

        self.support_triangle_over_next = support_triangle(&feet_next, self.swing_leg_over_next);
        self.safe_triangle_over_next = safe_triangle(&self.support_triangle_over_next, margin);

        let line_last = diagonal_of(&self.safe_triangle_current, self.swing_leg_last);
        let line_next = diagonal_of(&self.safe_triangle_next, self.swing_leg_next);
        let line_over_next = diagonal_of(&self.safe_triangle_over_next, self.swing_leg_over_next);

        let (target, make_shift) = select_target(
            &line_last,
            &line_next,
            &line_over_next,
            &self.safe_triangle_current,
        );
        self.com_target = target;
        self.make_shift = make_shift;
    }
}
