//! End-to-end static walk: two full strides with ideal foot tracking.
//!
//! The torso is held in place while the legs cycle, which makes the step
//! targets exactly predictable: the feedforward offset pushes each foot
//! forward by half the stance displacement, and the inverted pendulum
//! pulls it back against the standing torso's velocity error.

use ambler_core::config::GaitConfig;
use ambler_core::types::{Leg, LegGroup, TorsoState};
use ambler_gait::GaitController;
use approx::assert_relative_eq;
use nalgebra::{Vector2, Vector3};

const DT: f64 = 0.01;
const HIP_HEIGHT: f64 = 0.42;
const HEADING_SPEED: f64 = 0.3;

fn home_feet() -> [Vector3<f64>; 4] {
    [
        Vector3::new(0.5, 0.3, 0.0),
        Vector3::new(0.5, -0.3, 0.0),
        Vector3::new(-0.5, 0.3, 0.0),
        Vector3::new(-0.5, -0.3, 0.0),
    ]
}

fn home_legs() -> LegGroup {
    let feet = home_feet();
    std::array::from_fn(|i| Leg {
        foot_position: feet[i],
        hip_position: feet[i] + Vector3::new(0.0, 0.0, HIP_HEIGHT),
        is_grounded: true,
        ..Leg::default()
    })
}

/// Signed distance of `point` to the closest triangle edge, positive
/// inside.
fn min_edge_distance(point: Vector2<f64>, triangle: &[Vector2<f64>; 3]) -> f64 {
    let cross = |a: Vector2<f64>, b: Vector2<f64>| a.x * b.y - a.y * b.x;
    let orientation = cross(triangle[1] - triangle[0], triangle[2] - triangle[0]).signum();
    let mut min = f64::INFINITY;
    for i in 0..3 {
        let a = triangle[i];
        let b = triangle[(i + 1) % 3];
        let edge = b - a;
        let distance = orientation * cross(edge, point - a) / edge.norm();
        min = min.min(distance);
    }
    min
}

#[test]
fn two_strides_of_static_walk() {
    let mut controller = GaitController::from_config("walk", &GaitConfig::default()).unwrap();
    let mut legs = home_legs();
    let mut torso = TorsoState {
        desired_heading_speed: HEADING_SPEED,
        ..TorsoState::default()
    };
    controller.initialize(&mut legs, &mut torso);

    let mut swing_sequence: Vec<usize> = Vec::new();
    let mut leg0_landing = Vector3::zeros();

    // Two strides at 2.0 s each, with slack so the lift-off at the end
    // of the second stride is observed even if phase accumulation puts
    // it one tick late.
    for _ in 0..410 {
        // Ideal contact sensing: the feet touch exactly when scheduled.
        for leg in &mut legs {
            leg.is_grounded = leg.should_be_grounded;
        }

        controller.advance(DT, &mut legs, &mut torso, None);

        // Ideal swing tracking: the foot follows its desired position.
        let mut swing_count = 0;
        for (leg_index, leg) in legs.iter_mut().enumerate() {
            if leg.is_in_swing_mode() {
                swing_count += 1;
                leg.foot_position = leg.desired_foot_position;
            }
            if leg.lifted_off() {
                swing_sequence.push(leg_index);
            }
            if leg_index == 0 && leg.touched_down() {
                leg0_landing = leg.foot_position;
            }
        }
        // A static walk never has more than one foot in the air.
        assert!(swing_count <= 1, "{swing_count} legs swinging at once");

        let stride_phase = torso.stride_phase;

        // While leg 3 swings in the first stride, the published CoM
        // target must stay a safe margin inside the support triangle of
        // legs 0, 1 and 2.
        if controller.coordinator().scheduler().cycle_count() == 0
            && (0.26..=0.44).contains(&stride_phase)
        {
            let support = [
                legs[0].foot_position.xy(),
                legs[1].foot_position.xy(),
                legs[2].foot_position.xy(),
            ];
            let target = torso.desired_com_position.xy();
            let margin = min_edge_distance(target, &support);
            assert!(
                margin >= 0.04,
                "CoM target {margin:.4} from the support edge at phase {stride_phase:.3}"
            );
        }
    }

    // Legs cycled in the static walk order. Leg 0's first lift-off
    // happens during initialization, before the loop observes edges.
    assert_eq!(swing_sequence, vec![3, 1, 2, 0, 3, 1, 2, 0]);

    // The standing torso never picks up speed, so every step lands at
    // the feedforward offset minus the pendulum correction.
    let step = HEADING_SPEED * 1.6 / 2.0 - 1.2 * HEADING_SPEED * (HIP_HEIGHT / 9.81).sqrt();
    assert_relative_eq!(leg0_landing.x, 0.5 + step, epsilon = 1e-9);
    assert_relative_eq!(leg0_landing.y, 0.3, epsilon = 1e-9);
    assert!(leg0_landing.z < 0.01);
}
