use std::f32::consts::{PI, TAU};

use super::MotorState;
use crate::config::MotorConfig;

/// Wraps an angle into [-PI, PI).
pub fn wrap_angle(angle: f32) -> f32 {
    ((angle + PI).rem_euclid(TAU)) - PI
}

/// Yaw for a world-space planar direction, with local forward on -Z.
pub fn yaw_from_direction(direction: [f32; 2]) -> f32 {
    (-direction[0]).atan2(-direction[1])
}

/// Critically damped angle smoothing carrying an angular velocity across
/// ticks. Takes the shortest arc to the target and clamps past-the-target
/// results so the approach never overshoots.
pub fn smooth_damp_angle(
    current: f32,
    target: f32,
    velocity: &mut f32,
    smooth_time: f32,
    dt: f32,
) -> f32 {
    let target = current + wrap_angle(target - current);

    let smooth_time = smooth_time.max(1e-4);
    let omega = 2.0 / smooth_time;
    let x = omega * dt;
    let exp = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

    let change = current - target;
    let temp = (*velocity + omega * change) * dt;
    *velocity = (*velocity - omega * temp) * exp;
    let mut output = target + (change + temp) * exp;

    if (target - current > 0.0) == (output > target) {
        output = target;
        *velocity = 0.0;
    }
    output
}

/// Produces the character's new yaw for this tick.
///
/// Strafe mode tracks the camera yaw every tick. Facing-movement mode tracks
/// the move direction only while moving and freezes the yaw when idle, so an
/// idle character holds its last facing.
pub fn update_yaw(
    state: &mut MotorState,
    config: &MotorConfig,
    current_yaw: f32,
    camera_yaw: f32,
    move_direction: [f32; 2],
    moving: bool,
    dt: f32,
) -> f32 {
    if config.strafe_mode {
        state.target_yaw = camera_yaw;
    } else if moving {
        state.target_yaw = yaw_from_direction(move_direction);
    } else {
        return current_yaw;
    }

    smooth_damp_angle(
        current_yaw,
        state.target_yaw,
        &mut state.rotation_velocity,
        config.rotation_smooth_time,
        dt,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_wrap_angle_range() {
        assert!((wrap_angle(0.5) - 0.5).abs() < 1e-6);
        assert!((wrap_angle(TAU + 0.25) - 0.25).abs() < 1e-5);
        assert!((wrap_angle(-TAU - 0.25) + 0.25).abs() < 1e-5);
        assert!((wrap_angle(PI + 0.1) - (0.1 - PI)).abs() < 1e-5);
    }

    #[test]
    fn test_yaw_from_direction_convention() {
        // Forward (-Z) is yaw 0.
        assert!((yaw_from_direction([0.0, -1.0])).abs() < 1e-6);
        // +X is yaw -PI/2 in this right-handed convention.
        assert!((yaw_from_direction([1.0, 0.0]) + FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_smooth_damp_monotone_without_overshoot() {
        // Strafe scenario: camera at 90°, smoothing time 0.12, dt 0.02.
        let target = FRAC_PI_2;
        let mut yaw = 0.0;
        let mut velocity = 0.0;
        for _ in 0..100 {
            let next = smooth_damp_angle(yaw, target, &mut velocity, 0.12, 0.02);
            assert!(next >= yaw - 1e-6, "Approach must be monotone");
            assert!(next <= target + 1e-5, "Approach must not overshoot");
            yaw = next;
        }
        assert!((yaw - target).abs() < 1e-3, "Should converge, got {}", yaw);
    }

    #[test]
    fn test_smooth_damp_takes_shortest_arc() {
        let mut velocity = 0.0;
        // From just below +PI to just above -PI: the short way crosses the seam.
        let next = smooth_damp_angle(PI - 0.1, -PI + 0.1, &mut velocity, 0.12, 0.02);
        assert!(next > PI - 0.1, "Must rotate through the seam, not back around");
    }

    #[test]
    fn test_facing_mode_holds_yaw_when_idle() {
        let config = MotorConfig {
            strafe_mode: false,
            ..Default::default()
        };
        let mut state = MotorState::new(&config);
        state.rotation_velocity = 1.0;

        let yaw = update_yaw(&mut state, &config, 0.8, 0.0, [0.0, 0.0], false, 0.02);
        assert_eq!(yaw, 0.8, "Idle facing mode must not rotate");
    }

    #[test]
    fn test_strafe_mode_tracks_camera_while_idle() {
        let config = MotorConfig::default();
        assert!(config.strafe_mode);
        let mut state = MotorState::new(&config);

        let yaw = update_yaw(&mut state, &config, 0.0, 1.0, [0.0, 0.0], false, 0.02);
        assert!(yaw > 0.0, "Strafe mode turns toward the camera even when idle");
        assert_eq!(state.target_yaw, 1.0);
    }
}
