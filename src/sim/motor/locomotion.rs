use super::super::camera::CameraFrame;
use super::super::constants::motor as consts;
use crate::config::MotorConfig;

/// Horizontal motion plan for one tick: a world-space unit direction (or
/// zero when idle) and the smoothed scalar speed to travel at.
#[derive(Debug, Clone, Copy)]
pub struct LocomotionPlan {
    pub direction: [f32; 2],
    pub speed: f32,
    pub target_speed: f32,
}

impl LocomotionPlan {
    pub fn is_moving(&self) -> bool {
        self.direction[0] != 0.0 || self.direction[1] != 0.0
    }
}

/// Converts move intent plus the camera frame into a camera-relative
/// direction and a speed eased from the collider's measured horizontal
/// speed toward the target.
pub fn plan_locomotion(
    move_axes: [f32; 2],
    sprint_held: bool,
    frame: &CameraFrame,
    measured_speed: f32,
    config: &MotorConfig,
    dt: f32,
) -> LocomotionPlan {
    let [mx, my] = move_axes;
    let intent_sq = mx * mx + my * my;

    let target_speed = if intent_sq > consts::MOVE_DEADZONE_SQ {
        if sprint_held {
            config.sprint_speed
        } else {
            config.move_speed
        }
    } else {
        0.0
    };

    let direction = if intent_sq > consts::MOVE_DEADZONE_SQ {
        let raw = [
            frame.right_xz[0] * mx + frame.forward_xz[0] * my,
            frame.right_xz[1] * mx + frame.forward_xz[1] * my,
        ];
        let len = (raw[0] * raw[0] + raw[1] * raw[1]).sqrt();
        if len > 1e-5 {
            [raw[0] / len, raw[1] / len]
        } else {
            [0.0, 0.0]
        }
    } else {
        [0.0, 0.0]
    };

    LocomotionPlan {
        direction,
        speed: smooth_speed(measured_speed, target_speed, config.speed_change_rate, dt),
        target_speed,
    }
}

/// Eases `current` toward `target` at `rate` per second. Inside the
/// smoothing band the result is rounded to 1/1000 to suppress float jitter;
/// once within the snap threshold it locks exactly onto the target.
pub fn smooth_speed(current: f32, target: f32, rate: f32, dt: f32) -> f32 {
    if (current - target).abs() > consts::SPEED_SNAP_THRESHOLD {
        let t = (rate * dt).clamp(0.0, 1.0);
        let eased = current + (target - current) * t;
        (eased * 1000.0).round() / 1000.0
    } else {
        target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smooth_speed_matches_accel_formula() {
        // move_speed 2.0, rate 10, dt 0.02, from standstill: one tick gains
        // (2.0 - 0) * 10 * 0.02 = 0.4
        let speed = smooth_speed(0.0, 2.0, 10.0, 0.02);
        assert!((speed - 0.4).abs() < 1e-5, "got {}", speed);
    }

    #[test]
    fn test_smooth_speed_snaps_when_close() {
        assert_eq!(smooth_speed(1.95, 2.0, 10.0, 0.02), 2.0);
        assert_eq!(smooth_speed(0.05, 0.0, 10.0, 0.02), 0.0);
    }

    #[test]
    fn test_smooth_speed_never_overshoots() {
        let mut speed = 0.0;
        for _ in 0..200 {
            let next = smooth_speed(speed, 5.335, 10.0, 0.02);
            assert!(next >= speed - 1e-3);
            assert!(next <= 5.335 + 1e-3);
            speed = next;
        }
        assert_eq!(speed, 5.335);
    }

    #[test]
    fn test_deadzone_zeroes_target() {
        let frame = CameraFrame::from_yaw(0.0);
        let config = MotorConfig::default();
        let plan = plan_locomotion([0.05, 0.05], false, &frame, 1.0, &config, 0.02);
        assert_eq!(plan.target_speed, 0.0);
        assert!(!plan.is_moving());
    }

    #[test]
    fn test_sprint_selects_sprint_speed() {
        let frame = CameraFrame::from_yaw(0.0);
        let config = MotorConfig::default();
        let plan = plan_locomotion([0.0, 1.0], true, &frame, 0.0, &config, 0.02);
        assert_eq!(plan.target_speed, config.sprint_speed);
    }

    #[test]
    fn test_direction_is_camera_relative() {
        let config = MotorConfig::default();

        // Camera at yaw 0 looks down -Z: forward intent moves -Z.
        let frame = CameraFrame::from_yaw(0.0);
        let plan = plan_locomotion([0.0, 1.0], false, &frame, 0.0, &config, 0.02);
        assert!((plan.direction[0]).abs() < 1e-5);
        assert!((plan.direction[1] + 1.0).abs() < 1e-5);

        // Strafing right at yaw 0 moves +X.
        let plan = plan_locomotion([1.0, 0.0], false, &frame, 0.0, &config, 0.02);
        assert!((plan.direction[0] - 1.0).abs() < 1e-5);

        // Diagonal input normalizes to unit length.
        let plan = plan_locomotion([1.0, 1.0], false, &frame, 0.0, &config, 0.02);
        let len = (plan.direction[0].powi(2) + plan.direction[1].powi(2)).sqrt();
        assert!((len - 1.0).abs() < 1e-5);
    }
}
