use super::super::constants::motor as consts;
use super::MotorState;
use crate::config::MotorConfig;

/// Advances vertical velocity and the jump/fall timers for one tick.
/// Returns true when a jump was consumed this tick.
///
/// Grounded: the fall timer is re-armed, a negative vertical velocity snaps
/// to a small stick-to-ground constant, and a rising edge of `jump_held`
/// converts to launch velocity once the jump cooldown has drained. Airborne:
/// the jump cooldown is re-armed for the next landing while the fall timer
/// counts down toward the free-fall boundary. Gravity accumulates every tick
/// until the terminal-velocity clamp.
pub fn update_vertical(
    state: &mut MotorState,
    config: &MotorConfig,
    jump_held: bool,
    dt: f32,
) -> bool {
    // Edge detection runs unconditionally: holding jump across a landing
    // must not retrigger on touchdown.
    let jump_pressed = jump_held && !state.prev_jump_held;
    state.prev_jump_held = jump_held;

    let mut jumped = false;
    if state.grounded {
        state.fall_timeout_remaining = config.fall_timeout;

        if state.vertical_velocity < 0.0 {
            state.vertical_velocity = consts::GROUND_STICK_VELOCITY;
        }

        if jump_pressed && state.jump_timeout_remaining <= 0.0 {
            state.vertical_velocity = (config.jump_height * 2.0 * config.gravity.abs()).sqrt();
            state.jump_timeout_remaining = config.jump_timeout;
            jumped = true;
        }

        if state.jump_timeout_remaining > 0.0 {
            state.jump_timeout_remaining = (state.jump_timeout_remaining - dt).max(0.0);
        }
    } else {
        // Re-arm the jump cooldown so the next landing starts a fresh one.
        state.jump_timeout_remaining = config.jump_timeout;
        if state.fall_timeout_remaining > 0.0 {
            state.fall_timeout_remaining = (state.fall_timeout_remaining - dt).max(0.0);
        }
    }

    if state.vertical_velocity > -consts::TERMINAL_VELOCITY {
        state.vertical_velocity =
            (state.vertical_velocity + config.gravity * dt).max(-consts::TERMINAL_VELOCITY);
    }

    jumped
}
