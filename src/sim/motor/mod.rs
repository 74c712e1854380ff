//! Character locomotion motor.
//!
//! One `CharacterMotor` owns the full per-tick pipeline for a single capsule:
//! grounding, jump/gravity integration, camera-relative locomotion planning,
//! yaw smoothing, and the single displacement request submitted to the
//! physics world. All cross-tick floats live in one `MotorState` value; the
//! only entry point is `tick`.

pub mod grounding;
pub mod jump_gravity;
pub mod locomotion;
pub mod rotation;

use tracing::debug;

use super::camera::{CameraFrame, CameraRig};
use super::events::JumpSignal;
use super::input::InputSample;
use super::physics::{CharacterId, PhysicsWorld};
use crate::config::{ConfigError, MotorConfig};

/// Per-character timing and velocity state, mutated exactly once per tick.
#[derive(Debug, Clone, Copy)]
pub struct MotorState {
    pub grounded: bool,
    pub vertical_velocity: f32,
    pub current_horizontal_speed: f32,
    pub target_yaw: f32,
    pub rotation_velocity: f32,
    pub jump_timeout_remaining: f32,
    pub fall_timeout_remaining: f32,
    pub prev_jump_held: bool,
    pub prev_grounded: bool,
}

impl MotorState {
    pub fn new(config: &MotorConfig) -> Self {
        Self {
            grounded: false,
            vertical_velocity: 0.0,
            current_horizontal_speed: 0.0,
            target_yaw: 0.0,
            rotation_velocity: 0.0,
            jump_timeout_remaining: config.jump_timeout,
            fall_timeout_remaining: config.fall_timeout,
            prev_jump_held: false,
            prev_grounded: false,
        }
    }
}

/// Optional sink for motor transitions, invoked only when attached.
pub trait MotorDiagnostics: Send + Sync {
    fn grounded_changed(&mut self, _grounded: bool, _sweep_hint: bool, _probe_hit: bool) {}
    fn jump_started(&mut self, _vertical_velocity: f32) {}
}

/// Diagnostics sink that forwards transitions to `tracing`.
pub struct TracingDiagnostics {
    pub label: String,
}

impl MotorDiagnostics for TracingDiagnostics {
    fn grounded_changed(&mut self, grounded: bool, sweep_hint: bool, probe_hit: bool) {
        debug!(
            character = %self.label,
            grounded, sweep_hint, probe_hit,
            "grounded changed"
        );
    }

    fn jump_started(&mut self, vertical_velocity: f32) {
        debug!(character = %self.label, vertical_velocity, "jump");
    }
}

/// Locomotion motor for one character capsule.
pub struct CharacterMotor {
    character: CharacterId,
    config: MotorConfig,
    state: MotorState,
    jump_signal: JumpSignal,
    diagnostics: Option<Box<dyn MotorDiagnostics>>,
}

impl CharacterMotor {
    /// Builds a motor for `character`, rejecting invalid configuration.
    pub fn new(character: CharacterId, config: MotorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let state = MotorState::new(&config);
        Ok(Self {
            character,
            config,
            state,
            jump_signal: JumpSignal::new(),
            diagnostics: None,
        })
    }

    pub fn character(&self) -> CharacterId {
        self.character
    }

    pub fn config(&self) -> &MotorConfig {
        &self.config
    }

    /// Replaces the configuration; takes effect on the next tick.
    pub fn set_config(&mut self, config: MotorConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Hands look ownership to or from the motor (camera-mode switches).
    pub fn set_motor_controls_look(&mut self, motor_controls_look: bool) {
        self.config.motor_controls_look = motor_controls_look;
    }

    pub fn set_diagnostics(&mut self, sink: Box<dyn MotorDiagnostics>) {
        self.diagnostics = Some(sink);
    }

    /// Jump notification; listeners fire synchronously after integration.
    pub fn on_jump(&mut self) -> &mut JumpSignal {
        &mut self.jump_signal
    }

    // Published read-only state, valid once the tick completes.

    pub fn grounded(&self) -> bool {
        self.state.grounded
    }

    pub fn current_horizontal_speed(&self) -> f32 {
        self.state.current_horizontal_speed
    }

    pub fn vertical_velocity(&self) -> f32 {
        self.state.vertical_velocity
    }

    pub fn state(&self) -> &MotorState {
        &self.state
    }

    /// Advances the motor by one tick: grounding, jump/gravity, locomotion,
    /// rotation, then exactly one displacement request. Jump listeners run
    /// last so they observe post-integration state.
    pub fn tick(
        &mut self,
        physics: &mut PhysicsWorld,
        rig: Option<&mut CameraRig>,
        sample: &InputSample,
        camera: Option<CameraFrame>,
        dt: f32,
    ) {
        if dt <= 0.0 {
            return;
        }

        let gs = grounding::grounded_check(physics, self.character, &self.config);
        self.state.grounded = gs.grounded;
        if self.state.grounded != self.state.prev_grounded {
            if let Some(diag) = self.diagnostics.as_deref_mut() {
                diag.grounded_changed(gs.grounded, gs.sweep_hint, gs.probe_hit);
            }
        }
        self.state.prev_grounded = self.state.grounded;

        let jumped =
            jump_gravity::update_vertical(&mut self.state, &self.config, sample.jump_held, dt);
        if jumped {
            if let Some(diag) = self.diagnostics.as_deref_mut() {
                diag.jump_started(self.state.vertical_velocity);
            }
        }

        // Missing camera frame: substitute the character's own axes.
        let current_yaw = physics.character_yaw(self.character).unwrap_or(0.0);
        let frame = camera.unwrap_or_else(|| CameraFrame::from_yaw(current_yaw));

        let measured_speed = physics
            .character_velocity(self.character)
            .map(|v| (v[0] * v[0] + v[2] * v[2]).sqrt())
            .unwrap_or(self.state.current_horizontal_speed);
        let plan = locomotion::plan_locomotion(
            sample.move_axes,
            sample.sprint_held,
            &frame,
            measured_speed,
            &self.config,
            dt,
        );
        self.state.current_horizontal_speed = plan.speed;

        let new_yaw = rotation::update_yaw(
            &mut self.state,
            &self.config,
            current_yaw,
            frame.yaw,
            plan.direction,
            plan.is_moving(),
            dt,
        );

        if self.config.motor_controls_look {
            if let Some(rig) = rig {
                rig.apply_look(sample.look, self.config.look_sensitivity, dt);
            }
        }

        // The single point of physical state mutation for this tick.
        let displacement = [
            plan.direction[0] * plan.speed * dt,
            self.state.vertical_velocity * dt,
            plan.direction[1] * plan.speed * dt,
        ];
        if let Some(sweep) = physics.move_character(self.character, displacement, dt) {
            physics.push_dynamic_contacts(&sweep.contacts, displacement, self.config.push_power);
        }
        physics.set_character_yaw(self.character, new_yaw);

        if jumped {
            self.jump_signal.fire();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = MotorConfig {
            rotation_smooth_time: 0.0,
            ..Default::default()
        };
        assert!(CharacterMotor::new(Uuid::new_v4(), config).is_err());
    }

    #[test]
    fn test_set_config_keeps_old_on_rejection() {
        let mut motor = CharacterMotor::new(Uuid::new_v4(), MotorConfig::default()).unwrap();
        let bad = MotorConfig {
            gravity: 5.0,
            ..Default::default()
        };
        assert!(motor.set_config(bad).is_err());
        assert!(motor.config().gravity < 0.0);
    }

    #[test]
    fn test_missing_camera_frame_uses_own_axes() {
        let mut world = PhysicsWorld::new();
        world.add_static_box([0.0, -0.5, 0.0], [100.0, 1.0, 100.0]);
        let id = Uuid::new_v4();
        world.add_character(id, [0.0, 1.05, 0.0], 0.5, 2.0);

        let config = MotorConfig {
            strafe_mode: false,
            ..Default::default()
        };
        let mut motor = CharacterMotor::new(id, config).unwrap();

        let sample = InputSample {
            move_axes: [0.0, 1.0],
            ..Default::default()
        };
        let dt = 1.0 / 60.0;
        for _ in 0..30 {
            world.update_queries();
            motor.tick(&mut world, None, &sample, None, dt);
            world.step(dt);
        }

        // Own axes at yaw 0 face -Z, so forward intent walks the capsule -Z.
        let pos = world.character_position(id).unwrap();
        assert!(pos[2] < -0.2, "Should walk along its own forward, got {:?}", pos);
        assert!(motor.current_horizontal_speed() > 1.0);
    }

    #[test]
    fn test_zero_dt_is_a_no_op() {
        let mut world = PhysicsWorld::new();
        let id = Uuid::new_v4();
        world.add_character(id, [0.0, 1.05, 0.0], 0.5, 2.0);
        let mut motor = CharacterMotor::new(id, MotorConfig::default()).unwrap();

        let before = *motor.state();
        motor.tick(&mut world, None, &InputSample::default(), None, 0.0);
        let after = *motor.state();
        assert_eq!(before.vertical_velocity, after.vertical_velocity);
        assert_eq!(before.jump_timeout_remaining, after.jump_timeout_remaining);
    }
}
