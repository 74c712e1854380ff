//! Simulation sessions and the parallel session server.
//!
//! A `SimSession` owns one physics world plus the characters living in it
//! and advances everything with a single `tick(dt)`. The `SimServer` holds
//! many sessions and ticks them in parallel at a fixed rate; within a
//! session, sub-steps always run in the same order: input sampling, motor
//! ticks, physics step, animator reads.

pub mod animation;
pub mod camera;
pub mod constants;
pub mod events;
pub mod input;
pub mod motor;
pub mod physics;

use dashmap::DashMap;
use parking_lot::RwLock;
use rayon::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::config::{ConfigError, MotorConfig, ScenarioConfig, ScenarioError};
use animation::AnimationDriver;
use camera::CameraSwitcher;
use input::{InputSample, InputSource, ScriptedInput};
use motor::CharacterMotor;
use physics::{CharacterId, PhysicsWorld};

/// Handle to a session behind its tick lock
pub type SessionHandle = Arc<RwLock<SimSession>>;

/// One simulated character: motor, input source, camera rigs, and the
/// animator-facing driver.
pub struct Character {
    pub motor: CharacterMotor,
    pub input: Option<Box<dyn InputSource>>,
    pub cameras: CameraSwitcher,
    pub animation: AnimationDriver,
    /// Control-authority gate: remote characters are present in the world
    /// but their motors are never ticked here.
    pub locally_controlled: bool,
    prev_toggle_view: bool,
}

impl Character {
    pub fn id(&self) -> CharacterId {
        self.motor.character()
    }
}

/// Read-only per-character snapshot emitted after a tick completes.
#[derive(Debug, Clone, Serialize)]
pub struct CharacterTelemetry {
    pub character: Uuid,
    pub tick: u64,
    pub position: [f32; 3],
    pub yaw: f32,
    pub grounded: bool,
    pub horizontal_speed: f32,
    pub vertical_velocity: f32,
}

/// One physics world and the characters simulated inside it.
pub struct SimSession {
    pub id: Uuid,
    pub physics: PhysicsWorld,
    pub characters: Vec<Character>,
    pub tick_count: u64,
}

impl SimSession {
    pub fn new() -> Self {
        Self::with_gravity(constants::physics::DEFAULT_GRAVITY)
    }

    pub fn with_gravity(gravity: f32) -> Self {
        Self {
            id: Uuid::new_v4(),
            physics: PhysicsWorld::with_gravity(gravity),
            characters: Vec::new(),
            tick_count: 0,
        }
    }

    /// Builds a session from a validated scenario: world geometry, props,
    /// then characters with their scripted input timelines.
    pub fn from_scenario(scenario: &ScenarioConfig) -> Result<Self, ScenarioError> {
        let mut session = Self::with_gravity(scenario.world.gravity);
        for block in &scenario.world.blocks {
            session.physics.add_static_box(block.position, block.size);
        }
        for prop in &scenario.world.props {
            session
                .physics
                .add_dynamic_box(prop.position, prop.size, prop.density);
        }
        for character in &scenario.characters {
            let input: Option<Box<dyn InputSource>> = if character.input.is_empty() {
                None
            } else {
                Some(Box::new(ScriptedInput::from_segments(&character.input)))
            };
            session
                .spawn_character(
                    character.spawn,
                    character.radius,
                    character.height,
                    character.motor,
                    input,
                    character.locally_controlled,
                )
                .map_err(ScenarioError::Invalid)?;
        }
        Ok(session)
    }

    /// Adds a character capsule and its motor to the session.
    pub fn spawn_character(
        &mut self,
        position: [f32; 3],
        radius: f32,
        height: f32,
        config: MotorConfig,
        input: Option<Box<dyn InputSource>>,
        locally_controlled: bool,
    ) -> Result<CharacterId, ConfigError> {
        let id = Uuid::new_v4();
        let mut motor = CharacterMotor::new(id, config)?;
        self.physics.add_character(id, position, radius, height);

        let animation = AnimationDriver::new();
        animation.attach(&mut motor);

        self.characters.push(Character {
            motor,
            input,
            cameras: CameraSwitcher::new(),
            animation,
            locally_controlled,
            prev_toggle_view: false,
        });
        Ok(id)
    }

    /// Removes a character and its physics body
    pub fn remove_character(&mut self, id: CharacterId) -> bool {
        let removed = self.physics.remove_character(id);
        self.characters.retain(|c| c.id() != id);
        removed
    }

    pub fn character(&self, id: CharacterId) -> Option<&Character> {
        self.characters.iter().find(|c| c.id() == id)
    }

    pub fn character_mut(&mut self, id: CharacterId) -> Option<&mut Character> {
        self.characters.iter_mut().find(|c| c.id() == id)
    }

    /// Advances the session by one tick.
    pub fn tick(&mut self, dt: f32) {
        self.physics.update_queries();

        let physics = &mut self.physics;
        for character in self.characters.iter_mut() {
            if !character.locally_controlled {
                continue;
            }
            let sample = match character.input.as_mut() {
                Some(source) => source.sample(dt),
                None => InputSample::default(),
            };

            if sample.toggle_view && !character.prev_toggle_view {
                character.cameras.toggle();
                character
                    .motor
                    .set_motor_controls_look(character.cameras.motor_controls_look());
            }
            character.prev_toggle_view = sample.toggle_view;

            let frame = character.cameras.frame();
            character.motor.tick(
                physics,
                Some(character.cameras.active_rig_mut()),
                &sample,
                Some(frame),
                dt,
            );
        }

        self.physics.step(dt);

        // Animator-facing reads run only after every displacement for the
        // tick has been applied.
        for character in self.characters.iter_mut() {
            character.animation.update(&character.motor);
        }

        self.tick_count += 1;
    }

    /// Snapshots every character's published state.
    pub fn telemetry(&self) -> Vec<CharacterTelemetry> {
        self.characters
            .iter()
            .map(|c| {
                let id = c.id();
                CharacterTelemetry {
                    character: id,
                    tick: self.tick_count,
                    position: self.physics.character_position(id).unwrap_or_default(),
                    yaw: self.physics.character_yaw(id).unwrap_or(0.0),
                    grounded: c.motor.grounded(),
                    horizontal_speed: c.motor.current_horizontal_speed(),
                    vertical_velocity: c.motor.vertical_velocity(),
                }
            })
            .collect()
    }
}

impl Default for SimSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Owns sessions and ticks them in parallel at a fixed rate. Each session is
/// ticked under its own write lock, so all motor ticks for a given character
/// are serialized and readers never observe mid-tick state.
pub struct SimServer {
    sessions: DashMap<Uuid, SessionHandle>,
    tick_rate: u64,
}

impl SimServer {
    pub fn new(tick_rate: u64) -> Self {
        Self {
            sessions: DashMap::new(),
            tick_rate: tick_rate.max(1),
        }
    }

    pub fn insert_session(&self, session: SimSession) -> Uuid {
        let id = session.id;
        self.sessions.insert(id, Arc::new(RwLock::new(session)));
        id
    }

    pub fn session(&self, id: Uuid) -> Option<SessionHandle> {
        self.sessions.get(&id).map(|e| e.value().clone())
    }

    pub fn remove_session(&self, id: Uuid) -> bool {
        self.sessions.remove(&id).is_some()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Ticks every session once, in parallel.
    pub fn tick_all(&self, dt: f32) {
        // Collect handles to avoid holding DashMap references during
        // parallel iteration.
        let sessions: Vec<SessionHandle> = self.sessions.iter().map(|e| e.value().clone()).collect();
        sessions.par_iter().for_each(|handle| {
            handle.write().tick(dt);
        });
    }

    /// Runs the fixed-rate loop for a bounded number of ticks.
    pub fn run_for(&self, ticks: u64) {
        let tick_duration = Duration::from_millis(1000 / self.tick_rate);
        let dt = 1.0 / self.tick_rate as f32;

        for _ in 0..ticks {
            let start = Instant::now();
            self.tick_all(dt);
            let elapsed = start.elapsed();
            if elapsed < tick_duration {
                thread::sleep(tick_duration - elapsed);
            }
        }
    }
}
