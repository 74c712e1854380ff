//! Animator-facing plumbing: a driver that derives animation parameters
//! from published motor state after each tick, and a relay that forwards
//! animation events to registered listeners.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::events::ConnectionId;
use super::motor::CharacterMotor;

/// Vertical speed below which an airborne character reads as free-falling
const FREE_FALL_SPEED: f32 = -0.1;

/// Parameter block an animator would consume each frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnimationParams {
    pub speed: f32,
    pub grounded: bool,
    pub free_fall: bool,
    /// One-tick trigger, set on the tick a jump was initiated
    pub jump: bool,
}

/// Events surfaced to animation listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationEvent {
    Land,
    Footstep,
}

/// Forwards animation events to registered listeners so clip-embedded
/// notifications always have a receiver.
pub struct AnimationEventRelay {
    next_id: ConnectionId,
    listeners: Vec<(ConnectionId, Box<dyn FnMut(AnimationEvent) + Send + Sync>)>,
}

impl AnimationEventRelay {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            listeners: Vec::new(),
        }
    }

    pub fn connect(
        &mut self,
        listener: impl FnMut(AnimationEvent) + Send + Sync + 'static,
    ) -> ConnectionId {
        let id = self.next_id;
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn disconnect(&mut self, id: ConnectionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    pub fn fire(&mut self, event: AnimationEvent) {
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
    }
}

impl Default for AnimationEventRelay {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads published motor state after each tick and turns it into animator
/// parameters. Decoupled: it never drives the motor, only observes it.
pub struct AnimationDriver {
    params: AnimationParams,
    prev_grounded: bool,
    jump_flag: Arc<AtomicBool>,
    relay: AnimationEventRelay,
}

impl AnimationDriver {
    pub fn new() -> Self {
        Self {
            params: AnimationParams::default(),
            prev_grounded: false,
            jump_flag: Arc::new(AtomicBool::new(false)),
            relay: AnimationEventRelay::new(),
        }
    }

    /// Subscribes to the motor's jump signal so the jump trigger latches
    /// even though the driver only runs after integration.
    pub fn attach(&self, motor: &mut CharacterMotor) -> ConnectionId {
        let flag = Arc::clone(&self.jump_flag);
        motor.on_jump().connect(move || {
            flag.store(true, Ordering::SeqCst);
        })
    }

    /// Refreshes parameters from the motor's published state. Fires a
    /// `Land` event through the relay on the airborne-to-grounded edge.
    pub fn update(&mut self, motor: &CharacterMotor) {
        let grounded = motor.grounded();
        self.params = AnimationParams {
            speed: motor.current_horizontal_speed(),
            grounded,
            free_fall: !grounded && motor.vertical_velocity() < FREE_FALL_SPEED,
            jump: self.jump_flag.swap(false, Ordering::SeqCst),
        };

        if grounded && !self.prev_grounded {
            self.relay.fire(AnimationEvent::Land);
        }
        self.prev_grounded = grounded;
    }

    pub fn params(&self) -> AnimationParams {
        self.params
    }

    pub fn events_mut(&mut self) -> &mut AnimationEventRelay {
        &mut self.relay
    }
}

impl Default for AnimationDriver {
    fn default() -> Self {
        Self::new()
    }
}
