//! Simulation and locomotion constants.
//! Centralizing these prevents bugs from duplicated hardcoded values.

/// Physics constants
pub mod physics {
    /// Default world gravity in m/s² (pulls dynamic props down)
    pub const DEFAULT_GRAVITY: f32 = 9.81;

    /// Fixed timestep for the simulation loop (60 Hz)
    pub const TIMESTEP: f32 = 1.0 / 60.0;

    /// Character capsule radius
    pub const CHARACTER_RADIUS: f32 = 0.5;

    /// Character capsule total height
    pub const CHARACTER_HEIGHT: f32 = 2.0;

    /// Character controller autostep max height
    pub const AUTOSTEP_MAX_HEIGHT: f32 = 0.5;

    /// Character controller autostep min width (very small for platform edges)
    pub const AUTOSTEP_MIN_WIDTH: f32 = 0.01;

    /// Character controller snap to ground distance
    pub const SNAP_TO_GROUND: f32 = 0.2;

    /// Small epsilon for float comparisons
    pub const EPSILON: f32 = 0.001;
}

/// Locomotion motor defaults and limits
pub mod motor {
    /// Walk speed in m/s
    pub const DEFAULT_MOVE_SPEED: f32 = 2.0;

    /// Sprint speed in m/s
    pub const DEFAULT_SPRINT_SPEED: f32 = 5.335;

    /// Yaw smoothing time in seconds
    pub const DEFAULT_ROTATION_SMOOTH_TIME: f32 = 0.12;

    /// Horizontal acceleration/deceleration rate (per second)
    pub const DEFAULT_SPEED_CHANGE_RATE: f32 = 10.0;

    /// Jump apex height in meters
    pub const DEFAULT_JUMP_HEIGHT: f32 = 1.1;

    /// Vertical acceleration in m/s² (negative, pulls down)
    pub const DEFAULT_GRAVITY: f32 = -25.0;

    /// Cooldown before another jump can be consumed while grounded
    pub const DEFAULT_JUMP_TIMEOUT: f32 = 0.1;

    /// Delay before an airborne character counts as free-falling
    pub const DEFAULT_FALL_TIMEOUT: f32 = 0.08;

    /// Ground probe sphere offset below the capsule bottom
    pub const DEFAULT_GROUNDED_PROBE_OFFSET: f32 = -0.2;

    /// Ground probe sphere radius
    pub const DEFAULT_GROUNDED_PROBE_RADIUS: f32 = 0.4;

    /// Look input to pivot rotation scale
    pub const DEFAULT_LOOK_SENSITIVITY: f32 = 1.0;

    /// Impulse scale applied to dynamic bodies the capsule sweeps into
    pub const DEFAULT_PUSH_POWER: f32 = 2.0;

    /// Downward speed magnitude cap during long falls
    pub const TERMINAL_VELOCITY: f32 = 53.0;

    /// Small negative velocity keeping the capsule pressed onto the ground
    pub const GROUND_STICK_VELOCITY: f32 = -2.0;

    /// Squared move input magnitude below which intent counts as idle
    pub const MOVE_DEADZONE_SQ: f32 = 0.01;

    /// Speed gap under which smoothing snaps straight to the target
    pub const SPEED_SNAP_THRESHOLD: f32 = 0.1;
}
