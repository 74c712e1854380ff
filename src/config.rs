//! Motor and scenario configuration parsing from TOML files

use serde::Deserialize;
use std::path::Path;

use crate::sim::constants::{motor as motor_consts, physics as physics_consts};

/// Tuning for one character's locomotion motor. Immutable during a tick;
/// replacing it mid-run takes effect on the next tick.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct MotorConfig {
    /// Walk speed in m/s
    pub move_speed: f32,
    /// Sprint speed in m/s
    pub sprint_speed: f32,
    /// Yaw smoothing time in seconds
    pub rotation_smooth_time: f32,
    /// Horizontal acceleration/deceleration rate per second
    pub speed_change_rate: f32,
    /// Jump apex height in meters
    pub jump_height: f32,
    /// Vertical acceleration in m/s², must be negative
    pub gravity: f32,
    /// Cooldown before another jump can be consumed while grounded
    pub jump_timeout: f32,
    /// Delay before an airborne character counts as free-falling
    pub fall_timeout: f32,
    /// Ground probe sphere offset relative to the capsule bottom
    pub grounded_probe_offset: f32,
    /// Ground probe sphere radius
    pub grounded_probe_radius: f32,
    /// Collision-group bits the ground probe tests against; 0 disables it
    pub ground_group_bits: u32,
    /// Look input to pivot rotation scale
    pub look_sensitivity: f32,
    /// Face the camera yaw instead of the move direction
    pub strafe_mode: bool,
    /// Whether the motor drives the camera pivot from look input
    pub motor_controls_look: bool,
    /// Impulse scale applied to dynamic bodies the capsule sweeps into
    pub push_power: f32,
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            move_speed: motor_consts::DEFAULT_MOVE_SPEED,
            sprint_speed: motor_consts::DEFAULT_SPRINT_SPEED,
            rotation_smooth_time: motor_consts::DEFAULT_ROTATION_SMOOTH_TIME,
            speed_change_rate: motor_consts::DEFAULT_SPEED_CHANGE_RATE,
            jump_height: motor_consts::DEFAULT_JUMP_HEIGHT,
            gravity: motor_consts::DEFAULT_GRAVITY,
            jump_timeout: motor_consts::DEFAULT_JUMP_TIMEOUT,
            fall_timeout: motor_consts::DEFAULT_FALL_TIMEOUT,
            grounded_probe_offset: motor_consts::DEFAULT_GROUNDED_PROBE_OFFSET,
            grounded_probe_radius: motor_consts::DEFAULT_GROUNDED_PROBE_RADIUS,
            ground_group_bits: 1,
            look_sensitivity: motor_consts::DEFAULT_LOOK_SENSITIVITY,
            strafe_mode: true,
            motor_controls_look: true,
            push_power: motor_consts::DEFAULT_PUSH_POWER,
        }
    }
}

impl MotorConfig {
    /// Rejects misconfiguration up front so tick code never has to.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rotation_smooth_time <= 0.0 {
            return Err(ConfigError::NotPositive(
                "rotation_smooth_time",
                self.rotation_smooth_time,
            ));
        }
        if self.speed_change_rate <= 0.0 {
            return Err(ConfigError::NotPositive(
                "speed_change_rate",
                self.speed_change_rate,
            ));
        }
        if self.grounded_probe_radius <= 0.0 {
            return Err(ConfigError::NotPositive(
                "grounded_probe_radius",
                self.grounded_probe_radius,
            ));
        }
        if self.gravity >= 0.0 {
            return Err(ConfigError::GravityNotNegative(self.gravity));
        }
        for (field, value) in [
            ("move_speed", self.move_speed),
            ("sprint_speed", self.sprint_speed),
            ("jump_height", self.jump_height),
            ("jump_timeout", self.jump_timeout),
            ("fall_timeout", self.fall_timeout),
            ("look_sensitivity", self.look_sensitivity),
            ("push_power", self.push_power),
        ] {
            if value < 0.0 {
                return Err(ConfigError::Negative(field, value));
            }
        }
        Ok(())
    }
}

/// A static block of world geometry
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct BlockSetup {
    pub position: [f32; 3],
    pub size: [f32; 3],
}

/// A pushable dynamic prop
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PropSetup {
    pub position: [f32; 3],
    pub size: [f32; 3],
    #[serde(default = "default_prop_density")]
    pub density: f32,
}

fn default_prop_density() -> f32 {
    0.5
}

/// World section of a scenario
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorldSetup {
    /// World gravity magnitude pulling dynamic props down
    pub gravity: f32,
    pub blocks: Vec<BlockSetup>,
    pub props: Vec<PropSetup>,
}

impl Default for WorldSetup {
    fn default() -> Self {
        Self {
            gravity: physics_consts::DEFAULT_GRAVITY,
            blocks: Vec::new(),
            props: Vec::new(),
        }
    }
}

/// One entry in a scripted input timeline
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct InputSegmentConfig {
    /// Seconds this intent is held
    pub duration: f32,
    #[serde(default, rename = "move")]
    pub move_axes: [f32; 2],
    #[serde(default)]
    pub look: [f32; 2],
    #[serde(default)]
    pub jump: bool,
    #[serde(default)]
    pub sprint: bool,
    #[serde(default)]
    pub toggle_view: bool,
}

/// One character in a scenario
#[derive(Debug, Clone, Deserialize)]
pub struct CharacterSetup {
    pub spawn: [f32; 3],
    #[serde(default = "default_character_radius")]
    pub radius: f32,
    #[serde(default = "default_character_height")]
    pub height: f32,
    /// Whether this simulation owns the character's input and motor.
    /// Remote characters exist in the world but are never ticked locally.
    #[serde(default = "default_true")]
    pub locally_controlled: bool,
    #[serde(default)]
    pub motor: MotorConfig,
    #[serde(default)]
    pub input: Vec<InputSegmentConfig>,
}

fn default_character_radius() -> f32 {
    physics_consts::CHARACTER_RADIUS
}

fn default_character_height() -> f32 {
    physics_consts::CHARACTER_HEIGHT
}

fn default_true() -> bool {
    true
}

/// Scenario description consumed by the CLI harness and integration tests
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioConfig {
    /// Display name of the scenario
    pub name: String,
    #[serde(default)]
    pub world: WorldSetup,
    #[serde(default)]
    pub characters: Vec<CharacterSetup>,
}

impl ScenarioConfig {
    /// Load a scenario from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ScenarioError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ScenarioError::Io(path.to_path_buf(), e))?;
        let scenario: ScenarioConfig =
            toml::from_str(&content).map_err(|e| ScenarioError::Parse(path.to_path_buf(), e))?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Parse and validate a scenario from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ScenarioError> {
        let scenario: ScenarioConfig =
            toml::from_str(content).map_err(|e| ScenarioError::Parse("<inline>".into(), e))?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.world.gravity <= 0.0 {
            return Err(ScenarioError::Invalid(ConfigError::NotPositive(
                "world.gravity",
                self.world.gravity,
            )));
        }
        for character in &self.characters {
            character.motor.validate().map_err(ScenarioError::Invalid)?;
            if character.radius <= 0.0 {
                return Err(ScenarioError::Invalid(ConfigError::NotPositive(
                    "radius",
                    character.radius,
                )));
            }
            if character.height < 2.0 * character.radius {
                return Err(ScenarioError::Invalid(ConfigError::NotPositive(
                    "height",
                    character.height,
                )));
            }
            for segment in &character.input {
                if segment.duration < 0.0 {
                    return Err(ScenarioError::Invalid(ConfigError::Negative(
                        "input.duration",
                        segment.duration,
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Motor misconfiguration, caught at configuration time
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    NotPositive(&'static str, f32),
    Negative(&'static str, f32),
    GravityNotNegative(f32),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotPositive(field, value) => {
                write!(f, "{} must be positive, got {}", field, value)
            }
            ConfigError::Negative(field, value) => {
                write!(f, "{} must not be negative, got {}", field, value)
            }
            ConfigError::GravityNotNegative(value) => {
                write!(f, "gravity must be negative (pulls down), got {}", value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Errors that can occur when loading a scenario
#[derive(Debug)]
pub enum ScenarioError {
    Io(std::path::PathBuf, std::io::Error),
    Parse(std::path::PathBuf, toml::de::Error),
    Invalid(ConfigError),
}

impl std::fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScenarioError::Io(path, e) => {
                write!(f, "Failed to read {}: {}", path.display(), e)
            }
            ScenarioError::Parse(path, e) => {
                write!(f, "Failed to parse {}: {}", path.display(), e)
            }
            ScenarioError::Invalid(e) => write!(f, "Invalid scenario: {}", e),
        }
    }
}

impl std::error::Error for ScenarioError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(MotorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_smooth_time() {
        let config = MotorConfig {
            rotation_smooth_time: 0.0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::NotPositive("rotation_smooth_time", 0.0))
        );
    }

    #[test]
    fn test_validate_rejects_upward_gravity() {
        let config = MotorConfig {
            gravity: 9.81,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::GravityNotNegative(_))
        ));
    }

    #[test]
    fn test_parse_minimal_scenario() {
        let toml = r#"
            name = "flat"

            [[characters]]
            spawn = [0.0, 3.0, 0.0]
        "#;
        let scenario = ScenarioConfig::from_toml_str(toml).unwrap();
        assert_eq!(scenario.name, "flat");
        assert_eq!(scenario.characters.len(), 1);
        let character = &scenario.characters[0];
        assert!(character.locally_controlled);
        assert_eq!(character.radius, physics_consts::CHARACTER_RADIUS);
        assert_eq!(character.motor.move_speed, motor_consts::DEFAULT_MOVE_SPEED);
    }

    #[test]
    fn test_parse_full_scenario() {
        let toml = r#"
            name = "walk and jump"

            [world]
            gravity = 9.81

            [[world.blocks]]
            position = [0.0, -0.5, 0.0]
            size = [100.0, 1.0, 100.0]

            [[world.props]]
            position = [2.0, 0.5, 0.0]
            size = [1.0, 1.0, 1.0]

            [[characters]]
            spawn = [0.0, 1.1, 0.0]

            [characters.motor]
            sprint_speed = 6.0
            strafe_mode = false

            [[characters.input]]
            duration = 0.5

            [[characters.input]]
            duration = 2.0
            move = [0.0, 1.0]
            sprint = true
        "#;
        let scenario = ScenarioConfig::from_toml_str(toml).unwrap();
        assert_eq!(scenario.world.blocks.len(), 1);
        assert_eq!(scenario.world.props.len(), 1);
        let character = &scenario.characters[0];
        assert_eq!(character.motor.sprint_speed, 6.0);
        assert!(!character.motor.strafe_mode);
        assert_eq!(character.input.len(), 2);
        assert!(character.input[1].sprint);
    }

    #[test]
    fn test_scenario_rejects_invalid_motor() {
        let toml = r#"
            name = "bad"

            [[characters]]
            spawn = [0.0, 1.1, 0.0]

            [characters.motor]
            gravity = 1.0
        "#;
        assert!(matches!(
            ScenarioConfig::from_toml_str(toml),
            Err(ScenarioError::Invalid(ConfigError::GravityNotNegative(_)))
        ));
    }
}
