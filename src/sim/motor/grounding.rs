use rapier3d::prelude::Group;

use super::super::physics::{CharacterId, PhysicsWorld};
use crate::config::MotorConfig;

/// Grounded decision for one tick, with both contributing signals kept for
/// diagnostics.
#[derive(Debug, Clone, Copy)]
pub struct GroundedSample {
    pub grounded: bool,
    pub sweep_hint: bool,
    pub probe_hit: bool,
}

/// Combines the capsule sweep's grounded hint with an independent sphere
/// overlap below the feet. Either signal alone grounds the character, so a
/// transient sweep miss near a ledge or step edge does not read as airborne.
/// An empty ground group mask disables the probe and the hint decides alone.
pub fn grounded_check(
    physics: &PhysicsWorld,
    character: CharacterId,
    config: &MotorConfig,
) -> GroundedSample {
    let sweep_hint = physics.grounded_hint(character);

    let mask = Group::from_bits_truncate(config.ground_group_bits);
    let probe_hit = if mask.is_empty() {
        false
    } else if let Some(feet) = physics.character_feet_position(character) {
        let center = [
            feet[0],
            feet[1] + config.grounded_probe_offset,
            feet[2],
        ];
        physics.probe_ground_sphere(character, center, config.grounded_probe_radius, mask)
    } else {
        false
    };

    GroundedSample {
        grounded: sweep_hint || probe_hit,
        sweep_hint,
        probe_hit,
    }
}
