use nalgebra::UnitQuaternion;
use rapier3d::control::{CharacterAutostep, CharacterLength, KinematicCharacterController};
use rapier3d::prelude::*;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use super::constants::physics as consts;

// Collision groups: characters never collide with each other, only with
// world geometry (static blocks and dynamic props).
const GROUP_WORLD: Group = Group::GROUP_1;     // Floors, walls, steps, props
const GROUP_CHARACTER: Group = Group::GROUP_2; // Player characters

/// Identifies one character capsule inside a `PhysicsWorld`.
pub type CharacterId = Uuid;

/// Physics-side state for one character capsule.
pub struct CharacterBody {
    pub body_handle: RigidBodyHandle,
    pub collider_handle: ColliderHandle,
    pub radius: f32,
    pub height: f32,
    /// Grounded flag reported by the most recent capsule sweep.
    pub grounded_hint: bool,
}

/// Result of one capsule sweep issued through `move_character`.
#[derive(Debug, Clone)]
pub struct CharacterSweep {
    /// Translation actually applied after collision resolution.
    pub translation: [f32; 3],
    /// Whether the sweep ended resting on walkable geometry.
    pub grounded: bool,
    /// Colliders the capsule touched while sliding.
    pub contacts: Vec<ColliderHandle>,
}

/// Wrapper around Rapier3D for the locomotion simulation: static blocks,
/// dynamic props, and kinematic character capsules driven by per-tick
/// displacement requests.
pub struct PhysicsWorld {
    pub gravity: Vector<Real>,
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub integration_parameters: IntegrationParameters,
    pub physics_pipeline: PhysicsPipeline,
    pub island_manager: IslandManager,
    pub broad_phase: DefaultBroadPhase,
    pub narrow_phase: NarrowPhase,
    pub impulse_joint_set: ImpulseJointSet,
    pub multibody_joint_set: MultibodyJointSet,
    pub ccd_solver: CCDSolver,
    pub query_pipeline: QueryPipeline,

    /// Character capsules keyed by character id
    pub characters: HashMap<CharacterId, CharacterBody>,
}

impl PhysicsWorld {
    /// Creates a new physics world with default gravity
    pub fn new() -> Self {
        Self::with_gravity(consts::DEFAULT_GRAVITY)
    }

    /// Creates a new physics world pulling dynamic bodies down at `gravity_y` m/s²
    pub fn with_gravity(gravity_y: f32) -> Self {
        Self {
            gravity: vector![0.0, -gravity_y, 0.0],
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            characters: HashMap::new(),
        }
    }

    /// Steps the physics simulation forward by dt seconds
    pub fn step(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }

    /// Refreshes the query pipeline so sweeps and probes see current geometry.
    /// Must run before character movement each tick.
    pub fn update_queries(&mut self) {
        self.query_pipeline.update(&self.collider_set);
    }

    /// Adds an immovable box (floor, wall, step) to the world
    pub fn add_static_box(&mut self, position: [f32; 3], size: [f32; 3]) -> RigidBodyHandle {
        let body = RigidBodyBuilder::fixed()
            .translation(vector![position[0], position[1], position[2]])
            .build();
        let handle = self.rigid_body_set.insert(body);

        let collider = ColliderBuilder::cuboid(size[0] / 2.0, size[1] / 2.0, size[2] / 2.0)
            .collision_groups(InteractionGroups::new(GROUP_WORLD, Group::ALL))
            .build();
        self.collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);

        handle
    }

    /// Adds a pushable dynamic box prop to the world
    pub fn add_dynamic_box(
        &mut self,
        position: [f32; 3],
        size: [f32; 3],
        density: f32,
    ) -> RigidBodyHandle {
        let body = RigidBodyBuilder::dynamic()
            .translation(vector![position[0], position[1], position[2]])
            .build();
        let handle = self.rigid_body_set.insert(body);

        let collider = ColliderBuilder::cuboid(size[0] / 2.0, size[1] / 2.0, size[2] / 2.0)
            .density(density)
            .collision_groups(InteractionGroups::new(GROUP_WORLD, Group::ALL))
            .build();
        self.collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);

        handle
    }

    /// Adds a character capsule driven by the kinematic controller.
    /// Total height = 2*half_height + 2*radius.
    pub fn add_character(
        &mut self,
        id: CharacterId,
        position: [f32; 3],
        radius: f32,
        height: f32,
    ) -> RigidBodyHandle {
        let body = RigidBodyBuilder::kinematic_position_based()
            .translation(vector![position[0], position[1], position[2]])
            .build();
        let body_handle = self.rigid_body_set.insert(body);

        let half_height = (height - 2.0 * radius).max(0.0) / 2.0;
        let collider = ColliderBuilder::capsule_y(half_height, radius)
            .collision_groups(InteractionGroups::new(GROUP_CHARACTER, GROUP_WORLD))
            .build();
        let collider_handle = self
            .collider_set
            .insert_with_parent(collider, body_handle, &mut self.rigid_body_set);

        self.characters.insert(
            id,
            CharacterBody {
                body_handle,
                collider_handle,
                radius,
                height,
                grounded_hint: false,
            },
        );

        body_handle
    }

    /// Removes a character capsule and its body
    pub fn remove_character(&mut self, id: CharacterId) -> bool {
        if let Some(state) = self.characters.remove(&id) {
            self.rigid_body_set.remove(
                state.body_handle,
                &mut self.island_manager,
                &mut self.collider_set,
                &mut self.impulse_joint_set,
                &mut self.multibody_joint_set,
                true,
            );
            true
        } else {
            false
        }
    }

    /// Gets the position of any rigid body (test and telemetry access)
    pub fn get_position(&self, handle: RigidBodyHandle) -> Option<[f32; 3]> {
        self.rigid_body_set.get(handle).map(|body| {
            let pos = body.translation();
            [pos.x, pos.y, pos.z]
        })
    }

    /// Gets the current position of a character (capsule center)
    pub fn character_position(&self, id: CharacterId) -> Option<[f32; 3]> {
        let state = self.characters.get(&id)?;
        self.get_position(state.body_handle)
    }

    /// Gets the world-space position of the bottom of a character capsule
    pub fn character_feet_position(&self, id: CharacterId) -> Option<[f32; 3]> {
        let state = self.characters.get(&id)?;
        let pos = self.get_position(state.body_handle)?;
        Some([pos[0], pos[1] - state.height / 2.0, pos[2]])
    }

    /// Gets current linear velocity of a character body.
    /// Kinematic bodies report the velocity implied by their last position update.
    pub fn character_velocity(&self, id: CharacterId) -> Option<[f32; 3]> {
        let state = self.characters.get(&id)?;
        let body = self.rigid_body_set.get(state.body_handle)?;
        let vel = body.linvel();
        Some([vel.x, vel.y, vel.z])
    }

    /// Gets the facing yaw of a character body in radians
    pub fn character_yaw(&self, id: CharacterId) -> Option<f32> {
        let state = self.characters.get(&id)?;
        let body = self.rigid_body_set.get(state.body_handle)?;
        Some(yaw_from_quaternion(body.rotation()))
    }

    /// Sets the facing yaw for a character body.
    pub fn set_character_yaw(&mut self, id: CharacterId, yaw: f32) -> bool {
        let Some(state) = self.characters.get(&id) else {
            return false;
        };
        let Some(body) = self.rigid_body_set.get_mut(state.body_handle) else {
            return false;
        };
        let rot = UnitQuaternion::from_euler_angles(0.0, yaw, 0.0);
        body.set_next_kinematic_rotation(rot);
        true
    }

    /// Grounded flag from this character's most recent capsule sweep
    pub fn grounded_hint(&self, id: CharacterId) -> bool {
        self.characters
            .get(&id)
            .map(|s| s.grounded_hint)
            .unwrap_or(false)
    }

    /// Static overlap test of a sphere against world geometry in `mask`,
    /// ignoring the character's own capsule and any sensors. Used as the
    /// second, sweep-independent grounding signal.
    pub fn probe_ground_sphere(
        &self,
        id: CharacterId,
        center: [f32; 3],
        radius: f32,
        mask: Group,
    ) -> bool {
        let Some(state) = self.characters.get(&id) else {
            return false;
        };

        let probe = SharedShape::ball(radius.max(consts::EPSILON));
        let pos = Isometry::translation(center[0], center[1], center[2]);
        let filter = QueryFilter::default()
            .exclude_rigid_body(state.body_handle)
            .exclude_sensors()
            .groups(InteractionGroups::new(GROUP_CHARACTER, mask));

        let mut hit = false;
        self.query_pipeline.intersections_with_shape(
            &self.rigid_body_set,
            &self.collider_set,
            &pos,
            &*probe,
            filter,
            |_collider| {
                hit = true;
                false // first hit is enough
            },
        );
        hit
    }

    /// Moves a character using the kinematic controller for full 3D translation.
    /// Records the sweep's grounded flag as the next tick's grounded hint and
    /// returns the contacts touched while sliding.
    pub fn move_character(
        &mut self,
        id: CharacterId,
        desired_translation: [f32; 3],
        dt: f32,
    ) -> Option<CharacterSweep> {
        let state = self.characters.get(&id)?;
        let body_handle = state.body_handle;
        let collider_handle = state.collider_handle;

        let body = self.rigid_body_set.get(body_handle)?;
        let collider = self.collider_set.get(collider_handle)?;
        let shape = collider.shape();
        let current_pos = *body.position();

        let controller = KinematicCharacterController {
            // Larger offset prevents getting stuck when sliding against surfaces
            offset: CharacterLength::Absolute(0.05),
            autostep: Some(CharacterAutostep {
                max_height: CharacterLength::Absolute(consts::AUTOSTEP_MAX_HEIGHT),
                min_width: CharacterLength::Absolute(consts::AUTOSTEP_MIN_WIDTH),
                include_dynamic_bodies: true,
            }),
            max_slope_climb_angle: 45.0_f32.to_radians(),
            min_slope_slide_angle: 30.0_f32.to_radians(),
            snap_to_ground: Some(CharacterLength::Absolute(consts::SNAP_TO_GROUND)),
            ..Default::default()
        };

        let desired = vector![
            desired_translation[0],
            desired_translation[1],
            desired_translation[2]
        ];
        let filter = QueryFilter::default()
            .exclude_rigid_body(body_handle)
            .exclude_sensors()
            .groups(InteractionGroups::new(
                GROUP_WORLD,
                Group::ALL & !GROUP_CHARACTER,
            ));

        let mut contacts = Vec::new();
        let movement = controller.move_shape(
            dt,
            &self.rigid_body_set,
            &self.collider_set,
            &self.query_pipeline,
            shape,
            &current_pos,
            desired,
            filter,
            |collision| contacts.push(collision.handle),
        );

        let new_pos = current_pos.translation.vector + movement.translation;
        let body = self.rigid_body_set.get_mut(body_handle)?;
        body.set_next_kinematic_translation(new_pos);

        if let Some(state) = self.characters.get_mut(&id) {
            state.grounded_hint = movement.grounded;
        }
        Some(CharacterSweep {
            translation: [
                movement.translation.x,
                movement.translation.y,
                movement.translation.z,
            ],
            grounded: movement.grounded,
            contacts,
        })
    }

    /// Applies push impulses to dynamic bodies the capsule swept into.
    /// Skipped when the character is moving mostly downward so landing on a
    /// prop does not hammer it into the floor.
    pub fn push_dynamic_contacts(
        &mut self,
        contacts: &[ColliderHandle],
        desired_translation: [f32; 3],
        push_power: f32,
    ) {
        let [dx, dy, dz] = desired_translation;
        let len = (dx * dx + dy * dy + dz * dz).sqrt();
        if len < consts::EPSILON || push_power <= 0.0 {
            return;
        }
        let dir = [dx / len, dy / len, dz / len];
        if dir[1] < -0.3 {
            return;
        }
        let impulse = vector![dir[0] * push_power, 0.0, dir[2] * push_power];

        let mut pushed: HashSet<RigidBodyHandle> = HashSet::new();
        for &collider_handle in contacts {
            let Some(collider) = self.collider_set.get(collider_handle) else {
                continue;
            };
            let Some(parent) = collider.parent() else {
                continue;
            };
            if !pushed.insert(parent) {
                continue;
            }
            if let Some(body) = self.rigid_body_set.get_mut(parent) {
                if body.is_dynamic() {
                    body.apply_impulse(impulse, true);
                }
            }
        }
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Extracts yaw about the world Y axis from a body rotation.
fn yaw_from_quaternion(q: &UnitQuaternion<f32>) -> f32 {
    let (x, y, z, w) = (q.i, q.j, q.k, q.w);
    let siny_cosp = 2.0 * (w * y + x * z);
    let cosy_cosp = 1.0 - 2.0 * (y * y + z * z);
    siny_cosp.atan2(cosy_cosp)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_world() -> PhysicsWorld {
        let mut world = PhysicsWorld::new();
        world.add_static_box([0.0, -0.5, 0.0], [100.0, 1.0, 100.0]);
        world
    }

    #[test]
    fn test_dynamic_prop_falls() {
        let mut world = PhysicsWorld::new();
        let handle = world.add_dynamic_box([0.0, 10.0, 0.0], [1.0, 1.0, 1.0], 1.0);

        let initial = world.get_position(handle).unwrap();
        for _ in 0..10 {
            world.step(1.0 / 60.0);
        }
        let after = world.get_position(handle).unwrap();
        assert!(after[1] < initial[1], "Prop should fall under gravity");
    }

    #[test]
    fn test_character_sweep_moves_and_grounds() {
        let mut world = flat_world();
        let id = CharacterId::new_v4();
        // Capsule bottom at floor top: center at half height plus margin
        world.add_character(id, [0.0, 1.05, 0.0], 0.5, 2.0);

        let dt = 1.0 / 60.0;
        world.step(dt);
        world.update_queries();

        let sweep = world.move_character(id, [0.05, -0.02, 0.0], dt).unwrap();
        assert!(sweep.grounded, "Capsule resting on floor should be grounded");
        assert!(
            sweep.translation[0].abs() > 0.0,
            "Horizontal movement should not be suppressed when grounded"
        );
        assert!(world.grounded_hint(id));
    }

    #[test]
    fn test_probe_hits_floor_under_feet() {
        let mut world = flat_world();
        let id = CharacterId::new_v4();
        world.add_character(id, [0.0, 1.05, 0.0], 0.5, 2.0);

        world.step(1.0 / 60.0);
        world.update_queries();

        let feet = world.character_feet_position(id).unwrap();
        let probe_center = [feet[0], feet[1] - 0.2, feet[2]];
        assert!(
            world.probe_ground_sphere(id, probe_center, 0.4, GROUP_WORLD),
            "Probe just below the feet should overlap the floor"
        );

        let high_center = [feet[0], feet[1] + 5.0, feet[2]];
        assert!(
            !world.probe_ground_sphere(id, high_center, 0.4, GROUP_WORLD),
            "Probe far above the floor should miss"
        );
    }

    #[test]
    fn test_probe_ignores_own_capsule() {
        let mut world = PhysicsWorld::new();
        let id = CharacterId::new_v4();
        world.add_character(id, [0.0, 5.0, 0.0], 0.5, 2.0);

        world.step(1.0 / 60.0);
        world.update_queries();

        // Probe centered inside the capsule: nothing else to hit.
        assert!(!world.probe_ground_sphere(id, [0.0, 5.0, 0.0], 0.4, Group::ALL));
    }

    #[test]
    fn test_push_impulse_moves_dynamic_box() {
        let mut world = flat_world();
        let prop = world.add_dynamic_box([2.0, 0.5, 0.0], [1.0, 1.0, 1.0], 0.5);
        let id = CharacterId::new_v4();
        world.add_character(id, [0.0, 1.05, 0.0], 0.5, 2.0);

        let dt = 1.0 / 60.0;
        world.step(dt);
        world.update_queries();

        let start_x = world.get_position(prop).unwrap()[0];
        for _ in 0..90 {
            world.update_queries();
            let sweep = world.move_character(id, [0.04, -0.01, 0.0], dt).unwrap();
            world.push_dynamic_contacts(&sweep.contacts, [0.04, -0.01, 0.0], 2.0);
            world.step(dt);
        }
        let end_x = world.get_position(prop).unwrap()[0];
        assert!(
            end_x > start_x + 0.1,
            "Walking into the prop should push it forward, moved {}",
            end_x - start_x
        );
    }

    #[test]
    fn test_set_character_yaw_round_trip() {
        let mut world = flat_world();
        let id = CharacterId::new_v4();
        world.add_character(id, [0.0, 1.05, 0.0], 0.5, 2.0);

        assert!(world.set_character_yaw(id, 1.2));
        world.step(1.0 / 60.0);
        let yaw = world.character_yaw(id).unwrap();
        assert!((yaw - 1.2).abs() < 1e-3, "Yaw should round-trip, got {}", yaw);
    }
}
