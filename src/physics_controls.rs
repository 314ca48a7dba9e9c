use avian3d::prelude::*;
use bevy::{ecs::system::SystemState, prelude::*};

use crate::{
    SandboxSet,
    interactable::{Interactable, PropColliders},
};

pub struct PhysicsControlsPlugin;

impl Plugin for PhysicsControlsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TimePause>()
            .add_systems(Update, enforce_time_pause.in_set(SandboxSet::Props));
    }
}

/// Fake pause: while set, every prop is held kinematic instead of the
/// physics clock stopping.
#[derive(Resource, Default, Debug)]
pub struct TimePause {
    pub paused: bool,
}

impl TimePause {
    pub fn toggle(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }
}

/// Freezes rotation of a prop's rigid body.
#[derive(Component)]
pub struct RotationLocked;

/// Index into [`PHYSICS_MATERIALS`] of the preset last applied to a prop.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhysicsMaterialTag(pub usize);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhysicsMaterialPreset {
    pub name: &'static str,
    pub friction: f32,
    pub restitution: f32,
}

pub const PHYSICS_MATERIALS: [PhysicsMaterialPreset; 5] = [
    PhysicsMaterialPreset { name: "Default", friction: 0.5, restitution: 0.0 },
    PhysicsMaterialPreset { name: "Ice", friction: 0.02, restitution: 0.05 },
    PhysicsMaterialPreset { name: "Rubber", friction: 0.9, restitution: 0.8 },
    PhysicsMaterialPreset { name: "Metal", friction: 0.35, restitution: 0.15 },
    PhysicsMaterialPreset { name: "Wood", friction: 0.6, restitution: 0.3 },
];

impl PhysicsMaterialPreset {
    pub fn get(index: usize) -> Option<&'static Self> {
        PHYSICS_MATERIALS.get(index)
    }

    pub fn get_or_default(index: usize) -> &'static Self {
        Self::get(index).unwrap_or(&PHYSICS_MATERIALS[0])
    }

    pub fn friction(&self) -> Friction {
        Friction::new(self.friction)
    }

    pub fn restitution(&self) -> Restitution {
        Restitution::new(self.restitution)
    }
}

/// Body type a prop should have under the current pause state.
pub fn paused_body(paused: bool) -> RigidBody {
    if paused {
        RigidBody::Kinematic
    } else {
        RigidBody::Dynamic
    }
}

fn enforce_time_pause(
    pause: Res<TimePause>,
    mut bodies: Query<
        (&mut RigidBody, Option<&mut LinearVelocity>, Option<&mut AngularVelocity>),
        With<Interactable>,
    >,
) {
    let wanted = paused_body(pause.paused);
    for (mut body, linear, angular) in &mut bodies {
        if *body != wanted {
            *body = wanted;
        }
        if !pause.paused {
            continue;
        }
        // Kinematic bodies keep their velocity, so a frozen prop must also stop.
        if let Some(mut linear) = linear {
            if linear.0 != Vec3::ZERO {
                linear.0 = Vec3::ZERO;
            }
        }
        if let Some(mut angular) = angular {
            if angular.0 != Vec3::ZERO {
                angular.0 = Vec3::ZERO;
            }
        }
    }
}

/// Apply a physics material preset to every collider of a prop. Returns the
/// preset name, or `None` for an unknown index.
pub fn apply_physics_material(world: &mut World, entity: Entity, index: usize) -> Option<&'static str> {
    let Some(preset) = PhysicsMaterialPreset::get(index) else {
        warn!("Invalid physics material selection: {index}");
        return None;
    };

    let mut state: SystemState<PropColliders> = SystemState::new(world);
    let colliders = state.get(world).of(entity);
    for collider in colliders {
        world
            .entity_mut(collider)
            .insert((preset.friction(), preset.restitution()));
    }
    world.entity_mut(entity).insert(PhysicsMaterialTag(index));
    Some(preset.name)
}

/// Flip gravity for a prop. Returns whether gravity is now enabled.
pub fn toggle_gravity(world: &mut World, entity: Entity) -> bool {
    let enabled = world
        .get::<GravityScale>(entity)
        .map(|scale| scale.0 != 0.0)
        .unwrap_or(true);
    let scale = if enabled { 0.0 } else { 1.0 };
    world.entity_mut(entity).insert(GravityScale(scale));
    !enabled
}

/// Flip the rotation lock of a prop. Returns whether rotation is now locked.
pub fn toggle_rotation_lock(world: &mut World, entity: Entity) -> bool {
    let mut ec = world.entity_mut(entity);
    if ec.contains::<RotationLocked>() {
        ec.remove::<RotationLocked>().insert(LockedAxes::new());
        false
    } else {
        ec.insert((RotationLocked, LockedAxes::ROTATION_LOCKED));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::RunSystemOnce;

    #[test]
    fn pause_forces_kinematic_and_back() {
        let mut world = World::new();
        world.init_resource::<TimePause>();
        let props: Vec<Entity> = (0..3)
            .map(|_| world.spawn((Interactable, RigidBody::Dynamic)).id())
            .collect();
        let ground = world.spawn(RigidBody::Static).id();

        world.resource_mut::<TimePause>().toggle();
        world.run_system_once(enforce_time_pause).unwrap();
        for &prop in &props {
            assert_eq!(*world.get::<RigidBody>(prop).unwrap(), RigidBody::Kinematic);
        }
        assert_eq!(*world.get::<RigidBody>(ground).unwrap(), RigidBody::Static);

        world.resource_mut::<TimePause>().toggle();
        world.run_system_once(enforce_time_pause).unwrap();
        for &prop in &props {
            assert_eq!(*world.get::<RigidBody>(prop).unwrap(), RigidBody::Dynamic);
        }
    }

    #[test]
    fn pause_stops_moving_props() {
        let mut world = World::new();
        world.insert_resource(TimePause { paused: true });
        let prop = world
            .spawn((Interactable, RigidBody::Dynamic, LinearVelocity(Vec3::new(0.0, -3.0, 1.0))))
            .id();
        world.run_system_once(enforce_time_pause).unwrap();
        assert_eq!(world.get::<LinearVelocity>(prop).unwrap().0, Vec3::ZERO);
    }

    #[test]
    fn gravity_toggles_between_zero_and_one() {
        let mut world = World::new();
        let prop = world.spawn(Interactable).id();
        assert!(!toggle_gravity(&mut world, prop));
        assert_eq!(world.get::<GravityScale>(prop).unwrap().0, 0.0);
        assert!(toggle_gravity(&mut world, prop));
        assert_eq!(world.get::<GravityScale>(prop).unwrap().0, 1.0);
    }

    #[test]
    fn rotation_lock_toggles_marker() {
        let mut world = World::new();
        let prop = world.spawn(Interactable).id();
        assert!(toggle_rotation_lock(&mut world, prop));
        assert!(world.get::<RotationLocked>(prop).is_some());
        assert!(!toggle_rotation_lock(&mut world, prop));
        assert!(world.get::<RotationLocked>(prop).is_none());
    }

    #[test]
    fn unknown_physics_material_is_rejected() {
        let mut world = World::new();
        let prop = world.spawn(Interactable).id();
        assert_eq!(apply_physics_material(&mut world, prop, PHYSICS_MATERIALS.len()), None);
        assert!(world.get::<PhysicsMaterialTag>(prop).is_none());
        assert_eq!(apply_physics_material(&mut world, prop, 2), Some("Rubber"));
        assert_eq!(world.get::<PhysicsMaterialTag>(prop), Some(&PhysicsMaterialTag(2)));
    }
}
