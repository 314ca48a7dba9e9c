use avian3d::prelude::*;
use bevy::{camera::visibility::RenderLayers, prelude::*};

use crate::{
    interactable::{Dormant, GridSnap, Interactable},
    physics_controls::{PhysicsMaterialPreset, PhysicsMaterialTag, RotationLocked, paused_body},
    viewer::PREVIEW_LAYER,
};

pub struct PropsPlugin;

impl Plugin for PropsPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, (spawn_environment, spawn_demo_props));
    }
}

/// Static ground slab the props rest on.
#[derive(Component)]
pub struct Ground;

pub const GROUND_SIZE: f32 = 60.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PropShape {
    Cube(f32),
    Box(Vec3),
    Sphere(f32),
    Cylinder { radius: f32, height: f32 },
}

impl PropShape {
    pub fn mesh(self) -> Mesh {
        match self {
            Self::Cube(size) => Cuboid::from_length(size).into(),
            Self::Box(size) => Cuboid::from_size(size).into(),
            Self::Sphere(radius) => Sphere::new(radius).mesh().uv(32, 18),
            Self::Cylinder { radius, height } => Cylinder::new(radius, height).into(),
        }
    }

    pub fn collider(self) -> Collider {
        match self {
            Self::Cube(size) => Collider::cuboid(size, size, size),
            Self::Box(size) => Collider::cuboid(size.x, size.y, size.z),
            Self::Sphere(radius) => Collider::sphere(radius),
            Self::Cylinder { radius, height } => Collider::cylinder(radius, height),
        }
    }
}

/// Everything needed to rebuild a prop: used for palette respawns and for
/// the viewer's clone.
#[derive(Clone, Debug)]
pub struct PropSnapshot {
    pub name: String,
    pub mesh: Handle<Mesh>,
    pub material: Handle<StandardMaterial>,
    pub rotation: Quat,
    pub scale: Vec3,
    pub collider: Collider,
    pub physics_material: usize,
    pub grid_snap: GridSnap,
    pub gravity_scale: f32,
    pub rotation_locked: bool,
}

/// Query data read by [`PropSnapshot::from_item`].
pub type PropSnapshotData = (
    &'static Name,
    &'static Mesh3d,
    &'static MeshMaterial3d<StandardMaterial>,
    &'static Transform,
    &'static Collider,
    Option<&'static PhysicsMaterialTag>,
    Option<&'static GridSnap>,
    Option<&'static GravityScale>,
    Has<RotationLocked>,
);

impl PropSnapshot {
    pub fn from_item(
        (name, mesh, material, transform, collider, tag, snap, gravity, locked): (
            &Name,
            &Mesh3d,
            &MeshMaterial3d<StandardMaterial>,
            &Transform,
            &Collider,
            Option<&PhysicsMaterialTag>,
            Option<&GridSnap>,
            Option<&GravityScale>,
            bool,
        ),
    ) -> Self {
        Self {
            name: name.as_str().to_owned(),
            mesh: mesh.0.clone(),
            material: material.0.clone(),
            rotation: transform.rotation,
            scale: transform.scale,
            collider: collider.clone(),
            physics_material: tag.map(|t| t.0).unwrap_or_default(),
            grid_snap: snap.copied().unwrap_or_default(),
            gravity_scale: gravity.map(|g| g.0).unwrap_or(1.0),
            rotation_locked: locked,
        }
    }

    /// Bundle for a fresh, fully simulated copy of the prop.
    pub fn live_bundle(&self, name: String, transform: Transform, paused: bool) -> impl Bundle {
        let preset = PhysicsMaterialPreset::get_or_default(self.physics_material);
        let locked_axes = if self.rotation_locked {
            LockedAxes::ROTATION_LOCKED
        } else {
            LockedAxes::new()
        };
        (
            (
                Name::new(name),
                Interactable,
                self.grid_snap,
                Mesh3d(self.mesh.clone()),
                MeshMaterial3d(self.material.clone()),
                transform.with_scale(self.scale),
            ),
            (
                paused_body(paused),
                self.collider.clone(),
                preset.friction(),
                preset.restitution(),
                PhysicsMaterialTag(self.physics_material),
                GravityScale(self.gravity_scale),
                locked_axes,
            ),
        )
    }

    /// Visual-only copy on the preview render layer.
    pub fn preview_bundle(&self, translation: Vec3) -> impl Bundle {
        (
            Name::new(format!("{} (Preview)", self.name)),
            Mesh3d(self.mesh.clone()),
            MeshMaterial3d(self.material.clone()),
            Transform::from_translation(translation)
                .with_rotation(self.rotation)
                .with_scale(self.scale),
            RenderLayers::layer(PREVIEW_LAYER),
        )
    }
}

/// Spawn a new prop from a shape recipe.
pub fn spawn_prop(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    material: Handle<StandardMaterial>,
    name: &str,
    shape: PropShape,
    transform: Transform,
) -> Entity {
    let preset = PhysicsMaterialPreset::get_or_default(0);
    commands
        .spawn((
            Name::new(name.to_owned()),
            Interactable,
            GridSnap(false),
            Mesh3d(meshes.add(shape.mesh())),
            MeshMaterial3d(material),
            transform,
            RigidBody::Dynamic,
            shape.collider(),
            preset.friction(),
            preset.restitution(),
            PhysicsMaterialTag(0),
            GravityScale(1.0),
        ))
        .id()
}

fn spawn_environment(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.spawn((
        Name::new("Ground"),
        Ground,
        Mesh3d(meshes.add(Cuboid::new(GROUND_SIZE, 1.0, GROUND_SIZE))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.32, 0.34, 0.3),
            perceptual_roughness: 0.9,
            ..default()
        })),
        Transform::from_xyz(0.0, -0.5, 0.0),
        RigidBody::Static,
        Collider::cuboid(GROUND_SIZE, 1.0, GROUND_SIZE),
    ));

    // Lights both the scene and the preview layer.
    commands.spawn((
        Name::new("Sun"),
        DirectionalLight {
            illuminance: 8000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(8.0, 16.0, 6.0).looking_at(Vec3::ZERO, Vec3::Y),
        RenderLayers::from_layers(&[0, PREVIEW_LAYER]),
    ));
}

const DEMO_PROPS: [(&str, PropShape, Color, Vec3); 7] = [
    ("Red Crate", PropShape::Cube(1.0), Color::srgb(0.8, 0.2, 0.2), Vec3::new(-3.0, 0.5, 0.0)),
    ("Blue Crate", PropShape::Cube(1.0), Color::srgb(0.2, 0.35, 0.85), Vec3::new(-3.0, 1.6, 0.0)),
    ("Ball", PropShape::Sphere(0.5), Color::srgb(0.95, 0.75, 0.2), Vec3::new(0.0, 0.5, -2.0)),
    (
        "Barrel",
        PropShape::Cylinder { radius: 0.4, height: 1.2 },
        Color::srgb(0.45, 0.3, 0.18),
        Vec3::new(2.5, 0.6, -1.0),
    ),
    (
        "Plank",
        PropShape::Box(Vec3::new(3.0, 0.15, 0.5)),
        Color::srgb(0.7, 0.55, 0.35),
        Vec3::new(1.0, 0.1, 2.0),
    ),
    ("Small Cube", PropShape::Cube(0.5), Color::srgb(0.3, 0.75, 0.35), Vec3::new(4.0, 0.25, 1.5)),
    (
        "Pillar",
        PropShape::Box(Vec3::new(0.6, 2.0, 0.6)),
        Color::srgb(0.85, 0.85, 0.85),
        Vec3::new(-5.0, 1.0, -3.0),
    ),
];

pub fn spawn_demo_props(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    for (name, shape, color, position) in DEMO_PROPS {
        let material = materials.add(StandardMaterial {
            base_color: color,
            perceptual_roughness: 0.6,
            ..default()
        });
        spawn_prop(
            &mut commands,
            &mut meshes,
            material,
            name,
            shape,
            Transform::from_translation(position),
        );
    }
    info!("Spawned {} demo props", DEMO_PROPS.len());
}

/// Despawn every prop, including dormant ones, and rebuild the demo set.
pub fn reset_props(world: &mut World) {
    despawn_props(world);
    if let Err(err) = world.run_system_cached(spawn_demo_props) {
        warn!("Failed to respawn demo props: {err}");
    }
}

fn despawn_props(world: &mut World) {
    let props: Vec<Entity> = world
        .query_filtered::<Entity, With<Interactable>>()
        .iter(world)
        .collect();
    for entity in props {
        if let Ok(ec) = world.get_entity_mut(entity) {
            ec.despawn();
        }
    }
}
