use avian3d::prelude::*;
use bevy::{camera::primitives::Aabb, ecs::system::SystemParam, prelude::*};

use crate::{
    SandboxSet,
    selection::{Selected, Selection},
    settings::SandboxSettings,
};

pub struct InteractablePlugin;

impl Plugin for InteractablePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_highlight_materials)
            .add_systems(
                Update,
                (despawn_fallen, snap_to_grid, sync_highlight_fill, draw_highlight_outlines)
                    .chain()
                    .in_set(SandboxSet::Props),
            );
    }
}

/// A prop the player can look at, select and manipulate.
#[derive(Component, Default)]
pub struct Interactable;

/// Transient hover marker: the prop is under the aim ray but not selected.
#[derive(Component)]
pub struct BeingViewed;

/// When enabled, the prop's position is rounded to whole units once it settles.
#[derive(Component, Default, Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridSnap(pub bool);

impl GridSnap {
    pub fn toggle(&mut self) -> bool {
        self.0 = !self.0;
        self.0
    }
}

/// Deactivated prop: hidden and removed from physics, but kept alive so
/// palette entries stay valid.
#[derive(Component)]
pub struct Dormant;

/// Translucent overlay child drawn over a highlighted prop.
#[derive(Component)]
pub struct HighlightFill;

pub const SELECTED_COLOR: Color = Color::srgb(0.2, 0.9, 0.3);
pub const VIEWED_COLOR: Color = Color::srgb(1.0, 0.85, 0.2);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Highlight {
    Selected,
    Viewed,
}

impl Highlight {
    /// Selection wins over hover; neither flag means no highlight.
    pub fn from_flags(selected: bool, viewed: bool) -> Option<Self> {
        match (selected, viewed) {
            (true, _) => Some(Self::Selected),
            (false, true) => Some(Self::Viewed),
            (false, false) => None,
        }
    }

    pub fn color(self) -> Color {
        match self {
            Self::Selected => SELECTED_COLOR,
            Self::Viewed => VIEWED_COLOR,
        }
    }
}

#[derive(Resource)]
pub struct HighlightMaterials {
    pub selected: Handle<StandardMaterial>,
    pub viewed: Handle<StandardMaterial>,
}

impl HighlightMaterials {
    fn get(&self, highlight: Highlight) -> &Handle<StandardMaterial> {
        match highlight {
            Highlight::Selected => &self.selected,
            Highlight::Viewed => &self.viewed,
        }
    }
}

/// Rounded position for a settled prop, or `None` when the prop is still
/// moving or already on the grid.
pub fn snapped_position(position: Vec3, speed: f32, threshold: f32) -> Option<Vec3> {
    if speed >= threshold {
        return None;
    }
    let rounded = position.round();
    (rounded != position).then_some(rounded)
}

/// Collider entities belonging to a prop: the prop itself and any descendant
/// carrying a `Collider`.
#[derive(SystemParam)]
pub struct PropColliders<'w, 's> {
    colliders: Query<'w, 's, (), With<Collider>>,
    children: Query<'w, 's, &'static Children>,
}

impl PropColliders<'_, '_> {
    pub fn of(&self, entity: Entity) -> Vec<Entity> {
        std::iter::once(entity)
            .chain(self.children.iter_descendants(entity))
            .filter(|e| self.colliders.contains(*e))
            .collect()
    }
}

/// Enable or disable every collider of a prop.
pub fn set_collision(commands: &mut Commands, colliders: &[Entity], enabled: bool) {
    for &collider in colliders {
        let Ok(mut ec) = commands.get_entity(collider) else {
            continue;
        };
        if enabled {
            ec.remove::<ColliderDisabled>();
        } else {
            ec.insert(ColliderDisabled);
        }
    }
}

/// Hide a prop and take it out of the simulation without despawning it.
pub fn deactivate(commands: &mut Commands, entity: Entity, colliders: &[Entity]) {
    let Ok(mut ec) = commands.get_entity(entity) else {
        return;
    };
    ec.remove::<BeingViewed>().insert((
        Dormant,
        Visibility::Hidden,
        RigidBodyDisabled,
        LinearVelocity::ZERO,
        AngularVelocity::ZERO,
    ));
    set_collision(commands, colliders, false);
}

/// Despawn the highlight-fill child of a prop, if any. The highlight system
/// adds it back on the next tick while the prop stays highlighted.
pub fn remove_highlight_fill(world: &mut World, entity: Entity) {
    let Some(children) = world.get::<Children>(entity).map(|c| c.to_vec()) else {
        return;
    };
    for child in children {
        if world.get::<HighlightFill>(child).is_some() {
            world.entity_mut(child).despawn();
        }
    }
}

fn setup_highlight_materials(mut commands: Commands, mut materials: ResMut<Assets<StandardMaterial>>) {
    let fill = |color: Color| StandardMaterial {
        base_color: color.with_alpha(0.25),
        alpha_mode: AlphaMode::Blend,
        unlit: true,
        ..default()
    };
    commands.insert_resource(HighlightMaterials {
        selected: materials.add(fill(SELECTED_COLOR)),
        viewed: materials.add(fill(VIEWED_COLOR)),
    });
}

fn despawn_fallen(
    mut commands: Commands,
    settings: Res<SandboxSettings>,
    mut selection: ResMut<Selection>,
    props: Query<(Entity, &Transform), (With<Interactable>, Without<Dormant>)>,
    colliders: PropColliders,
) {
    for (entity, transform) in &props {
        if transform.translation.y >= settings.fall_floor_y {
            continue;
        }
        debug!("{entity} fell below {}, deactivating", settings.fall_floor_y);
        deactivate(&mut commands, entity, &colliders.of(entity));
        if selection.is_selected(entity) {
            selection.clear(&mut commands);
        }
    }
}

fn snap_to_grid(
    settings: Res<SandboxSettings>,
    mut props: Query<
        (&GridSnap, &mut Transform, Option<&LinearVelocity>),
        (With<Interactable>, Without<Dormant>),
    >,
) {
    for (snap, mut transform, velocity) in &mut props {
        if !snap.0 {
            continue;
        }
        let speed = velocity.map(|v| v.0.length()).unwrap_or(0.0);
        if let Some(snapped) =
            snapped_position(transform.translation, speed, settings.snap_speed_threshold)
        {
            transform.translation = snapped;
        }
    }
}

fn sync_highlight_fill(
    mut commands: Commands,
    materials: Option<Res<HighlightMaterials>>,
    props: Query<
        (Entity, Has<Selected>, Has<BeingViewed>, &Mesh3d, Option<&Children>),
        (With<Interactable>, Without<Dormant>),
    >,
    mut fills: Query<&mut MeshMaterial3d<StandardMaterial>, With<HighlightFill>>,
) {
    let Some(materials) = materials else {
        return;
    };

    for (entity, selected, viewed, mesh, children) in &props {
        let wanted = Highlight::from_flags(selected, viewed);
        let existing = children
            .into_iter()
            .flat_map(|c| c.iter())
            .find(|child| fills.contains(*child));

        match (wanted, existing) {
            (None, Some(fill)) => {
                commands.entity(fill).try_despawn();
            }
            (Some(highlight), Some(fill)) => {
                if let Ok(mut material) = fills.get_mut(fill) {
                    let handle = materials.get(highlight);
                    if material.0 != *handle {
                        material.0 = handle.clone();
                    }
                }
            }
            (Some(highlight), None) => {
                commands.spawn((
                    HighlightFill,
                    Mesh3d(mesh.0.clone()),
                    MeshMaterial3d(materials.get(highlight).clone()),
                    Transform::from_scale(Vec3::splat(1.02)),
                    ChildOf(entity),
                ));
            }
            (None, None) => {}
        }
    }
}

/// Wireframe outline around highlighted props.
fn draw_highlight_outlines(
    mut gizmos: Gizmos,
    props: Query<
        (&GlobalTransform, Option<&Aabb>, Has<Selected>, Has<BeingViewed>),
        (With<Interactable>, Without<Dormant>),
    >,
) {
    for (global_tf, aabb, selected, viewed) in &props {
        let Some(highlight) = Highlight::from_flags(selected, viewed) else {
            continue;
        };
        let computed = global_tf.compute_transform();
        let (center, half) = match aabb {
            Some(aabb) => (
                computed.translation
                    + computed.rotation * (Vec3::from(aabb.center) * computed.scale),
                Vec3::from(aabb.half_extents) * computed.scale * 1.02,
            ),
            None => (computed.translation, computed.scale * 0.5),
        };
        draw_wireframe_box(&mut gizmos, center, half, computed.rotation, highlight.color());
    }
}

fn draw_wireframe_box(gizmos: &mut Gizmos, center: Vec3, half: Vec3, rotation: Quat, color: Color) {
    let corner = |x: f32, y: f32, z: f32| center + rotation * (half * Vec3::new(x, y, z));
    let corners = [
        corner(-1.0, -1.0, -1.0),
        corner(1.0, -1.0, -1.0),
        corner(1.0, 1.0, -1.0),
        corner(-1.0, 1.0, -1.0),
        corner(-1.0, -1.0, 1.0),
        corner(1.0, -1.0, 1.0),
        corner(1.0, 1.0, 1.0),
        corner(-1.0, 1.0, 1.0),
    ];
    for i in 0..4 {
        gizmos.line(corners[i], corners[(i + 1) % 4], color);
        gizmos.line(corners[i + 4], corners[(i + 1) % 4 + 4], color);
        gizmos.line(corners[i], corners[i + 4], color);
    }
}
