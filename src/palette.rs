use avian3d::prelude::*;
use bevy::prelude::*;
use propbox_camera::FirstPersonView;
use propbox_widgets::list_view::{ListRow, ListRowClickEvent, list_row};

use crate::{
    SandboxSet,
    hud::StatusMessage,
    physics_controls::{RotationLocked, TimePause},
    player::Player,
    props::{PropSnapshot, PropSnapshotData},
    settings::SandboxSettings,
};

pub struct PalettePlugin;

impl Plugin for PalettePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Palette>()
            .add_systems(
                Update,
                (sync_palette_list, refresh_palette_labels).chain().in_set(SandboxSet::Ui),
            )
            .add_observer(on_palette_row_click);
    }
}

/// Props saved for respawning, in save order.
#[derive(Resource, Default, Debug)]
pub struct Palette {
    entries: Vec<Entity>,
}

impl Palette {
    /// Append `entity` unless it is absent or already saved. Returns whether
    /// the palette grew.
    pub fn save(&mut self, entity: Option<Entity>) -> bool {
        let Some(entity) = entity else {
            return false;
        };
        if self.entries.contains(&entity) {
            return false;
        }
        self.entries.push(entity);
        true
    }

    pub fn entries(&self) -> &[Entity] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<Entity> {
        self.entries.get(index).copied()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Container the palette rows are spawned into. Spawned by the panel.
#[derive(Component)]
pub struct PaletteList;

/// Row label showing the name of the saved prop.
#[derive(Component)]
pub struct PaletteEntryLabel(pub Entity);

fn entry_label(names: &Query<&Name>, entity: Entity) -> String {
    names
        .get(entity)
        .map(|name| name.as_str().to_string())
        .unwrap_or_else(|_| format!("{entity}"))
}

/// Rebuild the rows whenever their count drifts from the palette.
fn sync_palette_list(
    mut commands: Commands,
    palette: Res<Palette>,
    lists: Query<(Entity, Option<&Children>), With<PaletteList>>,
    rows: Query<(), With<ListRow>>,
    names: Query<&Name>,
) {
    for (list, children) in &lists {
        let row_count = children
            .map(|children| children.iter().filter(|child| rows.contains(*child)).count())
            .unwrap_or(0);
        if row_count == palette.entries.len() {
            continue;
        }

        commands.entity(list).despawn_related::<Children>();
        for (index, &entry) in palette.entries.iter().enumerate() {
            commands.spawn((
                list_row(index, entry_label(&names, entry), PaletteEntryLabel(entry)),
                ChildOf(list),
            ));
        }
    }
}

fn refresh_palette_labels(
    renamed: Query<(), Changed<Name>>,
    names: Query<&Name>,
    mut labels: Query<(&PaletteEntryLabel, &mut Text)>,
) {
    for (label, mut text) in &mut labels {
        if !renamed.contains(label.0) {
            continue;
        }
        let name = entry_label(&names, label.0);
        if text.0 != name {
            text.0 = name;
        }
    }
}

fn on_palette_row_click(
    trigger: On<ListRowClickEvent>,
    mut commands: Commands,
    palette: Res<Palette>,
    rows: Query<(), With<ListRow>>,
    parents: Query<&ChildOf>,
    lists: Query<(), With<PaletteList>>,
) {
    let row = trigger.event_target();
    let in_palette = rows.contains(row)
        && parents
            .get(row)
            .is_ok_and(|child_of| lists.contains(child_of.parent()));
    if !in_palette {
        return;
    }
    let Some(source) = palette.get(trigger.index) else {
        warn!("Palette row {} has no entry", trigger.index);
        return;
    };
    commands.run_system_cached_with(respawn_entry, source);
}

/// Spawn a live copy of a saved prop where the view centre meets the world.
fn respawn_entry(
    In(source): In<Entity>,
    mut commands: Commands,
    settings: Res<SandboxSettings>,
    pause: Res<TimePause>,
    spatial_query: SpatialQuery,
    views: Query<&GlobalTransform, With<FirstPersonView>>,
    players: Query<Entity, With<Player>>,
    props: Query<PropSnapshotData>,
) {
    let Ok(item) = props.get(source) else {
        warn!("Palette entry {source} is no longer a prop");
        return;
    };
    let snapshot = PropSnapshot::from_item(item);
    let Ok(view) = views.single() else {
        return;
    };

    let origin = view.translation();
    let direction = view.forward();
    let filter = SpatialQueryFilter::default().with_excluded_entities(players.iter());
    let Some(hit) = spatial_query.cast_ray(origin, direction, settings.aim_distance, true, &filter)
    else {
        warn!("No valid spawn location for {}", snapshot.name);
        commands.trigger(StatusMessage::warning("No valid spawn location found."));
        return;
    };

    let position = origin + *direction * hit.distance + Vec3::Y * settings.spawn_height_offset;
    let name = format!("{} (Copy)", snapshot.name);
    info!("Respawning {} at {position}", snapshot.name);
    let locked = snapshot.rotation_locked;
    commands
        .spawn(snapshot.live_bundle(name, Transform::from_translation(position), pause.paused))
        .insert_if(RotationLocked, || locked);
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::RunSystemOnce;
    use propbox_widgets::toast::ToastVariant;

    use crate::{
        physics_controls::{PhysicsMaterialTag, paused_body},
        testing::{StatusLog, physics_app, record_status, step},
    };

    #[test]
    fn saving_twice_keeps_one_entry() {
        let mut world = World::new();
        let a = world.spawn_empty().id();
        let b = world.spawn_empty().id();

        let mut palette = Palette::default();
        assert!(palette.save(Some(a)));
        assert!(!palette.save(Some(a)));
        assert!(palette.save(Some(b)));
        assert!(!palette.save(None));
        assert_eq!(palette.entries(), &[a, b]);
    }

    fn row_labels(world: &mut World) -> Vec<String> {
        let mut labels: Vec<(usize, String)> = world
            .query::<(&ListRow, &Children)>()
            .iter(world)
            .map(|(row, children)| (row.index, children.to_vec()))
            .collect::<Vec<_>>()
            .into_iter()
            .filter_map(|(index, children)| {
                children
                    .iter()
                    .find(|child| world.get::<PaletteEntryLabel>(**child).is_some())
                    .and_then(|child| world.get::<Text>(*child))
                    .map(|text| (index, text.0.clone()))
            })
            .collect();
        labels.sort();
        labels.into_iter().map(|(_, label)| label).collect()
    }

    #[test]
    fn list_shows_exactly_the_saved_names() {
        let mut world = World::new();
        let crate_a = world.spawn(Name::new("Crate")).id();
        let ball = world.spawn(Name::new("Ball")).id();
        world.spawn(PaletteList);

        let mut palette = Palette::default();
        palette.save(Some(crate_a));
        palette.save(Some(ball));
        world.insert_resource(palette);

        world.run_system_once(sync_palette_list).unwrap();
        assert_eq!(row_labels(&mut world), vec!["Crate", "Ball"]);

        // Counts match now, so a second pass leaves the rows alone.
        world.run_system_once(sync_palette_list).unwrap();
        assert_eq!(world.query::<&ListRow>().iter(&world).count(), 2);
    }

    #[test]
    fn renamed_entry_updates_its_row() {
        let mut world = World::new();
        let prop = world.spawn(Name::new("Crate")).id();
        world.spawn(PaletteList);
        let mut palette = Palette::default();
        palette.save(Some(prop));
        world.insert_resource(palette);
        world.run_system_once(sync_palette_list).unwrap();

        world.entity_mut(prop).insert(Name::new("Big Crate"));
        world.run_system_once(refresh_palette_labels).unwrap();
        assert_eq!(row_labels(&mut world), vec!["Big Crate"]);
    }

    fn respawn_app(view: Transform) -> (App, Entity) {
        let mut app = physics_app();
        app.insert_resource(TimePause { paused: true });
        let world = app.world_mut();
        record_status(world);
        world.spawn((
            RigidBody::Static,
            Collider::cuboid(20.0, 1.0, 20.0),
            Transform::from_xyz(0.0, -0.5, 0.0),
        ));
        world.spawn((FirstPersonView, view));
        let source = world
            .spawn((
                Name::new("Crate"),
                Mesh3d(Handle::default()),
                MeshMaterial3d::<StandardMaterial>(Handle::default()),
                Transform::from_xyz(50.0, 0.5, 50.0)
                    .with_rotation(Quat::from_rotation_y(0.7))
                    .with_scale(Vec3::splat(2.0)),
                Collider::cuboid(1.0, 1.0, 1.0),
                RotationLocked,
                PhysicsMaterialTag(2),
            ))
            .id();
        step(&mut app, 3);
        (app, source)
    }

    fn copies(world: &mut World) -> Vec<Entity> {
        world
            .query::<(Entity, &Name)>()
            .iter(world)
            .filter(|(_, name)| name.as_str().ends_with("(Copy)"))
            .map(|(entity, _)| entity)
            .collect()
    }

    #[test]
    fn respawn_places_paused_copy_above_aim_point() {
        let looking_down = Transform::from_xyz(0.0, 5.0, 0.0).looking_to(Dir3::NEG_Y, Dir3::NEG_Z);
        let (mut app, source) = respawn_app(looking_down);
        let world = app.world_mut();
        let before = *world.get::<Transform>(source).unwrap();

        world.run_system_once_with(respawn_entry, source).unwrap();

        let copies = copies(world);
        assert_eq!(copies.len(), 1);
        let copy = world.entity(copies[0]);
        assert_eq!(copy.get::<Name>().unwrap().as_str(), "Crate (Copy)");
        let transform = copy.get::<Transform>().unwrap();
        assert!((transform.translation - Vec3::new(0.0, 1.0, 0.0)).length() < 1e-3);
        assert_eq!(transform.rotation, Quat::IDENTITY);
        assert_eq!(transform.scale, Vec3::splat(2.0));
        assert_eq!(copy.get::<RigidBody>(), Some(&paused_body(true)));
        assert!(copy.contains::<RotationLocked>());
        assert_eq!(copy.get::<PhysicsMaterialTag>(), Some(&PhysicsMaterialTag(2)));

        assert_eq!(*world.get::<Transform>(source).unwrap(), before);
        assert_eq!(world.get::<Name>(source).unwrap().as_str(), "Crate");
        assert!(world.resource::<StatusLog>().0.is_empty());
    }

    #[test]
    fn respawn_without_surface_warns_and_spawns_nothing() {
        let looking_up = Transform::from_xyz(0.0, 5.0, 0.0).looking_to(Dir3::Y, Dir3::Z);
        let (mut app, source) = respawn_app(looking_up);
        let world = app.world_mut();

        world.run_system_once_with(respawn_entry, source).unwrap();

        assert!(copies(world).is_empty());
        let log = &world.resource::<StatusLog>().0;
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].text, "No valid spawn location found.");
        assert_eq!(log[0].variant, ToastVariant::Warning);
    }
}
