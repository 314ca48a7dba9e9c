use bevy::{
    camera::{RenderTarget, visibility::RenderLayers},
    image::ImageSampler,
    prelude::*,
    render::render_resource::{Extent3d, TextureDimension, TextureFormat, TextureUsages},
    ui::widget::ViewportNode,
};

use crate::{
    SandboxSet,
    props::{PropSnapshot, PropSnapshotData},
    selection::Selection,
    settings::SandboxSettings,
};

/// Render layer the preview clone and viewer camera live on.
pub const PREVIEW_LAYER: usize = 1;

/// World position of the preview stage, far away from the play area.
pub const PREVIEW_ANCHOR: Vec3 = Vec3::new(0.0, -500.0, 0.0);

pub const VIEWER_RESOLUTION: UVec2 = UVec2::new(512, 288);

pub struct ViewerPlugin;

impl Plugin for ViewerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ViewerRig>()
            .add_systems(PostStartup, setup_viewer)
            .add_systems(
                Update,
                (deactivate_when_unselected, mirror_source_scale, orbit_viewer_camera)
                    .chain()
                    .in_set(SandboxSet::Ui),
            )
            .add_observer(on_show_in_viewer);
    }
}

/// Ask the viewer to display a prop.
#[derive(Event, Clone, Copy, Debug)]
pub struct ShowInViewer {
    pub entity: Entity,
}

/// UI node the viewer image is shown in. Spawned by the panel.
#[derive(Component)]
pub struct ViewerViewport;

#[derive(Component)]
pub struct ViewerCamera;

#[derive(Component)]
pub struct PreviewClone;

#[derive(Component)]
pub struct PreviewAnchor;

#[derive(Resource, Default, Debug)]
pub struct ViewerRig {
    pub camera: Option<Entity>,
    pub anchor: Option<Entity>,
    /// Prop being previewed.
    pub source: Option<Entity>,
    pub clone: Option<Entity>,
    pub active: bool,
}

/// Camera position relative to the anchor: off to the anchor's left, far
/// enough to fit the largest axis of the prop.
pub fn initial_camera_offset(anchor_right: Vec3, scale: Vec3, multiplier: f32) -> Vec3 {
    -anchor_right * scale.max_element() * multiplier
}

fn setup_viewer(
    mut commands: Commands,
    mut images: ResMut<Assets<Image>>,
    mut rig: ResMut<ViewerRig>,
    viewports: Query<Entity, With<ViewerViewport>>,
) {
    let size = Extent3d {
        width: VIEWER_RESOLUTION.x,
        height: VIEWER_RESOLUTION.y,
        depth_or_array_layers: 1,
    };
    let mut image = Image::new_fill(
        size,
        TextureDimension::D2,
        &[0, 0, 0, 255],
        TextureFormat::Bgra8UnormSrgb,
        default(),
    );
    image.texture_descriptor.usage =
        TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST | TextureUsages::RENDER_ATTACHMENT;
    image.sampler = ImageSampler::linear();
    let handle = images.add(image);

    let anchor = commands
        .spawn((
            Name::new("Preview Anchor"),
            PreviewAnchor,
            Transform::from_translation(PREVIEW_ANCHOR),
        ))
        .id();

    let camera = commands
        .spawn((
            Name::new("Viewer Camera"),
            ViewerCamera,
            Camera3d::default(),
            Camera {
                is_active: false,
                order: -1,
                clear_color: ClearColorConfig::Custom(Color::srgb(0.12, 0.12, 0.14)),
                ..default()
            },
            RenderTarget::Image(handle.into()),
            Transform::from_translation(PREVIEW_ANCHOR + Vec3::new(-2.0, 0.0, 0.0))
                .looking_at(PREVIEW_ANCHOR, Vec3::Y),
            RenderLayers::layer(PREVIEW_LAYER),
        ))
        .id();

    rig.camera = Some(camera);
    rig.anchor = Some(anchor);

    let Ok(viewport) = viewports.single() else {
        warn!("Viewer has no display surface; previews will not be visible");
        return;
    };
    commands.entity(viewport).insert(ViewportNode::new(camera));
}

fn on_show_in_viewer(trigger: On<ShowInViewer>, mut commands: Commands) {
    commands.run_system_cached_with(show_entity, trigger.entity);
}

fn show_entity(
    In(source): In<Entity>,
    mut commands: Commands,
    settings: Res<SandboxSettings>,
    mut rig: ResMut<ViewerRig>,
    props: Query<PropSnapshotData, Without<ViewerCamera>>,
    anchors: Query<&Transform, (With<PreviewAnchor>, Without<ViewerCamera>)>,
    mut cameras: Query<(&mut Camera, &mut Transform), With<ViewerCamera>>,
) {
    let Ok(item) = props.get(source) else {
        warn!("Cannot preview {source}: not a prop");
        return;
    };
    let snapshot = PropSnapshot::from_item(item);

    let Some(anchor_tf) = rig.anchor.and_then(|a| anchors.get(a).ok()) else {
        return;
    };
    let Some((mut camera, mut camera_tf)) = rig.camera.and_then(|c| cameras.get_mut(c).ok()) else {
        return;
    };

    if let Some(old) = rig.clone.take() {
        commands.entity(old).try_despawn();
    }

    let center = anchor_tf.translation;
    let clone = commands
        .spawn((PreviewClone, snapshot.preview_bundle(center)))
        .id();

    let offset = initial_camera_offset(
        *anchor_tf.right(),
        snapshot.scale,
        settings.viewer_distance_multiplier,
    );
    *camera_tf = Transform::from_translation(center + offset).looking_at(center, Vec3::Y);
    camera.is_active = true;

    rig.clone = Some(clone);
    rig.source = Some(source);
    rig.active = true;
}

fn orbit_viewer_camera(
    time: Res<Time>,
    settings: Res<SandboxSettings>,
    rig: Res<ViewerRig>,
    clones: Query<&Transform, (With<PreviewClone>, Without<ViewerCamera>)>,
    mut cameras: Query<&mut Transform, With<ViewerCamera>>,
) {
    if !rig.active {
        return;
    }
    let Some(center) = rig.clone.and_then(|c| clones.get(c).ok()).map(|tf| tf.translation) else {
        return;
    };
    let Some(mut camera_tf) = rig.camera.and_then(|c| cameras.get_mut(c).ok()) else {
        return;
    };
    let angle = settings.viewer_orbit_degrees_per_second.to_radians() * time.delta_secs();
    camera_tf.rotate_around(center, Quat::from_rotation_y(angle));
    camera_tf.look_at(center, Vec3::Y);
}

fn mirror_source_scale(
    rig: Res<ViewerRig>,
    sources: Query<&Transform, Without<PreviewClone>>,
    mut clones: Query<&mut Transform, With<PreviewClone>>,
) {
    if !rig.active {
        return;
    }
    let (Some(source), Some(clone)) = (rig.source, rig.clone) else {
        return;
    };
    let (Ok(source_tf), Ok(mut clone_tf)) = (sources.get(source), clones.get_mut(clone)) else {
        return;
    };
    if clone_tf.scale != source_tf.scale {
        clone_tf.scale = source_tf.scale;
    }
}

fn deactivate_when_unselected(
    mut commands: Commands,
    selection: Res<Selection>,
    mut rig: ResMut<ViewerRig>,
    mut cameras: Query<&mut Camera, With<ViewerCamera>>,
) {
    if !rig.active || selection.primary().is_some() {
        return;
    }
    rig.active = false;
    rig.source = None;
    if let Some(clone) = rig.clone.take() {
        commands.entity(clone).try_despawn();
    }
    if let Some(mut camera) = rig.camera.and_then(|c| cameras.get_mut(c).ok()) {
        camera.is_active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::RunSystemOnce;

    use crate::testing::physics_app;

    #[test]
    fn camera_starts_left_of_anchor_scaled_by_largest_axis() {
        let offset = initial_camera_offset(Vec3::X, Vec3::new(1.0, 3.0, 2.0), 2.0);
        assert_eq!(offset, Vec3::new(-6.0, 0.0, 0.0));
    }

    #[test]
    fn clone_follows_source_scale() {
        let mut world = World::new();
        let source = world.spawn(Transform::from_scale(Vec3::splat(2.5))).id();
        let clone = world.spawn((PreviewClone, Transform::default())).id();
        world.insert_resource(ViewerRig {
            source: Some(source),
            clone: Some(clone),
            active: true,
            ..default()
        });

        world.run_system_once(mirror_source_scale).unwrap();
        assert_eq!(world.get::<Transform>(clone).unwrap().scale, Vec3::splat(2.5));
    }

    #[test]
    fn clearing_selection_tears_down_preview() {
        let mut world = World::new();
        world.init_resource::<Selection>();
        let clone = world.spawn(PreviewClone).id();
        world.insert_resource(ViewerRig {
            source: Some(Entity::PLACEHOLDER),
            clone: Some(clone),
            active: true,
            ..default()
        });

        world.run_system_once(deactivate_when_unselected).unwrap();
        let rig = world.resource::<ViewerRig>();
        assert!(!rig.active);
        assert_eq!(rig.clone, None);
        assert!(world.get_entity(clone).is_err());
    }

    #[test]
    fn orbit_keeps_distance_to_clone() {
        let mut world = World::new();
        let mut time = Time::<()>::default();
        time.advance_by(std::time::Duration::from_secs(1));
        world.insert_resource(time);
        world.insert_resource(SandboxSettings::default());
        let clone = world.spawn((PreviewClone, Transform::from_translation(PREVIEW_ANCHOR))).id();
        let camera = world
            .spawn((ViewerCamera, Transform::from_translation(PREVIEW_ANCHOR - Vec3::X * 4.0)))
            .id();
        world.insert_resource(ViewerRig {
            camera: Some(camera),
            clone: Some(clone),
            active: true,
            ..default()
        });

        world.run_system_once(orbit_viewer_camera).unwrap();
        let moved = world.get::<Transform>(camera).unwrap().translation;
        assert!((moved.distance(PREVIEW_ANCHOR) - 4.0).abs() < 1e-3);
        assert!(moved.distance(PREVIEW_ANCHOR - Vec3::X * 4.0) > 1e-3);
    }

    #[test]
    fn showing_another_prop_replaces_clone_and_reframes_camera() {
        use avian3d::prelude::Collider;

        let mut app = physics_app();
        app.init_resource::<ViewerRig>();
        let world = app.world_mut();
        let anchor = world
            .spawn((PreviewAnchor, Transform::from_translation(PREVIEW_ANCHOR)))
            .id();
        let camera = world
            .spawn((
                ViewerCamera,
                Camera {
                    is_active: false,
                    ..default()
                },
                Transform::default(),
            ))
            .id();
        {
            let mut rig = world.resource_mut::<ViewerRig>();
            rig.anchor = Some(anchor);
            rig.camera = Some(camera);
        }
        let mut prop = |name: &str, scale: Vec3| {
            world
                .spawn((
                    Name::new(name.to_owned()),
                    Mesh3d(Handle::default()),
                    MeshMaterial3d::<StandardMaterial>(Handle::default()),
                    Transform::from_xyz(3.0, 1.0, 0.0).with_scale(scale),
                    Collider::cuboid(1.0, 1.0, 1.0),
                ))
                .id()
        };
        let a = prop("Ball", Vec3::ONE);
        let b = prop("Plank", Vec3::new(1.0, 3.0, 2.0));

        world.run_system_once_with(show_entity, a).unwrap();
        let first = world.resource::<ViewerRig>().clone.unwrap();
        world.run_system_once_with(show_entity, b).unwrap();

        let rig = world.resource::<ViewerRig>();
        let second = rig.clone.unwrap();
        assert_ne!(first, second);
        assert_eq!(rig.source, Some(b));
        assert!(rig.active);
        assert!(world.get_entity(first).is_err());
        assert_eq!(world.query::<&PreviewClone>().iter(world).count(), 1);
        assert_eq!(world.get::<Name>(second).unwrap().as_str(), "Plank (Preview)");

        let expected = PREVIEW_ANCHOR
            + initial_camera_offset(
                Vec3::X,
                Vec3::new(1.0, 3.0, 2.0),
                SandboxSettings::default().viewer_distance_multiplier,
            );
        let camera_tf = world.get::<Transform>(camera).unwrap();
        assert!((camera_tf.translation - expected).length() < 1e-4);
        assert!((camera_tf.translation - PREVIEW_ANCHOR - Vec3::new(-6.0, 0.0, 0.0)).length() < 1e-4);
        assert!(world.get::<Camera>(camera).unwrap().is_active);
    }
}
