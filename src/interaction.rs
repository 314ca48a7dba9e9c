use avian3d::prelude::*;
use bevy::{
    input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel},
    input_focus::InputFocus,
    picking::hover::HoverMap,
    prelude::*,
    window::PrimaryWindow,
};
use propbox_camera::FirstPersonView;

use crate::{
    SandboxSet,
    interactable::{BeingViewed, Dormant, Interactable, PropColliders, deactivate, set_collision},
    player::{Player, PlayerMode},
    selection::Selection,
    settings::SandboxSettings,
    viewer::ShowInViewer,
};

pub struct InteractionPlugin;

impl Plugin for InteractionPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ControllerInput>()
            .init_resource::<AimState>()
            .init_resource::<Gesture>()
            .init_resource::<DragReach>()
            .add_systems(Update, gather_controller_input.in_set(SandboxSet::Input))
            .add_systems(Update, cast_aim_ray.in_set(SandboxSet::Aim))
            .add_systems(
                Update,
                (update_selection, update_hover).chain().in_set(SandboxSet::Select),
            )
            .add_systems(
                Update,
                (
                    end_orphaned_gesture,
                    handle_rotation,
                    handle_drag,
                    adjust_drag_reach,
                    handle_delete,
                )
                    .chain()
                    .in_set(SandboxSet::Manipulate),
            );
    }
}

/// Input for one tick, already filtered for text focus and UI hover.
#[derive(Resource, Default, Debug, Clone, PartialEq)]
pub struct ControllerInput {
    pub toggle_flight: bool,
    pub toggle_menu: bool,
    pub delete: bool,
    pub primary_pressed: bool,
    pub primary_held: bool,
    pub primary_released: bool,
    pub secondary_pressed: bool,
    pub secondary_held: bool,
    pub secondary_released: bool,
    /// Raw mouse motion in pixels, Y down.
    pub cursor_delta: Vec2,
    /// Scroll in lines, positive away from the user.
    pub scroll: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AimHit {
    /// The `Interactable` owning the hit collider, if any.
    pub prop: Option<Entity>,
    pub point: Vec3,
}

#[derive(Resource, Default, Debug)]
pub struct AimState {
    pub ray: Option<Ray3d>,
    pub hit: Option<AimHit>,
}

impl AimState {
    pub fn target(&self) -> Option<Entity> {
        self.hit.and_then(|hit| hit.prop)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragSession {
    pub entity: Entity,
    /// Prop position minus the aim point where the drag started.
    pub offset: Vec3,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RotateSession {
    pub entity: Entity,
    pub initial_cursor: Option<Vec2>,
}

/// The pointer gesture in progress. Dragging and rotating never overlap.
#[derive(Resource, Default, Clone, Copy, Debug, PartialEq)]
pub enum Gesture {
    #[default]
    Idle,
    Dragging(DragSession),
    Rotating(RotateSession),
}

impl Gesture {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn entity(&self) -> Option<Entity> {
        match self {
            Self::Idle => None,
            Self::Dragging(session) => Some(session.entity),
            Self::Rotating(session) => Some(session.entity),
        }
    }
}

/// How far from the player a dragged prop may go.
#[derive(Resource, Clone, Copy, Debug, PartialEq)]
pub struct DragReach {
    pub max_distance: f32,
    pub min_distance: f32,
}

impl DragReach {
    pub fn new(max_distance: f32, min_distance: f32) -> Self {
        Self {
            max_distance: max_distance.max(min_distance),
            min_distance,
        }
    }

    /// Grow or shrink the reach, never below the minimum.
    pub fn adjust(&mut self, delta: f32) {
        self.max_distance = (self.max_distance + delta).max(self.min_distance);
    }

    /// Start a drag with the prop's current distance as the reach.
    pub fn reach_for(&mut self, distance: f32) {
        self.max_distance = distance.max(self.min_distance);
    }
}

impl FromWorld for DragReach {
    fn from_world(world: &mut World) -> Self {
        let settings = world.get_resource::<SandboxSettings>().cloned().unwrap_or_default();
        Self::new(settings.initial_max_drag_distance, settings.min_drag_distance)
    }
}

/// Pull `target` back onto the sphere of radius `max_distance` around `origin`.
pub fn clamp_to_reach(origin: Vec3, target: Vec3, max_distance: f32) -> Vec3 {
    origin + (target - origin).clamp_length_max(max_distance)
}

/// Rotation for one tick of cursor motion: X turns about world down, Y about
/// world right.
pub fn rotation_step(cursor_delta: Vec2, sensitivity: f32) -> Quat {
    Quat::from_axis_angle(Vec3::X, -cursor_delta.y * sensitivity)
        * Quat::from_axis_angle(Vec3::NEG_Y, cursor_delta.x * sensitivity)
}

/// Where on screen the aim ray starts: the centre, or the cursor in the menu.
pub fn aim_screen_point(mode: PlayerMode, window_size: Vec2, cursor: Option<Vec2>) -> Option<Vec2> {
    if mode.in_menu() {
        cursor
    } else {
        Some(window_size / 2.0)
    }
}

/// The prop that should carry `BeingViewed`: the aimed prop unless selected.
pub fn hover_target(aimed: Option<Entity>, selection: &Selection) -> Option<Entity> {
    aimed.filter(|entity| !selection.is_selected(*entity))
}

fn gather_controller_input(
    mut input: ResMut<ControllerInput>,
    settings: Res<SandboxSettings>,
    keyboard: Res<ButtonInput<KeyCode>>,
    mouse: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: MessageReader<MouseMotion>,
    mut mouse_wheel: MessageReader<MouseWheel>,
    focus: Option<Res<InputFocus>>,
    hover_map: Option<Res<HoverMap>>,
    ui_nodes: Query<(), With<Node>>,
) {
    let typing = focus.is_some_and(|focus| focus.0.is_some());
    let over_ui = hover_map.is_some_and(|map| {
        map.values()
            .any(|pointer_map| pointer_map.keys().any(|entity| ui_nodes.contains(*entity)))
    });

    let mut cursor_delta = Vec2::ZERO;
    for motion in mouse_motion.read() {
        cursor_delta += motion.delta;
    }
    let mut scroll = 0.0;
    for event in mouse_wheel.read() {
        scroll += match event.unit {
            MouseScrollUnit::Line => event.y,
            MouseScrollUnit::Pixel => event.y * 0.01,
        };
    }

    let bindings = settings.bindings;
    let key = |code: KeyCode| !typing && keyboard.just_pressed(code);
    *input = ControllerInput {
        toggle_flight: key(bindings.toggle_flight),
        toggle_menu: key(bindings.toggle_menu),
        delete: key(bindings.delete),
        primary_pressed: !over_ui && mouse.just_pressed(MouseButton::Left),
        primary_held: mouse.pressed(MouseButton::Left),
        primary_released: mouse.just_released(MouseButton::Left),
        secondary_pressed: !over_ui && mouse.just_pressed(MouseButton::Right),
        secondary_held: mouse.pressed(MouseButton::Right),
        secondary_released: mouse.just_released(MouseButton::Right),
        cursor_delta,
        scroll: if over_ui { 0.0 } else { scroll },
    };
}

fn cast_aim_ray(
    mut aim: ResMut<AimState>,
    mode: Res<PlayerMode>,
    settings: Res<SandboxSettings>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform), With<FirstPersonView>>,
    players: Query<Entity, With<Player>>,
    spatial_query: SpatialQuery,
    parents: Query<&ChildOf>,
    props: Query<(), (With<Interactable>, Without<Dormant>)>,
) {
    *aim = AimState::default();

    let Ok(window) = windows.single() else {
        warn_once!("No primary window, aiming disabled");
        return;
    };
    let Ok((camera, camera_tf)) = cameras.single() else {
        warn_once!("No player view camera, aiming disabled");
        return;
    };
    let Some(point) = aim_screen_point(*mode, window.size(), window.cursor_position()) else {
        return;
    };
    let Ok(ray) = camera.viewport_to_world(camera_tf, point) else {
        return;
    };

    let filter = SpatialQueryFilter::default().with_excluded_entities(players.iter());
    aim.ray = Some(ray);
    aim.hit = spatial_query
        .cast_ray(ray.origin, ray.direction, settings.aim_distance, true, &filter)
        .map(|hit| AimHit {
            prop: std::iter::once(hit.entity)
                .chain(parents.iter_ancestors(hit.entity))
                .find(|entity| props.contains(*entity)),
            point: ray.get_point(hit.distance),
        });
}

fn update_selection(
    mut commands: Commands,
    input: Res<ControllerInput>,
    aim: Res<AimState>,
    mut selection: ResMut<Selection>,
) {
    if !input.primary_pressed {
        return;
    }
    let Some(target) = aim.target() else {
        return;
    };
    if selection.is_selected(target) {
        return;
    }
    selection.select(&mut commands, target);
    commands.entity(target).remove::<BeingViewed>();
    commands.trigger(ShowInViewer { entity: target });
}

fn update_hover(
    mut commands: Commands,
    aim: Res<AimState>,
    selection: Res<Selection>,
    viewed: Query<Entity, With<BeingViewed>>,
) {
    let wanted = hover_target(aim.target(), &selection);
    for entity in &viewed {
        if Some(entity) != wanted {
            commands.entity(entity).remove::<BeingViewed>();
        }
    }
    if let Some(entity) = wanted {
        if !viewed.contains(entity) {
            commands.entity(entity).insert(BeingViewed);
        }
    }
}

/// A gesture outlives its prop's selection only until the next tick.
fn end_orphaned_gesture(
    mut commands: Commands,
    selection: Res<Selection>,
    mut gesture: ResMut<Gesture>,
    dormant: Query<(), With<Dormant>>,
    colliders: PropColliders,
) {
    let Some(entity) = gesture.entity() else {
        return;
    };
    if selection.is_selected(entity) {
        return;
    }
    if let Gesture::Dragging(_) = *gesture {
        if !dormant.contains(entity) {
            set_collision(&mut commands, &colliders.of(entity), true);
        }
    }
    *gesture = Gesture::Idle;
}

fn handle_rotation(
    input: Res<ControllerInput>,
    settings: Res<SandboxSettings>,
    aim: Res<AimState>,
    selection: Res<Selection>,
    mut gesture: ResMut<Gesture>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut transforms: Query<&mut Transform, (With<Interactable>, Without<Player>)>,
) {
    if input.secondary_released {
        if let Gesture::Rotating(_) = *gesture {
            *gesture = Gesture::Idle;
        }
    }
    let Some(selected) = selection.primary() else {
        return;
    };

    if input.secondary_pressed && gesture.is_idle() && aim.target() == Some(selected) {
        *gesture = Gesture::Rotating(RotateSession {
            entity: selected,
            initial_cursor: windows.single().ok().and_then(|w| w.cursor_position()),
        });
    }

    let Gesture::Rotating(session) = *gesture else {
        return;
    };
    if !input.secondary_held || input.cursor_delta == Vec2::ZERO {
        return;
    }
    if let Ok(mut transform) = transforms.get_mut(session.entity) {
        transform.rotation =
            rotation_step(input.cursor_delta, settings.object_rotation_sensitivity) * transform.rotation;
    }
}

fn handle_drag(
    mut commands: Commands,
    input: Res<ControllerInput>,
    settings: Res<SandboxSettings>,
    aim: Res<AimState>,
    selection: Res<Selection>,
    mut gesture: ResMut<Gesture>,
    mut reach: ResMut<DragReach>,
    spatial_query: SpatialQuery,
    players: Query<(Entity, &Transform), With<Player>>,
    mut props: Query<
        (&mut Transform, Option<&mut LinearVelocity>, Option<&mut AngularVelocity>),
        (With<Interactable>, Without<Player>),
    >,
    colliders: PropColliders,
) {
    if input.primary_released {
        if let Gesture::Dragging(session) = *gesture {
            set_collision(&mut commands, &colliders.of(session.entity), true);
            *gesture = Gesture::Idle;
        }
    }
    let Some(selected) = selection.primary() else {
        return;
    };
    let Ok((player, player_tf)) = players.single() else {
        warn_once!("No player, dragging disabled");
        return;
    };
    let player_pos = player_tf.translation;

    if input.primary_pressed && gesture.is_idle() {
        let hit = aim.hit.filter(|hit| hit.prop == Some(selected));
        if let (Some(hit), Ok((transform, ..))) = (hit, props.get(selected)) {
            reach.reach_for(player_pos.distance(transform.translation));
            *gesture = Gesture::Dragging(DragSession {
                entity: selected,
                offset: transform.translation - hit.point,
            });
            set_collision(&mut commands, &colliders.of(selected), false);
        }
    }

    let Gesture::Dragging(session) = *gesture else {
        return;
    };
    if !input.primary_held {
        return;
    }
    let Some(ray) = aim.ray else {
        return;
    };

    let mut excluded = colliders.of(session.entity);
    excluded.push(player);
    let filter = SpatialQueryFilter::default().with_excluded_entities(excluded);
    let point = spatial_query
        .cast_ray(ray.origin, ray.direction, settings.aim_distance, true, &filter)
        .map(|hit| ray.get_point(hit.distance))
        .unwrap_or_else(|| ray.get_point(reach.max_distance));
    let target = clamp_to_reach(player_pos, point + session.offset, reach.max_distance);

    let Ok((mut transform, linear, angular)) = props.get_mut(session.entity) else {
        return;
    };
    transform.translation = target;
    if let Some(mut linear) = linear {
        linear.0 = Vec3::ZERO;
    }
    if let Some(mut angular) = angular {
        angular.0 = Vec3::ZERO;
    }
}

fn adjust_drag_reach(
    input: Res<ControllerInput>,
    settings: Res<SandboxSettings>,
    mut reach: ResMut<DragReach>,
) {
    if input.scroll != 0.0 {
        reach.adjust(input.scroll * settings.scroll_step);
    }
}

fn handle_delete(
    mut commands: Commands,
    input: Res<ControllerInput>,
    mut selection: ResMut<Selection>,
    mut gesture: ResMut<Gesture>,
    colliders: PropColliders,
) {
    if !input.delete {
        return;
    }
    let Some(selected) = selection.primary() else {
        return;
    };
    if gesture.entity() == Some(selected) {
        *gesture = Gesture::Idle;
    }
    deactivate(&mut commands, selected, &colliders.of(selected));
    selection.clear(&mut commands);
    info!("Deactivated {selected}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::RunSystemOnce;
    use propbox_camera::Locomotion;

    use crate::{
        selection::Selected,
        testing::{physics_app, step},
    };

    #[test]
    fn scroll_is_floored_at_minimum_reach() {
        let mut reach = DragReach::new(5.0, 1.0);
        reach.adjust(-10.0);
        assert_eq!(reach.max_distance, 1.0);
        reach.adjust(2.5);
        assert_eq!(reach.max_distance, 3.5);
    }

    #[test]
    fn drag_start_reach_respects_minimum() {
        let mut reach = DragReach::new(10.0, 1.0);
        reach.reach_for(0.4);
        assert_eq!(reach.max_distance, 1.0);
        reach.reach_for(6.0);
        assert_eq!(reach.max_distance, 6.0);
    }

    #[test]
    fn drag_target_is_clamped_to_reach() {
        let origin = Vec3::new(0.0, 1.6, 0.0);
        let far = clamp_to_reach(origin, origin + Vec3::new(20.0, 0.0, 0.0), 10.0);
        assert!((far.distance(origin) - 10.0).abs() < 1e-4);
        assert!((far - Vec3::new(10.0, 1.6, 0.0)).length() < 1e-4);

        let near = Vec3::new(2.0, 1.0, -3.0);
        assert_eq!(clamp_to_reach(origin, near, 10.0), near);
    }

    #[test]
    fn horizontal_cursor_motion_turns_about_world_down() {
        let quarter = std::f32::consts::FRAC_PI_2;
        let step = rotation_step(Vec2::new(quarter / 0.01, 0.0), 0.01);
        assert!((step * Vec3::X - Vec3::Z).length() < 1e-4);
        assert!((step * Vec3::Y - Vec3::Y).length() < 1e-4);
    }

    #[test]
    fn upward_cursor_motion_tips_about_world_right() {
        let quarter = std::f32::consts::FRAC_PI_2;
        // Cursor up is negative Y in window coordinates.
        let step = rotation_step(Vec2::new(0.0, -quarter / 0.01), 0.01);
        assert!((step * Vec3::Y - Vec3::Z).length() < 1e-4);
    }

    #[test]
    fn aim_uses_screen_centre_outside_menu() {
        let size = Vec2::new(1280.0, 720.0);
        let cursor = Some(Vec2::new(10.0, 20.0));
        assert_eq!(
            aim_screen_point(PlayerMode::Walking, size, cursor),
            Some(Vec2::new(640.0, 360.0))
        );
        let menu = PlayerMode::InMenu {
            previous: Locomotion::Flying,
        };
        assert_eq!(aim_screen_point(menu, size, cursor), cursor);
        assert_eq!(aim_screen_point(menu, size, None), None);
    }

    fn world() -> World {
        let mut world = World::new();
        world.insert_resource(SandboxSettings::default());
        world.init_resource::<Selection>();
        world.init_resource::<ControllerInput>();
        world.init_resource::<AimState>();
        world.init_resource::<Gesture>();
        world
    }

    fn select(world: &mut World, entity: Entity) {
        world
            .run_system_once(move |mut commands: Commands, mut selection: ResMut<Selection>| {
                selection.select(&mut commands, entity);
            })
            .unwrap();
    }

    fn aim_at(world: &mut World, prop: Entity) {
        world.resource_mut::<AimState>().hit = Some(AimHit {
            prop: Some(prop),
            point: Vec3::ZERO,
        });
    }

    #[test]
    fn hover_marks_only_the_unselected_aimed_prop() {
        let mut world = world();
        let a = world.spawn((Interactable, BeingViewed)).id();
        let b = world.spawn(Interactable).id();
        aim_at(&mut world, b);

        world.run_system_once(update_hover).unwrap();
        assert!(world.get::<BeingViewed>(a).is_none());
        assert!(world.get::<BeingViewed>(b).is_some());

        select(&mut world, b);
        world.run_system_once(update_hover).unwrap();
        assert!(world.get::<BeingViewed>(b).is_none());
    }

    #[test]
    fn clicking_another_prop_moves_selection_in_one_tick() {
        let mut world = world();
        let a = world.spawn(Interactable).id();
        let b = world.spawn(Interactable).id();
        select(&mut world, a);

        aim_at(&mut world, b);
        world.resource_mut::<ControllerInput>().primary_pressed = true;
        world.run_system_once(update_selection).unwrap();

        assert!(world.get::<Selected>(a).is_none());
        assert!(world.get::<Selected>(b).is_some());
        assert_eq!(world.resource::<Selection>().primary(), Some(b));
    }

    #[test]
    fn clicking_empty_space_keeps_selection() {
        let mut world = world();
        let a = world.spawn(Interactable).id();
        select(&mut world, a);

        world.resource_mut::<ControllerInput>().primary_pressed = true;
        world.run_system_once(update_selection).unwrap();
        assert_eq!(world.resource::<Selection>().primary(), Some(a));
    }

    #[test]
    fn rotation_cannot_start_during_a_drag() {
        let mut world = world();
        let prop = world.spawn((Interactable, Transform::default())).id();
        select(&mut world, prop);
        aim_at(&mut world, prop);
        let drag = Gesture::Dragging(DragSession {
            entity: prop,
            offset: Vec3::ZERO,
        });
        *world.resource_mut::<Gesture>() = drag;
        {
            let mut input = world.resource_mut::<ControllerInput>();
            input.secondary_pressed = true;
            input.secondary_held = true;
            input.cursor_delta = Vec2::new(30.0, 0.0);
        }

        world.run_system_once(handle_rotation).unwrap();
        assert_eq!(*world.resource::<Gesture>(), drag);
        assert_eq!(world.get::<Transform>(prop).unwrap().rotation, Quat::IDENTITY);
    }

    #[test]
    fn rotation_follows_cursor_while_held() {
        let mut world = world();
        let prop = world.spawn((Interactable, Transform::default())).id();
        select(&mut world, prop);
        aim_at(&mut world, prop);
        {
            let mut input = world.resource_mut::<ControllerInput>();
            input.secondary_pressed = true;
            input.secondary_held = true;
            input.cursor_delta = Vec2::new(30.0, 0.0);
        }

        world.run_system_once(handle_rotation).unwrap();
        assert!(matches!(*world.resource::<Gesture>(), Gesture::Rotating(_)));
        assert_ne!(world.get::<Transform>(prop).unwrap().rotation, Quat::IDENTITY);

        {
            let mut input = world.resource_mut::<ControllerInput>();
            *input = ControllerInput {
                secondary_released: true,
                ..default()
            };
        }
        world.run_system_once(handle_rotation).unwrap();
        assert!(world.resource::<Gesture>().is_idle());
    }

    #[test]
    fn delete_deactivates_and_ends_gesture() {
        let mut world = world();
        let prop = world.spawn((Interactable, Transform::default())).id();
        select(&mut world, prop);
        *world.resource_mut::<Gesture>() = Gesture::Rotating(RotateSession {
            entity: prop,
            initial_cursor: None,
        });
        world.resource_mut::<ControllerInput>().delete = true;

        world.run_system_once(handle_delete).unwrap();
        assert!(world.resource::<Gesture>().is_idle());
        assert_eq!(world.resource::<Selection>().primary(), None);
        assert!(world.get::<Dormant>(prop).is_some());
        assert_eq!(world.get::<Visibility>(prop), Some(&Visibility::Hidden));
    }

    #[test]
    fn losing_selection_ends_gesture() {
        let mut world = world();
        let prop = world.spawn(Interactable).id();
        *world.resource_mut::<Gesture>() = Gesture::Dragging(DragSession {
            entity: prop,
            offset: Vec3::ZERO,
        });
        world.run_system_once(end_orphaned_gesture).unwrap();
        assert!(world.resource::<Gesture>().is_idle());
    }

    fn drag_app() -> (App, Entity) {
        let mut app = physics_app();
        app.init_resource::<ControllerInput>()
            .init_resource::<AimState>()
            .init_resource::<Gesture>()
            .init_resource::<DragReach>();
        let world = app.world_mut();
        world.spawn((Player, Transform::from_xyz(0.0, 1.6, 0.0)));
        let prop = world
            .spawn((
                Interactable,
                RigidBody::Kinematic,
                Collider::cuboid(1.0, 1.0, 1.0),
                Transform::from_xyz(0.0, 1.6, -3.0),
            ))
            .id();
        // Far wall, well beyond the reach.
        world.spawn((
            RigidBody::Static,
            Collider::cuboid(40.0, 20.0, 1.0),
            Transform::from_xyz(0.0, 1.6, -40.0),
        ));
        step(&mut app, 3);
        select(app.world_mut(), prop);
        (app, prop)
    }

    #[test]
    fn drag_disables_collision_stays_in_reach_and_restores_on_release() {
        let (mut app, prop) = drag_app();
        let world = app.world_mut();
        let eye = Vec3::new(0.0, 1.6, 0.0);
        world.resource_mut::<AimState>().ray = Some(Ray3d::new(eye, Dir3::NEG_Z));
        world.resource_mut::<AimState>().hit = Some(AimHit {
            prop: Some(prop),
            point: Vec3::new(0.0, 1.6, -2.5),
        });
        *world.resource_mut::<ControllerInput>() = ControllerInput {
            primary_pressed: true,
            primary_held: true,
            ..default()
        };
        world.run_system_once(handle_drag).unwrap();

        assert_eq!(
            *world.resource::<Gesture>(),
            Gesture::Dragging(DragSession {
                entity: prop,
                offset: Vec3::new(0.0, 0.0, -0.5),
            })
        );
        assert_eq!(world.resource::<DragReach>().max_distance, 3.0);
        assert!(world.get::<ColliderDisabled>(prop).is_some());

        // Aim off to the right, at the far wall.
        let aim = Dir3::new(Vec3::new(0.3, 0.0, -1.0)).unwrap();
        world.resource_mut::<AimState>().ray = Some(Ray3d::new(eye, aim));
        *world.resource_mut::<ControllerInput>() = ControllerInput {
            primary_held: true,
            ..default()
        };
        world.run_system_once(handle_drag).unwrap();

        let position = world.get::<Transform>(prop).unwrap().translation;
        assert!(position.x > 0.1);
        assert!(position.distance(eye) <= world.resource::<DragReach>().max_distance + 1e-4);
        assert!(world.get::<ColliderDisabled>(prop).is_some());

        *world.resource_mut::<ControllerInput>() = ControllerInput {
            primary_released: true,
            ..default()
        };
        world.run_system_once(handle_drag).unwrap();
        assert!(world.resource::<Gesture>().is_idle());
        assert!(world.get::<ColliderDisabled>(prop).is_none());
    }

    #[test]
    fn orphaned_drag_restores_collision_unless_dormant() {
        let (mut app, prop) = drag_app();
        let world = app.world_mut();
        let dormant = world
            .spawn((
                Interactable,
                Dormant,
                Collider::cuboid(1.0, 1.0, 1.0),
                ColliderDisabled,
                Transform::from_xyz(5.0, 0.5, 0.0),
            ))
            .id();
        world.entity_mut(prop).insert(ColliderDisabled);
        world
            .run_system_once(|mut commands: Commands, mut selection: ResMut<Selection>| {
                selection.clear(&mut commands);
            })
            .unwrap();

        *world.resource_mut::<Gesture>() = Gesture::Dragging(DragSession {
            entity: prop,
            offset: Vec3::ZERO,
        });
        world.run_system_once(end_orphaned_gesture).unwrap();
        assert!(world.resource::<Gesture>().is_idle());
        assert!(world.get::<ColliderDisabled>(prop).is_none());

        *world.resource_mut::<Gesture>() = Gesture::Dragging(DragSession {
            entity: dormant,
            offset: Vec3::ZERO,
        });
        world.run_system_once(end_orphaned_gesture).unwrap();
        assert!(world.resource::<Gesture>().is_idle());
        assert!(world.get::<ColliderDisabled>(dormant).is_some());
    }
}
