use avian3d::prelude::*;
use bevy::{
    prelude::*,
    window::{CursorGrabMode, CursorOptions, PrimaryWindow},
};
use propbox_camera::{FirstPersonController, FirstPersonView, Locomotion, MovementKeys};

use crate::{SandboxSet, interaction::ControllerInput, settings::SandboxSettings};

pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PlayerMode>()
            .add_systems(Startup, spawn_player)
            .add_systems(PostStartup, apply_initial_mode)
            .add_systems(Update, advance_player_mode.in_set(SandboxSet::Mode))
            .add_systems(Update, settle_player.in_set(SandboxSet::Props))
            .add_observer(apply_mode_effects);
    }
}

pub const SPAWN_POINT: Vec3 = Vec3::new(0.0, 1.6, 8.0);

/// The player body. Carries yaw; its [`FirstPersonView`] child carries pitch.
#[derive(Component)]
pub struct Player;

/// Vertical speed while walking off a ledge.
#[derive(Component, Default)]
pub struct PlayerFall {
    pub velocity: f32,
}

#[derive(Resource, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlayerMode {
    #[default]
    Walking,
    Flying,
    /// Menu open; `previous` is restored when it closes.
    InMenu { previous: Locomotion },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ModeInput {
    pub toggle_flight: bool,
    pub toggle_menu: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeEffect {
    LocomotionChanged(Locomotion),
    MenuOpened,
    MenuClosed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModeTransition {
    pub next: PlayerMode,
    pub effect: Option<ModeEffect>,
}

/// Fired when the mode changes, after [`PlayerMode`] holds the new value.
#[derive(Event, Clone, Copy, Debug)]
pub struct ModeChanged {
    pub mode: PlayerMode,
    pub effect: ModeEffect,
}

impl PlayerMode {
    pub fn from_locomotion(locomotion: Locomotion) -> Self {
        match locomotion {
            Locomotion::Walking => Self::Walking,
            Locomotion::Flying => Self::Flying,
        }
    }

    /// Locomotion in effect now, or to restore once the menu closes.
    pub fn active_locomotion(self) -> Locomotion {
        match self {
            Self::Walking => Locomotion::Walking,
            Self::Flying => Locomotion::Flying,
            Self::InMenu { previous } => previous,
        }
    }

    pub fn in_menu(self) -> bool {
        matches!(self, Self::InMenu { .. })
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Walking => "Walking",
            Self::Flying => "Flying",
            Self::InMenu { .. } => "Menu",
        }
    }

    /// Flight toggle first, then the menu toggle against the updated mode.
    /// When both fire, the reported effect is the menu one.
    pub fn transition(self, input: ModeInput) -> ModeTransition {
        let mut next = self;
        let mut effect = None;

        if input.toggle_flight {
            match next {
                Self::Walking => {
                    next = Self::Flying;
                    effect = Some(ModeEffect::LocomotionChanged(Locomotion::Flying));
                }
                Self::Flying => {
                    next = Self::Walking;
                    effect = Some(ModeEffect::LocomotionChanged(Locomotion::Walking));
                }
                Self::InMenu { .. } => {}
            }
        }

        if input.toggle_menu {
            match next {
                Self::InMenu { previous } => {
                    next = Self::from_locomotion(previous);
                    effect = Some(ModeEffect::MenuClosed);
                }
                Self::Walking | Self::Flying => {
                    next = Self::InMenu {
                        previous: next.active_locomotion(),
                    };
                    effect = Some(ModeEffect::MenuOpened);
                }
            }
        }

        ModeTransition { next, effect }
    }
}

fn spawn_player(mut commands: Commands, settings: Res<SandboxSettings>) {
    let bindings = settings.bindings;
    commands.spawn((
        Name::new("Player"),
        Player,
        PlayerFall::default(),
        FirstPersonController {
            sensitivity: settings.look_sensitivity,
            walk_speed: settings.walk_speed,
            fly_speed: settings.fly_speed,
            run_multiplier: settings.run_multiplier,
            max_pitch: settings.max_pitch(),
            keys: MovementKeys {
                forward: bindings.forward,
                back: bindings.back,
                left: bindings.left,
                right: bindings.right,
                run: bindings.run,
            },
            ..default()
        },
        Transform::from_translation(SPAWN_POINT.with_y(settings.player_height)),
        Visibility::default(),
        children![(
            Name::new("Player View"),
            FirstPersonView,
            Camera3d::default(),
            Transform::default(),
        )],
    ));
}

fn advance_player_mode(
    mut commands: Commands,
    input: Res<ControllerInput>,
    mut mode: ResMut<PlayerMode>,
) {
    let transition = mode.transition(ModeInput {
        toggle_flight: input.toggle_flight,
        toggle_menu: input.toggle_menu,
    });
    let Some(effect) = transition.effect else {
        return;
    };
    *mode = transition.next;
    debug!("Player mode: {:?} ({effect:?})", transition.next);
    commands.trigger(ModeChanged {
        mode: transition.next,
        effect,
    });
}

fn apply_initial_mode(mut commands: Commands, mode: Res<PlayerMode>) {
    let effect = if mode.in_menu() {
        ModeEffect::MenuOpened
    } else {
        ModeEffect::LocomotionChanged(mode.active_locomotion())
    };
    commands.trigger(ModeChanged { mode: *mode, effect });
}

/// Cursor grab and controller state for a mode. Menu and hint visibility
/// follow [`PlayerMode`] in their own modules.
fn apply_mode_effects(
    trigger: On<ModeChanged>,
    mut cursors: Query<&mut CursorOptions, With<PrimaryWindow>>,
    mut controllers: Query<(&mut FirstPersonController, &mut PlayerFall), With<Player>>,
) {
    let mode = trigger.mode;
    let in_menu = mode.in_menu();

    if let Ok(mut cursor) = cursors.single_mut() {
        cursor.visible = in_menu;
        cursor.grab_mode = if in_menu {
            CursorGrabMode::None
        } else {
            CursorGrabMode::Locked
        };
    }

    for (mut controller, mut fall) in &mut controllers {
        controller.enabled = !in_menu;
        controller.locomotion = mode.active_locomotion();
        if let ModeEffect::LocomotionChanged(_) = trigger.effect {
            fall.velocity = 0.0;
        }
    }
}

/// Vertical position for a walking player. `ground` is the distance to the
/// ground straight below, if any.
pub fn walking_step(y: f32, velocity: f32, ground: Option<f32>, height: f32, gravity: f32, dt: f32) -> (f32, f32) {
    if let Some(distance) = ground {
        if distance <= height + 0.01 {
            return (y + (height - distance), 0.0);
        }
    }
    let velocity = velocity - gravity * dt;
    let next = y + velocity * dt;
    if let Some(distance) = ground {
        let floor = y - distance + height;
        if next <= floor {
            return (floor, 0.0);
        }
    }
    (next, velocity)
}

fn settle_player(
    time: Res<Time>,
    settings: Res<SandboxSettings>,
    spatial_query: SpatialQuery,
    mut players: Query<(Entity, &FirstPersonController, &mut Transform, &mut PlayerFall), With<Player>>,
) {
    let dt = time.delta_secs();
    for (entity, controller, mut transform, mut fall) in &mut players {
        if !controller.enabled || controller.locomotion == Locomotion::Flying {
            continue;
        }

        let filter = SpatialQueryFilter::default().with_excluded_entities([entity]);
        let ground = spatial_query
            .cast_ray(transform.translation, Dir3::NEG_Y, settings.aim_distance, true, &filter)
            .map(|hit| hit.distance);

        let (y, velocity) = walking_step(
            transform.translation.y,
            fall.velocity,
            ground,
            settings.player_height,
            settings.gravity,
            dt,
        );
        fall.velocity = velocity;
        if transform.translation.y != y {
            transform.translation.y = y;
        }

        if y < settings.fall_floor_y {
            info!("Player fell out of the world, respawning");
            transform.translation = SPAWN_POINT.with_y(settings.player_height);
            fall.velocity = 0.0;
        }
    }
}
