use std::time::Duration;

use bevy::prelude::*;
use bevy_infinite_grid::{InfiniteGrid, InfiniteGridSettings};
use propbox_widgets::{
    tokens::{TEXT_BODY_COLOR, TEXT_MUTED_COLOR, TEXT_SIZE, TEXT_SIZE_SM},
    toast::{Toast, ToastVariant, toast},
};

use crate::{
    SandboxSet,
    interactable::GridSnap,
    physics_controls::TimePause,
    player::PlayerMode,
    selection::Selection,
    settings::SandboxSettings,
};

pub struct HudPlugin;

impl Plugin for HudPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, (spawn_hud, spawn_grid_overlay))
            .add_systems(
                Update,
                (update_mode_hud, update_status_line, sync_grid_overlay).in_set(SandboxSet::Ui),
            )
            .add_observer(on_status_message);
    }
}

/// Short message shown to the player for a few seconds.
#[derive(Event, Clone, Debug)]
pub struct StatusMessage {
    pub text: String,
    pub variant: ToastVariant,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            variant: ToastVariant::Info,
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            variant: ToastVariant::Warning,
        }
    }
}

#[derive(Component)]
pub struct HudRoot;

#[derive(Component)]
pub struct Crosshair;

#[derive(Component)]
pub struct ControlHints;

/// Bottom line summarizing mode and pause state.
#[derive(Component)]
pub struct StatusLine;

/// Grid drawn while the selected prop snaps to whole units.
#[derive(Component)]
pub struct GridOverlay;

pub fn control_hints(mode: PlayerMode) -> &'static str {
    match mode {
        PlayerMode::Walking => {
            "WASD move | Shift run | Space fly | LMB select/drag | RMB rotate | Wheel reach | Del remove | Esc menu"
        }
        PlayerMode::Flying => {
            "WASD fly | Shift fast | Space walk | LMB select/drag | RMB rotate | Wheel reach | Del remove | Esc menu"
        }
        PlayerMode::InMenu { .. } => "Click props to select | Esc close menu",
    }
}

fn spawn_hud(mut commands: Commands) {
    commands.spawn((
        HudRoot,
        Node {
            position_type: PositionType::Absolute,
            width: percent(100),
            height: percent(100),
            ..default()
        },
        Pickable::IGNORE,
        children![
            (
                Crosshair,
                Node {
                    position_type: PositionType::Absolute,
                    left: percent(50),
                    top: percent(50),
                    width: px(6),
                    height: px(6),
                    border_radius: BorderRadius::all(px(3)),
                    ..default()
                },
                UiTransform {
                    translation: Val2 {
                        x: percent(-50),
                        y: percent(-50),
                    },
                    ..default()
                },
                BackgroundColor(TEXT_BODY_COLOR.with_alpha(0.8).into()),
                Pickable::IGNORE,
            ),
            (
                Node {
                    position_type: PositionType::Absolute,
                    left: px(12),
                    bottom: px(8),
                    flex_direction: FlexDirection::Column,
                    row_gap: px(2),
                    ..default()
                },
                Pickable::IGNORE,
                children![
                    (
                        StatusLine,
                        Text::new(""),
                        TextFont {
                            font_size: TEXT_SIZE,
                            ..default()
                        },
                        TextColor(TEXT_BODY_COLOR.into()),
                        Pickable::IGNORE,
                    ),
                    (
                        ControlHints,
                        Text::new(control_hints(PlayerMode::default())),
                        TextFont {
                            font_size: TEXT_SIZE_SM,
                            ..default()
                        },
                        TextColor(TEXT_MUTED_COLOR.into()),
                        Pickable::IGNORE,
                    ),
                ],
            ),
        ],
    ));
}

fn update_mode_hud(
    mode: Res<PlayerMode>,
    mut crosshairs: Query<&mut Node, With<Crosshair>>,
    mut hints: Query<&mut Text, With<ControlHints>>,
) {
    if !mode.is_changed() {
        return;
    }
    for mut node in &mut crosshairs {
        node.display = if mode.in_menu() {
            Display::None
        } else {
            Display::Flex
        };
    }
    for mut text in &mut hints {
        text.0 = control_hints(*mode).to_string();
    }
}

fn update_status_line(
    mode: Res<PlayerMode>,
    pause: Res<TimePause>,
    mut text_query: Query<&mut Text, With<StatusLine>>,
) {
    if !mode.is_changed() && !pause.is_changed() {
        return;
    }
    let Ok(mut text) = text_query.single_mut() else {
        return;
    };
    let mut new_text = mode.label().to_string();
    if pause.paused {
        new_text.push_str("  |  Time paused");
    }
    if text.0 != new_text {
        text.0 = new_text;
    }
}

/// Replace the current status toast, if any, with a new one.
fn on_status_message(
    trigger: On<StatusMessage>,
    mut commands: Commands,
    settings: Res<SandboxSettings>,
    toasts: Query<Entity, With<Toast>>,
) {
    for entity in &toasts {
        commands.entity(entity).try_despawn();
    }
    let duration = Duration::from_secs_f32(settings.status_message_seconds.max(0.0));
    commands.spawn(toast(trigger.variant, trigger.text.clone(), duration));
}

fn spawn_grid_overlay(mut commands: Commands) {
    commands.spawn((
        GridOverlay,
        InfiniteGrid,
        InfiniteGridSettings {
            scale: 1.0,
            fadeout_distance: 40.0,
            ..default()
        },
        Transform::from_xyz(0.0, 0.01, 0.0),
        Visibility::Hidden,
    ));
}

fn sync_grid_overlay(
    selection: Res<Selection>,
    snaps: Query<&GridSnap>,
    mut grids: Query<&mut Visibility, With<GridOverlay>>,
) {
    let visible = selection
        .primary()
        .and_then(|entity| snaps.get(entity).ok())
        .is_some_and(|snap| snap.0);
    let wanted = if visible {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    };
    for mut visibility in &mut grids {
        if *visibility != wanted {
            *visibility = wanted;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::RunSystemOnce;

    #[test]
    fn new_status_message_replaces_the_old_one() {
        let mut world = World::new();
        world.insert_resource(SandboxSettings::default());
        world.add_observer(on_status_message);

        world.trigger(StatusMessage::info("Saved Crate"));
        world.flush();
        world.trigger(StatusMessage::warning("No object selected."));
        world.flush();

        let toasts: Vec<ToastVariant> = world
            .query_filtered::<&ToastVariant, With<Toast>>()
            .iter(&world)
            .copied()
            .collect();
        assert_eq!(toasts, vec![ToastVariant::Warning]);
    }

    #[test]
    fn grid_overlay_follows_selected_snap_flag() {
        let mut world = World::new();
        world.init_resource::<Selection>();
        let grid = world.spawn((GridOverlay, Visibility::Hidden)).id();
        let prop = world.spawn(GridSnap(true)).id();

        world
            .run_system_once(move |mut commands: Commands, mut selection: ResMut<Selection>| {
                selection.select(&mut commands, prop);
            })
            .unwrap();
        world.run_system_once(sync_grid_overlay).unwrap();
        assert_eq!(world.get::<Visibility>(grid), Some(&Visibility::Inherited));

        world.get_mut::<GridSnap>(prop).unwrap().toggle();
        world.run_system_once(sync_grid_overlay).unwrap();
        assert_eq!(world.get::<Visibility>(grid), Some(&Visibility::Hidden));
    }

    #[test]
    fn menu_hints_mention_closing_the_menu() {
        let menu = PlayerMode::InMenu {
            previous: propbox_camera::Locomotion::Walking,
        };
        assert!(control_hints(menu).contains("Esc"));
        assert!(control_hints(PlayerMode::Flying).contains("Space walk"));
    }
}
