use avian3d::prelude::*;
use bevy::{
    prelude::*,
    window::{MonitorSelection, PrimaryWindow, WindowMode},
};
use bevy_ui_text_input::{TextInputBuffer, TextInputQueue};
use propbox_widgets::{
    button::{ButtonClickEvent, ButtonVariant, button, swatch_button},
    list_view::list_view,
    text_field::{TextFieldCommit, set_text_field_value, text_field},
    tokens::{
        PANEL_BG, PANEL_HEADER_BG, SPACING_MD, SPACING_SM, TEXT_BODY_COLOR, TEXT_DISPLAY_COLOR,
        TEXT_MUTED_COLOR, TEXT_SIZE, TEXT_SIZE_LG,
    },
};

use crate::{
    SandboxSet,
    hud::StatusMessage,
    interactable::{GridSnap, remove_highlight_fill},
    interaction::Gesture,
    palette::{Palette, PaletteList},
    physics_controls::{
        PHYSICS_MATERIALS, PhysicsMaterialPreset, PhysicsMaterialTag, RotationLocked, TimePause,
        apply_physics_material, toggle_gravity, toggle_rotation_lock,
    },
    player::PlayerMode,
    props::reset_props,
    selection::Selection,
    settings::SandboxSettings,
    viewer::{ShowInViewer, ViewerViewport},
};

pub struct PanelPlugin;

impl Plugin for PanelPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, (setup_swatch_materials, spawn_menu_panel))
            .add_systems(
                Update,
                (sync_menu_visibility, sync_rename_field, update_readouts).in_set(SandboxSet::Ui),
            )
            .add_observer(on_rename_commit);
    }
}

pub const PANEL_WIDTH: f32 = 340.0;

pub const SWATCHES: [(&str, Color); 8] = [
    ("Red", Color::srgb(0.85, 0.15, 0.15)),
    ("Orange", Color::srgb(0.95, 0.5, 0.1)),
    ("Yellow", Color::srgb(0.95, 0.85, 0.15)),
    ("Green", Color::srgb(0.2, 0.7, 0.25)),
    ("Blue", Color::srgb(0.15, 0.35, 0.9)),
    ("Purple", Color::srgb(0.55, 0.2, 0.8)),
    ("Black", Color::srgb(0.05, 0.05, 0.05)),
    ("White", Color::srgb(0.95, 0.95, 0.95)),
];

/// Root of the menu. Only displayed while the player is in the menu.
#[derive(Component)]
pub struct MenuPanel;

#[derive(Component)]
pub struct RenameField;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OffsetGroup {
    Position,
    Scale,
}

impl OffsetGroup {
    fn title(self) -> &'static str {
        match self {
            Self::Position => "Position",
            Self::Scale => "Scale",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::X => "X",
            Self::Y => "Y",
            Self::Z => "Z",
        }
    }
}

/// Text field holding the per-axis amount the `+`/`-` buttons apply.
#[derive(Component, Clone, Copy, Debug)]
pub struct OffsetField {
    pub group: OffsetGroup,
    pub axis: Axis,
}

/// Text kept in sync with the selected prop.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Readout {
    Axis { group: OffsetGroup, axis: Axis },
    PhysicsMaterial,
    Flags,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NudgeDirection {
    Increase,
    Decrease,
}

impl NudgeDirection {
    fn sign(self) -> f32 {
        match self {
            Self::Increase => 1.0,
            Self::Decrease => -1.0,
        }
    }
}

#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub enum PanelAction {
    Nudge {
        group: OffsetGroup,
        direction: NudgeDirection,
    },
    ResetRotation,
    Material(usize),
    PhysicsMaterial(usize),
    ToggleGridSnap,
    ToggleGravity,
    ToggleRotationLock,
    ToggleTimePause,
    SaveToPalette,
    ToggleFullscreen,
    ResetScene,
    Quit,
}

impl PanelAction {
    pub fn needs_selection(self) -> bool {
        !matches!(
            self,
            Self::ToggleTimePause | Self::ToggleFullscreen | Self::ResetScene | Self::Quit
        )
    }
}

/// Materials behind the colour swatches, indexed like [`SWATCHES`].
#[derive(Resource, Default)]
pub struct SwatchMaterials(pub Vec<Handle<StandardMaterial>>);

/// Snapshot of the selected prop's values shown by the readouts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PropReadings {
    pub translation: Vec3,
    pub scale: Vec3,
    pub physics_material: Option<usize>,
    pub grid_snap: bool,
    pub gravity: bool,
    pub rotation_locked: bool,
}

/// Offset typed into a field. Empty means zero; `None` for anything that is
/// not a finite number.
pub fn parse_offset(text: &str) -> Option<f32> {
    let text = text.trim();
    if text.is_empty() {
        return Some(0.0);
    }
    text.parse::<f32>().ok().filter(|value| value.is_finite())
}

/// New scale after a nudge, never below `min_scale` on any axis.
pub fn scaled(scale: Vec3, delta: Vec3, min_scale: f32) -> Vec3 {
    (scale + delta).max(Vec3::splat(min_scale))
}

fn on_off(value: bool) -> &'static str {
    if value { "On" } else { "Off" }
}

pub fn readout_text(readout: Readout, readings: Option<&PropReadings>) -> String {
    match readout {
        Readout::Axis { group, axis } => {
            let Some(readings) = readings else {
                return format!("{}: N/A", axis.label());
            };
            let values = match group {
                OffsetGroup::Position => readings.translation,
                OffsetGroup::Scale => readings.scale,
            };
            format!("{}: {:.2}", axis.label(), values[axis.index()])
        }
        Readout::PhysicsMaterial => {
            let name = readings
                .and_then(|r| r.physics_material)
                .and_then(PhysicsMaterialPreset::get)
                .map_or("N/A", |preset| preset.name);
            format!("Current material: {name}")
        }
        Readout::Flags => match readings {
            Some(r) => format!(
                "Grid snap: {}  |  Gravity: {}  |  Rotation lock: {}",
                on_off(r.grid_snap),
                on_off(r.gravity),
                on_off(r.rotation_locked)
            ),
            None => "No object selected".to_string(),
        },
    }
}

fn setup_swatch_materials(mut commands: Commands, mut materials: ResMut<Assets<StandardMaterial>>) {
    let handles = SWATCHES
        .iter()
        .map(|(_, color)| {
            materials.add(StandardMaterial {
                base_color: *color,
                perceptual_roughness: 0.6,
                ..default()
            })
        })
        .collect();
    commands.insert_resource(SwatchMaterials(handles));
}

fn section_header(title: &str) -> impl Bundle {
    (
        Node {
            width: percent(100),
            padding: UiRect::axes(px(SPACING_SM), px(2)),
            margin: UiRect::top(px(SPACING_SM)),
            ..default()
        },
        BackgroundColor(PANEL_HEADER_BG),
        children![(
            Text::new(title),
            TextFont {
                font_size: TEXT_SIZE,
                ..default()
            },
            TextColor(TEXT_DISPLAY_COLOR.into()),
        )],
    )
}

fn row() -> impl Bundle {
    Node {
        flex_direction: FlexDirection::Row,
        flex_wrap: FlexWrap::Wrap,
        align_items: AlignItems::Center,
        column_gap: px(SPACING_SM),
        row_gap: px(SPACING_SM),
        width: percent(100),
        ..default()
    }
}

fn readout(readout: Readout) -> impl Bundle {
    (
        readout,
        Text::new(readout_text(readout, None)),
        TextFont {
            font_size: TEXT_SIZE,
            ..default()
        },
        TextColor(TEXT_BODY_COLOR.into()),
        Node {
            min_width: px(90),
            ..default()
        },
    )
}

fn queue_panel_action(trigger: On<ButtonClickEvent>, actions: Query<&PanelAction>, mut commands: Commands) {
    let Ok(&action) = actions.get(trigger.event_target()) else {
        return;
    };
    commands.queue(move |world: &mut World| apply_panel_action(world, action));
}

fn action_button(label: &str, variant: ButtonVariant, action: PanelAction) -> impl Bundle {
    (button(label, variant), action)
}

fn transform_section(panel: &mut ChildSpawnerCommands, group: OffsetGroup) {
    panel.spawn(section_header(group.title()));
    panel.spawn(row()).with_children(|row| {
        for axis in Axis::ALL {
            row.spawn(readout(Readout::Axis { group, axis }));
        }
    });
    panel.spawn(row()).with_children(|row| {
        for axis in Axis::ALL {
            row.spawn((OffsetField { group, axis }, text_field(axis.label(), px(56))));
        }
        row.spawn(action_button(
            "+",
            ButtonVariant::Default,
            PanelAction::Nudge {
                group,
                direction: NudgeDirection::Increase,
            },
        ))
        .observe(queue_panel_action);
        row.spawn(action_button(
            "-",
            ButtonVariant::Default,
            PanelAction::Nudge {
                group,
                direction: NudgeDirection::Decrease,
            },
        ))
        .observe(queue_panel_action);
    });
}

fn spawn_menu_panel(mut commands: Commands) {
    commands
        .spawn((
            MenuPanel,
            Node {
                display: Display::None,
                position_type: PositionType::Absolute,
                right: px(0),
                top: px(0),
                width: px(PANEL_WIDTH),
                height: percent(100),
                flex_direction: FlexDirection::Column,
                row_gap: px(SPACING_SM),
                padding: UiRect::all(px(SPACING_MD)),
                overflow: Overflow::scroll_y(),
                ..default()
            },
            BackgroundColor(PANEL_BG),
        ))
        .with_children(|panel| {
            panel.spawn((
                Text::new("Selected object"),
                TextFont {
                    font_size: TEXT_SIZE_LG,
                    ..default()
                },
                TextColor(TEXT_DISPLAY_COLOR.into()),
            ));
            panel.spawn((RenameField, text_field("Name", percent(100))));
            panel.spawn((
                ViewerViewport,
                Node {
                    width: percent(100),
                    height: px(170),
                    ..default()
                },
                BackgroundColor(Color::BLACK),
            ));

            transform_section(panel, OffsetGroup::Position);
            transform_section(panel, OffsetGroup::Scale);

            panel.spawn(section_header("Rotation"));
            panel.spawn(row()).with_children(|row| {
                row.spawn(action_button("Reset rotation", ButtonVariant::Default, PanelAction::ResetRotation))
                    .observe(queue_panel_action);
                row.spawn(action_button(
                    "Lock rotation",
                    ButtonVariant::Default,
                    PanelAction::ToggleRotationLock,
                ))
                .observe(queue_panel_action);
            });

            panel.spawn(section_header("Material"));
            panel.spawn(row()).with_children(|row| {
                for (index, (_, color)) in SWATCHES.iter().enumerate() {
                    row.spawn((swatch_button(*color), PanelAction::Material(index)))
                        .observe(queue_panel_action);
                }
            });

            panel.spawn(section_header("Physics material"));
            panel.spawn(readout(Readout::PhysicsMaterial));
            panel.spawn(row()).with_children(|row| {
                for (index, preset) in PHYSICS_MATERIALS.iter().enumerate() {
                    row.spawn(action_button(preset.name, ButtonVariant::Default, PanelAction::PhysicsMaterial(index)))
                        .observe(queue_panel_action);
                }
            });

            panel.spawn(section_header("Physics"));
            panel.spawn(readout(Readout::Flags));
            panel.spawn(row()).with_children(|row| {
                row.spawn(action_button("Grid snap", ButtonVariant::Default, PanelAction::ToggleGridSnap))
                    .observe(queue_panel_action);
                row.spawn(action_button("Gravity", ButtonVariant::Default, PanelAction::ToggleGravity))
                    .observe(queue_panel_action);
                row.spawn(action_button("Pause time", ButtonVariant::Primary, PanelAction::ToggleTimePause))
                    .observe(queue_panel_action);
            });

            panel.spawn(section_header("Palette"));
            panel.spawn(action_button("Save to palette", ButtonVariant::Primary, PanelAction::SaveToPalette))
                .observe(queue_panel_action);
            panel.spawn((
                Text::new("Click an entry to spawn it where you are looking."),
                TextFont {
                    font_size: TEXT_SIZE,
                    ..default()
                },
                TextColor(TEXT_MUTED_COLOR.into()),
            ));
            panel.spawn((PaletteList, list_view()));

            panel.spawn(section_header("Game"));
            panel.spawn(row()).with_children(|row| {
                row.spawn(action_button("Fullscreen", ButtonVariant::Default, PanelAction::ToggleFullscreen))
                    .observe(queue_panel_action);
                row.spawn(action_button("Reset scene", ButtonVariant::Destructive, PanelAction::ResetScene))
                    .observe(queue_panel_action);
                row.spawn(action_button("Quit", ButtonVariant::Destructive, PanelAction::Quit))
                    .observe(queue_panel_action);
            });
        });
}

fn sync_menu_visibility(mode: Res<PlayerMode>, mut menus: Query<&mut Node, With<MenuPanel>>) {
    if !mode.is_changed() {
        return;
    }
    let display = if mode.in_menu() {
        Display::Flex
    } else {
        Display::None
    };
    if menus.is_empty() {
        warn_once!("No menu panel to show");
        return;
    }
    for mut node in &mut menus {
        node.display = display;
    }
}

fn sync_rename_field(
    selection: Res<Selection>,
    names: Query<&Name>,
    mut fields: Query<&mut TextInputQueue, With<RenameField>>,
) {
    if !selection.is_changed() {
        return;
    }
    let text = selection
        .primary()
        .and_then(|entity| names.get(entity).ok())
        .map_or_else(|| "N/A".to_string(), |name| name.as_str().to_string());
    for mut queue in &mut fields {
        set_text_field_value(&mut queue, text.clone());
    }
}

fn on_rename_commit(
    trigger: On<TextFieldCommit>,
    mut commands: Commands,
    selection: Res<Selection>,
    fields: Query<(), With<RenameField>>,
) {
    if !fields.contains(trigger.event_target()) {
        return;
    }
    let Some(entity) = selection.primary() else {
        return;
    };
    commands.entity(entity).insert(Name::new(trigger.text.clone()));
}

fn update_readouts(
    selection: Res<Selection>,
    props: Query<(
        &Transform,
        Option<&PhysicsMaterialTag>,
        Option<&GridSnap>,
        Option<&GravityScale>,
        Has<RotationLocked>,
    )>,
    mut readouts: Query<(&Readout, &mut Text)>,
) {
    let readings = selection
        .primary()
        .and_then(|entity| props.get(entity).ok())
        .map(|(transform, tag, snap, gravity, locked)| PropReadings {
            translation: transform.translation,
            scale: transform.scale,
            physics_material: tag.map(|t| t.0),
            grid_snap: snap.is_some_and(|s| s.0),
            gravity: gravity.is_none_or(|g| g.0 != 0.0),
            rotation_locked: locked,
        });

    for (readout, mut text) in &mut readouts {
        let new_text = readout_text(*readout, readings.as_ref());
        if text.0 != new_text {
            text.0 = new_text;
        }
    }
}

fn status(world: &mut World, message: StatusMessage) {
    world.trigger(message);
}

/// Offsets typed for `group`. Unparseable fields count as zero and raise a
/// warning.
fn read_offsets(world: &mut World, group: OffsetGroup) -> Vec3 {
    let mut offsets = Vec3::ZERO;
    let mut invalid = false;
    let mut fields = world.query::<(&OffsetField, &TextInputBuffer)>();
    for (field, buffer) in fields.iter(world) {
        if field.group != group {
            continue;
        }
        match parse_offset(&buffer.get_text()) {
            Some(value) => offsets[field.axis.index()] = value,
            None => invalid = true,
        }
    }
    if invalid {
        warn!("Invalid {} offset, using 0", group.title().to_lowercase());
        status(world, StatusMessage::warning("Invalid offset, using 0"));
    }
    offsets
}

pub fn nudge_position(world: &mut World, entity: Entity, delta: Vec3) {
    if let Some(mut transform) = world.get_mut::<Transform>(entity) {
        transform.translation += delta;
    }
}

pub fn nudge_scale(world: &mut World, entity: Entity, delta: Vec3) {
    let min_scale = world.resource::<SandboxSettings>().min_scale;
    if let Some(mut transform) = world.get_mut::<Transform>(entity) {
        transform.scale = scaled(transform.scale, delta, min_scale);
    }
}

/// Swap the prop's material, drop its stale highlight fill and refresh the
/// preview.
pub fn apply_material(world: &mut World, entity: Entity, material: Handle<StandardMaterial>) {
    world.entity_mut(entity).insert(MeshMaterial3d(material));
    remove_highlight_fill(world, entity);
    world.trigger(ShowInViewer { entity });
}

fn toggle_fullscreen(world: &mut World) {
    let mut windows = world.query_filtered::<&mut Window, With<PrimaryWindow>>();
    let Ok(mut window) = windows.single_mut(world) else {
        return;
    };
    window.mode = match window.mode {
        WindowMode::Windowed => WindowMode::BorderlessFullscreen(MonitorSelection::Current),
        _ => WindowMode::Windowed,
    };
}

/// Despawn every prop and rebuild the demo set, forgetting the palette.
pub fn reset_scene(world: &mut World) {
    reset_props(world);
    world.resource_mut::<Palette>().clear();
    *world.resource_mut::<Gesture>() = Gesture::Idle;
    info!("Scene reset");
    status(world, StatusMessage::info("Scene reset"));
}

pub fn apply_panel_action(world: &mut World, action: PanelAction) {
    let selected = world.resource::<Selection>().primary();
    if action.needs_selection() && selected.is_none() {
        warn!("No object selected.");
        return;
    }

    match (action, selected) {
        (PanelAction::ToggleTimePause, _) => {
            let paused = world.resource_mut::<TimePause>().toggle();
            let text = if paused { "Time has paused!" } else { "Time resumes" };
            status(world, StatusMessage::info(text));
        }
        (PanelAction::ToggleFullscreen, _) => toggle_fullscreen(world),
        (PanelAction::ResetScene, _) => reset_scene(world),
        (PanelAction::Quit, _) => {
            info!("Quit requested");
            world.write_message(AppExit::Success);
        }
        (_, None) => {}
        (PanelAction::Nudge { group, direction }, Some(entity)) => {
            let delta = read_offsets(world, group) * direction.sign();
            match group {
                OffsetGroup::Position => nudge_position(world, entity, delta),
                OffsetGroup::Scale => nudge_scale(world, entity, delta),
            }
        }
        (PanelAction::ResetRotation, Some(entity)) => {
            if let Some(mut transform) = world.get_mut::<Transform>(entity) {
                transform.rotation = Quat::IDENTITY;
            }
        }
        (PanelAction::Material(index), Some(entity)) => {
            let material = world
                .get_resource::<SwatchMaterials>()
                .and_then(|swatches| swatches.0.get(index).cloned());
            let (Some(material), Some((name, _))) = (material, SWATCHES.get(index)) else {
                warn!("Invalid material selection: {index}");
                return;
            };
            apply_material(world, entity, material);
            status(world, StatusMessage::info(format!("Material: {name}")));
        }
        (PanelAction::PhysicsMaterial(index), Some(entity)) => {
            if let Some(name) = apply_physics_material(world, entity, index) {
                status(world, StatusMessage::info(format!("Physics material: {name}")));
            }
        }
        (PanelAction::ToggleGridSnap, Some(entity)) => {
            let Some(mut snap) = world.get_mut::<GridSnap>(entity) else {
                return;
            };
            let text = if snap.toggle() {
                "Object is snapping to grid"
            } else {
                "Object is NOT snapping to grid"
            };
            status(world, StatusMessage::info(text));
        }
        (PanelAction::ToggleGravity, Some(entity)) => {
            let text = if toggle_gravity(world, entity) {
                "Gravity enabled"
            } else {
                "Gravity disabled"
            };
            status(world, StatusMessage::info(text));
        }
        (PanelAction::ToggleRotationLock, Some(entity)) => {
            let text = if toggle_rotation_lock(world, entity) {
                "Rotation locked"
            } else {
                "Rotation unlocked"
            };
            status(world, StatusMessage::info(text));
        }
        (PanelAction::SaveToPalette, Some(entity)) => {
            let name = world
                .get::<Name>(entity)
                .map_or_else(|| format!("{entity}"), |name| name.as_str().to_string());
            if world.resource_mut::<Palette>().save(Some(entity)) {
                status(world, StatusMessage::info(format!("Saved {name}")));
            } else {
                status(world, StatusMessage::info(format!("{name} is already in the palette")));
            }
        }
    }
}
