pub mod hud;
pub mod interactable;
pub mod interaction;
pub mod palette;
pub mod panel;
pub mod physics_controls;
pub mod player;
pub mod props;
pub mod selection;
pub mod settings;
pub mod viewer;

#[cfg(test)]
mod testing;

use avian3d::prelude::*;
use bevy::{
    input::mouse::{MouseScrollUnit, MouseWheel},
    picking::hover::HoverMap,
    prelude::*,
};
use bevy_infinite_grid::InfiniteGridPlugin;
use propbox_camera::PropboxCameraPlugin;
use propbox_widgets::PropboxWidgetsPlugin;
use settings::SandboxSettings;

/// Per-frame ordering of the sandbox. Input is gathered once, then the mode,
/// aim and selection are resolved before props are manipulated.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SandboxSet {
    Input,
    Mode,
    Aim,
    Select,
    Manipulate,
    Props,
    Ui,
}

#[derive(Default)]
pub struct PropboxPlugin {
    pub settings: SandboxSettings,
}

impl Plugin for PropboxPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(self.settings.clone())
            .add_plugins((
                PhysicsPlugins::default(),
                InfiniteGridPlugin,
                PropboxCameraPlugin,
                PropboxWidgetsPlugin,
            ))
            .configure_sets(
                Update,
                (
                    SandboxSet::Input,
                    SandboxSet::Mode,
                    SandboxSet::Aim,
                    SandboxSet::Select,
                    SandboxSet::Manipulate,
                    SandboxSet::Props,
                    SandboxSet::Ui,
                )
                    .chain(),
            )
            .add_plugins((
                selection::SelectionPlugin,
                interactable::InteractablePlugin,
                physics_controls::PhysicsControlsPlugin,
                props::PropsPlugin,
                player::PlayerPlugin,
                interaction::InteractionPlugin,
                palette::PalettePlugin,
                viewer::ViewerPlugin,
                panel::PanelPlugin,
                hud::HudPlugin,
            ))
            .add_systems(Update, send_scroll_events.in_set(SandboxSet::Ui))
            .add_observer(on_scroll);
    }
}

const SCROLL_LINE_HEIGHT: f32 = 21.0;

/// Wheel input over a UI node, bubbled up until a scrollable ancestor takes it.
#[derive(EntityEvent, Debug)]
#[entity_event(propagate, auto_propagate)]
struct Scroll {
    entity: Entity,
    delta: Vec2,
}

fn send_scroll_events(
    mut mouse_wheel: MessageReader<MouseWheel>,
    hover_map: Res<HoverMap>,
    mut commands: Commands,
) {
    for event in mouse_wheel.read() {
        let mut delta = -Vec2::new(event.x, event.y);
        if event.unit == MouseScrollUnit::Line {
            delta *= SCROLL_LINE_HEIGHT;
        }
        for pointer_map in hover_map.values() {
            for entity in pointer_map.keys().copied() {
                commands.trigger(Scroll { entity, delta });
            }
        }
    }
}

fn on_scroll(mut scroll: On<Scroll>, mut query: Query<(&mut ScrollPosition, &Node, &ComputedNode)>) {
    let Ok((mut scroll_position, node, computed)) = query.get_mut(scroll.entity) else {
        return;
    };
    if node.overflow.y != OverflowAxis::Scroll || scroll.delta.y == 0.0 {
        return;
    }

    let max_offset = (computed.content_size() - computed.size()) * computed.inverse_scale_factor();
    let at_limit = if scroll.delta.y > 0.0 {
        scroll_position.y >= max_offset.y
    } else {
        scroll_position.y <= 0.0
    };
    if at_limit {
        return;
    }
    scroll_position.y = (scroll_position.y + scroll.delta.y).clamp(0.0, max_offset.y.max(0.0));
    scroll.propagate(false);
}
