//! Headless app shared by tests that need real colliders and ray casts.

use std::time::Duration;

use avian3d::prelude::*;
use bevy::{prelude::*, time::TimeUpdateStrategy};

use crate::{hud::StatusMessage, selection::SelectionPlugin, settings::SandboxSettings};

/// Transforms and physics without a window, advancing 20 ms per update so
/// every update runs at least one fixed physics step.
pub fn physics_app() -> App {
    let mut app = App::new();
    app.add_plugins((
        MinimalPlugins,
        TransformPlugin,
        AssetPlugin::default(),
        PhysicsPlugins::default(),
        SelectionPlugin,
    ))
    .init_asset::<Mesh>()
    .init_asset::<StandardMaterial>()
    .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(20)))
    .insert_resource(SandboxSettings::default());
    app.finish();
    app.cleanup();
    app
}

pub fn step(app: &mut App, frames: usize) {
    for _ in 0..frames {
        app.update();
    }
}

/// Every status message triggered since the log was installed.
#[derive(Resource, Default)]
pub struct StatusLog(pub Vec<StatusMessage>);

pub fn record_status(world: &mut World) {
    world.init_resource::<StatusLog>();
    world.add_observer(|trigger: On<StatusMessage>, mut log: ResMut<StatusLog>| {
        log.0.push(trigger.event().clone());
    });
}
