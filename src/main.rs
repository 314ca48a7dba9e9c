use bevy::prelude::*;
use propbox::{PropboxPlugin, settings::SandboxSettings};

const SETTINGS_PATH: &str = "propbox.json";

fn main() -> AppExit {
    let mut app = App::new();
    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "Propbox".into(),
            ..default()
        }),
        ..default()
    }));
    // Loaded after DefaultPlugins so the log subscriber is already installed.
    app.add_plugins(PropboxPlugin {
        settings: SandboxSettings::load_or_default(SETTINGS_PATH),
    });
    app.run()
}
