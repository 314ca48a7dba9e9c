use std::path::Path;

use anyhow::Context;
use bevy::prelude::*;
use serde::Deserialize;

/// Tunables for the whole sandbox. Every field has a default, so a settings
/// file only needs the keys it wants to override.
#[derive(Resource, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SandboxSettings {
    pub walk_speed: f32,
    pub fly_speed: f32,
    pub run_multiplier: f32,
    /// Radians per pixel of mouse motion.
    pub look_sensitivity: f32,
    pub max_pitch_degrees: f32,
    /// Eye height above the ground while walking.
    pub player_height: f32,
    pub gravity: f32,
    /// Radians per pixel when rotating a selected prop.
    pub object_rotation_sensitivity: f32,
    pub initial_max_drag_distance: f32,
    pub min_drag_distance: f32,
    /// Drag distance change per scroll line.
    pub scroll_step: f32,
    pub aim_distance: f32,
    /// Props below this world Y are deactivated.
    pub fall_floor_y: f32,
    /// Grid snapping only applies below this linear speed.
    pub snap_speed_threshold: f32,
    pub min_scale: f32,
    pub spawn_height_offset: f32,
    pub viewer_orbit_degrees_per_second: f32,
    pub viewer_distance_multiplier: f32,
    pub status_message_seconds: f32,
    pub bindings: InputBindings,
}

impl Default for SandboxSettings {
    fn default() -> Self {
        Self {
            walk_speed: 5.0,
            fly_speed: 10.0,
            run_multiplier: 2.0,
            look_sensitivity: 0.003,
            max_pitch_degrees: 80.0,
            player_height: 1.6,
            gravity: 9.81,
            object_rotation_sensitivity: 0.01,
            initial_max_drag_distance: 10.0,
            min_drag_distance: 1.0,
            scroll_step: 1.0,
            aim_distance: 1000.0,
            fall_floor_y: -20.0,
            snap_speed_threshold: 0.05,
            min_scale: 0.01,
            spawn_height_offset: 1.0,
            viewer_orbit_degrees_per_second: 20.0,
            viewer_distance_multiplier: 2.0,
            status_message_seconds: 5.0,
            bindings: InputBindings::default(),
        }
    }
}

#[derive(Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(default)]
pub struct InputBindings {
    pub toggle_flight: KeyCode,
    pub toggle_menu: KeyCode,
    pub delete: KeyCode,
    pub run: KeyCode,
    pub forward: KeyCode,
    pub back: KeyCode,
    pub left: KeyCode,
    pub right: KeyCode,
}

impl Default for InputBindings {
    fn default() -> Self {
        Self {
            toggle_flight: KeyCode::Space,
            toggle_menu: KeyCode::Escape,
            delete: KeyCode::Delete,
            run: KeyCode::ShiftLeft,
            forward: KeyCode::KeyW,
            back: KeyCode::KeyS,
            left: KeyCode::KeyA,
            right: KeyCode::KeyD,
        }
    }
}

impl SandboxSettings {
    /// Read settings from a JSON file, falling back to defaults when the file
    /// is absent or invalid.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            info!("No settings file at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(settings) => {
                info!("Loaded settings from {}", path.display());
                settings
            }
            Err(err) => {
                warn!("Ignoring settings file: {err:#}");
                Self::default()
            }
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn max_pitch(&self) -> f32 {
        self.max_pitch_degrees.to_radians()
    }
}
