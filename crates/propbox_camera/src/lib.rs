use bevy::{input::mouse::MouseMotion, prelude::*};

pub struct PropboxCameraPlugin;

impl Plugin for PropboxCameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, (first_person_look, first_person_move).chain());
    }
}

/// How the player body moves through the world.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Locomotion {
    /// Moves on the horizontal plane of the body; vertical motion is left to gravity.
    #[default]
    Walking,
    /// Moves freely along the view direction.
    Flying,
}

/// Key layout used for movement.
#[derive(Clone, Copy, Debug)]
pub struct MovementKeys {
    pub forward: KeyCode,
    pub back: KeyCode,
    pub left: KeyCode,
    pub right: KeyCode,
    pub run: KeyCode,
}

impl Default for MovementKeys {
    fn default() -> Self {
        Self {
            forward: KeyCode::KeyW,
            back: KeyCode::KeyS,
            left: KeyCode::KeyA,
            right: KeyCode::KeyD,
            run: KeyCode::ShiftLeft,
        }
    }
}

/// Placed on the player body. The body carries yaw; the child tagged with
/// [`FirstPersonView`] carries pitch.
///
/// Controls:
/// - Mouse: look around (always, while enabled)
/// - WASD: move relative to the body (walking) or the view (flying)
/// - Shift (held): run speed multiplier
#[derive(Component)]
pub struct FirstPersonController {
    /// Mouse look sensitivity (radians per pixel).
    pub sensitivity: f32,
    pub walk_speed: f32,
    pub fly_speed: f32,
    pub run_multiplier: f32,
    /// Maximum pitch in either direction, in radians.
    pub max_pitch: f32,
    pub locomotion: Locomotion,
    /// Whether look and movement are processed. Cleared while a menu is open.
    pub enabled: bool,
    pub keys: MovementKeys,
    pub pitch: f32,
}

impl Default for FirstPersonController {
    fn default() -> Self {
        Self {
            sensitivity: 0.003,
            walk_speed: 5.0,
            fly_speed: 10.0,
            run_multiplier: 2.0,
            max_pitch: 80.0_f32.to_radians(),
            locomotion: Locomotion::Walking,
            enabled: true,
            keys: MovementKeys::default(),
            pitch: 0.0,
        }
    }
}

impl FirstPersonController {
    /// Full view rotation given the body yaw rotation.
    pub fn view_rotation(&self, body_rotation: Quat) -> Quat {
        body_rotation * Quat::from_rotation_x(self.pitch)
    }
}

/// Marker for the camera child of a [`FirstPersonController`] body.
#[derive(Component)]
pub struct FirstPersonView;

/// Applies a mouse delta to yaw/pitch. Returns `(yaw_delta, new_pitch)`.
pub fn look_delta(mouse_delta: Vec2, sensitivity: f32, pitch: f32, max_pitch: f32) -> (f32, f32) {
    let yaw = -mouse_delta.x * sensitivity;
    let pitch = (pitch - mouse_delta.y * sensitivity).clamp(-max_pitch, max_pitch);
    (yaw, pitch)
}

/// Unnormalized movement direction for the pressed axes. `forward` and
/// `right` are the basis to move along.
pub fn movement_direction(axes: Vec2, forward: Vec3, right: Vec3) -> Vec3 {
    forward * axes.y + right * axes.x
}

fn first_person_look(
    mut mouse_motion: MessageReader<MouseMotion>,
    mut bodies: Query<(&mut FirstPersonController, &mut Transform, &Children), Without<FirstPersonView>>,
    mut views: Query<&mut Transform, With<FirstPersonView>>,
) {
    let mut mouse_delta = Vec2::ZERO;
    for motion in mouse_motion.read() {
        mouse_delta += motion.delta;
    }

    for (mut controller, mut transform, children) in &mut bodies {
        if !controller.enabled || mouse_delta == Vec2::ZERO {
            continue;
        }

        let (yaw, pitch) = look_delta(
            mouse_delta,
            controller.sensitivity,
            controller.pitch,
            controller.max_pitch,
        );
        controller.pitch = pitch;
        transform.rotate_y(yaw);

        for child in children.iter() {
            if let Ok(mut view) = views.get_mut(child) {
                view.rotation = Quat::from_rotation_x(pitch);
            }
        }
    }
}

fn first_person_move(
    keyboard: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
    mut bodies: Query<(&FirstPersonController, &mut Transform), Without<FirstPersonView>>,
) {
    let dt = time.delta_secs();

    for (controller, mut transform) in &mut bodies {
        if !controller.enabled {
            continue;
        }
        let keys = controller.keys;

        let mut axes = Vec2::ZERO;
        if keyboard.pressed(keys.forward) {
            axes.y += 1.0;
        }
        if keyboard.pressed(keys.back) {
            axes.y -= 1.0;
        }
        if keyboard.pressed(keys.right) {
            axes.x += 1.0;
        }
        if keyboard.pressed(keys.left) {
            axes.x -= 1.0;
        }
        if axes == Vec2::ZERO {
            continue;
        }

        let (basis, speed) = match controller.locomotion {
            Locomotion::Walking => (transform.rotation, controller.walk_speed),
            Locomotion::Flying => (controller.view_rotation(transform.rotation), controller.fly_speed),
        };
        let direction = movement_direction(axes, basis * Vec3::NEG_Z, basis * Vec3::X);
        let run = if keyboard.pressed(keys.run) {
            controller.run_multiplier
        } else {
            1.0
        };

        transform.translation += direction.normalize_or_zero() * speed * run * dt;
    }
}
