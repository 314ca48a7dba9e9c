use std::time::Duration;

use bevy::color::palettes::tailwind;
use bevy::prelude::*;

use crate::tokens::{CORNER_RADIUS, TEXT_BODY_COLOR, TEXT_SIZE};

pub const TOAST_TOP_OFFSET: f32 = 48.0;

pub fn plugin(app: &mut App) {
    app.add_systems(Update, tick_toast_duration);
}

#[derive(Component)]
pub struct Toast;

#[derive(Component, Default, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastVariant {
    #[default]
    Info,
    Warning,
}

impl ToastVariant {
    pub fn bg_color(&self) -> Srgba {
        match self {
            Self::Info => tailwind::ZINC_700,
            Self::Warning => tailwind::AMBER_800,
        }
    }
}

/// Remaining lifetime of a toast. The toast despawns when it finishes.
#[derive(Component)]
pub struct ToastDuration(pub Timer);

pub fn toast(variant: ToastVariant, content: impl Into<String>, duration: Duration) -> impl Bundle {
    (
        Toast,
        variant,
        ToastDuration(Timer::new(duration, TimerMode::Once)),
        Node {
            position_type: PositionType::Absolute,
            left: percent(50),
            top: px(TOAST_TOP_OFFSET),
            padding: UiRect::axes(px(12), px(6)),
            border: UiRect::all(px(1)),
            border_radius: BorderRadius::all(CORNER_RADIUS),
            align_items: AlignItems::Center,
            ..default()
        },
        UiTransform {
            translation: Val2 {
                x: percent(-50),
                y: px(0),
            },
            ..default()
        },
        BackgroundColor(variant.bg_color().into()),
        BorderColor::all(TEXT_BODY_COLOR.with_alpha(0.15)),
        GlobalZIndex(100),
        Pickable::IGNORE,
        children![(
            Text::new(content),
            TextFont {
                font_size: TEXT_SIZE,
                ..default()
            },
            TextColor(TEXT_BODY_COLOR.into()),
            Pickable::IGNORE,
        )],
    )
}

fn tick_toast_duration(
    mut commands: Commands,
    time: Res<Time>,
    mut toasts: Query<(Entity, &mut ToastDuration), With<Toast>>,
) {
    for (entity, mut duration) in &mut toasts {
        duration.0.tick(time.delta());
        if duration.0.is_finished() {
            commands.entity(entity).try_despawn();
        }
    }
}
