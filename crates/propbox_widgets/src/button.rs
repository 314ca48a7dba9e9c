use bevy::color::palettes::tailwind;
use bevy::picking::hover::Hovered;
use bevy::prelude::*;

use crate::tokens::{CORNER_RADIUS_LG, PRIMARY_COLOR, TEXT_BODY_COLOR, TEXT_DISPLAY_COLOR, TEXT_SIZE};

/// Fired on a button entity when it is pressed.
#[derive(EntityEvent)]
pub struct ButtonClickEvent {
    pub entity: Entity,
}

pub fn plugin(app: &mut App) {
    app.add_systems(Update, (handle_hover, handle_button_click));
}

#[derive(Component)]
pub struct PropboxButton;

#[derive(Component, Default, Clone, Copy, PartialEq)]
pub enum ButtonVariant {
    #[default]
    Default,
    Primary,
    Destructive,
    /// Solid color swatch; keeps its color on hover and only brightens the border.
    Swatch(Color),
}

impl ButtonVariant {
    pub fn bg_color(&self, hovered: bool) -> Color {
        match (self, hovered) {
            (Self::Default, false) => tailwind::ZINC_700.with_alpha(0.5).into(),
            (Self::Default, true) => tailwind::ZINC_700.with_alpha(0.8).into(),
            (Self::Primary, false) => PRIMARY_COLOR.into(),
            (Self::Primary, true) => PRIMARY_COLOR.with_alpha(0.9).into(),
            (Self::Destructive, false) => tailwind::RED_500.into(),
            (Self::Destructive, true) => tailwind::RED_600.into(),
            (Self::Swatch(color), _) => *color,
        }
    }

    pub fn border_color(&self, hovered: bool) -> Color {
        match (self, hovered) {
            (Self::Swatch(_), true) => TEXT_DISPLAY_COLOR.into(),
            (Self::Swatch(_), false) => tailwind::ZINC_600.into(),
            (Self::Default, _) => tailwind::ZINC_700.into(),
            (Self::Primary, _) => PRIMARY_COLOR.into(),
            (Self::Destructive, _) => tailwind::RED_500.into(),
        }
    }

    pub fn text_color(&self) -> Srgba {
        match self {
            Self::Default | Self::Swatch(_) => TEXT_BODY_COLOR,
            Self::Primary | Self::Destructive => TEXT_DISPLAY_COLOR,
        }
    }
}

fn button_base(variant: ButtonVariant, width: Val) -> impl Bundle {
    (
        Button,
        PropboxButton,
        variant,
        Hovered::default(),
        Node {
            width,
            height: px(24.0),
            padding: UiRect::horizontal(px(8.0)),
            border: UiRect::all(px(1.0)),
            border_radius: BorderRadius::all(CORNER_RADIUS_LG),
            justify_content: JustifyContent::Center,
            align_items: AlignItems::Center,
            ..default()
        },
        BackgroundColor(variant.bg_color(false)),
        BorderColor::all(variant.border_color(false)),
    )
}

/// Text button. Listen for [`ButtonClickEvent`] on the spawned entity.
pub fn button(label: impl Into<String>, variant: ButtonVariant) -> impl Bundle {
    (
        button_base(variant, Val::Auto),
        children![(
            Text::new(label),
            TextFont {
                font_size: TEXT_SIZE,
                ..default()
            },
            TextColor(variant.text_color().into()),
            Pickable::IGNORE,
        )],
    )
}

/// Square color swatch button.
pub fn swatch_button(color: Color) -> impl Bundle {
    button_base(ButtonVariant::Swatch(color), px(24.0))
}

fn handle_hover(
    mut buttons: Query<
        (&ButtonVariant, &Hovered, &mut BackgroundColor, &mut BorderColor),
        (Changed<Hovered>, With<PropboxButton>),
    >,
) {
    for (variant, hovered, mut bg, mut border) in &mut buttons {
        let is_hovered = hovered.get();
        bg.0 = variant.bg_color(is_hovered);
        *border = BorderColor::all(variant.border_color(is_hovered));
    }
}

fn handle_button_click(
    interactions: Query<(Entity, &Interaction), (Changed<Interaction>, With<PropboxButton>)>,
    mut commands: Commands,
) {
    for (entity, interaction) in &interactions {
        if *interaction == Interaction::Pressed {
            commands.trigger(ButtonClickEvent { entity });
        }
    }
}
