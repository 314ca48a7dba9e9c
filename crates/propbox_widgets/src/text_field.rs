use bevy::input_focus::InputFocus;
use bevy::prelude::*;
use bevy_ui_text_input::actions::{TextInputAction, TextInputEdit};
use bevy_ui_text_input::*;

use crate::tokens::{BORDER_COLOR, CORNER_RADIUS, INPUT_BG, INPUT_HEIGHT, PRIMARY_COLOR, TEXT_BODY_COLOR, TEXT_SIZE};

pub fn plugin(app: &mut App) {
    if !app.is_plugin_added::<TextInputPlugin>() {
        app.add_plugins(TextInputPlugin);
    }
    app.add_systems(Update, (handle_focus_style, commit_on_unfocus));
}

/// Fired on a text field when it loses focus (click elsewhere or Enter).
#[derive(EntityEvent)]
pub struct TextFieldCommit {
    pub entity: Entity,
    pub text: String,
}

#[derive(Component)]
pub struct PropboxTextField;

/// Replace the whole contents of a text field.
pub fn set_text_field_value(queue: &mut TextInputQueue, text: impl Into<String>) {
    queue.add(TextInputAction::Edit(TextInputEdit::SelectAll));
    queue.add(TextInputAction::Edit(TextInputEdit::Paste(text.into())));
}

/// Single-line text field. `width` of `Val::Auto` grows to fill the row.
pub fn text_field(placeholder: impl Into<String>, width: Val) -> impl Bundle {
    (
        PropboxTextField,
        TextInputNode {
            mode: TextInputMode::SingleLine,
            clear_on_submit: false,
            unfocus_on_submit: true,
            ..default()
        },
        TextFont {
            font_size: TEXT_SIZE,
            ..default()
        },
        TextColor(TEXT_BODY_COLOR.into()),
        TextInputStyle {
            cursor_color: TEXT_BODY_COLOR.into(),
            cursor_width: 1.0,
            selection_color: PRIMARY_COLOR.with_alpha(0.3).into(),
            ..default()
        },
        TextInputPrompt {
            text: placeholder.into(),
            color: Some(TEXT_BODY_COLOR.with_alpha(0.25).into()),
            ..default()
        },
        Node {
            width,
            flex_grow: if width == Val::Auto { 1.0 } else { 0.0 },
            height: px(INPUT_HEIGHT),
            padding: UiRect::horizontal(px(4.0)),
            border: UiRect::all(px(1.0)),
            border_radius: BorderRadius::all(CORNER_RADIUS),
            justify_content: JustifyContent::Center,
            overflow: Overflow::clip(),
            ..default()
        },
        BackgroundColor(INPUT_BG),
        BorderColor::all(BORDER_COLOR),
    )
}

fn handle_focus_style(
    focus: Res<InputFocus>,
    mut fields: Query<(Entity, &mut BorderColor), With<PropboxTextField>>,
) {
    if !focus.is_changed() {
        return;
    }
    for (entity, mut border) in &mut fields {
        let color = if focus.0 == Some(entity) {
            PRIMARY_COLOR
        } else {
            BORDER_COLOR
        };
        *border = BorderColor::all(color);
    }
}

fn commit_on_unfocus(
    mut commands: Commands,
    focus: Res<InputFocus>,
    mut prev_focus: Local<Option<Entity>>,
    fields: Query<&TextInputBuffer, With<PropboxTextField>>,
) {
    let prev = *prev_focus;
    *prev_focus = focus.0;

    let Some(was_focused) = prev else { return };
    if focus.0 == Some(was_focused) {
        return;
    }
    let Ok(buffer) = fields.get(was_focused) else {
        return;
    };

    commands.trigger(TextFieldCommit {
        entity: was_focused,
        text: buffer.get_text(),
    });
}
