use bevy::{picking::hover::Hovered, prelude::*};

use crate::tokens::{self, CORNER_RADIUS};

pub fn plugin(app: &mut App) {
    app.add_systems(Update, (highlight_hovered_rows, handle_row_click));
}

/// Vertical list container.
#[derive(Component)]
pub struct ListView;

/// A clickable list row.
#[derive(Component)]
pub struct ListRow {
    pub index: usize,
}

/// Fired on a row entity when it is pressed.
#[derive(EntityEvent)]
pub struct ListRowClickEvent {
    pub entity: Entity,
    pub index: usize,
}

pub fn list_view() -> impl Bundle {
    (
        ListView,
        Node {
            flex_direction: FlexDirection::Column,
            row_gap: px(tokens::SPACING_XS),
            width: percent(100),
            max_height: px(160.0),
            overflow: Overflow::scroll_y(),
            ..default()
        },
    )
}

/// Row bundle: `[index] label`. The label entity carries `label_marker`.
pub fn list_row(index: usize, label: impl Into<String>, label_marker: impl Bundle) -> impl Bundle {
    (
        ListRow { index },
        Button,
        Hovered::default(),
        Node {
            flex_direction: FlexDirection::Row,
            align_items: AlignItems::Center,
            column_gap: px(tokens::SPACING_SM),
            padding: UiRect::axes(px(tokens::SPACING_SM), px(1.0)),
            min_height: px(tokens::ROW_HEIGHT),
            border_radius: BorderRadius::all(CORNER_RADIUS),
            width: percent(100),
            ..default()
        },
        BackgroundColor(Color::NONE),
        children![
            (
                Text::new(format!("[{index}]")),
                TextFont {
                    font_size: tokens::TEXT_SIZE_SM,
                    ..default()
                },
                TextColor(tokens::TEXT_MUTED_COLOR.into()),
                Node {
                    min_width: px(28.0),
                    flex_shrink: 0.0,
                    ..default()
                },
                Pickable::IGNORE,
            ),
            (
                label_marker,
                Text::new(label),
                TextFont {
                    font_size: tokens::TEXT_SIZE,
                    ..default()
                },
                TextColor(tokens::TEXT_BODY_COLOR.into()),
                Pickable::IGNORE,
            ),
        ],
    )
}

fn highlight_hovered_rows(
    mut rows: Query<(&Hovered, &mut BackgroundColor), (Changed<Hovered>, With<ListRow>)>,
) {
    for (hovered, mut bg) in &mut rows {
        bg.0 = if hovered.get() { tokens::HOVER_BG } else { Color::NONE };
    }
}

fn handle_row_click(
    rows: Query<(Entity, &ListRow, &Interaction), Changed<Interaction>>,
    mut commands: Commands,
) {
    for (entity, row, interaction) in &rows {
        if *interaction == Interaction::Pressed {
            commands.trigger(ListRowClickEvent {
                entity,
                index: row.index,
            });
        }
    }
}
