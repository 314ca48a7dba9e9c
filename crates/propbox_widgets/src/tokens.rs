use bevy::color::palettes::tailwind;
use bevy::prelude::*;

// ---------------------------------------------------------------------------
// Corner radius
// ---------------------------------------------------------------------------

pub const CORNER_RADIUS: Val = Val::Px(2.0);
pub const CORNER_RADIUS_LG: Val = Val::Px(4.0);

// ---------------------------------------------------------------------------
// Colors
// ---------------------------------------------------------------------------

pub const PRIMARY_COLOR: Srgba = tailwind::BLUE_500;

/// Menu panel body background
pub const PANEL_BG: Color = Color::Srgba(Srgba {
    red: tailwind::ZINC_900.red,
    green: tailwind::ZINC_900.green,
    blue: tailwind::ZINC_900.blue,
    alpha: 0.92,
});
/// Section header background
pub const PANEL_HEADER_BG: Color = Color::Srgba(tailwind::ZINC_700);
/// Text input background
pub const INPUT_BG: Color = Color::Srgba(tailwind::ZINC_900);
pub const BORDER_COLOR: Srgba = tailwind::ZINC_700;
/// Hovered row background
pub const HOVER_BG: Color = Color::srgba(1.0, 1.0, 1.0, 0.1);

pub const TEXT_BODY_COLOR: Srgba = tailwind::ZINC_200;
pub const TEXT_DISPLAY_COLOR: Srgba = tailwind::ZINC_50;
pub const TEXT_MUTED_COLOR: Srgba = tailwind::ZINC_400;

// ---------------------------------------------------------------------------
// Sizes
// ---------------------------------------------------------------------------

pub const TEXT_SIZE_SM: f32 = 10.0;
pub const TEXT_SIZE: f32 = 12.0;
pub const TEXT_SIZE_LG: f32 = 14.0;

pub const SPACING_XS: f32 = 2.0;
pub const SPACING_SM: f32 = 4.0;
pub const SPACING_MD: f32 = 8.0;

pub const ROW_HEIGHT: f32 = 24.0;
pub const INPUT_HEIGHT: f32 = 24.0;
