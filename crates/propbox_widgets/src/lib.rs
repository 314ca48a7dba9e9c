pub mod button;
pub mod list_view;
pub mod text_field;
pub mod toast;
pub mod tokens;

use bevy::app::Plugin;

pub struct PropboxWidgetsPlugin;

impl Plugin for PropboxWidgetsPlugin {
    fn build(&self, app: &mut bevy::app::App) {
        // text_field::plugin adds TextInputPlugin, which brings InputDispatchPlugin with it.
        app.add_plugins((button::plugin, list_view::plugin, text_field::plugin, toast::plugin));
    }
}
