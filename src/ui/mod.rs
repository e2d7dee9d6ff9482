//! On-screen UI: the HUD, the pause overlay, and audio playback.

use bevy::prelude::*;

pub mod audio;
pub mod hud;
pub mod pause;

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((hud::HudPlugin, pause::PausePlugin, audio::AudioPlugin));
    }
}
