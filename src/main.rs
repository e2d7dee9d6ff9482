use bevy::prelude::*;
use bevy::window::WindowResolution;

use phantom_library::clock::ClockPlugin;
use phantom_library::mana::ManaPlugin;
use phantom_library::player::PlayerPlugin;
use phantom_library::quests::QuestPlugin;
use phantom_library::save::SavePlugin;
use phantom_library::shared::{SharedPlugin, SCREEN_HEIGHT, SCREEN_WIDTH};
use phantom_library::ui::UiPlugin;
use phantom_library::visitors::VisitorPlugin;
use phantom_library::world::WorldPlugin;

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Phantom of the Library".to_string(),
                resolution: WindowResolution::new(SCREEN_WIDTH, SCREEN_HEIGHT),
                resizable: false,
                ..default()
            }),
            ..default()
        }))
        .add_plugins(SharedPlugin)
        .add_plugins((
            ClockPlugin,
            ManaPlugin,
            VisitorPlugin,
            QuestPlugin,
            PlayerPlugin,
            WorldPlugin,
            UiPlugin,
            SavePlugin,
        ))
        .add_systems(Startup, setup_camera)
        .run();
}

fn setup_camera(mut commands: Commands) {
    commands.spawn(Camera2d);
}
