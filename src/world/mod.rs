//! Static library scenery and the day/night light overlay.

use bevy::prelude::*;

use crate::shared::*;

/// Strongest overlay alpha, reached deep into the night.
const NIGHT_ALPHA_MAX: f32 = 0.55;

pub struct WorldPlugin;

impl Plugin for WorldPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_library)
            .add_systems(Update, update_night_overlay);
    }
}

#[derive(Component)]
struct NightOverlay;

fn spawn_library(mut commands: Commands, layout: Res<LibraryLayout>) {
    // Floor.
    commands.spawn((
        Sprite::from_color(
            Color::srgb(0.24, 0.19, 0.15),
            Vec2::new(SCREEN_WIDTH, SCREEN_HEIGHT),
        ),
        Transform::from_xyz(0.0, 0.0, Z_FLOOR),
    ));

    // Bookshelves along the back wall.
    for shelf in &layout.shelves {
        commands.spawn((
            Sprite::from_color(Color::srgb(0.42, 0.27, 0.14), Vec2::new(140.0, 180.0)),
            Transform::from_xyz(shelf.x, shelf.y, Z_PROP),
        ));
    }

    // Reading tables.
    for &table_x in &layout.tables {
        commands.spawn((
            Sprite::from_color(Color::srgb(0.51, 0.36, 0.20), Vec2::new(110.0, 54.0)),
            Transform::from_xyz(table_x, layout.floor_y - 40.0, Z_PROP),
        ));
    }

    // Power zone marker, a faint glowing circle stand-in.
    for &zone in &layout.power_zones {
        commands.spawn((
            Sprite::from_color(
                Color::srgba(0.35, 0.65, 0.95, 0.25),
                Vec2::splat(POWER_ZONE_RADIUS * 2.0),
            ),
            Transform::from_xyz(zone.x, zone.y, Z_FLOOR + 0.5),
        ));
    }

    // Entrance mat.
    commands.spawn((
        Sprite::from_color(Color::srgb(0.55, 0.12, 0.12), Vec2::new(48.0, 90.0)),
        Transform::from_xyz(layout.entrance_x, layout.floor_y, Z_FLOOR + 0.5),
    ));

    // Night tint, alpha driven by the clock.
    commands.spawn((
        NightOverlay,
        Sprite::from_color(
            Color::srgba(0.05, 0.06, 0.18, 0.0),
            Vec2::new(SCREEN_WIDTH, SCREEN_HEIGHT),
        ),
        Transform::from_xyz(0.0, 0.0, Z_OVERLAY),
    ));

    info!("[World] Library spawned");
}

/// Overlay alpha for a given day progress. Ramps up through dusk, holds
/// through the night, ramps back down just before dawn.
pub fn night_alpha(progress: f32) -> f32 {
    match progress {
        p if p < 0.45 => 0.0,
        p if p < 0.55 => (p - 0.45) / 0.10 * NIGHT_ALPHA_MAX,
        p if p < 0.95 => NIGHT_ALPHA_MAX,
        p => (1.0 - p) / 0.05 * NIGHT_ALPHA_MAX,
    }
}

fn update_night_overlay(
    clock: Res<SimClock>,
    mut overlay: Query<&mut Sprite, With<NightOverlay>>,
) {
    let Ok(mut sprite) = overlay.get_single_mut() else {
        return;
    };
    let alpha = night_alpha(clock.day_progress());
    // The lunar night reads slightly violet.
    sprite.color = if clock.is_lunar_night() {
        Color::srgba(0.14, 0.05, 0.22, alpha)
    } else {
        Color::srgba(0.05, 0.06, 0.18, alpha)
    };
}
