//! Visitor spawning: instantiate visitor entities at the entrance.
//!
//! Spawn policy: at most one live visitor; respawn is gated by a cooldown
//! timer (reset when the previous visitor departs) and by a one-visitor-per-
//! simulated-day rule tracked via the last-spawned day index.

use bevy::prelude::*;
use rand::Rng;

use crate::shared::*;

/// Palette for visitor sprites, cycled by spawn count.
const VISITOR_COLORS: [Color; 5] = [
    Color::srgb(0.75, 0.55, 0.35),
    Color::srgb(0.45, 0.60, 0.80),
    Color::srgb(0.60, 0.75, 0.45),
    Color::srgb(0.80, 0.50, 0.60),
    Color::srgb(0.70, 0.70, 0.40),
];

pub fn visitor_color(spawn_index: usize) -> Color {
    VISITOR_COLORS[spawn_index % VISITOR_COLORS.len()]
}

/// Running count of spawns, used only to vary visitor tints.
#[derive(Debug, Clone, Default)]
pub struct SpawnCounter(pub usize);

pub fn spawn_visitors(
    mut commands: Commands,
    time: Res<Time>,
    clock: Res<SimClock>,
    layout: Res<LibraryLayout>,
    mut rng: ResMut<GameRng>,
    mut spawner: ResMut<VisitorSpawner>,
    mut counter: Local<SpawnCounter>,
    visitors: Query<(), With<Visitor>>,
) {
    spawner.cooldown.tick(time.delta());

    if !visitors.is_empty() {
        return;
    }
    if !spawner.cooldown.finished() {
        return;
    }

    // One visitor per simulated day.
    let today = clock.current_day();
    if spawner.last_spawn_day == Some(today) {
        return;
    }

    let table = rng.0.gen_range(0..layout.tables.len());
    let table_x = layout.table_x(table);
    let color = visitor_color(counter.0);
    counter.0 += 1;
    spawner.last_spawn_day = Some(today);

    info!(
        "[Visitors] Visitor arriving — table {} (x = {:.0}), day {}",
        table, table_x, today
    );

    commands.spawn((
        Visitor::arriving(table, table_x),
        Sprite::from_color(color, Vec2::new(28.0, 44.0)),
        Transform::from_xyz(layout.entrance_x, layout.floor_y, Z_ENTITY),
    ));
}
