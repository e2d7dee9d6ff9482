//! Ghost control: movement, phasing, interaction input, and the lunar-night
//! book restoration ability.
//!
//! Input is sampled once per frame in PreUpdate into `InteractIntent`, and
//! the first consumer of the press sets `InteractionClaimed` so a single
//! keypress never triggers two interactions. Shelf placement (quests) runs
//! in Update; restoration runs in PostUpdate and only sees unclaimed
//! presses.

use bevy::prelude::*;

use crate::shared::*;

pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_ghost)
            .add_systems(PreUpdate, read_interact_input)
            .add_systems(Update, (toggle_pause, handle_save_keys))
            .add_systems(
                Update,
                move_ghost.run_if(in_state(GameState::Playing)),
            )
            .add_systems(
                PostUpdate,
                restore_books.run_if(in_state(GameState::Playing)),
            );
    }
}

fn spawn_ghost(mut commands: Commands, layout: Res<LibraryLayout>) {
    commands.spawn((
        Ghost,
        GhostMovement::default(),
        Sprite::from_color(Color::srgba(0.78, 0.86, 1.0, 0.85), Vec2::new(36.0, 48.0)),
        Transform::from_xyz(0.0, layout.floor_y, Z_ENTITY),
    ));
    info!("[Player] Ghost spawned");
}

/// Sample the interact key once per frame and clear last frame's claim.
fn read_interact_input(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut intent: ResMut<InteractIntent>,
    mut claimed: ResMut<InteractionClaimed>,
) {
    intent.pressed = keyboard.just_pressed(KeyCode::KeyE);
    claimed.0 = false;
}

fn toggle_pause(
    keyboard: Res<ButtonInput<KeyCode>>,
    state: Res<State<GameState>>,
    mut next: ResMut<NextState<GameState>>,
) {
    if keyboard.just_pressed(KeyCode::Escape) {
        match state.get() {
            GameState::Playing => next.set(GameState::Paused),
            GameState::Paused => next.set(GameState::Playing),
        }
    }
}

fn handle_save_keys(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut save: EventWriter<SaveRequestEvent>,
    mut load: EventWriter<LoadRequestEvent>,
) {
    if keyboard.just_pressed(KeyCode::F5) {
        save.send(SaveRequestEvent);
    }
    if keyboard.just_pressed(KeyCode::F9) {
        load.send(LoadRequestEvent);
    }
}

/// WASD / arrow movement clamped to the room, plus phasing on Space.
///
/// Phasing costs mana, lasts `PHASE_DURATION` seconds of speed boost, and
/// then stays on cooldown until `PHASE_COOLDOWN` has elapsed.
fn move_ghost(
    time: Res<Time>,
    keyboard: Res<ButtonInput<KeyCode>>,
    layout: Res<LibraryLayout>,
    mut mana: ResMut<Mana>,
    mut ghost: Query<(&mut Transform, &mut GhostMovement, &mut Sprite), With<Ghost>>,
    mut sfx: EventWriter<PlaySfxEvent>,
) {
    let Ok((mut transform, mut movement, mut sprite)) = ghost.get_single_mut() else {
        return;
    };
    let dt = time.delta_secs();

    movement.phase_cooldown.tick(time.delta());
    if movement.is_phasing && movement.phase_cooldown.elapsed_secs() >= PHASE_DURATION {
        movement.is_phasing = false;
        sprite.color.set_alpha(0.85);
    }

    if keyboard.just_pressed(KeyCode::Space)
        && movement.phase_cooldown.finished()
        && mana.spend(PHASE_COST)
    {
        movement.is_phasing = true;
        movement.phase_cooldown.reset();
        sprite.color.set_alpha(0.45);
        sfx.send(PlaySfxEvent {
            sfx_id: "phase".to_string(),
        });
    }

    let mut direction = Vec2::ZERO;
    if keyboard.pressed(KeyCode::KeyW) || keyboard.pressed(KeyCode::ArrowUp) {
        direction.y += 1.0;
    }
    if keyboard.pressed(KeyCode::KeyS) || keyboard.pressed(KeyCode::ArrowDown) {
        direction.y -= 1.0;
    }
    if keyboard.pressed(KeyCode::KeyA) || keyboard.pressed(KeyCode::ArrowLeft) {
        direction.x -= 1.0;
    }
    if keyboard.pressed(KeyCode::KeyD) || keyboard.pressed(KeyCode::ArrowRight) {
        direction.x += 1.0;
    }
    if direction == Vec2::ZERO {
        return;
    }

    let speed = if movement.is_phasing {
        movement.speed * PHASE_SPEED_FACTOR
    } else {
        movement.speed
    };
    let next = transform.translation.truncate() + direction.normalize() * speed * dt;
    let clamped = next.clamp(layout.min, layout.max);
    transform.translation.x = clamped.x;
    transform.translation.y = clamped.y;
}

/// Repair the nearest damaged book in reach. Only works during the lunar
/// night and only on an unclaimed interact press.
fn restore_books(
    intent: Res<InteractIntent>,
    mut claimed: ResMut<InteractionClaimed>,
    clock: Res<SimClock>,
    mut mana: ResMut<Mana>,
    mut stats: ResMut<PlayerStats>,
    mut restored: EventWriter<BookRestoredEvent>,
    mut sfx: EventWriter<PlaySfxEvent>,
    ghost: Query<&Transform, With<Ghost>>,
    mut books: Query<(Entity, &Transform, &mut BookProp, &mut Sprite), Without<Ghost>>,
) {
    if !intent.pressed || claimed.0 || !clock.is_lunar_night() {
        return;
    }
    let Ok(ghost_transform) = ghost.get_single() else {
        return;
    };
    let ghost_pos = ghost_transform.translation.truncate();

    let mut nearest: Option<(Entity, f32)> = None;
    for (entity, transform, book, _) in books.iter() {
        if !book.is_damaged {
            continue;
        }
        let dist = transform.translation.truncate().distance(ghost_pos);
        if dist > INTERACTION_RADIUS {
            continue;
        }
        if nearest.map_or(true, |(_, best)| dist < best) {
            nearest = Some((entity, dist));
        }
    }
    let Some((entity, _)) = nearest else {
        return;
    };

    if !mana.spend(RESTORE_COST) {
        info!("[Player] Not enough mana to restore");
        return;
    }

    if let Ok((_, _, mut book, mut sprite)) = books.get_mut(entity) {
        book.is_damaged = false;
        sprite.color = Color::srgb(0.82, 0.68, 0.38);
    }
    claimed.0 = true;
    stats.restored_books += 1;
    stats.score += 1;
    restored.send(BookRestoredEvent { book: entity });
    sfx.send(PlaySfxEvent {
        sfx_id: "restore".to_string(),
    });
    info!(
        "[Player] Book restored — {} total, score {}",
        stats.restored_books, stats.score
    );
}
