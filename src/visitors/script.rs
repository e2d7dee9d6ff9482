//! The visitor state machine.
//!
//! States run `Arriving → Waiting → (GoingToBook | ReturningToTable) →
//! Reading → (Waiting | Leaving)`. A departing visitor is despawned once it
//! reaches the entrance, which also resets the spawn cooldown.
//!
//! Movement is constant-speed interpolation along x; y is pinned to the
//! floor every tick. All timing is simulated time from `SimClock`, so the
//! whole script freezes with the clock while paused.

use bevy::prelude::*;
use rand::Rng;

use crate::shared::*;

/// What a waiting visitor decides to do about the books on the floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitingAction {
    /// A book is within reach: take it.
    Claim(Entity),
    /// A book exists but out of reach: walk to it.
    GoTo(Entity),
    /// No book anywhere: keep waiting.
    Idle,
}

/// Nearest undamaged book to `pos`. Ties break on entity order, so the
/// choice is deterministic for a given world.
pub fn nearest_book(pos: Vec2, books: &[(Entity, Vec2)]) -> Option<(Entity, Vec2)> {
    books
        .iter()
        .copied()
        .min_by(|(ea, a), (eb, b)| {
            let da = a.distance_squared(pos);
            let db = b.distance_squared(pos);
            da.total_cmp(&db).then(ea.cmp(eb))
        })
}

/// Decide the Waiting-state action for a visitor at `pos` given the live
/// undamaged book props. Never produces `Claim`/`GoTo` from an empty list.
pub fn waiting_action(pos: Vec2, books: &[(Entity, Vec2)]) -> WaitingAction {
    match nearest_book(pos, books) {
        None => WaitingAction::Idle,
        Some((entity, book_pos)) => {
            if book_pos.distance(pos) <= INTERACTION_RADIUS {
                WaitingAction::Claim(entity)
            } else {
                WaitingAction::GoTo(entity)
            }
        }
    }
}

/// Step `x` toward `target` at `speed`. Returns the new x and whether the
/// target counts as reached (`|dx| < ARRIVAL_EPSILON`).
pub fn move_toward(x: f32, target: f32, speed: f32, dt: f32) -> (f32, bool) {
    let dx = target - x;
    if dx.abs() < ARRIVAL_EPSILON {
        return (x, true);
    }
    let step = speed * dt;
    if step >= dx.abs() {
        (target, true)
    } else {
        (x + step * dx.signum(), false)
    }
}

fn sample_quest_delay(rng: &mut GameRng) -> f32 {
    rng.0.gen_range(QUEST_DELAY_MIN..QUEST_DELAY_MAX)
}

#[allow(clippy::too_many_arguments)]
pub fn step_visitors(
    mut commands: Commands,
    time: Res<Time>,
    clock: Res<SimClock>,
    layout: Res<LibraryLayout>,
    quest: Res<ActiveQuest>,
    mut rng: ResMut<GameRng>,
    mut spawner: ResMut<VisitorSpawner>,
    mut stats: ResMut<PlayerStats>,
    mut quest_writer: EventWriter<QuestRequestedEvent>,
    mut claim_writer: EventWriter<BookClaimedEvent>,
    mut sfx_writer: EventWriter<PlaySfxEvent>,
    mut visitors: Query<(Entity, &mut Visitor, &mut Transform), Without<BookProp>>,
    books: Query<(Entity, &Transform, &BookProp), Without<Visitor>>,
) {
    let dt = time.delta_secs();

    // Snapshot of claimable (undamaged) books for this tick.
    let fetchable: Vec<(Entity, Vec2)> = books
        .iter()
        .filter(|(_, _, book)| !book.is_damaged)
        .map(|(entity, transform, _)| (entity, transform.translation.truncate()))
        .collect();

    for (entity, mut visitor, mut transform) in visitors.iter_mut() {
        // Floor pin: visitors never drift vertically.
        transform.translation.y = layout.floor_y;
        let x = transform.translation.x;
        let pos = Vec2::new(x, layout.floor_y);

        match visitor.state {
            VisitorState::Arriving => {
                let (nx, arrived) = move_toward(x, visitor.target_x, VISITOR_SPEED, dt);
                transform.translation.x = nx;
                if arrived {
                    visitor.state = VisitorState::Waiting;
                    visitor.quest_timer = 0.0;
                    visitor.quest_delay = Some(sample_quest_delay(&mut rng));
                }
            }

            VisitorState::Waiting => match waiting_action(pos, &fetchable) {
                WaitingAction::Claim(book) => {
                    claim_book(
                        &mut commands,
                        book,
                        &mut stats,
                        &mut claim_writer,
                        &mut sfx_writer,
                    );
                    visitor.target_x = layout.table_x(visitor.table);
                    visitor.state = VisitorState::ReturningToTable;
                }
                WaitingAction::GoTo(book) => {
                    if let Some((_, book_pos)) =
                        fetchable.iter().find(|(e, _)| *e == book).copied()
                    {
                        visitor.target_book = Some(book);
                        visitor.target_x = book_pos.x;
                        visitor.state = VisitorState::GoingToBook;
                    }
                }
                WaitingAction::Idle => {
                    if let Some(delay) = visitor.quest_delay {
                        visitor.quest_timer += dt;
                        if visitor.quest_timer >= delay {
                            // One-shot: the delay is cleared whether or not
                            // the quest module accepts the request.
                            visitor.quest_delay = None;
                            visitor.quest_timer = 0.0;
                            if quest.0.is_none() {
                                quest_writer.send(QuestRequestedEvent);
                            }
                        }
                    }
                }
            },

            VisitorState::GoingToBook => {
                let (nx, arrived) = move_toward(x, visitor.target_x, VISITOR_SPEED, dt);
                transform.translation.x = nx;
                if arrived {
                    // The book may already be gone; tolerate silently.
                    if let Some(book) = visitor.target_book.take() {
                        if fetchable.iter().any(|(e, _)| *e == book) {
                            claim_book(
                                &mut commands,
                                book,
                                &mut stats,
                                &mut claim_writer,
                                &mut sfx_writer,
                            );
                        }
                    }
                    visitor.target_x = layout.table_x(visitor.table);
                    visitor.state = VisitorState::ReturningToTable;
                }
            }

            VisitorState::ReturningToTable => {
                let (nx, arrived) = move_toward(x, visitor.target_x, VISITOR_SPEED, dt);
                transform.translation.x = nx;
                if arrived {
                    visitor.state = VisitorState::Reading;
                    visitor.read_deadline =
                        Some(clock.elapsed + rng.0.gen_range(READ_TIME_MIN..READ_TIME_MAX));
                }
            }

            VisitorState::Reading => {
                let done = visitor
                    .read_deadline
                    .map_or(true, |deadline| clock.elapsed >= deadline);
                if done {
                    visitor.read_deadline = None;
                    if rng.0.gen_bool(LEAVE_PROBABILITY) {
                        visitor.target_x = layout.entrance_x;
                        visitor.state = VisitorState::Leaving;
                    } else {
                        visitor.state = VisitorState::Waiting;
                        visitor.quest_timer = 0.0;
                        visitor.quest_delay = Some(sample_quest_delay(&mut rng));
                    }
                }
            }

            VisitorState::Leaving => {
                let (nx, arrived) = move_toward(x, visitor.target_x, VISITOR_SPEED, dt);
                transform.translation.x = nx;
                if arrived {
                    info!("[Visitors] Visitor departed — day {}", clock.current_day());
                    commands.entity(entity).despawn();
                    spawner.cooldown.reset();
                }
            }
        }
    }
}

fn claim_book(
    commands: &mut Commands,
    book: Entity,
    stats: &mut PlayerStats,
    claim_writer: &mut EventWriter<BookClaimedEvent>,
    sfx_writer: &mut EventWriter<PlaySfxEvent>,
) {
    commands.entity(book).despawn();
    stats.visitors_helped += 1;
    claim_writer.send(BookClaimedEvent { book });
    sfx_writer.send(PlaySfxEvent {
        sfx_id: "book_drop".to_string(),
    });
}

// ─── Tests ────────────────────────────────────────────────────────────────────
