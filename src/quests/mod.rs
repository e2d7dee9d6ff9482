//! Quest lifecycle: a waiting visitor requests a book, the ghost places one
//! on the requested shelf, the visitor fetches it.
//!
//! Exactly one quest may be active at a time. Requests arriving while a
//! quest is active are dropped, and placement is refused unless the ghost
//! is in range of the target shelf and can pay the mana cost.

use bevy::prelude::*;
use rand::Rng;

use crate::shared::*;

pub struct QuestPlugin;

impl Plugin for QuestPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (handle_quest_requests, handle_shelf_interaction)
                .chain()
                .run_if(in_state(GameState::Playing)),
        );
    }
}

/// Accept at most one quest request, picking a random shelf for it.
fn handle_quest_requests(
    mut requests: EventReader<QuestRequestedEvent>,
    mut quest: ResMut<ActiveQuest>,
    mut rng: ResMut<GameRng>,
    mut started: EventWriter<QuestStartedEvent>,
    layout: Res<LibraryLayout>,
    visitors: Query<&Visitor>,
) {
    for _ in requests.read() {
        if quest.0.is_some() {
            continue;
        }
        // A quest only makes sense while its sole requester is still waiting.
        let mut iter = visitors.iter();
        let waiting = matches!(
            (iter.next(), iter.next()),
            (Some(visitor), None) if visitor.state == VisitorState::Waiting
        );
        if !waiting {
            continue;
        }
        let shelf = rng.0.gen_range(0..layout.shelves.len());
        quest.0 = Some(QuestTarget { shelf });
        started.send(QuestStartedEvent { shelf });
        info!("[Quests] Visitor wants a book from shelf {shelf}");
    }
}

/// Place a book on the quest shelf when the ghost interacts near it.
#[allow(clippy::too_many_arguments)]
fn handle_shelf_interaction(
    mut commands: Commands,
    intent: Res<InteractIntent>,
    mut claimed: ResMut<InteractionClaimed>,
    mut quest: ResMut<ActiveQuest>,
    mut mana: ResMut<Mana>,
    mut stats: ResMut<PlayerStats>,
    layout: Res<LibraryLayout>,
    mut placed: EventWriter<BookPlacedEvent>,
    mut sfx: EventWriter<PlaySfxEvent>,
    ghost: Query<&Transform, With<Ghost>>,
) {
    if !intent.pressed || claimed.0 {
        return;
    }
    let Some(target) = quest.0 else {
        return;
    };
    let Ok(transform) = ghost.get_single() else {
        return;
    };

    let shelf_pos = layout.shelves[target.shelf];
    if transform.translation.truncate().distance(shelf_pos) > INTERACTION_RADIUS {
        return;
    }
    if !mana.spend(BOOK_PLACE_COST) {
        info!("[Quests] Not enough mana to place a book");
        return;
    }

    claimed.0 = true;
    commands.spawn((
        BookProp { is_damaged: false },
        Sprite::from_color(Color::srgb(0.82, 0.68, 0.38), Vec2::new(22.0, 16.0)),
        Transform::from_xyz(shelf_pos.x, shelf_pos.y - 52.0, Z_PROP),
    ));
    stats.score += 1;
    quest.0 = None;
    placed.send(BookPlacedEvent { shelf: target.shelf });
    sfx.send(PlaySfxEvent {
        sfx_id: "book_place".to_string(),
    });
    info!("[Quests] Book placed at shelf {} — score {}", target.shelf, stats.score);
}
