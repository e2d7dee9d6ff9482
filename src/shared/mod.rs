//! Shared components, resources, events, and states for Phantom of the Library.
//!
//! This is the type contract. Every domain plugin imports from here.
//! No domain imports from any other domain directly.

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Registers the shared state, resources, and events. Added first by both
/// the real app and the headless test harness.
pub struct SharedPlugin;

impl Plugin for SharedPlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<GameState>()
            .init_resource::<SimClock>()
            .init_resource::<Mana>()
            .init_resource::<PlayerStats>()
            .init_resource::<ActiveQuest>()
            .init_resource::<LibraryLayout>()
            .init_resource::<GameRng>()
            .init_resource::<VisitorSpawner>()
            .init_resource::<InteractIntent>()
            .init_resource::<InteractionClaimed>()
            .add_event::<QuestRequestedEvent>()
            .add_event::<QuestStartedEvent>()
            .add_event::<BookPlacedEvent>()
            .add_event::<BookClaimedEvent>()
            .add_event::<BookRestoredEvent>()
            .add_event::<SaveRequestEvent>()
            .add_event::<LoadRequestEvent>()
            .add_event::<SaveCompleteEvent>()
            .add_event::<LoadCompleteEvent>()
            .add_event::<PlaySfxEvent>();
    }
}

// ═══════════════════════════════════════════════════════════════════════
// GAME STATE — top-level state machine
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, States, Default)]
pub enum GameState {
    #[default]
    Playing,
    Paused,
}

// ═══════════════════════════════════════════════════════════════════════
// SIMULATION CLOCK
// ═══════════════════════════════════════════════════════════════════════

/// Simulated time. One game day is [`DAY_LENGTH_SECONDS`] of simulated time;
/// night is the second half of each day. The lunar-night flag is latched once
/// per day index and never re-evaluated within the same day.
#[derive(Resource, Debug, Clone)]
pub struct SimClock {
    /// Simulated seconds since the session began. Monotonic.
    pub elapsed: f32,
    /// Latched result of the lunar predicate for the current day.
    pub is_special_day: bool,
    /// The last day index for which the lunar predicate was evaluated.
    /// `None` until the first tick.
    pub last_checked_day: Option<u64>,
    /// How many times the lunar predicate has run. At most one per day index.
    pub lunar_evaluations: u64,
}

impl Default for SimClock {
    fn default() -> Self {
        Self {
            elapsed: 0.0,
            is_special_day: false,
            last_checked_day: None,
            lunar_evaluations: 0,
        }
    }
}

impl SimClock {
    /// Advances simulated time and runs the lunar-day latch.
    ///
    /// A single large `dt` can cross several day boundaries (e.g. the first
    /// frame after the host process was suspended); the latch still runs
    /// exactly once per crossed day index, walking them in order.
    pub fn advance(&mut self, dt: f32) {
        self.elapsed += dt.max(0.0);
        let today = self.current_day();
        while self.last_checked_day.map_or(true, |d| d < today) {
            let day = self.last_checked_day.map_or(0, |d| d + 1);
            let progress = self.day_progress();
            self.is_special_day = day % 7 == LUNAR_WEEKDAY && (0.7..0.8).contains(&progress);
            self.last_checked_day = Some(day);
            self.lunar_evaluations += 1;
        }
    }

    /// Fraction of the current day in `[0, 1)`.
    pub fn day_progress(&self) -> f32 {
        (self.elapsed % DAY_LENGTH_SECONDS) / DAY_LENGTH_SECONDS
    }

    /// The second half of every day is night.
    pub fn is_night(&self) -> bool {
        self.day_progress() > 0.5
    }

    pub fn current_day(&self) -> u64 {
        (self.elapsed / DAY_LENGTH_SECONDS) as u64
    }

    /// True while the restoration window is open: a latched lunar day, at
    /// night.
    pub fn is_lunar_night(&self) -> bool {
        self.is_special_day && self.is_night()
    }

    /// Clock-face readout for the HUD, mapping one day to 24 hours.
    pub fn hour_of_day(&self) -> f32 {
        self.day_progress() * 24.0
    }
}

// ═══════════════════════════════════════════════════════════════════════
// PLAYER (the ghost)
// ═══════════════════════════════════════════════════════════════════════

#[derive(Component, Debug, Clone, Default)]
pub struct Ghost;

#[derive(Component, Debug, Clone)]
pub struct GhostMovement {
    pub speed: f32,
    pub is_phasing: bool,
    pub phase_cooldown: Timer,
}

impl Default for GhostMovement {
    fn default() -> Self {
        let mut phase_cooldown = Timer::from_seconds(PHASE_COOLDOWN, TimerMode::Once);
        // Start ready so a fresh ghost may phase immediately.
        phase_cooldown.tick(std::time::Duration::from_secs_f32(PHASE_COOLDOWN));
        Self {
            speed: 240.0,
            is_phasing: false,
            phase_cooldown,
        }
    }
}

/// Session counters. The save module persists these field by field.
#[derive(Resource, Debug, Clone, Default)]
pub struct PlayerStats {
    pub score: u32,
    pub visitors_helped: u32,
    pub restored_books: u32,
}

/// Bounded mana pool with passive regeneration.
#[derive(Resource, Debug, Clone)]
pub struct Mana {
    pub current: f32,
    pub max: f32,
    pub rate: f32,
}

impl Default for Mana {
    fn default() -> Self {
        Self {
            current: MANA_MAX,
            max: MANA_MAX,
            rate: MANA_REGEN_RATE,
        }
    }
}

impl Mana {
    /// Adds `rate * multiplier * dt`, clamped to `[0, max]`.
    pub fn regen(&mut self, dt: f32, multiplier: f32) {
        self.current = (self.current + self.rate * multiplier * dt).clamp(0.0, self.max);
    }

    /// Deducts `amount` if affordable. Returns false (and does not mutate)
    /// when the pool is short.
    pub fn spend(&mut self, amount: f32) -> bool {
        if self.current < amount {
            return false;
        }
        self.current -= amount;
        true
    }
}

// ═══════════════════════════════════════════════════════════════════════
// VISITORS
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisitorState {
    Arriving,
    Waiting,
    GoingToBook,
    ReturningToTable,
    Reading,
    Leaving,
}

/// A library visitor. Moves along the x axis only; y is pinned to the floor.
#[derive(Component, Debug, Clone)]
pub struct Visitor {
    pub state: VisitorState,
    pub target_x: f32,
    /// Index into `LibraryLayout::tables`. The table is never owned.
    pub table: usize,
    /// The book prop walked toward while `GoingToBook`. The prop may vanish
    /// before arrival; that is tolerated silently.
    pub target_book: Option<Entity>,
    /// SimClock timestamp at which reading finishes.
    pub read_deadline: Option<f32>,
    pub quest_timer: f32,
    /// Sampled wait before this visitor requests a quest. `None` after the
    /// request fires (one-shot until Waiting is re-entered).
    pub quest_delay: Option<f32>,
}

impl Visitor {
    pub fn arriving(table: usize, table_x: f32) -> Self {
        Self {
            state: VisitorState::Arriving,
            target_x: table_x,
            table,
            target_book: None,
            read_deadline: None,
            quest_timer: 0.0,
            quest_delay: None,
        }
    }
}

/// Gates visitor respawn: a cooldown timer plus a one-per-day rule.
#[derive(Resource, Debug, Clone)]
pub struct VisitorSpawner {
    pub cooldown: Timer,
    pub last_spawn_day: Option<u64>,
}

impl Default for VisitorSpawner {
    fn default() -> Self {
        // Start expired so the first visitor arrives right away.
        let mut cooldown = Timer::from_seconds(SPAWN_COOLDOWN, TimerMode::Once);
        cooldown.tick(std::time::Duration::from_secs_f32(SPAWN_COOLDOWN));
        Self {
            cooldown,
            last_spawn_day: None,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// BOOKS & QUESTS
// ═══════════════════════════════════════════════════════════════════════

/// A book lying in the world. Spawned by the player at a shelf, consumed by
/// a visitor, or restored in place on a lunar night if damaged.
#[derive(Component, Debug, Clone)]
pub struct BookProp {
    pub is_damaged: bool,
}

/// Flat record for persisting book props.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookRecord {
    pub x: f32,
    pub y: f32,
    pub is_damaged: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestTarget {
    /// Index into `LibraryLayout::shelves`.
    pub shelf: usize,
}

/// At most one quest is active system-wide.
#[derive(Resource, Debug, Clone, Default)]
pub struct ActiveQuest(pub Option<QuestTarget>);

// ═══════════════════════════════════════════════════════════════════════
// LIBRARY LAYOUT
// ═══════════════════════════════════════════════════════════════════════

/// Static geometry of the library room. World units are pixels; the origin
/// is the room centre.
#[derive(Resource, Debug, Clone)]
pub struct LibraryLayout {
    pub shelves: Vec<Vec2>,
    /// Reading-table x positions; visitors sit at `(tables[i], floor_y)`.
    pub tables: Vec<f32>,
    pub entrance_x: f32,
    pub floor_y: f32,
    pub power_zones: Vec<Vec2>,
    pub min: Vec2,
    pub max: Vec2,
}

impl Default for LibraryLayout {
    fn default() -> Self {
        Self {
            shelves: vec![
                Vec2::new(-360.0, 220.0),
                Vec2::new(-120.0, 220.0),
                Vec2::new(120.0, 220.0),
                Vec2::new(360.0, 220.0),
            ],
            tables: vec![-240.0, 0.0, 240.0],
            entrance_x: -460.0,
            floor_y: -120.0,
            power_zones: vec![Vec2::new(320.0, -240.0)],
            min: Vec2::new(-480.0, -340.0),
            max: Vec2::new(480.0, 340.0),
        }
    }
}

impl LibraryLayout {
    pub fn table_x(&self, index: usize) -> f32 {
        self.tables.get(index).copied().unwrap_or(0.0)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// RNG — all randomized branching flows through this so tests can seed it
// ═══════════════════════════════════════════════════════════════════════

#[derive(Resource)]
pub struct GameRng(pub StdRng);

impl Default for GameRng {
    fn default() -> Self {
        Self(StdRng::from_entropy())
    }
}

impl GameRng {
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

// ═══════════════════════════════════════════════════════════════════════
// INTERACTION — one press, one consumer per frame
// ═══════════════════════════════════════════════════════════════════════

/// Set in PreUpdate when the interact key was pressed this frame.
#[derive(Resource, Debug, Clone, Default)]
pub struct InteractIntent {
    pub pressed: bool,
}

/// Raised by the first system that consumes this frame's interact press so
/// later consumers skip it.
#[derive(Resource, Debug, Clone, Default)]
pub struct InteractionClaimed(pub bool);

// ═══════════════════════════════════════════════════════════════════════
// EVENTS — cross-domain communication
// ═══════════════════════════════════════════════════════════════════════

/// A waiting visitor asks for a new quest.
#[derive(Event, Debug, Clone)]
pub struct QuestRequestedEvent;

#[derive(Event, Debug, Clone)]
pub struct QuestStartedEvent {
    pub shelf: usize,
}

/// The player placed a book at the quest shelf.
#[derive(Event, Debug, Clone)]
pub struct BookPlacedEvent {
    pub shelf: usize,
}

/// A visitor picked up a book prop.
#[derive(Event, Debug, Clone)]
pub struct BookClaimedEvent {
    pub book: Entity,
}

/// The player restored a damaged book in place.
#[derive(Event, Debug, Clone)]
pub struct BookRestoredEvent {
    pub book: Entity,
}

#[derive(Event, Debug, Clone)]
pub struct SaveRequestEvent;

#[derive(Event, Debug, Clone)]
pub struct LoadRequestEvent;

#[derive(Event, Debug, Clone)]
pub struct SaveCompleteEvent {
    pub success: bool,
    pub error_message: Option<String>,
}

#[derive(Event, Debug, Clone)]
pub struct LoadCompleteEvent {
    pub success: bool,
    pub error_message: Option<String>,
}

#[derive(Event, Debug, Clone)]
pub struct PlaySfxEvent {
    pub sfx_id: String,
}

// ═══════════════════════════════════════════════════════════════════════
// CONSTANTS
// ═══════════════════════════════════════════════════════════════════════

pub const SCREEN_WIDTH: f32 = 1024.0;
pub const SCREEN_HEIGHT: f32 = 768.0;

/// One simulated day in seconds (~2 real minutes, as in the prototype).
pub const DAY_LENGTH_SECONDS: f32 = 120.0;
/// Day index residue (mod 7) on which lunar nights can occur.
pub const LUNAR_WEEKDAY: u64 = 3;

pub const MANA_MAX: f32 = 100.0;
pub const MANA_REGEN_RATE: f32 = 1.0;
pub const POWER_ZONE_MULTIPLIER: f32 = 3.0;
pub const POWER_ZONE_RADIUS: f32 = 120.0;

pub const INTERACTION_RADIUS: f32 = 90.0;
pub const BOOK_PLACE_COST: f32 = 10.0;
pub const PHASE_COST: f32 = 20.0;
pub const PHASE_COOLDOWN: f32 = 5.0;
pub const PHASE_SPEED_FACTOR: f32 = 1.6;
pub const PHASE_DURATION: f32 = 1.5;
pub const RESTORE_COST: f32 = 5.0;

pub const VISITOR_SPEED: f32 = 90.0;
pub const ARRIVAL_EPSILON: f32 = 2.0;
pub const SPAWN_COOLDOWN: f32 = 8.0;
pub const LEAVE_PROBABILITY: f64 = 0.55;
pub const READ_TIME_MIN: f32 = 10.0;
pub const READ_TIME_MAX: f32 = 20.0;
pub const QUEST_DELAY_MIN: f32 = 6.0;
pub const QUEST_DELAY_MAX: f32 = 14.0;

// Z ordering for 2D sprites.
pub const Z_FLOOR: f32 = 0.0;
pub const Z_PROP: f32 = 1.0;
pub const Z_ENTITY: f32 = 2.0;
pub const Z_OVERLAY: f32 = 10.0;
