//! Flat-file persistence.
//!
//! A single JSON document carries the whole session: clock, counters, mana,
//! ghost position, and every book prop on the floor. Writes go through a
//! temp file and an atomic rename so a crash mid-save never corrupts the
//! previous save.
//!
//! No credentials of any kind are persisted.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::shared::*;

pub const SAVE_VERSION: u32 = 1;
const SAVE_FILE_NAME: &str = "phantom_save.json";

pub struct SavePlugin;

impl Plugin for SavePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SavePath>()
            .add_systems(Startup, request_initial_load)
            .add_systems(Update, (handle_save_requests, handle_load_requests));
    }
}

/// Where the save file lives. Next to the executable when that can be
/// resolved, otherwise the working directory.
#[derive(Resource, Debug, Clone)]
pub struct SavePath(pub PathBuf);

impl Default for SavePath {
    fn default() -> Self {
        let dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));
        Self(dir.join(SAVE_FILE_NAME))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveFile {
    pub version: u32,
    /// Unix seconds at the moment of saving. Informational only.
    pub save_timestamp: u64,
    pub score: u32,
    pub visitors_helped: u32,
    pub restored_books: u32,
    /// Simulated seconds, i.e. `SimClock::elapsed`.
    pub game_time: f32,
    pub player_x: f32,
    pub player_y: f32,
    pub mana: f32,
    pub books: Vec<BookRecord>,
}

/// Serialize and write atomically (temp file, then rename).
pub fn write_save_to(path: &Path, save: &SaveFile) -> Result<(), String> {
    let json = serde_json::to_string_pretty(save)
        .map_err(|err| format!("serialize failed: {err}"))?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).map_err(|err| format!("write failed: {err}"))?;
    fs::rename(&tmp, path).map_err(|err| format!("rename failed: {err}"))?;
    Ok(())
}

/// Read and validate a save file. An unknown version is rejected rather
/// than half-applied.
pub fn read_save_from(path: &Path) -> Result<SaveFile, String> {
    let json = fs::read_to_string(path).map_err(|err| format!("read failed: {err}"))?;
    let save: SaveFile =
        serde_json::from_str(&json).map_err(|err| format!("parse failed: {err}"))?;
    if save.version != SAVE_VERSION {
        return Err(format!(
            "unsupported save version {} (expected {})",
            save.version, SAVE_VERSION
        ));
    }
    Ok(save)
}

/// The books a fresh library opens with. Two are sound, two are damaged and
/// wait for a lunar night.
pub fn starter_books() -> Vec<BookRecord> {
    vec![
        BookRecord {
            x: -300.0,
            y: 60.0,
            is_damaged: false,
        },
        BookRecord {
            x: 180.0,
            y: 120.0,
            is_damaged: true,
        },
        BookRecord {
            x: -60.0,
            y: -40.0,
            is_damaged: true,
        },
        BookRecord {
            x: 420.0,
            y: -200.0,
            is_damaged: false,
        },
    ]
}

/// Resume the previous session if a save file exists; otherwise seed the
/// starter book set.
fn request_initial_load(
    mut commands: Commands,
    path: Res<SavePath>,
    mut load: EventWriter<LoadRequestEvent>,
) {
    if path.0.exists() {
        load.send(LoadRequestEvent);
    } else {
        info!("[Save] No save file at {:?}, starting fresh", path.0);
        for record in starter_books() {
            spawn_book(&mut commands, &record);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn handle_save_requests(
    mut requests: EventReader<SaveRequestEvent>,
    mut complete: EventWriter<SaveCompleteEvent>,
    path: Res<SavePath>,
    clock: Res<SimClock>,
    stats: Res<PlayerStats>,
    mana: Res<Mana>,
    ghost: Query<&Transform, With<Ghost>>,
    books: Query<(&Transform, &BookProp), Without<Ghost>>,
) {
    if requests.read().next().is_none() {
        return;
    }

    let (player_x, player_y) = ghost
        .get_single()
        .map(|t| (t.translation.x, t.translation.y))
        .unwrap_or((0.0, 0.0));

    let save = SaveFile {
        version: SAVE_VERSION,
        save_timestamp: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs(),
        score: stats.score,
        visitors_helped: stats.visitors_helped,
        restored_books: stats.restored_books,
        game_time: clock.elapsed,
        player_x,
        player_y,
        mana: mana.current,
        books: books
            .iter()
            .map(|(transform, book)| BookRecord {
                x: transform.translation.x,
                y: transform.translation.y,
                is_damaged: book.is_damaged,
            })
            .collect(),
    };

    match write_save_to(&path.0, &save) {
        Ok(()) => {
            info!("[Save] Saved to {:?}", path.0);
            complete.send(SaveCompleteEvent {
                success: true,
                error_message: None,
            });
        }
        Err(err) => {
            error!("[Save] Save failed: {err}");
            complete.send(SaveCompleteEvent {
                success: false,
                error_message: Some(err),
            });
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn handle_load_requests(
    mut commands: Commands,
    mut requests: EventReader<LoadRequestEvent>,
    mut complete: EventWriter<LoadCompleteEvent>,
    path: Res<SavePath>,
    mut clock: ResMut<SimClock>,
    mut stats: ResMut<PlayerStats>,
    mut mana: ResMut<Mana>,
    mut ghost: Query<&mut Transform, With<Ghost>>,
    books: Query<Entity, With<BookProp>>,
) {
    if requests.read().next().is_none() {
        return;
    }

    let save = match read_save_from(&path.0) {
        Ok(save) => save,
        Err(err) => {
            warn!("[Save] Load failed, keeping current session: {err}");
            complete.send(LoadCompleteEvent {
                success: false,
                error_message: Some(err),
            });
            return;
        }
    };

    // Replaying the clock from zero re-derives the lunar latch for the
    // restored day instead of trusting a stored flag.
    let mut restored = SimClock::default();
    restored.advance(save.game_time.max(0.0));
    *clock = restored;

    stats.score = save.score;
    stats.visitors_helped = save.visitors_helped;
    stats.restored_books = save.restored_books;
    mana.current = save.mana.clamp(0.0, mana.max);

    if let Ok(mut transform) = ghost.get_single_mut() {
        transform.translation.x = save.player_x;
        transform.translation.y = save.player_y;
    }

    for entity in books.iter() {
        commands.entity(entity).despawn();
    }
    for record in &save.books {
        spawn_book(&mut commands, record);
    }

    info!(
        "[Save] Loaded: day {}, score {}, {} books",
        clock.current_day() + 1,
        stats.score,
        save.books.len()
    );
    complete.send(LoadCompleteEvent {
        success: true,
        error_message: None,
    });
}

fn spawn_book(commands: &mut Commands, record: &BookRecord) {
    let color = if record.is_damaged {
        Color::srgb(0.35, 0.28, 0.20)
    } else {
        Color::srgb(0.82, 0.68, 0.38)
    };
    commands.spawn((
        BookProp {
            is_damaged: record.is_damaged,
        },
        Sprite::from_color(color, Vec2::new(22.0, 16.0)),
        Transform::from_xyz(record.x, record.y, Z_PROP),
    ));
}

// ─── Tests ────────────────────────────────────────────────────────────────────
