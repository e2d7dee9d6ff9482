//! Simulation clock — the heartbeat of the library.
//!
//! Responsible for:
//! - Advancing simulated time from frame deltas
//! - Deriving day index, day/night phase, and the lunar-night flag
//! - Latching the lunar predicate once per day index (never per tick)
//! - Freezing entirely while the game is paused
//!
//! Pausing works by state gating: `tick_clock` only runs in
//! `GameState::Playing`, so real time elapsed during a pause is never added
//! to `SimClock::elapsed`. All other timers in the game follow the same
//! gating, which makes the pause freeze atomic at the frame boundary.

use bevy::prelude::*;

use crate::shared::*;

pub struct ClockPlugin;

impl Plugin for ClockPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(GameState::Playing), log_resume)
            .add_systems(OnExit(GameState::Playing), log_pause)
            .add_systems(
                Update,
                (tick_clock, announce_lunar_night).run_if(in_state(GameState::Playing)),
            );
    }
}

fn log_resume(clock: Res<SimClock>) {
    info!(
        "[Clock] Time resumed — day {} at {:.1}h",
        clock.current_day(),
        clock.hour_of_day()
    );
}

fn log_pause(clock: Res<SimClock>) {
    info!(
        "[Clock] Time paused — day {} at {:.1}h",
        clock.current_day(),
        clock.hour_of_day()
    );
}

/// Advances the clock by the frame delta. The once-per-day lunar latch lives
/// inside `SimClock::advance` so a large delta cannot fire it twice for the
/// same day index.
fn tick_clock(time: Res<Time>, mut clock: ResMut<SimClock>) {
    clock.advance(time.delta_secs());
}

/// Logs (and plays a cue for) the opening of the lunar restoration window.
/// Tracks the day it last announced so each window fires exactly one cue.
#[derive(Default)]
struct AnnouncedDay(Option<u64>);

fn announce_lunar_night(
    clock: Res<SimClock>,
    mut announced: Local<AnnouncedDay>,
    mut sfx_writer: EventWriter<PlaySfxEvent>,
) {
    if !clock.is_lunar_night() {
        return;
    }
    let day = clock.current_day();
    if announced.0 == Some(day) {
        return;
    }
    announced.0 = Some(day);

    info!("[Clock] Lunar night! Damaged books can be restored — day {}", day);
    sfx_writer.send(PlaySfxEvent {
        sfx_id: "ghost_whisper".to_string(),
    });
}

// ─── Tests ────────────────────────────────────────────────────────────────────
