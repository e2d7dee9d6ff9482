//! Audio: looping day/night ambience plus one-shot effects.
//!
//! Effects are requested through `PlaySfxEvent` so gameplay code never
//! touches the asset server. A missing audio file logs an asset error but
//! does not interrupt play.

use bevy::prelude::*;

use crate::shared::*;

pub struct AudioPlugin;

impl Plugin for AudioPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, (update_ambience, play_sfx));
    }
}

#[derive(Component)]
struct Ambience {
    nocturnal: bool,
}

/// Keep exactly one ambience track alive, swapping it at dusk and dawn.
fn update_ambience(
    mut commands: Commands,
    clock: Res<SimClock>,
    asset_server: Res<AssetServer>,
    playing: Query<(Entity, &Ambience)>,
) {
    let want_night = clock.is_night();
    if let Ok((entity, ambience)) = playing.get_single() {
        if ambience.nocturnal == want_night {
            return;
        }
        commands.entity(entity).despawn();
    }
    let path = if want_night {
        "sounds/ambience_night.ogg"
    } else {
        "sounds/ambience_day.ogg"
    };
    commands.spawn((
        Ambience {
            nocturnal: want_night,
        },
        AudioPlayer::new(asset_server.load(path)),
        PlaybackSettings::LOOP,
    ));
}

fn play_sfx(
    mut commands: Commands,
    mut events: EventReader<PlaySfxEvent>,
    asset_server: Res<AssetServer>,
) {
    for event in events.read() {
        let path = format!("sounds/{}.ogg", event.sfx_id);
        commands.spawn((
            AudioPlayer::new(asset_server.load(path)),
            PlaybackSettings::DESPAWN,
        ));
    }
}
