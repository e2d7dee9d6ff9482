//! Mana domain — the ghost's bounded energy pool.
//!
//! Passive regeneration runs every simulation tick; the rate is multiplied
//! while the ghost hovers inside a power zone. Spending happens at the call
//! sites of the interactions themselves (book placement, phasing,
//! restoration) via `Mana::spend`, which refuses rather than overdraws.

use bevy::prelude::*;

use crate::shared::*;

pub struct ManaPlugin;

impl Plugin for ManaPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            regen_mana.run_if(in_state(GameState::Playing)),
        );
    }
}

/// Regeneration multiplier for a position: boosted within the radius of any
/// power-zone anchor, 1.0 elsewhere.
///
/// Pure function of positions, recomputed every tick. There is no hysteresis
/// band, so the rate flickers when the ghost hovers exactly on the radius
/// edge.
pub fn zone_multiplier(pos: Vec2, zones: &[Vec2]) -> f32 {
    if zones.iter().any(|z| z.distance(pos) <= POWER_ZONE_RADIUS) {
        POWER_ZONE_MULTIPLIER
    } else {
        1.0
    }
}

fn regen_mana(
    time: Res<Time>,
    layout: Res<LibraryLayout>,
    mut mana: ResMut<Mana>,
    query: Query<&Transform, With<Ghost>>,
) {
    let Ok(transform) = query.get_single() else {
        return;
    };
    let pos = transform.translation.truncate();
    mana.regen(time.delta_secs(), zone_multiplier(pos, &layout.power_zones));
}

// ─── Tests ────────────────────────────────────────────────────────────────────
