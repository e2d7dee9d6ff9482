//! Visitor domain — scripted NPCs who come to the library for a book.
//!
//! A visitor arrives at the entrance, walks to an assigned reading table,
//! waits for a book (requesting a quest from the player if none shows up),
//! fetches or receives the book, reads for a while, and either waits for
//! another or leaves. Movement is horizontal only; visitors are pinned to
//! the floor line.

pub mod script;
pub mod spawning;

use bevy::prelude::*;

use crate::shared::*;

pub struct VisitorPlugin;

impl Plugin for VisitorPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (spawning::spawn_visitors, script::step_visitors)
                .chain()
                .run_if(in_state(GameState::Playing)),
        );
    }
}
