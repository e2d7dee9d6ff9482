//! Phantom of the Library.
//!
//! A 2D haunting sim: you are the library's resident ghost, keeping the
//! collection in order for the living. Visitors wander in, read, and ask
//! for books; you place them on shelves, and on lunar Thursday nights you
//! can mend the damaged ones.
//!
//! Each gameplay domain is a plugin with its own module; they communicate
//! only through the types and events in [`shared`].

pub mod clock;
pub mod mana;
pub mod player;
pub mod quests;
pub mod save;
pub mod shared;
pub mod ui;
pub mod visitors;
pub mod world;
