//! Habit Quest: a habit tracker whose category scores drive a small RPG.
//!
//! Rules live in free functions over [`state::AppState`]; [`session::Session`]
//! owns the state and wires it to a [`ports::KeyValueStore`] and a
//! [`ports::Prompt`].

pub mod battle;
pub mod error;
pub mod ledger;
pub mod mission;
pub mod period;
pub mod ports;
pub mod progression;
pub mod save;
pub mod session;
pub mod state;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use error::{Result, TrackerError};
pub use session::Session;
pub use state::{AppState, Notice, StatName};
