//! Core types: entities, components, players, state, RNG, configuration.
//!
//! `GameState` is the single value every rules operation consumes and
//! produces. Everything else in the crate reads it through the accessors
//! defined here.

pub mod component;
pub mod config;
pub mod entity;
pub mod player;
pub mod rng;
pub mod state;
pub mod store;

pub use component::{Component, ComponentKind, CounterKind, CounterSet};
pub use config::GameConfig;
pub use entity::EntityId;
pub use player::{PlayerId, PlayerMap, PlayerState};
pub use rng::{GameRng, GameRngState};
pub use state::{GameState, StateRevision};
pub use store::{EntityRecord, EntityStore};
