//! Rules that run outside effect trees.
//!
//! - `damage`: dealing damage, shared by effects and combat
//! - `state_based`: state-based actions
//! - `cleanup`: the cleanup-step discard

pub mod cleanup;
pub mod damage;
pub mod state_based;

pub use cleanup::request_cleanup_discard;
pub use damage::{deal_damage, lifelink_gain, SourceTraits};
pub use state_based::{apply_state_based_actions, check_state_based_actions, LoseReason, StateBasedAction};
