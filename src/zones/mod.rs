//! Zone system for card locations.
//!
//! ## Key Types
//!
//! - `ZoneType`: Library, hand, battlefield, graveyard, exile, stack, command
//! - `ZoneKey`: Zone address `(owner, zone_type)`
//! - `ZoneManager`: Card location tracking and ordering
//! - `ZonePosition`: Position specifier for insertion

pub mod manager;
pub mod zone;

pub use manager::{ZoneManager, ZonePosition};
pub use zone::{ZoneKey, ZoneType};
