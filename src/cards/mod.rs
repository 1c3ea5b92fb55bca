//! Card data: printed characteristics, definitions, and the registry.
//!
//! ## Key Types
//!
//! - `Characteristics`: base values the layer system starts from
//! - `CardType`, `Color`, `Keyword`: characteristic vocabulary
//! - `CardId`: identifier for card definitions
//! - `CardDefinition`: static card data, including a spell's effect tree
//! - `CardRegistry`: card definition lookup

pub mod characteristics;
pub mod definition;
pub mod registry;

pub use characteristics::{CardType, Characteristics, Color, Keyword};
pub use definition::{CardDefinition, CardId};
pub use registry::{CardRegistry, RegistryError};
