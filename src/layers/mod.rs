//! Continuous effects: the layer model, dependency ordering, projection.
//!
//! ## Key Types
//!
//! - `Modifier`: one continuous effect as data
//! - `Modification`: what a modifier changes (its variant fixes the layer)
//! - `EntityFilter`: which entities a modifier affects
//! - `ApplicationStep`: the strict layer/sublayer order
//! - `StateProjector`: computes `ProjectedView`s
//! - `ProjectionCache`: per-worker memo of projections
//!
//! ## Ordering
//!
//! Steps apply in `ApplicationStep::ORDER`. Within one step,
//! `sort_with_dependencies` orders modifiers by characteristic dependency
//! first and timestamp second.

pub mod cache;
pub mod dependency;
pub mod filter;
pub mod layer;
pub mod modifier;
pub mod projector;

pub use cache::{CacheStats, ProjectionCache};
pub use dependency::{depends_on, sort_with_dependencies};
pub use filter::{EntityFilter, FilterScope};
pub use layer::{ApplicationStep, Characteristic, Layer, PtSublayer};
pub use modifier::{
    Duration, ExpiryEvent, Modification, Modifier, ModifierId, PtValue, TextChange, Timestamp,
};
pub use projector::{ProjectedView, StateProjector};
