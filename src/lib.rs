//! # rules-core
//!
//! The rules center of a trading-card game engine: continuous effects,
//! resumable effect execution, and combat damage.
//!
//! ## Design Principles
//!
//! 1. **State In, State Out**: every operation takes a `GameState` and
//!    returns a new one. Cloning is O(1) via `im`, so callers keep old
//!    states for free.
//!
//! 2. **Nothing Survives a Suspension but Data**: when an effect needs a
//!    player's answer, everything needed to continue is written into the
//!    state as serializable continuation frames. A state read back from
//!    bytes resumes exactly like the original.
//!
//! 3. **Projected, Never Stored**: a permanent's effective characteristics
//!    are computed from its base values and the active modifiers on demand,
//!    in strict layer order, and cached per state revision.
//!
//! ## Modules
//!
//! - `core`: entity ids, components, players, RNG, configuration, `GameState`
//! - `zones`: per-player ordered zones
//! - `cards`: characteristics, card definitions, registry
//! - `layers`: modifiers, dependency ordering, projection, projection cache
//! - `effects`: effect trees, the execution engine, continuations
//! - `decisions`: player decisions, validation, resumption, drivers
//! - `combat`: declarations and damage steps
//! - `rules`: damage, state-based actions, cleanup discard
//! - `error`: protocol, execution and rules errors

pub mod cards;
pub mod combat;
pub mod core;
pub mod decisions;
pub mod effects;
pub mod error;
pub mod layers;
pub mod rules;
pub mod zones;

// Re-export commonly used types
pub use crate::core::{
    Component, ComponentKind, CounterKind, CounterSet, EntityId, EntityStore, GameConfig, GameRng, GameState,
    PlayerId, PlayerMap, PlayerState, StateRevision,
};

pub use crate::zones::{ZoneKey, ZoneManager, ZonePosition, ZoneType};

pub use crate::cards::{CardDefinition, CardId, CardRegistry, CardType, Characteristics, Color, Keyword};

pub use crate::layers::{
    sort_with_dependencies, ApplicationStep, CacheStats, Characteristic, Duration, EntityFilter, Layer,
    Modification, Modifier, ModifierId, ProjectedView, ProjectionCache, PtSublayer, PtValue, StateProjector,
    Timestamp,
};

pub use crate::effects::{
    Amount, Condition, Continuation, Cost, EffectEngine, EffectHandler, EffectHandlerRegistry, EffectNode,
    EntityRef, ExecutionContext, ExecutionResult, GameEvent, LeafEffect, PlayerRef, TargetSpec,
};

pub use crate::decisions::{
    run_to_completion, DecisionChoice, DecisionContext, DecisionId, DecisionResponse, DecisionValidator,
    FallbackPlayer, FallbackStrategy, PlayerDecision, PlayerInterface, ScriptedPlayer, Validation,
};

pub use crate::combat::{
    calculate_combat_damage, can_declare_attacker, can_declare_blocker, resolve_combat_damage, resolve_damage_step,
    CombatDamage, CombatState, DamageStep,
};

pub use crate::rules::{apply_state_based_actions, request_cleanup_discard};

pub use crate::error::{ExecutionError, Legality, ProtocolError, RulesViolation};
