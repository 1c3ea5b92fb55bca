//! Effect trees and the engine that runs them.
//!
//! ## Key Types
//!
//! - `EffectNode`: a composite or a `LeafEffect`, as plain data
//! - `ExecutionContext`: controller, source, targets and loop bindings
//! - `EffectEngine`: `execute` and `resume`
//! - `Continuation`: a suspended node on the state's continuation stack
//! - `EffectHandlerRegistry`: named custom leaves
//! - `GameEvent`: the record of what an execution changed
//!
//! ## Suspension
//!
//! A node that needs a player's answer stops the whole tree. The question
//! goes into `GameState::pending_decision` and every enclosing composite
//! leaves a `Continuation` frame describing what it still has to do. The
//! caller gets the state back and later calls `EffectEngine::resume`.

pub(crate) mod composite;
pub mod context;
pub mod continuation;
pub mod cost;
pub mod engine;
pub mod events;
pub mod handlers;
pub(crate) mod leaf;
pub mod node;
pub mod targeting;

pub use context::ExecutionContext;
pub use continuation::{Continuation, LoopBinding, RepeatPhase};
pub use cost::Cost;
pub use engine::{Dispatch, EffectEngine, ExecutionResult, Flow};
pub use events::{DamageTarget, GameEvent};
pub use handlers::{ArgValue, EffectHandler, EffectHandlerRegistry, HandlerArgs};
pub use leaf::LeafOutcome;
pub use node::{
    Affected, Amount, Condition, EffectNode, EntityRef, LeafEffect, LookRest, Mode, PlayerRef, PlayerScope,
    Recipient, RepeatCondition,
};
pub use targeting::{TargetController, TargetCount, TargetSpec, TargetType};
