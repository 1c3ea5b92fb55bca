//! Registered effect handlers for card-specific leaves.
//!
//! `LeafEffect::Custom { handler, args }` names a handler registered with
//! the engine. The tree only carries the name and typed arguments, so it
//! stays serializable; the behavior lives in the registry.
//!
//! ## Arguments
//!
//! `HandlerArgs` is a small typed key/value map:
//! - `Int`: numbers (amounts, counts)
//! - `Bool`: flags
//! - `Text`: names, keys
//! - `Entity` / `Entities`: object references

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::context::ExecutionContext;
use super::leaf::LeafOutcome;
use crate::core::{EntityId, GameState};
use crate::error::ExecutionError;
use crate::layers::ProjectionCache;

/// Value for a handler argument.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArgValue {
    Int(i64),
    Bool(bool),
    Text(String),
    Entity(EntityId),
    Entities(Vec<EntityId>),
}

impl ArgValue {
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ArgValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ArgValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ArgValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Entities, treating a single entity as a one-element list.
    #[must_use]
    pub fn as_entities(&self) -> Option<Vec<EntityId>> {
        match self {
            ArgValue::Entity(id) => Some(vec![*id]),
            ArgValue::Entities(ids) => Some(ids.clone()),
            _ => None,
        }
    }
}

impl From<i64> for ArgValue {
    fn from(v: i64) -> Self {
        ArgValue::Int(v)
    }
}

impl From<i32> for ArgValue {
    fn from(v: i32) -> Self {
        ArgValue::Int(i64::from(v))
    }
}

impl From<bool> for ArgValue {
    fn from(v: bool) -> Self {
        ArgValue::Bool(v)
    }
}

impl From<&str> for ArgValue {
    fn from(v: &str) -> Self {
        ArgValue::Text(v.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(v: String) -> Self {
        ArgValue::Text(v)
    }
}

impl From<EntityId> for ArgValue {
    fn from(v: EntityId) -> Self {
        ArgValue::Entity(v)
    }
}

impl From<Vec<EntityId>> for ArgValue {
    fn from(v: Vec<EntityId>) -> Self {
        ArgValue::Entities(v)
    }
}

/// Arguments passed to a handler, ordered by key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerArgs(BTreeMap<String, ArgValue>);

impl HandlerArgs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an argument (builder pattern).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ArgValue>) {
        self.0.insert(key.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ArgValue> {
        self.0.get(key)
    }

    /// Integer argument, or `default` if absent or not an integer.
    #[must_use]
    pub fn int(&self, key: &str, default: i64) -> i64 {
        self.get(key).and_then(ArgValue::as_int).unwrap_or(default)
    }

    /// Required integer argument.
    pub fn require_int(&self, handler: &str, key: &str) -> Result<i64, ExecutionError> {
        self.get(key)
            .and_then(ArgValue::as_int)
            .ok_or_else(|| ExecutionError::HandlerFailed {
                handler: handler.to_string(),
                reason: format!("missing integer argument '{key}'"),
            })
    }

    #[must_use]
    pub fn flag(&self, key: &str) -> bool {
        self.get(key).and_then(ArgValue::as_bool).unwrap_or(false)
    }

    #[must_use]
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(ArgValue::as_text)
    }

    #[must_use]
    pub fn entities(&self, key: &str) -> Vec<EntityId> {
        self.get(key).and_then(ArgValue::as_entities).unwrap_or_default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Behavior behind a custom leaf.
///
/// `execute` runs when the leaf is reached. A handler that needs input
/// returns `LeafOutcome::Suspend` with a `DecisionContext::Custom` carrying
/// its own name and whatever payload it needs later; `resume` is then
/// called with the selected entities.
pub trait EffectHandler: Send + Sync {
    fn execute(
        &self,
        state: GameState,
        args: &HandlerArgs,
        ctx: ExecutionContext,
        cache: &mut ProjectionCache,
    ) -> Result<LeafOutcome, ExecutionError>;

    fn resume(
        &self,
        state: GameState,
        payload: &HandlerArgs,
        chosen: &[EntityId],
        ctx: ExecutionContext,
        cache: &mut ProjectionCache,
    ) -> Result<LeafOutcome, ExecutionError> {
        let _ = (payload, chosen, cache);
        Ok(LeafOutcome::done(state, ctx))
    }
}

/// Handlers by name.
#[derive(Clone, Default)]
pub struct EffectHandlerRegistry {
    handlers: FxHashMap<String, Arc<dyn EffectHandler>>,
}

impl EffectHandlerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, replacing any previous one with the same name.
    pub fn register(&mut self, name: impl Into<String>, handler: impl EffectHandler + 'static) {
        self.handlers.insert(name.into(), Arc::new(handler));
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn EffectHandler>> {
        self.handlers.get(name).cloned()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for EffectHandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.handlers.keys().collect();
        names.sort();
        f.debug_struct("EffectHandlerRegistry")
            .field("handlers", &names)
            .finish()
    }
}
