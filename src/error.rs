//! Error types for the rules core.
//!
//! Three categories, kept apart on purpose:
//!
//! - `RulesViolation` / `Legality`: a proposed action is illegal. Carries a
//!   reason meant for the player; the caller re-prompts.
//! - `ProtocolError`: the caller and the engine disagree about the decision
//!   protocol or the continuation stack. A bug, never shown to players.
//! - `ExecutionError`: an effect tree failed while running. Reported inside
//!   `ExecutionResult::Error` together with the state at the failure point.
//!
//! Benign empties (no legal targets, declined "may") are not errors at all.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::EntityId;
use crate::decisions::DecisionId;

/// Caller/engine integration failure.
#[derive(Error, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProtocolError {
    #[error("No decision is pending")]
    NoPendingDecision,

    #[error("Response answers {got} but {expected} is pending")]
    DecisionIdMismatch { expected: DecisionId, got: DecisionId },

    #[error("Response shape does not match the pending decision: {0}")]
    ResponseShapeMismatch(String),

    #[error("Response rejected: {0}")]
    InvalidResponse(String),

    #[error("No effect handler registered under '{0}'")]
    UnregisteredHandler(String),

    #[error("Continuation stack is corrupt: {0}")]
    CorruptContinuation(String),

    #[error("State already has a pending decision")]
    DecisionAlreadyPending,

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Failure while executing an effect tree.
#[derive(Error, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionError {
    #[error("Missing binding: {0}")]
    MissingBinding(String),

    #[error("Repeat loop exceeded {0} iterations")]
    IterationLimit(u32),

    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    #[error("Invalid target {entity}: {reason}")]
    InvalidTarget { entity: EntityId, reason: String },

    #[error("Cost could not be paid: {0}")]
    CostUnpaid(String),

    #[error("Effect handler '{handler}' failed: {reason}")]
    HandlerFailed { handler: String, reason: String },
}

/// A rules-illegal action, with a reason for the player.
#[derive(Error, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[error("{reason}")]
pub struct RulesViolation {
    pub reason: String,
}

impl RulesViolation {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Outcome of a legality check.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Legality {
    Valid,
    Invalid(String),
}

impl Legality {
    /// Build an `Invalid` result.
    pub fn invalid(reason: impl Into<String>) -> Self {
        Legality::Invalid(reason.into())
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Legality::Valid)
    }

    /// Convert into a `Result` for `?` chains in declaring operations.
    pub fn into_result(self) -> Result<(), RulesViolation> {
        match self {
            Legality::Valid => Ok(()),
            Legality::Invalid(reason) => Err(RulesViolation { reason }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legality_into_result() {
        assert!(Legality::Valid.into_result().is_ok());

        let err = Legality::invalid("Creature is tapped").into_result().unwrap_err();
        assert_eq!(err.to_string(), "Creature is tapped");
    }

    #[test]
    fn test_protocol_error_display() {
        let err = ProtocolError::DecisionIdMismatch {
            expected: DecisionId(3),
            got: DecisionId(2),
        };
        assert_eq!(err.to_string(), "Response answers Decision(2) but Decision(3) is pending");
    }
}
