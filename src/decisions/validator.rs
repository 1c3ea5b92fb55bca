//! Response validation.
//!
//! `DecisionValidator::validate` never fails and never changes anything:
//! any response, however malformed, yields `Valid` or `Invalid(reason)`.

use crate::core::{EntityId, GameState};
use crate::effects::Continuation;

use super::decision::{DecisionChoice, DecisionContext, DecisionResponse, PlayerDecision};

/// Verdict on a response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Validation {
    Valid,
    Invalid(String),
}

impl Validation {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Validation::Invalid(reason.into())
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid)
    }
}

/// Checks responses against the decision they answer.
pub struct DecisionValidator;

impl DecisionValidator {
    pub fn validate(state: &GameState, decision: &PlayerDecision, response: &DecisionResponse) -> Validation {
        if response.decision_id != decision.id {
            return Validation::invalid(format!(
                "response answers {} but {} was asked",
                response.decision_id, decision.id
            ));
        }
        let expected = decision.context.shape();
        if response.choice.shape() != expected {
            return Validation::invalid(format!(
                "{} decision needs a {expected}, got a {}",
                decision.context.kind(),
                response.choice.shape()
            ));
        }

        match (&decision.context, &response.choice) {
            (DecisionContext::ChooseModes { modes, min, max }, DecisionChoice::Modes(chosen)) => {
                if let Some(bad) = chosen.iter().find(|&&i| i >= modes.len()) {
                    return Validation::invalid(format!("mode {bad} does not exist"));
                }
                check_count(chosen, *min, *max)
            }
            (context, DecisionChoice::Entities(chosen)) => {
                let Some((min, max)) = context.selection_bounds() else {
                    return Validation::Valid;
                };
                let options = context.options();
                if let Some(bad) = chosen.iter().find(|id| !options.contains(id)) {
                    return Validation::invalid(format!("{bad} was not offered"));
                }
                check_count(chosen, min, max)
            }
            (DecisionContext::MayPayCost { cost }, DecisionChoice::YesNo(true)) => {
                if cost.can_pay(state, decision.player, paying_source(state)) {
                    Validation::Valid
                } else {
                    Validation::invalid(format!("{cost:?} cannot be paid"))
                }
            }
            (DecisionContext::SacrificeUnless { permanent, cost }, DecisionChoice::YesNo(true)) => {
                if cost.can_pay(state, decision.player, Some(*permanent)) {
                    Validation::Valid
                } else {
                    Validation::invalid(format!("{cost:?} cannot be paid"))
                }
            }
            _ => Validation::Valid,
        }
    }
}

/// Source of the effect a "may pay" question guards.
fn paying_source(state: &GameState) -> Option<EntityId> {
    match state.continuations().last() {
        Some(Continuation::MayPayCost { context, .. }) => context.source,
        _ => None,
    }
}

fn check_count<T: PartialEq + std::fmt::Debug>(chosen: &[T], min: usize, max: usize) -> Validation {
    if chosen.len() < min || chosen.len() > max {
        let wanted = if min == max {
            format!("exactly {min}")
        } else {
            format!("{min} to {max}")
        };
        return Validation::invalid(format!("chose {}, needs {wanted}", chosen.len()));
    }
    for (i, item) in chosen.iter().enumerate() {
        if chosen[..i].contains(item) {
            return Validation::invalid(format!("{item:?} chosen twice"));
        }
    }
    Validation::Valid
}
