//! Entity filters: predicates over projected entity state.
//!
//! Filters select which entities a modifier affects, which entities a
//! per-matching loop visits, and which cards a search may find. They are
//! plain data so they can sit inside modifiers and continuations.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::layer::Characteristic;
use super::modifier::TextChange;
use super::projector::ProjectedView;
use crate::cards::{CardType, Color, Keyword};
use crate::core::{EntityId, PlayerId};

/// Bindings a filter is evaluated against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FilterScope {
    /// The entity the filter belongs to (a modifier's source, an effect's source).
    pub source: Option<EntityId>,
    /// The player "you" refers to.
    pub controller: Option<PlayerId>,
}

impl FilterScope {
    pub fn new(source: Option<EntityId>, controller: Option<PlayerId>) -> Self {
        Self { source, controller }
    }
}

/// Predicate over an entity's projected characteristics.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityFilter {
    /// The scope's source entity.
    Source,
    /// One specific entity.
    Specific(EntityId),
    /// Everything.
    All,
    /// Creatures.
    Creatures,
    HasCardType(CardType),
    HasSubtype(String),
    HasColor(Color),
    HasKeyword(Keyword),
    ControlledBy(PlayerId),
    /// Controlled by the scope's controller.
    ControlledByYou,
    /// Anything except the scope's source.
    NotSource,
    And(Vec<EntityFilter>),
    Or(Vec<EntityFilter>),
    Not(Box<EntityFilter>),
}

impl EntityFilter {
    /// Conjunction helper.
    #[must_use]
    pub fn and(self, other: EntityFilter) -> EntityFilter {
        match self {
            EntityFilter::And(mut parts) => {
                parts.push(other);
                EntityFilter::And(parts)
            }
            first => EntityFilter::And(vec![first, other]),
        }
    }

    /// Evaluate against a projected view.
    #[must_use]
    pub fn matches(&self, view: &ProjectedView, scope: &FilterScope) -> bool {
        match self {
            EntityFilter::Source => scope.source == Some(view.id),
            EntityFilter::Specific(id) => view.id == *id,
            EntityFilter::All => true,
            EntityFilter::Creatures => view.card_types.contains(&CardType::Creature),
            EntityFilter::HasCardType(t) => view.card_types.contains(t),
            EntityFilter::HasSubtype(s) => view.subtypes.contains(s),
            EntityFilter::HasColor(c) => view.colors.contains(c),
            EntityFilter::HasKeyword(k) => view.keywords.contains(k),
            EntityFilter::ControlledBy(p) => view.controller == *p,
            EntityFilter::ControlledByYou => scope.controller == Some(view.controller),
            EntityFilter::NotSource => scope.source != Some(view.id),
            EntityFilter::And(parts) => parts.iter().all(|f| f.matches(view, scope)),
            EntityFilter::Or(parts) => parts.iter().any(|f| f.matches(view, scope)),
            EntityFilter::Not(inner) => !inner.matches(view, scope),
        }
    }

    /// Characteristics this filter reads.
    #[must_use]
    pub fn inspected(&self) -> BTreeSet<Characteristic> {
        let mut out = BTreeSet::new();
        self.collect_inspected(&mut out);
        out
    }

    fn collect_inspected(&self, out: &mut BTreeSet<Characteristic>) {
        match self {
            EntityFilter::Source
            | EntityFilter::Specific(_)
            | EntityFilter::All
            | EntityFilter::NotSource => {}
            EntityFilter::Creatures | EntityFilter::HasCardType(_) => {
                out.insert(Characteristic::CardType);
            }
            EntityFilter::HasSubtype(_) => {
                out.insert(Characteristic::Subtype);
            }
            EntityFilter::HasColor(_) => {
                out.insert(Characteristic::Color);
            }
            EntityFilter::HasKeyword(_) => {
                out.insert(Characteristic::Keyword);
            }
            EntityFilter::ControlledBy(_) | EntityFilter::ControlledByYou => {
                out.insert(Characteristic::Controller);
            }
            EntityFilter::And(parts) | EntityFilter::Or(parts) => {
                for part in parts {
                    part.collect_inspected(out);
                }
            }
            EntityFilter::Not(inner) => inner.collect_inspected(out),
        }
    }

    /// True when the filter can only ever match one fixed entity.
    ///
    /// Self-scoped filters never take part in dependency ordering.
    #[must_use]
    pub fn is_self_scoped(&self) -> bool {
        match self {
            EntityFilter::Source | EntityFilter::Specific(_) => true,
            EntityFilter::And(parts) => parts.iter().any(EntityFilter::is_self_scoped),
            _ => false,
        }
    }

    /// Apply text-changing replacements to the words this filter mentions.
    #[must_use]
    pub fn rewritten(&self, changes: &[TextChange]) -> EntityFilter {
        match self {
            EntityFilter::HasColor(c) => EntityFilter::HasColor(TextChange::apply_color(changes, *c)),
            EntityFilter::HasSubtype(s) => {
                EntityFilter::HasSubtype(TextChange::apply_subtype(changes, s))
            }
            EntityFilter::And(parts) => {
                EntityFilter::And(parts.iter().map(|f| f.rewritten(changes)).collect())
            }
            EntityFilter::Or(parts) => {
                EntityFilter::Or(parts.iter().map(|f| f.rewritten(changes)).collect())
            }
            EntityFilter::Not(inner) => EntityFilter::Not(Box::new(inner.rewritten(changes))),
            other => other.clone(),
        }
    }
}

impl fmt::Display for EntityFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityFilter::Source => write!(f, "this"),
            EntityFilter::Specific(id) => write!(f, "{id}"),
            EntityFilter::All => write!(f, "anything"),
            EntityFilter::Creatures => write!(f, "creature"),
            EntityFilter::HasCardType(t) => write!(f, "{t:?}"),
            EntityFilter::HasSubtype(s) => write!(f, "{s}"),
            EntityFilter::HasColor(c) => write!(f, "{c:?}"),
            EntityFilter::HasKeyword(k) => write!(f, "with {k:?}"),
            EntityFilter::ControlledBy(p) => write!(f, "controlled by {p}"),
            EntityFilter::ControlledByYou => write!(f, "you control"),
            EntityFilter::NotSource => write!(f, "other"),
            EntityFilter::And(parts) => join(f, parts, " "),
            EntityFilter::Or(parts) => join(f, parts, " or "),
            EntityFilter::Not(inner) => write!(f, "non-{inner}"),
        }
    }
}

fn join(f: &mut fmt::Formatter<'_>, parts: &[EntityFilter], sep: &str) -> fmt::Result {
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{part}")?;
    }
    Ok(())
}
