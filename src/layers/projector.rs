//! State projection: effective characteristics after continuous effects.
//!
//! The projector starts from each entity's stored base characteristics and
//! applies every active modifier step by step in `ApplicationStep::ORDER`,
//! and within a step in dependency order. All battlefield entities are
//! projected in lockstep so that a filter or a counted P/T value always
//! sees the in-progress characteristics of every permanent.
//!
//! Projection is a pure function of `(GameState, extra modifiers)`.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::dependency::sort_with_dependencies;
use super::filter::{EntityFilter, FilterScope};
use super::layer::ApplicationStep;
use super::modifier::{Modification, Modifier, PtValue, TextChange};
use crate::cards::{CardId, CardType, Characteristics, Color, Keyword};
use crate::core::{Component, ComponentKind, CounterSet, EntityId, GameState, PlayerId};
use crate::zones::{ZoneKey, ZoneType};

/// Effective characteristics of one entity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectedView {
    pub id: EntityId,
    pub card_id: Option<CardId>,
    pub name: String,
    pub owner: PlayerId,
    pub controller: PlayerId,
    pub zone: Option<ZoneKey>,
    pub card_types: BTreeSet<CardType>,
    pub subtypes: BTreeSet<String>,
    pub colors: BTreeSet<Color>,
    pub keywords: BTreeSet<Keyword>,
    pub power: Option<i32>,
    pub toughness: Option<i32>,
    pub damage: u32,
    pub deathtouch_damage: bool,
    pub tapped: bool,
    pub counters: CounterSet,
    pub summoning_sick: bool,
}

impl ProjectedView {
    /// Build an unmodified view from characteristics alone.
    #[must_use]
    pub fn from_base(id: EntityId, base: &Characteristics, controller: PlayerId) -> Self {
        Self {
            id,
            card_id: None,
            name: base.name.clone(),
            owner: controller,
            controller,
            zone: None,
            card_types: base.card_types.clone(),
            subtypes: base.subtypes.clone(),
            colors: base.colors.clone(),
            keywords: base.keywords.clone(),
            power: base.power,
            toughness: base.toughness,
            damage: 0,
            deathtouch_damage: false,
            tapped: false,
            counters: CounterSet::new(),
            summoning_sick: false,
        }
    }

    /// Build the base view of a stored entity. `None` for players and
    /// entities that no longer exist.
    #[must_use]
    pub fn from_store(state: &GameState, id: EntityId) -> Option<Self> {
        let store = state.entities();
        let base = store.base(id)?;
        let owner = store.owner(id)?;
        let controller = store.controller(id).unwrap_or(owner);

        let mut view = Self::from_base(id, base, controller);
        view.owner = owner;
        view.zone = state.zones().get_zone(id);
        if let Some(Component::Card { card_id, .. }) = store.component(id, ComponentKind::Card) {
            view.card_id = Some(*card_id);
        }
        view.damage = store.damage(id);
        view.deathtouch_damage = store.has(id, ComponentKind::DeathtouchDamage);
        view.tapped = store.is_tapped(id);
        view.counters = store.counters(id);
        view.summoning_sick = store.has(id, ComponentKind::SummoningSick);
        Some(view)
    }

    #[must_use]
    pub fn is_creature(&self) -> bool {
        self.card_types.contains(&CardType::Creature)
    }

    #[must_use]
    pub fn has_keyword(&self, keyword: Keyword) -> bool {
        self.keywords.contains(&keyword)
    }

    #[must_use]
    pub fn is_on_battlefield(&self) -> bool {
        self.zone.is_some_and(|z| z.zone_type == ZoneType::Battlefield)
    }

    /// Power, treating "no power" as 0.
    #[must_use]
    pub fn effective_power(&self) -> i32 {
        self.power.unwrap_or(0)
    }

    /// Toughness, treating "no toughness" as 0.
    #[must_use]
    pub fn effective_toughness(&self) -> i32 {
        self.toughness.unwrap_or(0)
    }

    /// Damage still needed for lethal, ignoring deathtouch on the source.
    #[must_use]
    pub fn lethal_damage_remaining(&self) -> u32 {
        let remaining = i64::from(self.effective_toughness()) - i64::from(self.damage);
        remaining.max(0) as u32
    }

    /// Untapped creature that could attack this turn.
    #[must_use]
    pub fn can_attack_now(&self) -> bool {
        self.is_creature()
            && !self.tapped
            && !self.has_keyword(Keyword::Defender)
            && (!self.summoning_sick || self.has_keyword(Keyword::Haste))
    }

    fn apply_counters(&mut self) {
        let net = self.counters.net_pt();
        if net == 0 {
            return;
        }
        if let Some(p) = self.power.as_mut() {
            *p += net;
        }
        if let Some(t) = self.toughness.as_mut() {
            *t += net;
        }
    }

    fn copy_values_from(&mut self, source: &CopiableValues) {
        self.name = source.name.clone();
        self.card_types = source.card_types.clone();
        self.subtypes = source.subtypes.clone();
        self.colors = source.colors.clone();
        self.keywords = source.keywords.clone();
        self.power = source.power;
        self.toughness = source.toughness;
    }
}

/// The values a copy effect takes from its target.
struct CopiableValues {
    name: String,
    card_types: BTreeSet<CardType>,
    subtypes: BTreeSet<String>,
    colors: BTreeSet<Color>,
    keywords: BTreeSet<Keyword>,
    power: Option<i32>,
    toughness: Option<i32>,
}

impl CopiableValues {
    fn from_view(view: &ProjectedView) -> Self {
        Self {
            name: view.name.clone(),
            card_types: view.card_types.clone(),
            subtypes: view.subtypes.clone(),
            colors: view.colors.clone(),
            keywords: view.keywords.clone(),
            power: view.power,
            toughness: view.toughness,
        }
    }

    fn from_base(base: &Characteristics) -> Self {
        Self {
            name: base.name.clone(),
            card_types: base.card_types.clone(),
            subtypes: base.subtypes.clone(),
            colors: base.colors.clone(),
            keywords: base.keywords.clone(),
            power: base.power,
            toughness: base.toughness,
        }
    }
}

/// Computes projected views.
#[derive(Clone, Copy, Debug, Default)]
pub struct StateProjector;

impl StateProjector {
    /// Project one entity against the state's active modifiers.
    #[must_use]
    pub fn project(state: &GameState, id: EntityId) -> Option<ProjectedView> {
        Self::project_with(state, id, &[])
    }

    /// Project one entity with additional, hypothetical modifiers.
    ///
    /// Off-battlefield entities get their base view. Missing entities
    /// yield `None`.
    #[must_use]
    pub fn project_with(state: &GameState, id: EntityId, extra: &[Modifier]) -> Option<ProjectedView> {
        if state.zones().is_in_zone_type(id, ZoneType::Battlefield) {
            project_all(state, extra).remove(&id)
        } else {
            ProjectedView::from_store(state, id)
        }
    }

    /// Project every battlefield entity, ordered by id.
    #[must_use]
    pub fn project_battlefield(state: &GameState) -> Vec<ProjectedView> {
        Self::project_battlefield_with(state, &[])
    }

    /// Project every battlefield entity with additional modifiers.
    #[must_use]
    pub fn project_battlefield_with(state: &GameState, extra: &[Modifier]) -> Vec<ProjectedView> {
        project_all(state, extra).into_values().collect()
    }
}

fn project_all(state: &GameState, extra: &[Modifier]) -> BTreeMap<EntityId, ProjectedView> {
    let mut views: BTreeMap<EntityId, ProjectedView> = state
        .zones()
        .cards_of_type(ZoneType::Battlefield)
        .into_iter()
        .filter_map(|id| ProjectedView::from_store(state, id).map(|v| (id, v)))
        .collect();
    if views.is_empty() {
        return views;
    }

    let active: Vec<&Modifier> = state.modifiers().iter().chain(extra.iter()).collect();
    let mut text_changes: BTreeMap<EntityId, Vec<TextChange>> = BTreeMap::new();

    for step in ApplicationStep::ORDER {
        if step == ApplicationStep::PtCounters {
            for view in views.values_mut() {
                view.apply_counters();
            }
            continue;
        }

        let staged: Vec<Cow<'_, Modifier>> = active
            .iter()
            .filter(|m| m.step() == step)
            .map(|m| rewrite_for_text(*m, step, &text_changes))
            .collect();
        if staged.is_empty() {
            continue;
        }

        let refs: Vec<&Modifier> = staged.iter().map(|m| &**m).collect();
        for modifier in sort_with_dependencies(&refs) {
            apply_modifier(state, modifier, &mut views, &mut text_changes);
        }
    }

    views
}

fn rewrite_for_text<'a>(
    modifier: &'a Modifier,
    step: ApplicationStep,
    text_changes: &BTreeMap<EntityId, Vec<TextChange>>,
) -> Cow<'a, Modifier> {
    if step <= ApplicationStep::Text {
        return Cow::Borrowed(modifier);
    }
    match text_changes.get(&modifier.source) {
        Some(changes) if !changes.is_empty() => {
            let mut rewritten = modifier.clone();
            rewritten.filter = modifier.filter.rewritten(changes);
            rewritten.modification = modifier.modification.rewritten(changes);
            Cow::Owned(rewritten)
        }
        _ => Cow::Borrowed(modifier),
    }
}

fn apply_modifier(
    state: &GameState,
    modifier: &Modifier,
    views: &mut BTreeMap<EntityId, ProjectedView>,
    text_changes: &mut BTreeMap<EntityId, Vec<TextChange>>,
) {
    let scope = FilterScope::new(
        Some(modifier.source),
        views
            .get(&modifier.source)
            .map(|v| v.controller)
            .or_else(|| state.entities().controller(modifier.source)),
    );
    let affected: Vec<EntityId> = views
        .values()
        .filter(|v| modifier.filter.matches(v, &scope))
        .map(|v| v.id)
        .collect();
    if affected.is_empty() {
        return;
    }

    match &modifier.modification {
        Modification::CopyOf(target) => {
            let copiable = views
                .get(target)
                .map(CopiableValues::from_view)
                .or_else(|| state.entities().base(*target).map(CopiableValues::from_base));
            if let Some(copiable) = copiable {
                for id in &affected {
                    if let Some(view) = views.get_mut(id) {
                        view.copy_values_from(&copiable);
                    }
                }
            }
        }
        Modification::ReplaceColorWord { from, to } => {
            for id in affected {
                text_changes.entry(id).or_default().push(TextChange::Color {
                    from: *from,
                    to: *to,
                });
            }
        }
        Modification::ReplaceSubtypeWord { from, to } => {
            for id in affected {
                text_changes.entry(id).or_default().push(TextChange::Subtype {
                    from: from.clone(),
                    to: to.clone(),
                });
            }
        }
        Modification::DefinePowerToughness { power, toughness } => {
            let power = evaluate(power, views, &scope);
            let toughness = evaluate(toughness, views, &scope);
            for id in &affected {
                if let Some(view) = views.get_mut(id) {
                    view.power = Some(power);
                    view.toughness = Some(toughness);
                }
            }
        }
        other => {
            for id in &affected {
                if let Some(view) = views.get_mut(id) {
                    apply_simple(other, view);
                }
            }
        }
    }
}

fn evaluate(value: &PtValue, views: &BTreeMap<EntityId, ProjectedView>, scope: &FilterScope) -> i32 {
    match value {
        PtValue::Fixed(n) => *n,
        PtValue::CountMatching(filter) => count_matching(filter, views, scope),
    }
}

fn count_matching(filter: &EntityFilter, views: &BTreeMap<EntityId, ProjectedView>, scope: &FilterScope) -> i32 {
    views.values().filter(|v| filter.matches(v, scope)).count() as i32
}

fn apply_simple(modification: &Modification, view: &mut ProjectedView) {
    match modification {
        Modification::ChangeController(player) => view.controller = *player,
        Modification::AddCardTypes(types) => view.card_types.extend(types.iter().copied()),
        Modification::RemoveCardTypes(types) => view.card_types.retain(|t| !types.contains(t)),
        Modification::SetCardTypes(types) => view.card_types = types.clone(),
        Modification::AddSubtypes(subtypes) => view.subtypes.extend(subtypes.iter().cloned()),
        Modification::RemoveAllSubtypes => view.subtypes.clear(),
        Modification::SetColors(colors) => view.colors = colors.clone(),
        Modification::AddColors(colors) => view.colors.extend(colors.iter().copied()),
        Modification::AddKeywords(keywords) => view.keywords.extend(keywords.iter().copied()),
        Modification::RemoveKeywords(keywords) => view.keywords.retain(|k| !keywords.contains(k)),
        Modification::RemoveAllAbilities => view.keywords.clear(),
        Modification::SetPowerToughness { power, toughness } => {
            view.power = Some(*power);
            view.toughness = Some(*toughness);
        }
        Modification::ModifyPowerToughness { power, toughness } => {
            view.power = Some(view.power.unwrap_or(0) + power);
            view.toughness = Some(view.toughness.unwrap_or(0) + toughness);
        }
        Modification::SwitchPowerToughness => {
            std::mem::swap(&mut view.power, &mut view.toughness);
        }
        // Handled with access to every view in `apply_modifier`.
        Modification::CopyOf(_)
        | Modification::ReplaceColorWord { .. }
        | Modification::ReplaceSubtypeWord { .. }
        | Modification::DefinePowerToughness { .. } => {}
    }
}
