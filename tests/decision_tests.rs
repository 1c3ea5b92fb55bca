//! Decision driver tests.
//!
//! Whole effect trees answered by scripted and fallback players through
//! `run_to_completion`.

use rules_core::decisions::{DecisionOutcome, DriveError, DriveOutcome};
use rules_core::effects::{Mode, PlayerScope};
use rules_core::{
    run_to_completion, Amount, Characteristics, DecisionChoice, DecisionContext, EffectEngine, EffectNode,
    EntityFilter, EntityId, EntityRef, ExecutionContext, ExecutionError, FallbackPlayer, FallbackStrategy,
    GameConfig, GameState, LeafEffect, PlayerDecision, PlayerId, PlayerInterface, PlayerRef, ScriptedPlayer,
    TargetSpec, ZoneType,
};

fn gain(n: i64) -> EffectNode {
    EffectNode::leaf(LeafEffect::GainLife {
        player: PlayerRef::Controller,
        amount: Amount::Fixed(n),
    })
}

fn setup() -> (GameState, EffectEngine, PlayerId, PlayerId) {
    let config = GameConfig::default();
    let state = GameState::new(&config);
    (state, EffectEngine::new(&config), PlayerId::new(0), PlayerId::new(1))
}

/// Answers nothing; gives up at the first question.
struct Quitter;

impl PlayerInterface for Quitter {
    fn request_decision(&mut self, _state: &GameState, _decision: &PlayerDecision) -> DecisionOutcome {
        DecisionOutcome::Conceded
    }
}

// =============================================================================
// Scripted answers
// =============================================================================

/// Target, mode and optional-effect questions come in tree order, and each
/// answer steers what follows.
#[test]
fn test_scripted_tree() {
    let (mut state, mut engine, p0, p1) = setup();
    let ours = state.create_card(p0, Characteristics::creature("Squire", 1, 2), ZoneType::Battlefield);
    let theirs = state.create_card(p1, Characteristics::creature("Ogre", 3, 3), ZoneType::Battlefield);

    let tree = EffectNode::sequence([
        EffectNode::leaf(LeafEffect::ChooseTargets {
            spec: TargetSpec::creature(),
            store_as: Some("victim".into()),
        }),
        EffectNode::choose_one([
            Mode::new(
                "destroy it",
                EffectNode::leaf(LeafEffect::Destroy {
                    what: EntityRef::Stored("victim".into()),
                }),
            ),
            Mode::new(
                "exile it",
                EffectNode::leaf(LeafEffect::Exile {
                    what: EntityRef::Stored("victim".into()),
                }),
            ),
        ]),
        EffectNode::may(gain(4)),
    ]);

    let mut player = ScriptedPlayer::new([
        DecisionChoice::Entities(vec![theirs]),
        DecisionChoice::Modes(vec![1]),
        DecisionChoice::YesNo(false),
    ]);
    let outcome = run_to_completion(&mut engine, &state, &tree, ExecutionContext::new(p0), &mut player, 1).unwrap();

    assert!(matches!(outcome, DriveOutcome::Completed { .. }));
    assert_eq!(player.remaining(), 0);
    let kinds: Vec<&str> = player.asked().iter().map(|d| d.context.kind()).collect();
    assert_eq!(kinds, vec!["choose targets", "choose modes", "may"]);

    let end = outcome.state();
    assert_eq!(end.cards_in(p0, ZoneType::Battlefield), vec![ours]);
    assert!(end.cards_in(p1, ZoneType::Battlefield).is_empty());
    assert_eq!(end.cards_in(p1, ZoneType::Exile).len(), 1);
    assert_eq!(end.life(p0), 20);
}

/// An answer naming something not offered is re-asked; the next valid
/// answer goes through.
#[test]
fn test_invalid_then_valid() {
    let (mut state, mut engine, p0, _) = setup();
    let a = state.create_card(p0, Characteristics::new("A"), ZoneType::Hand);
    let b = state.create_card(p0, Characteristics::new("B"), ZoneType::Hand);

    let discard = EffectNode::leaf(LeafEffect::Discard {
        player: PlayerRef::Controller,
        count: 1,
    });
    let mut player = ScriptedPlayer::new([
        DecisionChoice::Entities(vec![EntityId(9_999)]),
        DecisionChoice::Entities(vec![a, b]),
        DecisionChoice::Entities(vec![b]),
    ]);
    let outcome =
        run_to_completion(&mut engine, &state, &discard, ExecutionContext::new(p0), &mut player, 3).unwrap();

    assert_eq!(player.asked().len(), 3);
    assert_eq!(outcome.state().cards_in(p0, ZoneType::Hand), vec![a]);
}

/// A scripted player that runs dry is a driver error, not a game result.
#[test]
fn test_script_runs_dry() {
    let (state, mut engine, p0, _) = setup();
    let tree = EffectNode::sequence([EffectNode::may(gain(1)), EffectNode::may(gain(1))]);
    let mut player = ScriptedPlayer::new([DecisionChoice::YesNo(true)]);

    let err = run_to_completion(&mut engine, &state, &tree, ExecutionContext::new(p0), &mut player, 1).unwrap_err();
    assert!(matches!(err, DriveError::PlayerFailure { .. }));
}

// =============================================================================
// Fallback answers
// =============================================================================

fn library_of(state: &mut GameState, player: PlayerId) {
    for name in ["Wolf", "Bear", "Elk"] {
        state.create_card(player, Characteristics::creature(name, 2, 2), ZoneType::Library);
    }
    state.create_card(player, Characteristics::new("Forest"), ZoneType::Library);
}

fn tutor(max: usize) -> EffectNode {
    EffectNode::leaf(LeafEffect::SearchLibrary {
        player: PlayerRef::Controller,
        filter: EntityFilter::Creatures,
        max,
        destination: ZoneType::Hand,
        store_as: None,
    })
}

/// Declining takes as few cards as the search allows: none.
#[test]
fn test_fallback_decline_takes_nothing() {
    let (mut state, mut engine, p0, _) = setup();
    library_of(&mut state, p0);
    let mut player = FallbackPlayer::new(FallbackStrategy::Decline);

    let outcome = run_to_completion(&mut engine, &state, &tutor(2), ExecutionContext::new(p0), &mut player, 1).unwrap();

    assert!(outcome.state().cards_in(p0, ZoneType::Hand).is_empty());
    assert_eq!(outcome.state().cards_in(p0, ZoneType::Library).len(), 4);
}

/// Accepting takes as many matching cards as allowed, and only matching ones.
#[test]
fn test_fallback_accept_takes_max() {
    let (mut state, mut engine, p0, _) = setup();
    library_of(&mut state, p0);
    let mut player = FallbackPlayer::new(FallbackStrategy::Accept);

    let outcome = run_to_completion(&mut engine, &state, &tutor(2), ExecutionContext::new(p0), &mut player, 1).unwrap();

    let end = outcome.state();
    let hand = end.cards_in(p0, ZoneType::Hand);
    assert_eq!(hand.len(), 2);
    assert!(hand.iter().all(|&id| end.entities().base(id).is_some_and(|c| c.is_creature())));
    assert_eq!(end.cards_in(p0, ZoneType::Library).len(), 2);
}

/// "First option" answers each player in a loop with the first choice.
#[test]
fn test_fallback_first_option_per_player() {
    let (state, mut engine, p0, p1) = setup();
    let tree = EffectNode::for_each_player(
        PlayerScope::All,
        EffectNode::choose_one([
            Mode::new(
                "gain 2",
                EffectNode::leaf(LeafEffect::GainLife {
                    player: PlayerRef::CurrentPlayer,
                    amount: Amount::Fixed(2),
                }),
            ),
            Mode::new(
                "lose 2",
                EffectNode::leaf(LeafEffect::LoseLife {
                    player: PlayerRef::CurrentPlayer,
                    amount: Amount::Fixed(2),
                }),
            ),
        ]),
    );
    let mut player = FallbackPlayer::new(FallbackStrategy::FirstOption);

    let outcome = run_to_completion(&mut engine, &state, &tree, ExecutionContext::new(p0), &mut player, 1).unwrap();

    assert_eq!(outcome.state().life(p0), 22);
    assert_eq!(outcome.state().life(p1), 22);
}

// =============================================================================
// Endings
// =============================================================================

/// Conceding leaves the state paused at the question that was refused.
#[test]
fn test_concede_keeps_paused_state() {
    let (state, mut engine, p0, _) = setup();
    let tree = EffectNode::sequence([gain(3), EffectNode::may(gain(1))]);

    let outcome = run_to_completion(&mut engine, &state, &tree, ExecutionContext::new(p0), &mut Quitter, 1).unwrap();

    let DriveOutcome::Conceded { state: end, player, .. } = outcome else {
        panic!("expected a concession");
    };
    assert_eq!(player, p0);
    assert_eq!(end.life(p0), 23);
    assert!(matches!(
        end.pending_decision().map(|d| &d.context),
        Some(DecisionContext::MayChoice)
    ));
}

/// A rules failure surfaces as `Failed` with the events from before it.
#[test]
fn test_failure_is_an_outcome() {
    let (state, mut engine, p0, _) = setup();
    let tree = EffectNode::sequence([
        gain(2),
        EffectNode::leaf(LeafEffect::Tap {
            what: EntityRef::Stored("missing".into()),
        }),
    ]);
    let mut player = FallbackPlayer::default();

    let outcome = run_to_completion(&mut engine, &state, &tree, ExecutionContext::new(p0), &mut player, 1).unwrap();

    let DriveOutcome::Failed { state: end, error, .. } = outcome else {
        panic!("expected a failure");
    };
    assert!(matches!(error, ExecutionError::MissingBinding(_)));
    assert_eq!(end.life(p0), 22);
    assert!(end.continuations().is_empty());
}
