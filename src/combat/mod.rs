//! Combat: declarations, damage assignment and damage steps.
//!
//! Declarations live in `CombatState` inside `GameState`. Damage is worked
//! out per attacker by `calculate_combat_damage` and dealt a step at a time
//! by `resolve_damage_step`.

pub mod damage;
pub mod declare;
pub mod resolver;
pub mod state;

pub use damage::{calculate_combat_damage, CombatDamage, DamageStep};
pub use declare::{
    can_declare_attacker, can_declare_blocker, declare_attacker, declare_blocker, minimum_blockers, order_blockers,
    validate_blocks,
};
pub use resolver::{
    damage_steps, end_combat, plan_damage_step, resolve_combat_damage, resolve_damage_step, DamageAssignment,
    DamageStepOutcome,
};
pub use state::{BlockerOrder, CombatState};
