//! Game configuration.
//!
//! Callers configure the rules core at startup with a `GameConfig`. It
//! seeds the initial `GameState` and supplies the knobs the engine, the
//! projection cache, and the decision driver read:
//!
//! - player count and starting life
//! - maximum hand size for cleanup discards
//! - RNG seed
//! - projection cache capacity
//! - repeat-loop safety cap
//! - how many invalid responses the driver tolerates before giving up

use serde::{Deserialize, Serialize};

/// Default starting life total.
pub const DEFAULT_STARTING_LIFE: i64 = 20;

/// Default maximum hand size checked during cleanup.
pub const DEFAULT_MAX_HAND_SIZE: usize = 7;

/// Default cap on repeat-while iterations.
pub const DEFAULT_MAX_LOOP_ITERATIONS: u32 = 64;

/// Complete game configuration.
///
/// ```
/// use rules_core::core::GameConfig;
///
/// let config = GameConfig::new(2)
///     .with_starting_life(30)
///     .with_seed(7)
///     .with_cache_capacity(128);
///
/// assert_eq!(config.starting_life, 30);
/// assert_eq!(config.projection_cache_capacity, Some(128));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Number of players (1-255).
    pub player_count: usize,

    /// Life total each player starts with.
    pub starting_life: i64,

    /// Hand size above which cleanup forces a discard.
    pub max_hand_size: usize,

    /// Seed for the in-state RNG.
    pub seed: u64,

    /// Bound on cached projections per cache handle. `None` is unbounded.
    pub projection_cache_capacity: Option<usize>,

    /// Safety cap for repeat-while loops.
    pub max_loop_iterations: u32,

    /// Invalid responses tolerated per decision before the driver fails.
    pub max_response_attempts: u32,
}

impl GameConfig {
    /// Create a configuration with default values for `player_count` players.
    pub fn new(player_count: usize) -> Self {
        assert!(player_count > 0, "Must have at least 1 player");
        assert!(player_count <= 255, "At most 255 players supported");

        Self {
            player_count,
            starting_life: DEFAULT_STARTING_LIFE,
            max_hand_size: DEFAULT_MAX_HAND_SIZE,
            seed: 0,
            projection_cache_capacity: None,
            max_loop_iterations: DEFAULT_MAX_LOOP_ITERATIONS,
            max_response_attempts: 3,
        }
    }

    /// Set the starting life total.
    #[must_use]
    pub fn with_starting_life(mut self, life: i64) -> Self {
        self.starting_life = life;
        self
    }

    /// Set the maximum hand size.
    #[must_use]
    pub fn with_max_hand_size(mut self, size: usize) -> Self {
        self.max_hand_size = size;
        self
    }

    /// Set the RNG seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Bound the projection cache.
    #[must_use]
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.projection_cache_capacity = Some(capacity);
        self
    }

    /// Set the repeat-while safety cap.
    #[must_use]
    pub fn with_max_loop_iterations(mut self, max: u32) -> Self {
        self.max_loop_iterations = max;
        self
    }

    /// Set how many invalid responses the driver tolerates.
    #[must_use]
    pub fn with_max_response_attempts(mut self, attempts: u32) -> Self {
        self.max_response_attempts = attempts;
        self
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GameConfig::default();

        assert_eq!(config.player_count, 2);
        assert_eq!(config.starting_life, 20);
        assert_eq!(config.max_hand_size, 7);
        assert_eq!(config.projection_cache_capacity, None);
        assert_eq!(config.max_loop_iterations, DEFAULT_MAX_LOOP_ITERATIONS);
    }

    #[test]
    fn test_builder() {
        let config = GameConfig::new(4)
            .with_max_hand_size(5)
            .with_max_loop_iterations(3)
            .with_max_response_attempts(1);

        assert_eq!(config.player_count, 4);
        assert_eq!(config.max_hand_size, 5);
        assert_eq!(config.max_loop_iterations, 3);
        assert_eq!(config.max_response_attempts, 1);
    }

    #[test]
    fn test_serialization() {
        let config = GameConfig::new(3).with_seed(99);
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: GameConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    #[should_panic(expected = "Must have at least 1 player")]
    fn test_zero_players() {
        GameConfig::new(0);
    }
}
