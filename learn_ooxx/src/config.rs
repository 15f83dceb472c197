use crate::error::LearnError;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const NUM_GAMES: usize = 30_000;
pub const EXPLORATION_RATE: f64 = 0.1;
pub const LEARNING_RATE: f64 = 0.1;
/// Game index from which both agents play greedily.
pub const ANNEAL_AT: usize = 20_000;
pub const RATE_STEP: usize = 250;
pub const RATE_DURATION: usize = 500;
pub const LOG_INTERVAL: usize = 1_000;

/// Parameters of one self-play training run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub num_games: usize,
    pub epsilon_a: f64,
    pub epsilon_b: f64,
    pub alpha_a: f64,
    pub alpha_b: f64,
    pub anneal_at: Option<usize>,
    pub step: usize,
    pub duration: usize,
    pub log_interval: usize,
    /// Seeds both agents' random sources when set.
    pub seed: Option<u64>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            num_games: NUM_GAMES,
            epsilon_a: EXPLORATION_RATE,
            epsilon_b: EXPLORATION_RATE,
            alpha_a: LEARNING_RATE,
            alpha_b: LEARNING_RATE,
            anneal_at: Some(ANNEAL_AT),
            step: RATE_STEP,
            duration: RATE_DURATION,
            log_interval: LOG_INTERVAL,
            seed: None,
        }
    }
}

impl TrainingConfig {
    pub fn load(path: &Path) -> Result<Self, LearnError> {
        let content = std::fs::read_to_string(path)?;
        let config: TrainingConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), LearnError> {
        let invalid =
            |msg: String| -> Result<(), LearnError> { Err(LearnError::InvalidConfig(msg)) };
        for (name, epsilon) in [("epsilon_a", self.epsilon_a), ("epsilon_b", self.epsilon_b)] {
            if !(0.0..=1.0).contains(&epsilon) {
                return invalid(format!("{} must be in [0, 1], got {}", name, epsilon));
            }
        }
        for (name, alpha) in [("alpha_a", self.alpha_a), ("alpha_b", self.alpha_b)] {
            if !(alpha > 0.0 && alpha <= 1.0) {
                return invalid(format!("{} must be in (0, 1], got {}", name, alpha));
            }
        }
        if self.num_games == 0 {
            return invalid("num_games must be > 0".to_string());
        }
        if self.step == 0 {
            return invalid("step must be > 0".to_string());
        }
        if self.duration == 0 {
            return invalid("duration must be > 0".to_string());
        }
        Ok(())
    }
}
