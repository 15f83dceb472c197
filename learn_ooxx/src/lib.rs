use crate::board::{judge, GameState, IsGameOver, Outcome};
use crate::config::TrainingConfig;
use crate::error::LearnError;
use crate::players::{HumanPlayer, Marks, Player, TdPlayer};
use crate::rates::RateCurves;
use crate::value_table::ValueTable;
use itertools::Itertools;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::{BufRead, Write};

pub mod board;
pub mod config;
pub mod error;
pub mod players;
pub mod rates;
pub mod value_table;

/// Terminal override for the winner's final configuration.
pub const WIN_VALUE: f64 = 1.0;
/// Terminal override for the loser's last configuration.
pub const LOSS_VALUE: f64 = -1.0;

/// Two agents learning from the same stream of games. Agent A always moves first.
pub struct SelfPlay<R = StdRng> {
    pub agent_a: TdPlayer<R>,
    pub agent_b: TdPlayer<R>,
    config: TrainingConfig,
    record: Vec<Outcome>,
    episode: usize,
}

impl<R: Rng> SelfPlay<R> {
    pub fn new(agent_a: TdPlayer<R>, agent_b: TdPlayer<R>, config: TrainingConfig) -> Self {
        assert_ne!(agent_a.mark, agent_b.mark, "agents must play different marks");
        SelfPlay {
            agent_a,
            agent_b,
            record: Vec::with_capacity(config.num_games),
            config,
            episode: 0,
        }
    }

    pub fn record(&self) -> &[Outcome] {
        &self.record
    }

    pub fn episode(&self) -> usize {
        self.episode
    }

    /// Plays one game to the end and appends its outcome to the record.
    ///
    /// A win pins the winner's final configuration to [`WIN_VALUE`] and the
    /// loser's last configuration to [`LOSS_VALUE`]. A draw is not rewarded.
    pub fn learn_episode(&mut self) -> Outcome {
        self.agent_a.reset();
        self.agent_b.reset();
        let mut state = GameState::new();
        let outcome = loop {
            let outcome_a = self.agent_a.make_move(&state);
            match judge(&outcome_a, self.agent_a.mark) {
                IsGameOver::Win => {
                    self.agent_a.set_terminal_value(&outcome_a, WIN_VALUE);
                    self.agent_b.set_terminal_value(&state, LOSS_VALUE);
                    break Outcome::AgentAWin;
                }
                IsGameOver::Drawn => break Outcome::Draw,
                IsGameOver::InPlay => {}
            }
            state = self.agent_b.make_move(&outcome_a);
            match judge(&state, self.agent_b.mark) {
                IsGameOver::Win => {
                    self.agent_b.set_terminal_value(&state, WIN_VALUE);
                    self.agent_a.set_terminal_value(&outcome_a, LOSS_VALUE);
                    break Outcome::AgentBWin;
                }
                IsGameOver::Drawn => break Outcome::Draw,
                IsGameOver::InPlay => {}
            }
        };
        log::debug!("game {} ended {:?}", self.episode, outcome);
        self.record.push(outcome);
        self.episode += 1;
        outcome
    }

    /// Plays games until the configured count is reached.
    pub fn learn_value_tables(&mut self) -> &[Outcome] {
        log::info!("beginning self-play ({} games)", self.config.num_games);
        while self.episode < self.config.num_games {
            let annealed = matches!(self.config.anneal_at, Some(at) if self.episode >= at);
            if annealed && (self.agent_a.epsilon() > 0.0 || self.agent_b.epsilon() > 0.0) {
                self.agent_a.set_epsilon(0.0);
                self.agent_b.set_epsilon(0.0);
                log::info!("exploration disabled after game {}", self.episode);
            }
            self.learn_episode();
            if self.config.log_interval > 0 && self.episode % self.config.log_interval == 0 {
                self.log_progress();
            }
        }
        &self.record
    }

    fn log_progress(&self) {
        let start = self.episode.saturating_sub(self.config.log_interval);
        let counts = self.record[start..].iter().copied().counts();
        let count = |outcome: Outcome| counts.get(&outcome).copied().unwrap_or(0);
        log::info!(
            "game {:>7}/{} | eps {:.3}/{:.3} | A {:>5} | B {:>5} | draw {:>5}",
            self.episode,
            self.config.num_games,
            self.agent_a.epsilon(),
            self.agent_b.epsilon(),
            count(Outcome::AgentAWin),
            count(Outcome::AgentBWin),
            count(Outcome::Draw),
        );
    }

    pub fn into_run(self) -> TrainingRun {
        TrainingRun {
            agent_a: self.agent_a.into_value(),
            agent_b: self.agent_b.into_value(),
            record: self.record,
            config: self.config,
        }
    }
}

/// The learned tables and the per-game record of a finished run.
#[derive(Clone, Debug)]
pub struct TrainingRun {
    pub agent_a: ValueTable,
    pub agent_b: ValueTable,
    pub record: Vec<Outcome>,
    pub config: TrainingConfig,
}

impl TrainingRun {
    /// Rate curves with the run's configured window.
    pub fn rates(&self) -> Result<RateCurves, LearnError> {
        rates::win_rates(&self.record, self.config.step, self.config.duration)
    }
}

fn rng_for(seed: Option<u64>, offset: u64) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(offset)),
        None => StdRng::from_entropy(),
    }
}

pub fn train_td_agents(config: &TrainingConfig) -> Result<TrainingRun, LearnError> {
    config.validate()?;
    let agent_a = TdPlayer::with_rng(
        "agent-a",
        Marks::CROSS,
        config.epsilon_a,
        config.alpha_a,
        rng_for(config.seed, 0),
    );
    let agent_b = TdPlayer::with_rng(
        "agent-b",
        Marks::NOUGHT,
        config.epsilon_b,
        config.alpha_b,
        rng_for(config.seed, 1),
    );
    let mut game = SelfPlay::new(agent_a, agent_b, config.clone());
    game.learn_value_tables();
    Ok(game.into_run())
}

/// Plays one game without terminal overrides; `first` moves first.
pub fn play_game(
    first: &mut dyn Player,
    second: &mut dyn Player,
) -> Result<Outcome, anyhow::Error> {
    first.reset();
    second.reset();
    let mut state = GameState::new();
    loop {
        state = first.play_turn(&state)?;
        match judge(&state, *first.get_mark()) {
            IsGameOver::Win => return Ok(Outcome::AgentAWin),
            IsGameOver::Drawn => return Ok(Outcome::Draw),
            IsGameOver::InPlay => {}
        }
        state = second.play_turn(&state)?;
        match judge(&state, *second.get_mark()) {
            IsGameOver::Win => return Ok(Outcome::AgentBWin),
            IsGameOver::Drawn => return Ok(Outcome::Draw),
            IsGameOver::InPlay => {}
        }
    }
}

/// A human against a greedy player using `table`; the computer moves first when it plays CROSS.
pub fn play_game_human_computer_player<I: BufRead, O: Write>(
    table: ValueTable,
    computer_mark: Marks,
    input: I,
    mut output: O,
) -> Result<Outcome, anyhow::Error> {
    let mut computer = TdPlayer::with_table(
        "computer",
        computer_mark,
        0.0,
        config::LEARNING_RATE,
        table,
        StdRng::from_entropy(),
    );
    let outcome = {
        let mut human = HumanPlayer::new("human", computer_mark.other(), input, &mut output);
        if computer_mark == Marks::CROSS {
            play_game(&mut computer, &mut human)?
        } else {
            play_game(&mut human, &mut computer)?
        }
    };
    let computer_won = match outcome {
        Outcome::Draw => None,
        Outcome::AgentAWin => Some(computer_mark == Marks::CROSS),
        Outcome::AgentBWin => Some(computer_mark == Marks::NOUGHT),
    };
    match computer_won {
        None => writeln!(output, "The game ended in a draw.")?,
        Some(true) => writeln!(output, "Really sorry, you have lost.")?,
        Some(false) => writeln!(output, "Congratulations! You have won!")?,
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn greedy_pair() -> SelfPlay {
        let config = TrainingConfig {
            num_games: 100,
            epsilon_a: 0.0,
            epsilon_b: 0.0,
            anneal_at: None,
            ..TrainingConfig::default()
        };
        let agent_a = TdPlayer::with_rng("a", Marks::CROSS, 0.0, 0.1, StdRng::seed_from_u64(1));
        let agent_b = TdPlayer::with_rng("b", Marks::NOUGHT, 0.0, 0.1, StdRng::seed_from_u64(2));
        SelfPlay::new(agent_a, agent_b, config)
    }

    #[test]
    fn first_greedy_game_is_fixed() {
        let mut game = greedy_pair();
        assert_eq!(game.learn_episode(), Outcome::AgentAWin);
        let final_board = GameState::from([1, 2, 1, 2, 1, 2, 1, 0, 0]);
        let before_final = GameState::from([1, 2, 1, 2, 1, 2, 0, 0, 0]);
        assert_eq!(*game.agent_a.stored_outcome(), final_board);
        assert_eq!(*game.agent_b.stored_outcome(), before_final);
        assert_eq!(game.agent_a.value().get(&final_board), WIN_VALUE);
        assert_eq!(game.agent_b.value().get(&before_final), LOSS_VALUE);
        assert_eq!(game.record(), &[Outcome::AgentAWin]);
    }

    #[test]
    fn agent_b_win_penalises_agent_a() {
        let mut game = greedy_pair();
        // Steer A into cells 0, 1, 3 and B into 4, 5 -> B completes (2, 4, 6).
        let empty = GameState::new();
        game.agent_a.set_terminal_value(&empty.with_move(0, Marks::CROSS), 0.5);
        let s1 = GameState::from([1, 0, 0, 0, 0, 0, 0, 0, 0]);
        game.agent_b.set_terminal_value(&s1.with_move(4, Marks::NOUGHT), 0.5);
        let s2 = GameState::from([1, 0, 0, 0, 2, 0, 0, 0, 0]);
        game.agent_a.set_terminal_value(&s2.with_move(1, Marks::CROSS), 0.5);
        let s3 = GameState::from([1, 1, 0, 0, 2, 0, 0, 0, 0]);
        game.agent_b.set_terminal_value(&s3.with_move(2, Marks::NOUGHT), 0.5);
        let s4 = GameState::from([1, 1, 2, 0, 2, 0, 0, 0, 0]);
        game.agent_a.set_terminal_value(&s4.with_move(3, Marks::CROSS), 0.5);
        let s5 = GameState::from([1, 1, 2, 1, 2, 0, 0, 0, 0]);
        let winning = s5.with_move(6, Marks::NOUGHT);
        game.agent_b.set_terminal_value(&winning, 0.5);

        assert_eq!(game.learn_episode(), Outcome::AgentBWin);
        assert_eq!(game.agent_b.value().get(&winning), WIN_VALUE);
        assert_eq!(game.agent_a.value().get(&s5), LOSS_VALUE);
    }

    #[test]
    fn draw_gets_no_override() {
        let mut game = greedy_pair();
        // A: 0, 2, 5, 7, 6  B: 1, 4, 3, 8 -> full board with no line.
        let plan = [
            (0, Marks::CROSS),
            (1, Marks::NOUGHT),
            (2, Marks::CROSS),
            (4, Marks::NOUGHT),
            (7, Marks::CROSS),
            (3, Marks::NOUGHT),
            (5, Marks::CROSS),
            (8, Marks::NOUGHT),
            (6, Marks::CROSS),
        ];
        let mut state = GameState::new();
        for (cell, mark) in plan {
            let next = state.with_move(cell, mark);
            let agent = if mark == Marks::CROSS {
                &mut game.agent_a
            } else {
                &mut game.agent_b
            };
            agent.set_terminal_value(&next, 0.5);
            state = next;
        }
        assert_eq!(game.learn_episode(), Outcome::Draw);
        assert!(state.is_full());
        assert_eq!(*game.agent_a.stored_outcome(), state);
        assert_eq!(game.agent_a.value().get(&state), 0.5);
    }

    #[test]
    fn anneal_switches_off_exploration() {
        let config = TrainingConfig {
            num_games: 30,
            anneal_at: Some(10),
            seed: Some(5),
            ..TrainingConfig::default()
        };
        let agent_a = TdPlayer::with_rng("a", Marks::CROSS, 0.3, 0.1, StdRng::seed_from_u64(5));
        let agent_b = TdPlayer::with_rng("b", Marks::NOUGHT, 0.3, 0.1, StdRng::seed_from_u64(6));
        let mut game = SelfPlay::new(agent_a, agent_b, config);
        for _ in 0..10 {
            game.learn_episode();
        }
        assert_eq!(game.agent_a.epsilon(), 0.3);
        assert_eq!(game.learn_value_tables().len(), 30);
        assert_eq!(game.agent_a.epsilon(), 0.0);
        assert_eq!(game.agent_b.epsilon(), 0.0);
    }

    #[test]
    fn anneal_applies_when_games_were_played_past_it() {
        let config = TrainingConfig {
            num_games: 30,
            anneal_at: Some(10),
            ..TrainingConfig::default()
        };
        let agent_a = TdPlayer::with_rng("a", Marks::CROSS, 0.3, 0.1, StdRng::seed_from_u64(5));
        let agent_b = TdPlayer::with_rng("b", Marks::NOUGHT, 0.3, 0.1, StdRng::seed_from_u64(6));
        let mut game = SelfPlay::new(agent_a, agent_b, config);
        for _ in 0..15 {
            game.learn_episode();
        }
        assert_eq!(game.agent_a.epsilon(), 0.3);
        assert_eq!(game.learn_value_tables().len(), 30);
        assert_eq!(game.agent_a.epsilon(), 0.0);
        assert_eq!(game.agent_b.epsilon(), 0.0);
    }

    #[test]
    #[should_panic(expected = "different marks")]
    fn agents_need_distinct_marks() {
        let a = TdPlayer::new("a", Marks::CROSS, 0.1, 0.1);
        let b = TdPlayer::new("b", Marks::CROSS, 0.1, 0.1);
        SelfPlay::new(a, b, TrainingConfig::default());
    }
}
