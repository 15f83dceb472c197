use crate::board::GameState;
use crate::value_table::ValueTable;
use anyhow::{anyhow, Context};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::{BufRead, Write};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Marks {
    CROSS = 1,
    NOUGHT = 2,
}

pub trait Player {
    fn get_mark(&self) -> &Marks;
    fn get_name(&self) -> &str;
    fn reset(&mut self) {}
    fn play_turn(&mut self, state: &GameState) -> Result<GameState, anyhow::Error>;
}

impl Marks {
    pub fn other(self) -> Self {
        match self {
            Self::CROSS => Marks::NOUGHT,
            Self::NOUGHT => Marks::CROSS,
        }
    }
    pub fn as_cell(self) -> u8 {
        self as u8
    }
    pub fn as_char(self) -> char {
        match self {
            Self::CROSS => 'X',
            Self::NOUGHT => '0',
        }
    }
}

/// Tabular agent: epsilon-greedy over its own value table, TD(0) backup on every move.
#[derive(Debug)]
pub struct TdPlayer<R = StdRng> {
    pub name: String,
    pub mark: Marks,
    epsilon: f64,
    alpha: f64,
    value: ValueTable,
    stored_outcome: GameState,
    rng: R,
}

fn assert_epsilon(epsilon: f64) {
    assert!(
        (0.0..=1.0).contains(&epsilon),
        "epsilon must be in [0, 1], got {}",
        epsilon
    );
}

impl TdPlayer<StdRng> {
    pub fn new(name: impl Into<String>, mark: Marks, epsilon: f64, alpha: f64) -> Self {
        Self::with_rng(name, mark, epsilon, alpha, StdRng::from_entropy())
    }
}

impl<R: Rng> TdPlayer<R> {
    pub fn with_rng(
        name: impl Into<String>,
        mark: Marks,
        epsilon: f64,
        alpha: f64,
        rng: R,
    ) -> Self {
        Self::with_table(name, mark, epsilon, alpha, ValueTable::new(), rng)
    }

    pub fn with_table(
        name: impl Into<String>,
        mark: Marks,
        epsilon: f64,
        alpha: f64,
        value: ValueTable,
        rng: R,
    ) -> Self {
        assert_epsilon(epsilon);
        TdPlayer {
            name: name.into(),
            mark,
            epsilon,
            alpha,
            value,
            stored_outcome: GameState::new(),
            rng,
        }
    }

    pub fn value(&self) -> &ValueTable {
        &self.value
    }
    pub fn into_value(self) -> ValueTable {
        self.value
    }
    pub fn stored_outcome(&self) -> &GameState {
        &self.stored_outcome
    }
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }
    pub fn set_epsilon(&mut self, epsilon: f64) {
        assert_epsilon(epsilon);
        self.epsilon = epsilon;
    }
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn reset(&mut self) {
        self.stored_outcome = GameState::new();
    }

    /// Places this player's mark on a copy of `state` and backs the value of the
    /// previously stored configuration up toward the new one.
    ///
    /// Panics if `state` has no empty cell.
    pub fn make_move(&mut self, state: &GameState) -> GameState {
        let available = state.available_moves();
        assert!(
            !available.is_empty(),
            "{} asked to move on a full board {}",
            self.name,
            state
        );
        let cell = if self.rng.gen_bool(self.epsilon) {
            available[self.rng.gen_range(0..available.len())]
        } else {
            self.greedy_move(state, &available)
        };
        let outcome = state.with_move(cell, self.mark);

        let previous = self.value.get(&self.stored_outcome);
        let error = self.value.get(&outcome) - previous;
        self.value
            .set(&self.stored_outcome, previous + self.alpha * error);
        self.stored_outcome = outcome;
        outcome
    }

    /// Highest valued follow-up; the lowest index wins a tie.
    fn greedy_move(&self, state: &GameState, available: &[usize]) -> usize {
        let mut best = available[0];
        let mut best_value = self.value.get(&state.with_move(best, self.mark));
        for &cell in &available[1..] {
            let value = self.value.get(&state.with_move(cell, self.mark));
            if value > best_value {
                best = cell;
                best_value = value;
            }
        }
        best
    }

    /// Terminal override, bypasses the TD rule.
    pub fn set_terminal_value(&mut self, state: &GameState, value: f64) {
        self.value.set(state, value);
    }
}

impl<R: Rng> Player for TdPlayer<R> {
    fn get_mark(&self) -> &Marks {
        &self.mark
    }
    fn get_name(&self) -> &str {
        &self.name
    }
    fn reset(&mut self) {
        TdPlayer::reset(self);
    }
    fn play_turn(&mut self, state: &GameState) -> Result<GameState, anyhow::Error> {
        Ok(self.make_move(state))
    }
}

/// Reads cell numbers 1-9 from `input`, prompting on `output`.
#[derive(Debug)]
pub struct HumanPlayer<I, O> {
    pub name: String,
    pub mark: Marks,
    input: I,
    output: O,
}

const MAX_ATTEMPTS: usize = 3;

impl<I: BufRead, O: Write> HumanPlayer<I, O> {
    pub fn new(name: impl Into<String>, mark: Marks, input: I, output: O) -> Self {
        HumanPlayer {
            name: name.into(),
            mark,
            input,
            output,
        }
    }

    fn choose_move(&mut self, state: &GameState) -> Result<usize, anyhow::Error> {
        let available = state.available_moves();
        for _ in 0..MAX_ATTEMPTS {
            writeln!(self.output, "{}", state.grid())?;
            writeln!(self.output, "{}, please choose a free cell (1-9):", self.name)?;
            let mut line = String::new();
            let read = self
                .input
                .read_line(&mut line)
                .context("reading move from input")?;
            if read == 0 {
                return Err(anyhow!("input closed before {} chose a move", self.name));
            }
            match line.trim().parse::<usize>() {
                Ok(n) if (1..=9).contains(&n) && available.contains(&(n - 1)) => return Ok(n - 1),
                Ok(n) if (1..=9).contains(&n) => {
                    writeln!(self.output, "The square is taken, please choose another one.")?
                }
                _ => writeln!(self.output, "Unknown symbol, please try again (a number 1 to 9).")?,
            }
        }
        Err(anyhow!("{} entered an invalid move {} times", self.name, MAX_ATTEMPTS))
    }
}

impl<I: BufRead, O: Write> Player for HumanPlayer<I, O> {
    fn get_mark(&self) -> &Marks {
        &self.mark
    }
    fn get_name(&self) -> &str {
        &self.name
    }
    fn play_turn(&mut self, state: &GameState) -> Result<GameState, anyhow::Error> {
        let cell = self.choose_move(state)?;
        Ok(state.with_move(cell, self.mark))
    }
}
