use crate::players::Marks;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    ops::{Deref, DerefMut},
};

pub const EMPTY: u8 = 0;
pub const NUM_CELLS: usize = 9;
/// 3^9, one entry per possible configuration.
pub const NUM_STATES: usize = 19_683;

pub const WINNING_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IsGameOver {
    InPlay,
    Drawn,
    Win,
}

/// Result of a finished self-play game, coded 1 / 2 / 3.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    AgentAWin = 1,
    AgentBWin = 2,
    Draw = 3,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GameState {
    pub cells: [u8; NUM_CELLS],
}

impl Deref for GameState {
    type Target = [u8; NUM_CELLS];
    fn deref(&self) -> &Self::Target {
        &self.cells
    }
}

impl DerefMut for GameState {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.cells
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let key: String = self.iter().map(|&cell| cell_char(cell)).collect();
        write!(f, "{}", key)
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl From<[u8; NUM_CELLS]> for GameState {
    fn from(cells: [u8; NUM_CELLS]) -> Self {
        GameState { cells }
    }
}

fn cell_char(cell: u8) -> char {
    match cell {
        1 => Marks::CROSS.as_char(),
        2 => Marks::NOUGHT.as_char(),
        _ => '-',
    }
}

fn assert_valid_cells(state: &GameState) {
    assert!(
        state.iter().all(|&cell| cell <= 2),
        "cell value outside {{0, 1, 2}} in configuration {:?}",
        state.cells
    );
}

impl GameState {
    pub fn new() -> Self {
        GameState {
            cells: [EMPTY; NUM_CELLS],
        }
    }

    /// Base-3 encoding `sum(cell[i] * 3^i)`, the value table key.
    pub fn index(&self) -> usize {
        assert_valid_cells(self);
        self.iter()
            .rev()
            .fold(0_usize, |acc, &cell| acc * 3 + cell as usize)
    }

    /// Three rows of three cells for printing.
    pub fn grid(&self) -> String {
        self.to_string()
            .chars()
            .tuples::<(_, _, _)>()
            .map(|a| format!("{} {} {}", a.0, a.1, a.2))
            .join("\n")
    }

    pub fn available_moves(&self) -> Vec<usize> {
        self.iter()
            .enumerate()
            .filter(|(_index, &value)| value == EMPTY)
            .map(|(index, _)| index)
            .collect()
    }

    pub fn is_full(&self) -> bool {
        !self.contains(&EMPTY)
    }

    /// Copy of this configuration with `mark` placed at `index`.
    pub fn with_move(&self, index: usize, mark: Marks) -> Self {
        let mut next = *self;
        next[index] = mark.as_cell();
        next
    }
}

impl PartialEq<Marks> for GameState {
    fn eq(&self, other: &Marks) -> bool {
        let cell = other.as_cell();
        WINNING_LINES
            .iter()
            .any(|line| line.iter().all(|&i| self[i] == cell))
    }
}

/// Classifies `state` from the point of view of `mark`.
///
/// A full board is `Drawn` unless it also completes a line for `mark`, in which
/// case the win takes precedence.
pub fn judge(state: &GameState, mark: Marks) -> IsGameOver {
    assert_valid_cells(state);
    let mut verdict = IsGameOver::InPlay;
    if state.is_full() {
        verdict = IsGameOver::Drawn;
    }
    if *state == mark {
        verdict = IsGameOver::Win;
    }
    verdict
}

impl IsGameOver {
    /// Integer form: 0 in play, the mark on a win, 3 on a draw.
    pub fn code(self, mark: Marks) -> u8 {
        match self {
            IsGameOver::InPlay => 0,
            IsGameOver::Win => mark.as_cell(),
            IsGameOver::Drawn => 3,
        }
    }
}

impl Outcome {
    pub fn code(self) -> u8 {
        self as u8
    }
}
