//! Win and draw detection.

use serde::{Deserialize, Serialize};

use crate::{Board, Mark};

/// The eight winning triples, in the order they are checked:
/// rows top to bottom, columns left to right, then the two diagonals.
pub const LINES: [[usize; 3]; 8] = [
    // Rows
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    // Columns
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    // Diagonals
    [0, 4, 8],
    [2, 4, 6],
];

/// The result of evaluating a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Outcome {
    /// The game is still open.
    #[default]
    None,
    XWins,
    OWins,
    /// Every cell is filled and no triple matched.
    Draw,
}

impl Outcome {
    /// The winning outcome for `mark`.
    pub fn win_for(mark: Mark) -> Self {
        match mark {
            Mark::X => Self::XWins,
            Mark::O => Self::OWins,
        }
    }

    /// Returns the winning mark, if any.
    pub fn winner(self) -> Option<Mark> {
        match self {
            Self::XWins => Some(Mark::X),
            Self::OWins => Some(Mark::O),
            Self::None | Self::Draw => None,
        }
    }

    /// Returns `true` for a win or a draw.
    pub fn is_decided(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Returns the first triple holding three equal marks, if any.
pub fn winning_line(board: &Board) -> Option<[usize; 3]> {
    let cells = board.cells();
    LINES.into_iter().find(|&[a, b, c]| {
        cells[a].is_some() && cells[a] == cells[b] && cells[a] == cells[c]
    })
}

/// Evaluates a board.
///
/// A matching triple wins, regardless of whether the board is full.
/// A valid game cannot produce two different winners, so reporting the
/// first match only affects which cells a client highlights.
pub fn evaluate(board: &Board) -> Outcome {
    if let Some([a, _, _]) = winning_line(board) {
        return match board.cells()[a] {
            Some(mark) => Outcome::win_for(mark),
            None => Outcome::None,
        };
    }
    if board.is_full() {
        Outcome::Draw
    } else {
        Outcome::None
    }
}
