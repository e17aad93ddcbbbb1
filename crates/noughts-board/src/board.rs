//! Board, mark and position types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::BoardError;

/// Number of cells along one side of the board.
pub const BOARD_SIDE: usize = 3;

/// Total number of cells on the board.
pub const BOARD_CELLS: usize = BOARD_SIDE * BOARD_SIDE;

// ---------------------------------------------------------------------------
// Mark
// ---------------------------------------------------------------------------

/// A player's symbol.
///
/// Marks are assigned by seat: the first player in a session is always
/// [`Mark::X`] and moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    /// The mark that moves first.
    pub const FIRST: Self = Self::X;

    /// Returns the other mark.
    pub fn opponent(self) -> Self {
        match self {
            Self::X => Self::O,
            Self::O => Self::X,
        }
    }

    /// Returns the mark for a seat index (0 = X, 1 = O).
    pub fn for_seat(seat: usize) -> Option<Self> {
        match seat {
            0 => Some(Self::X),
            1 => Some(Self::O),
            _ => None,
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X => write!(f, "X"),
            Self::O => write!(f, "O"),
        }
    }
}

/// A single cell: `None` when empty. Serializes as `null`, `"X"` or `"O"`.
pub type Cell = Option<Mark>;

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A cell index that is known to be on the board.
///
/// Cells are numbered row-major:
///
/// ```text
///  0 | 1 | 2
/// ---+---+---
///  3 | 4 | 5
/// ---+---+---
///  6 | 7 | 8
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position(usize);

impl Position {
    /// Validates a flat cell index.
    pub fn new(index: usize) -> Result<Self, BoardError> {
        if index < BOARD_CELLS {
            Ok(Self(index))
        } else {
            Err(BoardError::OutOfRange(index))
        }
    }

    /// Validates a row/column pair. Both must be in `0..3`.
    pub fn from_row_col(row: usize, col: usize) -> Result<Self, BoardError> {
        if row >= BOARD_SIDE || col >= BOARD_SIDE {
            // Report the flat index the caller was aiming for so the
            // message stays meaningful for either addressing style.
            return Err(BoardError::OutOfRange(
                row.saturating_mul(BOARD_SIDE).saturating_add(col),
            ));
        }
        Ok(Self(row * BOARD_SIDE + col))
    }

    /// The flat index in `0..9`.
    pub fn index(self) -> usize {
        self.0
    }

    pub fn row(self) -> usize {
        self.0 / BOARD_SIDE
    }

    pub fn col(self) -> usize {
        self.0 % BOARD_SIDE
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// The nine cells of a game.
///
/// Serializes as a flat array of nine cells, which is exactly the `board`
/// field of a session snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    cells: [Cell; BOARD_CELLS],
}

impl Board {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cell at a position.
    pub fn get(&self, position: Position) -> Cell {
        self.cells[position.index()]
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> &[Cell; BOARD_CELLS] {
        &self.cells
    }

    /// Places `mark` at a flat index and returns the resulting board.
    ///
    /// `self` is left untouched, so a rejected move can never leave a
    /// half-applied board behind.
    ///
    /// # Errors
    /// - [`BoardError::OutOfRange`] if `index` is not in `0..9`
    /// - [`BoardError::Occupied`] if the cell already holds a mark
    pub fn apply_move(&self, index: usize, mark: Mark) -> Result<Self, BoardError> {
        let position = Position::new(index)?;
        self.place(position, mark)
    }

    /// Row/column variant of [`apply_move`](Self::apply_move).
    pub fn apply_move_at(
        &self,
        row: usize,
        col: usize,
        mark: Mark,
    ) -> Result<Self, BoardError> {
        let position = Position::from_row_col(row, col)?;
        self.place(position, mark)
    }

    fn place(&self, position: Position, mark: Mark) -> Result<Self, BoardError> {
        if self.get(position).is_some() {
            return Err(BoardError::Occupied(position.index()));
        }
        let mut next = *self;
        next.cells[position.index()] = Some(mark);
        Ok(next)
    }

    /// Returns `true` when every cell holds a mark.
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// Returns `true` when no cell holds a mark.
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }

    /// Number of marks placed so far.
    pub fn filled(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row, chunk) in self.cells.chunks(BOARD_SIDE).enumerate() {
            if row > 0 {
                writeln!(f)?;
            }
            for cell in chunk {
                match cell {
                    Some(mark) => write!(f, "{mark}")?,
                    None => write!(f, ".")?,
                }
            }
        }
        Ok(())
    }
}
