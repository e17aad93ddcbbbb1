//! Error types for the board engine.

/// Errors returned when a move cannot be applied to a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    /// The position (or row/column) lies outside the 3x3 grid.
    #[error("position {0} is outside the board")]
    OutOfRange(usize),

    /// The target cell already holds a mark.
    #[error("cell {0} is already occupied")]
    Occupied(usize),
}
