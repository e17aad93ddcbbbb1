//! Board engine for Noughts.
//!
//! Pure value types with no shared state: a [`Board`] is `Copy`, every
//! move produces a new board, and [`evaluate`] is a stateless predicate.
//!
//! # Key types
//!
//! - [`Board`]: nine cells, each empty or holding a [`Mark`]
//! - [`Position`]: a validated cell index in `0..9`
//! - [`Outcome`]: none, a win for either mark, or a draw

mod board;
mod error;
mod rules;

pub use board::{Board, Cell, Mark, Position, BOARD_CELLS, BOARD_SIDE};
pub use error::BoardError;
pub use rules::{evaluate, winning_line, Outcome, LINES};
