//! Five-in-a-row (Gomoku) decision engine: line-pattern classification,
//! heuristic evaluation, forcing-move-aware candidate generation and
//! fixed-depth negamax search with alpha-beta pruning. Rendering and input
//! belong to the caller; the engine only ever borrows the board.

pub mod ai;
pub mod engine;
pub mod eval;
pub mod types;

pub use ai::Engine;
pub use engine::{Board, Game, DEFAULT_BOARD_SIZE};
pub use eval::{Evaluator, Pattern, PatternCounts};
pub use types::{AiConfig, Coord, GameResult, GameSnapshot, Move, Player};
