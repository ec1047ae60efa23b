use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Player {
  Black,
  White,
}

impl Player {
  pub fn other(self) -> Self {
    match self {
      Player::Black => Player::White,
      Player::White => Player::Black,
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameResult {
  BlackWin,
  WhiteWin,
  Draw,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coord {
  pub x: usize,
  pub y: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Move {
  pub x: usize,
  pub y: usize,
  pub player: Player,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiConfig {
  pub depth: u8,
  pub max_candidates: usize,
}

impl Default for AiConfig {
  fn default() -> Self {
    Self {
      depth: 5,
      max_candidates: 10,
    }
  }
}

// Board view handed to a front end; the engine never reads this back.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
  pub board_size: usize,
  pub board: Vec<Option<Player>>,
  pub to_move: Player,
  pub moves: Vec<Move>,
  pub result: Option<GameResult>,
}
