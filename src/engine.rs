use lazy_static::lazy_static;
use rand::Rng;

use crate::ai::Engine;
use crate::types::{Coord, GameResult, GameSnapshot, Move, Player};

pub const DEFAULT_BOARD_SIZE: usize = 15;

const DIRECTIONS: [(i32, i32); 4] = [(1, 0), (0, 1), (1, 1), (1, -1)];

// Zobrist keys for the canonical 15x15 board, two players.
// Boards larger than that skip hashing, same as having no fingerprint.
lazy_static! {
  static ref ZOBRIST: [[u64; 2]; 225] = {
    let mut table = [[0u64; 2]; 225];
    let mut rng = rand::thread_rng();
    for keys in table.iter_mut() {
      keys[0] = rng.gen();
      keys[1] = rng.gen();
    }
    table
  };
}

fn zobrist_key(idx: usize, player: Player) -> u64 {
  if idx >= ZOBRIST.len() {
    return 0;
  }
  let side = match player {
    Player::Black => 0,
    Player::White => 1,
  };
  ZOBRIST[idx][side]
}

/// Cell grid plus an incrementally maintained hash. The hash is a cheap
/// identity fingerprint: a search that places and removes stones in pairs
/// must hand the board back with the same hash it started with.
#[derive(Clone, Debug)]
pub struct Board {
  size: usize,
  cells: Vec<Option<Player>>,
  hash: u64,
}

impl Board {
  pub fn new(size: usize) -> Self {
    Self {
      size,
      cells: vec![None; size * size],
      hash: 0,
    }
  }

  pub fn size(&self) -> usize {
    self.size
  }

  pub fn in_bounds(&self, x: usize, y: usize) -> bool {
    x < self.size && y < self.size
  }

  fn index(&self, x: usize, y: usize) -> usize {
    y * self.size + x
  }

  pub fn get(&self, x: usize, y: usize) -> Option<Player> {
    if !self.in_bounds(x, y) {
      return None;
    }
    self.cells[self.index(x, y)]
  }

  pub fn is_vacant(&self, x: usize, y: usize) -> bool {
    self.in_bounds(x, y) && self.get(x, y).is_none()
  }

  pub fn place(&mut self, x: usize, y: usize, player: Player) {
    let idx = self.index(x, y);
    debug_assert!(self.cells[idx].is_none(), "placing on an occupied cell");
    self.cells[idx] = Some(player);
    self.hash ^= zobrist_key(idx, player);
  }

  pub fn remove(&mut self, x: usize, y: usize) {
    let idx = self.index(x, y);
    if let Some(player) = self.cells[idx] {
      self.hash ^= zobrist_key(idx, player);
    }
    self.cells[idx] = None;
  }

  pub fn is_full(&self) -> bool {
    self.cells.iter().all(|cell| cell.is_some())
  }

  /// Row-major iteration over occupied cells.
  pub fn stones(&self) -> impl Iterator<Item = (usize, usize, Player)> + '_ {
    self.cells.iter().enumerate().filter_map(move |(idx, cell)| {
      cell.map(|player| (idx % self.size, idx / self.size, player))
    })
  }

  pub fn cells(&self) -> Vec<Option<Player>> {
    self.cells.clone()
  }

  pub fn hash(&self) -> u64 {
    self.hash
  }
}

/// True when the run of `mv.player` stones through the placed stone reaches
/// five along some axis.
pub fn winning_line(board: &Board, mv: &Move) -> bool {
  for (dx, dy) in DIRECTIONS {
    let run = 1
      + run_length(board, mv.x, mv.y, dx, dy, mv.player)
      + run_length(board, mv.x, mv.y, -dx, -dy, mv.player);
    if run >= 5 {
      return true;
    }
  }
  false
}

fn run_length(board: &Board, x: usize, y: usize, dx: i32, dy: i32, player: Player) -> usize {
  let mut count = 0;
  let mut cx = x as i32 + dx;
  let mut cy = y as i32 + dy;

  while cx >= 0 && cy >= 0 {
    let ux = cx as usize;
    let uy = cy as usize;
    if board.get(ux, uy) != Some(player) {
      break;
    }
    count += 1;
    cx += dx;
    cy += dy;
  }

  count
}

/// Live game session: the board, the ordered move list, whose turn it is and
/// the result once one is known. Owns the only long-lived board; the search
/// borrows it and must return it untouched.
#[derive(Clone, Debug)]
pub struct Game {
  board: Board,
  to_move: Player,
  moves: Vec<Move>,
  result: Option<GameResult>,
}

impl Game {
  pub fn new(board_size: usize) -> Self {
    Self {
      board: Board::new(board_size),
      to_move: Player::Black,
      moves: Vec::new(),
      result: None,
    }
  }

  pub fn board(&self) -> &Board {
    &self.board
  }

  pub fn to_move(&self) -> Player {
    self.to_move
  }

  pub fn moves(&self) -> &[Move] {
    &self.moves
  }

  pub fn result(&self) -> Option<GameResult> {
    self.result
  }

  pub fn reset(&mut self) {
    self.board = Board::new(self.board.size());
    self.to_move = Player::Black;
    self.moves.clear();
    self.result = None;
  }

  pub fn play(&mut self, x: usize, y: usize) -> Result<(), String> {
    if self.result.is_some() {
      return Err("Game is already finished".to_string());
    }
    if !self.board.is_vacant(x, y) {
      return Err("Illegal move".to_string());
    }

    let mv = Move {
      x,
      y,
      player: self.to_move,
    };
    self.board.place(x, y, mv.player);
    self.moves.push(mv);

    if winning_line(&self.board, &mv) {
      self.result = Some(match mv.player {
        Player::Black => GameResult::BlackWin,
        Player::White => GameResult::WhiteWin,
      });
      return Ok(());
    }

    if self.board.is_full() {
      self.result = Some(GameResult::Draw);
      return Ok(());
    }

    self.to_move = self.to_move.other();
    Ok(())
  }

  /// Takes back the most recent move, reopening a finished game if needed.
  pub fn undo(&mut self) -> Option<Move> {
    let mv = self.moves.pop()?;
    self.board.remove(mv.x, mv.y);
    self.to_move = mv.player;
    self.result = None;
    Some(mv)
  }

  /// Asks the engine for the side to move and plays its answer. An empty
  /// candidate list (the opening position) falls back to the board center;
  /// that policy belongs here, not inside the generator.
  pub fn engine_move(&mut self, engine: &mut Engine) -> Result<Coord, String> {
    if self.result.is_some() {
      return Err("Game is already finished".to_string());
    }

    let coord = match engine.find_best_move(&mut self.board, self.to_move) {
      Some(coord) => coord,
      None => {
        let center = self.board.size() / 2;
        Coord {
          x: center,
          y: center,
        }
      }
    };

    self.play(coord.x, coord.y)?;
    Ok(coord)
  }

  pub fn snapshot(&self) -> GameSnapshot {
    GameSnapshot {
      board_size: self.board.size(),
      board: self.board.cells(),
      to_move: self.to_move,
      moves: self.moves.clone(),
      result: self.result,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn place_and_remove_restore_the_hash() {
    let mut board = Board::new(DEFAULT_BOARD_SIZE);
    board.place(7, 7, Player::Black);
    let before = board.hash();
    let cells = board.cells();

    board.place(8, 8, Player::White);
    board.place(3, 4, Player::Black);
    board.remove(3, 4);
    board.remove(8, 8);

    assert_eq!(board.hash(), before);
    assert_eq!(board.cells(), cells);
  }

  #[test]
  fn stones_iterate_row_major() {
    let mut board = Board::new(5);
    board.place(4, 0, Player::Black);
    board.place(0, 2, Player::White);
    let stones: Vec<_> = board.stones().collect();
    assert_eq!(
      stones,
      vec![(4, 0, Player::Black), (0, 2, Player::White)]
    );
  }

  #[test]
  fn play_rejects_occupied_and_out_of_range() {
    let mut game = Game::new(DEFAULT_BOARD_SIZE);
    game.play(7, 7).unwrap();
    assert!(game.play(7, 7).is_err());
    assert!(game.play(15, 0).is_err());
  }

  #[test]
  fn five_in_a_row_finishes_the_game() {
    let mut game = Game::new(DEFAULT_BOARD_SIZE);
    // Black builds a horizontal five on row 7, White answers on row 0.
    for i in 0..4 {
      game.play(3 + i, 7).unwrap();
      game.play(i, 0).unwrap();
    }
    game.play(7, 7).unwrap();

    assert_eq!(game.result(), Some(GameResult::BlackWin));
    assert!(game.play(0, 14).is_err());
  }

  #[test]
  fn undo_reopens_a_won_game() {
    let mut game = Game::new(DEFAULT_BOARD_SIZE);
    for i in 0..4 {
      game.play(3 + i, 7).unwrap();
      game.play(i, 0).unwrap();
    }
    game.play(7, 7).unwrap();
    assert!(game.result().is_some());

    let mv = game.undo().unwrap();
    assert_eq!((mv.x, mv.y, mv.player), (7, 7, Player::Black));
    assert_eq!(game.result(), None);
    assert_eq!(game.to_move(), Player::Black);
    assert_eq!(game.board().get(7, 7), None);
  }

  #[test]
  fn winning_line_needs_five_through_the_move() {
    let mut board = Board::new(DEFAULT_BOARD_SIZE);
    for y in 3..7 {
      board.place(3, y, Player::White);
    }
    let mv = Move {
      x: 3,
      y: 6,
      player: Player::White,
    };
    assert!(!winning_line(&board, &mv));

    board.place(3, 7, Player::White);
    let mv = Move {
      x: 3,
      y: 7,
      player: Player::White,
    };
    assert!(winning_line(&board, &mv));
  }

  #[test]
  fn snapshot_round_trips_through_serde() {
    let mut game = Game::new(DEFAULT_BOARD_SIZE);
    game.play(7, 7).unwrap();
    game.play(8, 8).unwrap();

    let json = serde_json::to_string(&game.snapshot()).unwrap();
    let back: crate::types::GameSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(back.board_size, DEFAULT_BOARD_SIZE);
    assert_eq!(back.moves, game.moves().to_vec());
    assert_eq!(back.to_move, Player::Black);
  }
}
