use std::time::Instant;

use log::debug;

use crate::engine::Board;
use crate::eval::{Evaluator, SCORE_FIVE, SCORE_FOUR, SCORE_SFOUR};
use crate::types::{AiConfig, Coord, Player};

const SCORE_MAX: i32 = i32::MAX;
const SCORE_MIN: i32 = -SCORE_MAX;
const NEIGHBOR_RADIUS: i32 = 1;

// Per-search bookkeeping: the root depth (best-move recording happens there
// and nowhere else) and the diagnostics counters.
struct SearchContext {
  root_depth: u8,
  best_move: Option<Coord>,
  nodes: u32,
  cutoffs: u32,
}

impl SearchContext {
  fn new(root_depth: u8) -> Self {
    Self {
      root_depth,
      best_move: None,
      nodes: 0,
      cutoffs: 0,
    }
  }
}

/// Scoped placement: the stone comes off again on every exit path, pruning
/// breaks included, so the search hands the board back exactly as it found it.
struct Placed<'a> {
  board: &'a mut Board,
  coord: Coord,
}

impl<'a> Placed<'a> {
  fn new(board: &'a mut Board, coord: Coord, player: Player) -> Self {
    board.place(coord.x, coord.y, player);
    Self { board, coord }
  }

  fn board(&mut self) -> &mut Board {
    &mut *self.board
  }
}

impl Drop for Placed<'_> {
  fn drop(&mut self) {
    self.board.remove(self.coord.x, self.coord.y);
  }
}

/// The decision engine: fixed-depth negamax with alpha-beta pruning over the
/// candidate generator's move list. Owns the evaluator scratch state; the
/// board is borrowed for the duration of one call and returned byte-for-byte
/// identical.
pub struct Engine {
  config: AiConfig,
  evaluator: Evaluator,
}

impl Engine {
  pub fn new(board_size: usize) -> Self {
    Self::with_config(board_size, AiConfig::default())
  }

  pub fn with_config(board_size: usize, config: AiConfig) -> Self {
    Self {
      config,
      evaluator: Evaluator::new(board_size),
    }
  }

  pub fn config(&self) -> AiConfig {
    self.config
  }

  /// True iff `turn` has completed a five-in-a-row.
  pub fn is_win(&mut self, board: &Board, turn: Player) -> bool {
    self.evaluator.is_win(board, turn)
  }

  /// Runs the fixed-depth search and returns the chosen move. `None` means
  /// the generator produced no candidates (an empty board, or a position the
  /// caller should not have searched); the caller decides what that means.
  pub fn find_best_move(&mut self, board: &mut Board, turn: Player) -> Option<Coord> {
    let started = Instant::now();
    let fingerprint = board.hash();

    let mut ctx = SearchContext::new(self.config.depth);
    let score = self.search(board, turn, self.config.depth, SCORE_MIN, SCORE_MAX, &mut ctx);

    debug_assert_eq!(board.hash(), fingerprint, "search must restore the board");
    debug!(
      "depth {} score {} nodes {} cutoffs {} elapsed {:?}",
      self.config.depth,
      score,
      ctx.nodes,
      ctx.cutoffs,
      started.elapsed()
    );
    ctx.best_move
  }

  fn search(
    &mut self,
    board: &mut Board,
    turn: Player,
    depth: u8,
    mut alpha: i32,
    beta: i32,
    ctx: &mut SearchContext,
  ) -> i32 {
    ctx.nodes += 1;

    let score = self.evaluator.evaluate(board, turn);
    if depth == 0 || score.abs() >= SCORE_FIVE {
      return score;
    }

    let moves = self.candidate_moves(board, turn);
    if moves.is_empty() {
      return score;
    }

    let mut best_here: Option<Coord> = None;
    for (_, coord) in moves {
      let value = {
        let mut placed = Placed::new(board, coord, turn);
        -self.search(placed.board(), turn.other(), depth - 1, -beta, -alpha, ctx)
      };

      if value > alpha {
        alpha = value;
        best_here = Some(coord);
        if alpha >= beta {
          ctx.cutoffs += 1;
          break;
        }
      }
    }

    if depth == ctx.root_depth && best_here.is_some() {
      ctx.best_move = best_here;
    }
    alpha
  }

  /// Scored candidate moves for `turn`, strongest first: every empty cell
  /// next to a stone, run through the placement evaluator and bucketed by
  /// forcing power. An immediate five trumps everything; then our own four;
  /// an opponent four forces a block or a rush-four counter. Only the
  /// fall-through bucket is capped.
  fn candidate_moves(&mut self, board: &mut Board, turn: Player) -> Vec<(i32, Coord)> {
    let size = board.size();
    let opponent = turn.other();

    let mut fives = Vec::new();
    let mut mine_fours = Vec::new();
    let mut foe_fours = Vec::new();
    let mut mine_rush_fours = Vec::new();
    let mut moves = Vec::new();

    for y in 0..size {
      for x in 0..size {
        if board.get(x, y).is_some() || !has_neighbor(board, x, y, NEIGHBOR_RADIUS) {
          continue;
        }

        let (mscore, oscore) = self.evaluator.point_score(board, x, y, turn, opponent);
        let point = (mscore.max(oscore), Coord { x, y });

        if mscore >= SCORE_FIVE || oscore >= SCORE_FIVE {
          fives.push(point);
        } else if mscore >= SCORE_FOUR {
          mine_fours.push(point);
        } else if oscore >= SCORE_FOUR {
          foe_fours.push(point);
        } else if mscore >= SCORE_SFOUR {
          mine_rush_fours.push(point);
        }
        moves.push(point);
      }
    }

    if !fives.is_empty() {
      return fives;
    }
    if !mine_fours.is_empty() {
      return mine_fours;
    }
    if !foe_fours.is_empty() {
      foe_fours.extend(mine_rush_fours);
      return foe_fours;
    }

    moves.sort_by(|a, b| b.0.cmp(&a.0));
    if self.config.depth > 2 && moves.len() > self.config.max_candidates {
      moves.truncate(self.config.max_candidates);
    }
    moves
  }
}

fn has_neighbor(board: &Board, x: usize, y: usize, radius: i32) -> bool {
  for dy in -radius..=radius {
    for dx in -radius..=radius {
      let nx = x as i32 + dx;
      let ny = y as i32 + dy;
      if nx < 0 || ny < 0 {
        continue;
      }
      if board.get(nx as usize, ny as usize).is_some() {
        return true;
      }
    }
  }
  false
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::engine::{Game, DEFAULT_BOARD_SIZE};
  use crate::types::Player::{Black, White};

  fn shallow_engine() -> Engine {
    Engine::with_config(
      DEFAULT_BOARD_SIZE,
      AiConfig {
        depth: 2,
        max_candidates: 10,
      },
    )
  }

  fn board_with(stones: &[(usize, usize, Player)]) -> Board {
    let mut board = Board::new(DEFAULT_BOARD_SIZE);
    for &(x, y, player) in stones {
      board.place(x, y, player);
    }
    board
  }

  #[test]
  fn no_candidates_on_an_empty_board() {
    let mut engine = shallow_engine();
    let mut board = Board::new(DEFAULT_BOARD_SIZE);
    assert!(engine.candidate_moves(&mut board, Black).is_empty());
    assert_eq!(engine.find_best_move(&mut board, Black), None);
  }

  #[test]
  fn candidates_stay_within_the_neighborhood() {
    let mut engine = shallow_engine();
    let mut board = board_with(&[(7, 7, Black)]);
    let moves = engine.candidate_moves(&mut board, White);

    assert_eq!(moves.len(), 8);
    for (_, coord) in moves {
      assert!(coord.x.abs_diff(7) <= 1 && coord.y.abs_diff(7) <= 1);
      assert_ne!((coord.x, coord.y), (7, 7));
    }
  }

  #[test]
  fn five_forming_cells_preempt_everything_else() {
    let mut engine = shallow_engine();
    let mut board = board_with(&[(7, 7, Black), (7, 8, Black), (7, 9, Black), (7, 10, Black)]);
    let moves = engine.candidate_moves(&mut board, Black);

    let mut cells: Vec<(usize, usize)> = moves.iter().map(|(_, c)| (c.x, c.y)).collect();
    cells.sort();
    assert_eq!(cells, vec![(7, 6), (7, 11)]);
  }

  #[test]
  fn fall_through_bucket_is_capped_when_searching_deep() {
    let mut engine = Engine::with_config(
      DEFAULT_BOARD_SIZE,
      AiConfig {
        depth: 5,
        max_candidates: 10,
      },
    );
    let mut board = board_with(&[
      (2, 2, Black),
      (5, 8, White),
      (9, 3, Black),
      (12, 12, White),
      (3, 11, Black),
    ]);
    let moves = engine.candidate_moves(&mut board, Black);

    assert_eq!(moves.len(), 10);
    for pair in moves.windows(2) {
      assert!(pair[0].0 >= pair[1].0, "candidates must be sorted by score");
    }
  }

  #[test]
  fn completes_an_open_four() {
    let mut engine = shallow_engine();
    let mut board = board_with(&[
      (7, 7, Black),
      (7, 8, Black),
      (7, 9, Black),
      (7, 10, Black),
      (8, 7, White),
      (8, 8, White),
      (8, 9, White),
    ]);

    let coord = engine.find_best_move(&mut board, Black).unwrap();
    assert!((coord.x, coord.y) == (7, 6) || (coord.x, coord.y) == (7, 11));
  }

  #[test]
  fn blocks_the_only_five_forming_cell() {
    let mut engine = shallow_engine();
    // White threatens five at (7, 6) only; (7, 11) is already taken.
    let mut board = board_with(&[
      (7, 7, White),
      (7, 8, White),
      (7, 9, White),
      (7, 10, White),
      (7, 11, Black),
      (8, 8, Black),
    ]);

    let coord = engine.find_best_move(&mut board, Black).unwrap();
    assert_eq!((coord.x, coord.y), (7, 6));
  }

  #[test]
  fn search_leaves_the_board_untouched() {
    let mut engine = shallow_engine();
    let mut board = board_with(&[
      (7, 7, Black),
      (8, 8, White),
      (7, 8, Black),
      (6, 8, White),
      (9, 9, Black),
      (5, 5, White),
    ]);
    let cells = board.cells();
    let hash = board.hash();

    engine.find_best_move(&mut board, Black).unwrap();

    assert_eq!(board.cells(), cells);
    assert_eq!(board.hash(), hash);
  }

  // Exhaustive negamax over the same candidate lists, no pruning. The
  // alpha-beta search must agree with it on both score and chosen move.
  fn exhaustive(
    engine: &mut Engine,
    board: &mut Board,
    turn: Player,
    depth: u8,
  ) -> (i32, Option<Coord>) {
    let score = engine.evaluator.evaluate(board, turn);
    if depth == 0 || score.abs() >= SCORE_FIVE {
      return (score, None);
    }
    let moves = engine.candidate_moves(board, turn);
    if moves.is_empty() {
      return (score, None);
    }

    let mut best = SCORE_MIN;
    let mut best_move = None;
    for (_, coord) in moves {
      board.place(coord.x, coord.y, turn);
      let value = -exhaustive(engine, board, turn.other(), depth - 1).0;
      board.remove(coord.x, coord.y);
      if value > best {
        best = value;
        best_move = Some(coord);
      }
    }
    (best, best_move)
  }

  #[test]
  fn pruning_matches_the_exhaustive_search() {
    let mut engine = shallow_engine();
    let mut board = board_with(&[
      (7, 7, Black),
      (8, 8, White),
      (7, 8, Black),
      (6, 8, White),
    ]);

    let (plain_score, plain_move) = exhaustive(&mut engine, &mut board, Black, 2);

    let mut ctx = SearchContext::new(2);
    let pruned_score = engine.search(&mut board, Black, 2, SCORE_MIN, SCORE_MAX, &mut ctx);

    assert_eq!(pruned_score, plain_score);
    assert_eq!(ctx.best_move, plain_move);
  }

  #[test]
  fn opening_move_falls_back_to_the_center() {
    let mut engine = shallow_engine();
    let mut game = Game::new(DEFAULT_BOARD_SIZE);

    let coord = game.engine_move(&mut engine).unwrap();
    assert_eq!((coord.x, coord.y), (7, 7));

    // The reply has neighbors to work with and must come from the generator.
    let reply = game.engine_move(&mut engine).unwrap();
    assert!(reply.x.abs_diff(7) <= 1 && reply.y.abs_diff(7) <= 1);
  }
}
