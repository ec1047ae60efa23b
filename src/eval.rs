use std::ops::{Index, IndexMut};

use crate::engine::Board;
use crate::types::Player;

pub const SCORE_FIVE: i32 = 100_000;
pub const SCORE_FOUR: i32 = 10_000;
pub const SCORE_SFOUR: i32 = 1_000;
pub const SCORE_THREE: i32 = 100;
pub const SCORE_STHREE: i32 = 10;
pub const SCORE_TWO: i32 = 8;
pub const SCORE_STWO: i32 = 2;

pub const DIRECTIONS: [(i32, i32); 4] = [(1, 0), (0, 1), (1, 1), (1, -1)];

/// Line pattern tags, ordered by threat severity. `Five` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Pattern {
  None,
  SleepTwo,
  LiveTwo,
  SleepThree,
  LiveThree,
  RushFour,
  LiveFour,
  Five,
}

impl Pattern {
  pub const COUNT: usize = 8;
}

/// Per-side tally of pattern occurrences over one evaluation pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PatternCounts([u32; Pattern::COUNT]);

impl Index<Pattern> for PatternCounts {
  type Output = u32;

  fn index(&self, pattern: Pattern) -> &u32 {
    &self.0[pattern as usize]
  }
}

impl IndexMut<Pattern> for PatternCounts {
  fn index_mut(&mut self, pattern: Pattern) -> &mut u32 {
    &mut self.0[pattern as usize]
  }
}

/// How one window cell reads from the scanned side's point of view.
/// Off-board cells read as `Foe`: the board edge blocks a line exactly the
/// way an opponent stone does.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Slot {
  Empty,
  Mine,
  Foe,
}

fn side(player: Player) -> usize {
  match player {
    Player::Black => 0,
    Player::White => 1,
  }
}

/// Line scanner plus position evaluator. Owns the scratch state for one
/// evaluation pass: the per-cell per-axis visited marks (so a run is folded
/// into the counts once, not once per stone) and the two count tables.
/// Both are cleared at the start of every pass.
#[derive(Clone, Debug)]
pub struct Evaluator {
  size: usize,
  visited: Vec<[bool; 4]>,
  counts: [PatternCounts; 2],
}

impl Evaluator {
  pub fn new(size: usize) -> Self {
    Self {
      size,
      visited: vec![[false; 4]; size * size],
      counts: [PatternCounts::default(); 2],
    }
  }

  fn reset(&mut self) {
    for marks in self.visited.iter_mut() {
      *marks = [false; 4];
    }
    self.counts = [PatternCounts::default(); 2];
  }

  /// Signed score of the position from `turn`'s point of view.
  pub fn evaluate(&mut self, board: &Board, turn: Player) -> i32 {
    self.run_pass(board);
    let mine = self.counts[side(turn)];
    let opponent = self.counts[side(turn.other())];
    let (mscore, oscore) = combined_score(mine, opponent);
    mscore - oscore
  }

  /// True iff `turn` already has five in a row somewhere on the board.
  pub fn is_win(&mut self, board: &Board, turn: Player) -> bool {
    self.run_pass(board);
    self.counts[side(turn)][Pattern::Five] > 0
  }

  fn run_pass(&mut self, board: &Board) {
    self.reset();
    for (x, y, owner) in board.stones() {
      self.evaluate_point(board, x, y, owner, false);
    }
  }

  /// Folds the runs through (x, y) into `mine`'s count table, one axis at a
  /// time, skipping axes already claimed by an earlier stone of the pass.
  fn evaluate_point(&mut self, board: &Board, x: usize, y: usize, mine: Player, ignore_visited: bool) {
    let cell = y * self.size + x;
    for axis in 0..DIRECTIONS.len() {
      if ignore_visited || !self.visited[cell][axis] {
        self.analyze_line(board, x, y, axis, mine);
      }
    }
  }

  /// Placement score of an empty cell: hypothetically drop each side's stone
  /// there, tally the patterns it would make, and convert both tallies to
  /// tier scores. The cell is restored before returning. Used only for move
  /// ranking, never as the search's terminal evaluation.
  pub fn point_score(
    &mut self,
    board: &mut Board,
    x: usize,
    y: usize,
    mine: Player,
    opponent: Player,
  ) -> (i32, i32) {
    debug_assert!(board.is_vacant(x, y), "scoring an occupied cell");
    self.counts = [PatternCounts::default(); 2];

    board.place(x, y, mine);
    self.evaluate_point(board, x, y, mine, true);
    board.remove(x, y);

    board.place(x, y, opponent);
    self.evaluate_point(board, x, y, opponent, true);
    board.remove(x, y);

    let mscore = point_tier_score(&self.counts[side(mine)]);
    let oscore = point_tier_score(&self.counts[side(opponent)]);
    (mscore, oscore)
  }

  /// Nine cells centered on (x, y) along one axis, viewed from `mine`'s side.
  fn window(&self, board: &Board, x: usize, y: usize, axis: usize, mine: Player) -> [Slot; 9] {
    let (dx, dy) = DIRECTIONS[axis];
    let mut line = [Slot::Foe; 9];
    for (i, slot) in line.iter_mut().enumerate() {
      let cx = x as i32 + (i as i32 - 4) * dx;
      let cy = y as i32 + (i as i32 - 4) * dy;
      *slot = if cx < 0 || cy < 0 || cx >= self.size as i32 || cy >= self.size as i32 {
        Slot::Foe
      } else {
        match board.get(cx as usize, cy as usize) {
          None => Slot::Empty,
          Some(p) if p == mine => Slot::Mine,
          Some(_) => Slot::Foe,
        }
      };
    }
    line
  }

  /// Marks window indices `from..=to` of the axis as classified.
  fn mark_span(&mut self, x: usize, y: usize, axis: usize, from: usize, to: usize) {
    let (dx, dy) = DIRECTIONS[axis];
    for i in from..=to {
      let cx = x as i32 + (i as i32 - 4) * dx;
      let cy = y as i32 + (i as i32 - 4) * dy;
      if cx < 0 || cy < 0 || cx >= self.size as i32 || cy >= self.size as i32 {
        continue;
      }
      self.visited[cy as usize * self.size + cx as usize][axis] = true;
    }
  }

  fn bump(&mut self, s: usize, pattern: Pattern) {
    self.counts[s][pattern] += 1;
  }

  /// Classifies the run of `mine` stones through (x, y) along one axis.
  ///
  /// Window index 4 is (x, y). `left..=right` is the contiguous run of mine
  /// stones; `lo..=hi` is the open range, stopped only by a foe stone or the
  /// board edge. A gap shape (a single empty cell splitting two mine groups)
  /// is detected by peeking one to three cells past each flank and marks its
  /// own flanking cells so the far group is not classified again.
  fn analyze_line(&mut self, board: &Board, x: usize, y: usize, axis: usize, mine: Player) {
    use Pattern::{Five, LiveFour, LiveThree, LiveTwo, RushFour, SleepThree, SleepTwo};
    use Slot::{Empty, Foe, Mine};

    let line = self.window(board, x, y, axis, mine);
    let s = side(mine);

    let mut left = 4usize;
    let mut right = 4usize;
    while right < 8 && line[right + 1] == Mine {
      right += 1;
    }
    while left > 0 && line[left - 1] == Mine {
      left -= 1;
    }

    let mut lo = left;
    let mut hi = right;
    while hi < 8 && line[hi + 1] != Foe {
      hi += 1;
    }
    while lo > 0 && line[lo - 1] != Foe {
      lo -= 1;
    }

    // Fewer than five open cells around the run: no five can ever form here.
    if hi - lo + 1 < 5 {
      self.mark_span(x, y, axis, lo, hi);
      return;
    }
    self.mark_span(x, y, axis, left, right);

    let run = right - left + 1;
    if run >= 5 {
      self.bump(s, Five);
      return;
    }

    match run {
      // X M M M M X -> live four; P M M M M X / X M M M M P -> rush four.
      4 => match (line[left - 1] == Empty, line[right + 1] == Empty) {
        (true, true) => self.bump(s, LiveFour),
        (true, false) | (false, true) => self.bump(s, RushFour),
        (false, false) => {}
      },
      // M X M M M / M M M X M are gap fours; otherwise a plain three.
      3 => {
        let mut left_open = false;
        let mut right_open = false;
        let mut gap_four = false;

        if line[left - 1] == Empty {
          if line[left - 2] == Mine {
            self.mark_span(x, y, axis, left - 2, left - 1);
            self.bump(s, RushFour);
            gap_four = true;
          }
          left_open = true;
        }
        if line[right + 1] == Empty {
          if line[right + 2] == Mine {
            self.mark_span(x, y, axis, right + 1, right + 2);
            self.bump(s, RushFour);
            gap_four = true;
          }
          right_open = true;
        }

        if gap_four {
        } else if left_open && right_open {
          // An open range of exactly five leaves no room to grow the three
          // on both sides: P X M M M X P is only a sleeping three.
          if hi - lo + 1 > 5 {
            self.bump(s, LiveThree);
          } else {
            self.bump(s, SleepThree);
          }
        } else if left_open || right_open {
          self.bump(s, SleepThree);
        }
      }
      // Gap shapes off a pair: M M X M M (rush four), M X M M / M M X M
      // threes, else a plain two.
      2 => {
        let mut left_open = false;
        let mut right_open = false;
        let mut gap_three = false;

        if line[left - 1] == Empty {
          if line[left - 2] == Mine {
            self.mark_span(x, y, axis, left - 2, left - 1);
            match line[left - 3] {
              Empty => {
                if line[right + 1] == Empty {
                  self.bump(s, LiveThree); // X M X M M X
                } else {
                  self.bump(s, SleepThree); // X M X M M P
                }
                gap_three = true;
              }
              Foe => {
                if line[right + 1] == Empty {
                  self.bump(s, SleepThree); // P M X M M X
                  gap_three = true;
                }
              }
              Mine => {}
            }
          }
          left_open = true;
        }
        if line[right + 1] == Empty {
          if line[right + 2] == Mine {
            match line[right + 3] {
              Mine => {
                self.mark_span(x, y, axis, right + 1, right + 2);
                self.bump(s, RushFour); // M M X M M
                gap_three = true;
              }
              Empty => {
                if left_open {
                  self.bump(s, LiveThree); // X M M X M X
                } else {
                  self.bump(s, SleepThree); // P M M X M X
                }
                gap_three = true;
              }
              Foe => {
                if left_open {
                  self.bump(s, SleepThree); // X M M X M P
                  gap_three = true;
                }
              }
            }
          }
          right_open = true;
        }

        if gap_three {
        } else if left_open && right_open {
          self.bump(s, LiveTwo); // X M M X
        } else if left_open || right_open {
          self.bump(s, SleepTwo); // P M M X, X M M P
        }
      }
      // Lone stone: only the double-gapped twos matter (M X M, M X X M).
      1 => {
        let mut left_open = false;
        if line[left - 1] == Empty {
          if line[left - 2] == Mine && line[left - 3] == Empty && line[right + 1] == Foe {
            self.bump(s, SleepTwo); // X M X M P
          }
          left_open = true;
        }
        if line[right + 1] == Empty {
          match line[right + 2] {
            Mine => {
              if line[right + 3] == Empty {
                if left_open {
                  self.bump(s, LiveTwo); // X M X M X
                } else {
                  self.bump(s, SleepTwo); // P M X M X
                }
              }
            }
            Empty => {
              if line[right + 3] == Mine && line[right + 4] == Empty {
                self.bump(s, LiveTwo); // X M X X M X
              }
            }
            Foe => {}
          }
        }
      }
      _ => {}
    }
  }
}

/// Tier score for one side's hypothetical-placement counts.
fn point_tier_score(counts: &PatternCounts) -> i32 {
  use Pattern::{Five, LiveFour, LiveThree, LiveTwo, RushFour, SleepThree, SleepTwo};

  if counts[Five] > 0 {
    return SCORE_FIVE;
  }
  if counts[LiveFour] > 0 {
    return SCORE_FOUR;
  }

  let mut score = 0;
  if counts[RushFour] > 1 {
    score += counts[RushFour] as i32 * SCORE_SFOUR;
  } else if counts[RushFour] > 0 && counts[LiveThree] > 0 {
    score += counts[RushFour] as i32 * SCORE_SFOUR;
  } else if counts[RushFour] > 0 {
    score += SCORE_THREE;
  }
  if counts[LiveThree] > 1 {
    score += 5 * SCORE_THREE;
  } else if counts[LiveThree] > 0 {
    score += SCORE_THREE;
  }
  score += counts[SleepThree] as i32 * SCORE_STHREE;
  score += counts[LiveTwo] as i32 * SCORE_TWO;
  score += counts[SleepTwo] as i32 * SCORE_STWO;
  score
}

/// Combines both sides' counts into (mscore, oscore). The ladder is checked
/// in this exact order; later branches assume the earlier ones did not fire.
fn combined_score(mut mine: PatternCounts, mut opponent: PatternCounts) -> (i32, i32) {
  use Pattern::{Five, LiveFour, LiveThree, LiveTwo, RushFour, SleepThree, SleepTwo};

  if mine[Five] > 0 {
    return (SCORE_FIVE, 0);
  }
  if opponent[Five] > 0 {
    return (0, SCORE_FIVE);
  }

  // Two rush fours force as hard as a live four.
  if mine[RushFour] >= 2 {
    mine[LiveFour] += 1;
  }
  if opponent[RushFour] >= 2 {
    opponent[LiveFour] += 1;
  }

  if mine[LiveFour] > 0 {
    return (9050, 0);
  }
  if mine[RushFour] > 0 {
    return (9040, 0);
  }
  if opponent[LiveFour] > 0 {
    return (0, 9030);
  }
  if opponent[RushFour] > 0 && opponent[LiveThree] > 0 {
    return (0, 9020);
  }
  if mine[LiveThree] > 0 && opponent[RushFour] == 0 {
    return (9010, 0);
  }
  if opponent[LiveThree] > 1 && mine[LiveThree] == 0 && mine[SleepThree] == 0 {
    return (0, 9000);
  }

  let mut mscore = 0;
  let mut oscore = 0;
  if opponent[RushFour] > 0 {
    oscore += 400;
  }
  if mine[LiveThree] > 1 {
    mscore += 500;
  } else if mine[LiveThree] > 0 {
    mscore += 100;
  }
  if opponent[LiveThree] > 1 {
    oscore += 2000;
  } else if opponent[LiveThree] > 0 {
    oscore += 400;
  }
  mscore += mine[SleepThree] as i32 * 10;
  oscore += opponent[SleepThree] as i32 * 10;
  mscore += mine[LiveTwo] as i32 * 6;
  oscore += opponent[LiveTwo] as i32 * 6;
  mscore += mine[SleepTwo] as i32 * 2;
  oscore += opponent[SleepTwo] as i32 * 2;
  (mscore, oscore)
}
