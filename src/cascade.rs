//! Cascade: gravity collapse, refill from above, and the fall descriptors the renderer animates.

use crate::grid::{Board, Cell, GRID_SIZE, Position, TileKind};
use rand::Rng;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::debug;

/// Refilled tiles start one row above the visible grid.
pub const SPAWN_ROW: i32 = -1;

/// One tile travelling from `from_row` to `to_row` in column `col`.
/// The grid already holds the tile at its target; this only drives the visual.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallDescriptor {
    pub kind: TileKind,
    /// May be negative (above the grid) for refilled tiles.
    pub from_row: i32,
    pub to_row: usize,
    pub col: usize,
    pub start: Instant,
    /// Linear progress in [0, 1).
    pub progress: f32,
}

impl FallDescriptor {
    pub fn target(&self) -> Position {
        Position::new(self.to_row, self.col)
    }
}

#[derive(Debug, Clone)]
pub struct Cascade {
    falls: Vec<FallDescriptor>,
    fall_duration: Duration,
    refill_stagger: Duration,
}

impl Cascade {
    pub fn new(fall_duration: Duration, refill_stagger: Duration) -> Self {
        Self {
            falls: Vec::new(),
            fall_duration,
            refill_stagger,
        }
    }

    pub fn falls(&self) -> &[FallDescriptor] {
        &self.falls
    }

    /// True while any fall descriptor is live.
    pub fn is_falling(&self) -> bool {
        !self.falls.is_empty()
    }

    /// True if a live fall is headed for `pos`.
    pub fn is_animating(&self, pos: Position) -> bool {
        self.falls.iter().any(|f| f.target() == pos)
    }

    pub fn clear(&mut self) {
        self.falls.clear();
    }

    /// Drop tiles into the holes below them, column by column, then refill
    /// the holes left at the top with random tiles. The grid is updated
    /// immediately; every moved or new tile gets a fall descriptor.
    /// Returns the number of descriptors created.
    pub fn collapse<R: Rng + ?Sized>(&mut self, board: &mut Board, rng: &mut R, now: Instant) -> usize {
        let created_before = self.falls.len();
        let holes_before = board.empty_count();
        for col in 0..GRID_SIZE {
            let mut holes: VecDeque<usize> = VecDeque::new();
            for row in (0..GRID_SIZE).rev() {
                let here = Position::new(row, col);
                match board.get(here) {
                    Cell::Empty => holes.push_back(row),
                    Cell::Tile(kind) => {
                        // Lowest pending hole first.
                        let Some(target) = holes.pop_front() else {
                            continue;
                        };
                        board.set(Position::new(target, col), Cell::Tile(kind));
                        board.set(here, Cell::Empty);
                        holes.push_back(row);
                        self.falls.push(FallDescriptor {
                            kind,
                            from_row: row as i32,
                            to_row: target,
                            col,
                            start: now,
                            progress: 0.0,
                        });
                    }
                }
            }

            for (order, row) in holes.into_iter().enumerate() {
                let kind = TileKind::random(rng);
                board.set(Position::new(row, col), Cell::Tile(kind));
                self.falls.push(FallDescriptor {
                    kind,
                    from_row: SPAWN_ROW,
                    to_row: row,
                    col,
                    start: now + self.refill_stagger * order as u32,
                    progress: 0.0,
                });
            }
        }
        let created = self.falls.len() - created_before;
        debug!(holes = holes_before, created, "collapsed board");
        created
    }

    /// Advance every started fall; retire the ones that have arrived.
    pub fn advance(&mut self, now: Instant) {
        let duration = self.fall_duration.as_secs_f32();
        self.falls.retain_mut(|fall| {
            if now < fall.start {
                return true;
            }
            let elapsed = now.duration_since(fall.start).as_secs_f32();
            let progress = if duration > 0.0 { elapsed / duration } else { 1.0 };
            if progress >= 1.0 {
                return false;
            }
            fall.progress = progress;
            true
        });
    }

    /// One settlement pass: only when nothing is moving, remove matches and
    /// collapse. Returns true if a removal happened (more falls are now live).
    pub fn settle_step<R: Rng + ?Sized>(
        &mut self,
        board: &mut Board,
        rng: &mut R,
        now: Instant,
        swap_in_flight: bool,
    ) -> bool {
        if self.is_falling() || swap_in_flight {
            return false;
        }
        if !board.remove_matches() {
            return false;
        }
        self.collapse(board, rng, now);
        true
    }
}
