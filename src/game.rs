//! Game state: selection, swap and shake animations, cascade driving, game over.

use crate::GameConfig;
use crate::cascade::{Cascade, FallDescriptor};
use crate::grid::{Board, Position};
use crate::lifecycle;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument};

/// Falls run for this share of the swap animation duration.
const FALL_FRACTION: f32 = 0.8;

/// The swap currently being animated. The grid already holds the swapped tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapAnimation {
    pub a: Position,
    pub b: Position,
    pub start: Instant,
}

impl SwapAnimation {
    /// Linear progress in [0, 1].
    pub fn progress(&self, now: Instant, duration: Duration) -> f32 {
        linear_progress(self.start, now, duration)
    }

    fn involves(&self, pos: Position) -> bool {
        self.a == pos || self.b == pos
    }
}

/// Rejected swap indicator; render-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShakeSignal {
    pub pos: Position,
    pub start: Instant,
}

impl ShakeSignal {
    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.start)
    }
}

fn linear_progress(start: Instant, now: Instant, duration: Duration) -> f32 {
    if duration.is_zero() {
        return 1.0;
    }
    (now.saturating_duration_since(start).as_secs_f32() / duration.as_secs_f32()).min(1.0)
}

/// Interaction phase. Falls are tracked by the cascade, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Selected(Position),
    Swapping(SwapAnimation),
    Shaking(ShakeSignal),
    GameOver,
}

/// What a pointer press resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Cell(Position),
    Shuffle,
}

/// How a press was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressOutcome {
    Ignored,
    Selected,
    Swapped,
    Rejected,
    Shuffled,
    ShuffleDeclined,
    Restarted,
}

#[derive(Debug)]
pub struct GameState {
    board: Board,
    cascade: Cascade,
    phase: Phase,
    rng: StdRng,
    swap_duration: Duration,
    shake_duration: Duration,
}

impl GameState {
    #[instrument(skip_all, fields(seed = ?config.seed))]
    pub fn new(config: &GameConfig) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let board = Board::random(&mut rng);
        info!("new game");
        Self::with_board_and_rng(board, rng, config)
    }

    /// Start from a given board (score and max score included).
    pub fn with_board(board: Board, config: &GameConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed.unwrap_or_default());
        Self::with_board_and_rng(board, rng, config)
    }

    fn with_board_and_rng(board: Board, rng: StdRng, config: &GameConfig) -> Self {
        let swap_duration = Duration::from_millis(config.animation_ms);
        Self {
            board,
            cascade: Cascade::new(
                swap_duration.mul_f32(FALL_FRACTION),
                Duration::from_millis(config.refill_stagger_ms),
            ),
            phase: Phase::Idle,
            rng,
            swap_duration,
            shake_duration: Duration::from_millis(config.shake_ms),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn falls(&self) -> &[FallDescriptor] {
        self.cascade.falls()
    }

    pub fn selection(&self) -> Option<Position> {
        match self.phase {
            Phase::Selected(pos) => Some(pos),
            _ => None,
        }
    }

    pub fn swap(&self) -> Option<&SwapAnimation> {
        match &self.phase {
            Phase::Swapping(swap) => Some(swap),
            _ => None,
        }
    }

    pub fn shake(&self) -> Option<&ShakeSignal> {
        match &self.phase {
            Phase::Shaking(shake) => Some(shake),
            _ => None,
        }
    }

    pub fn swap_duration(&self) -> Duration {
        self.swap_duration
    }

    pub fn shake_duration(&self) -> Duration {
        self.shake_duration
    }

    pub fn score(&self) -> u32 {
        self.board.score()
    }

    pub fn max_score(&self) -> u32 {
        self.board.max_score()
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    /// Tiles are moving: live falls or a swap in flight.
    pub fn is_busy(&self) -> bool {
        self.cascade.is_falling() || self.swap().is_some()
    }

    /// The renderer draws `pos` from an animation instead of the static grid.
    pub fn is_animating(&self, pos: Position) -> bool {
        self.cascade.is_animating(pos) || self.swap().is_some_and(|s| s.involves(pos))
    }

    /// Single input entry point. In game over any press (even one that hit
    /// nothing) restarts; otherwise presses are dropped while tiles move.
    /// A running shake blocks board presses but not the shuffle button.
    pub fn press(&mut self, target: Option<Target>, now: Instant) -> PressOutcome {
        if self.phase == Phase::GameOver {
            self.restart();
            return PressOutcome::Restarted;
        }
        if self.is_busy() {
            return PressOutcome::Ignored;
        }
        match target {
            Some(Target::Shuffle) => self.press_shuffle(),
            Some(Target::Cell(_)) if self.shake().is_some() => PressOutcome::Ignored,
            Some(Target::Cell(pos)) => self.press_cell(pos, now),
            None => PressOutcome::Ignored,
        }
    }

    fn press_cell(&mut self, pos: Position, now: Instant) -> PressOutcome {
        let selected = match self.phase {
            Phase::Selected(selected) if self.board.are_adjacent(selected, pos) => selected,
            _ => {
                self.phase = Phase::Selected(pos);
                return PressOutcome::Selected;
            }
        };

        if self.board.would_form_match(selected, pos) {
            self.board.swap(selected, pos);
            self.phase = Phase::Swapping(SwapAnimation {
                a: selected,
                b: pos,
                start: now,
            });
            debug!(?selected, ?pos, "swap accepted");
            PressOutcome::Swapped
        } else {
            self.phase = Phase::Shaking(ShakeSignal {
                pos: selected,
                start: now,
            });
            debug!(?selected, ?pos, "swap rejected");
            PressOutcome::Rejected
        }
    }

    /// Shuffle, then evaluate game over right away (same call, before the next tick).
    fn press_shuffle(&mut self) -> PressOutcome {
        if !self.board.shuffle(&mut self.rng) {
            debug!(score = self.board.score(), "shuffle declined");
            return PressOutcome::ShuffleDeclined;
        }
        self.phase = Phase::Idle;
        self.check_game_over();
        PressOutcome::Shuffled
    }

    /// Apply the game-over rule; sets the flag and returns whether it did.
    pub fn check_game_over(&mut self) -> bool {
        if !lifecycle::is_game_over(&self.board) {
            return false;
        }
        self.phase = Phase::GameOver;
        info!(
            score = self.board.score(),
            max_score = self.board.max_score(),
            "game over"
        );
        true
    }

    /// New board, score 0, best score kept, all animation state dropped.
    pub fn restart(&mut self) {
        self.board = lifecycle::fresh_board(&self.board, &mut self.rng);
        self.cascade.clear();
        self.phase = Phase::Idle;
        info!(max_score = self.board.max_score(), "restarted");
    }

    /// Per-frame update. Frozen in game over.
    pub fn tick(&mut self, now: Instant) {
        match self.phase {
            Phase::GameOver => return,
            Phase::Shaking(shake) if shake.elapsed(now) >= self.shake_duration => {
                self.phase = Phase::Idle;
            }
            Phase::Swapping(swap) if now.saturating_duration_since(swap.start) >= self.swap_duration => {
                self.phase = Phase::Idle;
            }
            _ => {}
        }

        self.cascade.advance(now);
        let swapping = self.swap().is_some();
        if self
            .cascade
            .settle_step(&mut self.board, &mut self.rng, now, swapping)
        {
            return;
        }

        if !self.is_busy() && !lifecycle::has_possible_moves(&self.board) {
            self.check_game_over();
        }
    }
}
