//! App: terminal init, main loop, tick and input handling.

use crate::game::{GameState, PressOutcome, Target};
use crate::grid::{GRID_SIZE, Position};
use crate::input::{Action, key_to_action, mouse_to_action};
use crate::theme::Theme;
use crate::ui::{self, BoardLayout};
use crate::{Args, GameConfig};
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use ratatui::layout::Rect;
use std::time::{Duration, Instant};
use tachyonfx::Effect;
use tracing::{debug, info};

pub struct App {
    theme: Theme,
    state: GameState,
    /// Keyboard cursor on the board.
    cursor: Position,
    frame_duration: Duration,
    /// Terminal area of the last drawn frame, for mouse hit testing.
    area: Rect,
    /// TachyonFX fade for the game-over screen (created on the first game-over frame).
    game_over_effect: Option<Effect>,
    /// Last time we processed the game-over effect (for delta).
    game_over_effect_process_time: Option<Instant>,
}

impl App {
    pub fn new(args: &Args, config: &GameConfig, theme: Theme) -> Self {
        let frame_rate = if args.frame_rate.is_finite() {
            args.frame_rate.clamp(1.0, 240.0)
        } else {
            60.0
        };
        Self {
            theme,
            state: GameState::new(config),
            cursor: Position::new(GRID_SIZE / 2, GRID_SIZE / 2),
            frame_duration: Duration::from_secs_f64(1.0 / frame_rate),
            area: Rect::default(),
            game_over_effect: None,
            game_over_effect_process_time: None,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{DisableMouseCapture, EnableMouseCapture},
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        info!("terminal ready");
        let result = self.run_loop(&mut terminal);

        // Restore
        execute!(std::io::stdout(), DisableMouseCapture, LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            let now = Instant::now();
            self.state.tick(now);
            if !self.state.is_game_over() {
                self.game_over_effect = None;
                self.game_over_effect_process_time = None;
            }

            let mut area = self.area;
            terminal.draw(|f| {
                area = f.area();
                ui::draw(
                    f,
                    &self.state,
                    &self.theme,
                    self.cursor,
                    now,
                    &mut self.game_over_effect,
                    &mut self.game_over_effect_process_time,
                )
            })?;
            self.area = area;

            let timeout = self.frame_duration.saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    let action = match event::read()? {
                        Event::Key(key) if key.kind == KeyEventKind::Press => key_to_action(key),
                        Event::Mouse(mouse) => mouse_to_action(mouse),
                        _ => continue,
                    };
                    if action == Action::Quit {
                        info!(score = self.state.score(), "quit");
                        return Ok(());
                    }
                    self.apply_action(action, Instant::now());
                }
            }
        }
    }

    fn apply_action(&mut self, action: Action, now: Instant) {
        let target = match action {
            Action::CursorUp | Action::CursorDown | Action::CursorLeft | Action::CursorRight => {
                self.cursor = move_cursor(self.cursor, action);
                return;
            }
            Action::PressCursor => Some(Target::Cell(self.cursor)),
            Action::PressAt(column, row) => {
                if !BoardLayout::fits(self.area) {
                    return;
                }
                let target = BoardLayout::compute(self.area).hit(column, row);
                if let Some(Target::Cell(pos)) = target {
                    self.cursor = pos;
                }
                target
            }
            Action::Shuffle => Some(Target::Shuffle),
            // Restart only means something on the game-over screen.
            Action::Restart if self.state.is_game_over() => None,
            Action::Restart | Action::Quit | Action::None => return,
        };
        let outcome = self.state.press(target, now);
        if outcome != PressOutcome::Ignored {
            debug!(?action, ?outcome, "press");
        }
    }
}

/// Step the cursor one cell, staying on the board.
fn move_cursor(cursor: Position, action: Action) -> Position {
    let last = GRID_SIZE - 1;
    match action {
        Action::CursorUp => Position::new(cursor.row.saturating_sub(1), cursor.col),
        Action::CursorDown => Position::new((cursor.row + 1).min(last), cursor.col),
        Action::CursorLeft => Position::new(cursor.row, cursor.col.saturating_sub(1)),
        Action::CursorRight => Position::new(cursor.row, (cursor.col + 1).min(last)),
        _ => cursor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Board;
    use crate::grid::tests::deadlocked_cells;

    fn app_with(board: Board) -> App {
        let config = GameConfig {
            seed: Some(5),
            ..GameConfig::default()
        };
        let mut app = App::new(&test_args(), &config, Theme::default());
        app.state = GameState::with_board(board, &config);
        app.area = Rect::new(0, 0, 80, 24);
        app
    }

    fn test_args() -> Args {
        use clap::Parser;
        Args::parse_from(["matchtui", "--seed", "5"])
    }

    #[test]
    fn test_cursor_stays_on_board() {
        let corner = Position::new(0, 0);
        assert_eq!(move_cursor(corner, Action::CursorUp), corner);
        assert_eq!(move_cursor(corner, Action::CursorLeft), corner);
        assert_eq!(move_cursor(corner, Action::CursorDown), Position::new(1, 0));
        let far = Position::new(8, 8);
        assert_eq!(move_cursor(far, Action::CursorDown), far);
        assert_eq!(move_cursor(far, Action::CursorRight), far);
        assert_eq!(move_cursor(far, Action::CursorLeft), Position::new(8, 7));
    }

    #[test]
    fn test_press_cursor_selects() {
        let mut app = app_with(Board::from_cells(deadlocked_cells()));
        app.apply_action(Action::CursorUp, Instant::now());
        app.apply_action(Action::PressCursor, Instant::now());
        assert_eq!(app.state.selection(), Some(Position::new(3, 4)));
    }

    #[test]
    fn test_click_moves_cursor_and_selects() {
        let mut app = app_with(Board::from_cells(deadlocked_cells()));
        let layout = BoardLayout::compute(app.area);
        app.apply_action(
            Action::PressAt(layout.board.x, layout.board.y),
            Instant::now(),
        );
        assert_eq!(app.cursor, Position::new(0, 0));
        assert_eq!(app.state.selection(), Some(Position::new(0, 0)));

        // Clicking outside the board leaves everything alone.
        app.apply_action(Action::PressAt(0, 0), Instant::now());
        assert_eq!(app.state.selection(), Some(Position::new(0, 0)));
    }

    #[test]
    fn test_restart_only_when_game_over() {
        let mut board = Board::from_cells(deadlocked_cells());
        board.set_score(40);
        let mut app = app_with(board);
        app.apply_action(Action::Restart, Instant::now());
        assert_eq!(app.state.score(), 40);

        app.state.tick(Instant::now());
        assert!(app.state.is_game_over());
        app.apply_action(Action::Restart, Instant::now());
        assert!(!app.state.is_game_over());
        assert_eq!(app.state.score(), 0);
        assert_eq!(app.state.max_score(), 40);
    }

    #[test]
    fn test_frame_rate_is_clamped() {
        use clap::Parser;
        let args = Args::parse_from(["matchtui", "--frame-rate", "0"]);
        let app = App::new(&args, &GameConfig::default(), Theme::default());
        assert_eq!(app.frame_duration, Duration::from_secs(1));
    }
}
