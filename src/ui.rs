//! Layout and drawing: header with score and shuffle button, board, animations, game over.
//!
//! Everything here only reads `GameState`. Easing curves are applied to the
//! engine's linear progress values and never fed back.

use crate::game::{GameState, Phase, Target};
use crate::grid::{GRID_SIZE, Position, SHUFFLE_COST, TileKind};
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Position as ScreenPos, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget};
use std::time::{Duration, Instant};
use tachyonfx::{Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx};

/// Terminal cells per board cell. The last column and the lower half of the
/// second row are left as spacing.
pub const CELL_WIDTH: u16 = 4;
pub const CELL_HEIGHT: u16 = 2;
const TILE_WIDTH: i32 = 3;

const BOARD_WIDTH: u16 = GRID_SIZE as u16 * CELL_WIDTH;
const BOARD_HEIGHT: u16 = GRID_SIZE as u16 * CELL_HEIGHT;
const HEADER_HEIGHT: u16 = 3;
const HELP_HEIGHT: u16 = 1;

const SHUFFLE_LABEL: &str = "[ Shuffle -50 ]";
const HELP_TEXT: &str = "↔↕ move  ⏎ press  S shuffle  Q quit";

/// Board dims out over this long once the game is over.
const GAME_OVER_FADE_MS: u32 = 600;

/// Screen geometry shared by drawing and pointer hit testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardLayout {
    pub header: Rect,
    /// Board including its border.
    pub frame: Rect,
    /// Tile area only.
    pub board: Rect,
    pub shuffle: Rect,
    pub help: Rect,
}

impl BoardLayout {
    /// Centre header, board and help line in `area`.
    pub fn compute(area: Rect) -> Self {
        let (total_w, total_h) = Self::size();
        let x = area.x + area.width.saturating_sub(total_w) / 2;
        let y = area.y + area.height.saturating_sub(total_h) / 2;
        let header = Rect::new(x, y, total_w, HEADER_HEIGHT);
        let frame = Rect::new(x, y + HEADER_HEIGHT, total_w, BOARD_HEIGHT + 2);
        let board = Rect::new(frame.x + 1, frame.y + 1, BOARD_WIDTH, BOARD_HEIGHT);
        let label_w = SHUFFLE_LABEL.chars().count() as u16;
        let shuffle = Rect::new(header.right() - 2 - label_w, header.y + 1, label_w, 1);
        let help = Rect::new(x, frame.bottom(), total_w, HELP_HEIGHT);
        Self {
            header,
            frame,
            board,
            shuffle,
            help,
        }
    }

    /// Minimum terminal size (columns, rows).
    pub fn size() -> (u16, u16) {
        (
            BOARD_WIDTH + 2,
            HEADER_HEIGHT + BOARD_HEIGHT + 2 + HELP_HEIGHT,
        )
    }

    pub fn fits(area: Rect) -> bool {
        let (w, h) = Self::size();
        area.width >= w && area.height >= h
    }

    /// Map a screen coordinate to the button or a board cell. Anything else is `None`.
    pub fn hit(&self, column: u16, row: u16) -> Option<Target> {
        let p = ScreenPos::new(column, row);
        if self.shuffle.contains(p) {
            return Some(Target::Shuffle);
        }
        if !self.board.contains(p) {
            return None;
        }
        Some(Target::Cell(Position::new(
            usize::from((row - self.board.y) / CELL_HEIGHT),
            usize::from((column - self.board.x) / CELL_WIDTH),
        )))
    }

    /// Top-left screen coordinate of a (possibly fractional, possibly off-grid) cell.
    fn origin(&self, row: f32, col: f32) -> (i32, i32) {
        (
            i32::from(self.board.x) + (col * f32::from(CELL_WIDTH)).round() as i32,
            i32::from(self.board.y) + (row * f32::from(CELL_HEIGHT)).round() as i32,
        )
    }
}

/// Bounce-out: overshoots the floor three times before settling at 1.
pub fn ease_out_bounce(t: f32) -> f32 {
    const N1: f32 = 7.5625;
    const D1: f32 = 2.75;
    let t = t.clamp(0.0, 1.0);
    if t < 1.0 / D1 {
        N1 * t * t
    } else if t < 2.0 / D1 {
        let t = t - 1.5 / D1;
        N1 * t * t + 0.75
    } else if t < 2.5 / D1 {
        let t = t - 2.25 / D1;
        N1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / D1;
        N1 * t * t + 0.984_375
    }
}

/// Quadratic ease-in-out.
pub fn ease_in_out_quad(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

/// Horizontal shake in columns: fast sine, fading out over the shake duration.
pub fn shake_offset(elapsed: Duration, duration: Duration) -> i32 {
    if duration.is_zero() || elapsed >= duration {
        return 0;
    }
    let t = elapsed.as_secs_f32();
    let fade = 1.0 - t / duration.as_secs_f32();
    ((t * 40.0).sin() * 2.0 * fade).round() as i32
}

/// Draw one frame. `cursor` is the keyboard cursor; the game-over fade is kept
/// in `game_over_fx` across frames.
pub fn draw(
    frame: &mut Frame,
    state: &GameState,
    theme: &Theme,
    cursor: Position,
    now: Instant,
    game_over_fx: &mut Option<Effect>,
    game_over_fx_time: &mut Option<Instant>,
) {
    let area = frame.area();
    if !BoardLayout::fits(area) {
        draw_too_small(frame, theme, area);
        return;
    }
    let layout = BoardLayout::compute(area);

    draw_header(frame, state, theme, &layout);
    draw_board(frame.buffer_mut(), state, theme, &layout, cursor, now);
    let help = match state.phase() {
        Phase::Selected(_) => "Pick a neighbour to swap with",
        Phase::Shaking(_) => "No match there",
        _ => HELP_TEXT,
    };
    Paragraph::new(Line::from(Span::styled(
        help,
        Style::default().fg(theme.inactive_fg),
    )))
    .alignment(Alignment::Center)
    .render(layout.help, frame.buffer_mut());

    if state.is_game_over() {
        apply_game_over_fade(frame, theme, &layout, game_over_fx, game_over_fx_time, now);
        draw_game_over(frame, state, theme, &layout);
    }
}

fn draw_too_small(frame: &mut Frame, theme: &Theme, area: Rect) {
    let (w, h) = BoardLayout::size();
    let style = Style::default().fg(theme.main_fg);
    Paragraph::new(vec![
        Line::from(Span::styled("Too small", style)),
        Line::from(Span::styled(format!("need {w}x{h}"), style)),
    ])
    .alignment(Alignment::Center)
    .render(area, frame.buffer_mut());
}

fn draw_header(frame: &mut Frame, state: &GameState, theme: &Theme, layout: &BoardLayout) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(" Matchtui ", theme.title));
    let inner = block.inner(layout.header);
    block.render(layout.header, frame.buffer_mut());

    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    Paragraph::new(Line::from(vec![
        Span::styled("Score ", title_style),
        Span::styled(state.score().to_string(), fg_style),
        Span::styled("  Best ", title_style),
        Span::styled(state.max_score().to_string(), fg_style),
    ]))
    .render(inner, frame.buffer_mut());

    let enabled = state.score() >= SHUFFLE_COST && !state.is_busy() && !state.is_game_over();
    let button_style = if enabled {
        Style::default()
            .fg(theme.bg)
            .bg(theme.title)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.inactive_fg).bg(theme.bg)
    };
    frame.buffer_mut().set_string(
        layout.shuffle.x,
        layout.shuffle.y,
        SHUFFLE_LABEL,
        button_style,
    );
}

fn draw_board(
    buf: &mut Buffer,
    state: &GameState,
    theme: &Theme,
    layout: &BoardLayout,
    cursor: Position,
    now: Instant,
) {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .style(Style::default().bg(theme.bg))
        .render(layout.frame, buf);

    let board = state.board();
    let shake = state.shake().copied();
    let selection = state.selection();

    // Static tiles: everything not currently borrowed by an animation.
    for (row, line) in board.cells().iter().enumerate() {
        for (col, cell) in line.iter().enumerate() {
            let pos = Position::new(row, col);
            let Some(kind) = cell.kind() else {
                continue;
            };
            if state.is_animating(pos) {
                continue;
            }
            let (mut x, y) = layout.origin(row as f32, col as f32);
            if let Some(shake) = shake.filter(|s| s.pos == pos) {
                x += shake_offset(shake.elapsed(now), state.shake_duration());
            }
            let face = if selection == Some(pos) {
                theme.highlight
            } else {
                theme.tile_color(kind)
            };
            paint_tile(buf, layout.board, x, y, kind, face, theme);
        }
    }

    for fall in state.falls() {
        let eased = ease_out_bounce(fall.progress);
        let row = fall.from_row as f32 + (fall.to_row as f32 - fall.from_row as f32) * eased;
        let (x, y) = layout.origin(row, fall.col as f32);
        paint_tile(buf, layout.board, x, y, fall.kind, theme.tile_color(fall.kind), theme);
    }

    // Each tile travels from the other endpoint to where the grid now holds it.
    if let Some(swap) = state.swap() {
        let t = ease_in_out_quad(swap.progress(now, state.swap_duration()));
        for (to, from) in [(swap.a, swap.b), (swap.b, swap.a)] {
            let Some(kind) = board.get(to).kind() else {
                continue;
            };
            let row = from.row as f32 + (to.row as f32 - from.row as f32) * t;
            let col = from.col as f32 + (to.col as f32 - from.col as f32) * t;
            let (x, y) = layout.origin(row, col);
            paint_tile(buf, layout.board, x, y, kind, theme.tile_color(kind), theme);
        }
    }

    if !state.is_game_over() {
        let (x, y) = layout.origin(cursor.row as f32, cursor.col as f32);
        for dx in 0..TILE_WIDTH {
            if let Some(cell) = cell_in(buf, layout.board, x + dx, y) {
                cell.set_style(Style::default().add_modifier(Modifier::REVERSED));
            }
        }
    }
}

/// Buffer cell at (x, y) if it lies inside `clip`.
fn cell_in(buf: &mut Buffer, clip: Rect, x: i32, y: i32) -> Option<&mut ratatui::buffer::Cell> {
    let inside = x >= i32::from(clip.x)
        && y >= i32::from(clip.y)
        && x < i32::from(clip.right())
        && y < i32::from(clip.bottom());
    if !inside {
        return None;
    }
    buf.cell_mut((x as u16, y as u16))
}

/// A tile is a glyph row on the tile colour, with a half-block lip below it.
fn paint_tile(buf: &mut Buffer, clip: Rect, x: i32, y: i32, kind: TileKind, face: Color, theme: &Theme) {
    for dx in 0..TILE_WIDTH {
        let glyph = if dx == 1 { kind.glyph() } else { ' ' };
        if let Some(cell) = cell_in(buf, clip, x + dx, y) {
            cell.set_char(glyph)
                .set_style(Style::default().fg(theme.bg).bg(face));
        }
        if let Some(cell) = cell_in(buf, clip, x + dx, y + 1) {
            cell.set_char('▀')
                .set_style(Style::default().fg(face).bg(theme.bg));
        }
    }
}

/// Dim the board with a TachyonFX fade once the game ends.
fn apply_game_over_fade(
    frame: &mut Frame,
    theme: &Theme,
    layout: &BoardLayout,
    game_over_fx: &mut Option<Effect>,
    game_over_fx_time: &mut Option<Instant>,
    now: Instant,
) {
    let delta = game_over_fx_time
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(Duration::ZERO);
    let delta_ms = delta.as_millis().min(u128::from(u32::MAX)) as u32;
    *game_over_fx_time = Some(now);

    let effect = game_over_fx.get_or_insert_with(|| {
        fx::fade_to(
            theme.inactive_fg,
            theme.bg,
            (GAME_OVER_FADE_MS, Interpolation::QuadOut),
        )
        .with_area(layout.board)
    });
    frame.render_effect(effect, layout.board, TfxDuration::from_millis(delta_ms));
}

fn draw_game_over(frame: &mut Frame, state: &GameState, theme: &Theme, layout: &BoardLayout) {
    let popup_w = 28u16;
    let popup_h = 8u16;
    let popup = Rect {
        x: layout.frame.x + layout.frame.width.saturating_sub(popup_w) / 2,
        y: layout.frame.y + layout.frame.height.saturating_sub(popup_h) / 2,
        width: popup_w.min(layout.frame.width),
        height: popup_h.min(layout.frame.height),
    };
    let fg = Style::default().fg(theme.main_fg);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Game Over ",
            Style::default().fg(Color::White).bg(Color::Red),
        )),
        Line::from(""),
        Line::from(Span::styled(format!(" Score: {} ", state.score()), fg)),
        Line::from(Span::styled(
            format!(" Best: {} ", state.max_score()),
            Style::default().fg(theme.title).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            " Click or R to restart ",
            Style::default().fg(theme.inactive_fg),
        )),
    ];
    Clear.render(popup, frame.buffer_mut());
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
                .style(Style::default().bg(theme.bg)),
        )
        .render(popup, frame.buffer_mut());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GameConfig;
    use crate::grid::Board;
    use crate::grid::tests::deadlocked_cells;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn layout() -> BoardLayout {
        BoardLayout::compute(Rect::new(0, 0, 80, 24))
    }

    fn screen_text(buf: &Buffer) -> String {
        buf.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn test_layout_fits_standard_terminal() {
        assert!(BoardLayout::fits(Rect::new(0, 0, 80, 24)));
        assert!(!BoardLayout::fits(Rect::new(0, 0, 30, 24)));
        let l = layout();
        assert_eq!(l.board.width, 36);
        assert_eq!(l.board.height, 18);
        assert!(l.help.bottom() <= 24);
        assert!(l.shuffle.right() < l.header.right());
    }

    #[test]
    fn test_hit_maps_cells_corners() {
        let l = layout();
        let b = l.board;
        assert_eq!(l.hit(b.x, b.y), Some(Target::Cell(Position::new(0, 0))));
        assert_eq!(
            l.hit(b.x + CELL_WIDTH - 1, b.y + CELL_HEIGHT - 1),
            Some(Target::Cell(Position::new(0, 0)))
        );
        assert_eq!(
            l.hit(b.x + CELL_WIDTH, b.y + 2 * CELL_HEIGHT),
            Some(Target::Cell(Position::new(2, 1)))
        );
        assert_eq!(
            l.hit(b.right() - 1, b.bottom() - 1),
            Some(Target::Cell(Position::new(8, 8)))
        );
    }

    #[test]
    fn test_hit_button_and_outside() {
        let l = layout();
        assert_eq!(l.hit(l.shuffle.x, l.shuffle.y), Some(Target::Shuffle));
        assert_eq!(l.hit(l.shuffle.right() - 1, l.shuffle.y), Some(Target::Shuffle));
        assert_eq!(l.hit(l.board.right(), l.board.y), None);
        assert_eq!(l.hit(l.frame.x, l.frame.y), None);
        assert_eq!(l.hit(0, 0), None);
        assert_eq!(l.hit(l.help.x, l.help.y), None);
    }

    #[test]
    fn test_easing_endpoints() {
        assert!(ease_out_bounce(0.0).abs() < 1e-6);
        assert!((ease_out_bounce(1.0) - 1.0).abs() < 1e-4);
        assert!(ease_in_out_quad(0.0).abs() < 1e-6);
        assert!((ease_in_out_quad(0.5) - 0.5).abs() < 1e-6);
        assert!((ease_in_out_quad(1.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_shake_settles() {
        let d = Duration::from_millis(500);
        assert_eq!(shake_offset(Duration::ZERO, d), 0);
        assert_eq!(shake_offset(d, d), 0);
        assert!(shake_offset(Duration::from_millis(40), d).abs() <= 2);
    }

    #[test]
    fn test_draw_renders_header_and_game_over() {
        let mut board = Board::from_cells(deadlocked_cells());
        board.set_score(40);
        let config = GameConfig {
            seed: Some(1),
            ..GameConfig::default()
        };
        let mut state = GameState::with_board(board, &config);
        let theme = Theme::default();
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        let mut fx = None;
        let mut fx_time = None;
        let now = Instant::now();

        terminal
            .draw(|f| draw(f, &state, &theme, Position::new(0, 0), now, &mut fx, &mut fx_time))
            .unwrap();
        let text = screen_text(terminal.backend().buffer());
        assert!(text.contains("Score"));
        assert!(text.contains("Shuffle"));
        assert!(text.contains(TileKind::Ruby.glyph()));
        assert!(!text.contains("Game Over"));

        state.press(Some(Target::Cell(Position::new(2, 2))), now);
        terminal
            .draw(|f| draw(f, &state, &theme, Position::new(0, 0), now, &mut fx, &mut fx_time))
            .unwrap();
        assert!(screen_text(terminal.backend().buffer()).contains("neighbour"));

        state.tick(now);
        assert!(state.is_game_over());
        terminal
            .draw(|f| draw(f, &state, &theme, Position::new(0, 0), now, &mut fx, &mut fx_time))
            .unwrap();
        let text = screen_text(terminal.backend().buffer());
        assert!(text.contains("Game Over"));
        assert!(fx.is_some());
    }

    #[test]
    fn test_draw_small_terminal_does_not_panic() {
        let state = GameState::with_board(Board::from_cells(deadlocked_cells()), &GameConfig::default());
        let theme = Theme::default();
        let mut terminal = Terminal::new(TestBackend::new(20, 10)).unwrap();
        let (mut fx, mut fx_time) = (None, None);
        terminal
            .draw(|f| draw(f, &state, &theme, Position::new(0, 0), Instant::now(), &mut fx, &mut fx_time))
            .unwrap();
        let text = screen_text(terminal.backend().buffer());
        assert!(text.contains("small"));
    }
}
