//! Grid model: tiles, cells, match detection, swap, removal and shuffle.

use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashSet;
use tracing::debug;

/// Board is GRID_SIZE x GRID_SIZE cells.
pub const GRID_SIZE: usize = 9;

/// Minimum run length that counts as a match.
const MIN_RUN: usize = 3;

/// Score awarded per removed tile.
pub const POINTS_PER_TILE: u32 = 10;

/// Shuffling costs this much; it is also the game-over floor.
pub const SHUFFLE_COST: u32 = 50;

/// Tile kinds (fixed palette of 8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileKind {
    Ruby,
    Amber,
    Topaz,
    Jade,
    Sapphire,
    Amethyst,
    Pearl,
    Onyx,
}

impl TileKind {
    pub const ALL: [Self; 8] = [
        Self::Ruby,
        Self::Amber,
        Self::Topaz,
        Self::Jade,
        Self::Sapphire,
        Self::Amethyst,
        Self::Pearl,
        Self::Onyx,
    ];

    /// Palette index 0..8, used for theme colours.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Glyph drawn on top of the tile colour.
    pub fn glyph(self) -> char {
        match self {
            Self::Ruby => '♦',
            Self::Amber => '●',
            Self::Topaz => '▲',
            Self::Jade => '♣',
            Self::Sapphire => '■',
            Self::Amethyst => '♠',
            Self::Pearl => '○',
            Self::Onyx => '★',
        }
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

/// Single cell: either empty (only between removal and refill) or a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Tile(TileKind),
}

impl Cell {
    #[inline]
    pub fn kind(self) -> Option<TileKind> {
        match self {
            Self::Empty => None,
            Self::Tile(kind) => Some(kind),
        }
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self == Self::Empty
    }
}

/// Grid coordinate. Row 0 is the top row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Orthogonal neighbours only; a position is not adjacent to itself.
    pub fn is_adjacent(self, other: Self) -> bool {
        let dr = self.row.abs_diff(other.row);
        let dc = self.col.abs_diff(other.col);
        (dr == 1 && dc == 0) || (dr == 0 && dc == 1)
    }

    /// Right and down neighbours that are still inside the grid.
    fn forward_neighbours(self) -> impl Iterator<Item = Self> {
        let right = (self.col + 1 < GRID_SIZE).then(|| Self::new(self.row, self.col + 1));
        let down = (self.row + 1 < GRID_SIZE).then(|| Self::new(self.row + 1, self.col));
        right.into_iter().chain(down)
    }
}

/// Raw cell storage: cells[row][col].
pub type Cells = [[Cell; GRID_SIZE]; GRID_SIZE];

/// Every position that belongs to a horizontal or vertical run of 3+ equal tiles.
/// A cell in both a row run and a column run is reported once.
pub fn find_matches(cells: &Cells) -> HashSet<Position> {
    let mut matches = HashSet::new();
    for line in 0..GRID_SIZE {
        collect_runs(&mut matches, |i| Position::new(line, i), cells);
        collect_runs(&mut matches, |i| Position::new(i, line), cells);
    }
    matches
}

/// Scan one line (row or column, chosen by `at`) for runs and add their cells.
fn collect_runs(
    matches: &mut HashSet<Position>,
    at: impl Fn(usize) -> Position,
    cells: &Cells,
) {
    let kind_at = |i: usize| {
        let p = at(i);
        cells[p.row][p.col].kind()
    };
    let mut start = 0;
    while start < GRID_SIZE {
        let Some(kind) = kind_at(start) else {
            start += 1;
            continue;
        };
        let mut end = start + 1;
        while end < GRID_SIZE && kind_at(end) == Some(kind) {
            end += 1;
        }
        if end - start >= MIN_RUN {
            matches.extend((start..end).map(&at));
        }
        start = end;
    }
}

/// Playfield: the 9x9 grid plus score bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cells: Cells,
    score: u32,
    max_score: u32,
}

impl Board {
    /// Fill every cell with a random tile. Runs may exist; the cascade removes them.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut cells = [[Cell::Empty; GRID_SIZE]; GRID_SIZE];
        for row in &mut cells {
            for cell in row.iter_mut() {
                *cell = Cell::Tile(TileKind::random(rng));
            }
        }
        Self::from_cells(cells)
    }

    pub fn from_cells(cells: Cells) -> Self {
        Self {
            cells,
            score: 0,
            max_score: 0,
        }
    }

    #[inline]
    pub fn cells(&self) -> &Cells {
        &self.cells
    }

    #[inline]
    pub fn get(&self, pos: Position) -> Cell {
        self.cells[pos.row][pos.col]
    }

    #[inline]
    pub(crate) fn set(&mut self, pos: Position, cell: Cell) {
        self.cells[pos.row][pos.col] = cell;
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn max_score(&self) -> u32 {
        self.max_score
    }

    pub(crate) fn set_score(&mut self, score: u32) {
        self.score = score;
        self.max_score = self.max_score.max(score);
    }

    pub(crate) fn set_max_score(&mut self, max_score: u32) {
        self.max_score = max_score;
    }

    pub fn empty_count(&self) -> usize {
        self.cells.iter().flatten().filter(|c| c.is_empty()).count()
    }

    pub fn are_adjacent(&self, a: Position, b: Position) -> bool {
        a.is_adjacent(b)
    }

    /// Exchange two cells. No legality check; see `would_form_match`.
    pub fn swap(&mut self, a: Position, b: Position) {
        let tmp = self.get(a);
        self.set(a, self.get(b));
        self.set(b, tmp);
    }

    /// True if swapping `a` and `b` would leave at least one run on the board.
    /// Evaluated on a copy of the cells, so the board is never observed mid-swap.
    pub fn would_form_match(&self, a: Position, b: Position) -> bool {
        let mut hypothesis = self.cells;
        let tmp = hypothesis[a.row][a.col];
        hypothesis[a.row][a.col] = hypothesis[b.row][b.col];
        hypothesis[b.row][b.col] = tmp;
        !find_matches(&hypothesis).is_empty()
    }

    /// Empty every matched cell and score it. Returns false (and changes nothing)
    /// when the board has no runs.
    pub fn remove_matches(&mut self) -> bool {
        let matches = find_matches(&self.cells);
        if matches.is_empty() {
            return false;
        }
        for &pos in &matches {
            self.set(pos, Cell::Empty);
        }
        let gained = POINTS_PER_TILE * matches.len() as u32;
        self.set_score(self.score + gained);
        debug!(removed = matches.len(), gained, score = self.score, "removed matches");
        true
    }

    /// Pay SHUFFLE_COST and permute all tiles in place. Does not check that the
    /// result is match-free or has a legal move.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        if self.score < SHUFFLE_COST {
            return false;
        }
        self.score -= SHUFFLE_COST;

        let mut tiles: Vec<Cell> = self
            .cells
            .iter()
            .flatten()
            .copied()
            .filter(|c| !c.is_empty())
            .collect();
        tiles.shuffle(rng);

        let mut next = tiles.into_iter();
        for cell in self.cells.iter_mut().flatten() {
            if !cell.is_empty() {
                if let Some(tile) = next.next() {
                    *cell = tile;
                }
            }
        }
        debug!(score = self.score, "shuffled board");
        true
    }

    /// Every adjacent pair exactly once: each position with its right and down neighbour.
    pub fn adjacent_pairs() -> impl Iterator<Item = (Position, Position)> {
        (0..GRID_SIZE)
            .flat_map(|row| (0..GRID_SIZE).map(move |col| Position::new(row, col)))
            .flat_map(|p| p.forward_neighbours().map(move |q| (p, q)))
    }
}
