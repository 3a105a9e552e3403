//! Board lifecycle: deadlock detection, the game-over rule and restarting.

use crate::grid::{Board, SHUFFLE_COST};
use rand::Rng;

/// True if some adjacent swap would produce a match.
pub fn has_possible_moves(board: &Board) -> bool {
    Board::adjacent_pairs().any(|(a, b)| board.would_form_match(a, b))
}

/// Game over when the score is zero, or when the board is stuck and a
/// shuffle is not affordable.
pub fn is_game_over(board: &Board) -> bool {
    board.score() == 0 || (board.score() < SHUFFLE_COST && !has_possible_moves(board))
}

/// New random board for a restart. Only the best score carries over.
pub fn fresh_board<R: Rng + ?Sized>(previous: &Board, rng: &mut R) -> Board {
    let mut board = Board::random(rng);
    board.set_max_score(previous.max_score());
    board
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::tests::deadlocked_cells;
    use crate::grid::{Cell, Position, TileKind};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    /// Deadlocked board made playable: swapping (0,2)<->(1,2) lines up three 7s in row 0.
    fn playable_board() -> Board {
        let mut cells = deadlocked_cells();
        let seven = Cell::Tile(TileKind::ALL[7]);
        cells[0][0] = seven;
        cells[0][1] = seven;
        cells[1][2] = seven;
        cells[0][2] = Cell::Tile(TileKind::ALL[6]);
        Board::from_cells(cells)
    }

    #[test]
    fn test_deadlock_detected() {
        let board = Board::from_cells(deadlocked_cells());
        assert!(!has_possible_moves(&board));
        assert!(has_possible_moves(&playable_board()));
    }

    #[test]
    fn test_zero_score_is_always_game_over() {
        let board = playable_board();
        assert_eq!(board.score(), 0);
        assert!(is_game_over(&board));
    }

    #[test]
    fn test_stuck_below_floor_is_game_over() {
        let mut board = Board::from_cells(deadlocked_cells());
        board.set_score(40);
        assert!(is_game_over(&board));
    }

    #[test]
    fn test_stuck_with_affordable_shuffle_is_not_game_over() {
        let mut board = Board::from_cells(deadlocked_cells());
        board.set_score(60);
        assert!(!is_game_over(&board));
        board.set_score(50);
        assert!(!is_game_over(&board));
    }

    #[test]
    fn test_having_a_move_prevents_game_over() {
        let mut board = playable_board();
        for score in [10, 40, 50, 500] {
            board.set_score(score);
            assert!(!is_game_over(&board), "score {score}");
        }
    }

    #[test]
    fn test_fresh_board_keeps_only_max_score() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut old = playable_board();
        old.set_score(120);
        old.set(Position::new(0, 0), Cell::Empty);
        let fresh = fresh_board(&old, &mut rng);
        assert_eq!(fresh.score(), 0);
        assert_eq!(fresh.max_score(), 120);
        assert_eq!(fresh.empty_count(), 0);
    }
}
