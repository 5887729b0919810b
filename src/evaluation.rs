use crate::board::Board;

pub type Score = i32;

pub struct Evaluation;

impl Evaluation {
    /// Centipawn value per piece type, kings carry no material value.
    pub const PIECE_TYPE_VALUE: [Score; 6] = [100, 300, 300, 500, 900, 0];

    /// Mate sentinel, kept well below `i32::MAX` so negating it in
    /// the search can never overflow.
    pub const MATE_SCORE: Score = i32::MAX / 2;
    pub const DRAW_SCORE: Score = 0;

    /// Static material balance from the side to move's point of view.
    pub fn material(board: &Board) -> Score {
        let us = board.side_to_move();
        let mut score = 0;
        for (piece_type, bb) in board.material_iter(us) {
            score += Self::PIECE_TYPE_VALUE[piece_type as usize] * bb.pop_count() as Score;
        }
        for (piece_type, bb) in board.material_iter(us.opposite()) {
            score -= Self::PIECE_TYPE_VALUE[piece_type as usize] * bb.pop_count() as Score;
        }
        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;

    #[test]
    fn material_is_relative_to_the_side_to_move() {
        let board = Board::from_start_position();
        assert_eq!(Evaluation::material(&board), 0);

        // White is up a queen
        let white_up = Board::new("rnb1kbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1")
            .unwrap();
        assert_eq!(Evaluation::material(&white_up), 900);
        let black_view = Board::new("rnb1kbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR b KQkq - 0 1")
            .unwrap();
        assert_eq!(Evaluation::material(&black_view), -900);
    }

    #[test]
    fn mate_score_negates_safely() {
        assert!(Evaluation::MATE_SCORE.checked_neg().is_some());
        assert!((-Evaluation::MATE_SCORE).checked_neg().is_some());
    }
}
