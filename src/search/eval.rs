//! Static evaluation: material plus piece-square tables, returned
//! from the side-to-move's perspective (positive = good for the mover).

use crate::board::{Board, Color, Piece};
use crate::search::psqt;
use crate::utils::pop_lsb;

/// Below this much total non-king material (both sides, centipawns)
/// the king switches to its endgame table.
const ENDGAME_MATERIAL_THRESHOLD: i32 = 2400;

const EVAL_PIECES: [Piece; 5] = [
    Piece::Pawn,
    Piece::Knight,
    Piece::Bishop,
    Piece::Rook,
    Piece::Queen,
];

/// White pieces read the tables flipped; the tables are written with
/// rank 8 first.
#[inline(always)]
fn mirror(sq: u8) -> usize {
    (sq ^ 56) as usize
}

fn table_for(piece: Piece) -> &'static [i32; 64] {
    match piece {
        Piece::Pawn => &psqt::PAWN_PSQT,
        Piece::Knight => &psqt::KNIGHT_PSQT,
        Piece::Bishop => &psqt::BISHOP_PSQT,
        Piece::Rook => &psqt::ROOK_PSQT,
        Piece::Queen => &psqt::QUEEN_PSQT,
        Piece::King => &psqt::KING_PSQT_MG,
    }
}

/// Pure function of the position; no search state involved.
pub fn evaluate(board: &Board) -> i32 {
    let mut score = 0; // from White's view until the final flip
    let mut non_king_material = 0;

    for piece in EVAL_PIECES {
        let white = board.pieces(piece, Color::White);
        let black = board.pieces(piece, Color::Black);

        let value = piece.value();
        score += value * (white.count_ones() as i32 - black.count_ones() as i32);
        non_king_material += value * (white.count_ones() + black.count_ones()) as i32;

        let table = table_for(piece);
        let mut bb = white;
        while bb != 0 {
            let sq = pop_lsb(&mut bb);
            score += table[mirror(sq)];
        }
        let mut bb = black;
        while bb != 0 {
            let sq = pop_lsb(&mut bb);
            score -= table[sq as usize];
        }
    }

    let king_table = if non_king_material < ENDGAME_MATERIAL_THRESHOLD {
        &psqt::KING_PSQT_EG
    } else {
        &psqt::KING_PSQT_MG
    };
    score += king_table[mirror(board.king_square(Color::White).index())];
    score -= king_table[board.king_square(Color::Black).index() as usize];

    match board.side_to_move {
        Color::White => score,
        Color::Black => -score,
    }
}
