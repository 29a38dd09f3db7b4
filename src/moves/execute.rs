//! Make/unmake and the legality filter.
//!
//! `make_move` mutates the board in place and returns an `Undo` that
//! `undo_move` consumes; the pair must restore the position exactly,
//! hash and repetition bookkeeping included.

use crate::board::castle_bits::*;
use crate::board::{Board, Color, Piece};
use crate::hash::zobrist::{xor_castling_rights_delta, zobrist_keys};
use crate::moves::magic::MagicTables;
use crate::moves::movegen::generate_pseudo_legal;
use crate::moves::square_control::{in_check, is_legal_castling};
use crate::moves::types::{Move, MoveBuffer, Undo};
use crate::square::Square;

/// Rook relocation keyed by the king's castling destination.
#[inline(always)]
fn rook_castle_squares(king_to: u8) -> Option<(Square, Square)> {
    match king_to {
        6 => Some((Square::from_index(7), Square::from_index(5))), // White O-O
        2 => Some((Square::from_index(0), Square::from_index(3))), // White O-O-O
        62 => Some((Square::from_index(63), Square::from_index(61))), // Black O-O
        58 => Some((Square::from_index(56), Square::from_index(59))), // Black O-O-O
        _ => None,
    }
}

/// Which right dies when a rook moves from (or is captured on) a corner.
#[inline(always)]
fn rights_cleared_by_rook(color: Color, rook_sq: u8) -> u8 {
    match (color, rook_sq) {
        (Color::White, 0) => CASTLE_WQ,  // a1
        (Color::White, 7) => CASTLE_WK,  // h1
        (Color::Black, 56) => CASTLE_BQ, // a8
        (Color::Black, 63) => CASTLE_BK, // h8
        _ => 0,
    }
}

pub fn make_move(board: &mut Board, mv: Move) -> Undo {
    let color = board.side_to_move;
    debug_assert!(
        board.piece_at(mv.from) == Some((color, mv.piece)),
        "make_move: {:?} {:?} not on {}",
        color,
        mv.piece,
        mv.from
    );

    let mut undo = Undo {
        from: mv.from,
        to: mv.to,
        piece: mv.piece,
        color,
        promotion: mv.promotion,
        capture: None,
        castling_rook: None,
        prev_castling_rights: board.castling_rights,
        prev_en_passant: board.en_passant,
        prev_halfmove_clock: board.halfmove_clock,
        prev_fullmove_number: board.fullmove_number,
        prev_hash: board.zobrist,
    };

    // Remove the captured piece. For en passant the victim sits
    // behind the target square, toward the mover.
    if mv.is_en_passant() {
        let cap_idx = match color {
            Color::White => mv.to.index() - 8,
            Color::Black => mv.to.index() + 8,
        };
        let cap_sq = Square::from_index(cap_idx);
        undo.capture = Some((color.opposite(), Piece::Pawn, cap_sq));
        board.clear_piece(Piece::Pawn, color.opposite(), cap_sq);
    } else if let Some((cap_color, cap_piece)) = board.piece_at(mv.to) {
        undo.capture = Some((cap_color, cap_piece, mv.to));
        board.clear_piece(cap_piece, cap_color, mv.to);
    }

    // Relocate the mover; promotions place the promoted piece.
    board.clear_piece(mv.piece, color, mv.from);
    board.set_piece(mv.promotion.unwrap_or(mv.piece), color, mv.to);

    // The rook accompanies a castling king atomically.
    if mv.is_castling() {
        if let Some((rook_from, rook_to)) = rook_castle_squares(mv.to.index()) {
            undo.castling_rook = Some((rook_from, rook_to));
            board.clear_piece(Piece::Rook, color, rook_from);
            board.set_piece(Piece::Rook, color, rook_to);
        }
    }

    // Castling rights: king move clears both; a rook leaving or dying
    // on its home corner clears that one.
    let mut clear_mask = 0u8;
    if mv.piece == Piece::King {
        clear_mask |= match color {
            Color::White => CASTLE_WK | CASTLE_WQ,
            Color::Black => CASTLE_BK | CASTLE_BQ,
        };
    }
    if mv.piece == Piece::Rook {
        clear_mask |= rights_cleared_by_rook(color, mv.from.index());
    }
    if let Some((cap_color, cap_piece, cap_sq)) = undo.capture
        && cap_piece == Piece::Rook
    {
        clear_mask |= rights_cleared_by_rook(cap_color, cap_sq.index());
    }
    board.castling_rights &= !clear_mask;

    // En passant target appears behind a double push, else clears.
    board.en_passant = if mv.is_double_pawn_push() {
        let behind = match color {
            Color::White => mv.from.index() + 8,
            Color::Black => mv.from.index() - 8,
        };
        Some(Square::from_index(behind))
    } else {
        None
    };

    // Clocks and side to move.
    board.halfmove_clock = if undo.capture.is_some() || mv.piece == Piece::Pawn {
        0
    } else {
        undo.prev_halfmove_clock + 1
    };
    if color == Color::Black {
        board.fullmove_number = undo.prev_fullmove_number + 1;
    }
    board.side_to_move = color.opposite();

    apply_zobrist_delta(board, &mv, &undo);

    if board.track_repetitions {
        *board.repetitions.entry(board.zobrist).or_insert(0) += 1;
    }

    #[cfg(debug_assertions)]
    {
        debug_assert_valid_ep(board);
        board.assert_hash();
        debug_assert!(board.validate().is_ok(), "{:?}", board.validate());
    }

    undo
}

/// XOR exactly the keys that changed between the pre- and post-move
/// states. `board` already holds the post-move state; `undo` holds the
/// pre-move snapshot.
fn apply_zobrist_delta(board: &mut Board, mv: &Move, undo: &Undo) {
    let keys = zobrist_keys();
    let c = undo.color as usize;
    let mut hash = board.zobrist;

    hash ^= keys.side_to_move;

    // A promotion removes a pawn and places the promoted piece.
    let piece_from = mv.piece;
    let piece_to = mv.promotion.unwrap_or(mv.piece);
    hash ^= keys.piece[c][piece_from as usize][mv.from.index() as usize];
    hash ^= keys.piece[c][piece_to as usize][mv.to.index() as usize];

    if let Some((cap_color, cap_piece, cap_sq)) = undo.capture {
        hash ^= keys.piece[cap_color as usize][cap_piece as usize][cap_sq.index() as usize];
    }

    if let Some((rook_from, rook_to)) = undo.castling_rook {
        hash ^= keys.piece[c][Piece::Rook as usize][rook_from.index() as usize];
        hash ^= keys.piece[c][Piece::Rook as usize][rook_to.index() as usize];
    }

    xor_castling_rights_delta(&mut hash, keys, undo.prev_castling_rights, board.castling_rights);

    if let Some(ep) = undo.prev_en_passant {
        hash ^= keys.ep_file[ep.file() as usize];
    }
    if let Some(ep) = board.en_passant {
        hash ^= keys.ep_file[ep.file() as usize];
    }

    board.zobrist = hash;
}

pub fn undo_move(board: &mut Board, undo: Undo) {
    // Drop the repetition entry for the hash being abandoned.
    if board.track_repetitions
        && let Some(count) = board.repetitions.get_mut(&board.zobrist)
    {
        *count -= 1;
        if *count == 0 {
            board.repetitions.remove(&board.zobrist);
        }
    }

    let color = undo.color;

    board.side_to_move = color;
    board.castling_rights = undo.prev_castling_rights;
    board.en_passant = undo.prev_en_passant;
    board.halfmove_clock = undo.prev_halfmove_clock;
    board.fullmove_number = undo.prev_fullmove_number;

    // Walk the piece back; a promotion comes off as the promoted
    // piece and returns as a pawn.
    let placed = undo.promotion.unwrap_or(undo.piece);
    board.clear_piece(placed, color, undo.to);
    board.set_piece(undo.piece, color, undo.from);

    if let Some((cap_color, cap_piece, cap_sq)) = undo.capture {
        board.set_piece(cap_piece, cap_color, cap_sq);
    }

    if let Some((rook_from, rook_to)) = undo.castling_rook {
        board.clear_piece(Piece::Rook, color, rook_to);
        board.set_piece(Piece::Rook, color, rook_from);
    }

    // The snapshot hash is the exact inverse of the make-side delta.
    board.zobrist = undo.prev_hash;

    #[cfg(debug_assertions)]
    {
        debug_assert_valid_ep(board);
        board.assert_hash();
    }
}

/// Pseudo-legal generation followed by the make/test/unmake filter:
/// a move survives iff the mover's king is not attacked afterwards.
pub fn generate_legal(
    board: &mut Board,
    tables: &MagicTables,
    moves: &mut impl MoveBuffer,
    scratch: &mut impl MoveBuffer,
) {
    scratch.clear();
    generate_pseudo_legal(board, tables, scratch);
    moves.clear();

    for i in 0..scratch.len() {
        let mv = scratch[i];
        if mv.is_castling() && !is_legal_castling(board, mv, tables) {
            continue;
        }
        let mover = board.side_to_move;
        let undo = make_move(board, mv);
        let illegal = in_check(board, mover, tables);
        undo_move(board, undo);
        if !illegal {
            moves.push(mv);
        }
    }
}

/// Legal captures and promotions only; the quiescence move set.
pub fn generate_legal_captures(
    board: &mut Board,
    tables: &MagicTables,
    moves: &mut impl MoveBuffer,
    scratch: &mut impl MoveBuffer,
) {
    scratch.clear();
    generate_pseudo_legal(board, tables, scratch);
    moves.clear();

    for i in 0..scratch.len() {
        let mv = scratch[i];
        if !mv.is_capture() && !mv.is_promotion() {
            continue;
        }
        let mover = board.side_to_move;
        let undo = make_move(board, mv);
        let illegal = in_check(board, mover, tables);
        undo_move(board, undo);
        if !illegal {
            moves.push(mv);
        }
    }
}

/// Is this pseudo-legal move actually playable?
#[inline]
pub fn is_legal_move(board: &mut Board, mv: Move, tables: &MagicTables) -> bool {
    if mv.is_castling() && !is_legal_castling(board, mv, tables) {
        return false;
    }
    let mover = board.side_to_move;
    let undo = make_move(board, mv);
    let illegal = in_check(board, mover, tables);
    undo_move(board, undo);
    !illegal
}

#[cfg(debug_assertions)]
#[inline]
pub(crate) fn debug_assert_valid_ep(board: &Board) {
    if let Some(ep) = board.en_passant {
        match board.side_to_move {
            // Black just double-pushed: the target sits on rank 6.
            Color::White => debug_assert!(
                ep.rank() == 5,
                "EP target {} should be on rank 6 when White is to move",
                ep
            ),
            // White just double-pushed: rank 3.
            Color::Black => debug_assert!(
                ep.rank() == 2,
                "EP target {} should be on rank 3 when Black is to move",
                ep
            ),
        }
    }
}
