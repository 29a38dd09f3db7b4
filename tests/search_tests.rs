//! End-to-end search behavior: forced mates, hanging-piece captures,
//! terminal positions, and mate-distance scoring.

use cinder::board::{Board, Color, Piece};
use cinder::moves::magic::loader::load_magic_tables;
use cinder::search::search::{MATE, MATE_THRESHOLD, SearchResult, default_depth, think};
use cinder::search::tt::TranspositionTable;
use cinder::square::Square;
use std::str::FromStr;

fn search(fen: &str, depth: i32) -> SearchResult {
    let tables = load_magic_tables();
    let mut board = Board::from_str(fen).expect("valid FEN");
    board.enable_repetition_tracking();
    let mut tt = TranspositionTable::new(1 << 18);
    think(&mut board, &tables, &mut tt, depth, None)
}

fn best_uci(result: &SearchResult) -> String {
    result.best_move.expect("a best move").to_uci()
}

#[test]
fn finds_back_rank_mate_in_one_for_white() {
    let result = search("6k1/R7/1R6/8/8/8/8/4K3 w - - 0 1", 3);
    assert_eq!(best_uci(&result), "b6b8");
    assert_eq!(result.score, MATE - 1);
}

#[test]
fn finds_back_rank_mate_in_one_for_black() {
    let result = search("1r2k3/8/8/8/8/8/r7/5K2 b - - 0 1", 3);
    assert_eq!(best_uci(&result), "b8b1");
    assert_eq!(result.score, MATE - 1);
}

#[test]
fn finds_the_ladder_mate_in_two() {
    let result = search("6k1/8/1R6/8/8/8/R7/4K3 w - - 0 1", 5);
    let best = best_uci(&result);
    assert!(
        best == "b6b7" || best == "a2a7",
        "expected a ladder-mate move, got {}",
        best
    );
    assert_eq!(result.score, MATE - 3, "mate in two plies of our moves");
}

#[test]
fn captures_the_hanging_bishop_as_white() {
    let result = search(
        "rnbqk2r/pppp1ppp/5n2/4p3/1b2P3/2P2P2/PP1P2PP/RNBQKBNR w KQkq - 1 4",
        4,
    );
    assert_eq!(best_uci(&result), "c3b4");
}

#[test]
fn captures_the_hanging_bishop_as_black() {
    let result = search(
        "rnbqkbnr/pp1p1ppp/2p5/1B2p3/4P3/2N5/PPPP1PPP/R1BQK1NR b KQkq - 1 3",
        4,
    );
    assert_eq!(best_uci(&result), "c6b5");
}

#[test]
fn checkmated_root_reports_mate_and_no_move() {
    // Fool's mate delivered; White to move has no answer.
    let result = search(
        "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3",
        3,
    );
    assert!(result.best_move.is_none());
    assert!(
        result.score >= -MATE && result.score <= -MATE + 127,
        "mated score out of band: {}",
        result.score
    );
}

#[test]
fn stalemated_root_reports_zero() {
    let result = search("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1", 4);
    assert!(result.best_move.is_none());
    assert_eq!(result.score, 0);
}

#[test]
fn mate_scores_clear_the_mate_threshold() {
    let result = search("6k1/R7/1R6/8/8/8/8/4K3 w - - 0 1", 4);
    assert!(result.score >= MATE_THRESHOLD);
    assert_eq!(MATE - result.score, 1, "distance encoded in the score");
}

#[test]
fn king_count_violation_refuses_to_search() {
    let tables = load_magic_tables();
    let mut board = Board::new_empty();
    board.set_piece(Piece::King, Color::White, Square::from_index(4));
    board.set_piece(Piece::King, Color::White, Square::from_index(12));
    board.set_piece(Piece::King, Color::Black, Square::from_index(60));
    board.refresh_zobrist();

    let mut tt = TranspositionTable::new(1 << 12);
    let result = think(&mut board, &tables, &mut tt, 4, None);
    assert!(result.best_move.is_none());
    assert_eq!(result.score, 0);
    assert_eq!(result.nodes, 0);
}

#[test]
fn repeated_search_stays_consistent_with_a_warm_tt() {
    let tables = load_magic_tables();
    let fen = "rnbqk2r/pppp1ppp/5n2/4p3/1b2P3/2P2P2/PP1P2PP/RNBQKBNR w KQkq - 1 4";

    let mut board = Board::from_str(fen).unwrap();
    board.enable_repetition_tracking();
    let mut tt = TranspositionTable::new(1 << 18);

    let cold = think(&mut board, &tables, &mut tt, 4, None);
    let warm = think(&mut board, &tables, &mut tt, 4, None);
    assert_eq!(
        cold.best_move.map(|m| m.to_uci()),
        warm.best_move.map(|m| m.to_uci()),
        "the persistent table must not change the answer"
    );
}

#[test]
fn deeper_search_does_not_lose_the_mate() {
    // The mate must survive iterative deepening past its depth.
    let result = search("6k1/R7/1R6/8/8/8/8/4K3 w - - 0 1", 8);
    assert_eq!(best_uci(&result), "b6b8");
    assert_eq!(result.score, MATE - 1);
}

#[test]
fn default_depth_tracks_piece_count() {
    let full = Board::new();
    assert_eq!(default_depth(&full), 6, "26+ pieces searches shallower");

    let sparse = Board::from_str("6k1/R7/1R6/8/8/8/8/4K3 w - - 0 1").unwrap();
    assert_eq!(default_depth(&sparse), 8);
}

#[test]
fn promotes_when_promotion_wins() {
    let result = search("6k1/P7/5K2/8/8/8/8/8 w - - 0 1", 5);
    let best = best_uci(&result);
    assert!(
        best.starts_with("a7a8"),
        "expected the promotion push, got {}",
        best
    );
}
