//! Generator correctness: known move counts, castling and en-passant
//! edge cases, and a cross-check of the pseudo-legal set against a
//! square-by-square reference generator.

use cinder::board::{Board, Color, Piece};
use cinder::moves::execute::{generate_legal, generate_legal_captures};
use cinder::moves::magic::MagicTables;
use cinder::moves::magic::loader::load_magic_tables;
use cinder::moves::movegen::generate_pseudo_legal;
use cinder::moves::square_control::attacks_from;
use cinder::moves::types::Move;
use cinder::square::Square;
use std::collections::HashSet;
use std::str::FromStr;

type MoveKey = (u8, u8, Option<Piece>);

fn legal_moves(board: &mut Board, tables: &MagicTables) -> Vec<Move> {
    let mut moves = Vec::new();
    let mut scratch = Vec::with_capacity(256);
    generate_legal(board, tables, &mut moves, &mut scratch);
    moves
}

fn pseudo_keys(board: &Board, tables: &MagicTables) -> HashSet<MoveKey> {
    let mut moves: Vec<Move> = Vec::new();
    generate_pseudo_legal(board, tables, &mut moves);
    moves
        .iter()
        .map(|m| (m.from.index(), m.to.index(), m.promotion))
        .collect()
}

/// Naive reference: walk every from-square, compute its attack set a
/// piece at a time, and enumerate destinations one square at a time.
/// Deliberately a different code path from the batch generator.
fn reference_pseudo_keys(board: &Board, tables: &MagicTables) -> HashSet<MoveKey> {
    let mut keys = HashSet::new();
    let stm = board.side_to_move;
    let own = board.occupancy(stm);
    let enemy_king = board.pieces(Piece::King, stm.opposite());
    let occupied = board.occupied();

    let promos = [Piece::Queen, Piece::Rook, Piece::Bishop, Piece::Knight];

    for from in 0..64u8 {
        let sq = Square::from_index(from);
        let Some((color, piece)) = board.piece_at(sq) else {
            continue;
        };
        if color != stm {
            continue;
        }

        if piece == Piece::Pawn {
            let (fwd, home_rank, promo_rank): (i16, u8, u8) = match stm {
                Color::White => (8, 1, 7),
                Color::Black => (-8, 6, 0),
            };
            let file = sq.file();

            // Single and double pushes.
            let one = (from as i16 + fwd) as u8;
            if occupied & (1u64 << one) == 0 {
                if Square::from_index(one).rank() == promo_rank {
                    for p in promos {
                        keys.insert((from, one, Some(p)));
                    }
                } else {
                    keys.insert((from, one, None));
                }
                if sq.rank() == home_rank {
                    let two = (from as i16 + 2 * fwd) as u8;
                    if occupied & (1u64 << two) == 0 {
                        keys.insert((from, two, None));
                    }
                }
            }

            // Diagonal captures, en passant included.
            for (delta, edge_ok) in [(fwd - 1, file > 0), (fwd + 1, file < 7)] {
                if !edge_ok {
                    continue;
                }
                let to = (from as i16 + delta) as u8;
                let to_bb = 1u64 << to;
                let enemy = board.opponent_occupancy(stm) & !enemy_king;
                let is_ep = board.en_passant.map(|e| e.index()) == Some(to);
                if enemy & to_bb != 0 {
                    if Square::from_index(to).rank() == promo_rank {
                        for p in promos {
                            keys.insert((from, to, Some(p)));
                        }
                    } else {
                        keys.insert((from, to, None));
                    }
                } else if is_ep && occupied & to_bb == 0 {
                    keys.insert((from, to, None));
                }
            }
            continue;
        }

        let attacks = attacks_from(piece, color, from, occupied, tables);
        for to in 0..64u8 {
            let to_bb = 1u64 << to;
            if attacks & to_bb == 0 || own & to_bb != 0 || enemy_king & to_bb != 0 {
                continue;
            }
            keys.insert((from, to, None));
        }

        // Castling: rights plus empty squares between, as the
        // pseudo-legal generator defines it.
        if piece == Piece::King {
            let (home, ks_between, qs_between): (u8, u64, u64) = match stm {
                Color::White => (4, 0x60, 0x0E),
                Color::Black => (60, 0x6000_0000_0000_0000, 0x0E00_0000_0000_0000),
            };
            if from == home {
                if board.has_kingside_castle(stm) && occupied & ks_between == 0 {
                    keys.insert((from, home + 2, None));
                }
                if board.has_queenside_castle(stm) && occupied & qs_between == 0 {
                    keys.insert((from, home - 2, None));
                }
            }
        }
    }

    keys
}

const CROSS_CHECK_FENS: &[&str] = &[
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R b KQkq - 0 1",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
    "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
    "4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2",
];

#[test]
fn pseudo_legal_set_matches_square_by_square_reference() {
    let tables = load_magic_tables();
    for &fen in CROSS_CHECK_FENS {
        let board = Board::from_str(fen).unwrap();
        let generated = pseudo_keys(&board, &tables);
        let reference = reference_pseudo_keys(&board, &tables);

        let missing: Vec<_> = reference.difference(&generated).collect();
        let extra: Vec<_> = generated.difference(&reference).collect();
        assert!(
            missing.is_empty() && extra.is_empty(),
            "{}: missing {:?}, extra {:?}",
            fen,
            missing,
            extra
        );
    }
}

#[test]
fn startpos_has_twenty_moves() {
    let tables = load_magic_tables();
    let mut board = Board::new();
    assert_eq!(legal_moves(&mut board, &tables).len(), 20);
}

#[test]
fn kiwipete_has_fortyeight_moves() {
    let tables = load_magic_tables();
    let mut board = Board::from_str(
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    )
    .unwrap();
    assert_eq!(legal_moves(&mut board, &tables).len(), 48);
}

#[test]
fn castling_through_check_is_excluded() {
    let tables = load_magic_tables();
    // Black rook on f8 covers f1: White may not castle kingside.
    let mut board = Board::from_str("4kr2/8/8/8/8/8/8/R3K2R w KQ - 0 1").unwrap();
    let moves = legal_moves(&mut board, &tables);
    assert!(!moves.iter().any(|m| m.to_uci() == "e1g1"));
    assert!(moves.iter().any(|m| m.to_uci() == "e1c1"), "queenside is fine");
}

#[test]
fn castling_out_of_check_is_excluded() {
    let tables = load_magic_tables();
    // Black rook on e8 gives check: no castling at all.
    let mut board = Board::from_str("4r1k1/8/8/8/8/8/8/R3K2R w KQ - 0 1").unwrap();
    let moves = legal_moves(&mut board, &tables);
    assert!(!moves.iter().any(|m| m.is_castling()));
}

#[test]
fn castling_into_check_is_excluded() {
    let tables = load_magic_tables();
    // Black rook on g8 covers g1.
    let mut board = Board::from_str("6r1/8/8/8/8/8/8/4K2R w K - 0 1").unwrap();
    let moves = legal_moves(&mut board, &tables);
    assert!(!moves.iter().any(|m| m.to_uci() == "e1g1"));
}

#[test]
fn blocked_castling_is_not_emitted() {
    let tables = load_magic_tables();
    let mut board = Board::from_str("4k3/8/8/8/8/8/8/4K1NR w K - 0 1").unwrap();
    let moves = legal_moves(&mut board, &tables);
    assert!(!moves.iter().any(|m| m.is_castling()), "g1 knight blocks");
}

#[test]
fn pinned_piece_may_not_expose_the_king() {
    let tables = load_magic_tables();
    // White knight on e2 is pinned by the e8 rook against the e1 king.
    let mut board = Board::from_str("4r1k1/8/8/8/8/8/4N3/4K3 w - - 0 1").unwrap();
    let moves = legal_moves(&mut board, &tables);
    assert!(
        !moves.iter().any(|m| m.from == "e2".parse().unwrap()),
        "pinned knight must stay put"
    );
}

#[test]
fn en_passant_is_generated_and_can_be_illegal() {
    let tables = load_magic_tables();

    let mut board = Board::from_str("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2").unwrap();
    let moves = legal_moves(&mut board, &tables);
    assert!(moves.iter().any(|m| m.is_en_passant()));

    // Same shape, but a rook skewers the king along rank 5 once both
    // pawns leave: the EP capture is pseudo-legal yet illegal.
    let mut board = Board::from_str("4k3/8/8/K2pP2r/8/8/8/8 w - d6 0 2").unwrap();
    let moves = legal_moves(&mut board, &tables);
    assert!(
        !moves.iter().any(|m| m.is_en_passant()),
        "EP would expose the king along the rank"
    );
}

#[test]
fn checks_must_be_answered() {
    let tables = load_magic_tables();
    // Queen gives check on the e-file; only blocks, captures of the
    // checker, or king moves are legal.
    let mut board = Board::from_str("4k3/8/8/8/4q3/8/3P1P2/4K3 w - - 0 1").unwrap();
    for mv in legal_moves(&mut board, &tables) {
        assert!(
            mv.piece == Piece::King || mv.to.file() == 4,
            "{} does not address the check",
            mv
        );
    }
}

#[test]
fn capture_generator_is_a_subset_of_legal_moves() {
    let tables = load_magic_tables();
    for &fen in CROSS_CHECK_FENS {
        let mut board = Board::from_str(fen).unwrap();
        let all: HashSet<MoveKey> = legal_moves(&mut board, &tables)
            .iter()
            .map(|m| (m.from.index(), m.to.index(), m.promotion))
            .collect();

        let mut captures = Vec::new();
        let mut scratch = Vec::with_capacity(256);
        generate_legal_captures(&mut board, &tables, &mut captures, &mut scratch);

        for mv in &captures {
            assert!(mv.is_capture() || mv.is_promotion());
            assert!(all.contains(&(mv.from.index(), mv.to.index(), mv.promotion)));
        }
    }
}
