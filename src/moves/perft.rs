//! Perft: exhaustive legal-move tree counting, the ground truth for
//! the generator. Never enables repetition tracking.

use crate::board::Board;
use crate::moves::execute::{generate_legal, make_move, undo_move};
use crate::moves::magic::MagicTables;
use crate::moves::types::Move;
use tracing::{debug, instrument};

const MAX_PERFT_DEPTH: usize = 20;

fn make_move_buffers() -> [Vec<Move>; MAX_PERFT_DEPTH] {
    std::array::from_fn(|_| Vec::with_capacity(64))
}

fn make_scratch_buffers() -> [Vec<Move>; MAX_PERFT_DEPTH] {
    std::array::from_fn(|_| Vec::with_capacity(256))
}

fn perft_recursive(
    board: &mut Board,
    tables: &MagicTables,
    depth: u32,
    ply: usize,
    move_buffers: &mut [Vec<Move>],
    scratch_buffers: &mut [Vec<Move>],
) -> u64 {
    if depth == 0 {
        return 1;
    }

    {
        let moves = &mut move_buffers[ply];
        let scratch = &mut scratch_buffers[ply];
        generate_legal(board, tables, moves, scratch);
    }

    if depth == 1 {
        // Leaves need no make/unmake, only the count.
        return move_buffers[ply].len() as u64;
    }

    let move_count = move_buffers[ply].len();
    let mut nodes = 0;

    for i in 0..move_count {
        let mv = move_buffers[ply][i];

        #[cfg(debug_assertions)]
        let hash_before = board.zobrist;

        let undo = make_move(board, mv);
        nodes += perft_recursive(board, tables, depth - 1, ply + 1, move_buffers, scratch_buffers);
        undo_move(board, undo);

        #[cfg(debug_assertions)]
        debug_assert_eq!(board.zobrist, hash_before, "hash changed across make/unmake");
    }

    nodes
}

#[instrument(skip(board, tables), fields(depth))]
pub fn perft(board: &mut Board, tables: &MagicTables, depth: u32) -> u64 {
    assert!(
        depth as usize <= MAX_PERFT_DEPTH,
        "depth {} exceeds MAX_PERFT_DEPTH {}",
        depth,
        MAX_PERFT_DEPTH
    );

    let mut move_buffers = make_move_buffers();
    let mut scratch_buffers = make_scratch_buffers();

    perft_recursive(board, tables, depth, 0, &mut move_buffers, &mut scratch_buffers)
}

/// Perft split by root move, printed one `move: count` line at a time.
#[instrument(skip(board, tables), fields(depth))]
pub fn perft_divide(board: &mut Board, tables: &MagicTables, depth: u32) -> u64 {
    assert!(
        depth as usize <= MAX_PERFT_DEPTH && depth >= 1,
        "perft_divide depth {} out of range",
        depth
    );

    let mut move_buffers = make_move_buffers();
    let mut scratch_buffers = make_scratch_buffers();

    {
        let moves = &mut move_buffers[0];
        let scratch = &mut scratch_buffers[0];
        generate_legal(board, tables, moves, scratch);
        debug!(depth, moves = moves.len(), "divide: root legal moves");
    }

    let move_count = move_buffers[0].len();
    let mut total = 0;

    for i in 0..move_count {
        let mv = move_buffers[0][i];
        let undo = make_move(board, mv);
        let count = perft_recursive(
            board,
            tables,
            depth - 1,
            1,
            &mut move_buffers,
            &mut scratch_buffers,
        );
        undo_move(board, undo);

        debug!(%mv, nodes = count, "divide: root child total");
        println!("{}: {}", mv, count);
        total += count;
    }

    println!("Total: {}", total);
    total
}
