//! Negamax alpha-beta with quiescence, transposition table, killer and
//! history ordering, and late-move reductions. Single-threaded and
//! cooperatively interruptible through a polled time budget.

use crate::board::{Board, Color, Piece};
use crate::moves::execute::{generate_legal, generate_legal_captures, make_move, undo_move};
use crate::moves::magic::MagicTables;
use crate::moves::square_control::in_check;
use crate::moves::types::Move;
use crate::search::context::{MAX_PLY, SearchContext};
use crate::search::eval::evaluate;
use crate::search::ordering::order_moves;
use crate::search::tt::{Bound, TranspositionTable};
use arrayvec::ArrayVec;
use std::time::{Duration, Instant};

/// Any score at least `MATE - MAX_PLY` encodes a forced mate whose
/// distance from the root is `MATE - score`.
pub const MATE: i32 = 1_000_000;
pub const INFINITY: i32 = MATE + 10_000;
pub const MATE_THRESHOLD: i32 = MATE - MAX_PLY as i32;

// Asymmetric draw contempt: a winning side dislikes repeating, a
// losing side only mildly minds it.
const WINNING_DRAW_PENALTY: i32 = 50;
const LOSING_DRAW_BONUS: i32 = 10;

// Late-move reductions: quiet non-checking moves past this index at
// sufficient depth get a reduced null-window probe first.
const LMR_MIN_DEPTH: i32 = 3;
const LMR_MOVE_THRESHOLD: usize = 4;

const TIME_CHECK_MASK: u64 = 63;

const NO_HISTORY: [[i32; 64]; 6] = [[0; 64]; 6];

pub struct SearchResult {
    pub best_move: Option<Move>,
    pub score: i32,
    pub nodes: u64,
}

/// Polled deadline. The search checks it every few dozen nodes and
/// unwinds cooperatively once `stop_signal` is set.
pub struct TimeManager {
    pub start_time: Instant,
    pub allotted: Option<Duration>,
    pub stop_signal: bool,
}

impl TimeManager {
    pub fn new(limit: Option<Duration>) -> Self {
        Self {
            start_time: Instant::now(),
            allotted: limit,
            stop_signal: false,
        }
    }

    #[inline(always)]
    pub fn check_time(&mut self) {
        if self.stop_signal {
            return;
        }
        if let Some(limit) = self.allotted
            && self.start_time.elapsed() >= limit
        {
            self.stop_signal = true;
        }
    }

    #[inline(always)]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

// Mate scores are stored in the TT relative to the storing node, not
// the root, so a cutoff at a different ply stays exact.
fn score_to_tt(score: i32, ply: i32) -> i32 {
    if score >= MATE_THRESHOLD {
        score + ply
    } else if score <= -MATE_THRESHOLD {
        score - ply
    } else {
        score
    }
}

fn score_from_tt(score: i32, ply: i32) -> i32 {
    if score >= MATE_THRESHOLD {
        score - ply
    } else if score <= -MATE_THRESHOLD {
        score + ply
    } else {
        score
    }
}

/// Contempt-adjusted draw score from the mover's point of view.
fn draw_score(board: &Board) -> i32 {
    let eval = evaluate(board);
    if eval > 0 {
        eval - WINNING_DRAW_PENALTY
    } else if eval < 0 {
        eval + LOSING_DRAW_BONUS
    } else {
        0
    }
}

/// Depth to use when the caller supplies none: shallower while the
/// board is full, deeper once material comes off.
pub fn default_depth(board: &Board) -> i32 {
    if board.piece_count() >= 26 { 6 } else { 8 }
}

#[allow(clippy::too_many_arguments)]
pub fn quiescence(
    board: &mut Board,
    tables: &MagicTables,
    ply: usize,
    mut alpha: i32,
    beta: i32,
    nodes: &mut u64,
    time: &mut TimeManager,
) -> i32 {
    *nodes += 1;
    if *nodes & TIME_CHECK_MASK == 0 {
        time.check_time();
    }
    if time.stop_signal {
        return 0;
    }

    let stand_pat = evaluate(board);
    if ply >= MAX_PLY {
        return stand_pat;
    }
    if stand_pat >= beta {
        return beta;
    }
    if stand_pat > alpha {
        alpha = stand_pat;
    }

    // Only noisy moves past the horizon: captures and promotions.
    let mut moves: ArrayVec<Move, 256> = ArrayVec::new();
    let mut scratch: ArrayVec<Move, 256> = ArrayVec::new();
    generate_legal_captures(board, tables, &mut moves, &mut scratch);
    order_moves(&mut moves, board, None, [None, None], &NO_HISTORY);

    for i in 0..moves.len() {
        let mv = moves[i];
        let undo = make_move(board, mv);
        let score = -quiescence(board, tables, ply + 1, -beta, -alpha, nodes, time);
        undo_move(board, undo);

        if time.stop_signal {
            return 0;
        }
        if score >= beta {
            return beta;
        }
        if score > alpha {
            alpha = score;
        }
    }

    alpha
}

#[allow(clippy::too_many_arguments)]
pub fn negamax(
    board: &mut Board,
    tables: &MagicTables,
    ctx: &mut SearchContext,
    tt: &mut TranspositionTable,
    depth: i32,
    ply: usize,
    mut alpha: i32,
    mut beta: i32,
    nodes: &mut u64,
    time: &mut TimeManager,
) -> i32 {
    *nodes += 1;
    if *nodes & TIME_CHECK_MASK == 0 {
        time.check_time();
    }
    if time.stop_signal {
        return 0;
    }

    if board.is_draw() {
        return draw_score(board);
    }

    if ply >= MAX_PLY {
        return evaluate(board);
    }

    let hash = board.zobrist;
    let original_alpha = alpha;
    let original_beta = beta;
    let mut tt_move = None;

    if let Some(entry) = tt.probe(hash) {
        tt_move = entry.best_move;
        if entry.depth >= depth {
            let score = score_from_tt(entry.score, ply as i32);
            match entry.bound {
                Bound::Exact => return score,
                Bound::Lower => alpha = alpha.max(score),
                Bound::Upper => beta = beta.min(score),
            }
            if alpha >= beta {
                return score;
            }
        }
    }

    // Enumerate before the horizon check so checkmate and stalemate
    // are scored exactly even at depth 0.
    let mut moves: ArrayVec<Move, 256> = ArrayVec::new();
    let mut scratch: ArrayVec<Move, 256> = ArrayVec::new();
    generate_legal(board, tables, &mut moves, &mut scratch);

    if moves.is_empty() {
        return if in_check(board, board.side_to_move, tables) {
            // Prefer shorter mates.
            -MATE + ply as i32
        } else {
            0
        };
    }

    if depth <= 0 {
        return quiescence(board, tables, ply, alpha, beta, nodes, time);
    }

    order_moves(&mut moves, board, tt_move, ctx.killers_at(ply), &ctx.history);

    let mut best_score = -INFINITY;
    let mut best_move = None;

    for (move_index, &mv) in moves.iter().enumerate() {
        let undo = make_move(board, mv);

        let mut score = 0;
        let mut needs_full_search = true;

        if depth >= LMR_MIN_DEPTH
            && move_index > LMR_MOVE_THRESHOLD
            && mv.is_quiet()
            && !in_check(board, board.side_to_move, tables)
        {
            // Reduced null-window probe; anything that beats alpha is
            // re-searched at full depth and window.
            score = -negamax(
                board,
                tables,
                ctx,
                tt,
                depth - 2,
                ply + 1,
                -alpha - 1,
                -alpha,
                nodes,
                time,
            );
            needs_full_search = score > alpha;
        }

        if needs_full_search {
            score = -negamax(
                board,
                tables,
                ctx,
                tt,
                depth - 1,
                ply + 1,
                -beta,
                -alpha,
                nodes,
                time,
            );
        }

        undo_move(board, undo);

        if time.stop_signal {
            return 0;
        }

        if score > best_score {
            best_score = score;
            best_move = Some(mv);
        }
        if score > alpha {
            alpha = score;
        }
        if alpha >= beta {
            if mv.is_quiet() {
                ctx.update_killer(ply, mv);
                ctx.update_history(mv, depth);
            }
            break;
        }
    }

    let bound = if best_score <= original_alpha {
        Bound::Upper
    } else if best_score >= original_beta {
        Bound::Lower
    } else {
        Bound::Exact
    };
    tt.store(hash, depth, score_to_tt(best_score, ply as i32), bound, best_move);

    best_score
}

fn search_root(
    board: &mut Board,
    tables: &MagicTables,
    ctx: &mut SearchContext,
    tt: &mut TranspositionTable,
    root_moves: &mut [Move],
    depth: i32,
    nodes: &mut u64,
    time: &mut TimeManager,
) -> (i32, Option<Move>, bool) {
    let mut alpha = -INFINITY;
    let beta = INFINITY;
    let hash = board.zobrist;

    let tt_move = tt.probe(hash).and_then(|entry| entry.best_move);
    order_moves(root_moves, board, tt_move, ctx.killers_at(0), &ctx.history);

    let mut best_score = -INFINITY;
    let mut best_move = None;

    for &mv in root_moves.iter() {
        let undo = make_move(board, mv);
        let score = -negamax(
            board, tables, ctx, tt, depth - 1, 1, -beta, -alpha, nodes, time,
        );
        undo_move(board, undo);

        if time.stop_signal {
            return (best_score, best_move, false);
        }

        if score > best_score {
            best_score = score;
            best_move = Some(mv);
        }
        if score > alpha {
            alpha = score;
        }
    }

    tt.store(hash, depth, score_to_tt(best_score, 0), Bound::Exact, best_move);
    (best_score, best_move, true)
}

/// Iterative-deepening root driver. Returns the best move of the last
/// fully completed depth, its score, and the node count.
pub fn think(
    board: &mut Board,
    tables: &MagicTables,
    tt: &mut TranspositionTable,
    max_depth: i32,
    time_limit: Option<Duration>,
) -> SearchResult {
    // A broken root (king count violated) is reported, not searched.
    if board.pieces(Piece::King, Color::White).count_ones() != 1
        || board.pieces(Piece::King, Color::Black).count_ones() != 1
    {
        return SearchResult {
            best_move: None,
            score: 0,
            nodes: 0,
        };
    }

    let mut ctx = SearchContext::new();
    let mut time = TimeManager::new(time_limit);
    let mut nodes = 0u64;

    let mut root_moves: Vec<Move> = Vec::with_capacity(64);
    let mut scratch: Vec<Move> = Vec::with_capacity(256);
    generate_legal(board, tables, &mut root_moves, &mut scratch);

    if root_moves.is_empty() {
        let score = if in_check(board, board.side_to_move, tables) {
            -MATE
        } else {
            0
        };
        return SearchResult {
            best_move: None,
            score,
            nodes,
        };
    }

    // The game is already drawn where we stand; report the contempt
    // score and any legal move rather than searching a dead position.
    if board.is_draw() {
        return SearchResult {
            best_move: Some(root_moves[0]),
            score: draw_score(board),
            nodes,
        };
    }

    let mut best_move = None;
    let mut best_score = 0;

    let max_depth = max_depth.clamp(1, MAX_PLY as i32);
    for depth in 1..=max_depth {
        let (score, mv, completed) = search_root(
            board,
            tables,
            &mut ctx,
            tt,
            &mut root_moves,
            depth,
            &mut nodes,
            &mut time,
        );

        // An interrupted depth is untrustworthy; keep the previous one.
        if !completed {
            break;
        }

        best_score = score;
        best_move = mv;

        if let Some(mv) = best_move {
            let score_str = if best_score.abs() >= MATE_THRESHOLD {
                let mate_in = (MATE - best_score.abs() + 1) / 2;
                if best_score > 0 {
                    format!("mate {}", mate_in)
                } else {
                    format!("mate -{}", mate_in)
                }
            } else {
                format!("cp {}", best_score)
            };
            println!(
                "info depth {} score {} nodes {} time {} pv {}",
                depth,
                score_str,
                nodes,
                time.elapsed().as_millis(),
                mv.to_uci()
            );
        }

        // A proven mate does not get better with more depth.
        if best_score.abs() >= MATE_THRESHOLD {
            break;
        }
    }

    // The clock can expire before depth 1 completes; still answer
    // with a legal move.
    if best_move.is_none() {
        best_move = root_moves.first().copied();
    }

    SearchResult {
        best_move,
        score: best_score,
        nodes,
    }
}
