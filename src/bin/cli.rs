//! UCI front end, plus an interactive FEN-per-line mode.

use cinder::board::{Board, Color, Piece};
use cinder::moves::execute::{generate_legal, make_move};
use cinder::moves::magic::MagicTables;
use cinder::moves::magic::loader::load_magic_tables;
use cinder::moves::perft::perft;
use cinder::moves::types::Move;
use cinder::search::search::{default_depth, think};
use cinder::search::tt::{DEFAULT_TT_ENTRIES, TTEntry, TranspositionTable};
use std::io::{self, BufRead, Write};
use std::str::FromStr;
use std::time::Duration;

const ENGINE_NAME: &str = "Cinder 0.1";
const ENGINE_AUTHOR: &str = "the Cinder authors";

fn main() {
    let interactive = std::env::args()
        .skip(1)
        .any(|arg| matches!(arg.as_str(), "-i" | "--interactive" | "interactive"));

    // Sliding-attack tables are built once and passed down by reference.
    let tables = load_magic_tables();

    if interactive {
        interactive_loop(&tables);
    } else {
        uci_loop(&tables);
    }
}

fn uci_loop(tables: &MagicTables) {
    let mut board = Board::new();
    board.enable_repetition_tracking();

    let mut tt = TranspositionTable::new(DEFAULT_TT_ENTRIES);

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l.trim().to_string(),
            Err(_) => break,
        };
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();

        match parts[0] {
            "uci" => handle_uci(),
            "isready" => println!("readyok"),
            "setoption" => handle_setoption(&parts, &mut tt),
            "ucinewgame" => {
                board = Board::new();
                board.enable_repetition_tracking();
                tt.clear();
            }
            "position" => {
                if let Some(new_board) = handle_position(&parts, tables) {
                    board = new_board;
                }
            }
            "go" => handle_go(&parts, &mut board, tables, &mut tt),
            "stop" => {
                // The search is synchronous; by the time stop arrives
                // the bestmove already went out.
            }
            "d" | "display" => {
                print!("{}", board.render());
                println!("fen: {}", board);
            }
            "fen" => println!("{}", board),
            "perft" => handle_perft(&parts, &board, tables),
            "quit" => break,
            _ => {}
        }
    }
}

fn handle_uci() {
    println!("id name {}", ENGINE_NAME);
    println!("id author {}", ENGINE_AUTHOR);
    println!("option name Hash type spin default 128 min 1 max 1024");
    println!("option name Clear Hash type button");
    println!("option name Threads type spin default 1 min 1 max 1");
    println!("uciok");
}

fn handle_setoption(parts: &[&str], tt: &mut TranspositionTable) {
    // "setoption name <name...> [value <value>]"
    if parts.len() < 3 || parts[1] != "name" {
        return;
    }
    let value_idx = parts.iter().position(|&p| p == "value");
    let name = parts[2..value_idx.unwrap_or(parts.len())].join(" ");
    let value = value_idx.and_then(|i| parts.get(i + 1)).copied();

    match name.as_str() {
        "Hash" => {
            if let Some(mb) = value.and_then(|v| v.parse::<usize>().ok()) {
                let mb = mb.clamp(1, 1024);
                let entries = mb * 1024 * 1024 / std::mem::size_of::<TTEntry>();
                *tt = TranspositionTable::new(entries.max(1));
            }
        }
        "Clear Hash" => tt.clear(),
        _ => {}
    }
}

fn handle_position(parts: &[&str], tables: &MagicTables) -> Option<Board> {
    let mut board = if parts.len() > 1 && parts[1] == "fen" {
        let fen_end = parts
            .iter()
            .position(|&p| p == "moves")
            .unwrap_or(parts.len());
        let fen_string = parts[2..fen_end].join(" ");
        match Board::from_str(&fen_string) {
            Ok(b) => b,
            Err(e) => {
                // Bad FEN: ignore the whole position command.
                eprintln!("info string {}", e);
                return None;
            }
        }
    } else {
        // "position startpos ..." and anything unrecognized.
        Board::new()
    };

    board.enable_repetition_tracking();

    // Apply the move list best-effort: unparseable or illegal moves
    // are skipped so the engine keeps playing.
    if let Some(moves_idx) = parts.iter().position(|&p| p == "moves") {
        for move_str in &parts[moves_idx + 1..] {
            match parse_uci_move(&board, move_str, tables) {
                Some(mv) => {
                    make_move(&mut board, mv);
                }
                None => {
                    eprintln!("info string skipping illegal move {}", move_str);
                }
            }
        }
    }

    Some(board)
}

/// Long algebraic to a generated legal move, or None.
fn parse_uci_move(board: &Board, move_str: &str, tables: &MagicTables) -> Option<Move> {
    let bytes = move_str.as_bytes();
    if bytes.len() < 4 {
        return None;
    }

    let from_file = bytes[0].wrapping_sub(b'a');
    let from_rank = bytes[1].wrapping_sub(b'1');
    let to_file = bytes[2].wrapping_sub(b'a');
    let to_rank = bytes[3].wrapping_sub(b'1');
    if from_file > 7 || from_rank > 7 || to_file > 7 || to_rank > 7 {
        return None;
    }

    let from = from_rank * 8 + from_file;
    let to = to_rank * 8 + to_file;

    let promotion = if bytes.len() >= 5 {
        match bytes[4] {
            b'q' => Some(Piece::Queen),
            b'r' => Some(Piece::Rook),
            b'b' => Some(Piece::Bishop),
            b'n' => Some(Piece::Knight),
            _ => return None,
        }
    } else {
        None
    };

    let mut moves = Vec::with_capacity(64);
    let mut scratch = Vec::with_capacity(256);
    let mut board_copy = board.clone();
    generate_legal(&mut board_copy, tables, &mut moves, &mut scratch);

    moves
        .into_iter()
        .find(|mv| mv.from.index() == from && mv.to.index() == to && mv.promotion == promotion)
}

fn handle_go(parts: &[&str], board: &mut Board, tables: &MagicTables, tt: &mut TranspositionTable) {
    let mut depth: Option<i32> = None;
    let mut movetime: Option<u64> = None;
    let mut wtime: Option<u64> = None;
    let mut btime: Option<u64> = None;
    let mut winc: u64 = 0;
    let mut binc: u64 = 0;
    let mut infinite = false;

    fn numeric<T: std::str::FromStr>(parts: &[&str], idx: usize) -> Option<T> {
        parts.get(idx).and_then(|v| v.parse().ok())
    }

    let mut i = 1;
    while i < parts.len() {
        match parts[i] {
            "depth" => {
                depth = numeric(parts, i + 1);
                i += 2;
            }
            "movetime" => {
                movetime = numeric(parts, i + 1);
                i += 2;
            }
            "wtime" => {
                wtime = numeric(parts, i + 1);
                i += 2;
            }
            "btime" => {
                btime = numeric(parts, i + 1);
                i += 2;
            }
            "winc" => {
                winc = numeric(parts, i + 1).unwrap_or(0);
                i += 2;
            }
            "binc" => {
                binc = numeric(parts, i + 1).unwrap_or(0);
                i += 2;
            }
            "infinite" => {
                infinite = true;
                i += 1;
            }
            _ => i += 1,
        }
    }

    // Fixed per-move budget: an explicit movetime wins, else a flat
    // slice of the clock. No heuristics beyond that.
    let time_limit = if infinite {
        None
    } else if let Some(ms) = movetime {
        Some(Duration::from_millis(ms))
    } else {
        let (my_time, my_inc) = match board.side_to_move {
            Color::White => (wtime, winc),
            Color::Black => (btime, binc),
        };
        my_time.map(|t| {
            let alloc = (t / 30 + my_inc / 2).clamp(10, t.saturating_sub(50).max(10));
            Duration::from_millis(alloc)
        })
    };

    let max_depth = depth.unwrap_or_else(|| {
        if time_limit.is_some() || infinite {
            64
        } else {
            default_depth(board)
        }
    });

    let result = think(board, tables, tt, max_depth, time_limit);

    match result.best_move {
        Some(mv) => println!("bestmove {}", mv.to_uci()),
        None => println!("bestmove 0000"),
    }
}

fn handle_perft(parts: &[&str], board: &Board, tables: &MagicTables) {
    let depth: u32 = parts
        .get(1)
        .and_then(|v| v.parse().ok())
        .unwrap_or(1)
        .min(10);

    // Perft runs without repetition bookkeeping.
    let mut b = board.clone();
    b.track_repetitions = false;
    b.repetitions.clear();

    let start = std::time::Instant::now();
    let nodes = perft(&mut b, tables, depth);
    let elapsed = start.elapsed();
    println!(
        "info string perft({}) = {} ({} ms)",
        depth,
        nodes,
        elapsed.as_millis()
    );
}

/// One FEN per line, best move out. Exits on EOF or quit.
fn interactive_loop(tables: &MagicTables) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("fen> ");
        let _ = stdout.flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "q" | "quit" | "exit") {
            break;
        }

        let mut board = match Board::from_str(line) {
            Ok(b) => b,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };
        board.enable_repetition_tracking();

        let mut tt = TranspositionTable::new(1 << 20);
        let depth = default_depth(&board);
        let result = think(&mut board, tables, &mut tt, depth, None);
        match result.best_move {
            Some(mv) => println!("best move: {} (score {})", mv.to_uci(), result.score),
            None => println!("no legal move (score {})", result.score),
        }
    }
}
