//! FEN parsing and serialization.
//!
//! Rejects malformed input with `FenError` instead of panicking; the
//! UCI adapter drops the offending `position` command and keeps going.

use super::fen_tables::{CHAR_TO_PC, piece_char};
use super::{Board, CASTLE_BK, CASTLE_BQ, CASTLE_WK, CASTLE_WQ, Color, Piece};
use crate::square::Square;
use std::fmt;

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// A rejected FEN string, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FenError(String);

impl FenError {
    pub fn new(reason: impl Into<String>) -> Self {
        FenError(reason.into())
    }

    pub fn reason(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid FEN: {}", self.0)
    }
}

impl std::error::Error for FenError {}

impl Board {
    /// Parse a six-field FEN into this board.
    ///
    /// On error the board is left cleared, not half-parsed.
    pub fn set_fen(&mut self, fen: &str) -> Result<(), FenError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() != 6 {
            return Err(FenError::new(format!(
                "expected 6 fields, got {}",
                fields.len()
            )));
        }

        let placement = fields[0];
        let side = fields[1];
        let castling = fields[2];
        let ep = fields[3];
        let halfmove = fields[4];
        let fullmove = fields[5];

        // Wipe before placing; a failed parse must not leave old pieces.
        self.piece_bb = [[0u64; 6]; 2];
        self.occ = [0u64; 3];
        self.en_passant = None;

        self.parse_placement(placement)?;

        self.side_to_move = match side {
            "w" => Color::White,
            "b" => Color::Black,
            _ => return Err(FenError::new(format!("side to move must be w or b, got {:?}", side))),
        };

        self.castling_rights = parse_castling(castling)?;
        self.en_passant = parse_en_passant(ep)?;

        self.halfmove_clock = halfmove
            .parse::<u32>()
            .map_err(|_| FenError::new(format!("bad halfmove clock {:?}", halfmove)))?;
        self.fullmove_number = fullmove
            .parse::<u32>()
            .map_err(|_| FenError::new(format!("bad fullmove number {:?}", fullmove)))?;
        if self.fullmove_number < 1 {
            return Err(FenError::new("fullmove number must be at least 1"));
        }

        self.recompute_occupancy();
        self.refresh_zobrist();
        self.reset_repetitions();
        Ok(())
    }

    fn parse_placement(&mut self, placement: &str) -> Result<(), FenError> {
        let rows: Vec<&str> = placement.split('/').collect();
        if rows.len() != 8 {
            return Err(FenError::new(format!(
                "placement must have 8 rows, got {}",
                rows.len()
            )));
        }

        let mut white_kings = 0;
        let mut black_kings = 0;

        // FEN lists rank 8 first.
        for (row_idx, row) in rows.iter().enumerate() {
            let rank = 7 - row_idx as u8;
            let mut file: u8 = 0;

            for c in row.chars() {
                if let Some(d) = c.to_digit(10) {
                    if d < 1 || d > 8 {
                        return Err(FenError::new(format!("bad empty-run digit {}", d)));
                    }
                    file += d as u8;
                } else {
                    let Some(&Some((piece, color))) = CHAR_TO_PC.get(c as usize) else {
                        return Err(FenError::new(format!("unknown piece glyph {:?}", c)));
                    };
                    if file >= 8 {
                        return Err(FenError::new("row overflows 8 files"));
                    }
                    if piece == Piece::Pawn && (rank == 0 || rank == 7) {
                        return Err(FenError::new("pawn on first or last rank"));
                    }
                    if piece == Piece::King {
                        match color {
                            Color::White => white_kings += 1,
                            Color::Black => black_kings += 1,
                        }
                    }
                    self.set_piece(piece, color, Square::from_file_rank(file, rank));
                    file += 1;
                }
            }

            if file != 8 {
                return Err(FenError::new(format!(
                    "row {} sums to {} files, expected 8",
                    8 - rank,
                    file
                )));
            }
        }

        if white_kings != 1 {
            return Err(FenError::new(format!("expected 1 white king, got {}", white_kings)));
        }
        if black_kings != 1 {
            return Err(FenError::new(format!("expected 1 black king, got {}", black_kings)));
        }
        Ok(())
    }

    /// Serialize the current position as a six-field FEN.
    pub fn to_fen(&self) -> String {
        let mut fen = String::with_capacity(80);

        for rank in (0..8u8).rev() {
            let mut empty = 0;
            for file in 0..8u8 {
                let sq = Square::from_file_rank(file, rank);
                match self.piece_at(sq) {
                    Some((color, piece)) => {
                        if empty > 0 {
                            fen.push((b'0' + empty) as char);
                            empty = 0;
                        }
                        fen.push(piece_char(piece, color));
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                fen.push((b'0' + empty) as char);
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        fen.push(' ');
        fen.push(match self.side_to_move {
            Color::White => 'w',
            Color::Black => 'b',
        });

        fen.push(' ');
        if self.castling_rights == 0 {
            fen.push('-');
        } else {
            if self.has_castling(CASTLE_WK) {
                fen.push('K');
            }
            if self.has_castling(CASTLE_WQ) {
                fen.push('Q');
            }
            if self.has_castling(CASTLE_BK) {
                fen.push('k');
            }
            if self.has_castling(CASTLE_BQ) {
                fen.push('q');
            }
        }

        fen.push(' ');
        match self.en_passant {
            Some(sq) => fen.push_str(&sq.to_string()),
            None => fen.push('-'),
        }

        fen.push_str(&format!(" {} {}", self.halfmove_clock, self.fullmove_number));
        fen
    }
}

fn parse_castling(castling: &str) -> Result<u8, FenError> {
    if castling == "-" {
        return Ok(0);
    }
    if castling.is_empty() {
        return Err(FenError::new("empty castling field"));
    }
    let mut rights = 0u8;
    for c in castling.chars() {
        rights |= match c {
            'K' => CASTLE_WK,
            'Q' => CASTLE_WQ,
            'k' => CASTLE_BK,
            'q' => CASTLE_BQ,
            _ => return Err(FenError::new(format!("bad castling letter {:?}", c))),
        };
    }
    Ok(rights)
}

fn parse_en_passant(ep: &str) -> Result<Option<Square>, FenError> {
    if ep == "-" {
        return Ok(None);
    }
    let sq: Square = ep
        .parse()
        .map_err(|_| FenError::new(format!("bad en-passant square {:?}", ep)))?;
    // Only the landing rank of a double push is ever a target.
    if sq.rank() != 2 && sq.rank() != 5 {
        return Err(FenError::new(format!(
            "en-passant square {} not on rank 3 or 6",
            sq
        )));
    }
    Ok(Some(sq))
}
