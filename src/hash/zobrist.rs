use crate::board::castle_bits::*;
use once_cell::sync::OnceCell;
use rand::{RngCore, SeedableRng, rngs::StdRng};

/// Fixed seed: hashes must be reproducible across runs and platforms
/// so search results and tests are deterministic.
const ZOBRIST_SEED: u64 = 0x9E37_79B9_AAAC_5C87;

pub struct ZobristKeys {
    /// `[color][piece][square]` with {White=0, Black=1} and {P,N,B,R,Q,K}={0..5}.
    pub piece: [[[u64; 64]; 6]; 2],
    /// XORed in when Black is to move.
    pub side_to_move: u64,
    /// `[0]=K, [1]=Q, [2]=k, [3]=q` (bit order K,Q,k,q).
    pub castling: [u64; 4],
    /// a..h => 0..7. In the hash whenever the en-passant square is set.
    pub ep_file: [u64; 8],
}

/// XOR in the castling keys for every right that differs between `old` and `new`.
#[inline]
pub fn xor_castling_rights_delta(hash: &mut u64, keys: &ZobristKeys, old: u8, new: u8) {
    let d = old ^ new;
    if d & CASTLE_WK != 0 {
        *hash ^= keys.castling[0];
    }
    if d & CASTLE_WQ != 0 {
        *hash ^= keys.castling[1];
    }
    if d & CASTLE_BK != 0 {
        *hash ^= keys.castling[2];
    }
    if d & CASTLE_BQ != 0 {
        *hash ^= keys.castling[3];
    }
}

/// Process-wide keys, generated on first use.
pub fn zobrist_keys() -> &'static ZobristKeys {
    static KEYS: OnceCell<ZobristKeys> = OnceCell::new();
    KEYS.get_or_init(|| generate_zobrist_keys(StdRng::seed_from_u64(ZOBRIST_SEED)))
}

fn generate_zobrist_keys(mut rng: StdRng) -> ZobristKeys {
    #[inline]
    fn non_zero(r: &mut StdRng) -> u64 {
        // avoid zero keys to reduce degenerate collisions
        let mut v = r.next_u64();
        while v == 0 {
            v = r.next_u64();
        }
        v
    }

    let mut keys = ZobristKeys {
        piece: [[[0u64; 64]; 6]; 2],
        side_to_move: 0,
        castling: [0u64; 4],
        ep_file: [0u64; 8],
    };

    for c in 0..2 {
        for p in 0..6 {
            for sq in 0..64 {
                keys.piece[c][p][sq] = non_zero(&mut rng);
            }
        }
    }

    for i in 0..4 {
        keys.castling[i] = non_zero(&mut rng);
    }

    for f in 0..8 {
        keys.ep_file[f] = non_zero(&mut rng);
    }

    keys.side_to_move = non_zero(&mut rng);

    keys
}
