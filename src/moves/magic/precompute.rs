//! Offline construction of the magic lookup tables: relevant-occupancy
//! masks, blocker subset enumeration, and per-square table filling.

use super::attacks::{get_bishop_attack_bitboards, get_rook_attack_bitboards};
use super::search::find_magic_number_for_square;
use super::structs::{BishopMagicTables, MagicEntry, MagicTables, RookMagicTables};
use rand::RngCore;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Seed policy for the magic-number search. Fixed seeds make table
/// generation reproducible; Random is available for re-rolling magics.
#[derive(Debug, Clone, Copy)]
pub enum MagicTableSeed {
    Fixed(u64),
    Random,
}

fn make_rng(seed: MagicTableSeed) -> StdRng {
    match seed {
        MagicTableSeed::Fixed(s) => StdRng::seed_from_u64(s),
        MagicTableSeed::Random => {
            let mut bytes = [0u8; 32];
            rand::rng().fill_bytes(&mut bytes);
            StdRng::from_seed(bytes)
        }
    }
}

/// Rook relevant-occupancy mask: ray squares excluding board edges
/// (a blocker on the edge cannot shorten the attack set).
pub fn rook_mask(square: usize) -> u64 {
    let rank = (square / 8) as isize;
    let file = (square % 8) as isize;
    let mut mask = 0u64;

    let mut r = rank + 1;
    while r <= 6 {
        mask |= 1u64 << (r * 8 + file);
        r += 1;
    }
    let mut r = rank - 1;
    while r >= 1 {
        mask |= 1u64 << (r * 8 + file);
        r -= 1;
    }
    let mut f = file + 1;
    while f <= 6 {
        mask |= 1u64 << (rank * 8 + f);
        f += 1;
    }
    let mut f = file - 1;
    while f >= 1 {
        mask |= 1u64 << (rank * 8 + f);
        f -= 1;
    }

    mask
}

/// Bishop relevant-occupancy mask, edges excluded.
pub fn bishop_mask(square: usize) -> u64 {
    let rank = (square / 8) as isize;
    let file = (square % 8) as isize;
    let mut mask = 0u64;

    let (mut r, mut f) = (rank + 1, file + 1);
    while r <= 6 && f <= 6 {
        mask |= 1u64 << (r * 8 + f);
        r += 1;
        f += 1;
    }
    let (mut r, mut f) = (rank - 1, file - 1);
    while r >= 1 && f >= 1 {
        mask |= 1u64 << (r * 8 + f);
        r -= 1;
        f -= 1;
    }
    let (mut r, mut f) = (rank + 1, file - 1);
    while r <= 6 && f >= 1 {
        mask |= 1u64 << (r * 8 + f);
        r += 1;
        f -= 1;
    }
    let (mut r, mut f) = (rank - 1, file + 1);
    while r >= 1 && f <= 6 {
        mask |= 1u64 << (r * 8 + f);
        r -= 1;
        f += 1;
    }

    mask
}

/// All subsets of `mask` via the carry-rippler trick.
pub fn blocker_subsets(mask: u64) -> Vec<u64> {
    let mut subsets = Vec::with_capacity(1usize << mask.count_ones());
    let mut subset = 0u64;
    loop {
        subsets.push(subset);
        subset = subset.wrapping_sub(mask) & mask;
        if subset == 0 {
            break;
        }
    }
    subsets
}

fn build_entry(
    mask: u64,
    blockers: &[u64],
    attacks: &[u64],
    rng: &mut StdRng,
) -> Result<MagicEntry, String> {
    let bits = mask.count_ones();
    let shift = 64 - bits;

    let magic = find_magic_number_for_square(blockers, attacks, shift, rng)?;

    let mut table = vec![0u64; 1usize << bits];
    for (&blocker, &attack) in blockers.iter().zip(attacks.iter()) {
        let index = (blocker.wrapping_mul(magic) >> shift) as usize;
        debug_assert!(
            table[index] == 0 || table[index] == attack,
            "magic collision with differing attacks"
        );
        table[index] = attack;
    }

    Ok(MagicEntry {
        magic,
        shift,
        mask,
        table: table.into_boxed_slice(),
    })
}

pub fn generate_magic_tables(seed: MagicTableSeed) -> Result<MagicTables, String> {
    let mut rng = make_rng(seed);

    let mut rook_entries = Vec::with_capacity(64);
    let mut bishop_entries = Vec::with_capacity(64);

    for square in 0..64 {
        let mask = rook_mask(square);
        let blockers = blocker_subsets(mask);
        let attacks = get_rook_attack_bitboards(square, &blockers);
        rook_entries.push(
            build_entry(mask, &blockers, &attacks, &mut rng)
                .map_err(|e| format!("rook square {}: {}", square, e))?,
        );

        let mask = bishop_mask(square);
        let blockers = blocker_subsets(mask);
        let attacks = get_bishop_attack_bitboards(square, &blockers);
        bishop_entries.push(
            build_entry(mask, &blockers, &attacks, &mut rng)
                .map_err(|e| format!("bishop square {}: {}", square, e))?,
        );
    }

    Ok(MagicTables {
        rook: RookMagicTables {
            entries: rook_entries,
        },
        bishop: BishopMagicTables {
            entries: bishop_entries,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rook_mask_excludes_edges() {
        // d4: file d between ranks 2..7, rank 4 between files b..g.
        let mask = rook_mask(27);
        assert_eq!(mask.count_ones(), 10);
        assert_eq!(mask & 0xFF, 0, "rank 1 excluded");
        assert_eq!(mask & 0xFF00_0000_0000_0000, 0, "rank 8 excluded");
    }

    #[test]
    fn rook_mask_corner() {
        // a1: six squares up the a-file, six along rank 1.
        assert_eq!(rook_mask(0).count_ones(), 12);
    }

    #[test]
    fn bishop_mask_center_and_corner() {
        assert_eq!(bishop_mask(27).count_ones(), 9); // d4
        assert_eq!(bishop_mask(0).count_ones(), 6); // a1
    }

    #[test]
    fn subsets_enumerate_the_full_power_set() {
        let mask = 0b1010_0100u64;
        let subsets = blocker_subsets(mask);
        assert_eq!(subsets.len(), 8);
        for &s in &subsets {
            assert_eq!(s & !mask, 0, "subset leaks outside the mask");
        }
        assert!(subsets.contains(&0));
        assert!(subsets.contains(&mask));
    }
}
