//! Random search for magic multipliers.

use rand::RngCore;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// Sparse 64-bit candidate: AND of three random draws keeps the bit
/// count low, which is what usable magics look like.
#[inline(always)]
pub fn random_sparse_u64<R: RngCore>(rng: &mut R) -> u64 {
    rng.next_u64() & rng.next_u64() & rng.next_u64()
}

/// A candidate is valid when no two blocker subsets with different
/// attack sets collide on the same table index.
pub fn is_magic_candidate_valid(blockers: &[u64], attacks: &[u64], magic: u64, shift: u32) -> bool {
    let mut seen: HashMap<u64, u64> = HashMap::with_capacity(blockers.len());

    for (&blocker, &attack) in blockers.iter().zip(attacks.iter()) {
        let index = blocker.wrapping_mul(magic) >> shift;
        match seen.entry(index) {
            Entry::Vacant(e) => {
                e.insert(attack);
            }
            Entry::Occupied(e) => {
                if *e.get() != attack {
                    return false;
                }
            }
        }
    }

    true
}

pub fn find_magic_number_for_square<R: RngCore>(
    blockers: &[u64],
    attacks: &[u64],
    shift: u32,
    rng: &mut R,
) -> Result<u64, String> {
    for _attempt in 0..1_000_000 {
        let magic = random_sparse_u64(rng);
        if is_magic_candidate_valid(blockers, attacks, magic, shift) {
            return Ok(magic);
        }
    }
    Err("no valid magic number found within 1,000,000 attempts".to_string())
}
