//! Deterministic row sampling
//!
//! Attribution cost grows with the number of explained rows, so tables
//! above a configurable cap are subsampled once per run with a fixed seed.

use super::FeatureTable;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Subsample a feature table to at most `cap` rows.
///
/// Draws uniformly without replacement from a seeded RNG, so a given
/// (table, cap, seed) triple always yields the same subset. Tables at or
/// below the cap are returned unchanged.
pub fn sample_rows(table: &FeatureTable, cap: usize, seed: u64) -> FeatureTable {
    let n = table.n_rows();
    if n <= cap {
        return table.clone();
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let indices = rand::seq::index::sample(&mut rng, n, cap).into_vec();
    table.select_rows(&indices)
}
