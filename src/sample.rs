//! Reproducible illustrative sampling for display
//!
//! Never feeds estimation: the sample only chooses which posterior
//! intervals get printed or plotted.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Draw up to `size` distinct items without replacement, deterministically
/// for a given `seed`.
///
/// The result preserves the input order of the chosen items so that a
/// sorted input yields a sorted sample.
#[must_use]
pub fn illustrative_sample<T>(items: &[T], size: usize, seed: u64) -> Vec<&T> {
    if size >= items.len() {
        return items.iter().collect();
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let indices: Vec<usize> = (0..items.len()).collect();
    let mut chosen: Vec<usize> = indices
        .choose_multiple(&mut rng, size)
        .copied()
        .collect();
    chosen.sort_unstable();
    chosen.into_iter().map(|i| &items[i]).collect()
}
