//! Random peer sampling.
//!
//! Samples stand in for full quorum checks: instead of counting messages from every
//! participant, the engine draws a small random subset of the network for each role and
//! counts only messages from its members.

use std::collections::BTreeSet;

use rand::distributions::{Distribution, Poisson};
use rand::seq::index;
use rand::Rng;

/// Draws a uniform random set of `size` distinct IDs. Requests exceeding the number of
/// available IDs are clipped; a request for zero IDs returns the empty set.
pub(crate) fn sample<N, R>(ids: &[N], size: usize, rng: &mut R) -> BTreeSet<N>
where
    N: Ord + Clone,
    R: Rng,
{
    index::sample(rng, ids.len(), size.min(ids.len()))
        .into_iter()
        .map(|i| ids[i].clone())
        .collect()
}

/// Draws a sample whose size is Poisson-distributed with the given mean, clipped to the
/// number of available IDs.
///
/// The variable fan-out around the configured mean is what gives the gossip phase its
/// probabilistic coverage; a zero-size draw is legitimate and leaves the drawing process
/// without any gossip targets of its own.
pub(crate) fn poisson_sample<N, R>(ids: &[N], mean: usize, rng: &mut R) -> BTreeSet<N>
where
    N: Ord + Clone,
    R: Rng,
{
    if mean == 0 {
        return BTreeSet::new();
    }
    let size = Poisson::new(mean as f64).sample(rng) as usize;
    sample(ids, size, rng)
}
