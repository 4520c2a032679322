//! Uniform random selection over the eligible sea.
//!
//! Every eligible bottle has the same probability of being drawn: no
//! recency bias and no weighting by `pick_count`.

use rand::Rng;

/// Pick one element uniformly at random, or `None` for an empty slice.
pub fn pick_uniform<'a, T, R>(items: &'a [T], rng: &mut R) -> Option<&'a T>
where
    R: Rng + ?Sized,
{
    if items.is_empty() {
        return None;
    }
    let idx = rng.random_range(0..items.len());
    items.get(idx)
}
