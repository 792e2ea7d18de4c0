//! Randomized ordering for personal decks

use rand::Rng;

/// Shuffle `items` in place with Fisher-Yates
///
/// Walks `i` from `len - 1` down to `1`, picking `j` uniformly in `[0, i]`.
pub fn fisher_yates<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}

/// Return a shuffled copy of `items`, leaving the input untouched
pub fn shuffled<T: Clone, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> Vec<T> {
    let mut out = items.to_vec();
    fisher_yates(&mut out, rng);
    out
}
