//! Sorting without a sorting algorithm: evolve a list toward ascending order
//! by random swaps.

use rand::Rng;

use crate::compute::evolution::{Evo, ObjectiveError, SearchRng};

/// Sum of the drops between adjacent elements. Zero iff ascending.
pub fn unsorted(list: &[i64]) -> f64 {
    list.windows(2)
        .filter(|w| w[1] < w[0])
        .map(|w| (w[0] - w[1]) as f64)
        .sum()
}

/// Sum of the first half over the sum of the elements after the midpoint,
/// rounded to 5 decimals. The midpoint element is in neither half.
pub fn sumratio(list: &[i64]) -> Result<f64, ObjectiveError> {
    let mid = list.len() / 2;
    let head: i64 = list[..mid].iter().sum();
    let tail: i64 = list.get(mid + 1..).unwrap_or(&[]).iter().sum();
    if tail == 0 {
        return Err(ObjectiveError::DivisionByZero("sumratio".to_string()));
    }
    Ok(round5(head as f64 / tail as f64))
}

fn round5(value: f64) -> f64 {
    (value * 1e5).round() / 1e5
}

/// Swap two random positions (possibly the same one).
pub fn swapper(rng: &mut SearchRng, picks: Vec<Vec<i64>>) -> Vec<i64> {
    let Some(mut list) = picks.into_iter().next() else {
        return Vec::new();
    };
    if list.is_empty() {
        return list;
    }
    let i = rng.gen_range(0..list.len());
    let j = rng.gen_range(0..list.len());
    list.swap(i, j);
    list
}

/// Register `unsorted`, `sumratio` and `swapper`.
pub fn register(evo: &mut Evo<Vec<i64>>) {
    evo.add_objective("unsorted", |l: &Vec<i64>| unsorted(l));
    evo.add_fallible_objective("sumratio", |l: &Vec<i64>| sumratio(l));
    evo.add_agent("swapper", swapper, 1);
}

/// `len` values drawn uniformly from `1..100`.
pub fn random_list(rng: &mut SearchRng, len: usize) -> Vec<i64> {
    (0..len).map(|_| rng.gen_range(1..100)).collect()
}
