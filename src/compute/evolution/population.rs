//! Population store: the working set of candidates keyed by score.

use std::collections::BTreeMap;
use std::collections::btree_map;

use crate::schema::Score;

use super::dominance::non_dominated_mask;
use super::rng::SearchRng;

/// Candidates keyed by their objective score.
///
/// At most one candidate is kept per distinct score: inserting a candidate
/// whose score equals an existing key replaces the stored candidate.
/// Iteration follows score order, which keeps sampling reproducible.
#[derive(Debug, Clone)]
pub struct Population<C> {
    members: BTreeMap<Score, C>,
}

impl<C> Default for Population<C> {
    fn default() -> Self {
        Self {
            members: BTreeMap::new(),
        }
    }
}

impl<C> Population<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a candidate under an already computed score.
    ///
    /// Returns the candidate previously stored under the same score.
    pub fn insert_scored(&mut self, score: Score, candidate: C) -> Option<C> {
        self.members.insert(score, candidate)
    }

    pub fn get(&self, score: &Score) -> Option<&C> {
        self.members.get(score)
    }

    pub fn contains(&self, score: &Score) -> bool {
        self.members.contains_key(score)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn scores(&self) -> impl Iterator<Item = &Score> {
        self.members.keys()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, Score, C> {
        self.members.iter()
    }

    pub fn clear(&mut self) {
        self.members.clear();
    }

    /// Remove every dominated candidate. Returns the number removed.
    pub fn remove_dominated(&mut self) -> usize {
        let keys: Vec<&Score> = self.members.keys().collect();
        let keep = non_dominated_mask(&keys);
        let doomed: Vec<Score> = keys
            .into_iter()
            .zip(keep)
            .filter(|(_, k)| !k)
            .map(|(s, _)| s.clone())
            .collect();

        for score in &doomed {
            self.members.remove(score);
        }
        doomed.len()
    }

    /// Candidate with the lowest summed score. Ties go to the first in score order.
    pub fn best_by_total(&self) -> Option<(&Score, &C)> {
        self.members
            .iter()
            .fold(None, |best: Option<(&Score, &C)>, (s, c)| match best {
                Some((b, _)) if b.total() <= s.total() => best,
                _ => Some((s, c)),
            })
    }
}

impl<C: Clone> Population<C> {
    /// Draw `k` independent copies uniformly at random, with replacement.
    ///
    /// Returns an empty vector when the population is empty.
    pub fn sample(&self, k: usize, rng: &mut SearchRng) -> Vec<C> {
        if self.members.is_empty() {
            return Vec::new();
        }
        let all: Vec<&C> = self.members.values().collect();
        (0..k).map(|_| all[rng.index(all.len())].clone()).collect()
    }
}

impl<C> IntoIterator for Population<C> {
    type Item = (Score, C);
    type IntoIter = btree_map::IntoIter<Score, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.into_iter()
    }
}

impl<'a, C> IntoIterator for &'a Population<C> {
    type Item = (&'a Score, &'a C);
    type IntoIter = btree_map::Iter<'a, Score, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}

impl<C> FromIterator<(Score, C)> for Population<C> {
    fn from_iter<I: IntoIterator<Item = (Score, C)>>(iter: I) -> Self {
        Self {
            members: iter.into_iter().collect(),
        }
    }
}
