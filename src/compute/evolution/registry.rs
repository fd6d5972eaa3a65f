//! Named objective and agent registries.

use crate::schema::Score;

use super::rng::SearchRng;

/// Objective function: candidate to penalty (lower is better).
pub type ObjectiveFn<C> = Box<dyn Fn(&C) -> Result<f64, ObjectiveError> + Send + Sync>;

/// Agent operator: consumes drawn candidates and produces one new candidate.
///
/// The input may hold fewer candidates than the agent's arity (empty
/// population); operators must fall back to generating a fresh candidate.
pub type AgentFn<C> = Box<dyn Fn(&mut SearchRng, Vec<C>) -> C + Send + Sync>;

/// Errors raised while scoring a candidate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ObjectiveError {
    #[error("objective `{0}` returned a non-finite value")]
    NonFinite(String),
    #[error("candidate shape {actual:?} does not match problem shape {expected:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },
    #[error("division by zero in `{0}`")]
    DivisionByZero(String),
    #[error("objective panicked: {0}")]
    Panicked(String),
    #[error("{0}")]
    Other(String),
}

/// A registered agent.
pub struct AgentSpec<C> {
    pub operator: AgentFn<C>,
    /// Number of candidates drawn from the population per invocation.
    pub arity: usize,
}

/// Insertion-ordered name to value registry.
///
/// Re-registering a name replaces the value in place, keeping its original
/// position.
pub struct Registry<T> {
    entries: Vec<(String, T)>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an entry. Returns the replaced value.
    pub fn insert(&mut self, name: impl Into<String>, value: T) -> Option<T> {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((name, value));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Entry at a registration index.
    pub fn get_index(&self, index: usize) -> Option<(&str, &T)> {
        self.entries.get(index).map(|(n, v)| (n.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<C> Registry<ObjectiveFn<C>> {
    /// Evaluate every objective in registration order.
    pub fn score(&self, candidate: &C) -> Result<Score, ObjectiveError> {
        let mut score = Score::new();
        for (name, f) in &self.entries {
            let value = f(candidate)?;
            if !value.is_finite() {
                return Err(ObjectiveError::NonFinite(name.clone()));
            }
            score.push(name.as_str(), value);
        }
        Ok(score)
    }
}
