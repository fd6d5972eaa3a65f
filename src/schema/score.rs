//! Objective score vectors used as population keys.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Ordered `(objective, value)` pairs for one candidate.
///
/// The order is the objective registration order at the time the candidate
/// was scored. Values compare with `f64::total_cmp`, so a `Score` can be used
/// as an ordered map key. `-0.0` is normalized to `0.0` on construction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<(String, f64)>", into = "Vec<(String, f64)>")]
pub struct Score {
    entries: Vec<(String, f64)>,
}

impl Score {
    /// Create an empty score.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a score from `(name, value)` pairs, keeping their order.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut score = Self::new();
        for (name, value) in pairs {
            score.push(name, value);
        }
        score
    }

    /// Append one objective value.
    pub fn push(&mut self, name: impl Into<String>, value: f64) {
        self.entries.push((name.into(), normalize(value)));
    }

    /// Number of objective values.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no objectives were scored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(name, value)` pairs in objective order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), *v))
    }

    /// Objective names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Objective values in order.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.entries.iter().map(|(_, v)| *v)
    }

    /// Look up a value by objective name.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    /// True if both scores list the same objectives in the same order.
    pub fn same_objectives(&self, other: &Score) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .zip(&other.entries)
                .all(|((a, _), (b, _))| a == b)
    }

    /// Sum of all objective values (linear scalarization for reporting).
    pub fn total(&self) -> f64 {
        self.values().sum()
    }
}

fn normalize(value: f64) -> f64 {
    if value == 0.0 { 0.0 } else { value }
}

/// Format an objective value: integral values print without a fraction.
pub fn format_value(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

impl From<Vec<(String, f64)>> for Score {
    fn from(pairs: Vec<(String, f64)>) -> Self {
        Self::from_pairs(pairs)
    }
}

impl From<Score> for Vec<(String, f64)> {
    fn from(score: Score) -> Self {
        score.entries
    }
}

impl PartialEq for Score {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Score {}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> Ordering {
        for ((an, av), (bn, bv)) in self.entries.iter().zip(&other.entries) {
            let ord = an.cmp(bn).then_with(|| av.total_cmp(bv));
            if ord != Ordering::Equal {
                return ord;
            }
        }
        self.entries.len().cmp(&other.entries.len())
    }
}

impl Hash for Score {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.entries.len().hash(state);
        for (name, value) in &self.entries {
            name.hash(state);
            value.to_bits().hash(state);
        }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", name, format_value(*value))?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_is_registration_order() {
        let score = Score::from_pairs([("b", 1.0), ("a", 2.0)]);
        let names: Vec<_> = score.names().collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(score.get("a"), Some(2.0));
        assert_eq!(score.get("missing"), None);
    }

    #[test]
    fn test_negative_zero_equals_zero() {
        let a = Score::from_pairs([("x", -0.0)]);
        let b = Score::from_pairs([("x", 0.0)]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_objectives_not_equal() {
        let a = Score::from_pairs([("x", 1.0)]);
        let b = Score::from_pairs([("y", 1.0)]);
        assert_ne!(a, b);
        assert!(!a.same_objectives(&b));
    }

    #[test]
    fn test_display_and_total() {
        let score = Score::from_pairs([("conflicts", 7.0), ("ratio", 0.5)]);
        assert_eq!(score.to_string(), "{conflicts: 7, ratio: 0.5}");
        assert!((score.total() - 7.5).abs() < 1e-12);
    }

    #[test]
    fn test_serde_roundtrip_keeps_order() {
        let score = Score::from_pairs([("z", 3.0), ("a", 1.0)]);
        let json = serde_json::to_string(&score).unwrap();
        assert_eq!(json, r#"[["z",3.0],["a",1.0]]"#);
        let back: Score = serde_json::from_str(&json).unwrap();
        assert_eq!(back, score);
    }
}
