//! The evolution loop: agent scheduling, scoring, pruning and checkpoint sync.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::checkpoint::{self, Checkpoint};
use crate::schema::{ConfigError, EvolveConfig, Score};

use super::population::Population;
use super::registry::{AgentFn, AgentSpec, ObjectiveError, ObjectiveFn, Registry};
use super::rng::SearchRng;

/// A failure the loop recovered from.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// A freshly produced candidate could not be scored and was discarded.
    ScoringFailed {
        iteration: u64,
        agent: String,
        error: ObjectiveError,
    },
    /// An agent operator panicked; no candidate was produced.
    AgentPanicked {
        iteration: u64,
        agent: String,
        message: String,
    },
    /// The checkpoint could not be read; treated as empty.
    CheckpointReadFailed { error: String },
    /// The checkpoint could not be written; the run continues.
    CheckpointWriteFailed { error: String },
}

/// Receiver for recovered failures.
pub type DiagnosticSink = Box<dyn FnMut(&Diagnostic)>;

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// The iteration budget was used up.
    Budget,
    /// The wall-clock limit was reached.
    TimeLimit,
}

/// Summary of one `evolve` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolveStats {
    /// Iterations started (agents invoked).
    pub iterations: u64,
    pub stop_reason: StopReason,
    /// Candidates dropped because the agent panicked or scoring failed.
    pub discarded: u64,
    /// Completed merge-prune-write cycles.
    pub checkpoint_syncs: u64,
    /// Checkpoint reads or writes that failed.
    pub checkpoint_failures: u64,
    /// Population size after the final prune.
    pub population_size: usize,
    pub elapsed_seconds: f64,
}

/// Errors that abort `evolve`.
#[derive(Debug, thiserror::Error)]
pub enum EvolveError {
    #[error("invalid evolve configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("no agents registered")]
    NoAgents,
    #[error("candidate from agent `{agent}` failed scoring at iteration {iteration}: {error}")]
    ScoringFailed {
        iteration: u64,
        agent: String,
        error: ObjectiveError,
    },
    #[error("agent `{agent}` panicked at iteration {iteration}: {message}")]
    AgentPanicked {
        iteration: u64,
        agent: String,
        message: String,
    },
}

/// Multi-objective evolutionary search engine.
///
/// Candidates are opaque: the engine only clones them and hands them to the
/// registered objectives and agents. The population keeps one candidate per
/// distinct score and is pruned to its non-dominated subset as the loop runs.
pub struct Evo<C> {
    objectives: Registry<ObjectiveFn<C>>,
    agents: Registry<AgentSpec<C>>,
    population: Population<C>,
    rng: SearchRng,
    checkpoint: Option<Box<dyn Checkpoint<C>>>,
    diagnostics: Option<DiagnosticSink>,
}

impl<C: Clone> Default for Evo<C> {
    fn default() -> Self {
        Self::with_rng(SearchRng::random())
    }
}

impl<C: Clone> Evo<C> {
    /// Create an engine with an entropy-seeded generator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with a seeded generator.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(SearchRng::new(seed))
    }

    /// Create an engine around an existing generator.
    pub fn with_rng(rng: SearchRng) -> Self {
        Self {
            objectives: Registry::new(),
            agents: Registry::new(),
            population: Population::new(),
            rng,
            checkpoint: None,
            diagnostics: None,
        }
    }

    /// Attach a shared checkpoint store.
    pub fn with_checkpoint<K: Checkpoint<C> + 'static>(mut self, checkpoint: K) -> Self {
        self.checkpoint = Some(Box::new(checkpoint));
        self
    }

    /// Receive every recovered failure.
    pub fn with_diagnostics<F: FnMut(&Diagnostic) + 'static>(mut self, sink: F) -> Self {
        self.diagnostics = Some(Box::new(sink));
        self
    }

    /// Register (or replace) an infallible objective.
    ///
    /// Only candidates scored after this call see the new objective; stored
    /// scores are not recomputed.
    pub fn add_objective<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&C) -> f64 + Send + Sync + 'static,
    {
        self.objectives.insert(name, Box::new(move |c: &C| Ok(f(c))));
    }

    /// Register (or replace) an objective that may fail.
    pub fn add_fallible_objective<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&C) -> Result<f64, ObjectiveError> + Send + Sync + 'static,
    {
        self.objectives.insert(name, Box::new(f));
    }

    /// Register (or replace) an agent drawing `arity` candidates per call.
    ///
    /// Arity is not checked against what the operator expects.
    pub fn add_agent<F>(&mut self, name: impl Into<String>, operator: F, arity: usize)
    where
        F: Fn(&mut SearchRng, Vec<C>) -> C + Send + Sync + 'static,
    {
        let operator: AgentFn<C> = Box::new(operator);
        self.agents.insert(name, AgentSpec { operator, arity });
    }

    /// Score a candidate against the current objectives and store it.
    pub fn add_solution(&mut self, candidate: C) -> Result<Score, ObjectiveError> {
        let score = self.objectives.score(&candidate)?;
        self.population.insert_scored(score.clone(), candidate);
        Ok(score)
    }

    /// Score a batch of candidates in parallel and store them in input order.
    ///
    /// Nothing is stored if any candidate fails to score.
    pub fn seed_batch(&mut self, candidates: Vec<C>) -> Result<usize, ObjectiveError>
    where
        C: Send + Sync,
    {
        let objectives = &self.objectives;
        let scores: Vec<Score> = candidates
            .par_iter()
            .map(|c| objectives.score(c))
            .collect::<Result<_, _>>()?;

        let count = candidates.len();
        for (score, candidate) in scores.into_iter().zip(candidates) {
            self.population.insert_scored(score, candidate);
        }
        Ok(count)
    }

    /// Draw `k` independent copies from the population.
    pub fn sample(&mut self, k: usize) -> Vec<C> {
        self.population.sample(k, &mut self.rng)
    }

    /// Prune dominated candidates. Returns the number removed.
    pub fn remove_dominated(&mut self) -> usize {
        self.population.remove_dominated()
    }

    pub fn population(&self) -> &Population<C> {
        &self.population
    }

    pub fn into_population(self) -> Population<C> {
        self.population
    }

    pub fn rng_mut(&mut self) -> &mut SearchRng {
        &mut self.rng
    }

    pub fn objective_names(&self) -> impl Iterator<Item = &str> {
        self.objectives.names()
    }

    pub fn agent_names(&self) -> impl Iterator<Item = &str> {
        self.agents.names()
    }

    /// The candidate with the lowest summed penalty (reporting only).
    pub fn best_by_total(&self) -> Option<(&Score, &C)> {
        self.population.best_by_total()
    }

    /// Run up to `config.iterations` agent invocations.
    ///
    /// Each iteration picks a random agent, feeds it sampled candidates,
    /// scores the result and stores it. Every `dom_interval` iterations the
    /// population is pruned; every `sync_interval` iterations it is merged
    /// with the checkpoint store, pruned and written back. Both fire on
    /// iteration 0. A final prune always runs before returning.
    pub fn evolve(&mut self, config: &EvolveConfig) -> Result<EvolveStats, EvolveError> {
        config.validate()?;
        if self.agents.is_empty() && config.iterations > 0 {
            return Err(EvolveError::NoAgents);
        }

        let start = Instant::now();
        let time_limit = config.time_limit()?;

        let mut stats = EvolveStats {
            iterations: 0,
            stop_reason: StopReason::Budget,
            discarded: 0,
            checkpoint_syncs: 0,
            checkpoint_failures: 0,
            population_size: 0,
            elapsed_seconds: 0.0,
        };

        let mut i = 0u64;
        stats.stop_reason = loop {
            if i >= config.iterations {
                break StopReason::Budget;
            }
            if let Some(limit) = time_limit
                && start.elapsed() >= limit
            {
                info!(
                    "Time limit of {:.1}s reached after {} iterations",
                    limit.as_secs_f64(),
                    i
                );
                break StopReason::TimeLimit;
            }

            let pick = self.rng.index(self.agents.len());
            stats.iterations += 1;
            if !self.run_agent(pick, i, config.strict)? {
                stats.discarded += 1;
            }

            if i % config.dom_interval == 0 {
                self.population.remove_dominated();
                info!(
                    "Generation {}: population size = {}, elapsed = {:.1}s",
                    i,
                    self.population.len(),
                    start.elapsed().as_secs_f64()
                );
            }

            if i % config.sync_interval == 0 {
                self.sync_checkpoint(&mut stats);
            }

            i += 1;
        };

        self.population.remove_dominated();
        stats.population_size = self.population.len();
        stats.elapsed_seconds = start.elapsed().as_secs_f64();

        info!(
            "Evolution completed in {:.2} seconds with {} solutions",
            stats.elapsed_seconds, stats.population_size
        );
        Ok(stats)
    }

    /// Run the agent at `index` once. Returns false if its candidate was discarded.
    fn run_agent(&mut self, index: usize, iteration: u64, strict: bool) -> Result<bool, EvolveError> {
        let Some((name, spec)) = self.agents.get_index(index) else {
            return Ok(false);
        };
        let agent = name.to_string();

        let picks = self.population.sample(spec.arity, &mut self.rng);
        let rng = &mut self.rng;
        let produced = panic::catch_unwind(AssertUnwindSafe(|| (spec.operator)(rng, picks)));

        let candidate = match produced {
            Ok(candidate) => candidate,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                if strict {
                    return Err(EvolveError::AgentPanicked {
                        iteration,
                        agent,
                        message,
                    });
                }
                debug!("Agent {} panicked at iteration {}: {}", agent, iteration, message);
                emit(
                    &mut self.diagnostics,
                    Diagnostic::AgentPanicked {
                        iteration,
                        agent,
                        message,
                    },
                );
                return Ok(false);
            }
        };

        let objectives = &self.objectives;
        let scored = panic::catch_unwind(AssertUnwindSafe(|| objectives.score(&candidate)))
            .unwrap_or_else(|payload| {
                Err(ObjectiveError::Panicked(panic_message(payload.as_ref())))
            });

        match scored {
            Ok(score) => {
                self.population.insert_scored(score, candidate);
                Ok(true)
            }
            Err(error) if strict => Err(EvolveError::ScoringFailed {
                iteration,
                agent,
                error,
            }),
            Err(error) => {
                debug!(
                    "Discarded candidate from {} at iteration {}: {}",
                    agent, iteration, error
                );
                emit(
                    &mut self.diagnostics,
                    Diagnostic::ScoringFailed {
                        iteration,
                        agent,
                        error,
                    },
                );
                Ok(false)
            }
        }
    }

    /// Merge the checkpoint into memory, prune, and write the result back.
    fn sync_checkpoint(&mut self, stats: &mut EvolveStats) {
        let Some(store) = self.checkpoint.as_deref() else {
            self.population.remove_dominated();
            return;
        };

        match checkpoint::merge(store, &mut self.population) {
            Ok(merged) => debug!("Merged {} checkpoint entries", merged),
            Err(e) => {
                warn!("Checkpoint read failed, continuing without it: {}", e);
                stats.checkpoint_failures += 1;
                emit(
                    &mut self.diagnostics,
                    Diagnostic::CheckpointReadFailed {
                        error: e.to_string(),
                    },
                );
            }
        }

        self.population.remove_dominated();

        if let Err(e) = store.store(&self.population) {
            warn!("Checkpoint write failed: {}", e);
            stats.checkpoint_failures += 1;
            emit(
                &mut self.diagnostics,
                Diagnostic::CheckpointWriteFailed {
                    error: e.to_string(),
                },
            );
            return;
        }
        stats.checkpoint_syncs += 1;
    }
}

fn emit(sink: &mut Option<DiagnosticSink>, diagnostic: Diagnostic) {
    if let Some(sink) = sink.as_mut() {
        sink(&diagnostic);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl<C> fmt::Display for Evo<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Population size: {}", self.population.len())?;
        writeln!(f, "{}", "=".repeat(50))?;
        for (count, score) in self.population.scores().enumerate() {
            if count >= 5 {
                writeln!(
                    f,
                    "... and {} more solutions",
                    self.population.len() - 5
                )?;
                break;
            }
            writeln!(f, "{}", score)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::{FileCheckpoint, MemoryCheckpoint};
    use rand::Rng;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Two conflicting objectives over a pair of integers.
    fn pair_engine(seed: u64) -> Evo<(i32, i32)> {
        let mut evo = Evo::with_seed(seed);
        evo.add_objective("x", |c: &(i32, i32)| c.0 as f64);
        evo.add_objective("y", |c: &(i32, i32)| c.1 as f64);
        evo.add_objective("sum_gap", |c: &(i32, i32)| ((c.0 + c.1) - 10).abs() as f64);
        evo.add_agent(
            "nudge",
            |rng: &mut SearchRng, picks: Vec<(i32, i32)>| {
                let (x, y) = picks.first().copied().unwrap_or((10, 10));
                (x + rng.gen_range(-2..=2), y + rng.gen_range(-2..=2))
            },
            1,
        );
        evo
    }

    fn config(iterations: u64) -> EvolveConfig {
        EvolveConfig {
            iterations,
            dom_interval: 10,
            sync_interval: 50,
            time_limit_secs: None,
            random_seed: None,
            strict: false,
        }
    }

    #[test]
    fn test_zero_iterations_only_prunes() {
        let mut evo = pair_engine(1);
        evo.add_solution((1, 1)).unwrap();
        evo.add_solution((2, 2)).unwrap();
        evo.add_solution((5, 5)).unwrap();

        let stats = evo.evolve(&config(0)).unwrap();
        assert_eq!(stats.iterations, 0);
        assert_eq!(stats.stop_reason, StopReason::Budget);

        // Smaller x/y means a larger sum_gap, so no point dominates another.
        assert_eq!(evo.population().len(), 3);
    }

    #[test]
    fn test_zero_iterations_removes_dominated() {
        let mut evo: Evo<(i32, i32)> = Evo::with_seed(1);
        evo.add_objective("x", |c: &(i32, i32)| c.0 as f64);
        evo.add_objective("y", |c: &(i32, i32)| c.1 as f64);
        evo.add_solution((1, 1)).unwrap();
        evo.add_solution((2, 2)).unwrap();

        evo.evolve(&config(0)).unwrap();
        assert_eq!(evo.population().len(), 1);
        assert!(evo.population().get(&Score::from_pairs([("x", 1.0), ("y", 1.0)])).is_some());
    }

    #[test]
    fn test_zero_time_limit_runs_no_agent() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let mut evo: Evo<i32> = Evo::with_seed(3);
        evo.add_objective("v", |c: &i32| *c as f64);
        evo.add_agent(
            "count",
            move |_: &mut SearchRng, _: Vec<i32>| {
                counter.fetch_add(1, Ordering::Relaxed);
                0
            },
            0,
        );

        let stats = evo
            .evolve(&EvolveConfig {
                time_limit_secs: Some(0.0),
                ..config(1000)
            })
            .unwrap();

        assert_eq!(stats.stop_reason, StopReason::TimeLimit);
        assert_eq!(stats.iterations, 0);
        assert_eq!(calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_budget_respected() {
        let mut evo = pair_engine(5);
        let stats = evo.evolve(&config(200)).unwrap();
        assert_eq!(stats.iterations, 200);
        assert_eq!(stats.stop_reason, StopReason::Budget);
        assert!(!evo.population().is_empty());
    }

    #[test]
    fn test_final_population_is_non_dominated() {
        let mut evo = pair_engine(11);
        evo.evolve(&config(500)).unwrap();

        let scores: Vec<&Score> = evo.population().scores().collect();
        for a in &scores {
            for b in &scores {
                assert!(!crate::compute::evolution::dominates(a, b));
            }
        }
    }

    #[test]
    fn test_same_seed_same_result() {
        let mut a = pair_engine(42);
        let mut b = pair_engine(42);
        a.evolve(&config(300)).unwrap();
        b.evolve(&config(300)).unwrap();

        let sa: Vec<_> = a.population().iter().collect();
        let sb: Vec<_> = b.population().iter().collect();
        assert_eq!(sa, sb);
    }

    #[test]
    fn test_scoring_failure_discarded_and_reported() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);

        let mut evo: Evo<i32> = Evo::with_seed(7).with_diagnostics(move |d| {
            sink.borrow_mut().push(d.clone());
        });
        evo.add_fallible_objective("v", |c: &i32| {
            if *c < 0 {
                Err(ObjectiveError::Other("negative".to_string()))
            } else {
                Ok(*c as f64)
            }
        });
        evo.add_agent("negative", |_: &mut SearchRng, _: Vec<i32>| -1, 0);

        let stats = evo.evolve(&config(5)).unwrap();
        assert_eq!(stats.discarded, 5);
        assert!(evo.population().is_empty());
        assert_eq!(seen.borrow().len(), 5);
        assert!(matches!(
            &seen.borrow()[0],
            Diagnostic::ScoringFailed { iteration: 0, agent, .. } if agent == "negative"
        ));
    }

    #[test]
    fn test_strict_mode_surfaces_failure() {
        let mut evo: Evo<i32> = Evo::with_seed(7);
        evo.add_fallible_objective("v", |_: &i32| Err(ObjectiveError::Other("boom".into())));
        evo.add_agent("any", |_: &mut SearchRng, _: Vec<i32>| 1, 0);

        let result = evo.evolve(&EvolveConfig {
            strict: true,
            ..config(5)
        });
        assert!(matches!(
            result,
            Err(EvolveError::ScoringFailed { iteration: 0, .. })
        ));
    }

    #[test]
    fn test_panicking_agent_does_not_stop_loop() {
        let mut evo: Evo<i32> = Evo::with_seed(9);
        evo.add_objective("v", |c: &i32| *c as f64);
        evo.add_agent(
            "explode",
            |_: &mut SearchRng, _: Vec<i32>| -> i32 { panic!("agent failure") },
            0,
        );

        let stats = evo.evolve(&config(3)).unwrap();
        assert_eq!(stats.iterations, 3);
        assert_eq!(stats.discarded, 3);
    }

    #[test]
    fn test_no_agents_is_error() {
        let mut evo: Evo<i32> = Evo::with_seed(0);
        evo.add_objective("v", |c: &i32| *c as f64);
        assert!(matches!(
            evo.evolve(&config(1)),
            Err(EvolveError::NoAgents)
        ));
        assert!(evo.evolve(&config(0)).is_ok());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut evo = pair_engine(0);
        let result = evo.evolve(&EvolveConfig {
            sync_interval: 0,
            ..config(10)
        });
        assert!(matches!(result, Err(EvolveError::Config(_))));
    }

    #[test]
    fn test_huge_time_limit_rejected() {
        let mut evo = pair_engine(0);
        let result = evo.evolve(&EvolveConfig {
            time_limit_secs: Some(1e20),
            ..config(10)
        });
        assert!(matches!(
            result,
            Err(EvolveError::Config(ConfigError::InvalidTimeLimit(_)))
        ));
    }

    #[test]
    fn test_infinite_scores_never_reach_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shared.evck");

        let mut evo: Evo<i32> = Evo::with_seed(13).with_checkpoint(FileCheckpoint::new(&path));
        evo.add_objective("v", |c: &i32| if *c % 3 == 0 { f64::INFINITY } else { *c as f64 });
        evo.add_objective("w", |c: &i32| -(*c as f64));
        evo.add_agent("draw", |rng: &mut SearchRng, _: Vec<i32>| rng.gen_range(0..30), 0);

        assert!(matches!(
            evo.add_solution(3),
            Err(ObjectiveError::NonFinite(name)) if name == "v"
        ));

        let stats = evo.evolve(&config(200)).unwrap();
        assert!(stats.discarded > 0);
        assert_eq!(stats.checkpoint_failures, 0);

        let stored = Checkpoint::<i32>::load(&FileCheckpoint::new(&path)).unwrap();
        assert!(!stored.is_empty());
        for (score, candidate) in &stored {
            assert!(score.values().all(f64::is_finite));
            assert_ne!(candidate % 3, 0);
        }
    }

    #[test]
    fn test_runs_share_progress_through_checkpoint() {
        let store = MemoryCheckpoint::new();

        let mut first = pair_engine(21).with_checkpoint(store.clone());
        first.evolve(&config(100)).unwrap();
        assert!(!store.is_empty());
        let written: Vec<Score> = store.load().unwrap().into_iter().map(|(s, _)| s).collect();

        let mut second: Evo<(i32, i32)> = Evo::with_seed(22).with_checkpoint(store.clone());
        second.add_objective("x", |c: &(i32, i32)| c.0 as f64);
        second.add_objective("y", |c: &(i32, i32)| c.1 as f64);
        second.add_objective("sum_gap", |c: &(i32, i32)| ((c.0 + c.1) - 10).abs() as f64);
        second.add_agent("same", |_: &mut SearchRng, _: Vec<(i32, i32)>| (100, 100), 0);

        // The first sync happens at iteration 0, pulling in the shared front.
        let stats = second.evolve(&config(1)).unwrap();
        assert_eq!(stats.checkpoint_syncs, 1);
        for score in &written {
            assert!(second.population().contains(score));
        }
    }

    #[test]
    fn test_seed_batch() {
        let mut evo = pair_engine(0);
        let added = evo.seed_batch(vec![(1, 9), (9, 1), (5, 5), (1, 9)]).unwrap();
        assert_eq!(added, 4);
        // Duplicate candidate collapses onto the same score key.
        assert_eq!(evo.population().len(), 3);
    }

    #[test]
    fn test_display_truncates() {
        let mut evo: Evo<i32> = Evo::with_seed(0);
        evo.add_objective("v", |c: &i32| *c as f64);
        for i in 0..7 {
            evo.add_solution(i).unwrap();
        }
        let text = evo.to_string();
        assert!(text.starts_with("Population size: 7\n"));
        assert!(text.contains("{v: 0}"));
        assert!(text.contains("... and 2 more solutions"));
    }
}
