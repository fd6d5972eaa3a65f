//! Evolutionary search module for multi-objective Pareto optimization.
//!
//! # Overview
//!
//! The evolutionary search system consists of:
//!
//! - **Registries** (`registry`): Named objectives and agents
//! - **Population Store** (`population`): Candidates keyed by score
//! - **Dominance** (`dominance`): Pareto comparison and non-dominated filtering
//! - **Search Loop** (`search`): Agent scheduling with budget and time limits
//! - **Random Source** (`rng`): Seedable generator threaded through agents
//!
//! # Example
//!
//! ```rust,no_run
//! use paretoevo::compute::evolution::{Evo, SearchRng};
//! use paretoevo::schema::EvolveConfig;
//! use rand::Rng;
//!
//! let mut evo: Evo<Vec<i32>> = Evo::with_seed(42);
//! evo.add_objective("len", |v: &Vec<i32>| v.len() as f64);
//! evo.add_objective("sum", |v: &Vec<i32>| v.iter().sum::<i32>() as f64);
//! evo.add_agent(
//!     "push",
//!     |rng: &mut SearchRng, picks: Vec<Vec<i32>>| {
//!         let mut v = picks.into_iter().next().unwrap_or_default();
//!         v.push(rng.gen_range(-5..5));
//!         v
//!     },
//!     1,
//! );
//! evo.add_solution(vec![1, 2, 3]).unwrap();
//!
//! let stats = evo.evolve(&EvolveConfig {
//!     iterations: 1000,
//!     ..Default::default()
//! }).unwrap();
//! println!("{} non-dominated solutions", stats.population_size);
//! ```
//!
//! Objectives are minimized. The engine has no notion of a maximized
//! objective; negate such values before returning them.

mod dominance;
mod population;
mod registry;
mod rng;
mod search;

pub use dominance::{dominates, non_dominated, non_dominated_mask};
pub use population::Population;
pub use registry::{AgentFn, AgentSpec, ObjectiveError, ObjectiveFn, Registry};
pub use rng::SearchRng;
pub use search::{Diagnostic, DiagnosticSink, Evo, EvolveError, EvolveStats, StopReason};
