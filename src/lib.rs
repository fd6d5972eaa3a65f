//! paretoevo - Multi-objective evolutionary search over Pareto fronts.
//!
//! Register named objectives (lower is better) and agents that produce new
//! candidates from sampled ones, seed a population, and let the engine keep
//! the non-dominated set while it runs.
//!
//! # Architecture
//!
//! - `schema`: Scores, run configuration and the TA-assignment data model
//! - `compute`: Registries, population, dominance, the evolution loop, profiling
//! - `checkpoint`: Shared on-disk population store for cooperating runs
//! - `problems`: TA assignment and the sorting demo
//! - `report`: Summary CSV and best-solution output
//!
//! # Example
//!
//! ```rust,no_run
//! use paretoevo::{compute::Evo, schema::EvolveConfig};
//!
//! let mut evo: Evo<Vec<i64>> = Evo::with_seed(7);
//! paretoevo::problems::sorting::register(&mut evo);
//! evo.add_solution(vec![5, 3, 9, 1, 4, 8, 2]).unwrap();
//!
//! let config = EvolveConfig {
//!     iterations: 10_000,
//!     ..EvolveConfig::default()
//! };
//! let stats = evo.evolve(&config).unwrap();
//! println!("{} solutions after {} iterations", stats.population_size, stats.iterations);
//! println!("{}", evo);
//! ```

pub mod checkpoint;
pub mod compute;
pub mod problems;
pub mod report;
pub mod schema;

// Re-export commonly used types
pub use checkpoint::{Checkpoint, FileCheckpoint, MemoryCheckpoint};
pub use compute::{Evo, EvolveError, EvolveStats, Population, Profiler, SearchRng, StopReason};
pub use schema::{EvolveConfig, RunConfig, Score};
