//! TA-to-section assignment.
//!
//! A candidate is a TAs × sections boolean grid. Five penalty objectives score
//! it and eight agents perturb it. Registration wraps every call in the
//! shared [`Profiler`].

mod agents;
mod loader;
mod objectives;

use std::sync::Arc;

use crate::compute::Profiler;
use crate::compute::evolution::{Evo, SearchRng};
use crate::schema::{Assignment, Problem};

pub use agents::{
    conflict_reduction, constraint_repair, crossover, mutation, random_solution,
    section_coverage, swap_assignment, workload_balancing,
};
pub use loader::{LoadError, load_problem, parse_sections, parse_tas};
pub use objectives::{conflicts, overallocation, undersupport, unavailable, unpreferred};

/// Objective names in registration (and report column) order.
pub const OBJECTIVE_NAMES: [&str; 5] = [
    "overallocation",
    "conflicts",
    "undersupport",
    "unavailable",
    "unpreferred",
];

/// Register the five penalty objectives against `problem`.
pub fn register_objectives(
    evo: &mut Evo<Assignment>,
    problem: Arc<Problem>,
    profiler: Arc<Profiler>,
) {
    {
        let (problem, profiler) = (Arc::clone(&problem), Arc::clone(&profiler));
        evo.add_fallible_objective("overallocation", move |s: &Assignment| {
            profiler
                .measure("overallocation", || overallocation(s, &problem.tas))
                .map(f64::from)
        });
    }
    {
        let (problem, profiler) = (Arc::clone(&problem), Arc::clone(&profiler));
        evo.add_fallible_objective("conflicts", move |s: &Assignment| {
            profiler
                .measure("conflicts", || conflicts(s, &problem.sections))
                .map(f64::from)
        });
    }
    {
        let (problem, profiler) = (Arc::clone(&problem), Arc::clone(&profiler));
        evo.add_fallible_objective("undersupport", move |s: &Assignment| {
            profiler
                .measure("undersupport", || undersupport(s, &problem.sections))
                .map(f64::from)
        });
    }
    {
        let (problem, profiler) = (Arc::clone(&problem), Arc::clone(&profiler));
        evo.add_fallible_objective("unavailable", move |s: &Assignment| {
            profiler
                .measure("unavailable", || unavailable(s, &problem.tas))
                .map(f64::from)
        });
    }
    evo.add_fallible_objective("unpreferred", move |s: &Assignment| {
        profiler
            .measure("unpreferred", || unpreferred(s, &problem.tas))
            .map(f64::from)
    });
}

type Operator = fn(&mut SearchRng, Vec<Assignment>, (usize, usize)) -> Assignment;

/// Agent table: name, operator, arity.
const AGENTS: [(&str, Operator, usize); 8] = [
    ("random_solution", random_agent, 0),
    ("swap_assignment", swap_assignment, 1),
    ("conflict_reduction", conflict_reduction, 1),
    ("workload_balancing", workload_balancing, 1),
    ("section_coverage", section_coverage, 1),
    ("crossover", crossover, 2),
    ("mutation", mutation, 1),
    ("constraint_repair", constraint_repair, 1),
];

fn random_agent(rng: &mut SearchRng, _picks: Vec<Assignment>, shape: (usize, usize)) -> Assignment {
    random_solution(rng, shape)
}

/// Register the eight agents for grids of `shape` (TAs, sections).
pub fn register_agents(evo: &mut Evo<Assignment>, shape: (usize, usize), profiler: Arc<Profiler>) {
    for (name, operator, arity) in AGENTS {
        let profiler = Arc::clone(&profiler);
        evo.add_agent(
            name,
            move |rng: &mut SearchRng, picks: Vec<Assignment>| {
                profiler.measure(name, || operator(rng, picks, shape))
            },
            arity,
        );
    }
}

/// `count` independent random grids of `shape`.
pub fn random_population(rng: &mut SearchRng, shape: (usize, usize), count: usize) -> Vec<Assignment> {
    (0..count).map(|_| random_solution(rng, shape)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::EvolveConfig;

    fn engine(seed: u64) -> (Evo<Assignment>, Arc<Profiler>, (usize, usize)) {
        let problem = Arc::new(objectives::tests::small_problem());
        let shape = problem.shape();
        let profiler = Arc::new(Profiler::new());
        let mut evo = Evo::with_seed(seed);
        register_objectives(&mut evo, Arc::clone(&problem), Arc::clone(&profiler));
        register_agents(&mut evo, shape, Arc::clone(&profiler));
        (evo, profiler, shape)
    }

    #[test]
    fn test_registration_order() {
        let (evo, _, _) = engine(1);
        let names: Vec<&str> = evo.objective_names().collect();
        assert_eq!(names, OBJECTIVE_NAMES);
        assert_eq!(evo.agent_names().count(), 8);
    }

    #[test]
    fn test_profiled_run() {
        let (mut evo, profiler, shape) = engine(11);
        let seeds = random_population(evo.rng_mut(), shape, 5);
        evo.seed_batch(seeds).unwrap();

        let config = EvolveConfig {
            iterations: 200,
            dom_interval: 10,
            sync_interval: 50,
            time_limit_secs: None,
            random_seed: None,
            strict: true,
        };
        let stats = evo.evolve(&config).unwrap();
        assert_eq!(stats.iterations, 200);
        assert!(!evo.population().is_empty());

        // Every scored candidate runs every objective once.
        let overalloc = profiler.get("overallocation").unwrap().calls;
        for name in OBJECTIVE_NAMES {
            assert_eq!(profiler.get(name).unwrap().calls, overalloc);
        }
        let agent_calls: u64 = AGENTS
            .iter()
            .filter_map(|(name, _, _)| profiler.get(name))
            .map(|s| s.calls)
            .sum();
        assert_eq!(agent_calls, 200);
    }

    #[test]
    fn test_scores_are_integral() {
        let (mut evo, _, shape) = engine(3);
        let grid = random_solution(evo.rng_mut(), shape);
        let score = evo.add_solution(grid).unwrap();
        assert!(score.values().all(|v| v.fract() == 0.0 && v >= 0.0));
    }
}
