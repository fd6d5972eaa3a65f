//! Quick evolution performance test

use std::sync::Arc;
use std::time::Instant;

use rand::Rng;

use paretoevo::{
    compute::{Evo, Profiler, SearchRng},
    problems::assignta,
    schema::{Assignment, EvolveConfig, Preference, Problem, Section, Ta},
};

const SLOTS: [&str; 6] = [
    "R 1145-125",
    "R 950-1130",
    "W 950-1130",
    "W 1145-125",
    "T 250-430",
    "M 250-430",
];

/// Random instance with `tas` rows and `sections` columns.
fn synthetic_problem(tas: usize, sections: usize, rng: &mut SearchRng) -> Problem {
    let sections = (0..sections)
        .map(|id| Section {
            section_id: id,
            instructor: format!("instructor{}", id % 5),
            daytime: SLOTS[rng.gen_range(0..SLOTS.len())].to_string(),
            location: "WVH 210".to_string(),
            students: rng.gen_range(10..60),
            topic: "Lab".to_string(),
            min_ta: rng.gen_range(1..4),
            max_ta: 4,
        })
        .collect::<Vec<_>>();

    let tas = (0..tas)
        .map(|id| Ta {
            ta_id: id,
            name: format!("ta{}", id),
            max_assigned: rng.gen_range(1..4),
            preferences: (0..sections.len())
                .map(|s| {
                    let pref = match rng.gen_range(0..3) {
                        0 => Preference::Unavailable,
                        1 => Preference::Willing,
                        _ => Preference::Preferred,
                    };
                    (s, pref)
                })
                .collect(),
        })
        .collect();

    Problem { sections, tas }
}

fn run(problem: Problem, iterations: u64, seeds: usize) -> (f64, usize, u64) {
    let shape = problem.shape();
    let profiler = Arc::new(Profiler::new());
    let mut evo: Evo<Assignment> = Evo::with_seed(42);
    assignta::register_objectives(&mut evo, Arc::new(problem), Arc::clone(&profiler));
    assignta::register_agents(&mut evo, shape, profiler);

    let initial = assignta::random_population(evo.rng_mut(), shape, seeds);
    if let Err(e) = evo.seed_batch(initial) {
        eprintln!("Seeding failed: {}", e);
        std::process::exit(1);
    }

    let config = EvolveConfig {
        iterations,
        dom_interval: 50,
        ..EvolveConfig::default()
    };

    let start = Instant::now();
    let stats = evo.evolve(&config).unwrap_or_else(|e| {
        eprintln!("Evolution failed: {}", e);
        std::process::exit(1);
    });
    (start.elapsed().as_secs_f64(), stats.population_size, stats.iterations)
}

fn main() {
    println!("=== Evolution Performance Test ===\n");

    let mut rng = SearchRng::new(7);

    // Test different grid sizes
    for (tas, sections) in [(20, 8), (40, 17), (80, 34)] {
        println!("Grid size: {}x{}", tas, sections);

        let problem = synthetic_problem(tas, sections, &mut rng);
        let (elapsed, front, iterations) = run(problem, 20_000, 20);

        println!("  Iterations:     {}", iterations);
        println!("  Elapsed:        {:.2}s", elapsed);
        println!("  Iters/sec:      {:.1}", iterations as f64 / elapsed);
        println!("  Front size:     {}", front);
        println!();
    }

    println!("=== Scalability Test (fixed 40x17 grid) ===\n");

    // Test different initial population sizes
    for seeds in [10, 20, 40, 80] {
        let problem = synthetic_problem(40, 17, &mut rng);
        let (elapsed, front, iterations) = run(problem, 10_000, seeds);

        println!(
            "Seeds {}: {} iterations in {:.2}s ({:.1} iters/sec), front {}",
            seeds,
            iterations,
            elapsed,
            iterations as f64 / elapsed,
            front
        );
    }
}
