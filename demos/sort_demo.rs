//! Sorting by evolution: random swaps plus Pareto pruning, no sort routine.

use paretoevo::{compute::Evo, problems::sorting, schema::EvolveConfig};

fn main() {
    env_logger::init();

    let mut evo = Evo::with_seed(2024);
    sorting::register(&mut evo);

    let list = sorting::random_list(evo.rng_mut(), 50);
    if let Err(e) = evo.add_solution(list) {
        eprintln!("Initial list could not be scored: {}", e);
        std::process::exit(1);
    }
    println!("{}", evo);

    let config = EvolveConfig {
        iterations: 200_000,
        dom_interval: 100,
        time_limit_secs: Some(10.0),
        ..EvolveConfig::default()
    };

    match evo.evolve(&config) {
        Ok(stats) => {
            println!("{}", evo);
            println!(
                "{} iterations in {:.2}s ({:?})",
                stats.iterations, stats.elapsed_seconds, stats.stop_reason
            );
        }
        Err(e) => {
            eprintln!("Evolution failed: {}", e);
            std::process::exit(1);
        }
    }
}
