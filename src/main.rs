//! taopt - Evolve TA-to-section assignments from a JSON run configuration.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use paretoevo::{
    checkpoint::FileCheckpoint,
    compute::{Evo, Profiler, SearchRng},
    problems::assignta,
    report,
    schema::{Assignment, RunConfig, format_value},
};

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <config.json>", args[0]);
        eprintln!();
        eprintln!("Evolve TA assignments and write summary, profile and best-solution reports.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  config.json  Path to run configuration file");
        eprintln!();
        eprintln!("Example configuration is generated with --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_config();
        return;
    }

    let config_path = PathBuf::from(&args[1]);

    // Load configuration
    let config_str = fs::read_to_string(&config_path).unwrap_or_else(|e| {
        eprintln!("Error reading config file: {}", e);
        std::process::exit(1);
    });

    let config: RunConfig = serde_json::from_str(&config_str).unwrap_or_else(|e| {
        eprintln!("Error parsing config: {}", e);
        std::process::exit(1);
    });

    if let Err(e) = config.validate() {
        eprintln!("Invalid config: {}", e);
        std::process::exit(1);
    }

    let profiler = Arc::new(Profiler::new());
    profiler.start();

    println!("Loading data...");
    let problem = assignta::load_problem(&config.sections_path, &config.tas_path).unwrap_or_else(|e| {
        eprintln!("Error loading problem: {}", e);
        std::process::exit(1);
    });
    println!(
        "Loaded {} sections and {} TAs",
        problem.sections.len(),
        problem.tas.len()
    );

    let shape = problem.shape();
    let problem = Arc::new(problem);

    let mut evo: Evo<Assignment> =
        Evo::with_rng(SearchRng::from_seed_option(config.evolve.random_seed));
    if let Some(path) = &config.checkpoint_path {
        evo = evo.with_checkpoint(FileCheckpoint::new(path));
    }
    assignta::register_objectives(&mut evo, Arc::clone(&problem), Arc::clone(&profiler));
    assignta::register_agents(&mut evo, shape, Arc::clone(&profiler));

    let seeds = assignta::random_population(evo.rng_mut(), shape, config.initial_population);
    if let Err(e) = evo.seed_batch(seeds) {
        eprintln!("Error scoring initial population: {}", e);
        std::process::exit(1);
    }
    println!("Initial population: {} solutions", evo.population().len());

    let start = Instant::now();
    let stats = evo.evolve(&config.evolve).unwrap_or_else(|e| {
        eprintln!("Evolution failed: {}", e);
        std::process::exit(1);
    });
    let optimization_time = start.elapsed().as_secs_f64();

    println!();
    println!("Optimization completed in {:.2} seconds", optimization_time);
    println!(
        "Final population size: {} non-dominated solutions",
        stats.population_size
    );
    if stats.discarded > 0 {
        println!("Discarded candidates: {}", stats.discarded);
    }

    profiler.stop();

    if let Err(e) = write_reports(&config, &evo, &profiler) {
        eprintln!("Error writing reports: {}", e);
        std::process::exit(1);
    }

    println!("Optimization time: {:.2} seconds", optimization_time);
    for (name, min, max) in report::objective_ranges(evo.population()) {
        println!("  {}: {} - {}", name, format_value(min), format_value(max));
    }
}

fn write_reports(
    config: &RunConfig,
    evo: &Evo<Assignment>,
    profiler: &Profiler,
) -> Result<(), report::ReportError> {
    fs::create_dir_all(&config.output_dir)?;

    let summary = config
        .output_dir
        .join(format!("{}_summary.csv", config.group_name));
    report::save_summary(&summary, &config.group_name, evo.population())?;

    let profile = config
        .output_dir
        .join(format!("{}_profile.txt", config.group_name));
    profiler.save_report(&profile)?;

    let best = report::best_solution(evo.population())?;
    report::write_best_solution(config.output_dir.join("best_solution.txt"), &best)?;

    println!("Reports written to {}", config.output_dir.display());
    Ok(())
}

fn print_example_config() {
    let config = RunConfig::default();

    println!("Example configuration (config.json):");
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing example config: {}", e),
    }
}
