//! End-to-end: two runs cooperating through one checkpoint file.

use std::fs;
use std::sync::Arc;

use paretoevo::{
    checkpoint::{Checkpoint, FileCheckpoint},
    compute::{Evo, Profiler},
    problems::assignta,
    report,
    schema::{Assignment, EvolveConfig},
};
use tempfile::tempdir;

const SECTIONS: &str = "\
section,instructor,daytime,location,students,topic,min_ta,max_ta
0,Rachlin,R 1145-125,Richards 201,30,Data Science,1,2
1,Rachlin,R 1145-125,Snell 040,25,Data Science,2,3
2,Park,W 950-1130,Hurtig 129,40,Algorithms,1,2
3,Park,W 950-1130,Hurtig 129,60,Algorithms,3,4
4,Lee,T 250-430,Ryder 155,35,Systems,2,3
";

const TAS: &str = "\
ta_id,name,max_assigned,0,1,2,3,4
0,Ada,1,U,W,P,P,W
1,Ben,2,P,P,U,W,P
2,Cy,3,W,W,W,W,U
3,Dee,2,P,U,P,P,P
";

fn run_once(checkpoint: &FileCheckpoint, seed: u64, dir: &std::path::Path) -> usize {
    let problem = assignta::load_problem(dir.join("sections.csv"), dir.join("tas.csv")).unwrap();
    let shape = problem.shape();
    let profiler = Arc::new(Profiler::new());

    let mut evo: Evo<Assignment> = Evo::with_seed(seed).with_checkpoint(checkpoint.clone());
    assignta::register_objectives(&mut evo, Arc::new(problem), Arc::clone(&profiler));
    assignta::register_agents(&mut evo, shape, profiler);
    let seeds = assignta::random_population(evo.rng_mut(), shape, 10);
    evo.seed_batch(seeds).unwrap();

    let config = EvolveConfig {
        iterations: 500,
        dom_interval: 25,
        sync_interval: 100,
        time_limit_secs: None,
        random_seed: None,
        strict: true,
    };
    let stats = evo.evolve(&config).unwrap();
    assert_eq!(stats.checkpoint_failures, 0);
    assert_eq!(stats.checkpoint_syncs, 5);

    let best = report::best_solution(evo.population()).unwrap();
    report::write_best_solution(dir.join("best_solution.txt"), &best).unwrap();
    report::save_summary(dir.join("summary.csv"), "test", evo.population()).unwrap();
    stats.population_size
}

#[test]
fn test_runs_share_a_checkpoint() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("sections.csv"), SECTIONS).unwrap();
    fs::write(dir.path().join("tas.csv"), TAS).unwrap();

    let checkpoint = FileCheckpoint::new(dir.path().join("solutions.dat"));
    run_once(&checkpoint, 1, dir.path());

    let stored = Checkpoint::<Assignment>::load(&checkpoint).unwrap();
    assert!(!stored.is_empty());

    // The second run merges the first run's front on its first sync.
    run_once(&checkpoint, 2, dir.path());
    let merged = Checkpoint::<Assignment>::load(&checkpoint).unwrap();
    assert!(!merged.is_empty());

    let best = fs::read_to_string(dir.path().join("best_solution.txt")).unwrap();
    let parsed = report::parse_best_solution(&best);
    assert_eq!(parsed.len(), 6);
    assert_eq!(parsed[0].0, "Overallocation");

    let summary = fs::read_to_string(dir.path().join("summary.csv")).unwrap();
    assert!(summary.lines().skip(1).all(|l| l.starts_with("test,")));
}
