//! Benchmarks for dominance pruning and loop throughput.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rand::Rng;

use paretoevo::{
    compute::{Evo, Population, SearchRng},
    problems::sorting,
    schema::{EvolveConfig, Score},
};

fn random_population(size: usize, objectives: usize, rng: &mut SearchRng) -> Population<usize> {
    let mut pop = Population::new();
    for id in 0..size {
        let score = Score::from_pairs(
            (0..objectives).map(|o| (format!("f{}", o), rng.gen_range(0..50) as f64)),
        );
        pop.insert_scored(score, id);
    }
    pop
}

fn bench_remove_dominated(c: &mut Criterion) {
    let mut group = c.benchmark_group("remove_dominated");
    let mut rng = SearchRng::new(42);

    for size in [50, 200, 800] {
        let pop = random_population(size, 5, &mut rng);
        group.bench_with_input(BenchmarkId::from_parameter(size), &pop, |b, pop| {
            b.iter(|| {
                let mut pop = pop.clone();
                black_box(pop.remove_dominated());
            });
        });
    }

    group.finish();
}

fn bench_evolve_loop(c: &mut Criterion) {
    let mut group = c.benchmark_group("evolve_sorting");
    group.sample_size(20);

    for dom_interval in [10u64, 100, 1000] {
        let config = EvolveConfig {
            iterations: 2_000,
            dom_interval,
            sync_interval: 1_000,
            time_limit_secs: None,
            random_seed: None,
            strict: false,
        };

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("dom_{}", dom_interval)),
            &config,
            |b, config| {
                b.iter(|| {
                    let mut evo = Evo::with_seed(7);
                    sorting::register(&mut evo);
                    let list = sorting::random_list(evo.rng_mut(), 50);
                    evo.add_solution(list).ok();
                    black_box(evo.evolve(config).ok());
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_remove_dominated, bench_evolve_loop);
criterion_main!(benches);
