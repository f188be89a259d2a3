use criterion::{black_box, criterion_group, criterion_main, Criterion};
use league_sim::synthetic::{synthetic_players, synthetic_season_input};
use league_sim::{
    Aggregator, AuctionSimulator, BatchOptions, LeagueConfig, SeasonSimulator, SimMetrics,
    SimulationPlan, ValueCalculator,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn bench_value_pool(c: &mut Criterion) {
    let config = LeagueConfig::default();
    let players = synthetic_players(1);
    let calculator = ValueCalculator::new(config);

    c.bench_function("value_pool", |b| {
        b.iter(|| black_box(calculator.value_pool(black_box(&players))).unwrap())
    });
}

fn bench_single_auction(c: &mut Criterion) {
    let config = LeagueConfig::default();
    let pool = ValueCalculator::new(config.clone()).value_pool(&synthetic_players(1)).unwrap();
    let simulator = AuctionSimulator::new(config);
    let metrics = SimMetrics::new();
    let mut seed = 0;

    c.bench_function("single_auction", |b| {
        b.iter(|| {
            let mut rng = StdRng::seed_from_u64(seed);
            seed += 1;
            black_box(simulator.run(black_box(&pool), &mut rng, &metrics))
        })
    });
}

fn bench_single_season(c: &mut Criterion) {
    let config = LeagueConfig::default();
    let input = synthetic_season_input(&config, 1).unwrap();
    let metrics = SimMetrics::new();
    let simulator = SeasonSimulator::new(&config, &metrics);
    let mut seed = 0;

    c.bench_function("single_season", |b| {
        b.iter(|| {
            let mut rng = StdRng::seed_from_u64(seed);
            seed += 1;
            black_box(simulator.simulate(black_box(&input), &mut rng))
        })
    });
}

fn bench_season_batch(c: &mut Criterion) {
    let config = LeagueConfig::default();
    let aggregator = Aggregator::new(config.clone()).unwrap();
    let plan = SimulationPlan::season(synthetic_season_input(&config, 1).unwrap());
    let options = BatchOptions { runs: 100, workers: 4, seed: 7, deadline: None };

    let mut group = c.benchmark_group("batch");
    group.sample_size(10);
    group.bench_function("season_batch_100", |b| {
        b.iter(|| black_box(aggregator.run_batch(&plan, &options)).unwrap())
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_value_pool,
    bench_single_auction,
    bench_single_season,
    bench_season_batch
);
criterion_main!(benches);
