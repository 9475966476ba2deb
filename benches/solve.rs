// benches/solve.rs - end-to-end solve benchmark

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use ruckoo::{digest_header, Params, Settings, Solver};

fn bench_solve(c: &mut Criterion) {
    let params = Params::new(16, 6, 0).unwrap();
    let settings = Settings {
        threads: 1,
        trims: 32,
        max_sols: 4,
    };
    let solver = Solver::new(params, &settings).unwrap();
    let header = digest_header(b"bench header");

    c.bench_function("solve_cuckoo16", |b| {
        b.iter(|| black_box(solver.solve(black_box(&header))))
    });
}

fn bench_trim_heavy(c: &mut Criterion) {
    let params = Params::new(18, 6, 0).unwrap();
    let settings = Settings {
        threads: 0,
        trims: 16,
        max_sols: 4,
    };
    let solver = Solver::new(params, &settings).unwrap();
    let header = digest_header(b"bench header 18");

    let mut group = c.benchmark_group("trim");
    group.sample_size(10);
    group.bench_function("solve_cuckoo18_all_cores", |b| {
        b.iter(|| black_box(solver.solve(black_box(&header))))
    });
    group.finish();
}

criterion_group!(benches, bench_solve, bench_trim_heavy);
criterion_main!(benches);
