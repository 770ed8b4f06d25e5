//! Criterion micro-benchmarks for neighborhood enumeration and mesh lookups.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use halo_core::Rank;
use halo_topology::{CartesianTopology, RelativeLocation};

/// Benchmark: walk a radius-2 box in 3-D with `increment`.
fn bench_increment_radius2_3d(c: &mut Criterion) {
    c.bench_function("relative_increment_r2_3d", |b| {
        b.iter(|| {
            let mut rel = RelativeLocation::uniform(3, 2);
            let mut n = 0usize;
            loop {
                n += rel.index();
                if !rel.increment() {
                    break;
                }
            }
            black_box(n)
        });
    });
}

/// Benchmark: collect every offset of a radius-2 box in 3-D.
fn bench_values_radius2_3d(c: &mut Criterion) {
    let rel = RelativeLocation::uniform(3, 2);

    c.bench_function("relative_values_r2_3d", |b| {
        b.iter(|| black_box(rel.values().count()));
    });
}

/// Benchmark: neighbor ranks and trimmed directions for every rank of a
/// bounded 8x8x8 mesh.
fn bench_trim_mesh_512(c: &mut Criterion) {
    let topo = CartesianTopology::new(&[8, 8, 8], false, 512).unwrap();
    let unit = RelativeLocation::new(3);

    c.bench_function("trim_and_neighbors_512", |b| {
        b.iter(|| {
            for r in 0..512 {
                black_box(topo.trim(Rank(r), &unit));
                black_box(topo.neighbor_ranks(Rank(r)));
            }
        });
    });
}

criterion_group!(
    benches,
    bench_increment_radius2_3d,
    bench_values_radius2_3d,
    bench_trim_mesh_512
);
criterion_main!(benches);
