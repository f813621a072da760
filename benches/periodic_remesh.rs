//! Benchmarks for periodic remeshing on cylindrical honeycomb lattices.
//!
//! Measures the full periodic remesh cycle (halo fencing, mirroring,
//! Delaunay triangulation of the doubled domain, seam reconciliation,
//! reconstruction, reindexing) at increasing lattice sizes, plus the
//! underlying plain triangulation for comparison.

#![allow(missing_docs)] // Criterion macros generate undocumented functions

use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use cylmesh::core::cylindrical::Cylindrical2dMesh;
use cylmesh::core::mutable_mesh::MutableMesh;
use cylmesh::core::node_map::NodeMap;
use cylmesh::geometry::point::Point2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;

const BENCH_SEED: u64 = 0xC1_71;

/// Honeycomb lattice on a cylinder of width `across`, with optional
/// per-node jitter so runs exercise the general (non-degenerate) path.
fn jittered_honeycomb(across: usize, up: usize, jitter: f64, seed: u64) -> Vec<Point2> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut points = Vec::with_capacity(across * up);
    for row in 0..up {
        #[allow(clippy::cast_precision_loss)]
        let y = row as f64 * 3.0_f64.sqrt() / 2.0;
        let offset = if row % 2 == 0 { 0.0 } else { 0.5 };
        for column in 0..across {
            #[allow(clippy::cast_precision_loss)]
            let x = column as f64 + offset;
            let dx = rng.random_range(-jitter..=jitter);
            let dy = rng.random_range(-jitter..=jitter);
            #[allow(clippy::cast_precision_loss)]
            let width = across as f64;
            points.push(Point2::new((x + dx).rem_euclid(width), y + dy));
        }
    }
    points
}

fn benchmark_periodic_remesh(c: &mut Criterion) {
    let sizes = [(6, 6), (10, 10), (16, 16), (24, 24)];

    let mut group = c.benchmark_group("periodic_remesh");
    for &(across, up) in &sizes {
        let n_nodes = across * up;
        group.throughput(Throughput::Elements(n_nodes as u64));

        group.bench_with_input(
            BenchmarkId::new("honeycomb", n_nodes),
            &(across, up),
            |b, &(across, up)| {
                #[allow(clippy::cast_precision_loss)]
                let width = across as f64;
                let points = jittered_honeycomb(across, up, 0.05, BENCH_SEED);
                b.iter_batched(
                    || Cylindrical2dMesh::from_nodes(width, &points).unwrap(),
                    |mut mesh| black_box(mesh.periodic_remesh().unwrap()),
                    BatchSize::LargeInput,
                );
            },
        );
    }
    group.finish();
}

fn benchmark_plain_remesh(c: &mut Criterion) {
    let sizes = [(6, 6), (10, 10), (16, 16), (24, 24)];

    let mut group = c.benchmark_group("plain_remesh");
    for &(across, up) in &sizes {
        let n_nodes = across * up;
        group.throughput(Throughput::Elements(n_nodes as u64));

        group.bench_with_input(
            BenchmarkId::new("honeycomb", n_nodes),
            &(across, up),
            |b, &(across, up)| {
                let points = jittered_honeycomb(across, up, 0.05, BENCH_SEED);
                b.iter_batched(
                    || {
                        let mut mesh = MutableMesh::new();
                        for point in &points {
                            mesh.add_node(*point);
                        }
                        mesh
                    },
                    |mut mesh| {
                        let mut map = NodeMap::new(mesh.num_all_nodes());
                        mesh.remesh(&mut map).unwrap();
                        black_box(map)
                    },
                    BatchSize::LargeInput,
                );
            },
        );
    }
    group.finish();
}

criterion_group!(benches, benchmark_periodic_remesh, benchmark_plain_remesh);
criterion_main!(benches);
