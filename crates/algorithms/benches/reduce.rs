//! Benchmarks for rank reduction and the extra overlay

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use floodmax_algorithms::hazard::{overlay_extra, reduce, RankLayer, ReduceParams};
use floodmax_core::Rank;
use geo::{LineString, MultiPolygon, Polygon};

fn square(x: f64, y: f64, size: f64) -> Polygon<f64> {
    Polygon::new(
        LineString::from(vec![(x, y), (x + size, y), (x + size, y + size), (x, y + size), (x, y)]),
        vec![],
    )
}

/// One layer per rank, each a grid of squares that grow with the rank so
/// neighbouring ranks overlap
fn create_rank_layers(tiles: usize) -> Vec<RankLayer> {
    (1..=7)
        .map(|r| {
            let size = 0.4 + 0.08 * r as f64;
            let offset = 0.05 * r as f64;
            let polygons = (0..tiles)
                .flat_map(|i| (0..tiles).map(move |j| (i, j)))
                .map(|(i, j)| square(i as f64 + offset, j as f64 + offset, size))
                .collect();
            RankLayer::new(Rank::new(r).unwrap(), MultiPolygon::new(polygons))
        })
        .collect()
}

fn bench_reduce(c: &mut Criterion) {
    let mut group = c.benchmark_group("hazard/reduce");
    group.sample_size(10);
    for tiles in [4, 8, 16] {
        let layers = create_rank_layers(tiles);
        group.bench_with_input(BenchmarkId::from_parameter(tiles * tiles), &tiles, |b, _| {
            b.iter(|| reduce(black_box(layers.clone()), &ReduceParams::default()).unwrap())
        });
    }
    group.finish();
}

fn bench_overlay_extra(c: &mut Criterion) {
    let mut group = c.benchmark_group("hazard/overlay_extra");
    group.sample_size(10);
    for tiles in [4, 8, 16] {
        let mut layers = create_rank_layers(tiles);
        let extra: Vec<RankLayer> = layers.drain(..3).collect();
        let primary = reduce(layers, &ReduceParams::default()).unwrap().partition;
        group.bench_with_input(BenchmarkId::from_parameter(tiles * tiles), &tiles, |b, _| {
            b.iter(|| {
                overlay_extra(black_box(primary.clone()), extra.clone(), &ReduceParams::default()).unwrap()
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_reduce, bench_overlay_extra);
criterion_main!(benches);
