use criterion::{criterion_group, criterion_main, Criterion, black_box};

use glam::DVec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use topovox::bathy::{BathymetryParams, BathymetrySynthesizer};
use topovox::interp::{QueryParams, SpatialIndex};
use topovox::math::Grid;
use topovox::voxel::{ChunkLayout, ChunkStore, LayerSpec};

fn scattered(n: usize, seed: u64) -> (Vec<DVec2>, Vec<f64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let points: Vec<DVec2> = (0..n)
        .map(|_| DVec2::new(rng.gen_range(0.0..256.0), rng.gen_range(0.0..256.0)))
        .collect();
    let values = points.iter().map(|p| (p.x * 0.05).sin() * 40.0 + p.y * 0.1).collect();
    (points, values)
}

fn targets(side: usize) -> Vec<DVec2> {
    (0..side * side)
        .map(|i| DVec2::new((i % side) as f64 + 0.5, (i / side) as f64 + 0.5))
        .collect()
}

fn bench_index_build(c: &mut Criterion) {
    let (points, values) = scattered(65_536, 1);

    c.bench_function("index_build_64k", |b| {
        b.iter(|| SpatialIndex::build(black_box(points.clone()), black_box(values.clone())))
    });
}

fn bench_weighted_query(c: &mut Criterion) {
    let (points, values) = scattered(65_536, 2);
    let index = SpatialIndex::build(points, values).unwrap();
    let targets = targets(128);
    let params = QueryParams::weighted(11, 0.1);

    c.bench_function("weighted_query_128x128", |b| {
        b.iter(|| index.query(black_box(&targets), &params))
    });
}

fn bench_majority_query(c: &mut Criterion) {
    let (points, _) = scattered(65_536, 3);
    let classes = (0..points.len()).map(|i| [11.0, 41.0, 82.0][i % 3]).collect();
    let index = SpatialIndex::build(points, classes).unwrap();
    let targets = targets(128);
    let params = QueryParams::majority(11, 0.1);

    c.bench_function("majority_query_128x128", |b| {
        b.iter(|| index.query(black_box(&targets), &params))
    });
}

fn bench_bathymetry(c: &mut Criterion) {
    let mut classes = Grid::filled(256, 256, 11u8);
    for (r, col) in (0..256).flat_map(|r| (0..256).map(move |c| (r, c))) {
        if (r as f64 - 128.0).hypot(col as f64 - 128.0) < 40.0 {
            classes.set(r, col, 41);
        }
    }
    let synth = BathymetrySynthesizer::new(BathymetryParams::new(11, 10, 2.0));

    c.bench_function("bathymetry_256", |b| {
        b.iter(|| {
            let mut rng = ChaCha8Rng::seed_from_u64(9);
            synth.synthesize(black_box(&classes), &mut rng)
        })
    });
}

fn bench_write_columns(c: &mut Criterion) {
    let spec: LayerSpec = "Grass:1, Dirt:3, Stone".parse().unwrap();

    c.bench_function("write_columns_256x256", |b| {
        b.iter(|| {
            let store = ChunkStore::new(ChunkLayout::default());
            for x in 0..256 {
                for z in 0..256 {
                    store.write_column(x, z, (x ^ z) % 40, &spec).unwrap();
                }
            }
            store
        })
    });
}

criterion_group!(
    benches,
    bench_index_build,
    bench_weighted_query,
    bench_majority_query,
    bench_bathymetry,
    bench_write_columns,
);
criterion_main!(benches);
