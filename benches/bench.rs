// Criterion benchmarks for the family dining distance engine

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use family_dining::core::{
    distance::{distance_km, filter_within_radius, rank_by_distance, DEFAULT_RADIUS_KM},
    AreaCatalog,
};
use family_dining::models::{Coordinate, Restaurant};

fn create_restaurant(id: usize, latitude: f64, longitude: f64) -> Restaurant {
    Restaurant {
        id: id.to_string(),
        name: format!("Restaurant {}", id),
        description: None,
        address: "東京都".to_string(),
        phone: None,
        website: None,
        latitude,
        longitude,
        price_range: None,
        rating: 3.0 + (id % 20) as f64 / 10.0,
        image_url: None,
        created_at: None,
        updated_at: None,
        kids_menus: vec![],
        restaurant_facilities: None,
    }
}

fn create_catalog(count: usize) -> Vec<Restaurant> {
    (0..count)
        .map(|i| {
            let lat_offset = (i as f64 * 0.001) % 0.5;
            let lon_offset = (i as f64 * 0.0013) % 0.5;
            create_restaurant(i, 35.45 + lat_offset, 139.3 + lon_offset)
        })
        .collect()
}

const SHINJUKU: Coordinate = Coordinate::new(35.6917, 139.7007);

fn bench_distance_km(c: &mut Criterion) {
    c.bench_function("distance_km", |b| {
        b.iter(|| {
            distance_km(
                black_box(SHINJUKU),
                black_box(Coordinate::new(35.6598, 139.7036)),
            )
        });
    });
}

fn bench_rank_by_distance(c: &mut Criterion) {
    let mut group = c.benchmark_group("rank_by_distance");

    for count in [10, 100, 1000, 5000].iter() {
        let catalog = create_catalog(*count);

        group.bench_with_input(BenchmarkId::new("rank", count), count, |b, _| {
            b.iter(|| {
                let mut ranked = rank_by_distance(black_box(catalog.clone()), black_box(SHINJUKU));
                ranked.truncate(20);
                ranked
            });
        });
    }

    group.finish();
}

fn bench_filter_within_radius(c: &mut Criterion) {
    let catalog = create_catalog(1000);

    c.bench_function("filter_within_radius_1000", |b| {
        b.iter(|| {
            filter_within_radius(black_box(catalog.iter().cloned()), SHINJUKU, DEFAULT_RADIUS_KM)
        });
    });
}

fn bench_match_query(c: &mut Criterion) {
    let catalog = AreaCatalog::tokyo();

    c.bench_function("match_query", |b| {
        b.iter(|| catalog.match_query(black_box("調布でランチ")).is_some());
    });
}

criterion_group!(
    benches,
    bench_distance_km,
    bench_rank_by_distance,
    bench_filter_within_radius,
    bench_match_query
);

criterion_main!(benches);
