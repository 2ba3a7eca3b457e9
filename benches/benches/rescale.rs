// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for `rescale_feature`.

use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use kurbo::Point;
use rescale_feature::{
    Cursor, Feature, FeatureId, FeatureSet, Geometry, MapId, MapPointerEvent, MapView,
    PointerEventKind, PointerInteraction, RescaleInteraction, RescaleOptions,
};

/// Identity projection; the first feature is always under the pointer.
struct BenchMap {
    target: FeatureId,
}

impl MapView for BenchMap {
    fn pixel_from_coordinate(&self, coordinate: Point) -> Point {
        coordinate
    }

    fn feature_at_pixel(&self, _pixel: Point) -> Option<FeatureId> {
        Some(self.target)
    }

    fn cursor(&self) -> Cursor {
        Cursor::Default
    }

    fn set_cursor(&mut self, _cursor: Cursor) {}
}

/// `n` closed rings of 16 vertices spread over a grid.
fn polygons(n: usize) -> Vec<Feature> {
    (0..n)
        .map(|i| {
            let origin = Point::new((i % 32) as f64 * 100.0, (i / 32) as f64 * 100.0);
            let ring = (0..=16)
                .map(|k| {
                    let angle = core::f64::consts::TAU * f64::from(k % 16) / 16.0;
                    Point::new(origin.x + 40.0 * angle.cos(), origin.y + 40.0 * angle.sin())
                })
                .collect();
            Feature::new(Geometry::Polygon(vec![ring]))
        })
        .collect()
}

fn bench_rescale(c: &mut Criterion) {
    let mut group = c.benchmark_group("rescale/gesture");

    for n in [1_usize, 64, 1024] {
        group.bench_function(BenchmarkId::new("drag_step", n), |b| {
            let features = polygons(n);
            let mut map = BenchMap {
                target: features[0].id(),
            };
            let mut rescale =
                RescaleInteraction::new(RescaleOptions::new().features(features)).unwrap();
            rescale.set_map(Some(MapId(1)));
            let anchor = rescale.anchor().unwrap();
            let start = anchor + kurbo::Vec2::new(5000.0, 0.0);
            let down = MapPointerEvent::new(PointerEventKind::Down, start, start);
            rescale.handle_event(&mut map, &down);

            // Alternate between two radii so geometry stays bounded.
            let near = anchor + kurbo::Vec2::new(5000.0, 1.0);
            let far = anchor + kurbo::Vec2::new(5000.0, -1.0);
            let mut flip = false;
            b.iter(|| {
                flip = !flip;
                let at = if flip { near } else { far };
                let drag = MapPointerEvent::new(PointerEventKind::Drag, at, at);
                black_box(rescale.handle_event(&mut map, &drag));
            });
        });
    }

    group.finish();

    let mut group = c.benchmark_group("rescale/membership");

    group.bench_function(BenchmarkId::new("extend", 1024), |b| {
        b.iter_batched(
            || (RescaleInteraction::default(), polygons(1024)),
            |(rescale, features)| {
                rescale.features().extend(features);
                black_box(rescale.anchor());
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function(BenchmarkId::new("centroid", 1024), |b| {
        let set: FeatureSet = polygons(1024).into_iter().collect();
        b.iter(|| black_box(set.centroid()));
    });

    group.finish();
}

criterion_group!(benches, bench_rescale);
criterion_main!(benches);
