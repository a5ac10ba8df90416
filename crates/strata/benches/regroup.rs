use std::hint::black_box;
use std::sync::Arc;

use criterion::{Criterion, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use strata::{Column, GroupedView, GroupingParameters, SortSpec, Value};

#[derive(Clone)]
struct Reading {
    station: String,
    day: i64,
    celsius: f64,
}

fn random_readings(count: usize) -> Vec<Reading> {
    let mut rng = StdRng::seed_from_u64(99);
    (0..count)
        .map(|_| Reading {
            station: format!("station-{:02}", rng.gen_range(0..40)),
            day: rng.gen_range(0..365),
            celsius: rng.gen_range(-30.0..45.0),
        })
        .collect()
}

fn params() -> GroupingParameters<Reading> {
    let station = Column::new("Station", |r: &Reading| Value::from(r.station.as_str()));
    let day = Column::new("Day", |r: &Reading| Value::from(r.day));
    let celsius = Column::new("Temperature", |r: &Reading| Value::from(r.celsius));

    GroupingParameters::new(SortSpec::ascending(station))
        .with_primary_sort(SortSpec::ascending(day))
        .with_secondary_sort(SortSpec::descending(celsius))
        .with_title_format("{0} ({1})")
}

fn bench_rebuild(c: &mut Criterion) {
    let mut group = c.benchmark_group("Full rebuild");
    group.sample_size(20);

    for count in [1_000usize, 10_000, 50_000] {
        let view = GroupedView::new(Arc::new(random_readings(count)));
        let parameters = params();

        group.bench_function(format!("{count} rows"), |b| {
            b.iter(|| black_box(view.build_groups(parameters.clone())))
        });
    }

    group.finish();
}

fn bench_reverse_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("Reverse queries");

    let count = 10_000usize;
    let view = GroupedView::new(Arc::new(random_readings(count)));
    view.build_groups(params());

    group.bench_function("group_of_item sweep", |b| {
        b.iter(|| {
            for index in 0..count {
                black_box(view.group_of_item(black_box(index)));
            }
        })
    });

    group.bench_function("round trip", |b| {
        b.iter(|| {
            for index in (0..count).step_by(7) {
                let g = view.group_of_item(index);
                let p = view.position_within_group(g, index).unwrap();
                black_box(view.member_of_group(g, p));
            }
        })
    });

    group.finish();
}

criterion_group!(benches, bench_rebuild, bench_reverse_queries);
criterion_main!(benches);
