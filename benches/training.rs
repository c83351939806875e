use adclick::synthetic::{Sampler, SMOTEENN};
use adclick::training::{GradientBoostingClassifier, GradientBoostingConfig};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::{Array1, Array2};
use rand::prelude::*;

/// Two noisy blobs, roughly one positive for every four negatives
fn create_classification_data(n_rows: usize, n_features: usize) -> (Array2<f64>, Array1<i64>) {
    let mut rng = StdRng::seed_from_u64(7);
    let y: Array1<i64> = (0..n_rows)
        .map(|_| if rng.gen::<f64>() < 0.2 { 1 } else { 0 })
        .collect();
    let x = Array2::from_shape_fn((n_rows, n_features), |(i, _)| {
        let shift = if y[i] == 1 { 1.5 } else { 0.0 };
        rng.gen::<f64>() * 2.0 + shift
    });
    (x, y)
}

fn bench_gradient_boosting(c: &mut Criterion) {
    let mut group = c.benchmark_group("gradient_boosting");
    group.sample_size(10);

    for n_rows in [1000, 5000].iter() {
        let (x, y) = create_classification_data(*n_rows, 16);

        group.bench_with_input(BenchmarkId::new("fit", n_rows), n_rows, |b, _| {
            b.iter(|| {
                let mut model = GradientBoostingClassifier::new(GradientBoostingConfig {
                    n_estimators: 50,
                    ..GradientBoostingConfig::default()
                });
                model.fit(black_box(&x), black_box(&y)).unwrap();
                model
            })
        });
    }

    group.finish();
}

fn bench_predict(c: &mut Criterion) {
    let (x, y) = create_classification_data(5000, 16);
    let mut model = GradientBoostingClassifier::new(GradientBoostingConfig::default());
    model.fit(&x, &y).unwrap();

    c.bench_function("gradient_boosting/predict_proba_5000", |b| {
        b.iter(|| model.predict_proba(black_box(&x)).unwrap())
    });
}

fn bench_smoteenn(c: &mut Criterion) {
    let mut group = c.benchmark_group("smoteenn");
    group.sample_size(10);

    for n_rows in [500, 2000].iter() {
        let (x, y) = create_classification_data(*n_rows, 16);

        group.bench_with_input(BenchmarkId::new("fit_resample", n_rows), n_rows, |b, _| {
            b.iter(|| {
                let mut sampler = SMOTEENN::new().with_seed(42);
                sampler.fit_resample(black_box(&x), black_box(&y)).unwrap()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_gradient_boosting, bench_predict, bench_smoteenn);
criterion_main!(benches);
