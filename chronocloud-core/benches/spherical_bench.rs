use chronocloud_core::math::{cartesian_to_spherical, cartesian_to_spherical_all, AABB};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nalgebra::Vector3;
use rand::{thread_rng, Rng};

fn gen_random_positions(count: usize) -> Vec<Vector3<f64>> {
    let mut rng = thread_rng();
    (0..count)
        .map(|_| {
            Vector3::new(
                rng.gen_range(-50.0..50.0),
                rng.gen_range(-50.0..50.0),
                rng.gen_range(-5.0..5.0),
            )
        })
        .collect()
}

fn spherical_serial(positions: &[Vector3<f64>]) {
    let spherical = positions
        .iter()
        .map(cartesian_to_spherical)
        .collect::<Vec<_>>();
    black_box(spherical);
}

fn spherical_par(positions: &[Vector3<f64>]) {
    black_box(cartesian_to_spherical_all(positions));
}

fn bounds(positions: &[Vector3<f64>]) {
    black_box(AABB::from_points(positions.iter()));
}

fn bench(c: &mut Criterion) {
    let random_positions = gen_random_positions(1 << 16);

    c.bench_function("spherical_serial", |b| {
        b.iter(|| spherical_serial(&random_positions));
    });
    c.bench_function("spherical_par", |b| {
        b.iter(|| spherical_par(&random_positions));
    });
    c.bench_function("aabb_from_points", |b| {
        b.iter(|| bounds(&random_positions));
    });
}

criterion_group! {
    name = spherical;
    config = Criterion::default().sample_size(40);
    targets = bench
}
criterion_main!(spherical);
