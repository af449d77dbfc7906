use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};

use std::f64::consts::PI;

use hpxcore::{ang2pix_nest, ang2pix_ring, nest2ring, ring2nest};

fn random_positions(n: usize) -> Vec<(f64, f64)> {
  let mut rng = StdRng::seed_from_u64(42);
  (0..n)
    .map(|_| {
      let theta = (1.0 - 2.0 * rng.gen::<f64>()).acos();
      let phi = rng.gen::<f64>() * 2.0 * PI;
      (theta, phi)
    })
    .collect()
}

fn bench_ang2pix(c: &mut Criterion) {
  let mut group = c.benchmark_group("ang2pix");
  let positions = random_positions(10_000);
  for nside in [8192_i64, 1 << 20, 1 << 29] {
    group.bench_with_input(BenchmarkId::new("nest", nside), &nside, |b, &nside| {
      b.iter(|| {
        positions
          .iter()
          .map(|(theta, phi)| ang2pix_nest(nside, *theta, *phi).unwrap_or(0))
          .fold(0_i64, |acc, h| acc ^ h)
      })
    });
    group.bench_with_input(BenchmarkId::new("ring", nside), &nside, |b, &nside| {
      b.iter(|| {
        positions
          .iter()
          .map(|(theta, phi)| ang2pix_ring(nside, *theta, *phi).unwrap_or(0))
          .fold(0_i64, |acc, h| acc ^ h)
      })
    });
  }
  group.bench_function("nest_i32", |b| {
    let nside = black_box(8192_i32);
    b.iter(|| {
      positions
        .iter()
        .map(|(theta, phi)| ang2pix_nest(nside, *theta, *phi).unwrap_or(0))
        .fold(0_i32, |acc, h| acc ^ h)
    })
  });
  group.finish();
}

fn bench_conversion(c: &mut Criterion) {
  let mut group = c.benchmark_group("conversion");
  group.sample_size(20);
  let nside = black_box(1_i64 << 20);
  let npix = 12 * nside * nside;
  let step = (npix / 10_000) as usize;
  group.bench_function("nest2ring", |b| {
    b.iter(|| {
      (0..npix)
        .step_by(step)
        .map(|h| nest2ring(nside, h).unwrap_or(0))
        .fold(0_i64, |acc, h| acc ^ h)
    })
  });
  group.bench_function("ring2nest", |b| {
    b.iter(|| {
      (0..npix)
        .step_by(step)
        .map(|h| ring2nest(nside, h).unwrap_or(0))
        .fold(0_i64, |acc, h| acc ^ h)
    })
  });
  group.finish();
}

criterion_group!(benches, bench_ang2pix, bench_conversion);
criterion_main!(benches);
