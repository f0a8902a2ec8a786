use criterion::{criterion_group, criterion_main, Criterion};
use dtri::config::DelaunayConfig;
use dtri::vertex::Vertex;
use dtri::Triangulation;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

fn random_points(n: usize, rng: &mut SmallRng) -> Vec<Vertex> {
  (0..n)
    .map(|i| Vertex::new(rng.gen_range(-1e3..1e3), rng.gen_range(-1e3..1e3), 0.0, i as i32))
    .collect()
}

pub fn criterion_benchmark(c: &mut Criterion) {
  let mut rng = SmallRng::seed_from_u64(0xdeadbeef);
  let small = random_points(100, &mut rng);
  let medium = random_points(1_000, &mut rng);
  let large = random_points(10_000, &mut rng);

  c.bench_function("insert(1e2)", |b| {
    b.iter(|| {
      let mut t = Triangulation::new(DelaunayConfig::default());
      for &v in &small {
        t.insert(v).ok();
      }
      t
    })
  });
  c.bench_function("insert(1e3)", |b| {
    b.iter(|| {
      let mut t = Triangulation::new(DelaunayConfig::default());
      for &v in &medium {
        t.insert(v).ok();
      }
      t
    })
  });
  c.bench_function("insert(1e4)", |b| {
    b.iter(|| {
      let mut t = Triangulation::new(DelaunayConfig::default());
      for &v in &large {
        t.insert(v).ok();
      }
      t
    })
  });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
