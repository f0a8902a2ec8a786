use criterion::{criterion_group, criterion_main, Criterion};
use dtri::config::{ContourConfig, DelaunayConfig};
use dtri::vertex::Vertex;
use dtri::{contour, Triangulation};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

fn undulating_surface(n: usize, rng: &mut SmallRng) -> Triangulation {
  let mut t = Triangulation::new(DelaunayConfig::default());
  for i in 0..n {
    let x: f64 = rng.gen_range(-50.0..50.0);
    let y: f64 = rng.gen_range(-50.0..50.0);
    let z = (x * 0.3).sin() * (y * 0.3).cos() * 10.0;
    t.insert(Vertex::new(x, y, z, i as i32)).ok();
  }
  t
}

pub fn criterion_benchmark(c: &mut Criterion) {
  let mut rng = SmallRng::seed_from_u64(0xdeadbeef);
  let small = undulating_surface(300, &mut rng);
  let large = undulating_surface(3_000, &mut rng);
  let config = ContourConfig::new(vec![-5.0, 0.0, 5.0]);

  c.bench_function("contour::build(3e2)", |b| b.iter(|| contour::build(&small, &config).unwrap()));
  c.bench_function("contour::build(3e3)", |b| b.iter(|| contour::build(&large, &config).unwrap()));
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
