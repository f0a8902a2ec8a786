use dtri::config::DelaunayConfig;
use dtri::traversal;
use dtri::vertex::Vertex;
use dtri::{integrity, Locate, Triangulation};
use proptest::prelude::*;
use test_strategy::proptest;

fn build(points: &[(f64, f64)]) -> Triangulation {
  let mut t = Triangulation::new(DelaunayConfig::default());
  for (i, (x, y)) in points.iter().enumerate() {
    t.insert(Vertex::new(*x, *y, 0.0, i as i32)).ok();
  }
  t
}

fn build_indexed(points: &[(f64, f64, i32)]) -> Triangulation {
  let mut t = Triangulation::new(DelaunayConfig::default());
  for (x, y, idx) in points {
    t.insert(Vertex::new(*x, *y, 0.0, *idx)).ok();
  }
  t
}

/// Canonical form for P5: each triangle as its sorted tuple of the caller-supplied `Vertex::index`
/// values (stable identity, unlike the mesh's own `VertexId` which depends on push order),
/// collected into a sorted vector so two triangulations of the same point set (any insertion
/// order) compare equal regardless of which directed edge each triangle happened to be indexed
/// from.
fn canonical_triangles(t: &Triangulation) -> Vec<[i32; 3]> {
  let mut out: Vec<[i32; 3]> = traversal::triangles(t.mesh())
    .map(|(e, fe, re)| {
      let mut ids = [
        t.mesh().point(t.mesh().origin(e)).index,
        t.mesh().point(t.mesh().origin(fe)).index,
        t.mesh().point(t.mesh().origin(re)).index,
      ];
      ids.sort_unstable();
      ids
    })
    .collect();
  out.sort_unstable();
  out
}

/// P1, P3: a freshly built triangulation from any scattered point set satisfies the Delaunay
/// in-circle criterion on every non-constrained edge, and twin pairing is a consistent
/// involution. `integrity::check` audits both directly.
#[proptest]
fn delaunay_invariant_holds_for_random_point_sets(
  #[strategy(prop::collection::vec((-50.0f64..50.0, -50.0f64..50.0), 4..24))] pts: Vec<(f64, f64)>,
) {
  let t = build(&pts);
  if t.is_bootstrapped() {
    integrity::check(&t).expect("any scattered point set should yield a valid Delaunay mesh");
  }
}

/// P4: re-inserting a point that coincides with an existing vertex leaves edge count unchanged
/// and reports the existing vertex's index back to the caller.
#[proptest]
fn duplicate_insertion_is_idempotent(
  #[strategy(prop::collection::vec((-50.0f64..50.0, -50.0f64..50.0), 3..16))] pts: Vec<(f64, f64)>,
) {
  let mut t = build(&pts);
  prop_assume!(t.is_bootstrapped());
  let before = t.mesh().edge_count();
  let (x, y) = pts[0];
  let existing_index = match t.locate(x, y) {
    Ok(Locate::Vertex(v)) => t.mesh().point(v).index,
    _ => return,
  };
  let result = t.insert(Vertex::new(x, y, 0.0, -999));
  prop_assert_eq!(result, Err(dtri::Error::DuplicateVertex { existing_index }));
  prop_assert_eq!(t.mesh().edge_count(), before);
}

/// P5: triangulating the same point set in a different insertion order yields the same set of
/// triangles up to relabeling which directed edge indexes each one.
#[proptest]
fn construction_order_independence(
  #[strategy(prop::collection::vec((-30.0f64..30.0, -30.0f64..30.0), 4..16))] pts: Vec<(f64, f64)>,
  seed: u64,
) {
  let indexed: Vec<(f64, f64, i32)> = pts.iter().enumerate().map(|(i, (x, y))| (*x, *y, i as i32)).collect();
  let n = indexed.len();
  let mut shuffled = indexed.clone();
  // A cheap deterministic shuffle (no RNG dependency beyond a seed-derived stride) so the
  // property is reproducible from the failing seed proptest reports. Original indices travel
  // with each point so canonical_triangles can match points up across insertion orders.
  if n > 1 {
    let stride = 1 + (seed as usize % (n - 1));
    let mut reordered = Vec::with_capacity(n);
    let mut i = 0usize;
    let mut seen = vec![false; n];
    for _ in 0..n {
      while seen[i] {
        i = (i + 1) % n;
      }
      reordered.push(shuffled[i]);
      seen[i] = true;
      i = (i + stride) % n;
    }
    shuffled = reordered;
  }
  let a = build_indexed(&indexed);
  let b = build_indexed(&shuffled);
  if a.is_bootstrapped() && b.is_bootstrapped() {
    prop_assert_eq!(canonical_triangles(&a), canonical_triangles(&b));
  }
}
