use dtri::config::{AlphaConfig, ContourConfig, DelaunayConfig};
use dtri::constraint::{insert_constraint, Constraint};
use dtri::traversal::{self, PointClass};
use dtri::vertex::Vertex;
use dtri::{alpha, contour, integrity, Locate, Triangulation};

fn v(x: f64, y: f64, idx: i32) -> Vertex {
  Vertex::new(x, y, 0.0, idx)
}

fn hull_area(t: &Triangulation) -> f64 {
  traversal::triangles(t.mesh())
    .map(|(e, fe, re)| {
      let a = t.mesh().point(t.mesh().origin(e));
      let b = t.mesh().point(t.mesh().origin(fe));
      let c = t.mesh().point(t.mesh().origin(re));
      dtri::predicates::signed_area_2x(a.xy(), b.xy(), c.xy()).abs() / 2.0
    })
    .sum()
}

#[test]
fn unit_square_no_diagonal_preference() {
  let mut t = Triangulation::new(DelaunayConfig::default());
  t.insert(v(0.0, 0.0, 0)).ok();
  t.insert(v(1.0, 0.0, 1)).ok();
  t.insert(v(1.0, 1.0, 2)).ok();
  t.insert(v(0.0, 1.0, 3)).unwrap();
  assert_eq!(traversal::triangles(t.mesh()).count(), 2);
  assert!((hull_area(&t) - 1.0).abs() < 1e-9);
  integrity::check(&t).expect("unit square should satisfy all invariants");
}

#[test]
fn skinny_triangle_is_accepted() {
  let mut t = Triangulation::new(DelaunayConfig::default());
  t.insert(v(0.0, 0.0, 0)).ok();
  t.insert(v(10.0, 0.0, 1)).ok();
  t.insert(v(5.0, 0.1, 2)).unwrap();
  assert_eq!(traversal::triangles(t.mesh()).count(), 1);
  integrity::check(&t).expect("a single sliver triangle trivially satisfies Delaunay");
}

#[test]
fn fanout_contour_produces_two_equal_area_regions() {
  let mut t = Triangulation::new(DelaunayConfig::default());
  let pts = [
    (0.0, 0.0, 40.0),
    (1.0, 0.0, 0.0),
    (2.0, 0.0, 40.0),
    (3.0, 0.0, 0.0),
    (4.0, 0.0, 40.0),
    (2.0, 5.0, 20.0),
    (2.0, -5.0, 20.0),
  ];
  for (i, (x, y, z)) in pts.iter().enumerate() {
    t.insert(Vertex::new(*x, *y, *z, i as i32)).ok();
  }
  let set = contour::build(&t, &ContourConfig::new(vec![20.0])).unwrap();

  // The level 20 threads between the two low points (1.0, 0.0, 0) and (3.0, 0.0, 0), each
  // entirely encircled by its own closed contour, with the two saddle vertices at z=20 as
  // shared fan junctions. By the left-right mirror symmetry of the point layout about x=2,
  // the two resulting low-band regions must carry equal area.
  let closed_count = set.contours.iter().filter(|c| c.closed).count();
  assert_eq!(closed_count, 2, "expected one closed contour around each low point");

  let children: Vec<&dtri::contour::ContourRegion> = set.regions.iter().filter(|r| r.parent.is_some()).collect();
  assert_eq!(children.len(), 2, "expected exactly two nested low-band regions");
  let (a, b) = (children[0].absolute_area.abs(), children[1].absolute_area.abs());
  assert!((a - b).abs() < a.max(b) * 1e-6, "the two low-band regions should have equal area, got {a} and {b}");

  let total_area: f64 = set.regions.iter().map(|r| r.adjusted_area).sum();
  assert!((total_area - hull_area(&t)).abs() < hull_area(&t) * 1e-6);
}

#[test]
fn dense_disc_alpha_shape_matches_convex_hull_as_radius_grows() {
  let mut t = Triangulation::new(DelaunayConfig::default());
  let mut idx = 0;
  for gx in 0..5 {
    for gy in 0..5 {
      t.insert(v(gx as f64, gy as f64, idx)).ok();
      idx += 1;
    }
  }
  let parts = alpha::extract(&t, &AlphaConfig::new(100.0)).unwrap();
  let hull = hull_area(&t);
  let outer = parts
    .iter()
    .max_by(|a, b| a.absolute_area.abs().partial_cmp(&b.absolute_area.abs()).unwrap())
    .unwrap();
  assert!((outer.absolute_area.abs() - hull).abs() < hull * 1e-6);
}

#[test]
fn constrained_square_with_diagonal_blocks_flip_and_labels_consistently() {
  let mut t = Triangulation::new(DelaunayConfig::default());
  t.insert(v(0.0, 0.0, 0)).ok();
  t.insert(v(4.0, 0.0, 1)).ok();
  t.insert(v(4.0, 4.0, 2)).ok();
  t.insert(v(0.0, 4.0, 3)).unwrap();
  t.insert(v(2.0, 2.0, 4)).unwrap();

  let corners: Vec<_> = [(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)]
    .iter()
    .map(|(x, y)| match t.locate(*x, *y).unwrap() {
      Locate::Vertex(id) => id,
      other => panic!("expected vertex, got {other:?}"),
    })
    .collect();

  let border_index = insert_constraint(&mut t, &Constraint::polygon(corners.clone())).unwrap();
  let diagonal = Constraint::linear(vec![corners[0], corners[2]]);
  insert_constraint(&mut t, &diagonal).unwrap();

  integrity::check(&t).expect("constrained square with interior point should satisfy all invariants");

  let diagonal_edge = traversal::pinwheel(t.mesh(), corners[0])
    .into_iter()
    .find(|&e| t.mesh().dest(e) == corners[2])
    .expect("diagonal must exist as a mesh edge after constraint insertion");
  assert!(t.mesh().is_constrained(diagonal_edge));

  // Every region-interior edge still agrees with the polygon's own constraint index: the
  // diagonal only splits the one labeled region into two triangles, it does not relabel it.
  use dtri::mesh::EdgeFlags;
  for e in t.mesh().edges_and_twins() {
    if t.mesh().flags_of(e).contains(EdgeFlags::REGION_INTERIOR) || t.mesh().flags_of(e).contains(EdgeFlags::REGION_BORDER) {
      assert_eq!(t.mesh().constraint_index(e), Some(border_index));
    }
  }
}

#[test]
fn lake_with_island_area_matches_polygon_difference() {
  let mut t = Triangulation::new(DelaunayConfig::default());
  let lake = [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)];
  let island = [(4.0, 4.0), (6.0, 4.0), (6.0, 6.0), (4.0, 6.0)];
  let mut idx = 0;
  let mut lake_ids = Vec::new();
  for (x, y) in lake {
    t.insert(Vertex::new(x, y, 0.0, idx)).ok();
    idx += 1;
  }
  for (x, y) in lake {
    lake_ids.push(match t.locate(x, y).unwrap() {
      Locate::Vertex(id) => id,
      _ => unreachable!(),
    });
  }
  let mut island_ids = Vec::new();
  for (x, y) in island {
    t.insert(Vertex::new(x, y, 0.0, idx)).unwrap();
    island_ids.push(match t.locate(x, y).unwrap() {
      Locate::Vertex(id) => id,
      _ => unreachable!(),
    });
    idx += 1;
  }
  // soundings scattered around the lake, away from both boundaries
  for (x, y) in [(1.0, 1.0), (8.0, 1.0), (1.0, 8.0), (8.0, 8.0), (2.0, 5.0)] {
    t.insert(Vertex::new(x, y, -3.0, idx)).unwrap();
    idx += 1;
  }

  let lake_index = insert_constraint(&mut t, &Constraint::polygon(lake_ids)).unwrap();
  // Opposite winding (CW) marks the island as a hole in the lake region.
  let mut island_cw = island_ids.clone();
  island_cw.reverse();
  insert_constraint(&mut t, &Constraint::polygon(island_cw)).unwrap();

  integrity::check(&t).expect("lake-with-island layout should satisfy all invariants");

  let probe = [2.0, 5.0];
  let lake_poly: Vec<[f64; 2]> = lake.to_vec();
  let island_poly: Vec<[f64; 2]> = island.to_vec();
  assert_eq!(traversal::classify_point(&lake_poly, probe, 1e-9), PointClass::Inside);
  assert_eq!(traversal::classify_point(&island_poly, probe, 1e-9), PointClass::Outside);

  use dtri::mesh::EdgeFlags;
  let mut water_area = 0.0;
  for (e, fe, re) in traversal::triangles(t.mesh()) {
    let labeled_lake = [e, fe, re].iter().any(|&edge| {
      (t.mesh().flags_of(edge).contains(EdgeFlags::REGION_INTERIOR)
        || t.mesh().flags_of(edge).contains(EdgeFlags::REGION_BORDER))
        && t.mesh().constraint_index(edge) == Some(lake_index)
    });
    if labeled_lake {
      let a = t.mesh().point(t.mesh().origin(e));
      let b = t.mesh().point(t.mesh().origin(fe));
      let c = t.mesh().point(t.mesh().origin(re));
      water_area += dtri::predicates::signed_area_2x(a.xy(), b.xy(), c.xy()).abs() / 2.0;
    }
  }
  let expected_water_area = 100.0 - 4.0; // lake polygon area minus the island hole it excludes
  assert!(
    (water_area - expected_water_area).abs() < 1e-6,
    "water area should equal the lake polygon's area minus the island's, got {water_area}"
  );
}
