//! Alpha-shape extraction: per-edge alpha-circle coverage, triangle solid/exposed
//! classification, boundary cycle tracing and parent/child nesting (C7).

use crate::builder::Triangulation;
use crate::config::AlphaConfig;
use crate::error::{Error, Result};
use crate::mesh::{EdgeId, Mesh};
use crate::predicates::{self, Thresholds};
use crate::traversal::{self, PointClass};
use crate::vertex::VertexId;
use std::collections::HashSet;

/// Shape of one traced alpha-shape boundary component.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PartKind {
  /// A closed boundary enclosing non-zero area.
  Polygon,
  /// A closed boundary whose signed area fell below [`Thresholds::area_zero`] — a sliver of
  /// solid triangles thin enough to report as a line rather than a region.
  OpenLine,
  /// An isolated vertex with no solid triangle touching it — a point too far from any neighbor
  /// to be covered by an alpha circle, emitted as a zero-area point feature.
  Vertices,
}

/// One boundary component of the alpha shape, plus the nesting relationship the caller needs to
/// tell a hole from an island.
#[derive(Clone, Debug)]
pub struct AlphaPart {
  pub kind: PartKind,
  /// Vertices of the boundary cycle in traversal order (CCW for an outer boundary).
  pub boundary: Vec<VertexId>,
  pub absolute_area: f64,
  /// Area with nested children's area removed, i.e. the area actually covered at this nesting
  /// level.
  pub adjusted_area: f64,
  /// Index, in the returned `Vec`, of the part this one nests directly inside.
  pub parent: Option<usize>,
}

impl AlphaPart {
  pub fn is_open_line(&self) -> bool {
    self.kind == PartKind::OpenLine
  }

  /// Whether this part has an area-bearing boundary (excludes open lines and point features).
  fn is_polygon(&self) -> bool {
    self.kind == PartKind::Polygon
  }
}

pub fn extract(tri: &Triangulation, config: &AlphaConfig) -> Result<Vec<AlphaPart>> {
  if config.radius <= 0.0 {
    return Err(Error::DegenerateInput);
  }
  let mesh = tri.mesh();
  let thresholds = tri.thresholds();

  let boundary_edges: Vec<EdgeId> = mesh
    .edges_and_twins()
    .filter(|&e| is_boundary_edge(mesh, thresholds, config, e))
    .collect();

  let cycles = trace_cycles(mesh, &boundary_edges);

  let mut parts: Vec<AlphaPart> = cycles
    .into_iter()
    .map(|cycle| build_part(mesh, thresholds, cycle))
    .collect();

  for v in mesh.vertices() {
    if mesh.is_ghost(v) || is_covered_by_some_triangle(mesh, thresholds, config, v) {
      continue;
    }
    parts.push(AlphaPart {
      kind: PartKind::Vertices,
      boundary: vec![v],
      absolute_area: 0.0,
      adjusted_area: 0.0,
      parent: None,
    });
  }

  parts.sort_by_key(|p| std::cmp::Reverse(ordered_float::OrderedFloat(p.absolute_area.abs())));
  assign_nesting(mesh, &mut parts);
  Ok(parts)
}

/// Whether `v` touches at least one solid (fully alpha-covered) triangle, on either side of any
/// of its incident edges.
fn is_covered_by_some_triangle(mesh: &Mesh, thresholds: &Thresholds, config: &AlphaConfig, v: VertexId) -> bool {
  let pin = traversal::pinwheel(mesh, v);
  pin.iter().any(|&spoke| {
    (!mesh.is_ghost(mesh.apex(spoke)) && is_solid_triangle(mesh, thresholds, config, spoke))
      || (!mesh.is_ghost(mesh.apex(mesh.twin(spoke))) && is_solid_triangle(mesh, thresholds, config, mesh.twin(spoke)))
  })
}

fn covered(mesh: &Mesh, thresholds: &Thresholds, config: &AlphaConfig, e: EdgeId) -> bool {
  let apex = mesh.apex(e);
  if mesh.is_ghost(apex) {
    return false;
  }
  let p = mesh.point(mesh.origin(e)).xy();
  let q = mesh.point(mesh.dest(e)).xy();
  let Some((c1, c2)) = alpha_circle_centers(p, q, config.radius) else {
    return false;
  };
  let a = mesh.point(apex).xy();
  let inflated = config.radius * thresholds.circumradius_inflation;
  let in1 = predicates::squared_distance(c1, a) <= inflated * inflated;
  let in2 = predicates::squared_distance(c2, a) <= inflated * inflated;
  if config.classic_definition {
    in1 && in2
  } else {
    in1 || in2
  }
}

/// Centers of the (up to two) circles of `radius` passing through `p` and `q`. `None` if `p`
/// and `q` are farther apart than the circle's diameter.
fn alpha_circle_centers(p: [f64; 2], q: [f64; 2], radius: f64) -> Option<([f64; 2], [f64; 2])> {
  let d = predicates::distance(p, q);
  if d <= 0.0 {
    return None;
  }
  let half = d / 2.0;
  let h2 = radius * radius - half * half;
  if h2 < 0.0 {
    return None;
  }
  let h = h2.max(0.0).sqrt();
  let mid = [(p[0] + q[0]) / 2.0, (p[1] + q[1]) / 2.0];
  let ux = (q[0] - p[0]) / d;
  let uy = (q[1] - p[1]) / d;
  let nx = -uy;
  let ny = ux;
  Some((
    [mid[0] + nx * h, mid[1] + ny * h],
    [mid[0] - nx * h, mid[1] - ny * h],
  ))
}

fn is_solid_triangle(mesh: &Mesh, thresholds: &Thresholds, config: &AlphaConfig, e: EdgeId) -> bool {
  if mesh.is_ghost(mesh.apex(e)) {
    return false;
  }
  let fe = mesh.forward(e);
  let re = mesh.reverse(e);
  covered(mesh, thresholds, config, e) && covered(mesh, thresholds, config, fe) && covered(mesh, thresholds, config, re)
}

fn is_boundary_edge(mesh: &Mesh, thresholds: &Thresholds, config: &AlphaConfig, e: EdgeId) -> bool {
  let here = is_solid_triangle(mesh, thresholds, config, e);
  let there = is_solid_triangle(mesh, thresholds, config, mesh.twin(e));
  here && !there
}

/// Traces each boundary component as a vertex cycle, starting from every still-unvisited
/// boundary edge.
fn trace_cycles(mesh: &Mesh, boundary_edges: &[EdgeId]) -> Vec<Vec<VertexId>> {
  let boundary: HashSet<EdgeId> = boundary_edges.iter().copied().collect();
  let mut visited: HashSet<EdgeId> = HashSet::new();
  let mut cycles = Vec::new();
  for &start in boundary_edges {
    if visited.contains(&start) {
      continue;
    }
    let mut cycle = Vec::new();
    let mut e = start;
    let budget = mesh.edge_count() * 4 + 16;
    for _ in 0..budget {
      visited.insert(e);
      cycle.push(mesh.origin(e));
      let next = next_boundary_edge(mesh, &boundary, e);
      if next == start {
        break;
      }
      e = next;
    }
    if cycle.len() >= 3 {
      cycles.push(cycle);
    }
  }
  cycles
}

/// Rotates around `dest(e)` until the next boundary edge is found. Guaranteed to terminate
/// because `dest(e)`'s triangle fan is finite and `e` itself is boundary.
fn next_boundary_edge(mesh: &Mesh, boundary: &HashSet<EdgeId>, e: EdgeId) -> EdgeId {
  let mut cur = mesh.forward(e);
  let budget = mesh.edge_count() * 2 + 16;
  for _ in 0..budget {
    if boundary.contains(&cur) {
      return cur;
    }
    cur = mesh.forward(mesh.twin(cur));
  }
  cur
}

fn build_part(mesh: &Mesh, thresholds: &Thresholds, cycle: Vec<VertexId>) -> AlphaPart {
  let points: Vec<[f64; 2]> = cycle.iter().map(|&v| mesh.point(v).xy()).collect();
  let mut area2 = 0.0;
  for i in 0..points.len() {
    let a = points[i];
    let b = points[(i + 1) % points.len()];
    area2 += a[0] * b[1] - b[0] * a[1];
  }
  let area = area2 / 2.0;
  let kind = if area.abs() < thresholds.area_zero {
    PartKind::OpenLine
  } else {
    PartKind::Polygon
  };
  AlphaPart {
    kind,
    boundary: cycle,
    absolute_area: area,
    adjusted_area: area,
    parent: None,
  }
}

/// Assigns each part's nearest strictly-larger enclosing part as its parent, then subtracts
/// child area from parent `adjusted_area` (a hole reduces its parent's covered area; an island
/// inside a hole restores it, alternating by nesting depth).
fn assign_nesting(mesh: &Mesh, parts: &mut [AlphaPart]) {
  let probe_points: Vec<[f64; 2]> = parts
    .iter()
    .map(|p| mesh.point(*p.boundary.first().unwrap_or(&VertexId(0))).xy())
    .collect();
  let polygons: Vec<Vec<[f64; 2]>> = parts
    .iter()
    .map(|p| p.boundary.iter().map(|&v| mesh.point(v).xy()).collect())
    .collect();

  for i in 0..parts.len() {
    if !parts[i].is_polygon() {
      continue;
    }
    for j in 0..i {
      if !parts[j].is_polygon() {
        continue;
      }
      if traversal::classify_point(&polygons[j], probe_points[i], 0.0) != PointClass::Outside {
        parts[i].parent = Some(j);
        break;
      }
    }
  }

  // A part nested directly inside another alternates polarity with its nesting depth: a hole
  // removes area from its parent, an island inside that hole restores it, and so on.
  for i in 0..parts.len() {
    if let Some(parent) = parts[i].parent {
      let child_area = parts[i].adjusted_area.abs();
      parts[parent].adjusted_area -= child_area;
    }
  }
}
