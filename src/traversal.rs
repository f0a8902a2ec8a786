//! Derived iteration over the mesh: triangles, the pinwheel of edges around a vertex, and
//! point-in-polygon classification (C6).

use crate::mesh::{EdgeId, Mesh};
use crate::vertex::VertexId;

/// Visits each finite triangle exactly once, yielding its three directed edges
/// `(e, forward(e), reverse(e))` with `e` chosen as whichever of the three has the smallest
/// index. Ghost triangles (one vertex is [`crate::mesh::GHOST`]) are skipped.
pub fn triangles(mesh: &Mesh) -> impl Iterator<Item = (EdgeId, EdgeId, EdgeId)> + '_ {
  mesh.edges_and_twins().filter_map(move |e| {
    let fe = mesh.forward(e);
    let re = mesh.reverse(e);
    if e.0 > fe.0 || e.0 > re.0 {
      return None;
    }
    if mesh.is_ghost(mesh.apex(e)) {
      return None;
    }
    Some((e, fe, re))
  })
}

/// CCW pinwheel of outgoing edges around vertex `v`, i.e. `e, reverse_from(e), ...` obtained by
/// repeatedly taking `twin(next_dest(twin(e)))`, until the walk returns to the start edge.
/// Includes edges into ghost-adjacent triangles (the hull-boundary spokes); callers filtering
/// finite triangles should check `mesh.apex`.
pub fn pinwheel(mesh: &Mesh, v: VertexId) -> Vec<EdgeId> {
  let Some(start) = mesh.vertex_edge(v) else {
    return Vec::new();
  };
  let mut out = Vec::new();
  let mut e = start;
  loop {
    out.push(e);
    // Edge sharing `v` as origin, next CCW: twin(reverse(e)) walks around the origin vertex,
    // mirroring next_dest's walk around the destination vertex.
    let next = mesh.twin(mesh.reverse(e));
    if next == start || out.len() > mesh.edge_count() * 2 + 4 {
      break;
    }
    e = next;
  }
  out
}

/// Classification of a point against a closed polygon boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointClass {
  Inside,
  Outside,
  OnBoundary,
}

/// Ray-cast point-in-polygon test against a closed sequence of 2D points (first and last may or
/// may not repeat; the edge from the last point back to the first is included automatically).
/// `tolerance` controls the on-boundary band, scaled by the caller via
/// [`crate::predicates::Thresholds::half_plane`] or similar.
pub fn classify_point(polygon: &[[f64; 2]], p: [f64; 2], tolerance: f64) -> PointClass {
  if polygon.len() < 3 {
    return PointClass::Outside;
  }
  let mut inside = false;
  let n = polygon.len();
  for i in 0..n {
    let a = polygon[i];
    let b = polygon[(i + 1) % n];
    if crate::predicates::perpendicular_distance(a, b, p) <= tolerance
      && within_segment_bounds(a, b, p, tolerance)
    {
      return PointClass::OnBoundary;
    }
    let crosses = (a[1] > p[1]) != (b[1] > p[1]);
    if crosses {
      let x_at_y = a[0] + (p[1] - a[1]) / (b[1] - a[1]) * (b[0] - a[0]);
      if x_at_y > p[0] {
        inside = !inside;
      }
    }
  }
  if inside {
    PointClass::Inside
  } else {
    PointClass::Outside
  }
}

fn within_segment_bounds(a: [f64; 2], b: [f64; 2], p: [f64; 2], tolerance: f64) -> bool {
  let min_x = a[0].min(b[0]) - tolerance;
  let max_x = a[0].max(b[0]) + tolerance;
  let min_y = a[1].min(b[1]) - tolerance;
  let max_y = a[1].max(b[1]) + tolerance;
  p[0] >= min_x && p[0] <= max_x && p[1] >= min_y && p[1] <= max_y
}
