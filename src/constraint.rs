//! Linear and polygon constraint insertion, edge-crossing resolution, synthetic vertex
//! placement at true constraint intersections, and region labeling by flood fill (C5).
//!
//! A constraint segment that crosses only *unconstrained* mesh edges is routed through by
//! flipping each crossing edge in turn (Anglada's algorithm) until it exists as a mesh edge
//! outright — this reaches the same constrained-Delaunay postcondition as ear-clipping
//! re-triangulation without needing a separate polygon-rebuild step. A constraint segment that
//! crosses a *foreign* constrained edge is different: that is a true geometric intersection
//! between two constraints, resolved by splitting both at a synthetic vertex placed at their
//! exact intersection point.

use crate::builder::Triangulation;
use crate::error::{Error, Result};
use crate::mesh::{EdgeId, EdgeFlags, Mesh};
use crate::predicates::{self, Orientation};
use crate::traversal;
use crate::vertex::{Vertex, VertexId};
use std::any::Any;
use std::collections::HashSet;

/// Whether a constraint is a standalone polyline or a closed polygon (used for region labeling).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConstraintKind {
  Linear,
  Polygon,
}

/// A user-supplied constraint: an ordered chain of existing vertices plus an opaque payload the
/// engine never interprets (matching a generic "user data" slot seen across this crate's GIS and
/// CAD-oriented neighbors).
pub struct Constraint {
  pub kind: ConstraintKind,
  pub vertices: Vec<VertexId>,
  pub app_data: Option<Box<dyn Any + Send + Sync>>,
}

impl Constraint {
  pub fn linear(vertices: Vec<VertexId>) -> Self {
    Constraint {
      kind: ConstraintKind::Linear,
      vertices,
      app_data: None,
    }
  }

  pub fn polygon(vertices: Vec<VertexId>) -> Self {
    Constraint {
      kind: ConstraintKind::Polygon,
      vertices,
      app_data: None,
    }
  }
}

fn walk_budget(mesh: &Mesh) -> usize {
  mesh.edge_count() * 4 + 64
}

/// Inserts a constraint into the triangulation, returning the index it was stamped with. If the
/// constraint is a [`ConstraintKind::Polygon`], its interior is flood-filled and every crossed
/// non-border edge is stamped [`EdgeFlags::REGION_INTERIOR`] with the same index.
pub fn insert_constraint(tri: &mut Triangulation, constraint: &Constraint) -> Result<u16> {
  if constraint.vertices.len() < 2 {
    return Err(Error::DegenerateInput);
  }
  let index = tri.next_constraint_index;
  tri.next_constraint_index = tri
    .next_constraint_index
    .checked_add(1)
    .ok_or(Error::InvariantViolation {
      reason: "constraint index space exhausted",
    })?;
  tracing::debug!(index, kind = ?constraint.kind, vertex_count = constraint.vertices.len(), "inserting constraint");

  let n = constraint.vertices.len();
  let segment_count = match constraint.kind {
    ConstraintKind::Linear => n - 1,
    ConstraintKind::Polygon => n,
  };
  for i in 0..segment_count {
    let a = constraint.vertices[i];
    let b = constraint.vertices[(i + 1) % n];
    insert_constrained_segment(tri, a, b, index)?;
  }

  for &v in &constraint.vertices {
    tri.mesh_mut().set_flag(v, crate::vertex::VertexFlags::CONSTRAINT_MEMBER);
  }

  if matches!(constraint.kind, ConstraintKind::Polygon) {
    let a = constraint.vertices[0];
    let b = constraint.vertices[1 % n];
    if let Some(seed) = find_edge(tri.mesh(), a, b) {
      if !tri.mesh().is_ghost(tri.mesh().apex(seed)) {
        flood_label(tri.mesh_mut(), seed, index);
      }
    }
  }

  if tri.config_restore_conformity() {
    restore_conformity(tri);
  }

  Ok(index)
}

/// Finds the directed edge `a -> b`, if one already exists in the mesh.
fn find_edge(mesh: &Mesh, a: VertexId, b: VertexId) -> Option<EdgeId> {
  for e in traversal::pinwheel(mesh, a) {
    if mesh.dest(e) == b {
      return Some(e);
    }
  }
  None
}

fn mark_constrained(mesh: &mut Mesh, e: EdgeId, index: u16) {
  mesh.set_flags(e, EdgeFlags::CONSTRAINED | EdgeFlags::LINE_MEMBER);
  mesh.set_flags(e.twin(), EdgeFlags::CONSTRAINED | EdgeFlags::LINE_MEMBER);
  mesh.set_constraint_index(e, index);
  mesh.set_constraint_index(e.twin(), index);
}

fn insert_constrained_segment(tri: &mut Triangulation, a: VertexId, b: VertexId, index: u16) -> Result<()> {
  if a == b {
    return Ok(());
  }
  let budget = walk_budget(tri.mesh());
  for _ in 0..budget {
    if let Some(e) = find_edge(tri.mesh(), a, b) {
      mark_constrained(tri.mesh_mut(), e, index);
      return Ok(());
    }
    match first_crossing(tri, a, b)? {
      Crossing::Through(mid) => {
        insert_constrained_segment(tri, a, mid, index)?;
        insert_constrained_segment(tri, mid, b, index)?;
        return Ok(());
      }
      Crossing::Edge(opp) => {
        match resolve_one_crossing(tri, a, b, opp, index)? {
          Some(mid) => {
            insert_constrained_segment(tri, a, mid, index)?;
            insert_constrained_segment(tri, mid, b, index)?;
            return Ok(());
          }
          None => continue,
        }
      }
    }
  }
  Err(Error::InvariantViolation {
    reason: "constraint insertion exceeded its step budget",
  })
}

enum Crossing {
  /// The segment passes exactly through an existing vertex, which is not `a` or `b`.
  Through(VertexId),
  /// The segment crosses the interior of this mesh edge.
  Edge(EdgeId),
}

/// Finds the first mesh edge (not touching `a`) crossed by the open segment `a -> b`, by walking
/// the wedge of triangles fanned around `a` until the one containing direction `b` is found.
fn first_crossing(tri: &Triangulation, a: VertexId, b: VertexId) -> Result<Crossing> {
  let mesh = tri.mesh();
  let pa = mesh.point(a).xy();
  let pb = mesh.point(b).xy();
  let spokes = traversal::pinwheel(mesh, a);
  for &e in &spokes {
    let p = mesh.dest(e);
    if mesh.is_ghost(p) {
      continue;
    }
    let p_next = mesh.apex(e);
    if mesh.is_ghost(p_next) {
      continue;
    }
    let pp = mesh.point(p).xy();
    let pn = mesh.point(p_next).xy();
    let side_p = predicates::orient(pa, pp, pb, tri.thresholds());
    let side_n = predicates::orient(pa, pn, pb, tri.thresholds());
    if side_p == Orientation::Clockwise || side_n == Orientation::CounterClockwise {
      continue;
    }
    // b lies within the wedge [p, p_next) swept CCW from a.
    if side_p == Orientation::Colinear && is_between(pa, pp, pb) {
      return Ok(Crossing::Through(p));
    }
    if side_n == Orientation::Colinear && is_between(pa, pn, pb) {
      return Ok(Crossing::Through(p_next));
    }
    return Ok(Crossing::Edge(mesh.forward(e)));
  }
  Err(Error::InvariantViolation {
    reason: "constraint endpoint could not be located in any triangle fan",
  })
}

fn is_between(a: [f64; 2], m: [f64; 2], b: [f64; 2]) -> bool {
  let total = predicates::distance(a, b);
  let split = predicates::distance(a, m) + predicates::distance(m, b);
  (split - total).abs() <= total.max(1.0) * 1e-9
}

/// Attempts to remove one crossing of `a -> b` against `opp` (an edge not touching `a` or `b`).
/// Returns `Ok(Some(mid))` if a synthetic vertex `mid` was inserted (caller must recurse on the
/// two halves), `Ok(None)` if a flip resolved it (caller should re-scan from `a`), or an error.
fn resolve_one_crossing(
  tri: &mut Triangulation,
  a: VertexId,
  b: VertexId,
  opp: EdgeId,
  index: u16,
) -> Result<Option<VertexId>> {
  if tri.mesh().is_constrained(opp) {
    let pa = tri.mesh().point(a).xy();
    let pb = tri.mesh().point(b).xy();
    let pc = tri.mesh().point(tri.mesh().origin(opp)).xy();
    let pd = tri.mesh().point(tri.mesh().dest(opp)).xy();
    match segment_intersection(pa, pb, pc, pd) {
      Some(point) => {
        let z = interpolate_z(tri.mesh(), opp, point);
        let v = Vertex::new(point[0], point[1], z, synthetic_index(tri));
        let mid = tri.insert_synthetic_on_edge(opp, v);
        let _ = index;
        Ok(Some(mid))
      }
      None => Err(Error::ConstraintSelfIntersection { a, b }),
    }
  } else {
    match tri.flip_edge_if_convex(opp) {
      Some(_) => Ok(None),
      None => Err(Error::InvariantViolation {
        reason: "constraint crosses a non-convex quadrilateral it cannot flip",
      }),
    }
  }
}

fn synthetic_index(tri: &Triangulation) -> i32 {
  -(tri.mesh().vertex_count() as i32) - 1
}

fn interpolate_z(mesh: &Mesh, e: EdgeId, point: [f64; 2]) -> f64 {
  let a = mesh.point(mesh.origin(e));
  let b = mesh.point(mesh.dest(e));
  let len = predicates::distance(a.xy(), b.xy());
  if len <= 0.0 {
    return a.z;
  }
  let t = (predicates::distance(a.xy(), point) / len).clamp(0.0, 1.0);
  a.z + (b.z - a.z) * t
}

/// Exact intersection point of two segments, `None` if parallel/colinear (overlap must be
/// reported as a self-intersection by the caller, not silently merged).
fn segment_intersection(p1: [f64; 2], p2: [f64; 2], p3: [f64; 2], p4: [f64; 2]) -> Option<[f64; 2]> {
  let d1x = p2[0] - p1[0];
  let d1y = p2[1] - p1[1];
  let d2x = p4[0] - p3[0];
  let d2y = p4[1] - p3[1];
  let denom = d1x * d2y - d1y * d2x;
  if denom.abs() < 1e-12 {
    return None;
  }
  let t = ((p3[0] - p1[0]) * d2y - (p3[1] - p1[1]) * d2x) / denom;
  Some([p1[0] + t * d1x, p1[1] + t * d1y])
}

/// Flood-fills a polygon's interior starting from `seed` (a directed edge whose left triangle is
/// known to be inside), stamping `REGION_INTERIOR` on crossed non-border edges and
/// `REGION_BORDER` on the interior-facing side of the polygon's own boundary.
fn flood_label(mesh: &mut Mesh, seed: EdgeId, index: u16) {
  let mut stack = vec![seed];
  let mut seen = HashSet::new();
  while let Some(e) = stack.pop() {
    if !seen.insert(e) || mesh.is_ghost(mesh.apex(e)) {
      continue;
    }
    let fe = mesh.forward(e);
    let re = mesh.reverse(e);
    for edge in [e, fe, re] {
      if mesh.is_constrained(edge) {
        mesh.set_flags(edge, EdgeFlags::REGION_BORDER);
        mesh.set_constraint_index(edge, index);
      } else if seen.insert(mesh.twin(edge)) {
        mesh.set_flags(edge, EdgeFlags::REGION_INTERIOR);
        mesh.set_constraint_index(edge, index);
        stack.push(mesh.twin(edge));
      }
    }
  }
}

/// Re-runs Lawson flipping over every non-constrained edge, undoing any local Delaunay
/// violations introduced by constraint routing. Opt-in via [`crate::config::DelaunayConfig`]
/// since it is an extra full pass over the mesh.
fn restore_conformity(tri: &mut Triangulation) {
  let candidates: Vec<EdgeId> = tri.mesh().edges_and_twins().filter(|e| !tri.mesh().is_constrained(*e)).collect();
  tri.restore_delaunay_public(candidates);
}
