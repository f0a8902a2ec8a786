//! Incremental Delaunay construction: bootstrap, point location, vertex insertion and Lawson
//! flip propagation (C4).
//!
//! The mesh always has either zero finite triangles (fewer than three non-colinear vertices
//! seen so far) or a fully triangulated hull with a ghost fan around its boundary (see
//! [`crate::mesh::GHOST`]). `Triangulation::insert` buffers points until the first non-colinear
//! triple, bootstraps the initial triangle plus ghost fan, and from then on locates and inserts
//! each new point one at a time, restoring the Delaunay property with an explicit flip stack
//! rather than recursion.

use crate::config::DelaunayConfig;
use crate::error::{Error, Result};
use crate::mesh::{EdgeId, Mesh, GHOST};
use crate::predicates::{self, Orientation, Thresholds};
use crate::vertex::{Vertex, VertexFlags, VertexId};

/// Axis-aligned bounding box of every vertex seen so far.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
  pub min_x: f64,
  pub min_y: f64,
  pub max_x: f64,
  pub max_y: f64,
}

/// The outcome of locating a point against the current mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Locate {
  /// The point coincides with an existing vertex.
  Vertex(VertexId),
  /// The point lies on the interior of edge `e` (strictly between its endpoints).
  Edge(EdgeId),
  /// The point lies strictly inside the triangle bordered by `e`, `forward(e)`, `reverse(e)`.
  Interior(EdgeId),
}

/// A bound on visibility-walk steps before giving up and reporting a bug rather than looping
/// forever; sized generously relative to edge count.
fn walk_budget(mesh: &Mesh) -> usize {
  mesh.edge_count() * 4 + 64
}

pub struct Triangulation {
  pub(crate) mesh: Mesh,
  pub(crate) thresholds: Thresholds,
  config: DelaunayConfig,
  bootstrap: Vec<Vertex>,
  bounds: Option<Bounds>,
  pub(crate) next_constraint_index: u16,
}

impl Triangulation {
  pub fn new(config: DelaunayConfig) -> Self {
    Triangulation {
      mesh: Mesh::empty(),
      thresholds: Thresholds::default(),
      config,
      bootstrap: Vec::new(),
      bounds: None,
      next_constraint_index: 0,
    }
  }

  pub fn mesh(&self) -> &Mesh {
    &self.mesh
  }

  pub(crate) fn mesh_mut(&mut self) -> &mut Mesh {
    &mut self.mesh
  }

  pub fn thresholds(&self) -> &Thresholds {
    &self.thresholds
  }

  pub(crate) fn config_restore_conformity(&self) -> bool {
    self.config.restore_conformity_on_constraint
  }

  /// Runs Lawson flip propagation over an arbitrary edge set, used by constraint insertion's
  /// optional conformity-restoration pass.
  pub(crate) fn restore_delaunay_public(&mut self, mut candidates: Vec<EdgeId>) {
    self.restore_delaunay(&mut candidates);
  }

  pub fn bounds(&self) -> Option<Bounds> {
    self.bounds
  }

  pub fn nominal_point_spacing(&self) -> f64 {
    self.thresholds.nominal_spacing
  }

  pub fn max_edge_index(&self) -> u32 {
    self.mesh.max_edge_index()
  }

  pub fn is_bootstrapped(&self) -> bool {
    self.mesh.vertex_count() > 0 && self.mesh.edge_count() > 0
  }

  fn touch_bounds(&mut self, v: Vertex) {
    self.bounds = Some(match self.bounds {
      None => Bounds {
        min_x: v.x,
        min_y: v.y,
        max_x: v.x,
        max_y: v.y,
      },
      Some(b) => Bounds {
        min_x: b.min_x.min(v.x),
        min_y: b.min_y.min(v.y),
        max_x: b.max_x.max(v.x),
        max_y: b.max_y.max(v.y),
      },
    });
  }

  fn refresh_thresholds(&mut self, sample: &[Vertex]) {
    let estimated = Thresholds::estimate(sample);
    let spacing = self.config.nominal_spacing.unwrap_or(estimated.nominal_spacing);
    self.thresholds = Thresholds::new(spacing, estimated.coordinate_magnitude);
  }

  /// Insert one vertex. Returns the engine-assigned [`VertexId`]. Buffers silently (returning a
  /// synthetic id is not possible yet) until the mesh has bootstrapped; callers that need to
  /// know whether bootstrap has happened yet should check [`Triangulation::is_bootstrapped`]
  /// afterwards.
  pub fn insert(&mut self, v: Vertex) -> Result<VertexId> {
    self.touch_bounds(v);
    if !self.is_bootstrapped() {
      return self.insert_during_bootstrap(v);
    }
    self.insert_into_mesh(v)
  }

  fn insert_during_bootstrap(&mut self, v: Vertex) -> Result<VertexId> {
    for existing in &self.bootstrap {
      if predicates::squared_distance(existing.xy(), v.xy())
        <= (self.thresholds.nominal_spacing * f64::EPSILON.sqrt()).powi(2).max(0.0)
      {
        return Err(Error::DuplicateVertex {
          existing_index: existing.index,
        });
      }
    }
    self.bootstrap.push(v);
    self.refresh_thresholds(&self.bootstrap.clone());
    if self.bootstrap.len() < 3 {
      return Err(Error::NotBootstrapped);
    }
    let a = self.bootstrap[0];
    let b = self.bootstrap[1];
    let mut c_idx = None;
    for (i, cand) in self.bootstrap.iter().enumerate().skip(2) {
      if predicates::orient(a.xy(), b.xy(), cand.xy(), &self.thresholds) != Orientation::Colinear {
        c_idx = Some(i);
        break;
      }
    }
    let Some(c_idx) = c_idx else {
      return Err(Error::DegenerateInput);
    };
    let c = self.bootstrap[c_idx];
    let ccw = predicates::orient(a.xy(), b.xy(), c.xy(), &self.thresholds) == Orientation::CounterClockwise;
    let (a, b, c) = if ccw { (a, b, c) } else { (b, a, c) };
    let id_of_v = self.bootstrap_mesh(a, b, c)?;
    // Re-insert any other buffered points (besides the three just consumed) one at a time.
    let mut rest: Vec<Vertex> = self.bootstrap.drain(..).collect();
    rest.retain(|p| *p != a && *p != b && *p != c);
    let mut last = id_of_v;
    for p in rest {
      last = self.insert_into_mesh(p)?;
    }
    Ok(last)
  }

  fn bootstrap_mesh(&mut self, a: Vertex, b: Vertex, c: Vertex) -> Result<VertexId> {
    let va = self.mesh.push_vertex(a, VertexFlags::empty());
    let vb = self.mesh.push_vertex(b, VertexFlags::empty());
    let vc = self.mesh.push_vertex(c, VertexFlags::empty());

    let e_ab = self.mesh.allocate_edge(va, vb);
    let e_bc = self.mesh.allocate_edge(vb, vc);
    let e_ca = self.mesh.allocate_edge(vc, va);
    let spoke_a = self.mesh.allocate_edge(va, GHOST);
    let spoke_b = self.mesh.allocate_edge(vb, GHOST);
    let spoke_c = self.mesh.allocate_edge(vc, GHOST);

    self.mesh.link_triangle(e_ab, e_bc, e_ca);
    self.mesh.link_triangle(e_ab.twin(), spoke_a, spoke_b.twin());
    self.mesh.link_triangle(e_bc.twin(), spoke_b, spoke_c.twin());
    self.mesh.link_triangle(e_ca.twin(), spoke_c, spoke_a.twin());

    self.mesh.set_vertex_edge(va, e_ab);
    self.mesh.set_vertex_edge(vb, e_bc);
    self.mesh.set_vertex_edge(vc, e_ca);
    self.mesh.start_edge = Some(e_ab);

    tracing::debug!(?va, ?vb, ?vc, "bootstrapped initial triangle");
    Ok(vc)
  }

  /// Point location by orientation walk, starting from the mesh's cached start edge. Returns
  /// [`Error::OutsideHull`] if the walk would cross the boundary, [`Error::NotBootstrapped`] if
  /// there is no finite triangle yet.
  pub fn locate(&self, x: f64, y: f64) -> Result<Locate> {
    let p = [x, y];
    let Some(mut e) = self.mesh.start_edge else {
      return Err(Error::NotBootstrapped);
    };
    let budget = walk_budget(&self.mesh);
    for _ in 0..budget {
      let a = self.mesh.origin(e);
      let b = self.mesh.dest(e);
      let oab = predicates::orient(self.mesh.point(a).xy(), self.mesh.point(b).xy(), p, &self.thresholds);
      if oab == Orientation::Clockwise {
        let t = self.mesh.twin(e);
        if self.mesh.is_ghost(self.mesh.apex(t)) {
          return Err(Error::OutsideHull);
        }
        e = t;
        continue;
      }

      let fe = self.mesh.forward(e);
      let c = self.mesh.dest(fe);
      let obc = predicates::orient(self.mesh.point(b).xy(), self.mesh.point(c).xy(), p, &self.thresholds);
      if obc == Orientation::Clockwise {
        let t = self.mesh.twin(fe);
        if self.mesh.is_ghost(self.mesh.apex(t)) {
          return Err(Error::OutsideHull);
        }
        e = t;
        continue;
      }

      let re = self.mesh.reverse(e);
      let oca = predicates::orient(self.mesh.point(c).xy(), self.mesh.point(a).xy(), p, &self.thresholds);
      if oca == Orientation::Clockwise {
        let t = self.mesh.twin(re);
        if self.mesh.is_ghost(self.mesh.apex(t)) {
          return Err(Error::OutsideHull);
        }
        e = t;
        continue;
      }

      if oab == Orientation::Colinear {
        if self.thresholds.snap_to_vertex(self.mesh.point(a).xy(), p) {
          return Ok(Locate::Vertex(a));
        }
        if self.thresholds.snap_to_vertex(self.mesh.point(b).xy(), p) {
          return Ok(Locate::Vertex(b));
        }
        return Ok(Locate::Edge(e));
      }
      if obc == Orientation::Colinear {
        if self.thresholds.snap_to_vertex(self.mesh.point(b).xy(), p) {
          return Ok(Locate::Vertex(b));
        }
        if self.thresholds.snap_to_vertex(self.mesh.point(c).xy(), p) {
          return Ok(Locate::Vertex(c));
        }
        return Ok(Locate::Edge(fe));
      }
      if oca == Orientation::Colinear {
        if self.thresholds.snap_to_vertex(self.mesh.point(c).xy(), p) {
          return Ok(Locate::Vertex(c));
        }
        if self.thresholds.snap_to_vertex(self.mesh.point(a).xy(), p) {
          return Ok(Locate::Vertex(a));
        }
        return Ok(Locate::Edge(re));
      }
      return Ok(Locate::Interior(e));
    }
    Err(Error::InvariantViolation {
      reason: "point location walk exceeded its step budget",
    })
  }

  /// Inserts a point known to lie on the interior of edge `e`, flagging the resulting vertex as
  /// synthetic (Steiner). Used by constraint insertion when a constraint segment crosses another
  /// constrained edge at a point that is not already a vertex.
  pub(crate) fn insert_synthetic_on_edge(&mut self, e: EdgeId, point: Vertex) -> VertexId {
    let id = self.insert_on_edge(e, point);
    self.mesh.set_flag(id, VertexFlags::SYNTHETIC);
    id
  }

  /// Flips `e` if doing so yields two valid (non-degenerate, CCW) triangles, regardless of the
  /// in-circle criterion. Used to route a constraint segment through the mesh; ordinary Delaunay
  /// maintenance always goes through [`Triangulation::restore_delaunay`] instead.
  pub(crate) fn flip_edge_if_convex(&mut self, e: EdgeId) -> Option<(EdgeId, EdgeId, EdgeId, EdgeId)> {
    if self.mesh.is_constrained(e) {
      return None;
    }
    let a = self.mesh.origin(e);
    let b = self.mesh.dest(e);
    let d = self.mesh.apex(e);
    let x = self.mesh.apex(self.mesh.twin(e));
    if self.mesh.is_ghost(d) || self.mesh.is_ghost(x) {
      return None;
    }
    let ad_ok = predicates::orient(
      self.mesh.point(a).xy(),
      self.mesh.point(d).xy(),
      self.mesh.point(x).xy(),
      &self.thresholds,
    ) == Orientation::CounterClockwise;
    let db_ok = predicates::orient(
      self.mesh.point(d).xy(),
      self.mesh.point(b).xy(),
      self.mesh.point(x).xy(),
      &self.thresholds,
    ) == Orientation::CounterClockwise;
    if !ad_ok || !db_ok {
      return None;
    }
    Some(self.flip(e))
  }

  fn insert_into_mesh(&mut self, v: Vertex) -> Result<VertexId> {
    match self.locate(v.x, v.y)? {
      Locate::Vertex(existing) => Err(Error::DuplicateVertex {
        existing_index: self.mesh.point(existing).index,
      }),
      Locate::Interior(e) => Ok(self.insert_in_triangle(e, v)),
      Locate::Edge(e) => Ok(self.insert_on_edge(e, v)),
    }
  }

  fn insert_in_triangle(&mut self, e: EdgeId, v: Vertex) -> VertexId {
    let a = self.mesh.origin(e);
    let b = self.mesh.dest(e);
    let fe = self.mesh.forward(e);
    let re = self.mesh.reverse(e);
    let c = self.mesh.dest(fe);

    let d = self.mesh.push_vertex(v, VertexFlags::empty());
    let da = self.mesh.allocate_edge(d, a);
    let db = self.mesh.allocate_edge(d, b);
    let dc = self.mesh.allocate_edge(d, c);

    self.mesh.link_triangle(e, db.twin(), da);
    self.mesh.link_triangle(fe, dc.twin(), db);
    self.mesh.link_triangle(re, da.twin(), dc);

    self.mesh.set_vertex_edge(a, da.twin());
    self.mesh.set_vertex_edge(b, db.twin());
    self.mesh.set_vertex_edge(c, dc.twin());
    self.mesh.set_vertex_edge(d, da);
    self.mesh.start_edge = Some(da);

    let mut stack = vec![e, fe, re];
    self.restore_delaunay(&mut stack);
    d
  }

  fn insert_on_edge(&mut self, e: EdgeId, v: Vertex) -> VertexId {
    let a = self.mesh.origin(e);
    let b = self.mesh.dest(e);
    let te = self.mesh.twin(e);
    let c = self.mesh.apex(e);
    let x = self.mesh.apex(te);
    let fe = self.mesh.forward(e);
    let re = self.mesh.reverse(e);
    let fte = self.mesh.forward(te);
    let rte = self.mesh.reverse(te);
    let constrained = self.mesh.is_constrained(e);
    let constraint_index = self.mesh.constraint_index(e);

    let d = self.mesh.push_vertex(v, VertexFlags::empty());
    let ad = self.mesh.allocate_edge(a, d);
    let dc = self.mesh.allocate_edge(d, c);
    let dx = self.mesh.allocate_edge(d, x);
    // Repurpose the split edge's pair: e becomes D->B, its twin becomes B->D.
    self.mesh.set_origin(e, d);

    self.mesh.link_triangle(ad, dc, re);
    self.mesh.link_triangle(e, fe, dc.twin());
    self.mesh.link_triangle(te, dx, rte);
    self.mesh.link_triangle(ad.twin(), fte, dx.twin());

    self.mesh.set_vertex_edge(a, ad);
    self.mesh.set_vertex_edge(b, fe);
    self.mesh.set_vertex_edge(c, re);
    self.mesh.set_vertex_edge(x, rte);
    self.mesh.set_vertex_edge(d, e);
    self.mesh.start_edge = Some(ad);

    if constrained {
      self.mesh.set_flags(ad, crate::mesh::EdgeFlags::CONSTRAINED);
      self.mesh.set_flags(ad.twin(), crate::mesh::EdgeFlags::CONSTRAINED);
      self.mesh.set_flags(e, crate::mesh::EdgeFlags::CONSTRAINED);
      self.mesh.set_flags(te, crate::mesh::EdgeFlags::CONSTRAINED);
      self.mesh.set_flag(d, VertexFlags::CONSTRAINT_MEMBER);
      if let Some(idx) = constraint_index {
        self.mesh.set_constraint_index(ad, idx);
        self.mesh.set_constraint_index(ad.twin(), idx);
        self.mesh.set_constraint_index(e, idx);
        self.mesh.set_constraint_index(te, idx);
      }
    }

    let mut stack = vec![re, fe, fte, rte];
    self.restore_delaunay(&mut stack);
    d
  }

  /// Lawson flip propagation. Pops candidate edges off `stack`, flips any that violate the
  /// in-circle test against their opposite apex, and pushes the four edges bordering the flip
  /// for further checking. Ghost-adjacent and constrained edges are never flipped.
  fn restore_delaunay(&mut self, stack: &mut Vec<EdgeId>) {
    let mut guard = 0usize;
    let budget = walk_budget(&self.mesh) * 4;
    while let Some(e) = stack.pop() {
      guard += 1;
      if guard > budget {
        tracing::warn!("flip propagation exceeded its step budget, aborting early");
        break;
      }
      if self.mesh.is_constrained(e) {
        continue;
      }
      let d = self.mesh.apex(e);
      let x = self.mesh.apex(self.mesh.twin(e));
      if self.mesh.is_ghost(d) || self.mesh.is_ghost(x) {
        continue;
      }
      let a = self.mesh.origin(e);
      let b = self.mesh.dest(e);
      let violated = predicates::in_circle(
        self.mesh.point(a).xy(),
        self.mesh.point(b).xy(),
        self.mesh.point(d).xy(),
        self.mesh.point(x).xy(),
        &self.thresholds,
      ) == crate::predicates::InCircle::Inside;
      if !violated {
        continue;
      }
      let (ad_edge, xa_edge, db_edge, bx_edge) = self.flip(e);
      stack.push(ad_edge);
      stack.push(xa_edge);
      stack.push(db_edge);
      stack.push(bx_edge);
    }
  }

  /// Flips the diagonal `e` (A->B) of quadrilateral `A, D, B, X` to `D->X`, repurposing the
  /// `e`/`twin(e)` pair in place. Returns the four untouched boundary edges of the
  /// quadrilateral, in order `A->D, X->A, D->B, B->X`.
  fn flip(&mut self, e: EdgeId) -> (EdgeId, EdgeId, EdgeId, EdgeId) {
    let te = self.mesh.twin(e);
    let a = self.mesh.origin(e);
    let b = self.mesh.dest(e);
    let d = self.mesh.apex(e);
    let x = self.mesh.apex(te);

    let re = self.mesh.reverse(e); // D -> A
    let fe = self.mesh.forward(e); // B -> D
    let fte = self.mesh.forward(te); // A -> X
    let rte = self.mesh.reverse(te); // X -> B

    let ad = self.mesh.twin(re); // A -> D
    let xa = self.mesh.twin(fte); // X -> A
    let db = self.mesh.twin(fe); // D -> B
    let bx = self.mesh.twin(rte); // B -> X

    self.mesh.set_origin(e, d);
    self.mesh.set_origin(te, x);

    self.mesh.link_triangle(ad, e, xa);
    self.mesh.link_triangle(db, bx, te);

    self.mesh.set_vertex_edge(a, ad);
    self.mesh.set_vertex_edge(b, bx);
    self.mesh.set_vertex_edge(d, e);
    self.mesh.set_vertex_edge(x, te);
    self.mesh.start_edge = Some(e);

    (ad, xa, db, bx)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn v(x: f64, y: f64, idx: i32) -> Vertex {
    Vertex::new(x, y, 0.0, idx)
  }

  #[test]
  fn bootstrap_requires_three_non_colinear() {
    let mut t = Triangulation::new(DelaunayConfig::default());
    assert_eq!(t.insert(v(0.0, 0.0, 0)), Err(Error::NotBootstrapped));
    assert_eq!(t.insert(v(1.0, 0.0, 1)), Err(Error::NotBootstrapped));
    assert_eq!(t.insert(v(2.0, 0.0, 2)), Err(Error::NotBootstrapped));
    assert!(t.insert(v(1.0, 1.0, 3)).is_ok());
    assert!(t.is_bootstrapped());
  }

  #[test]
  fn locate_interior_point_after_bootstrap() {
    let mut t = Triangulation::new(DelaunayConfig::default());
    t.insert(v(0.0, 0.0, 0)).ok();
    t.insert(v(4.0, 0.0, 1)).ok();
    t.insert(v(0.0, 4.0, 2)).unwrap();
    match t.locate(1.0, 1.0).unwrap() {
      Locate::Interior(_) => {}
      other => panic!("expected interior, got {other:?}"),
    }
    assert_eq!(t.locate(10.0, 10.0), Err(Error::OutsideHull));
  }

  #[test]
  fn inserting_center_point_keeps_mesh_delaunay() {
    let mut t = Triangulation::new(DelaunayConfig::default());
    t.insert(v(0.0, 0.0, 0)).ok();
    t.insert(v(4.0, 0.0, 1)).ok();
    t.insert(v(4.0, 4.0, 2)).ok();
    t.insert(v(0.0, 4.0, 3)).unwrap();
    let center = t.insert(v(2.0, 2.0, 4)).unwrap();
    assert!(matches!(t.locate(2.0, 2.0), Ok(Locate::Vertex(v)) if v == center));
    crate::integrity::check(&t).expect("mesh should satisfy all invariants");
  }

  #[test]
  fn duplicate_vertex_is_rejected() {
    let mut t = Triangulation::new(DelaunayConfig::default());
    t.insert(v(0.0, 0.0, 0)).ok();
    t.insert(v(4.0, 0.0, 1)).ok();
    t.insert(v(0.0, 4.0, 2)).unwrap();
    assert_eq!(
      t.insert(v(0.0, 0.0, 99)),
      Err(Error::DuplicateVertex { existing_index: 0 })
    );
  }
}
