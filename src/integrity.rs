//! Full-mesh invariant audit: CCW orientation, twin-pair consistency, local Delaunay
//! non-violation, constraint-index agreement and the Euler-formula edge/triangle count (C9).
//!
//! Every check returns a descriptive [`Error::InvariantViolation`] rather than panicking; this
//! module is meant to run in tests and behind `#[cfg(debug_assertions)]` assertions in the
//! builder, not to be a normal part of the hot insertion path.

use crate::builder::Triangulation;
use crate::error::{Error, Result};
use crate::mesh::Mesh;
use crate::predicates::{self, InCircle, Orientation};
use crate::traversal;

pub fn check(t: &Triangulation) -> Result<()> {
  let mesh = t.mesh();
  check_triangle_orientation(t)?;
  check_twin_consistency(mesh)?;
  check_local_delaunay(t)?;
  check_constraint_agreement(mesh)?;
  check_euler_formula(mesh)?;
  Ok(())
}

fn check_triangle_orientation(t: &Triangulation) -> Result<()> {
  let mesh = t.mesh();
  for (e, fe, re) in traversal::triangles(mesh) {
    let a = mesh.point(mesh.origin(e)).xy();
    let b = mesh.point(mesh.origin(fe)).xy();
    let c = mesh.point(mesh.origin(re)).xy();
    if predicates::orient(a, b, c, t.thresholds()) != Orientation::CounterClockwise {
      return Err(Error::InvariantViolation {
        reason: "finite triangle is not oriented counterclockwise",
      });
    }
  }
  Ok(())
}

fn check_twin_consistency(mesh: &Mesh) -> Result<()> {
  for e in mesh.edges_and_twins() {
    if mesh.twin(mesh.twin(e)) != e {
      return Err(Error::InvariantViolation {
        reason: "twin is not an involution",
      });
    }
    if mesh.dest(e) != mesh.origin(mesh.twin(e)) {
      return Err(Error::InvariantViolation {
        reason: "edge destination disagrees with twin's origin",
      });
    }
    if !mesh.is_ghost(mesh.apex(e)) && mesh.forward(mesh.reverse(e)) != e {
      return Err(Error::InvariantViolation {
        reason: "finite triangle is not a 3-cycle under forward/reverse",
      });
    }
  }
  Ok(())
}

/// Every non-constrained interior edge must not be violated by the apex of its neighboring
/// triangle: that apex must not lie strictly inside the circumcircle of the edge's own triangle.
fn check_local_delaunay(t: &Triangulation) -> Result<()> {
  let mesh = t.mesh();
  for e in mesh.edges_and_twins() {
    if mesh.is_constrained(e) {
      continue;
    }
    let d = mesh.apex(e);
    let x = mesh.apex(mesh.twin(e));
    if mesh.is_ghost(d) || mesh.is_ghost(x) {
      continue;
    }
    let a = mesh.origin(e);
    let b = mesh.dest(e);
    let verdict = predicates::in_circle(
      mesh.point(a).xy(),
      mesh.point(b).xy(),
      mesh.point(d).xy(),
      mesh.point(x).xy(),
      t.thresholds(),
    );
    if verdict == InCircle::Inside {
      return Err(Error::InvariantViolation {
        reason: "non-constrained edge violates the Delaunay in-circle criterion",
      });
    }
  }
  Ok(())
}

/// The two directed sides of an edge must agree on whether it is constrained and, if so, on
/// which constraint it belongs to.
fn check_constraint_agreement(mesh: &Mesh) -> Result<()> {
  for e in mesh.edges() {
    let t = mesh.twin(e);
    if mesh.is_constrained(e) != mesh.is_constrained(t) {
      return Err(Error::InvariantViolation {
        reason: "edge sides disagree on constrained flag",
      });
    }
    if mesh.is_constrained(e) && mesh.constraint_index(e) != mesh.constraint_index(t) {
      return Err(Error::InvariantViolation {
        reason: "edge sides disagree on constraint index",
      });
    }
  }
  Ok(())
}

/// `V - E + F == 2` over the closed surface formed by finite triangles plus the ghost fan
/// (topologically a sphere once the ghost vertex closes the hull boundary). This holds
/// regardless of constraints or Steiner insertions, so it is a strong structural sanity check.
fn check_euler_formula(mesh: &Mesh) -> Result<()> {
  let vertices = mesh.vertex_count() as i64 + 1;
  let edges = mesh.edge_count() as i64;
  let finite_triangles = traversal::triangles(mesh).count() as i64;
  let hull_edges = mesh.edges().filter(|e| mesh.is_perimeter(*e)).count() as i64;
  let faces = finite_triangles + hull_edges;
  if vertices - edges + faces != 2 {
    return Err(Error::InvariantViolation {
      reason: "Euler's formula V - E + F = 2 does not hold over the ghost-closed mesh",
    });
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::DelaunayConfig;
  use crate::vertex::Vertex;

  fn v(x: f64, y: f64, idx: i32) -> Vertex {
    Vertex::new(x, y, 0.0, idx)
  }

  #[test]
  fn fresh_bootstrap_passes_all_checks() {
    let mut t = Triangulation::new(DelaunayConfig::default());
    t.insert(v(0.0, 0.0, 0)).ok();
    t.insert(v(4.0, 0.0, 1)).ok();
    t.insert(v(0.0, 4.0, 2)).unwrap();
    assert!(check(&t).is_ok());
  }

  #[test]
  fn scattered_points_pass_all_checks() {
    let mut t = Triangulation::new(DelaunayConfig::default());
    let points = [
      (0.0, 0.0),
      (4.0, 0.0),
      (4.0, 4.0),
      (0.0, 4.0),
      (2.0, 2.0),
      (1.0, 3.0),
      (3.0, 1.0),
      (2.0, 0.5),
    ];
    for (idx, (x, y)) in points.iter().enumerate() {
      t.insert(v(*x, *y, idx as i32)).ok();
    }
    check(&t).expect("scattered point set should satisfy all invariants");
  }
}
