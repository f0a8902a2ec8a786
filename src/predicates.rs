//! Robust orientation, in-circle, and area predicates, plus the adaptive tolerance bundle that
//! every higher layer consults instead of hard-coded epsilons (C1).

use crate::vertex::Vertex;

/// Result of testing the turn `a -> b -> c`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
  CounterClockwise,
  Clockwise,
  Colinear,
}

/// Result of testing whether `d` lies inside the circle through `a, b, c` (CCW).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InCircle {
  Inside,
  On,
  Outside,
}

/// Exact sign of `orient2d(a, b, c)`: twice the signed area of the triangle `abc`. Positive when
/// `a, b, c` turn counterclockwise. Uses `geometry_predicates`'s adaptive-precision evaluator so
/// the *sign* is always correct; [`Thresholds`] decides whether a tiny nonzero sign should still
/// be treated as colinear by the caller.
pub fn orient2d(a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> f64 {
  geometry_predicates::orient2d(a, b, c)
}

/// Exact sign of the in-circle predicate: positive when `d` is inside the circle through
/// `a, b, c` (assumed CCW).
pub fn incircle_raw(a: [f64; 2], b: [f64; 2], c: [f64; 2], d: [f64; 2]) -> f64 {
  geometry_predicates::incircle(a, b, c, d)
}

/// Twice the signed area of triangle `abc`.
pub fn signed_area_2x(a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> f64 {
  orient2d(a, b, c)
}

pub fn squared_distance(a: [f64; 2], b: [f64; 2]) -> f64 {
  let dx = a[0] - b[0];
  let dy = a[1] - b[1];
  dx * dx + dy * dy
}

pub fn distance(a: [f64; 2], b: [f64; 2]) -> f64 {
  squared_distance(a, b).sqrt()
}

/// Perpendicular distance from `p` to the infinite line through `a` and `b`.
pub fn perpendicular_distance(a: [f64; 2], b: [f64; 2], p: [f64; 2]) -> f64 {
  let len = distance(a, b);
  if len == 0.0 {
    return distance(a, p);
  }
  (orient2d(a, b, p) / len).abs()
}

/// Tolerance bundle derived from the coordinate magnitude and nominal point spacing of a vertex
/// set. Every predicate consumer should scale its epsilon through this bundle rather than
/// hard-coding one, so the engine behaves the same on sub-millimeter and UTM-scale inputs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Thresholds {
  /// Characteristic distance between neighboring vertices.
  pub nominal_spacing: f64,
  /// Largest `|x|` or `|y|` seen across the vertex set; scales machine-epsilon comparisons.
  pub coordinate_magnitude: f64,
  /// Tolerance for "on this side of the half-plane" tests (locate, walk).
  pub half_plane: f64,
  /// Tolerance for treating three points as colinear.
  pub colinearity: f64,
  /// Tolerance for treating an in-circle test as "on" rather than strictly inside/outside.
  pub delaunay_violation: f64,
  /// Multiplicative inflation applied to alpha-circle radii to absorb round-off.
  pub circumradius_inflation: f64,
  /// Below this, a signed area is treated as zero (degenerate triangle / alpha part).
  pub area_zero: f64,
}

const MACHINE_EPSILON: f64 = f64::EPSILON;

impl Thresholds {
  /// Derive a threshold bundle from an explicit nominal spacing and the bounding magnitude of
  /// the input coordinates.
  pub fn new(nominal_spacing: f64, coordinate_magnitude: f64) -> Self {
    let magnitude = coordinate_magnitude.max(1.0);
    let spacing = if nominal_spacing > 0.0 {
      nominal_spacing
    } else {
      1.0
    };
    Thresholds {
      nominal_spacing: spacing,
      coordinate_magnitude: magnitude,
      half_plane: magnitude * magnitude * MACHINE_EPSILON * 16.0,
      colinearity: magnitude * magnitude * MACHINE_EPSILON * 16.0,
      delaunay_violation: magnitude * magnitude * magnitude * MACHINE_EPSILON * 16.0,
      circumradius_inflation: 1.0 + MACHINE_EPSILON * 64.0,
      area_zero: spacing * spacing / (1u64 << 20) as f64,
    }
  }

  /// Estimate a threshold bundle from a vertex slice: magnitude from the bounding box, spacing
  /// from the average nearest-neighbor gap along a coarse pass (a full k-d tree is unnecessary
  /// for a tolerance estimate; a sample of consecutive-in-input-order gaps is good enough).
  pub fn estimate(vertices: &[Vertex]) -> Self {
    let mut magnitude = 0.0f64;
    for v in vertices {
      magnitude = magnitude.max(v.x.abs()).max(v.y.abs());
    }
    let spacing = estimate_nominal_spacing(vertices);
    Thresholds::new(spacing, magnitude)
  }

  pub fn snap_to_vertex(&self, a: [f64; 2], b: [f64; 2]) -> bool {
    squared_distance(a, b) <= (self.nominal_spacing * MACHINE_EPSILON.sqrt()).powi(2)
  }
}

impl Default for Thresholds {
  fn default() -> Self {
    Thresholds::new(1.0, 1.0)
  }
}

/// Cheap nominal-spacing estimate: median of the distances between consecutive vertices in
/// input order. Good enough to scale tolerances; callers needing a precise estimate should
/// supply `nominal_spacing` explicitly via `DelaunayConfig`.
fn estimate_nominal_spacing(vertices: &[Vertex]) -> f64 {
  if vertices.len() < 2 {
    return 1.0;
  }
  let mut gaps: Vec<f64> = vertices
    .windows(2)
    .map(|w| distance(w[0].xy(), w[1].xy()))
    .filter(|d| *d > 0.0)
    .collect();
  if gaps.is_empty() {
    return 1.0;
  }
  gaps.sort_by_key(|&d| ordered_float::OrderedFloat(d));
  gaps[gaps.len() / 2]
}

/// Orientation of the turn `a -> b -> c`, with the exact sign from [`orient2d`] thresholded by
/// `colinearity`.
pub fn orient(a: [f64; 2], b: [f64; 2], c: [f64; 2], thresholds: &Thresholds) -> Orientation {
  let det = orient2d(a, b, c);
  if det > thresholds.colinearity {
    Orientation::CounterClockwise
  } else if det < -thresholds.colinearity {
    Orientation::Clockwise
  } else {
    Orientation::Colinear
  }
}

/// In-circle test of `d` against the circle through CCW triangle `a, b, c`, thresholded by
/// `delaunay_violation`.
pub fn in_circle(
  a: [f64; 2],
  b: [f64; 2],
  c: [f64; 2],
  d: [f64; 2],
  thresholds: &Thresholds,
) -> InCircle {
  let det = incircle_raw(a, b, c, d);
  if det > thresholds.delaunay_violation {
    InCircle::Inside
  } else if det < -thresholds.delaunay_violation {
    InCircle::Outside
  } else {
    InCircle::On
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn orient_basic() {
    let t = Thresholds::default();
    assert_eq!(
      orient([0.0, 0.0], [1.0, 0.0], [1.0, 1.0], &t),
      Orientation::CounterClockwise
    );
    assert_eq!(
      orient([0.0, 0.0], [1.0, 1.0], [1.0, 0.0], &t),
      Orientation::Clockwise
    );
    assert_eq!(
      orient([0.0, 0.0], [1.0, 0.0], [2.0, 0.0], &t),
      Orientation::Colinear
    );
  }

  #[test]
  fn in_circle_basic() {
    let t = Thresholds::default();
    // Unit circle through (1,0),(0,1),(-1,0) CCW; (0,-1) lies on the circle.
    let a = [1.0, 0.0];
    let b = [0.0, 1.0];
    let c = [-1.0, 0.0];
    assert_eq!(in_circle(a, b, c, [0.0, 0.0], &t), InCircle::Inside);
    assert_eq!(in_circle(a, b, c, [0.0, -1.0], &t), InCircle::On);
    assert_eq!(in_circle(a, b, c, [0.0, -5.0], &t), InCircle::Outside);
  }

  #[test]
  fn perpendicular_distance_basic() {
    let d = perpendicular_distance([0.0, 0.0], [1.0, 0.0], [0.5, 2.0]);
    assert!((d - 2.0).abs() < 1e-9);
  }
}
