//! Option bundles for the three analytic subsystems (Section 6). Plain `Copy` structs with
//! `Default` impls, matching the donor's preference for ordinary field-init configuration over
//! a builder-pattern macro.

use crate::vertex::Vertex;

/// Options controlling the incremental Delaunay builder (C4/C5).
#[derive(Clone, Copy, Debug)]
pub struct DelaunayConfig {
  /// Overrides the estimated nominal point spacing used to scale tolerances. `None` estimates
  /// it from the input vertex stream.
  pub nominal_spacing: Option<f64>,
  /// After all constraints are inserted, re-run Lawson flipping on non-constrained edges to
  /// correct violations introduced by ear-clipping re-triangulation.
  pub restore_conformity_on_constraint: bool,
}

impl Default for DelaunayConfig {
  fn default() -> Self {
    DelaunayConfig {
      nominal_spacing: None,
      restore_conformity_on_constraint: false,
    }
  }
}

/// Options controlling alpha-shape extraction (C7).
#[derive(Clone, Copy, Debug)]
pub struct AlphaConfig {
  /// The alpha radius. Must be strictly positive.
  pub radius: f64,
  /// `true` selects the classic Edelsbrunner definition (edge covered only if the opposite
  /// vertex lies inside *both* alpha circles); `false` (the default) selects the modified
  /// definition used by this engine's donor (covered if inside *either* circle).
  pub classic_definition: bool,
}

impl AlphaConfig {
  pub fn new(radius: f64) -> Self {
    AlphaConfig {
      radius,
      classic_definition: false,
    }
  }
}

/// A caller-supplied override for the z-value used by the contour builder, in place of
/// `Vertex::z`.
pub type Valuator = std::sync::Arc<dyn Fn(Vertex) -> f64 + Send + Sync>;

/// Options controlling contour tracing and region assembly (C8).
#[derive(Clone)]
pub struct ContourConfig {
  /// Strictly increasing sequence of iso-values to trace.
  pub z_levels: Vec<f64>,
  /// Whether to additionally assemble tiling contour regions, not just contour lines.
  pub build_regions: bool,
  /// Optional override mapping a vertex to the z-value used for banding; defaults to
  /// `Vertex::z`.
  pub valuator: Option<Valuator>,
}

impl ContourConfig {
  pub fn new(z_levels: Vec<f64>) -> Self {
    ContourConfig {
      z_levels,
      build_regions: true,
      valuator: None,
    }
  }

  pub(crate) fn z_of(&self, v: Vertex) -> f64 {
    match &self.valuator {
      Some(f) => f(v),
      None => v.z,
    }
  }
}

impl std::fmt::Debug for ContourConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ContourConfig")
      .field("z_levels", &self.z_levels)
      .field("build_regions", &self.build_regions)
      .field("valuator", &self.valuator.is_some())
      .finish()
  }
}
