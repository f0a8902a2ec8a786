use crate::vertex::VertexId;

/// Everything that can go wrong building or querying a triangulation.
///
/// `NotBootstrapped`, `DuplicateVertex`, `DegenerateInput`, `ConstraintSelfIntersection` and
/// `NumericDegeneracy` are user-input outcomes: the mesh is left unchanged and the caller can
/// retry or ignore. `InvariantViolation` means the implementation itself has a bug; it is still
/// returned as an `Err` (never a panic) so batch callers can abort cleanly, but it should never
/// be treated as recoverable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
  #[error("triangulation requires at least three non-colinear vertices")]
  NotBootstrapped,

  #[error("vertex coincides with existing vertex {existing_index}")]
  DuplicateVertex { existing_index: i32 },

  #[error("all supplied vertices are colinear or coincident")]
  DegenerateInput,

  #[error("constraints {a:?} and {b:?} cross at a point that cannot be resolved")]
  ConstraintSelfIntersection { a: VertexId, b: VertexId },

  #[error("mesh integrity invariant violated: {reason}")]
  InvariantViolation { reason: &'static str },

  #[error("predicate {op} returned a near-zero result with no applicable tie-break")]
  NumericDegeneracy { op: &'static str },

  #[error("point lies outside the convex hull of the triangulation")]
  OutsideHull,
}

pub type Result<T> = std::result::Result<T, Error>;
