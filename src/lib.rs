//! Incremental Delaunay/constrained-Delaunay triangulation, alpha-shape extraction and
//! iso-value contouring over scattered 2.5D point sets.
//!
//! The engine is built around a half-edge mesh ([`mesh`]) maintained incrementally as vertices
//! arrive ([`builder`]); [`constraint`] routes linear and polygon constraints through it without
//! a full rebuild, [`alpha`] and [`contour`] are read-only passes over the finished mesh, and
//! [`integrity`] is the invariant auditor used by this crate's own test suite.

pub mod alpha;
pub mod builder;
pub mod config;
pub mod constraint;
pub mod contour;
pub mod error;
pub mod integrity;
pub mod mesh;
pub mod predicates;
pub mod traversal;
pub mod vertex;

pub use alpha::{AlphaPart, PartKind};
pub use builder::{Bounds, Locate, Triangulation};
pub use config::{AlphaConfig, ContourConfig, DelaunayConfig, Valuator};
pub use constraint::{Constraint, ConstraintKind};
pub use contour::{Contour, ContourRegion, ContourSet};
pub use error::{Error, Result};
pub use mesh::{EdgeId, Mesh};
pub use predicates::Thresholds;
pub use vertex::{Vertex, VertexId};
