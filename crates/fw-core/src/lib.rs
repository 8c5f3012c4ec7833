//! `fw-core` - generalized Floyd-Warshall closure engines.
//!
//! This crate provides:
//! - Semiring operator sets for shortest path, max-min bottleneck and
//!   transitive closure ([`semiring`])
//! - Dense and bit-packed matrix stores with lane-aligned storage ([`matrix`])
//! - A reference triple-loop engine and a four-phase tiled engine
//! - Unrolled and lane-batched in-tile kernels ([`kernel`])
//! - A run-time dispatch surface ([`run_closure`], [`Engine`])

pub mod config;
pub mod diagnostics;
pub mod element;
pub mod engine;
pub mod error;
pub mod kernel;
pub mod matrix;
pub mod reference;
pub mod semiring;
pub mod tiled;
pub mod view;

// Re-export primary types at the crate root for convenience.
pub use config::EngineConfig;
pub use diagnostics::negative_cycle_nodes;
pub use element::{Element, ElementKind, Weight, LANE_BYTES};
pub use engine::{closure, closure_packed, run_buffer, run_closure, ClosureBackend, Engine, Variant};
pub use error::{ClosureError, Result};
pub use kernel::{Kernel, UnrollRows};
pub use matrix::{DenseMatrix, Matrix, PackedBoolMatrix};
pub use semiring::{MaxMin, PackedReachability, Reachability, Semiring, SemiringKind, ShortestPath};
pub use view::{Dense, Geometry, Layout, PackedBits, TileView};
