//! `fw-gen` - seeded random graph fixtures for the closure engines.

pub mod config;
pub mod error;
pub mod graph;

pub use config::{max_edges, Density, GeneratorConfig};
pub use error::{GenError, Result};
pub use graph::{generate, Edge, Graph, MAX_ATTEMPTS};
