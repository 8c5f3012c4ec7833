//! `fw-io` - text matrix files for the closure engines.
//!
//! This crate provides:
//! - A memory-mapped reader and a writer for the comma-separated format
//! - Conversion into the storage forms of `fw-core`
//! - A tolerance-based matrix comparator

pub mod compare;
pub mod error;
pub mod text;

pub use compare::{compare, compare_files, Comparison, Mismatch, DEFAULT_PRECISION};
pub use error::{IoError, Result};
pub use text::{
    parse_matrix, parse_reachability, parse_weights, save_matrix, write_matrix, MatrixFile,
};
