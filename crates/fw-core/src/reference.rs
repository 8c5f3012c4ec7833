//! Canonical triple-loop engine.
//!
//! `k` is strictly outermost, `i` middle, `j` innermost, with no blocking or
//! batching. Every other engine is tested against this one.

use crate::error::Result;
use crate::semiring::{PackedReachability, Semiring};
use crate::view::{Dense, Geometry, Layout, PackedBits};

/// Closure of an `n`×`n` row-major buffer with one unit per cell.
///
/// # Errors
/// Returns [`ClosureError::BufferSize`](crate::ClosureError::BufferSize) if
/// `buf.len() != n * n`.
pub fn compute<S: Semiring>(buf: &mut [S::Elem], n: usize) -> Result<()> {
    compute_with_layout::<S, Dense>(buf, Geometry::dense(n)?)
}

/// Closure of a packed boolean buffer of `n * ceil(n / 8)` bytes.
pub fn compute_packed(buf: &mut [u8], n: usize) -> Result<()> {
    compute_with_layout::<PackedReachability, PackedBits>(buf, Geometry::packed(n)?)
}

/// Closure for an arbitrary storage layout.
pub fn compute_with_layout<S, L>(buf: &mut [S::Elem], geom: Geometry) -> Result<()>
where
    S: Semiring,
    L: Layout<S::Elem>,
{
    geom.check_len(buf.len())?;
    for k in 0..geom.n {
        step::<S, L>(buf, geom, k);
    }
    Ok(())
}

/// One outer step: admit node `k` as an intermediate for every pair.
///
/// After steps `0..=k` each cell holds the best value over paths whose
/// intermediate nodes all lie in `{0, ..., k}`.
///
/// # Panics
/// Panics if `buf` is shorter than `geom.len()` or `k >= geom.n`.
pub fn step<S, L>(buf: &mut [S::Elem], geom: Geometry, k: usize)
where
    S: Semiring,
    L: Layout<S::Elem>,
{
    let whole = geom.whole();
    for i in 0..geom.n {
        let via = L::via(buf, whole, i, k);
        for j in 0..geom.stride {
            let idx = whole.at(i, j);
            buf[idx] = S::update(buf[idx], via, buf[whole.at(k, j)]);
        }
    }
}
