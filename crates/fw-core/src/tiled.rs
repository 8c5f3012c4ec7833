//! Blocked engine with the four-phase schedule.
//!
//! The matrix is split into `L`×`L` tiles. For diagonal step `t`:
//!
//! 1. the diagonal tile `(t, t)` is closed against itself;
//! 2. every other tile of row `t` is updated through the diagonal tile;
//! 3. every other tile of column `t` is updated through the diagonal tile;
//! 4. all remaining tiles `(i, j)` are updated from `(i, t)` and `(t, j)`.
//!
//! Each phase reads only tiles finalized by earlier phases of the same step,
//! so phases never overlap. The result matches the reference engine exactly
//! for max-min, booleans and integer-valued weights. With fractional
//! floating point weights the blocked order can round path sums differently,
//! so shortest-path results may differ from the reference in the last bits.

use tracing::trace;

use crate::error::Result;
use crate::kernel::Kernel;
use crate::semiring::Semiring;
use crate::view::{Geometry, Layout};

/// Closure of `buf` using square tiles of `tile` cells.
///
/// # Errors
/// - [`ClosureError::BufferSize`](crate::ClosureError::BufferSize) if the
///   buffer length does not match `geom`.
/// - [`ClosureError::TileSize`](crate::ClosureError::TileSize) if `tile` is
///   zero, does not divide `n`, or (packed layout) is not a multiple of 8.
pub fn compute_tiled<S, L>(
    buf: &mut [S::Elem],
    geom: Geometry,
    tile: usize,
    kernel: Kernel,
) -> Result<()>
where
    S: Semiring,
    L: Layout<S::Elem>,
{
    geom.check_len(buf.len())?;
    geom.check_tile(tile)?;

    let tiles = geom.n / tile;
    for t in 0..tiles {
        trace!(step = t, tiles, tile, "tiled diagonal step");
        let diag = geom.tile(tile, t, t);

        kernel.update_aliased::<S, L>(buf, diag, diag, diag);

        for j in (0..tiles).filter(|&j| j != t) {
            let c = geom.tile(tile, t, j);
            kernel.update_aliased::<S, L>(buf, diag, c, c);
        }

        for i in (0..tiles).filter(|&i| i != t) {
            let c = geom.tile(tile, i, t);
            kernel.update_aliased::<S, L>(buf, c, diag, c);
        }

        for i in (0..tiles).filter(|&i| i != t) {
            let a = geom.tile(tile, i, t);
            for j in (0..tiles).filter(|&j| j != t) {
                let b = geom.tile(tile, t, j);
                let c = geom.tile(tile, i, j);
                kernel.update_disjoint::<S, L>(buf, a, b, c);
            }
        }
    }
    Ok(())
}
