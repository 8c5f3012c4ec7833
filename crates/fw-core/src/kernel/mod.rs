//! In-tile update routines.
//!
//! A kernel applies the recurrence to a destination view `c` using the via
//! operands of view `a` and the source rows of view `b`, all three living in
//! the same buffer:
//!
//! ```text
//! for k in 0..b.rows:
//!     c[i][j] = combine(c[i][j], relax(a[i][k], b[k][j]))
//! ```
//!
//! Two forms exist. The aliased form keeps `k` outermost and is valid when
//! `c` is the same tile as `a` or `b` (phases 1-3 of the tiled schedule and
//! the untiled engines). The disjoint form may run `k` innermost and is only
//! used when `c` overlaps neither source.

pub mod lanes;
pub mod scalar;
pub mod unrolled;

use std::fmt;

use crate::semiring::Semiring;
use crate::view::{Layout, TileView};

pub use lanes::{check_alignment, LaneMask};
pub use unrolled::{UnrollRows, UNROLL_COLS};

/// Which in-tile routine an engine uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kernel {
    /// One cell at a time.
    Scalar,
    /// Register-blocked rows × [`UNROLL_COLS`] columns.
    Unrolled(UnrollRows),
    /// Fixed-width lane groups with a boundary mask for the tail.
    Lanes,
}

impl Kernel {
    /// Update `c` in place where `c` may alias `a` or `b`.
    #[inline]
    pub fn update_aliased<S, L>(&self, buf: &mut [S::Elem], a: TileView, b: TileView, c: TileView)
    where
        S: Semiring,
        L: Layout<S::Elem>,
    {
        match *self {
            Kernel::Scalar => scalar::update_aliased::<S, L>(buf, a, b, c),
            Kernel::Unrolled(rows) => unrolled::update_aliased::<S, L>(buf, a, b, c, rows),
            Kernel::Lanes => lanes::update_aliased::<S, L>(buf, a, b, c),
        }
    }

    /// Update `c` in place where `c` overlaps neither `a` nor `b`.
    #[inline]
    pub fn update_disjoint<S, L>(&self, buf: &mut [S::Elem], a: TileView, b: TileView, c: TileView)
    where
        S: Semiring,
        L: Layout<S::Elem>,
    {
        debug_assert!(
            !overlaps(&a, &c) && !overlaps(&b, &c),
            "disjoint kernel called on overlapping views"
        );
        match *self {
            Kernel::Scalar => scalar::update_disjoint::<S, L>(buf, a, b, c),
            Kernel::Unrolled(rows) => unrolled::update_disjoint::<S, L>(buf, a, b, c, rows),
            Kernel::Lanes => lanes::update_disjoint::<S, L>(buf, a, b, c),
        }
    }
}

impl fmt::Display for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kernel::Scalar => write!(f, "scalar"),
            Kernel::Unrolled(rows) => write!(f, "unrolled({}x{})", rows.rows(), UNROLL_COLS),
            Kernel::Lanes => write!(f, "lanes"),
        }
    }
}

/// Same-stride views overlap if they share a row range and a column range.
fn overlaps(x: &TileView, y: &TileView) -> bool {
    if x.stride != y.stride || x.stride == 0 {
        return x.offset == y.offset;
    }
    let (xr, xc) = (x.offset / x.stride, x.offset % x.stride);
    let (yr, yc) = (y.offset / y.stride, y.offset % y.stride);
    let rows = xr < yr + y.rows && yr < xr + x.rows;
    let cols = xc < yc + y.cols && yc < xc + x.cols;
    rows && cols
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::Geometry;

    #[test]
    fn test_overlaps() {
        let g = Geometry::dense(8).unwrap();
        let d = g.tile(4, 0, 0);
        assert!(overlaps(&d, &d));
        assert!(!overlaps(&d, &g.tile(4, 0, 1)));
        assert!(!overlaps(&d, &g.tile(4, 1, 0)));
        assert!(!overlaps(&g.tile(4, 1, 0), &g.tile(4, 0, 1)));
        assert!(overlaps(&g.whole(), &g.tile(4, 1, 1)));
    }

    #[test]
    fn test_display() {
        assert_eq!(Kernel::Unrolled(UnrollRows::R8).to_string(), "unrolled(8x4)");
        assert_eq!(Kernel::Lanes.to_string(), "lanes");
    }
}
