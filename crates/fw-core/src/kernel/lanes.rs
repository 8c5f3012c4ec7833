//! Lane-batched kernel.
//!
//! Rows are processed in groups of `W = LANE_BYTES / size_of::<T>()` units
//! held in plain `[T; W]` arrays, a shape the optimizer maps onto vector
//! registers without target-specific intrinsics. A row whose length is not a
//! multiple of `W` ends in a partial group guarded by a [`LaneMask`]: lanes
//! past the valid range are filled with the identity on load, keep their
//! previous value on blend, and are never written back.

use crate::element::{lanes_for, Element, LANE_BYTES};
use crate::error::{ClosureError, Result};
use crate::semiring::Semiring;
use crate::view::{Geometry, Layout, TileView};

/// Prefix mask selecting the first `valid` of `W` lanes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaneMask<const W: usize> {
    valid: usize,
}

impl<const W: usize> LaneMask<W> {
    /// All lanes valid.
    pub const FULL: LaneMask<W> = LaneMask { valid: W };

    /// Mask for a group starting `remaining` units before the end of a row.
    pub fn prefix(remaining: usize) -> Self {
        LaneMask {
            valid: remaining.min(W),
        }
    }

    pub fn valid(&self) -> usize {
        self.valid
    }

    pub fn is_full(&self) -> bool {
        self.valid == W
    }

    #[inline(always)]
    pub fn contains(&self, lane: usize) -> bool {
        lane < self.valid
    }

    /// Reads the valid lanes starting at `start`; other lanes get `fill`.
    #[inline(always)]
    pub fn load<T: Copy>(&self, buf: &[T], start: usize, fill: T) -> [T; W] {
        let mut out = [fill; W];
        out[..self.valid].copy_from_slice(&buf[start..start + self.valid]);
        out
    }

    /// Takes `new` in valid lanes and `old` elsewhere.
    #[inline(always)]
    pub fn blend<T: Copy>(&self, new: [T; W], old: [T; W]) -> [T; W] {
        let mut out = old;
        out[..self.valid].copy_from_slice(&new[..self.valid]);
        out
    }

    /// Writes only the valid lanes.
    #[inline(always)]
    pub fn store<T: Copy>(&self, buf: &mut [T], start: usize, value: &[T; W]) {
        buf[start..start + self.valid].copy_from_slice(&value[..self.valid]);
    }
}

/// Broadcast one value to every lane.
#[inline(always)]
pub fn splat<T: Copy, const W: usize>(value: T) -> [T; W] {
    [value; W]
}

/// Lane-wise `relax`.
#[inline(always)]
pub fn relax_lanes<S: Semiring, const W: usize>(
    via: [S::Elem; W],
    row: [S::Elem; W],
) -> [S::Elem; W] {
    let mut out = via;
    for (o, r) in out.iter_mut().zip(row) {
        *o = S::relax(*o, r);
    }
    out
}

/// Lane-wise `combine`.
#[inline(always)]
pub fn combine_lanes<S: Semiring, const W: usize>(
    current: [S::Elem; W],
    candidate: [S::Elem; W],
) -> [S::Elem; W] {
    let mut out = current;
    for (o, c) in out.iter_mut().zip(candidate) {
        *o = S::combine(*o, c);
    }
    out
}

/// Checks the preconditions of aligned lane access.
///
/// The buffer must start on a [`LANE_BYTES`] boundary and every row, and
/// every tile column when `tile` is given, must begin on one as well. An
/// empty matrix always passes.
pub fn check_alignment<T: Element>(buf: &[T], geom: &Geometry, tile: Option<usize>) -> Result<()> {
    if geom.n == 0 {
        return Ok(());
    }
    let unit = std::mem::size_of::<T>();
    let addr = buf.as_ptr() as usize;
    if addr % LANE_BYTES != 0 {
        return Err(ClosureError::Misaligned {
            align: LANE_BYTES,
            detail: format!("buffer starts at offset {} from a lane boundary", addr % LANE_BYTES),
        });
    }
    let row_bytes = geom.stride * unit;
    if row_bytes % LANE_BYTES != 0 {
        return Err(ClosureError::Misaligned {
            align: LANE_BYTES,
            detail: format!("row length of {row_bytes} bytes is not a multiple of the lane width"),
        });
    }
    if let Some(tile) = tile {
        let tile_bytes = tile / geom.cells_per_unit * unit;
        if tile_bytes % LANE_BYTES != 0 {
            return Err(ClosureError::Misaligned {
                align: LANE_BYTES,
                detail: format!(
                    "tile width of {tile_bytes} bytes is not a multiple of the lane width"
                ),
            });
        }
    }
    Ok(())
}

pub fn update_aliased<S, L>(buf: &mut [S::Elem], a: TileView, b: TileView, c: TileView)
where
    S: Semiring,
    L: Layout<S::Elem>,
{
    match lanes_for::<S::Elem>() {
        32 => aliased::<S, L, 32>(buf, a, b, c),
        16 => aliased::<S, L, 16>(buf, a, b, c),
        8 => aliased::<S, L, 8>(buf, a, b, c),
        4 => aliased::<S, L, 4>(buf, a, b, c),
        _ => aliased::<S, L, 1>(buf, a, b, c),
    }
}

pub fn update_disjoint<S, L>(buf: &mut [S::Elem], a: TileView, b: TileView, c: TileView)
where
    S: Semiring,
    L: Layout<S::Elem>,
{
    match lanes_for::<S::Elem>() {
        32 => disjoint::<S, L, 32>(buf, a, b, c),
        16 => disjoint::<S, L, 16>(buf, a, b, c),
        8 => disjoint::<S, L, 8>(buf, a, b, c),
        4 => disjoint::<S, L, 4>(buf, a, b, c),
        _ => disjoint::<S, L, 1>(buf, a, b, c),
    }
}

fn aliased<S, L, const W: usize>(buf: &mut [S::Elem], a: TileView, b: TileView, c: TileView)
where
    S: Semiring,
    L: Layout<S::Elem>,
{
    let fill = S::identity();
    for k in 0..b.rows {
        for i in 0..c.rows {
            let via = splat::<_, W>(L::via(buf, a, i, k));
            let mut j = 0;
            while j < c.cols {
                let mask = LaneMask::<W>::prefix(c.cols - j);
                let dst = c.at(i, j);
                let current = mask.load(buf, dst, fill);
                let kj = mask.load(buf, b.at(k, j), fill);
                let updated = combine_lanes::<S, W>(current, relax_lanes::<S, W>(via, kj));
                mask.store(buf, dst, &mask.blend(updated, current));
                j += W;
            }
        }
    }
}

fn disjoint<S, L, const W: usize>(buf: &mut [S::Elem], a: TileView, b: TileView, c: TileView)
where
    S: Semiring,
    L: Layout<S::Elem>,
{
    let fill = S::identity();
    for i in 0..c.rows {
        let mut j = 0;
        while j < c.cols {
            let mask = LaneMask::<W>::prefix(c.cols - j);
            let dst = c.at(i, j);
            let mut acc = mask.load(buf, dst, fill);
            for k in 0..b.rows {
                let via = splat::<_, W>(L::via(buf, a, i, k));
                let kj = mask.load(buf, b.at(k, j), fill);
                acc = combine_lanes::<S, W>(acc, relax_lanes::<S, W>(via, kj));
            }
            mask.store(buf, dst, &acc);
            j += W;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::test_util::{naive, weights};
    use crate::semiring::{PackedReachability, Reachability, ShortestPath};
    use crate::view::{Dense, PackedBits};

    #[test]
    fn test_mask_load_store() {
        let mut buf = [1.0f32, 2.0, 3.0, 4.0, 5.0, 99.0];
        let mask = LaneMask::<8>::prefix(5);
        assert_eq!(mask.valid(), 5);
        assert!(!mask.is_full());
        let v = mask.load(&buf, 0, f32::INFINITY);
        assert_eq!(v[4], 5.0);
        assert_eq!(v[5], f32::INFINITY);
        mask.store(&mut buf, 0, &[0.0; 8]);
        // the unit past the valid range is untouched
        assert_eq!(buf, [0.0, 0.0, 0.0, 0.0, 0.0, 99.0]);
    }

    #[test]
    fn test_mask_blend_keeps_tail() {
        let mask = LaneMask::<4>::prefix(2);
        assert_eq!(mask.blend([1, 2, 3, 4], [9, 9, 9, 9]), [1, 2, 9, 9]);
        assert!(mask.contains(1));
        assert!(!mask.contains(2));
        assert!(LaneMask::<4>::prefix(10).is_full());
        assert_eq!(LaneMask::<4>::FULL.valid(), 4);
    }

    #[test]
    fn test_batched_ops() {
        let via = splat::<f32, 4>(1.0);
        let row = [1.0, f32::INFINITY, 3.0, 0.5];
        let cand = relax_lanes::<ShortestPath<f32>, 4>(via, row);
        assert_eq!(cand, [2.0, f32::INFINITY, 4.0, 1.5]);
        let out = combine_lanes::<ShortestPath<f32>, 4>([3.0, 1.0, 3.0, 3.0], cand);
        assert_eq!(out, [2.0, 1.0, 3.0, 1.5]);
    }

    #[test]
    fn test_tail_group_matches_naive() {
        // 11 columns of f32 = one full group of 8 and a tail of 3
        let g = Geometry::dense(11).unwrap();
        let mut expected = weights(11, 7);
        let mut got = expected.clone();
        naive::<ShortestPath<f32>, Dense>(&mut expected, g);
        let w = g.whole();
        update_aliased::<ShortestPath<f32>, Dense>(&mut got, w, w, w);
        assert_eq!(got, expected);
    }

    #[test]
    fn test_view_never_writes_outside() {
        // tile (0,0) of width 3 inside rows of 5: columns 3 and 4 stay put
        let g = Geometry::dense(5).unwrap();
        let mut buf = vec![true; 25];
        for i in 0..5 {
            buf[i * 5 + 3] = false;
            buf[i * 5 + 4] = false;
        }
        let t = TileView {
            offset: 0,
            stride: g.stride,
            rows: 3,
            cols: 3,
        };
        update_aliased::<Reachability, Dense>(&mut buf, t, t, t);
        for i in 0..5 {
            assert!(!buf[i * 5 + 3]);
            assert!(!buf[i * 5 + 4]);
        }
    }

    #[test]
    fn test_packed_bytes_tail() {
        // n = 9 -> 2 bytes per row, far below 32 lanes
        let g = Geometry::packed(9).unwrap();
        let mut buf = vec![0u8; g.len()];
        for i in 0..8 {
            let j = i + 1;
            buf[i * 2 + j / 8] |= 1 << (j % 8);
        }
        let mut expected = buf.clone();
        naive::<PackedReachability, PackedBits>(&mut expected, g);
        let w = g.whole();
        update_aliased::<PackedReachability, PackedBits>(&mut buf, w, w, w);
        assert_eq!(buf, expected);
        assert_eq!(buf[1] & 0xFE, 0);
    }

    #[test]
    fn test_disjoint_matches_aliased_on_disjoint_tiles() {
        let g = Geometry::dense(16).unwrap();
        let base = weights(16, 9);
        let (a, b, c) = (g.tile(8, 1, 0), g.tile(8, 0, 1), g.tile(8, 1, 1));
        let mut x = base.clone();
        let mut y = base;
        update_aliased::<ShortestPath<f32>, Dense>(&mut x, a, b, c);
        update_disjoint::<ShortestPath<f32>, Dense>(&mut y, a, b, c);
        assert_eq!(x, y);
    }

    #[test]
    fn test_alignment_check() {
        let m = crate::matrix::DenseMatrix::filled(8, 0.0f32).unwrap();
        let g = Geometry::dense(8).unwrap();
        assert!(check_alignment(m.as_slice(), &g, None).is_ok());
        assert!(check_alignment(m.as_slice(), &g, Some(8)).is_ok());
        assert!(matches!(
            check_alignment(m.as_slice(), &g, Some(4)),
            Err(ClosureError::Misaligned { .. })
        ));
        assert!(check_alignment(&m.as_slice()[1..], &g, None).is_err());

        let odd = crate::matrix::DenseMatrix::filled(7, 0.0f32).unwrap();
        let g7 = Geometry::dense(7).unwrap();
        assert!(check_alignment(odd.as_slice(), &g7, None).is_err());

        let empty: [f32; 0] = [];
        assert!(check_alignment(&empty, &Geometry::dense(0).unwrap(), Some(4)).is_ok());
    }
}
