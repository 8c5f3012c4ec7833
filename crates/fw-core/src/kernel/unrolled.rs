use std::fmt;

use crate::error::ClosureError;
use crate::semiring::Semiring;
use crate::view::{Layout, TileView};

/// Columns covered by one register block.
pub const UNROLL_COLS: usize = 4;

/// Rows covered by one register block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnrollRows {
    R1,
    R2,
    #[default]
    R4,
    R8,
    R16,
}

impl UnrollRows {
    pub fn rows(&self) -> usize {
        match self {
            UnrollRows::R1 => 1,
            UnrollRows::R2 => 2,
            UnrollRows::R4 => 4,
            UnrollRows::R8 => 8,
            UnrollRows::R16 => 16,
        }
    }
}

impl TryFrom<usize> for UnrollRows {
    type Error = ClosureError;

    fn try_from(rows: usize) -> Result<Self, Self::Error> {
        match rows {
            1 => Ok(UnrollRows::R1),
            2 => Ok(UnrollRows::R2),
            4 => Ok(UnrollRows::R4),
            8 => Ok(UnrollRows::R8),
            16 => Ok(UnrollRows::R16),
            other => Err(ClosureError::InvalidUnroll(other)),
        }
    }
}

impl fmt::Display for UnrollRows {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rows())
    }
}

pub fn update_aliased<S, L>(
    buf: &mut [S::Elem],
    a: TileView,
    b: TileView,
    c: TileView,
    rows: UnrollRows,
) where
    S: Semiring,
    L: Layout<S::Elem>,
{
    match rows {
        UnrollRows::R1 => aliased::<S, L, 1>(buf, a, b, c),
        UnrollRows::R2 => aliased::<S, L, 2>(buf, a, b, c),
        UnrollRows::R4 => aliased::<S, L, 4>(buf, a, b, c),
        UnrollRows::R8 => aliased::<S, L, 8>(buf, a, b, c),
        UnrollRows::R16 => aliased::<S, L, 16>(buf, a, b, c),
    }
}

pub fn update_disjoint<S, L>(
    buf: &mut [S::Elem],
    a: TileView,
    b: TileView,
    c: TileView,
    rows: UnrollRows,
) where
    S: Semiring,
    L: Layout<S::Elem>,
{
    match rows {
        UnrollRows::R1 => disjoint::<S, L, 1>(buf, a, b, c),
        UnrollRows::R2 => disjoint::<S, L, 2>(buf, a, b, c),
        UnrollRows::R4 => disjoint::<S, L, 4>(buf, a, b, c),
        UnrollRows::R8 => disjoint::<S, L, 8>(buf, a, b, c),
        UnrollRows::R16 => disjoint::<S, L, 16>(buf, a, b, c),
    }
}

/// `k` outermost. The via operands of a row block are read once per `k`
/// and the source row segment once per column block.
fn aliased<S, L, const R: usize>(buf: &mut [S::Elem], a: TileView, b: TileView, c: TileView)
where
    S: Semiring,
    L: Layout<S::Elem>,
{
    let full_rows = c.rows - c.rows % R;
    let full_cols = c.cols - c.cols % UNROLL_COLS;

    for k in 0..b.rows {
        let mut i = 0;
        while i < full_rows {
            let mut via = [S::identity(); R];
            for (r, v) in via.iter_mut().enumerate() {
                *v = L::via(buf, a, i + r, k);
            }

            let mut j = 0;
            while j < full_cols {
                let src = b.at(k, j);
                let mut kj = [S::identity(); UNROLL_COLS];
                kj.copy_from_slice(&buf[src..src + UNROLL_COLS]);
                for (r, &v) in via.iter().enumerate() {
                    let dst = c.at(i + r, j);
                    for (cell, &s) in buf[dst..dst + UNROLL_COLS].iter_mut().zip(kj.iter()) {
                        *cell = S::update(*cell, v, s);
                    }
                }
                j += UNROLL_COLS;
            }

            // column remainder
            for (r, &v) in via.iter().enumerate() {
                for j in full_cols..c.cols {
                    let idx = c.at(i + r, j);
                    buf[idx] = S::update(buf[idx], v, buf[b.at(k, j)]);
                }
            }
            i += R;
        }

        // row remainder
        for i in full_rows..c.rows {
            let v = L::via(buf, a, i, k);
            for j in 0..c.cols {
                let idx = c.at(i, j);
                buf[idx] = S::update(buf[idx], v, buf[b.at(k, j)]);
            }
        }
    }
}

/// `k` innermost over an `R`×[`UNROLL_COLS`] accumulator block, written back
/// once per block. Only valid when `c` overlaps neither source.
fn disjoint<S, L, const R: usize>(buf: &mut [S::Elem], a: TileView, b: TileView, c: TileView)
where
    S: Semiring,
    L: Layout<S::Elem>,
{
    let full_rows = c.rows - c.rows % R;
    let full_cols = c.cols - c.cols % UNROLL_COLS;

    let mut i = 0;
    while i < full_rows {
        let mut j = 0;
        while j < full_cols {
            let mut acc = [[S::identity(); UNROLL_COLS]; R];
            for (r, row) in acc.iter_mut().enumerate() {
                let dst = c.at(i + r, j);
                row.copy_from_slice(&buf[dst..dst + UNROLL_COLS]);
            }
            for k in 0..b.rows {
                let src = b.at(k, j);
                let kj = &buf[src..src + UNROLL_COLS];
                for (r, row) in acc.iter_mut().enumerate() {
                    let v = L::via(buf, a, i + r, k);
                    for (cell, &s) in row.iter_mut().zip(kj.iter()) {
                        *cell = S::update(*cell, v, s);
                    }
                }
            }
            for (r, row) in acc.iter().enumerate() {
                let dst = c.at(i + r, j);
                buf[dst..dst + UNROLL_COLS].copy_from_slice(row);
            }
            j += UNROLL_COLS;
        }

        for r in 0..R {
            for j in full_cols..c.cols {
                disjoint_cell::<S, L>(buf, a, b, c, i + r, j);
            }
        }
        i += R;
    }

    for i in full_rows..c.rows {
        for j in 0..c.cols {
            disjoint_cell::<S, L>(buf, a, b, c, i, j);
        }
    }
}

#[inline(always)]
fn disjoint_cell<S, L>(buf: &mut [S::Elem], a: TileView, b: TileView, c: TileView, i: usize, j: usize)
where
    S: Semiring,
    L: Layout<S::Elem>,
{
    let idx = c.at(i, j);
    let mut acc = buf[idx];
    for k in 0..b.rows {
        acc = S::update(acc, L::via(buf, a, i, k), buf[b.at(k, j)]);
    }
    buf[idx] = acc;
}
