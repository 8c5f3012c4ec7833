use std::fmt;

use crate::element::Element;
use crate::error::{ClosureError, Result};

/// A rectangular window into a row-major buffer.
///
/// Views never own data. Tile routines receive them by value together with
/// the full buffer, so a destination view may overlap a source view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileView {
    /// Index of the top-left unit within the buffer.
    pub offset: usize,
    /// Units between the starts of two consecutive rows.
    pub stride: usize,
    /// Number of logical rows.
    pub rows: usize,
    /// Number of storage units per row covered by the view.
    pub cols: usize,
}

impl TileView {
    /// Buffer index of unit `j` in row `i`.
    #[inline(always)]
    pub fn at(&self, i: usize, j: usize) -> usize {
        self.offset + i * self.stride + j
    }

    /// Buffer index of the first unit of row `i`.
    #[inline(always)]
    pub fn row_start(&self, i: usize) -> usize {
        self.offset + i * self.stride
    }

    /// One past the last buffer index covered by the view.
    pub fn end(&self) -> usize {
        if self.rows == 0 || self.cols == 0 {
            self.offset
        } else {
            self.row_start(self.rows - 1) + self.cols
        }
    }
}

/// Shape of a square relation matrix in storage units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    /// Number of nodes.
    pub n: usize,
    /// Storage units per row.
    pub stride: usize,
    /// Matrix cells held by one storage unit.
    pub cells_per_unit: usize,
}

impl Geometry {
    /// Geometry for `n` nodes stored `cells_per_unit` cells to a unit.
    ///
    /// Fails if `n` rows of `ceil(n / cells_per_unit)` units overflow `usize`.
    pub fn new(n: usize, cells_per_unit: usize) -> Result<Geometry> {
        let stride = n.div_ceil(cells_per_unit.max(1));
        n.checked_mul(stride)
            .ok_or(ClosureError::DimensionOverflow(n))?;
        Ok(Geometry {
            n,
            stride,
            cells_per_unit: cells_per_unit.max(1),
        })
    }

    /// One unit per cell.
    pub fn dense(n: usize) -> Result<Geometry> {
        Geometry::new(n, 1)
    }

    /// Eight cells per byte; each row padded up to a whole byte.
    pub fn packed(n: usize) -> Result<Geometry> {
        Geometry::new(n, 8)
    }

    /// Total number of storage units.
    pub fn len(&self) -> usize {
        self.n * self.stride
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rejects buffers whose length is not exactly `n * stride`.
    pub fn check_len(&self, got: usize) -> Result<()> {
        if got != self.len() {
            return Err(ClosureError::BufferSize {
                n: self.n,
                expected: self.len(),
                got,
            });
        }
        Ok(())
    }

    /// View over the whole matrix.
    pub fn whole(&self) -> TileView {
        TileView {
            offset: 0,
            stride: self.stride,
            rows: self.n,
            cols: self.stride,
        }
    }

    /// View of tile `(tile_row, tile_col)` for square tiles of `tile` cells.
    ///
    /// The tile size must be a multiple of `cells_per_unit`, which
    /// [`check_tile`](Geometry::check_tile) guarantees.
    pub fn tile(&self, tile: usize, tile_row: usize, tile_col: usize) -> TileView {
        let cols = tile / self.cells_per_unit;
        TileView {
            offset: tile_row * tile * self.stride + tile_col * cols,
            stride: self.stride,
            rows: tile,
            cols,
        }
    }

    /// Validates a tile size: it must be positive, divide `n`, and cover
    /// whole storage units.
    pub fn check_tile(&self, tile: usize) -> Result<()> {
        let reason = if tile == 0 {
            "tile size must be positive"
        } else if self.n % tile != 0 {
            "tile size must divide n; pad the matrix or use an untiled variant"
        } else if tile % self.cells_per_unit != 0 {
            "tile size must be a multiple of the cells packed into one byte"
        } else {
            return Ok(());
        };
        Err(ClosureError::TileSize {
            n: self.n,
            tile,
            reason,
        })
    }
}

/// How logical columns map onto storage units, and how the via operand
/// `A[i][k]` is read out of a source view.
pub trait Layout<T>: Copy + Send + Sync + fmt::Debug + 'static {
    /// Matrix cells stored in one unit.
    const CELLS_PER_UNIT: usize;

    /// Via operand for row `i` and logical column `k` of view `a`.
    fn via(buf: &[T], a: TileView, i: usize, k: usize) -> T;
}

/// One cell per unit; the via operand is the unit itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct Dense;

impl<T: Element> Layout<T> for Dense {
    const CELLS_PER_UNIT: usize = 1;

    #[inline(always)]
    fn via(buf: &[T], a: TileView, i: usize, k: usize) -> T {
        buf[a.at(i, k)]
    }
}

/// Bit `j % 8` of byte `j / 8` holds column `j`.
///
/// The via operand is the selected bit broadcast to a whole byte, `0xFF` or
/// `0x00`, so it can be and-ed against a full source byte.
#[derive(Debug, Clone, Copy, Default)]
pub struct PackedBits;

impl PackedBits {
    /// Broadcasts bit `bit` of `byte` to all eight bits.
    #[inline(always)]
    pub fn broadcast(byte: u8, bit: usize) -> u8 {
        0u8.wrapping_sub((byte >> bit) & 1)
    }
}

impl Layout<u8> for PackedBits {
    const CELLS_PER_UNIT: usize = 8;

    #[inline(always)]
    fn via(buf: &[u8], a: TileView, i: usize, k: usize) -> u8 {
        PackedBits::broadcast(buf[a.at(i, k / 8)], k % 8)
    }
}
