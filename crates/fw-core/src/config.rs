use crate::error::{ClosureError, Result};
use crate::kernel::UnrollRows;

/// Tuning knobs shared by every engine variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Tile edge in cells. Required by the tiled variant, optional for the
    /// lane-batched one, ignored elsewhere.
    pub tile_size: Option<usize>,
    /// Rows per register block of the unrolled kernel (1, 2, 4, 8 or 16).
    pub unroll_rows: usize,
    /// Lane-batched only: require lane-aligned rows and reject the call
    /// otherwise.
    pub aligned_loads: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            tile_size: None,
            unroll_rows: UnrollRows::default().rows(),
            aligned_loads: false,
        }
    }
}

impl EngineConfig {
    pub fn with_tile_size(mut self, tile: usize) -> Self {
        self.tile_size = Some(tile);
        self
    }

    pub fn with_unroll_rows(mut self, rows: usize) -> Self {
        self.unroll_rows = rows;
        self
    }

    pub fn with_aligned_loads(mut self, aligned: bool) -> Self {
        self.aligned_loads = aligned;
        self
    }

    /// Unroll factor as a checked enum.
    pub fn unroll(&self) -> Result<UnrollRows> {
        UnrollRows::try_from(self.unroll_rows)
    }

    /// Checks the fields that do not depend on the matrix size.
    ///
    /// Tile divisibility is checked against `n` by the tiled engine itself.
    pub fn validate(&self) -> Result<()> {
        self.unroll()?;
        if self.tile_size == Some(0) {
            return Err(ClosureError::TileSize {
                n: 0,
                tile: 0,
                reason: "tile size must be positive",
            });
        }
        Ok(())
    }
}
