use crate::error::Result;
use crate::matrix::buffer::AlignedBuffer;
use crate::matrix::dense::DenseMatrix;
use crate::view::Geometry;

/// A boolean relation matrix storing eight cells per byte.
///
/// Row `i` occupies `ceil(n / 8)` bytes; cell `(i, j)` is bit `j % 8` of
/// byte `j / 8` of that row. When `n` is not a multiple of 8 the high bits of
/// the last byte in every row are unused and kept at zero.
#[derive(Debug)]
pub struct PackedBoolMatrix {
    n: usize,
    bytes_per_row: usize,
    data: AlignedBuffer<u8>,
}

/// Bytes needed to hold one packed row of `n` cells.
pub fn bytes_per_row(n: usize) -> usize {
    n.div_ceil(8)
}

/// Mask of the bits of a row's last byte that correspond to real columns.
fn tail_mask(n: usize) -> u8 {
    match n % 8 {
        0 => 0xFF,
        r => (1u8 << r) - 1,
    }
}

impl PackedBoolMatrix {
    /// All-false `n`×`n` matrix.
    pub fn new(n: usize) -> Result<Self> {
        let geom = Geometry::packed(n)?;
        Ok(PackedBoolMatrix {
            n,
            bytes_per_row: geom.stride,
            data: AlignedBuffer::filled(geom.len(), 0)?,
        })
    }

    /// Take `n * ceil(n / 8)` packed bytes. Unused high bits are cleared.
    pub fn from_bytes(n: usize, bytes: Vec<u8>) -> Result<Self> {
        let geom = Geometry::packed(n)?;
        geom.check_len(bytes.len())?;
        let mut m = PackedBoolMatrix {
            n,
            bytes_per_row: geom.stride,
            data: AlignedBuffer::from_slice(&bytes)?,
        };
        m.clear_padding();
        Ok(m)
    }

    /// Pack a dense boolean matrix.
    pub fn from_dense(dense: &DenseMatrix<bool>) -> Result<Self> {
        let mut m = PackedBoolMatrix::new(dense.n())?;
        for i in 0..dense.n() {
            for (j, &cell) in dense.row(i).iter().enumerate() {
                if cell {
                    m.set(i, j, true);
                }
            }
        }
        Ok(m)
    }

    /// Unpack into one `bool` per cell.
    pub fn to_dense(&self) -> Result<DenseMatrix<bool>> {
        let mut out = DenseMatrix::filled(self.n, false)?;
        for i in 0..self.n {
            for j in 0..self.n {
                if self.get(i, j) {
                    out.set(i, j, true);
                }
            }
        }
        Ok(out)
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn bytes_per_row(&self) -> usize {
        self.bytes_per_row
    }

    /// Returns cell `(i, j)`.
    ///
    /// # Panics
    /// Panics if `i` or `j` is not below `n`.
    pub fn get(&self, i: usize, j: usize) -> bool {
        assert!(i < self.n && j < self.n, "index ({i}, {j}) out of bounds for n={}", self.n);
        let byte = self.data.as_slice()[i * self.bytes_per_row + j / 8];
        (byte >> (j % 8)) & 1 == 1
    }

    /// Sets cell `(i, j)`.
    ///
    /// # Panics
    /// Panics if `i` or `j` is not below `n`.
    pub fn set(&mut self, i: usize, j: usize, value: bool) {
        assert!(i < self.n && j < self.n, "index ({i}, {j}) out of bounds for n={}", self.n);
        let idx = i * self.bytes_per_row + j / 8;
        let bit = 1u8 << (j % 8);
        let bytes = self.data.as_mut_slice();
        if value {
            bytes[idx] |= bit;
        } else {
            bytes[idx] &= !bit;
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.data.as_slice()
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        self.data.as_mut_slice()
    }

    /// Returns true if every unused bit past column `n - 1` is zero.
    pub fn padding_is_clear(&self) -> bool {
        if self.bytes_per_row == 0 {
            return true;
        }
        let keep = tail_mask(self.n);
        (0..self.n).all(|i| {
            let last = self.data.as_slice()[(i + 1) * self.bytes_per_row - 1];
            last & !keep == 0
        })
    }

    fn clear_padding(&mut self) {
        if self.bytes_per_row == 0 {
            return;
        }
        let keep = tail_mask(self.n);
        let bpr = self.bytes_per_row;
        let bytes = self.data.as_mut_slice();
        for i in 0..self.n {
            bytes[(i + 1) * bpr - 1] &= keep;
        }
    }

    /// Fallible deep copy.
    pub fn try_clone(&self) -> Result<Self> {
        Ok(PackedBoolMatrix {
            n: self.n,
            bytes_per_row: self.bytes_per_row,
            data: self.data.try_clone()?,
        })
    }
}

impl PartialEq for PackedBoolMatrix {
    fn eq(&self, other: &Self) -> bool {
        self.n == other.n && self.as_bytes() == other.as_bytes()
    }
}
