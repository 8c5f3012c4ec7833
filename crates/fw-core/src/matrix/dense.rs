use crate::element::Element;
use crate::error::{ClosureError, Result};
use crate::matrix::buffer::AlignedBuffer;
use crate::view::Geometry;

/// An N×N relation matrix with one unit per cell, stored row-major.
///
/// The backing storage starts on a lane boundary so lane-batched engines can
/// run with aligned loads when the row length allows it.
#[derive(Debug)]
pub struct DenseMatrix<T: Element> {
    n: usize,
    data: AlignedBuffer<T>,
}

impl<T: Element> DenseMatrix<T> {
    /// Create an `n`×`n` matrix with every cell set to `fill`.
    pub fn filled(n: usize, fill: T) -> Result<Self> {
        let geom = Geometry::dense(n)?;
        Ok(DenseMatrix {
            n,
            data: AlignedBuffer::filled(geom.len(), fill)?,
        })
    }

    /// Take a row-major vector of exactly `n * n` cells.
    pub fn from_vec(n: usize, data: Vec<T>) -> Result<Self> {
        Geometry::dense(n)?.check_len(data.len())?;
        Ok(DenseMatrix {
            n,
            data: AlignedBuffer::from_slice(&data)?,
        })
    }

    /// Build from nested rows; every row must have `rows.len()` cells.
    pub fn from_rows(rows: &[Vec<T>]) -> Result<Self> {
        let n = rows.len();
        let mut flat = Vec::with_capacity(n * n);
        for row in rows {
            if row.len() != n {
                return Err(ClosureError::BufferSize {
                    n,
                    expected: n,
                    got: row.len(),
                });
            }
            flat.extend_from_slice(row);
        }
        Self::from_vec(n, flat)
    }

    /// Number of nodes.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Returns the cell at row `i`, column `j`.
    ///
    /// # Panics
    /// Panics if `i` or `j` is not below `n`.
    pub fn get(&self, i: usize, j: usize) -> T {
        assert!(i < self.n && j < self.n, "index ({i}, {j}) out of bounds for n={}", self.n);
        self.data.as_slice()[i * self.n + j]
    }

    /// Overwrites the cell at row `i`, column `j`.
    ///
    /// # Panics
    /// Panics if `i` or `j` is not below `n`.
    pub fn set(&mut self, i: usize, j: usize, value: T) {
        assert!(i < self.n && j < self.n, "index ({i}, {j}) out of bounds for n={}", self.n);
        let n = self.n;
        self.data.as_mut_slice()[i * n + j] = value;
    }

    /// Row `i` as a slice.
    pub fn row(&self, i: usize) -> &[T] {
        &self.data.as_slice()[i * self.n..(i + 1) * self.n]
    }

    pub fn as_slice(&self) -> &[T] {
        self.data.as_slice()
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.data.as_mut_slice()
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.data.as_slice().to_vec()
    }

    /// Fallible deep copy.
    pub fn try_clone(&self) -> Result<Self> {
        Ok(DenseMatrix {
            n: self.n,
            data: self.data.try_clone()?,
        })
    }

    /// Copy into a larger `new_n`×`new_n` matrix, filling the added rows and
    /// columns with `fill`.
    ///
    /// Filling with the semiring identity adds nodes without edges, which
    /// leaves every original cell of the closure unchanged. This is how a
    /// caller satisfies the tile-size precondition for arbitrary `n`.
    pub fn padded(&self, new_n: usize, fill: T) -> Result<Self> {
        if new_n < self.n {
            return Err(ClosureError::BufferSize {
                n: self.n,
                expected: self.n,
                got: new_n,
            });
        }
        let mut out = DenseMatrix::filled(new_n, fill)?;
        for i in 0..self.n {
            let start = i * new_n;
            out.as_mut_slice()[start..start + self.n].copy_from_slice(self.row(i));
        }
        Ok(out)
    }

    /// Padding target: the smallest multiple of `multiple` not below `n`.
    pub fn padded_size(n: usize, multiple: usize) -> usize {
        if multiple == 0 {
            n
        } else {
            n.div_ceil(multiple) * multiple
        }
    }

    /// Copy of the leading `n`×`n` block.
    pub fn cropped(&self, n: usize) -> Result<Self> {
        if n > self.n {
            return Err(ClosureError::BufferSize {
                n: self.n,
                expected: self.n,
                got: n,
            });
        }
        let mut flat = Vec::with_capacity(n * n);
        for i in 0..n {
            flat.extend_from_slice(&self.row(i)[..n]);
        }
        Self::from_vec(n, flat)
    }
}

impl<T: Element> PartialEq for DenseMatrix<T> {
    fn eq(&self, other: &Self) -> bool {
        self.n == other.n && self.as_slice() == other.as_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::LANE_BYTES;

    #[test]
    fn test_filled_and_access() {
        let mut m = DenseMatrix::filled(3, f32::INFINITY).unwrap();
        assert_eq!(m.n(), 3);
        assert_eq!(m.as_slice().len(), 9);
        m.set(1, 2, 4.0);
        assert_eq!(m.get(1, 2), 4.0);
        assert_eq!(m.row(1), &[f32::INFINITY, f32::INFINITY, 4.0]);
    }

    #[test]
    fn test_storage_is_lane_aligned() {
        let m = DenseMatrix::filled(7, 0.0f64).unwrap();
        assert_eq!(m.as_slice().as_ptr() as usize % LANE_BYTES, 0);
    }

    #[test]
    fn test_from_vec_rejects_wrong_size() {
        assert!(DenseMatrix::from_vec(2, vec![1.0f32; 3]).is_err());
        assert!(DenseMatrix::from_vec(2, vec![1.0f32; 4]).is_ok());
        assert_eq!(DenseMatrix::<f32>::from_vec(0, vec![]).unwrap().n(), 0);
    }

    #[test]
    fn test_from_rows() {
        let m = DenseMatrix::from_rows(&[vec![true, false], vec![false, true]]).unwrap();
        assert!(m.get(0, 0));
        assert!(!m.get(0, 1));
        assert!(DenseMatrix::from_rows(&[vec![true], vec![false, true]]).is_err());
    }

    #[test]
    fn test_pad_then_crop() {
        let m = DenseMatrix::from_vec(3, (0..9).map(|v| v as f32).collect()).unwrap();
        let p = m.padded(DenseMatrix::<f32>::padded_size(3, 4), f32::INFINITY).unwrap();
        assert_eq!(p.n(), 4);
        assert_eq!(p.get(2, 2), 8.0);
        assert_eq!(p.get(3, 0), f32::INFINITY);
        assert_eq!(p.get(0, 3), f32::INFINITY);
        assert_eq!(p.cropped(3).unwrap(), m);
        assert!(p.cropped(5).is_err());
        assert!(m.padded(2, 0.0).is_err());
    }

    #[test]
    fn test_padded_size() {
        assert_eq!(DenseMatrix::<f32>::padded_size(7, 4), 8);
        assert_eq!(DenseMatrix::<f32>::padded_size(8, 4), 8);
        assert_eq!(DenseMatrix::<f32>::padded_size(0, 4), 0);
    }

    #[test]
    #[should_panic]
    fn test_get_out_of_bounds_panics() {
        let m = DenseMatrix::filled(2, 0.0f32).unwrap();
        let _ = m.get(2, 0);
    }
}
