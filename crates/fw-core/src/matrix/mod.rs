mod buffer;
pub mod dense;
pub mod packed;

use half::f16;

use crate::element::{ElementKind, Weight};
use crate::error::Result;
use crate::semiring::{MaxMin, Semiring, SemiringKind, ShortestPath};

pub use dense::DenseMatrix;
pub use packed::{bytes_per_row, PackedBoolMatrix};

/// A relation matrix in one of the supported storage forms.
#[derive(Debug)]
pub enum Matrix {
    F16(DenseMatrix<f16>),
    F32(DenseMatrix<f32>),
    F64(DenseMatrix<f64>),
    Bool(DenseMatrix<bool>),
    Packed(PackedBoolMatrix),
}

impl Matrix {
    /// Number of nodes.
    pub fn n(&self) -> usize {
        match self {
            Matrix::F16(m) => m.n(),
            Matrix::F32(m) => m.n(),
            Matrix::F64(m) => m.n(),
            Matrix::Bool(m) => m.n(),
            Matrix::Packed(m) => m.n(),
        }
    }

    /// Storage form of this matrix.
    pub fn element_kind(&self) -> ElementKind {
        match self {
            Matrix::F16(_) => ElementKind::F16,
            Matrix::F32(_) => ElementKind::F32,
            Matrix::F64(_) => ElementKind::F64,
            Matrix::Bool(_) => ElementKind::Bool,
            Matrix::Packed(_) => ElementKind::Bit,
        }
    }

    /// Fallible deep copy.
    pub fn try_clone(&self) -> Result<Matrix> {
        Ok(match self {
            Matrix::F16(m) => Matrix::F16(m.try_clone()?),
            Matrix::F32(m) => Matrix::F32(m.try_clone()?),
            Matrix::F64(m) => Matrix::F64(m.try_clone()?),
            Matrix::Bool(m) => Matrix::Bool(m.try_clone()?),
            Matrix::Packed(m) => Matrix::Packed(m.try_clone()?),
        })
    }

    /// Copy grown to `new_n` nodes, the added cells holding the identity of
    /// `kind` so the closure of the original block is unchanged.
    pub fn padded(&self, new_n: usize, kind: SemiringKind) -> Result<Matrix> {
        Ok(match self {
            Matrix::F16(m) => Matrix::F16(m.padded(new_n, identity_for(kind))?),
            Matrix::F32(m) => Matrix::F32(m.padded(new_n, identity_for(kind))?),
            Matrix::F64(m) => Matrix::F64(m.padded(new_n, identity_for(kind))?),
            Matrix::Bool(m) => Matrix::Bool(m.padded(new_n, false)?),
            Matrix::Packed(m) => {
                Matrix::Packed(PackedBoolMatrix::from_dense(&m.to_dense()?.padded(new_n, false)?)?)
            }
        })
    }

    /// Copy of the leading `n`×`n` block.
    pub fn cropped(&self, n: usize) -> Result<Matrix> {
        Ok(match self {
            Matrix::F16(m) => Matrix::F16(m.cropped(n)?),
            Matrix::F32(m) => Matrix::F32(m.cropped(n)?),
            Matrix::F64(m) => Matrix::F64(m.cropped(n)?),
            Matrix::Bool(m) => Matrix::Bool(m.cropped(n)?),
            Matrix::Packed(m) => Matrix::Packed(PackedBoolMatrix::from_dense(&m.to_dense()?.cropped(n)?)?),
        })
    }
}

fn identity_for<T: Weight>(kind: SemiringKind) -> T {
    match kind {
        SemiringKind::MaxMin => MaxMin::<T>::identity(),
        _ => ShortestPath::<T>::identity(),
    }
}

impl PartialEq for Matrix {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Matrix::F16(a), Matrix::F16(b)) => a == b,
            (Matrix::F32(a), Matrix::F32(b)) => a == b,
            (Matrix::F64(a), Matrix::F64(b)) => a == b,
            (Matrix::Bool(a), Matrix::Bool(b)) => a == b,
            (Matrix::Packed(a), Matrix::Packed(b)) => a == b,
            _ => false,
        }
    }
}

impl From<DenseMatrix<f16>> for Matrix {
    fn from(m: DenseMatrix<f16>) -> Self {
        Matrix::F16(m)
    }
}

impl From<DenseMatrix<f32>> for Matrix {
    fn from(m: DenseMatrix<f32>) -> Self {
        Matrix::F32(m)
    }
}

impl From<DenseMatrix<f64>> for Matrix {
    fn from(m: DenseMatrix<f64>) -> Self {
        Matrix::F64(m)
    }
}

impl From<DenseMatrix<bool>> for Matrix {
    fn from(m: DenseMatrix<bool>) -> Self {
        Matrix::Bool(m)
    }
}

impl From<PackedBoolMatrix> for Matrix {
    fn from(m: PackedBoolMatrix) -> Self {
        Matrix::Packed(m)
    }
}
