use std::path::Path;

use approx::AbsDiffEq;
use fw_core::DenseMatrix;

use crate::error::{IoError, Result};
use crate::text::MatrixFile;

/// Default absolute tolerance for cell comparison.
pub const DEFAULT_PRECISION: f64 = 0.01;

/// One cell whose values differ by more than the tolerance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mismatch {
    pub row: usize,
    pub col: usize,
    pub left: f64,
    pub right: f64,
}

/// Outcome of comparing two matrices of the same size.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub n: usize,
    pub mismatches: Vec<Mismatch>,
}

impl Comparison {
    pub fn is_equal(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Reads a matrix for comparison.
///
/// Unlike the strict parser, any field that is not a number (including the
/// empty field) reads as +∞, and fields past the `N`-th are ignored. This
/// accepts weight outputs and `1`/empty closure outputs alike.
pub fn parse_lenient(text: &str) -> Result<DenseMatrix<f64>> {
    let mut lines = text.lines();
    let header = lines.next().ok_or(IoError::MissingHeader)?;
    let n = header.trim().parse::<usize>().map_err(|_| IoError::InvalidHeader {
        line: 1,
        text: header.to_string(),
    })?;
    let mut body: Vec<&str> = lines.collect();
    while body.len() > n && body.last().is_some_and(|l| l.trim().is_empty()) {
        body.pop();
    }
    if body.len() != n {
        return Err(IoError::RowCount {
            expected: n,
            got: body.len(),
        });
    }

    let mut out = DenseMatrix::filled(n, f64::INFINITY)?;
    for (i, line) in body.iter().enumerate() {
        for (j, field) in line.split(',').take(n).enumerate() {
            if let Ok(v) = field.trim().parse::<f64>() {
                out.set(i, j, v);
            }
        }
    }
    Ok(out)
}

/// Equal within `precision`, with infinities equal only to themselves.
pub fn cells_match(a: f64, b: f64, precision: f64) -> bool {
    a == b || a.abs_diff_eq(&b, precision)
}

/// Compares two matrices cell by cell.
///
/// # Errors
/// Returns [`IoError::ShapeMismatch`] when the sizes differ.
pub fn compare(a: &DenseMatrix<f64>, b: &DenseMatrix<f64>, precision: f64) -> Result<Comparison> {
    if a.n() != b.n() {
        return Err(IoError::ShapeMismatch {
            left: a.n(),
            right: b.n(),
        });
    }
    let mut mismatches = Vec::new();
    for i in 0..a.n() {
        for (j, (&l, &r)) in a.row(i).iter().zip(b.row(i)).enumerate() {
            if !cells_match(l, r, precision) {
                mismatches.push(Mismatch {
                    row: i,
                    col: j,
                    left: l,
                    right: r,
                });
            }
        }
    }
    Ok(Comparison {
        n: a.n(),
        mismatches,
    })
}

/// Reads and compares two matrix files.
pub fn compare_files(a: &Path, b: &Path, precision: f64) -> Result<Comparison> {
    let left = parse_lenient(MatrixFile::open(a)?.text()?)?;
    let right = parse_lenient(MatrixFile::open(b)?.text()?)?;
    compare(&left, &right, precision)
}
