//! Comma-separated matrix text format.
//!
//! ```text
//! 3
//! 0,1,
//! ,0,2.5
//! ,,0
//! ```
//!
//! The first line holds `N`, followed by `N` rows of `N` fields. An empty
//! field means "no edge" and is read as the semiring identity. For boolean
//! relations every non-empty field is true.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use half::f16;
use memmap2::Mmap;
use tracing::debug;

use fw_core::{
    DenseMatrix, ElementKind, Matrix, MaxMin, PackedBoolMatrix, Semiring, SemiringKind,
    ShortestPath, Weight,
};

use crate::error::{IoError, Result};

/// A matrix text file mapped into memory.
pub struct MatrixFile {
    /// `None` for an empty file, which cannot be mapped.
    mmap: Option<Mmap>,
}

impl MatrixFile {
    /// Memory-map the file at `path`.
    pub fn open(path: &Path) -> Result<MatrixFile> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        let mmap = if len == 0 {
            None
        } else {
            // SAFETY: read-only mapping; the file must not be truncated while mapped.
            Some(unsafe { Mmap::map(&file)? })
        };
        debug!(path = %path.display(), bytes = len, "mapped matrix file");
        Ok(MatrixFile { mmap })
    }

    /// File contents as text.
    pub fn text(&self) -> Result<&str> {
        match &self.mmap {
            Some(m) => std::str::from_utf8(m).map_err(|_| IoError::NotUtf8),
            None => Ok(""),
        }
    }

    /// Parse as weights; empty fields become `missing`.
    pub fn weights<T: Weight>(&self, missing: T) -> Result<DenseMatrix<T>> {
        parse_weights(self.text()?, missing)
    }

    /// Parse as a boolean relation.
    pub fn reachability(&self) -> Result<DenseMatrix<bool>> {
        parse_reachability(self.text()?)
    }

    /// Parse into the storage form `element`, using the identity of `kind`
    /// for missing edges.
    pub fn matrix(&self, kind: SemiringKind, element: ElementKind) -> Result<Matrix> {
        parse_matrix(self.text()?, kind, element)
    }
}

/// Splits the header and returns `N` together with the row lines.
fn rows(text: &str) -> Result<(usize, Vec<&str>)> {
    let mut lines = text.lines();
    let header = lines.next().ok_or(IoError::MissingHeader)?;
    let n = header.trim().parse::<usize>().map_err(|_| IoError::InvalidHeader {
        line: 1,
        text: header.to_string(),
    })?;
    let mut body: Vec<&str> = lines.collect();
    // tolerate trailing blank lines
    while body.len() > n && body.last().is_some_and(|l| l.trim().is_empty()) {
        body.pop();
    }
    if body.len() != n {
        return Err(IoError::RowCount {
            expected: n,
            got: body.len(),
        });
    }
    Ok((n, body))
}

/// Calls `cell(line, field, text)` for each of the `N` fields of each row.
fn for_each_field<F>(n: usize, body: &[&str], mut cell: F) -> Result<()>
where
    F: FnMut(usize, usize, &str) -> Result<()>,
{
    for (i, line) in body.iter().enumerate() {
        let line_no = i + 2;
        let fields: Vec<&str> = if n == 0 { Vec::new() } else { line.split(',').collect() };
        if fields.len() != n {
            return Err(IoError::FieldCount {
                line: line_no,
                expected: n,
                got: fields.len(),
            });
        }
        for (j, field) in fields.into_iter().enumerate() {
            cell(line_no, j, field.trim())?;
        }
    }
    Ok(())
}

pub fn parse_weights<T: Weight>(text: &str, missing: T) -> Result<DenseMatrix<T>> {
    let (n, body) = rows(text)?;
    let mut out = DenseMatrix::filled(n, missing)?;
    for_each_field(n, &body, |line, j, field| {
        if field.is_empty() {
            return Ok(());
        }
        let v = field.parse::<f64>().map_err(|_| IoError::InvalidNumber {
            line,
            field: j + 1,
            text: field.to_string(),
        })?;
        out.set(line - 2, j, T::from_f64(v));
        Ok(())
    })?;
    Ok(out)
}

pub fn parse_reachability(text: &str) -> Result<DenseMatrix<bool>> {
    let (n, body) = rows(text)?;
    let mut out = DenseMatrix::filled(n, false)?;
    for_each_field(n, &body, |line, j, field| {
        if !field.is_empty() {
            out.set(line - 2, j, true);
        }
        Ok(())
    })?;
    Ok(out)
}

/// Parses `text` into the requested storage form.
///
/// # Errors
/// Returns [`ClosureError::UnsupportedElement`](fw_core::ClosureError) when
/// `kind` is not defined over `element`, plus every parse error.
pub fn parse_matrix(text: &str, kind: SemiringKind, element: ElementKind) -> Result<Matrix> {
    let unsupported = || {
        IoError::Closure(fw_core::ClosureError::UnsupportedElement {
            semiring: kind.to_string(),
            element: element.to_string(),
        })
    };
    Ok(match (kind, element) {
        (SemiringKind::TransitiveClosure, ElementKind::Bool) => parse_reachability(text)?.into(),
        (SemiringKind::TransitiveClosure, ElementKind::Bit) => {
            PackedBoolMatrix::from_dense(&parse_reachability(text)?)?.into()
        }
        (SemiringKind::TransitiveClosure, _) => return Err(unsupported()),
        (_, ElementKind::F16) => parse_weights(text, missing_for::<f16>(kind))?.into(),
        (_, ElementKind::F32) => parse_weights(text, missing_for::<f32>(kind))?.into(),
        (_, ElementKind::F64) => parse_weights(text, missing_for::<f64>(kind))?.into(),
        (_, ElementKind::Bool | ElementKind::Bit) => return Err(unsupported()),
    })
}

fn missing_for<T: Weight>(kind: SemiringKind) -> T {
    match kind {
        SemiringKind::MaxMin => MaxMin::<T>::identity(),
        _ => ShortestPath::<T>::identity(),
    }
}

/// Writes weights with the shortest decimal form that reads back exactly.
/// Cells equal to `missing` are written as empty fields.
pub fn write_weights<T: Weight, W: Write>(out: &mut W, m: &DenseMatrix<T>, missing: T) -> Result<()> {
    writeln!(out, "{}", m.n())?;
    for i in 0..m.n() {
        for (j, &v) in m.row(i).iter().enumerate() {
            if j > 0 {
                out.write_all(b",")?;
            }
            if v != missing {
                write!(out, "{v}")?;
            }
        }
        out.write_all(b"\n")?;
    }
    Ok(())
}

/// Writes `1` for true and an empty field for false.
pub fn write_reachability<W: Write>(out: &mut W, m: &DenseMatrix<bool>) -> Result<()> {
    writeln!(out, "{}", m.n())?;
    for i in 0..m.n() {
        let line: Vec<&str> = m.row(i).iter().map(|&b| if b { "1" } else { "" }).collect();
        writeln!(out, "{}", line.join(","))?;
    }
    Ok(())
}

pub fn write_matrix<W: Write>(out: &mut W, m: &Matrix, kind: SemiringKind) -> Result<()> {
    match m {
        Matrix::F16(d) => write_weights(out, d, missing_for::<f16>(kind)),
        Matrix::F32(d) => write_weights(out, d, missing_for::<f32>(kind)),
        Matrix::F64(d) => write_weights(out, d, missing_for::<f64>(kind)),
        Matrix::Bool(d) => write_reachability(out, d),
        Matrix::Packed(p) => write_reachability(out, &p.to_dense()?),
    }
}

/// Writes `m` to `path`, replacing any existing file.
pub fn save_matrix(path: &Path, m: &Matrix, kind: SemiringKind) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write_matrix(&mut out, m, kind)?;
    out.flush()?;
    debug!(path = %path.display(), n = m.n(), "wrote matrix file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "3\n0,1,\n,0,2.5\n,,0\n";

    #[test]
    fn test_parse_weights() {
        let m = parse_weights(SAMPLE, f32::INFINITY).unwrap();
        assert_eq!(m.n(), 3);
        assert_eq!(m.get(0, 1), 1.0);
        assert_eq!(m.get(0, 2), f32::INFINITY);
        assert_eq!(m.get(1, 2), 2.5);
    }

    #[test]
    fn test_parse_reachability() {
        let m = parse_reachability("2\n,x\n0,\n").unwrap();
        assert!(!m.get(0, 0));
        assert!(m.get(0, 1));
        // "0" is a non-empty field and therefore an edge
        assert!(m.get(1, 0));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse_weights::<f32>("", 0.0), Err(IoError::MissingHeader)));
        assert!(matches!(
            parse_weights::<f32>("x\n", 0.0),
            Err(IoError::InvalidHeader { line: 1, .. })
        ));
        assert!(matches!(
            parse_weights::<f32>("2\n1,2\n", 0.0),
            Err(IoError::RowCount { expected: 2, got: 1 })
        ));
        assert!(matches!(
            parse_weights::<f32>("2\n1,2\n3\n", 0.0),
            Err(IoError::FieldCount { line: 3, expected: 2, got: 1 })
        ));
        assert!(matches!(
            parse_weights::<f32>("2\n1,2\n3,abc\n", 0.0),
            Err(IoError::InvalidNumber { line: 3, field: 2, .. })
        ));
    }

    #[test]
    fn test_empty_matrix() {
        let m = parse_weights::<f64>("0\n", f64::INFINITY).unwrap();
        assert_eq!(m.n(), 0);
        let mut buf = Vec::new();
        write_weights(&mut buf, &m, f64::INFINITY).unwrap();
        assert_eq!(buf, b"0\n");
    }

    #[test]
    fn test_write_weights_roundtrip() {
        let m = parse_weights(SAMPLE, f64::INFINITY).unwrap();
        let mut buf = Vec::new();
        write_weights(&mut buf, &m, f64::INFINITY).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, SAMPLE);
        assert_eq!(parse_weights(&text, f64::INFINITY).unwrap(), m);
    }

    #[test]
    fn test_write_reachability() {
        let m = DenseMatrix::from_rows(&[vec![true, false], vec![false, true]]).unwrap();
        let mut buf = Vec::new();
        write_reachability(&mut buf, &m).unwrap();
        assert_eq!(buf, b"2\n1,\n,1\n");
        assert_eq!(parse_reachability(std::str::from_utf8(&buf).unwrap()).unwrap(), m);
    }

    #[test]
    fn test_parse_matrix_forms() {
        let mm = parse_matrix(SAMPLE, SemiringKind::MaxMin, ElementKind::F64).unwrap();
        match mm {
            Matrix::F64(d) => assert_eq!(d.get(0, 2), f64::NEG_INFINITY),
            other => panic!("unexpected {other:?}"),
        }
        let packed = parse_matrix(SAMPLE, SemiringKind::TransitiveClosure, ElementKind::Bit).unwrap();
        assert_eq!(packed.element_kind(), ElementKind::Bit);
        assert!(parse_matrix(SAMPLE, SemiringKind::ShortestPath, ElementKind::Bool).is_err());
        assert!(parse_matrix(SAMPLE, SemiringKind::TransitiveClosure, ElementKind::F32).is_err());
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.txt");
        let m: Matrix = parse_weights(SAMPLE, f32::INFINITY).unwrap().into();
        save_matrix(&path, &m, SemiringKind::ShortestPath).unwrap();
        let back = MatrixFile::open(&path)
            .unwrap()
            .matrix(SemiringKind::ShortestPath, ElementKind::F32)
            .unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn test_open_empty_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mf = MatrixFile::open(file.path()).unwrap();
        assert!(matches!(mf.weights(f32::INFINITY), Err(IoError::MissingHeader)));
    }
}
