use thiserror::Error;

#[derive(Error, Debug)]
pub enum IoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("closure error: {0}")]
    Closure(#[from] fw_core::ClosureError),
    #[error("missing header line with the node count")]
    MissingHeader,
    #[error("line {line}: invalid node count {text:?}")]
    InvalidHeader { line: usize, text: String },
    #[error("{expected} rows announced, but {got} provided")]
    RowCount { expected: usize, got: usize },
    #[error("line {line}: expected {expected} fields, got {got}")]
    FieldCount {
        line: usize,
        expected: usize,
        got: usize,
    },
    #[error("line {line}, field {field}: invalid number {text:?}")]
    InvalidNumber {
        line: usize,
        field: usize,
        text: String,
    },
    #[error("file is not valid UTF-8")]
    NotUtf8,
    #[error("incompatible matrix dimensions: {left} and {right}")]
    ShapeMismatch { left: usize, right: usize },
}

pub type Result<T> = std::result::Result<T, IoError>;
