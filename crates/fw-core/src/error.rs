use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClosureError {
    #[error("buffer size mismatch for n={n}: expected {expected} units, got {got}")]
    BufferSize { n: usize, expected: usize, got: usize },
    #[error("tile size {tile} is invalid for n={n}: {reason}")]
    TileSize {
        n: usize,
        tile: usize,
        reason: &'static str,
    },
    #[error("variant {0} requires a tile size")]
    MissingTileSize(String),
    #[error("unsupported unroll factor {0}, expected one of 1, 2, 4, 8, 16")]
    InvalidUnroll(usize),
    #[error("buffer is not aligned for {align}-byte lane access: {detail}")]
    Misaligned { align: usize, detail: String },
    #[error("matrix dimension {0} overflows the address space")]
    DimensionOverflow(usize),
    #[error("allocation of {bytes} bytes failed")]
    Allocation { bytes: usize },
    #[error("semiring {semiring} is not defined over {element} elements")]
    UnsupportedElement { semiring: String, element: String },
    #[error("unknown {what}: {name:?}")]
    UnknownName { what: &'static str, name: String },
}

pub type Result<T> = std::result::Result<T, ClosureError>;
