use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenError {
    #[error("{edges} edges requested, but a graph on {nodes} nodes has at most {max}")]
    TooManyEdges { nodes: usize, edges: usize, max: usize },
    #[error("a connected graph on {nodes} nodes needs at least {min} edges, got {edges}")]
    TooFewEdges { nodes: usize, edges: usize, min: usize },
    #[error("invalid weight range [{min}, {max}]")]
    WeightRange { min: f64, max: f64 },
    #[error("no graph without a negative cycle after {attempts} attempts")]
    NegativeCycle { attempts: usize },
    #[error("closure error: {0}")]
    Closure(#[from] fw_core::ClosureError),
}

pub type Result<T> = std::result::Result<T, GenError>;
