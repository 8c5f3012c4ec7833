use std::fmt;
use std::str::FromStr;

use crate::error::{GenError, Result};

/// Edge-count presets relative to the node count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Density {
    /// `n * floor(ln n)`
    Sparse,
    /// `n * floor(ln(n)^2)`
    LogSquared,
    /// `n * floor(ln(n^2)^2)`
    Dense,
    /// `floor(n^2 / 2)`
    Half,
}

impl Density {
    /// Edge count for `n` nodes, before clamping to the possible maximum.
    pub fn edges(&self, n: usize) -> usize {
        if n < 2 {
            return 0;
        }
        let ln = (n as f64).ln();
        match self {
            Density::Sparse => n * ln.floor() as usize,
            Density::LogSquared => n * ln.powi(2).floor() as usize,
            Density::Dense => n * (2.0 * ln).powi(2).floor() as usize,
            Density::Half => n * n / 2,
        }
    }

    /// Preset selected by a repeat count, as in `-d`, `-dd`, `-ddd`.
    pub fn from_level(level: u8) -> Density {
        match level {
            0 => Density::Sparse,
            1 => Density::LogSquared,
            2 => Density::Dense,
            _ => Density::Half,
        }
    }
}

impl fmt::Display for Density {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Density::Sparse => write!(f, "sparse"),
            Density::LogSquared => write!(f, "log-squared"),
            Density::Dense => write!(f, "dense"),
            Density::Half => write!(f, "half"),
        }
    }
}

impl FromStr for Density {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "sparse" => Ok(Density::Sparse),
            "log-squared" => Ok(Density::LogSquared),
            "dense" => Ok(Density::Dense),
            "half" => Ok(Density::Half),
            other => Err(format!("unknown density {other:?}")),
        }
    }
}

/// Parameters of one random graph.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    pub nodes: usize,
    pub edges: usize,
    pub directed: bool,
    pub min_weight: f64,
    pub max_weight: f64,
    /// Round weights to integers so that path sums are exact.
    pub integral: bool,
    /// Every node reaches every other: a random Hamiltonian cycle when
    /// directed, a random spanning path when not.
    pub connected: bool,
    /// Redraw until the shortest-path closure has no negative cycle.
    pub no_negative_cycle: bool,
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            nodes: 30,
            edges: 42,
            directed: true,
            min_weight: 0.0,
            max_weight: 10.0,
            integral: false,
            connected: false,
            no_negative_cycle: false,
            seed: 0,
        }
    }
}

impl GeneratorConfig {
    pub fn new(nodes: usize, edges: usize) -> Self {
        GeneratorConfig {
            nodes,
            edges,
            ..GeneratorConfig::default()
        }
    }

    /// Edge count taken from a density preset.
    pub fn with_density(nodes: usize, density: Density) -> Self {
        let max = max_edges(nodes, true);
        GeneratorConfig::new(nodes, density.edges(nodes).min(max))
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_weights(mut self, min: f64, max: f64) -> Self {
        self.min_weight = min;
        self.max_weight = max;
        self
    }

    pub fn with_integral(mut self, integral: bool) -> Self {
        self.integral = integral;
        self
    }

    pub fn with_connected(mut self, connected: bool) -> Self {
        self.connected = connected;
        self
    }

    pub fn with_directed(mut self, directed: bool) -> Self {
        self.directed = directed;
        self
    }

    pub fn with_no_negative_cycle(mut self, no_negative_cycle: bool) -> Self {
        self.no_negative_cycle = no_negative_cycle;
        self
    }

    /// Edges the connectivity skeleton uses.
    pub fn skeleton_edges(&self) -> usize {
        match (self.connected, self.nodes) {
            (false, _) | (true, 0 | 1) => 0,
            (true, n) if self.directed => n,
            (true, n) => n - 1,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let max = max_edges(self.nodes, self.directed);
        if self.edges > max {
            return Err(GenError::TooManyEdges {
                nodes: self.nodes,
                edges: self.edges,
                max,
            });
        }
        let min = self.skeleton_edges();
        if self.edges < min {
            return Err(GenError::TooFewEdges {
                nodes: self.nodes,
                edges: self.edges,
                min,
            });
        }
        let range_ok = self.min_weight.is_finite()
            && self.max_weight.is_finite()
            && self.min_weight <= self.max_weight
            && (!self.integral || self.min_weight.ceil() <= self.max_weight.floor());
        if !range_ok {
            return Err(GenError::WeightRange {
                min: self.min_weight,
                max: self.max_weight,
            });
        }
        // an undirected negative edge is a negative cycle of length two
        if self.no_negative_cycle && self.edges > 0 && self.max_weight < 0.0 && !self.directed {
            return Err(GenError::WeightRange {
                min: self.min_weight,
                max: self.max_weight,
            });
        }
        Ok(())
    }
}

/// Number of distinct edges without self loops.
pub fn max_edges(nodes: usize, directed: bool) -> usize {
    let pairs = nodes * nodes.saturating_sub(1);
    if directed {
        pairs
    } else {
        pairs / 2
    }
}
