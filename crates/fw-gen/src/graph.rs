use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::seq::{index, SliceRandom};
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

use fw_core::{negative_cycle_nodes, reference, DenseMatrix, ShortestPath};

use crate::config::{max_edges, GeneratorConfig};
use crate::error::{GenError, Result};

/// Redraws allowed when negative cycles are excluded.
pub const MAX_ATTEMPTS: usize = 1000;

/// A weighted edge. Undirected graphs store each edge once with `from < to`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub from: usize,
    pub to: usize,
    pub weight: f64,
}

/// A random graph produced by [`generate`].
#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    pub nodes: usize,
    pub directed: bool,
    pub edges: Vec<Edge>,
}

impl Graph {
    /// Adjacency matrix with +∞ for absent edges, the shortest-path input.
    pub fn to_weights(&self) -> Result<DenseMatrix<f64>> {
        self.adjacency(f64::INFINITY, |e| e.weight)
    }

    /// Adjacency matrix with -∞ for absent edges, the max-min input.
    pub fn to_capacities(&self) -> Result<DenseMatrix<f64>> {
        self.adjacency(f64::NEG_INFINITY, |e| e.weight)
    }

    /// Edge relation, the transitive-closure input.
    pub fn to_reachability(&self) -> Result<DenseMatrix<bool>> {
        self.adjacency(false, |_| true)
    }

    /// True when the shortest-path closure reaches a negative cycle.
    pub fn has_negative_cycle(&self) -> Result<bool> {
        if self.edges.iter().all(|e| e.weight >= 0.0) {
            return Ok(false);
        }
        let mut w = self.to_weights()?;
        reference::compute::<ShortestPath<f64>>(w.as_mut_slice(), self.nodes)?;
        Ok(!negative_cycle_nodes(&w).is_empty())
    }

    fn adjacency<T, F>(&self, missing: T, value: F) -> Result<DenseMatrix<T>>
    where
        T: fw_core::Element,
        F: Fn(&Edge) -> T,
    {
        let mut m = DenseMatrix::filled(self.nodes, missing)?;
        for e in &self.edges {
            m.set(e.from, e.to, value(e));
            if !self.directed {
                m.set(e.to, e.from, value(e));
            }
        }
        Ok(m)
    }
}

/// Maps between edge indices and node pairs, excluding self loops.
#[derive(Debug, Clone, Copy)]
struct PairSpace {
    nodes: usize,
    directed: bool,
}

impl PairSpace {
    /// First index of row `i` in the upper triangle.
    fn row_start(&self, i: usize) -> usize {
        i * (2 * self.nodes - i - 1) / 2
    }

    fn index(&self, from: usize, to: usize) -> usize {
        if self.directed {
            from * (self.nodes - 1) + if to > from { to - 1 } else { to }
        } else {
            let (a, b) = if from < to { (from, to) } else { (to, from) };
            self.row_start(a) + (b - a - 1)
        }
    }

    fn pair(&self, idx: usize) -> (usize, usize) {
        if self.directed {
            let from = idx / (self.nodes - 1);
            let r = idx % (self.nodes - 1);
            (from, if r >= from { r + 1 } else { r })
        } else {
            // largest row whose start is not past idx
            let (mut lo, mut hi) = (0, self.nodes - 1);
            while hi - lo > 1 {
                let mid = (lo + hi) / 2;
                if self.row_start(mid) <= idx {
                    lo = mid;
                } else {
                    hi = mid;
                }
            }
            (lo, lo + 1 + (idx - self.row_start(lo)))
        }
    }
}

/// Draws a G(n, m) random graph: `cfg.edges` distinct edges chosen
/// uniformly, after the connectivity skeleton when one is requested.
///
/// With `no_negative_cycle` set, whole graphs are redrawn from the same
/// seeded stream until one has no negative cycle.
pub fn generate(cfg: &GeneratorConfig) -> Result<Graph> {
    cfg.validate()?;
    let mut rng = StdRng::seed_from_u64(cfg.seed);
    for attempt in 1..=MAX_ATTEMPTS {
        let graph = draw_graph(&mut rng, cfg);
        if !cfg.no_negative_cycle || !graph.has_negative_cycle()? {
            debug!(
                nodes = graph.nodes,
                edges = graph.edges.len(),
                directed = cfg.directed,
                connected = cfg.connected,
                seed = cfg.seed,
                attempt,
                "generated graph"
            );
            return Ok(graph);
        }
        trace!(attempt, "negative cycle, redrawing");
    }
    Err(GenError::NegativeCycle {
        attempts: MAX_ATTEMPTS,
    })
}

fn draw_graph<R: Rng>(rng: &mut R, cfg: &GeneratorConfig) -> Graph {
    let n = cfg.nodes;
    let max = max_edges(n, cfg.directed);
    let space = PairSpace {
        nodes: n,
        directed: cfg.directed,
    };

    let mut chosen = Vec::with_capacity(cfg.edges);
    let mut seen = HashSet::with_capacity(cfg.edges);

    if cfg.connected && n >= 2 {
        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(rng);
        let mut skeleton: Vec<(usize, usize)> = order.windows(2).map(|w| (w[0], w[1])).collect();
        if cfg.directed {
            skeleton.push((order[n - 1], order[0]));
        }
        for (from, to) in skeleton {
            let idx = space.index(from, to);
            if seen.insert(idx) {
                chosen.push(idx);
            }
        }
    }

    let draw = (cfg.edges + chosen.len()).min(max);
    for idx in index::sample(rng, max, draw).into_iter() {
        if chosen.len() >= cfg.edges {
            break;
        }
        if seen.insert(idx) {
            chosen.push(idx);
        }
    }

    let edges = chosen
        .into_iter()
        .map(|idx| {
            let (from, to) = space.pair(idx);
            Edge {
                from,
                to,
                weight: draw_weight(rng, cfg),
            }
        })
        .collect::<Vec<_>>();

    Graph {
        nodes: n,
        directed: cfg.directed,
        edges,
    }
}

fn draw_weight<R: Rng>(rng: &mut R, cfg: &GeneratorConfig) -> f64 {
    if cfg.integral {
        let lo = cfg.min_weight.ceil() as i64;
        let hi = cfg.max_weight.floor() as i64;
        rng.gen_range(lo..=hi) as f64
    } else {
        rng.gen_range(cfg.min_weight..=cfg.max_weight)
    }
}
