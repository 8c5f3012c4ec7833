use crate::element::Weight;
use crate::matrix::DenseMatrix;

/// Nodes lying on a negative cycle of a completed shortest-path closure.
///
/// The recurrence does not detect negative cycles. After one has been
/// traversed the affected diagonal entries drop below zero, and every value
/// depending on them is unreliable.
pub fn negative_cycle_nodes<T: Weight>(closed: &DenseMatrix<T>) -> Vec<usize> {
    (0..closed.n())
        .filter(|&i| closed.get(i, i) < T::ZERO)
        .collect()
}
