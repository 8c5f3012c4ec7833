//! Operator sets for the generalized Floyd-Warshall recurrence.
//!
//! Every engine applies the same per-cell update
//!
//! ```text
//! M[i][j] = combine(M[i][j], relax(M[i][k], M[k][j]))
//! ```
//!
//! and differs only in which operator set it is instantiated with:
//!
//! | Type | combine | relax | identity | Problem |
//! |------|---------|-------|----------|---------|
//! | [`ShortestPath<T>`] | min | + | +∞ | all-pairs shortest distances |
//! | [`MaxMin<T>`] | max | min | -∞ | bottleneck (widest path) capacities |
//! | [`Reachability`] | or | and | false | transitive closure |
//! | [`PackedReachability`] | bitwise or | bitwise and | 0x00 | transitive closure, 8 cells per byte |
//!
//! The identity is absorbing for `relax`, so a missing edge can never produce
//! a candidate that beats a stored value.

use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use crate::element::{Element, Weight};
use crate::error::ClosureError;

/// The two operators and identity of one closure instance.
///
/// Implementations are zero-sized and stateless; engines are generic over
/// this trait so the operator choice is resolved at compile time.
pub trait Semiring: Copy + Clone + Send + Sync + fmt::Debug + 'static {
    /// Storage unit the operators act on.
    type Elem: Element;

    const KIND: SemiringKind;

    /// Value representing "no relation" between two nodes.
    fn identity() -> Self::Elem;

    /// Keeps the better of the stored value and a new candidate.
    fn combine(current: Self::Elem, candidate: Self::Elem) -> Self::Elem;

    /// Candidate value for (i, j) through an intermediate node k.
    fn relax(ik: Self::Elem, kj: Self::Elem) -> Self::Elem;

    /// One application of the recurrence to a single cell.
    #[inline(always)]
    fn update(current: Self::Elem, ik: Self::Elem, kj: Self::Elem) -> Self::Elem {
        Self::combine(current, Self::relax(ik, kj))
    }

    /// Returns true if `a` is at least as good as `b` in this instance's order.
    fn no_worse(a: Self::Elem, b: Self::Elem) -> bool {
        Self::combine(a, b) == a
    }
}

/// `(min, +, +∞)`: shortest path distances.
///
/// A negative cycle makes the result meaningless; callers with untrusted
/// input should inspect the diagonal afterwards (see
/// [`negative_cycle_nodes`](crate::diagnostics::negative_cycle_nodes)).
pub struct ShortestPath<T>(PhantomData<T>);

/// `(max, min, -∞)`: maximum bottleneck capacities.
pub struct MaxMin<T>(PhantomData<T>);

/// `(or, and, false)` over one `bool` per cell.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reachability;

/// `(or, and, 0)` applied bitwise to packed bytes.
///
/// The via operand is expected to be a broadcast mask (`0xFF` or `0x00`),
/// see [`PackedBits`](crate::view::PackedBits).
#[derive(Debug, Clone, Copy, Default)]
pub struct PackedReachability;

// Manual impls: derives would require `T: Clone` etc. on the marker.
macro_rules! marker_impls {
    ($name:ident) => {
        impl<T> Clone for $name<T> {
            fn clone(&self) -> Self {
                *self
            }
        }

        impl<T> Copy for $name<T> {}

        impl<T> Default for $name<T> {
            fn default() -> Self {
                $name(PhantomData)
            }
        }

        impl<T> fmt::Debug for $name<T> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}<{}>", stringify!($name), std::any::type_name::<T>())
            }
        }
    };
}

marker_impls!(ShortestPath);
marker_impls!(MaxMin);

impl<T: Weight> Semiring for ShortestPath<T> {
    type Elem = T;

    const KIND: SemiringKind = SemiringKind::ShortestPath;

    #[inline(always)]
    fn identity() -> T {
        T::INFINITY
    }

    #[inline(always)]
    fn combine(current: T, candidate: T) -> T {
        if current < candidate {
            current
        } else {
            candidate
        }
    }

    #[inline(always)]
    fn relax(ik: T, kj: T) -> T {
        ik.sum(kj)
    }
}

impl<T: Weight> Semiring for MaxMin<T> {
    type Elem = T;

    const KIND: SemiringKind = SemiringKind::MaxMin;

    #[inline(always)]
    fn identity() -> T {
        T::NEG_INFINITY
    }

    #[inline(always)]
    fn combine(current: T, candidate: T) -> T {
        if current > candidate {
            current
        } else {
            candidate
        }
    }

    #[inline(always)]
    fn relax(ik: T, kj: T) -> T {
        if ik < kj {
            ik
        } else {
            kj
        }
    }
}

impl Semiring for Reachability {
    type Elem = bool;

    const KIND: SemiringKind = SemiringKind::TransitiveClosure;

    #[inline(always)]
    fn identity() -> bool {
        false
    }

    #[inline(always)]
    fn combine(current: bool, candidate: bool) -> bool {
        current | candidate
    }

    #[inline(always)]
    fn relax(ik: bool, kj: bool) -> bool {
        ik & kj
    }
}

impl Semiring for PackedReachability {
    type Elem = u8;

    const KIND: SemiringKind = SemiringKind::TransitiveClosure;

    #[inline(always)]
    fn identity() -> u8 {
        0
    }

    #[inline(always)]
    fn combine(current: u8, candidate: u8) -> u8 {
        current | candidate
    }

    #[inline(always)]
    fn relax(ik: u8, kj: u8) -> u8 {
        ik & kj
    }
}

/// Runtime selector for the three closure instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemiringKind {
    ShortestPath,
    MaxMin,
    TransitiveClosure,
}

impl SemiringKind {
    /// Canonical hyphenated name, as accepted by [`FromStr`].
    pub fn name(&self) -> &'static str {
        match self {
            SemiringKind::ShortestPath => "shortest-path",
            SemiringKind::MaxMin => "max-min",
            SemiringKind::TransitiveClosure => "transitive-closure",
        }
    }
}

impl fmt::Display for SemiringKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SemiringKind {
    type Err = ClosureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shortest-path" | "sp" => Ok(SemiringKind::ShortestPath),
            "max-min" | "mm" => Ok(SemiringKind::MaxMin),
            "transitive-closure" | "tc" => Ok(SemiringKind::TransitiveClosure),
            other => Err(ClosureError::UnknownName {
                what: "semiring",
                name: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shortest_path_ops() {
        type S = ShortestPath<f32>;
        assert_eq!(S::identity(), f32::INFINITY);
        assert_eq!(S::relax(1.0, 2.5), 3.5);
        assert_eq!(S::combine(4.0, 3.5), 3.5);
        assert_eq!(S::update(10.0, 1.0, 3.0), 4.0);
        // identity absorbs relax
        assert_eq!(S::relax(S::identity(), 5.0), f32::INFINITY);
    }

    #[test]
    fn test_max_min_ops() {
        type S = MaxMin<f64>;
        assert_eq!(S::identity(), f64::NEG_INFINITY);
        assert_eq!(S::relax(5.0, 3.0), 3.0);
        assert_eq!(S::combine(1.0, 3.0), 3.0);
        assert_eq!(S::update(1.0, 5.0, 3.0), 3.0);
        assert_eq!(S::relax(S::identity(), 7.0), f64::NEG_INFINITY);
    }

    #[test]
    fn test_reachability_ops() {
        assert!(Reachability::update(false, true, true));
        assert!(!Reachability::update(false, true, false));
        assert!(Reachability::update(true, false, false));
    }

    #[test]
    fn test_packed_ops_are_bitwise() {
        assert_eq!(PackedReachability::update(0b0000_0001, 0xFF, 0b1010_0000), 0b1010_0001);
        assert_eq!(PackedReachability::update(0b0000_0001, 0x00, 0b1010_0000), 0b0000_0001);
    }

    #[test]
    fn test_no_worse() {
        assert!(ShortestPath::<f32>::no_worse(1.0, 2.0));
        assert!(!ShortestPath::<f32>::no_worse(3.0, 2.0));
        assert!(MaxMin::<f32>::no_worse(3.0, 2.0));
        assert!(Reachability::no_worse(true, false));
        assert!(!Reachability::no_worse(false, true));
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!("sp".parse::<SemiringKind>().unwrap(), SemiringKind::ShortestPath);
        assert_eq!("max-min".parse::<SemiringKind>().unwrap(), SemiringKind::MaxMin);
        assert_eq!(
            "transitive-closure".parse::<SemiringKind>().unwrap(),
            SemiringKind::TransitiveClosure
        );
        assert!("plus-times".parse::<SemiringKind>().is_err());
    }
}
