use std::fmt;
use std::str::FromStr;

use half::f16;

use crate::error::ClosureError;

/// Width of one lane group in bytes. Lane-batched kernels process
/// `LANE_BYTES / size_of::<T>()` storage units per batched operation.
pub const LANE_BYTES: usize = 32;

/// Number of lanes of `T` that fit into one lane group.
pub const fn lanes_for<T>() -> usize {
    let size = std::mem::size_of::<T>();
    if size == 0 || size > LANE_BYTES {
        1
    } else {
        LANE_BYTES / size
    }
}

/// Storage representations a relation matrix can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// 16-bit floating point (IEEE 754 half-precision, via the `half` crate).
    F16,
    /// 32-bit floating point.
    F32,
    /// 64-bit floating point.
    F64,
    /// One `bool` per cell.
    Bool,
    /// Packed booleans, eight cells per byte.
    Bit,
}

impl ElementKind {
    /// Size in bytes of one storage unit.
    ///
    /// For `Bit` the unit is a byte holding eight cells.
    pub fn size_in_bytes(&self) -> usize {
        match self {
            ElementKind::F16 => 2,
            ElementKind::F32 => 4,
            ElementKind::F64 => 8,
            ElementKind::Bool | ElementKind::Bit => 1,
        }
    }

    /// Number of matrix cells stored in one unit.
    pub fn cells_per_unit(&self) -> usize {
        match self {
            ElementKind::Bit => 8,
            _ => 1,
        }
    }

    /// Number of units processed per lane group.
    pub fn lanes(&self) -> usize {
        LANE_BYTES / self.size_in_bytes()
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKind::F16 => write!(f, "f16"),
            ElementKind::F32 => write!(f, "f32"),
            ElementKind::F64 => write!(f, "f64"),
            ElementKind::Bool => write!(f, "bool"),
            ElementKind::Bit => write!(f, "bit"),
        }
    }
}

impl FromStr for ElementKind {
    type Err = ClosureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "f16" => Ok(ElementKind::F16),
            "f32" => Ok(ElementKind::F32),
            "f64" => Ok(ElementKind::F64),
            "bool" => Ok(ElementKind::Bool),
            "bit" | "packed" => Ok(ElementKind::Bit),
            other => Err(ClosureError::UnknownName {
                what: "element kind",
                name: other.to_string(),
            }),
        }
    }
}

/// A storage unit of a relation matrix buffer.
pub trait Element: Copy + PartialEq + fmt::Debug + Send + Sync + 'static {
    const KIND: ElementKind;
}

impl Element for f16 {
    const KIND: ElementKind = ElementKind::F16;
}

impl Element for f32 {
    const KIND: ElementKind = ElementKind::F32;
}

impl Element for f64 {
    const KIND: ElementKind = ElementKind::F64;
}

impl Element for bool {
    const KIND: ElementKind = ElementKind::Bool;
}

impl Element for u8 {
    const KIND: ElementKind = ElementKind::Bit;
}

/// Floating point element carrying edge weights or capacities.
pub trait Weight: Element + PartialOrd + fmt::Display {
    const INFINITY: Self;
    const NEG_INFINITY: Self;
    const ZERO: Self;

    /// Plain addition in the element's own precision.
    fn sum(self, rhs: Self) -> Self;

    fn from_f64(v: f64) -> Self;

    fn to_f64(self) -> f64;
}

impl Weight for f32 {
    const INFINITY: Self = f32::INFINITY;
    const NEG_INFINITY: Self = f32::NEG_INFINITY;
    const ZERO: Self = 0.0;

    #[inline(always)]
    fn sum(self, rhs: Self) -> Self {
        self + rhs
    }

    fn from_f64(v: f64) -> Self {
        v as f32
    }

    fn to_f64(self) -> f64 {
        self as f64
    }
}

impl Weight for f64 {
    const INFINITY: Self = f64::INFINITY;
    const NEG_INFINITY: Self = f64::NEG_INFINITY;
    const ZERO: Self = 0.0;

    #[inline(always)]
    fn sum(self, rhs: Self) -> Self {
        self + rhs
    }

    fn from_f64(v: f64) -> Self {
        v
    }

    fn to_f64(self) -> f64 {
        self
    }
}

impl Weight for f16 {
    const INFINITY: Self = f16::INFINITY;
    const NEG_INFINITY: Self = f16::NEG_INFINITY;
    const ZERO: Self = f16::ZERO;

    #[inline(always)]
    fn sum(self, rhs: Self) -> Self {
        self + rhs
    }

    fn from_f64(v: f64) -> Self {
        f16::from_f64(v)
    }

    fn to_f64(self) -> f64 {
        f16::to_f64(self)
    }
}
