use std::fmt;
use std::str::FromStr;

use half::f16;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::element::Element;
use crate::error::{ClosureError, Result};
use crate::kernel::{self, Kernel};
use crate::matrix::{DenseMatrix, Matrix, PackedBoolMatrix};
use crate::reference;
use crate::semiring::{MaxMin, PackedReachability, Reachability, Semiring, SemiringKind, ShortestPath};
use crate::tiled;
use crate::view::{Dense, Geometry, Layout, PackedBits};

/// Engine variants selectable at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// Plain triple loop.
    Reference,
    /// Untiled, register-blocked rows.
    Unrolled,
    /// Four-phase tiles with the unrolled kernel. Needs a tile size.
    Tiled,
    /// Lane groups with a boundary mask, tiled when a tile size is given.
    LaneBatched,
}

impl Variant {
    pub const ALL: [Variant; 4] = [
        Variant::Reference,
        Variant::Unrolled,
        Variant::Tiled,
        Variant::LaneBatched,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Variant::Reference => "reference",
            Variant::Unrolled => "unrolled",
            Variant::Tiled => "tiled",
            Variant::LaneBatched => "lane-batched",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Variant {
    type Err = ClosureError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "reference" | "ref" => Ok(Variant::Reference),
            "unrolled" | "unroll" => Ok(Variant::Unrolled),
            "tiled" => Ok(Variant::Tiled),
            "lane-batched" | "lanes" | "simd" => Ok(Variant::LaneBatched),
            other => Err(ClosureError::UnknownName {
                what: "variant",
                name: other.to_string(),
            }),
        }
    }
}

/// Runs one variant over a raw buffer described by `geom`.
///
/// The buffer is updated in place. On error it is left untouched: every
/// precondition is checked before the first write.
pub fn run_buffer<S, L>(
    buf: &mut [S::Elem],
    geom: Geometry,
    variant: Variant,
    config: &EngineConfig,
) -> Result<()>
where
    S: Semiring,
    L: Layout<S::Elem>,
{
    config.validate()?;
    geom.check_len(buf.len())?;
    let rows = config.unroll()?;
    let semiring = S::KIND;
    let element = <S::Elem as Element>::KIND;

    debug!(
        n = geom.n,
        %variant,
        %semiring,
        %element,
        tile = ?config.tile_size,
        unroll_rows = rows.rows(),
        aligned = config.aligned_loads,
        "running closure"
    );

    if config.aligned_loads && variant != Variant::LaneBatched {
        warn!(%variant, "aligned loads only apply to the lane-batched variant; ignoring");
    }

    match variant {
        Variant::Reference => reference::compute_with_layout::<S, L>(buf, geom),
        Variant::Unrolled => {
            if let Some(tile) = config.tile_size {
                warn!(tile, "unrolled variant runs untiled; ignoring tile size");
            }
            let whole = geom.whole();
            Kernel::Unrolled(rows).update_aliased::<S, L>(buf, whole, whole, whole);
            Ok(())
        }
        Variant::Tiled => {
            let tile = config
                .tile_size
                .ok_or_else(|| ClosureError::MissingTileSize(variant.to_string()))?;
            tiled::compute_tiled::<S, L>(buf, geom, tile, Kernel::Unrolled(rows))
        }
        Variant::LaneBatched => {
            if let Some(tile) = config.tile_size {
                geom.check_tile(tile)?;
            }
            if config.aligned_loads {
                kernel::check_alignment(buf, &geom, config.tile_size)?;
            }
            match config.tile_size {
                Some(tile) => tiled::compute_tiled::<S, L>(buf, geom, tile, Kernel::Lanes),
                None => {
                    let whole = geom.whole();
                    Kernel::Lanes.update_aliased::<S, L>(buf, whole, whole, whole);
                    Ok(())
                }
            }
        }
    }
}

/// Closure of a dense matrix under semiring `S`.
pub fn closure<S: Semiring>(
    matrix: &mut DenseMatrix<S::Elem>,
    variant: Variant,
    config: &EngineConfig,
) -> Result<()> {
    let geom = Geometry::dense(matrix.n())?;
    run_buffer::<S, Dense>(matrix.as_mut_slice(), geom, variant, config)
}

/// Transitive closure of a packed boolean matrix.
pub fn closure_packed(
    matrix: &mut PackedBoolMatrix,
    variant: Variant,
    config: &EngineConfig,
) -> Result<()> {
    let geom = Geometry::packed(matrix.n())?;
    run_buffer::<PackedReachability, PackedBits>(matrix.as_bytes_mut(), geom, variant, config)
}

/// Runs the closure selected by `kind` and `variant` over `matrix`.
///
/// # Errors
/// Returns [`ClosureError::UnsupportedElement`] when the semiring is not
/// defined over the matrix's storage form, plus every precondition error of
/// the chosen variant.
pub fn run_closure(
    matrix: &mut Matrix,
    kind: SemiringKind,
    variant: Variant,
    config: &EngineConfig,
) -> Result<()> {
    match (kind, matrix) {
        (SemiringKind::ShortestPath, Matrix::F16(m)) => closure::<ShortestPath<f16>>(m, variant, config),
        (SemiringKind::ShortestPath, Matrix::F32(m)) => closure::<ShortestPath<f32>>(m, variant, config),
        (SemiringKind::ShortestPath, Matrix::F64(m)) => closure::<ShortestPath<f64>>(m, variant, config),
        (SemiringKind::MaxMin, Matrix::F16(m)) => closure::<MaxMin<f16>>(m, variant, config),
        (SemiringKind::MaxMin, Matrix::F32(m)) => closure::<MaxMin<f32>>(m, variant, config),
        (SemiringKind::MaxMin, Matrix::F64(m)) => closure::<MaxMin<f64>>(m, variant, config),
        (SemiringKind::TransitiveClosure, Matrix::Bool(m)) => closure::<Reachability>(m, variant, config),
        (SemiringKind::TransitiveClosure, Matrix::Packed(m)) => closure_packed(m, variant, config),
        (kind, m) => Err(ClosureError::UnsupportedElement {
            semiring: kind.to_string(),
            element: m.element_kind().to_string(),
        }),
    }
}

/// A configured closure engine usable behind a trait object.
pub trait ClosureBackend: Send + Sync + fmt::Debug {
    /// Returns the name of this backend (e.g. "tiled").
    fn name(&self) -> &str;

    fn variant(&self) -> Variant;

    /// Replaces `matrix` with its closure under `kind`.
    fn run(&self, matrix: &mut Matrix, kind: SemiringKind) -> Result<()>;
}

/// The in-process engine: one variant plus its configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Engine {
    variant: Variant,
    config: EngineConfig,
}

impl Engine {
    pub fn new(variant: Variant, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        if variant == Variant::Tiled && config.tile_size.is_none() {
            return Err(ClosureError::MissingTileSize(variant.to_string()));
        }
        Ok(Engine { variant, config })
    }

    pub fn reference() -> Self {
        Engine {
            variant: Variant::Reference,
            config: EngineConfig::default(),
        }
    }
}

impl ClosureBackend for Engine {
    fn name(&self) -> &str {
        self.variant.name()
    }

    fn variant(&self) -> Variant {
        self.variant
    }

    fn run(&self, matrix: &mut Matrix, kind: SemiringKind) -> Result<()> {
        run_closure(matrix, kind, self.variant, &self.config)
    }
}
