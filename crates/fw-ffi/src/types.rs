use fw_core::{EngineConfig, Variant};

/// Status codes returned by all FFI functions.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FwStatus {
    Ok = 0,
    ErrorInvalidArgument = 1,
    ErrorPrecondition = 2,
    ErrorMisaligned = 3,
    ErrorOutOfMemory = 4,
    ErrorInternal = 5,
}

/// Closure instance selector.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FwSemiring {
    ShortestPath = 0,
    MaxMin = 1,
    TransitiveClosure = 2,
}

/// Engine variant selector.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FwVariant {
    Reference = 0,
    Unrolled = 1,
    Tiled = 2,
    LaneBatched = 3,
}

impl From<FwVariant> for Variant {
    fn from(v: FwVariant) -> Self {
        match v {
            FwVariant::Reference => Variant::Reference,
            FwVariant::Unrolled => Variant::Unrolled,
            FwVariant::Tiled => Variant::Tiled,
            FwVariant::LaneBatched => Variant::LaneBatched,
        }
    }
}

/// Engine tuning. A `tile_size` of 0 means untiled.
#[repr(C)]
#[derive(Debug, Clone)]
pub struct FwConfig {
    pub tile_size: u32,
    pub unroll_rows: u32,
    pub aligned_loads: bool,
}

impl Default for FwConfig {
    fn default() -> Self {
        Self {
            tile_size: 0,
            unroll_rows: EngineConfig::default().unroll_rows as u32,
            aligned_loads: false,
        }
    }
}

impl From<&FwConfig> for EngineConfig {
    fn from(c: &FwConfig) -> Self {
        EngineConfig {
            tile_size: match c.tile_size {
                0 => None,
                t => Some(t as usize),
            },
            unroll_rows: c.unroll_rows as usize,
            aligned_loads: c.aligned_loads,
        }
    }
}
