mod error;
mod types;

pub use error::*;
pub use types::*;

use std::ffi::CString;
use std::os::raw::c_char;

use fw_core::{
    run_buffer, Dense, EngineConfig, Geometry, Layout, MaxMin, PackedBits, PackedReachability,
    Semiring, ShortestPath,
};

/// Execute a closure that returns an `FwStatus`, catching any panics
/// and converting them into `FwStatus::ErrorInternal`.
fn catch_panic<F: FnOnce() -> FwStatus + std::panic::UnwindSafe>(f: F) -> FwStatus {
    match std::panic::catch_unwind(f) {
        Ok(status) => status,
        Err(_) => {
            set_last_error("internal panic".to_string());
            FwStatus::ErrorInternal
        }
    }
}

/// Validates the raw arguments and runs one closure in place.
///
/// # Safety
/// `data` must be null or point to `geom.len()` writable elements, and
/// `config` must be null or point to a valid `FwConfig`.
unsafe fn run_raw<S, L>(
    variant: FwVariant,
    config: *const FwConfig,
    data: *mut S::Elem,
    geom: Geometry,
) -> FwStatus
where
    S: Semiring,
    L: Layout<S::Elem>,
{
    let len = geom.len();
    if data.is_null() && len > 0 {
        set_last_error("data is null".to_string());
        return FwStatus::ErrorInvalidArgument;
    }
    if (data as usize) % std::mem::align_of::<S::Elem>() != 0 {
        set_last_error(format!(
            "data is not aligned to {} bytes",
            std::mem::align_of::<S::Elem>()
        ));
        return FwStatus::ErrorMisaligned;
    }
    let config = if config.is_null() {
        EngineConfig::default()
    } else {
        EngineConfig::from(unsafe { &*config })
    };
    let buf: &mut [S::Elem] = if len == 0 {
        &mut []
    } else {
        unsafe { std::slice::from_raw_parts_mut(data, len) }
    };
    match run_buffer::<S, L>(buf, geom, variant.into(), &config) {
        Ok(()) => FwStatus::Ok,
        Err(e) => report(e),
    }
}

fn dense_geometry(n: usize) -> Result<Geometry, FwStatus> {
    Geometry::dense(n).map_err(report)
}

/// Closure of an `n`×`n` row-major `f32` matrix, in place.
///
/// Only the shortest-path and max-min instances are defined over `f32`.
/// `config` may be null for the defaults.
#[no_mangle]
pub unsafe extern "C" fn fw_closure_f32(
    semiring: FwSemiring,
    variant: FwVariant,
    config: *const FwConfig,
    data: *mut f32,
    n: usize,
) -> FwStatus {
    catch_panic(|| {
        let geom = match dense_geometry(n) {
            Ok(g) => g,
            Err(status) => return status,
        };
        match semiring {
            FwSemiring::ShortestPath => unsafe {
                run_raw::<ShortestPath<f32>, Dense>(variant, config, data, geom)
            },
            FwSemiring::MaxMin => unsafe { run_raw::<MaxMin<f32>, Dense>(variant, config, data, geom) },
            FwSemiring::TransitiveClosure => {
                set_last_error("transitive closure needs a packed boolean matrix".to_string());
                FwStatus::ErrorInvalidArgument
            }
        }
    })
}

/// Closure of an `n`×`n` row-major `f64` matrix, in place.
#[no_mangle]
pub unsafe extern "C" fn fw_closure_f64(
    semiring: FwSemiring,
    variant: FwVariant,
    config: *const FwConfig,
    data: *mut f64,
    n: usize,
) -> FwStatus {
    catch_panic(|| {
        let geom = match dense_geometry(n) {
            Ok(g) => g,
            Err(status) => return status,
        };
        match semiring {
            FwSemiring::ShortestPath => unsafe {
                run_raw::<ShortestPath<f64>, Dense>(variant, config, data, geom)
            },
            FwSemiring::MaxMin => unsafe { run_raw::<MaxMin<f64>, Dense>(variant, config, data, geom) },
            FwSemiring::TransitiveClosure => {
                set_last_error("transitive closure needs a packed boolean matrix".to_string());
                FwStatus::ErrorInvalidArgument
            }
        }
    })
}

/// Transitive closure of a packed boolean matrix of `n * ceil(n / 8)` bytes.
///
/// Bit `j % 8` of byte `j / 8` in row `i` is cell `(i, j)`. Unused high bits
/// of each row's last byte must be zero and stay zero.
#[no_mangle]
pub unsafe extern "C" fn fw_closure_packed(
    variant: FwVariant,
    config: *const FwConfig,
    data: *mut u8,
    n: usize,
) -> FwStatus {
    catch_panic(|| {
        let geom = match Geometry::packed(n) {
            Ok(g) => g,
            Err(e) => return report(e),
        };
        unsafe { run_raw::<PackedReachability, PackedBits>(variant, config, data, geom) }
    })
}

/// Write the default configuration into `*out`.
#[no_mangle]
pub unsafe extern "C" fn fw_default_config(out: *mut FwConfig) -> FwStatus {
    if out.is_null() {
        set_last_error("out is null".to_string());
        return FwStatus::ErrorInvalidArgument;
    }
    unsafe {
        *out = FwConfig::default();
    }
    FwStatus::Ok
}

/// Returns the last error message for this thread, or null.
///
/// The caller owns the string and must free it with `fw_free_string`.
#[no_mangle]
pub extern "C" fn fw_last_error() -> *const c_char {
    match error::take_last_error() {
        Some(e) => e.into_raw(),
        None => std::ptr::null(),
    }
}

/// Free a string previously returned by `fw_last_error`.
#[no_mangle]
pub unsafe extern "C" fn fw_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

/// Library version as a static NUL-terminated string.
#[no_mangle]
pub extern "C" fn fw_version() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr() as *const c_char
}
