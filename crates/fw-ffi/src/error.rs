use std::cell::RefCell;
use std::ffi::CString;

use fw_core::ClosureError;

use crate::types::FwStatus;

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Store an error message for later retrieval via `fw_last_error`.
pub fn set_last_error(msg: String) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Take the last error message, leaving `None` in its place.
pub fn take_last_error() -> Option<CString> {
    LAST_ERROR.with(|e| e.borrow_mut().take())
}

/// Record `err` and map it to a status code.
pub fn report(err: ClosureError) -> FwStatus {
    let status = match err {
        ClosureError::Misaligned { .. } => FwStatus::ErrorMisaligned,
        ClosureError::Allocation { .. } => FwStatus::ErrorOutOfMemory,
        ClosureError::UnknownName { .. } | ClosureError::UnsupportedElement { .. } => {
            FwStatus::ErrorInvalidArgument
        }
        _ => FwStatus::ErrorPrecondition,
    };
    set_last_error(err.to_string());
    status
}
