use std::fmt;

use crate::element::{lanes_for, Element, LANE_BYTES};
use crate::error::{ClosureError, Result};

/// Heap buffer whose visible window starts on a [`LANE_BYTES`] boundary.
///
/// The backing vector is over-allocated by one lane group and the window is
/// shifted to the first aligned element, which keeps the type free of
/// custom allocators.
pub(crate) struct AlignedBuffer<T> {
    raw: Vec<T>,
    offset: usize,
    len: usize,
}

impl<T: Element> AlignedBuffer<T> {
    /// Allocate `len` units set to `value`.
    ///
    /// Allocation failure is reported instead of aborting.
    pub(crate) fn filled(len: usize, value: T) -> Result<Self> {
        let slack = lanes_for::<T>();
        let bytes = len
            .checked_add(slack)
            .and_then(|cap| cap.checked_mul(std::mem::size_of::<T>()))
            .ok_or(ClosureError::DimensionOverflow(len))?;
        let cap = len + slack;

        let mut raw = Vec::new();
        raw.try_reserve_exact(cap)
            .map_err(|_| ClosureError::Allocation { bytes })?;
        raw.resize(cap, value);

        let offset = raw.as_ptr().align_offset(LANE_BYTES);
        // align_offset may decline to compute an offset; fall back to the
        // natural alignment in that case.
        let offset = if offset <= slack { offset } else { 0 };

        Ok(AlignedBuffer { raw, offset, len })
    }

    /// Allocate and copy `data` into an aligned window.
    pub(crate) fn from_slice(data: &[T]) -> Result<Self> {
        let fill = match data.first() {
            Some(&v) => v,
            None => return Self::empty(),
        };
        let mut buf = Self::filled(data.len(), fill)?;
        buf.as_mut_slice().copy_from_slice(data);
        Ok(buf)
    }

    fn empty() -> Result<Self> {
        Ok(AlignedBuffer {
            raw: Vec::new(),
            offset: 0,
            len: 0,
        })
    }

    pub(crate) fn as_slice(&self) -> &[T] {
        &self.raw[self.offset..self.offset + self.len]
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.raw[self.offset..self.offset + self.len]
    }

    /// Deep copy with its own aligned window.
    pub(crate) fn try_clone(&self) -> Result<Self> {
        Self::from_slice(self.as_slice())
    }
}

impl<T: Element> fmt::Debug for AlignedBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}
