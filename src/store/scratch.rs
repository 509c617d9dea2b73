//! Scoped scratch buffers for the manual-buffer calling convention.
//!
//! Instead of allocating guest memory on every call, a fixed set of regions
//! is acquired once, reused for every encoded argument, and released when
//! the handle is dropped. Per-call cost is reduced to UTF-8 encoding plus
//! the raw numeric call.

use tracing::warn;

use crate::store::{GuestPtr, RawElementStore, StoreResult};

/// A fixed set of fixed-size guest buffers with deterministic release.
///
/// Region `0` carries the first string argument of each wrapped operation,
/// region `1` the second, region `2` the third. All regions are freed
/// exactly once when the handle drops; free failures are logged, not raised.
pub struct ScratchRegions<'a> {
    raw: &'a mut dyn RawElementStore,
    regions: Vec<GuestPtr>,
    capacity: usize,
}

impl<'a> ScratchRegions<'a> {
    /// Acquires `count` regions of `capacity` bytes from the guest allocator.
    ///
    /// On a partial failure every already-acquired region is released
    /// before the error is returned.
    pub fn acquire(
        raw: &'a mut dyn RawElementStore,
        count: usize,
        capacity: usize,
    ) -> StoreResult<Self> {
        let mut regions = Vec::with_capacity(count);
        for _ in 0..count {
            match raw.alloc(capacity) {
                Ok(ptr) => regions.push(ptr),
                Err(e) => {
                    for ptr in regions {
                        if let Err(free_err) = raw.free(ptr) {
                            warn!(error = %free_err, "failed to release scratch region");
                        }
                    }
                    return Err(e);
                }
            }
        }
        Ok(Self {
            raw,
            regions,
            capacity,
        })
    }

    /// Encode `value` into region `slot`, truncating oversized values.
    fn write(&mut self, slot: usize, value: &str) -> StoreResult<GuestPtr> {
        let ptr = self.regions[slot];
        self.raw.write_cstr(ptr, self.capacity, value)?;
        Ok(ptr)
    }

    pub fn add_element(&mut self, id: &str) -> StoreResult<()> {
        let id_ptr = self.write(0, id)?;
        self.raw.add_element_raw(id_ptr)
    }

    pub fn append_child(&mut self, parent_id: &str, child_id: &str) -> StoreResult<()> {
        let parent_ptr = self.write(0, parent_id)?;
        let child_ptr = self.write(1, child_id)?;
        self.raw.append_child_raw(parent_ptr, child_ptr)
    }

    pub fn first_child(&mut self, id: &str) -> StoreResult<String> {
        let id_ptr = self.write(0, id)?;
        let child_ptr = self.raw.first_child_raw(id_ptr)?;
        self.raw.read_cstr(child_ptr)
    }

    pub fn set_attr(&mut self, id: &str, key: &str, value: &str) -> StoreResult<()> {
        let id_ptr = self.write(0, id)?;
        let key_ptr = self.write(1, key)?;
        let value_ptr = self.write(2, value)?;
        self.raw.set_attr_raw(id_ptr, key_ptr, value_ptr)
    }

    pub fn element_count(&mut self) -> StoreResult<u32> {
        self.raw.element_count_raw()
    }
}

impl Drop for ScratchRegions<'_> {
    fn drop(&mut self) {
        for ptr in self.regions.drain(..) {
            if let Err(e) = self.raw.free(ptr) {
                warn!(error = %e, addr = ptr.0, "failed to release scratch region");
            }
        }
    }
}
