//! The single logical heap: freelists, live set, quarantine.
//!
//! A chunk occupies exactly one of the three collections at any time, and
//! its state field names which one. The three transitions here are the
//! only writers of `state`:
//!
//! ```text
//! AVAILABLE --allocate_chunk--> ALLOCATED --release_chunk--> QUARANTINED
//!     ^                                                          |
//!     +--------------------- trim eviction ---------------------+
//! ```

use crate::chunk::{Chunk, CHUNK_ALLOCATED, CHUNK_AVAILABLE, CHUNK_QUARANTINED};
use crate::config;
use crate::freelist::FreeLists;
use crate::quarantine::Quarantine;
use crate::util::{abort_with_message, MIN_ALLOC_SIZE, REDZONE};
use core::ptr;

/// Live-set totals, for leak enumeration at shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveStats {
    pub chunks: usize,
    pub used_bytes: usize,
}

pub struct Heap {
    free_lists: FreeLists,
    quarantine: Quarantine,
    live_head: *mut Chunk,
}

impl Heap {
    pub const fn new() -> Self {
        Heap {
            free_lists: FreeLists::new(),
            quarantine: Quarantine::new(),
            live_head: ptr::null_mut(),
        }
    }

    /// Draw a chunk of `size` bytes and move it to the live set.
    ///
    /// # Safety
    /// The shadow must be reserved; the heap lock must be held.
    pub unsafe fn allocate_chunk(&mut self, size: usize) -> *mut Chunk {
        let m = self.free_lists.draw(size);
        if (*m).allocated_size != size {
            abort_with_message("sanmalloc: freelist returned wrong class\n");
        }
        (*m).state = CHUNK_ALLOCATED;
        (*m).prev = ptr::null_mut();
        (*m).next = self.live_head;
        if !self.live_head.is_null() {
            (*self.live_head).prev = m;
        }
        self.live_head = m;
        m
    }

    /// Move an ALLOCATED chunk into quarantine, then trim the ring back
    /// under the configured cap, recycling the oldest victims to their
    /// freelists. A chunk bigger than the cap transits the ring within this
    /// call.
    ///
    /// # Safety
    /// The heap lock must be held; `m` must be in the live set.
    pub unsafe fn release_chunk(&mut self, m: *mut Chunk) {
        if (*m).state != CHUNK_ALLOCATED {
            abort_with_message("sanmalloc: releasing a chunk that is not allocated\n");
        }

        // Unlink from the live set.
        if m == self.live_head {
            self.live_head = (*m).next;
            if !self.live_head.is_null() {
                (*self.live_head).prev = ptr::null_mut();
            }
        } else {
            let prev = (*m).prev;
            let next = (*m).next;
            if !prev.is_null() {
                (*prev).next = next;
            }
            if !next.is_null() {
                (*next).prev = prev;
            }
        }

        (*m).state = CHUNK_QUARANTINED;
        self.quarantine.insert(m);

        let cap = config::quarantine_bytes();
        while self.quarantine.bytes() > cap {
            let victim = self.quarantine.pop_oldest();
            (*victim).state = CHUNK_AVAILABLE;
            self.free_lists.push(victim);
        }
    }

    pub fn quarantine_bytes(&self) -> usize {
        self.quarantine.bytes()
    }

    /// Walk the live set and total up the outstanding allocations.
    ///
    /// # Safety
    /// The heap lock must be held.
    pub unsafe fn live_stats(&self) -> LiveStats {
        let mut stats = LiveStats {
            chunks: 0,
            used_bytes: 0,
        };
        let mut m = self.live_head;
        while !m.is_null() {
            stats.chunks += 1;
            stats.used_bytes += (*m).used_size;
            m = (*m).next;
        }
        stats
    }

    /// Verify the cross-collection invariants: every chunk's state matches
    /// the collection holding it, sizes are legal classes, the quarantine
    /// counter is exact. Fatal on any violation.
    ///
    /// # Safety
    /// The heap lock must be held.
    pub unsafe fn check_integrity(&self) {
        self.free_lists.check();
        self.quarantine.check();
        let mut m = self.live_head;
        while !m.is_null() {
            if (*m).state != CHUNK_ALLOCATED {
                abort_with_message("sanmalloc: non-allocated chunk in live set\n");
            }
            if !(*m).allocated_size.is_power_of_two() || (*m).allocated_size < MIN_ALLOC_SIZE {
                abort_with_message("sanmalloc: illegal chunk size in live set\n");
            }
            if (*m).used_size > (*m).allocated_size - 2 * REDZONE {
                abort_with_message("sanmalloc: used size exceeds payload capacity\n");
            }
            if !(*m).next.is_null() && (*(*m).next).prev != m {
                abort_with_message("sanmalloc: live set links broken\n");
            }
            m = (*m).next;
        }
    }
}
