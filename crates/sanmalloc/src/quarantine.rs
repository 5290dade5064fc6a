//! Quarantine ring.
//!
//! Freed chunks are held out of circulation on a circular doubly-linked
//! list threaded through their own headers, newest at the head. The byte
//! counter is exact: it equals the sum of `allocated_size` over all
//! members at every public-operation boundary. Holding freed chunks --
//! payload shadow still poisoned -- stretches the window in which a
//! dangling access is a deterministic trap instead of a silent reuse.

use crate::chunk::{Chunk, CHUNK_QUARANTINED};
use crate::util::abort_with_message;
use core::ptr;

pub struct Quarantine {
    /// Most recently freed member; its `prev` is the eviction victim.
    head: *mut Chunk,
    bytes: usize,
}

impl Quarantine {
    pub const fn new() -> Self {
        Quarantine {
            head: ptr::null_mut(),
            bytes: 0,
        }
    }

    pub fn bytes(&self) -> usize {
        self.bytes
    }

    /// Insert at the head of the ring. The caller has already set the state
    /// to QUARANTINED and detached the chunk from the live set.
    ///
    /// # Safety
    /// `m` must be a chunk owned by this allocator and on no other list.
    pub unsafe fn insert(&mut self, m: *mut Chunk) {
        if self.head.is_null() {
            (*m).next = m;
            (*m).prev = m;
        } else {
            let next = self.head;
            let prev = (*next).prev;
            (*m).next = next;
            (*m).prev = prev;
            (*prev).next = m;
            (*next).prev = m;
        }
        self.head = m;
        self.bytes += (*m).allocated_size;
    }

    /// Remove and return the least recently freed member.
    ///
    /// # Safety
    /// The heap lock must be held.
    pub unsafe fn pop_oldest(&mut self) -> *mut Chunk {
        if self.head.is_null() {
            abort_with_message("sanmalloc: quarantine pop on empty ring\n");
        }
        let m = (*self.head).prev;
        if (*m).state != CHUNK_QUARANTINED {
            abort_with_message("sanmalloc: non-quarantined chunk in ring\n");
        }
        let next = (*m).next;
        let prev = (*m).prev;
        if next == m {
            self.head = ptr::null_mut();
        } else {
            (*next).prev = prev;
            (*prev).next = next;
        }
        (*m).next = ptr::null_mut();
        (*m).prev = ptr::null_mut();
        if self.bytes < (*m).allocated_size {
            abort_with_message("sanmalloc: quarantine counter underflow\n");
        }
        self.bytes -= (*m).allocated_size;
        m
    }

    /// Walk the ring and verify membership invariants: every member
    /// QUARANTINED, link symmetry intact, counter equal to the member byte
    /// sum. Fatal on violation.
    ///
    /// # Safety
    /// The heap lock must be held.
    pub unsafe fn check(&self) {
        if self.head.is_null() {
            if self.bytes != 0 {
                abort_with_message("sanmalloc: quarantine counter desync\n");
            }
            return;
        }
        let mut sum = 0usize;
        let mut m = self.head;
        loop {
            if (*m).state != CHUNK_QUARANTINED {
                abort_with_message("sanmalloc: non-quarantined chunk in ring\n");
            }
            if (*(*m).next).prev != m || (*(*m).prev).next != m {
                abort_with_message("sanmalloc: quarantine ring links broken\n");
            }
            sum += (*m).allocated_size;
            m = (*m).next;
            if m == self.head {
                break;
            }
        }
        if sum != self.bytes {
            abort_with_message("sanmalloc: quarantine counter desync\n");
        }
    }
}
