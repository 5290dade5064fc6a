//! Size-class freelists.
//!
//! One singly-linked list of AVAILABLE chunks per power-of-two class,
//! indexed by log2 of the chunk size. A miss refills the class in bulk from
//! the page provider; a class larger than MIN_MMAP_SIZE gets a dedicated
//! mapping carved into a single chunk.

use crate::chunk::{Chunk, CHUNK_AVAILABLE};
use crate::pages;
use crate::util::{abort_with_message, log2, MIN_ALLOC_SIZE, MIN_MMAP_SIZE};
use core::ptr;

const NUM_CLASSES: usize = usize::BITS as usize;

pub struct FreeLists {
    heads: [*mut Chunk; NUM_CLASSES],
}

impl FreeLists {
    pub const fn new() -> Self {
        FreeLists {
            heads: [ptr::null_mut(); NUM_CLASSES],
        }
    }

    /// Pop an AVAILABLE chunk of exactly `size` bytes, refilling the class
    /// from the page provider on miss. O(1) apart from the refill.
    ///
    /// # Safety
    /// The shadow must be reserved; `size` must be a legal chunk size.
    pub unsafe fn draw(&mut self, size: usize) -> *mut Chunk {
        if !size.is_power_of_two() || size < MIN_ALLOC_SIZE {
            abort_with_message("sanmalloc: bad freelist class\n");
        }
        let idx = log2(size);
        if self.heads[idx].is_null() {
            self.refill(size, idx);
        }
        let m = self.heads[idx];
        if m.is_null() {
            abort_with_message("sanmalloc: freelist refill produced no chunks\n");
        }
        self.heads[idx] = (*m).next;
        (*m).next = ptr::null_mut();
        (*m).prev = ptr::null_mut();
        if (*m).state != CHUNK_AVAILABLE {
            abort_with_message("sanmalloc: corrupt chunk on freelist\n");
        }
        m
    }

    /// Map a fresh region and carve it into chunks of this class.
    unsafe fn refill(&mut self, size: usize, idx: usize) {
        let mmap_size = size.max(MIN_MMAP_SIZE);
        let mem = pages::map(mmap_size);
        for i in 0..mmap_size / size {
            let m = mem.add(i * size) as *mut Chunk;
            (*m).state = CHUNK_AVAILABLE;
            (*m).allocated_size = size;
            (*m).used_size = 0;
            (*m).prev = ptr::null_mut();
            (*m).next = self.heads[idx];
            self.heads[idx] = m;
        }
    }

    /// Return an evicted chunk to its class. The caller has already set the
    /// state back to AVAILABLE.
    ///
    /// # Safety
    /// `m` must be a chunk owned by this allocator and on no other list.
    pub unsafe fn push(&mut self, m: *mut Chunk) {
        let idx = log2((*m).allocated_size);
        (*m).prev = ptr::null_mut();
        (*m).next = self.heads[idx];
        self.heads[idx] = m;
    }

    /// Walk every list and verify per-chunk invariants: state AVAILABLE and
    /// allocated_size matching the class index. Fatal on violation.
    ///
    /// # Safety
    /// The heap lock must be held.
    pub unsafe fn check(&self) {
        for (idx, &head) in self.heads.iter().enumerate() {
            let mut m = head;
            while !m.is_null() {
                if (*m).state != CHUNK_AVAILABLE {
                    abort_with_message("sanmalloc: non-available chunk on freelist\n");
                }
                if (*m).allocated_size != 1 << idx {
                    abort_with_message("sanmalloc: chunk in wrong size class\n");
                }
                m = (*m).next;
            }
        }
    }
}
