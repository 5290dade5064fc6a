//! Page provider: the only source of heap memory.
//!
//! Mappings are anonymous, private, read-write, handed out in page
//! multiples, and owned by the allocator forever -- nothing is ever
//! unmapped. A region leaves here with its entire shadow poisoned, so any
//! access before the allocation service paints a payload clean is trapped.

use crate::platform;
use crate::shadow;
use crate::util::{abort_with_message, is_aligned, PAGE_SIZE};

/// Acquire `size` bytes of fresh zero-backed memory. Out-of-memory is
/// fatal: graceful propagation is not supported.
///
/// # Safety
/// The shadow must be reserved (init has run).
pub unsafe fn map(size: usize) -> *mut u8 {
    if size == 0 || !is_aligned(size, PAGE_SIZE) {
        abort_with_message("sanmalloc: page request not a page multiple\n");
    }
    let mem = platform::map_anonymous(size);
    if mem.is_null() {
        abort_with_message("sanmalloc: failed to mmap pages\n");
    }
    shadow::poison(mem as usize, size, shadow::SHADOW_POISON);
    mem
}
