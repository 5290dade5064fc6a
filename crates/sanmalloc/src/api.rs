//! User-facing entry points, one per interposed allocator call. The
//! symbol-export layer that would redirect a C program here lives outside
//! this crate; these are the operations it would bind to.

use crate::init;
use crate::util::{abort_with_message, PAGE_SIZE};

/// `malloc(n)`.
///
/// # Safety
/// Standard allocator contract: the result must be freed exactly once.
pub unsafe fn malloc(size: usize) -> *mut u8 {
    init::ensure_initialized();
    init::allocator().allocate(0, size)
}

/// `free(p)`. Null is a no-op.
///
/// # Safety
/// `ptr` must be null or a live pointer from this allocator.
pub unsafe fn free(ptr: *mut u8) {
    init::ensure_initialized();
    init::allocator().deallocate(ptr)
}

/// `calloc(k, n)`: zero-filled allocation of `k * n` bytes.
///
/// # Safety
/// Standard allocator contract.
pub unsafe fn calloc(nmemb: usize, size: usize) -> *mut u8 {
    init::ensure_initialized();
    init::allocator().allocate_zeroed(nmemb, size)
}

/// `realloc(p, n)`.
///
/// # Safety
/// `ptr` must be null or a live pointer from this allocator; on success the
/// old pointer is dead.
pub unsafe fn realloc(ptr: *mut u8, size: usize) -> *mut u8 {
    init::ensure_initialized();
    init::allocator().reallocate(ptr, size)
}

/// `aligned_alloc(a, n)`.
///
/// # Safety
/// Standard allocator contract; `alignment` must be a power of two.
pub unsafe fn aligned_alloc(alignment: usize, size: usize) -> *mut u8 {
    init::ensure_initialized();
    init::allocator().allocate(alignment, size)
}

/// `posix_memalign(out, a, n)`. Always returns 0: an unsatisfiable
/// alignment is a structural bug and aborts inside the service, not a
/// runtime error to report.
///
/// # Safety
/// `memptr` must be a valid out-pointer; standard allocator contract.
pub unsafe fn posix_memalign(memptr: *mut *mut u8, alignment: usize, size: usize) -> libc::c_int {
    init::ensure_initialized();
    *memptr = init::allocator().allocate(alignment, size);
    0
}

/// `valloc(n)`: page-aligned allocation.
///
/// # Safety
/// Standard allocator contract.
pub unsafe fn valloc(size: usize) -> *mut u8 {
    init::ensure_initialized();
    init::allocator().allocate(PAGE_SIZE, size)
}

/// Size query. Recognized but delegated to the external fault reporter,
/// which reads the chunk header itself; reaching this is fatal.
pub fn malloc_usable_size(_ptr: *mut u8) -> usize {
    abort_with_message("sanmalloc: size query is delegated to the fault reporter\n");
}

/// Heap description for a faulting address. Recognized but delegated to
/// the external fault reporter; reaching this is fatal.
pub fn describe_heap_address(_addr: usize, _access_size: usize) -> ! {
    abort_with_message("sanmalloc: heap description is delegated to the fault reporter\n");
}
