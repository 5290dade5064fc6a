use crate::chunk::{self, Chunk};
use crate::heap::{Heap, LiveStats};
use crate::shadow;
use crate::sync::Mutex;
use crate::util::{
    abort_with_message, clear_words, copy_words, is_aligned, round_up_to_redzone, REDZONE,
    WORD_SIZE,
};
use core::ptr;

/// The sanitizing allocator: wraps every payload in poisoned redzones,
/// routes frees through the quarantine, and keeps the shadow map in step
/// with every ownership transition.
///
/// All heap state sits behind one lock; every public operation takes it
/// once, so shadow writes are never observable ahead of the logical state
/// change.
pub struct SanitizingAllocator {
    heap: Mutex<Heap>,
}

unsafe impl Send for SanitizingAllocator {}
unsafe impl Sync for SanitizingAllocator {}

impl SanitizingAllocator {
    pub const fn new() -> Self {
        SanitizingAllocator {
            heap: Mutex::new(Heap::new()),
        }
    }

    /// Allocate `size` bytes aligned to `alignment` (0 means no constraint;
    /// the result is always at least REDZONE-aligned). Zero size returns
    /// null and performs no work.
    ///
    /// # Safety
    /// Init must have run (shadow reserved).
    pub unsafe fn allocate(&self, alignment: usize, size: usize) -> *mut u8 {
        if size == 0 {
            return ptr::null_mut();
        }
        if alignment != 0 && !alignment.is_power_of_two() {
            abort_with_message("sanmalloc: alignment must be a power of two\n");
        }
        let mut heap = self.heap.lock();
        self.allocate_locked(&mut heap, alignment, size)
    }

    unsafe fn allocate_locked(&self, heap: &mut Heap, alignment: usize, size: usize) -> *mut u8 {
        let plan = chunk::plan_size(alignment, size);
        let m = heap.allocate_chunk(plan.allocated_size);
        (*m).used_size = size;

        let mut addr = Chunk::user_base(m);
        if alignment > REDZONE && !is_aligned(addr, alignment) {
            addr = chunk::install_shim(addr, alignment, m);
        }

        // The redzones keep the poison they were constructed with (or
        // regained on the previous free); only the payload is opened up.
        shadow::poison(addr, plan.rounded_size, shadow::SHADOW_CLEAN);
        addr as *mut u8
    }

    /// Free a pointer previously returned by this allocator. Null is a
    /// no-op. Anything else that does not resolve to an ALLOCATED chunk --
    /// a second free, an interior pointer, a foreign address -- is fatal.
    ///
    /// # Safety
    /// `ptr` must be null or a value returned by this allocator.
    pub unsafe fn deallocate(&self, ptr: *mut u8) {
        if ptr.is_null() {
            return;
        }
        let mut heap = self.heap.lock();
        self.deallocate_locked(&mut heap, ptr);
    }

    unsafe fn deallocate_locked(&self, heap: &mut Heap, ptr: *mut u8) {
        let m = chunk::resolve(ptr);
        if !(*m).is_allocated() {
            abort_with_message("sanmalloc: double free or invalid free\n");
        }
        // The whole former payload becomes a trap region before the chunk
        // can move on to the quarantine.
        let rounded = round_up_to_redzone((*m).used_size);
        shadow::poison(ptr as usize, rounded, shadow::SHADOW_POISON);
        heap.release_chunk(m);
    }

    /// Resize an allocation. Null grows from nothing; zero shrinks to
    /// nothing (the old pointer is freed and null comes back).
    ///
    /// # Safety
    /// `ptr` must be null or a value returned by this allocator.
    pub unsafe fn reallocate(&self, ptr: *mut u8, new_size: usize) -> *mut u8 {
        if ptr.is_null() {
            return self.allocate(0, new_size);
        }
        if new_size == 0 {
            self.deallocate(ptr);
            return ptr::null_mut();
        }

        let mut heap = self.heap.lock();
        let m = chunk::resolve(ptr);
        if !(*m).is_allocated() {
            abort_with_message("sanmalloc: reallocating an invalid pointer\n");
        }
        let copy_size = (*m).used_size.min(new_size);
        let new_ptr = self.allocate_locked(&mut heap, 0, new_size);
        // Word-granularity copy. The read may run up to WORD_SIZE - 1 bytes
        // past copy_size; those bytes never leave the old chunk (at worst
        // its trailing redzone), so they are poisoned at most in shadow,
        // not unmapped.
        copy_words(
            new_ptr as *mut usize,
            ptr as *const usize,
            (copy_size + WORD_SIZE - 1) / WORD_SIZE,
        );
        self.deallocate_locked(&mut heap, ptr);
        new_ptr
    }

    /// Allocate `nmemb * size` zero-filled bytes. Overflow of the product
    /// returns null.
    ///
    /// # Safety
    /// Init must have run (shadow reserved).
    pub unsafe fn allocate_zeroed(&self, nmemb: usize, size: usize) -> *mut u8 {
        let total = match nmemb.checked_mul(size) {
            Some(t) => t,
            None => return ptr::null_mut(),
        };
        let p = self.allocate(0, total);
        if !p.is_null() {
            clear_words(p as *mut usize, (total + WORD_SIZE - 1) / WORD_SIZE);
        }
        p
    }

    /// Current quarantine occupancy in bytes.
    pub fn quarantine_bytes(&self) -> usize {
        self.heap.lock().quarantine_bytes()
    }

    /// Outstanding allocations, for leak enumeration at shutdown.
    pub fn live_stats(&self) -> LiveStats {
        let heap = self.heap.lock();
        unsafe { heap.live_stats() }
    }

    /// Verify every cross-collection heap invariant; fatal on corruption.
    pub fn check_integrity(&self) {
        let heap = self.heap.lock();
        unsafe { heap.check_integrity() }
    }
}

impl Default for SanitizingAllocator {
    fn default() -> Self {
        Self::new()
    }
}
