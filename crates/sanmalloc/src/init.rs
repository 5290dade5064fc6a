use crate::allocator::SanitizingAllocator;
use crate::config;
use crate::shadow;
use core::sync::atomic::{AtomicU8, Ordering};

const UNINIT: u8 = 0;
const INITIALIZING: u8 = 1;
const READY: u8 = 2;

static INIT_STATE: AtomicU8 = AtomicU8::new(UNINIT);

static ALLOCATOR: SanitizingAllocator = SanitizingAllocator::new();

/// Reserve the shadow and read configuration, exactly once. Losers of the
/// race spin until the winner is done: handing out chunks before the
/// shadow exists would make every poison write a wild store.
///
/// # Safety
/// Callable from any thread; the first caller must not hold the heap lock.
pub unsafe fn ensure_initialized() {
    if INIT_STATE.load(Ordering::Acquire) == READY {
        return;
    }
    match INIT_STATE.compare_exchange(UNINIT, INITIALIZING, Ordering::AcqRel, Ordering::Acquire) {
        Ok(_) => {}
        Err(_) => {
            while INIT_STATE.load(Ordering::Acquire) != READY {
                core::hint::spin_loop();
            }
            return;
        }
    }

    shadow::reserve();
    config::read_config();

    INIT_STATE.store(READY, Ordering::Release);
}

#[inline(always)]
pub fn allocator() -> &'static SanitizingAllocator {
    &ALLOCATOR
}
