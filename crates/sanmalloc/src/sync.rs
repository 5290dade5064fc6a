use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicI32, Ordering};

// The heap sits behind a single lock, and the allocator must never allocate
// while holding it. std::sync::Mutex may allocate on some platforms, so the
// lock is built directly on futex (Linux) with a spin fallback elsewhere.

const UNLOCKED: i32 = 0;
const LOCKED: i32 = 1;
const CONTENDED: i32 = 2;

pub struct RawMutex {
    state: AtomicI32,
}

unsafe impl Send for RawMutex {}
unsafe impl Sync for RawMutex {}

impl RawMutex {
    pub const fn new() -> Self {
        Self {
            state: AtomicI32::new(UNLOCKED),
        }
    }

    #[inline]
    pub fn lock(&self) {
        if self
            .state
            .compare_exchange(UNLOCKED, LOCKED, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            self.lock_contended();
        }
    }

    #[cold]
    fn lock_contended(&self) {
        // Once any waiter exists, the state stays CONTENDED until a full
        // handoff, so unlock knows whether a wake is needed.
        while self.state.swap(CONTENDED, Ordering::Acquire) != UNLOCKED {
            self.futex_wait();
        }
    }

    #[inline]
    pub fn unlock(&self) {
        if self.state.swap(UNLOCKED, Ordering::Release) == CONTENDED {
            self.futex_wake_one();
        }
    }

    #[cfg(target_os = "linux")]
    fn futex_wait(&self) {
        unsafe {
            libc::syscall(
                libc::SYS_futex,
                &self.state as *const AtomicI32,
                libc::FUTEX_WAIT | libc::FUTEX_PRIVATE_FLAG,
                CONTENDED,
                core::ptr::null::<libc::timespec>(),
            );
        }
    }

    #[cfg(not(target_os = "linux"))]
    fn futex_wait(&self) {
        core::hint::spin_loop();
    }

    #[cfg(target_os = "linux")]
    #[cold]
    fn futex_wake_one(&self) {
        unsafe {
            libc::syscall(
                libc::SYS_futex,
                &self.state as *const AtomicI32,
                libc::FUTEX_WAKE | libc::FUTEX_PRIVATE_FLAG,
                1i32,
            );
        }
    }

    #[cfg(not(target_os = "linux"))]
    fn futex_wake_one(&self) {}
}

/// A mutex that wraps data, similar to std::sync::Mutex but allocation-free
/// and without poisoning.
pub struct Mutex<T> {
    raw: RawMutex,
    data: UnsafeCell<T>,
}

unsafe impl<T: Send> Send for Mutex<T> {}
unsafe impl<T: Send> Sync for Mutex<T> {}

impl<T> Mutex<T> {
    pub const fn new(data: T) -> Self {
        Self {
            raw: RawMutex::new(),
            data: UnsafeCell::new(data),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, T> {
        self.raw.lock();
        MutexGuard { mutex: self }
    }
}

pub struct MutexGuard<'a, T> {
    mutex: &'a Mutex<T>,
}

impl<T> core::ops::Deref for MutexGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        unsafe { &*self.mutex.data.get() }
    }
}

impl<T> core::ops::DerefMut for MutexGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.mutex.data.get() }
    }
}

impl<T> Drop for MutexGuard<'_, T> {
    fn drop(&mut self) {
        self.mutex.raw.unlock();
    }
}
