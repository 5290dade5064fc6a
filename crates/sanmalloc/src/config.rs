use crate::util::DEFAULT_QUARANTINE_BYTES;
use core::sync::atomic::{AtomicUsize, Ordering};

/// Quarantine cap in bytes, cached here so the free path never touches the
/// environment. The trim loop reads it on every free, so retuning takes
/// effect immediately.
static QUARANTINE_BYTES: AtomicUsize = AtomicUsize::new(DEFAULT_QUARANTINE_BYTES);

/// Read configuration from environment variables.
/// Must be called during init, before any allocations.
///
/// # Safety
/// Calls libc::getenv which is not thread-safe, so must be called from the
/// single-threaded init path.
pub unsafe fn read_config() {
    if let Some(val) = getenv_usize(b"SANMALLOC_QUARANTINE_SIZE\0") {
        QUARANTINE_BYTES.store(val, Ordering::Relaxed);
    }
}

pub fn quarantine_bytes() -> usize {
    QUARANTINE_BYTES.load(Ordering::Relaxed)
}

/// Retune the quarantine cap at runtime. A cap of zero disables deferral:
/// freed chunks transit the quarantine and return to their freelist within
/// the same free call.
pub fn set_quarantine_bytes(bytes: usize) {
    QUARANTINE_BYTES.store(bytes, Ordering::Relaxed);
}

/// Parse an environment variable as a usize.
///
/// # Safety
/// Calls libc::getenv.
unsafe fn getenv_usize(key: &[u8]) -> Option<usize> {
    let val = libc::getenv(key.as_ptr() as *const libc::c_char);
    if val.is_null() {
        return None;
    }

    // Parse manually (no std allocation)
    let mut result: usize = 0;
    let mut ptr = val as *const u8;
    loop {
        let byte = *ptr;
        if byte == 0 {
            break;
        }
        if !byte.is_ascii_digit() {
            return None; // Invalid
        }
        result = result.checked_mul(10)?.checked_add((byte - b'0') as usize)?;
        ptr = ptr.add(1);
    }
    Some(result)
}
