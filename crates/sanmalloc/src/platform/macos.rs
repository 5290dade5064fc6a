use core::ptr;

pub unsafe fn map_anonymous(size: usize) -> *mut u8 {
    let result = libc::mmap(
        ptr::null_mut(),
        size,
        libc::PROT_READ | libc::PROT_WRITE,
        libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
        -1,
        0,
    );
    if result == libc::MAP_FAILED {
        ptr::null_mut()
    } else {
        result as *mut u8
    }
}

/// Reserve the shadow region at exactly `addr`. macOS has no MAP_NORESERVE;
/// anonymous memory is lazily committed anyway. The kernel may relocate a
/// hinted mapping, so the caller must get back exactly `addr` -- anything
/// else is reported as failure.
///
/// # Safety
/// `addr` and `size` must be page-aligned.
pub unsafe fn reserve_shadow(addr: usize, size: usize) -> *mut u8 {
    let result = libc::mmap(
        addr as *mut libc::c_void,
        size,
        libc::PROT_READ | libc::PROT_WRITE,
        libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
        -1,
        0,
    );
    if result == libc::MAP_FAILED {
        return ptr::null_mut();
    }
    if result as usize != addr {
        libc::munmap(result, size);
        return ptr::null_mut();
    }
    result as *mut u8
}
