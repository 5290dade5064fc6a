#![no_main]

use libfuzzer_sys::fuzz_target;

// Fuzz target that exercises size and alignment boundaries.
// Interprets input as a series of (size, alignment_shift) pairs, allocates
// memory of that size and alignment, writes to the full extent, verifies
// the alignment guarantee and the shadow state, and frees.

fuzz_target!(|data: &[u8]| {
    unsafe {
        sanmalloc::init::ensure_initialized();
    }
    let a = sanmalloc::init::allocator();

    let mut i = 0;
    while i + 4 <= data.len() {
        let raw_size = u16::from_le_bytes([data[i], data[i + 1]]) as usize;
        let align_shift = (data[i + 2] % 17) as u32; // up to 64 KiB alignment
        i += 4;

        // Cap size to keep the quarantined backlog bounded.
        let size = raw_size % (128 * 1024);
        let align = 1usize << align_shift;

        let ptr = unsafe { a.allocate(align, size) };
        if size == 0 {
            // Zero size returns null and performs no work.
            assert!(ptr.is_null());
            continue;
        }
        assert!(!ptr.is_null());

        // The pointer honors the stronger of the request and the redzone
        // minimum.
        let effective = align.max(sanmalloc::util::REDZONE);
        assert_eq!(
            (ptr as usize) % effective,
            0,
            "allocate({}, {}) returned unaligned pointer {:p}",
            align,
            size,
            ptr
        );

        // The payload shadow is open; the leading guard is not.
        unsafe {
            assert!(sanmalloc::shadow::region_clean(ptr as usize, size));
            assert!(sanmalloc::shadow::region_poisoned(
                ptr as usize - sanmalloc::util::REDZONE,
                sanmalloc::util::REDZONE,
            ));
        }

        // Write to full extent and read back.
        unsafe {
            std::ptr::write_bytes(ptr, 0xBB, size);
        }
        for j in (0..size).step_by(97) {
            assert_eq!(unsafe { *ptr.add(j) }, 0xBB);
        }

        unsafe {
            a.deallocate(ptr);
            assert!(sanmalloc::shadow::region_poisoned(
                ptr as usize,
                sanmalloc::util::round_up_to_redzone(size),
            ));
        }
    }
    a.check_integrity();
});
