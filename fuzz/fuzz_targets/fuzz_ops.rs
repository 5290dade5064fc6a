#![no_main]

use libfuzzer_sys::fuzz_target;

/// Fuzz target that interprets a byte slice as a sequence of allocator
/// operations.
///
/// Each operation is encoded as:
///   byte 0: opcode (0=allocate, 1=deallocate, 2=reallocate, 3=calloc)
///   byte 1-2: size (little-endian u16)
///   byte 3: slot index (which tracked pointer to operate on)
///
/// We track up to 64 live pointers. A double free is fatal by design here,
/// so a slot is nulled out the moment its pointer dies.
const MAX_SLOTS: usize = 64;

fuzz_target!(|data: &[u8]| {
    unsafe {
        sanmalloc::init::ensure_initialized();
    }
    let a = sanmalloc::init::allocator();

    let mut slots: [*mut u8; MAX_SLOTS] = [std::ptr::null_mut(); MAX_SLOTS];
    let mut sizes: [usize; MAX_SLOTS] = [0; MAX_SLOTS];

    let mut i = 0;
    while i + 4 <= data.len() {
        let opcode = data[i] & 0x03;
        let size = u16::from_le_bytes([data[i + 1], data[i + 2]]) as usize;
        let slot = (data[i + 3] as usize) % MAX_SLOTS;
        i += 4;

        match opcode {
            0 => {
                // allocate
                unsafe {
                    if !slots[slot].is_null() {
                        a.deallocate(slots[slot]);
                    }
                    let ptr = a.allocate(0, size);
                    assert_eq!(ptr.is_null(), size == 0);
                    if !ptr.is_null() {
                        std::ptr::write_bytes(ptr, 0xAA, size.min(256));
                    }
                    slots[slot] = ptr;
                    sizes[slot] = size;
                }
            }
            1 => {
                // deallocate
                unsafe {
                    a.deallocate(slots[slot]);
                }
                slots[slot] = std::ptr::null_mut();
                sizes[slot] = 0;
            }
            2 => {
                // reallocate
                unsafe {
                    let old_size = sizes[slot];
                    let had_ptr = !slots[slot].is_null();
                    let ptr = a.reallocate(slots[slot], size);
                    assert_eq!(ptr.is_null(), size == 0);
                    if !ptr.is_null() && had_ptr {
                        // The preserved prefix must carry the write pattern.
                        for off in 0..old_size.min(size).min(256) {
                            assert_eq!(ptr.add(off).read(), 0xAA);
                        }
                    }
                    if !ptr.is_null() {
                        std::ptr::write_bytes(ptr, 0xAA, size.min(256));
                    }
                    slots[slot] = ptr;
                    sizes[slot] = size;
                }
            }
            3 => {
                // calloc
                unsafe {
                    if !slots[slot].is_null() {
                        a.deallocate(slots[slot]);
                    }
                    let ptr = a.allocate_zeroed(1, size);
                    assert_eq!(ptr.is_null(), size == 0);
                    if !ptr.is_null() {
                        for off in 0..size.min(256) {
                            assert_eq!(ptr.add(off).read(), 0, "calloc not zeroed at {}", off);
                        }
                        std::ptr::write_bytes(ptr, 0xAA, size.min(256));
                    }
                    slots[slot] = ptr;
                    sizes[slot] = size;
                }
            }
            _ => unreachable!(),
        }
    }

    // Clean up remaining live pointers and verify the heap survived.
    for slot in slots {
        unsafe {
            a.deallocate(slot);
        }
    }
    a.check_integrity();
});
