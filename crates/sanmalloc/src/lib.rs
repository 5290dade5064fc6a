extern crate libc;

#[cfg(not(target_pointer_width = "64"))]
compile_error!("sanmalloc needs a 64-bit address space for the fixed shadow transform");

pub mod allocator;
pub mod api;
pub mod chunk;
pub mod config;
pub mod freelist;
pub mod heap;
pub mod init;
pub mod pages;
pub mod platform;
pub mod quarantine;
pub mod shadow;
pub mod sync;
pub mod util;
