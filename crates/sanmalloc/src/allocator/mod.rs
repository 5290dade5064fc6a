pub mod sanitizing;

pub use sanitizing::SanitizingAllocator;
