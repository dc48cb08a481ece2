//! Record cache implementations

pub mod file;
pub mod memory;

pub use file::FileRecordCache;
pub use memory::MemoryRecordCache;
