//! Built-in range source implementations

pub mod file;

pub use file::FileRangeSource;
