//! Built-in prefix list provider implementations
//!
//! This module provides implementations of the PrefixListProvider trait
//! that live in the core crate.

pub mod memory;

pub use memory::{ManagedPrefixList, MemoryPrefixListProvider, ProviderCall};
