//! Collaborator traits for prefix list synchronization
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`RangeSource`]: Fetch the upstream range dataset
//! - [`PrefixListProvider`]: Look up, delete and create managed prefix lists

pub mod prefix_list_provider;
pub mod range_source;

pub use prefix_list_provider::{
    CreatePrefixList, PrefixListHandle, PrefixListProvider, PrefixListProviderFactory,
};
pub use range_source::{RangeSource, RangeSourceFactory};
