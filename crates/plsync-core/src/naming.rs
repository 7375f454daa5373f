//! Prefix list name derivation
//!
//! Names are the only link between runs: the reconciler finds last run's
//! lists by name, so the derivation must stay stable.

use crate::partition::AddressFamily;

/// Leading token of every managed prefix list name
pub const NAME_PREFIX: &str = "azure";

/// Normalize a range name for use inside a prefix list name
///
/// Dots become hyphens and the result is lowercased.
pub fn tidy_range_name(range_name: &str) -> String {
    range_name.replace('.', "-").to_lowercase()
}

/// Derive the prefix list name for one chunk
///
/// `azure-<tidy range name>-pl-<ipv4|ipv6>-<index>`, with `index` being the
/// 1-based chunk position within its (range, family) group.
pub fn derive_name(range_name: &str, family: AddressFamily, index: usize) -> String {
    format!(
        "{}-{}-pl-{}-{}",
        NAME_PREFIX,
        tidy_range_name(range_name),
        family.token(),
        index
    )
}
