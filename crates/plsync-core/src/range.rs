//! Named range blocks and allow-list filtering

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One named range from the upstream dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeBlock {
    /// Range name, e.g. `AzureCloud.northeurope`
    pub name: String,
    /// CIDR prefixes in upstream order
    pub address_prefixes: Vec<String>,
}

impl RangeBlock {
    /// Create a new range block
    pub fn new<I, S>(name: impl Into<String>, address_prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            address_prefixes: address_prefixes.into_iter().map(Into::into).collect(),
        }
    }
}

/// Select the blocks whose name is in `names`
///
/// Matching is exact and case-sensitive. Input order is kept. An empty
/// result is not an error.
pub fn filter_blocks<'a>(blocks: &'a [RangeBlock], names: &HashSet<String>) -> Vec<&'a RangeBlock> {
    blocks
        .iter()
        .filter(|block| names.contains(&block.name))
        .collect()
}
