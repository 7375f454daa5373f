// # Prefix List Provider Trait
//
// Defines the interface for managing named prefix lists on a cloud provider.
//
// ## Implementations
//
// - AWS EC2: `plsync-provider-ec2` crate
// - In-process: [`crate::provider::MemoryPrefixListProvider`]

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::partition::{AddressFamily, Entry};

/// Reference to an existing managed prefix list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixListHandle {
    /// Provider-assigned identifier (e.g. `pl-0123456789abcdef0`)
    pub id: String,
    /// Prefix list name
    pub name: String,
}

impl PrefixListHandle {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Request to create a managed prefix list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePrefixList {
    /// Prefix list name
    pub name: String,
    /// Address family of every entry
    pub family: AddressFamily,
    /// Entries in order
    pub entries: Vec<Entry>,
    /// Capacity of the list; sized to the entries, not the partition limit
    pub max_entries: usize,
    /// Ownership tags
    pub tags: BTreeMap<String, String>,
}

impl CreatePrefixList {
    /// Build a request whose capacity equals its entry count
    pub fn sized_to_entries(
        name: impl Into<String>,
        family: AddressFamily,
        entries: Vec<Entry>,
        tags: BTreeMap<String, String>,
    ) -> Self {
        Self {
            name: name.into(),
            family,
            max_entries: entries.len(),
            entries,
            tags,
        }
    }
}

/// Trait for prefix list provider implementations
///
/// Providers are thin wrappers over the cloud API:
/// - One API call (or one paginated call) per method invocation
/// - No retry or backoff; return the error and let the caller decide
/// - No caching between calls
///
/// # Name scoping
///
/// Names are not guaranteed unique by the provider, so lookups return every
/// list carrying the name.
#[async_trait]
pub trait PrefixListProvider: Send + Sync {
    /// Find every prefix list whose name equals `name`
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<PrefixListHandle>)`: Matches (possibly empty)
    /// - `Err(Error)`: If the lookup failed
    async fn lookup_by_name(&self, name: &str) -> Result<Vec<PrefixListHandle>, crate::Error>;

    /// Delete one prefix list
    async fn delete(&self, handle: &PrefixListHandle) -> Result<(), crate::Error>;

    /// Create a prefix list
    ///
    /// # Returns
    ///
    /// - `Ok(PrefixListHandle)`: Handle of the new list
    /// - `Err(Error)`: If creation failed
    async fn create(&self, request: &CreatePrefixList) -> Result<PrefixListHandle, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing providers from configuration
#[async_trait]
pub trait PrefixListProviderFactory: Send + Sync {
    /// Create a PrefixListProvider instance from configuration
    async fn create(
        &self,
        config: &crate::config::ProviderConfig,
    ) -> Result<Box<dyn PrefixListProvider>, crate::Error>;
}
