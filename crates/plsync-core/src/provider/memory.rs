// # Memory Prefix List Provider
//
// In-process implementation of PrefixListProvider.
//
// ## Purpose
//
// Behaves like a provider account holding managed prefix lists, without any
// network access. Useful for tests, local runs, and previewing which lists a
// run would produce.
//
// ## Behavior
//
// - Names are not unique: several lists may share a name, as on EC2
// - Ids are generated as `pl-` followed by 17 hex digits
// - Lookups, deletes and creates can be made to fail per name for testing
// - Every call is recorded in order

use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

use crate::Error;
use crate::config::ProviderConfig;
use crate::partition::{AddressFamily, Entry};
use crate::traits::prefix_list_provider::{
    CreatePrefixList, PrefixListHandle, PrefixListProvider, PrefixListProviderFactory,
};

/// A managed prefix list as held by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedPrefixList {
    pub id: String,
    pub name: String,
    pub family: AddressFamily,
    pub entries: Vec<Entry>,
    pub max_entries: usize,
    pub tags: BTreeMap<String, String>,
}

/// One recorded provider call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    /// `lookup_by_name(name)`
    Lookup(String),
    /// `delete(handle)` by id
    Delete(String),
    /// `create(request)` by name
    Create(String),
}

#[derive(Debug, Default)]
struct MemoryState {
    /// Lists keyed by id; ids are zero-padded counters, so iteration follows creation order
    lists: BTreeMap<String, ManagedPrefixList>,
    calls: Vec<ProviderCall>,
    fail_lookup: HashSet<String>,
    fail_delete: HashSet<String>,
    fail_create: HashSet<String>,
}

/// In-memory prefix list provider
///
/// Cloning shares the underlying store, so a test can keep one handle for
/// inspection and give another to the engine.
///
/// # Example
///
/// ```rust,no_run
/// use plsync_core::provider::MemoryPrefixListProvider;
/// use plsync_core::traits::{CreatePrefixList, PrefixListProvider};
/// use plsync_core::partition::{AddressFamily, Entry};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let provider = MemoryPrefixListProvider::new();
///     let request = CreatePrefixList::sized_to_entries(
///         "azure-azuredevops-pl-ipv4-1",
///         AddressFamily::IPv4,
///         vec![Entry::from_prefix("20.37.158.0/23")],
///         Default::default(),
///     );
///     provider.create(&request).await?;
///     assert_eq!(provider.lookup_by_name("azure-azuredevops-pl-ipv4-1").await?.len(), 1);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryPrefixListProvider {
    inner: Arc<RwLock<MemoryState>>,
    next_id: Arc<AtomicU64>,
}

impl MemoryPrefixListProvider {
    /// Create a new empty provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Make lookups of `name` fail
    pub async fn fail_lookup_for(&self, name: impl Into<String>) {
        self.inner.write().await.fail_lookup.insert(name.into());
    }

    /// Make deletes of lists named `name` fail
    pub async fn fail_delete_for(&self, name: impl Into<String>) {
        self.inner.write().await.fail_delete.insert(name.into());
    }

    /// Make creates of `name` fail
    pub async fn fail_create_for(&self, name: impl Into<String>) {
        self.inner.write().await.fail_create.insert(name.into());
    }

    /// Remove every injected failure
    pub async fn clear_failures(&self) {
        let mut state = self.inner.write().await;
        state.fail_lookup.clear();
        state.fail_delete.clear();
        state.fail_create.clear();
    }

    /// Insert a list directly, bypassing the call log (test setup)
    pub async fn seed(
        &self,
        name: impl Into<String>,
        family: AddressFamily,
        entries: Vec<Entry>,
    ) -> PrefixListHandle {
        let id = self.generate_id();
        let name = name.into();
        let list = ManagedPrefixList {
            id: id.clone(),
            name: name.clone(),
            family,
            max_entries: entries.len(),
            entries,
            tags: BTreeMap::new(),
        };
        self.inner.write().await.lists.insert(id.clone(), list);
        PrefixListHandle::new(id, name)
    }

    /// All lists currently held
    pub async fn lists(&self) -> Vec<ManagedPrefixList> {
        self.inner.read().await.lists.values().cloned().collect()
    }

    /// Lists with the given name
    pub async fn lists_named(&self, name: &str) -> Vec<ManagedPrefixList> {
        self.inner
            .read()
            .await
            .lists
            .values()
            .filter(|list| list.name == name)
            .cloned()
            .collect()
    }

    /// Number of lists currently held
    pub async fn len(&self) -> usize {
        self.inner.read().await.lists.len()
    }

    /// Check if the provider holds no lists
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.lists.is_empty()
    }

    /// Calls made so far, in order
    pub async fn calls(&self) -> Vec<ProviderCall> {
        self.inner.read().await.calls.clone()
    }

    fn generate_id(&self) -> String {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        format!("pl-{:017x}", n)
    }
}

#[async_trait]
impl PrefixListProvider for MemoryPrefixListProvider {
    async fn lookup_by_name(&self, name: &str) -> Result<Vec<PrefixListHandle>, Error> {
        let mut state = self.inner.write().await;
        state.calls.push(ProviderCall::Lookup(name.to_string()));

        if state.fail_lookup.contains(name) {
            return Err(Error::provider("memory", format!("Lookup of {} failed", name)));
        }

        Ok(state
            .lists
            .values()
            .filter(|list| list.name == name)
            .map(|list| PrefixListHandle::new(list.id.clone(), list.name.clone()))
            .collect())
    }

    async fn delete(&self, handle: &PrefixListHandle) -> Result<(), Error> {
        let mut state = self.inner.write().await;
        state.calls.push(ProviderCall::Delete(handle.id.clone()));

        if state.fail_delete.contains(&handle.name) {
            return Err(Error::provider("memory", format!("Delete of {} failed", handle.id)));
        }

        state
            .lists
            .remove(&handle.id)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(format!("Prefix list {} does not exist", handle.id)))
    }

    async fn create(&self, request: &CreatePrefixList) -> Result<PrefixListHandle, Error> {
        if request.entries.len() > request.max_entries {
            return Err(Error::invalid_input(format!(
                "{} entries exceed max_entries {}",
                request.entries.len(),
                request.max_entries
            )));
        }

        let id = self.generate_id();
        let mut state = self.inner.write().await;
        state.calls.push(ProviderCall::Create(request.name.clone()));

        if state.fail_create.contains(&request.name) {
            return Err(Error::provider("memory", format!("Create of {} failed", request.name)));
        }

        state.lists.insert(
            id.clone(),
            ManagedPrefixList {
                id: id.clone(),
                name: request.name.clone(),
                family: request.family,
                entries: request.entries.clone(),
                max_entries: request.max_entries,
                tags: request.tags.clone(),
            },
        );

        Ok(PrefixListHandle::new(id, request.name.clone()))
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}

/// Factory for creating in-memory providers
///
/// Every call returns a fresh, empty provider.
pub struct MemoryProviderFactory;

#[async_trait]
impl PrefixListProviderFactory for MemoryProviderFactory {
    async fn create(&self, config: &ProviderConfig) -> Result<Box<dyn PrefixListProvider>, Error> {
        match config {
            ProviderConfig::Memory => {
                tracing::warn!("Using in-memory prefix list provider - no cloud resources will change");
                Ok(Box::new(MemoryPrefixListProvider::new()))
            }
            _ => Err(Error::config("Invalid config for memory provider")),
        }
    }
}
