//! Plugin-based collaborator registry
//!
//! The registry allows range sources and prefix list providers to be
//! registered dynamically at runtime, avoiding hardcoded if-else chains.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use plsync_core::Registry;
//! use plsync_core::config::ProviderConfig;
//!
//! let registry = Registry::new();
//! plsync_core::registry::register_builtin(&registry);
//! plsync_provider_ec2::register(&registry);
//!
//! let provider = registry.create_provider(&ProviderConfig::Memory).await?;
//! ```
//!
//! ## Registration
//!
//! Implementation crates expose a `register` function:
//!
//! ```rust,ignore
//! pub fn register(registry: &Registry) {
//!     registry.register_provider("ec2", Box::new(Ec2Factory));
//! }
//! ```

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::config::{ProviderConfig, SourceConfig};
use crate::error::{Error, Result};
use crate::provider::memory::MemoryProviderFactory;
use crate::source::file::FileSourceFactory;
use crate::traits::{PrefixListProvider, PrefixListProviderFactory, RangeSource, RangeSourceFactory};

/// Registry for plugin-based collaborator creation
///
/// Maps type names to factory objects, allowing dynamic instantiation based
/// on configuration.
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes. Locks are never held across an await.
#[derive(Default)]
pub struct Registry {
    /// Registered range source factories
    sources: RwLock<HashMap<String, Arc<dyn RangeSourceFactory>>>,

    /// Registered prefix list provider factories
    providers: RwLock<HashMap<String, Arc<dyn PrefixListProviderFactory>>>,
}

impl Registry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a range source factory
    ///
    /// # Parameters
    ///
    /// - `name`: Source type name (e.g., "azure", "file")
    /// - `factory`: Factory object for creating source instances
    pub fn register_source(&self, name: impl Into<String>, factory: Box<dyn RangeSourceFactory>) {
        let mut sources = self.sources.write().unwrap_or_else(PoisonError::into_inner);
        sources.insert(name.into(), Arc::from(factory));
    }

    /// Register a prefix list provider factory
    ///
    /// # Parameters
    ///
    /// - `name`: Provider type name (e.g., "ec2", "memory")
    /// - `factory`: Factory object for creating provider instances
    pub fn register_provider(
        &self,
        name: impl Into<String>,
        factory: Box<dyn PrefixListProviderFactory>,
    ) {
        let mut providers = self.providers.write().unwrap_or_else(PoisonError::into_inner);
        providers.insert(name.into(), Arc::from(factory));
    }

    /// Create a range source from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn RangeSource>)`: Created source instance
    /// - `Err(Error)`: If source type is not registered or creation fails
    pub async fn create_source(&self, config: &SourceConfig) -> Result<Box<dyn RangeSource>> {
        config.validate()?;
        let source_type = config.type_name();

        let factory = {
            let sources = self.sources.read().unwrap_or_else(PoisonError::into_inner);
            sources
                .get(source_type)
                .cloned()
                .ok_or_else(|| Error::config(format!("Unknown source type: {}", source_type)))?
        };

        factory.create(config).await
    }

    /// Create a prefix list provider from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn PrefixListProvider>)`: Created provider instance
    /// - `Err(Error)`: If provider type is not registered or creation fails
    pub async fn create_provider(
        &self,
        config: &ProviderConfig,
    ) -> Result<Box<dyn PrefixListProvider>> {
        config.validate()?;
        let provider_type = config.type_name();

        let factory = {
            let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);
            providers
                .get(provider_type)
                .cloned()
                .ok_or_else(|| Error::config(format!("Unknown provider type: {}", provider_type)))?
        };

        factory.create(config).await
    }

    /// List all registered source types
    pub fn list_sources(&self) -> Vec<String> {
        let sources = self.sources.read().unwrap_or_else(PoisonError::into_inner);
        sources.keys().cloned().collect()
    }

    /// List all registered provider types
    pub fn list_providers(&self) -> Vec<String> {
        let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);
        providers.keys().cloned().collect()
    }

    /// Check if a source type is registered
    pub fn has_source(&self, name: &str) -> bool {
        let sources = self.sources.read().unwrap_or_else(PoisonError::into_inner);
        sources.contains_key(name)
    }

    /// Check if a provider type is registered
    pub fn has_provider(&self, name: &str) -> bool {
        let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);
        providers.contains_key(name)
    }
}

/// Register the collaborators shipped with the core crate
///
/// - `file` range source
/// - `memory` prefix list provider
pub fn register_builtin(registry: &Registry) {
    registry.register_source("file", Box::new(FileSourceFactory));
    registry.register_provider("memory", Box::new(MemoryProviderFactory));
}
