//! Configuration types for prefix list synchronization
//!
//! This module defines all configuration structures used throughout the crate.
//! Configuration is built once at the entry point and handed to the engine
//! and collaborators by value or reference; nothing here is global.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::num::NonZeroUsize;

/// Default maximum entries per prefix list
pub const DEFAULT_MAX_ENTRIES: usize = 50;

/// Tag key marking prefix lists owned by this system
pub const OWNER_TAG_KEY: &str = "CreatedBy";

/// Tag value marking prefix lists owned by this system
pub const OWNER_TAG_VALUE: &str = "AwsAzurePrefixListMaker";

/// Synchronization settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Upstream range names to include (exact, case-sensitive)
    pub range_names: Vec<String>,

    /// Maximum entries per prefix list partition
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Tags attached to every created prefix list
    #[serde(default = "default_tags")]
    pub tags: BTreeMap<String, String>,

    /// Capacity of the engine event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl SyncConfig {
    /// Create a configuration for the given range names with defaults
    pub fn new<I, S>(range_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            range_names: range_names.into_iter().map(Into::into).collect(),
            max_entries: default_max_entries(),
            tags: default_tags(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }

    /// Set the maximum entries per partition
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Add or replace a tag
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Validate the configuration
    ///
    /// Non-positive partition sizes are rejected, never clamped.
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.max_entries == 0 {
            return Err(crate::Error::config("max_entries must be at least 1"));
        }

        if self.range_names.is_empty() {
            return Err(crate::Error::config("No range names configured"));
        }

        if let Some(blank) = self.range_names.iter().find(|n| n.trim().is_empty()) {
            return Err(crate::Error::config(format!(
                "Range names cannot be empty (got {:?})",
                blank
            )));
        }

        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("event_channel_capacity must be > 0"));
        }

        Ok(())
    }

    /// Partition size as a non-zero value
    pub fn max_entries(&self) -> Result<NonZeroUsize, crate::Error> {
        NonZeroUsize::new(self.max_entries)
            .ok_or_else(|| crate::Error::config("max_entries must be at least 1"))
    }

    /// Range names as a set (duplicates collapse)
    pub fn range_name_set(&self) -> HashSet<String> {
        self.range_names.iter().cloned().collect()
    }
}

fn default_max_entries() -> usize {
    DEFAULT_MAX_ENTRIES
}

fn default_tags() -> BTreeMap<String, String> {
    BTreeMap::from([(OWNER_TAG_KEY.to_string(), OWNER_TAG_VALUE.to_string())])
}

fn default_event_channel_capacity() -> usize {
    1000
}

/// Upstream range source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceConfig {
    /// Azure download page (or direct JSON URL)
    Azure {
        /// Download page URL
        url: String,
    },

    /// Local Service Tags JSON file
    File {
        /// Path to the document
        path: String,
    },

    /// Custom range source
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl SourceConfig {
    /// Validate the source configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            SourceConfig::Azure { url } => {
                if url.is_empty() {
                    return Err(crate::Error::config("Azure range URL cannot be empty"));
                }
                Ok(())
            }
            SourceConfig::File { path } => {
                if path.is_empty() {
                    return Err(crate::Error::config("Range file path cannot be empty"));
                }
                Ok(())
            }
            SourceConfig::Custom { factory, .. } => {
                if factory.is_empty() {
                    return Err(crate::Error::config("Custom source factory cannot be empty"));
                }
                Ok(())
            }
        }
    }

    /// Get the source type name
    pub fn type_name(&self) -> &str {
        match self {
            SourceConfig::Azure { .. } => "azure",
            SourceConfig::File { .. } => "file",
            SourceConfig::Custom { factory, .. } => factory,
        }
    }
}

/// Prefix list provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// AWS EC2 managed prefix lists
    Ec2 {
        /// AWS region
        region: String,
        /// Log writes instead of performing them
        #[serde(default)]
        dry_run: bool,
    },

    /// In-process store (testing, local runs)
    Memory,

    /// Custom provider
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::Ec2 { region, .. } => {
                if region.is_empty() {
                    return Err(crate::Error::config("EC2 region cannot be empty"));
                }
                Ok(())
            }
            ProviderConfig::Memory => Ok(()),
            ProviderConfig::Custom { factory, .. } => {
                if factory.is_empty() {
                    return Err(crate::Error::config("Custom provider factory cannot be empty"));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::Ec2 { .. } => "ec2",
            ProviderConfig::Memory => "memory",
            ProviderConfig::Custom { factory, .. } => factory,
        }
    }
}
