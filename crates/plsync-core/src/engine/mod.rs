//! Core synchronization engine
//!
//! The SyncEngine is responsible for:
//! - Fetching the upstream range dataset via RangeSource
//! - Selecting the configured range blocks
//! - Partitioning each block's prefixes by family and list capacity
//! - Reconciling every partition against its named prefix list
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐
//! │ RangeSource │─── Vec<RangeBlock> ───┐
//! └─────────────┘                       │
//!                                       ▼
//!                              ┌──────────────┐
//!                              │  SyncEngine  │
//!                              └──────────────┘
//!                                       │
//!         ┌─────────────────────────────┼─────────────────────────────┐
//!         │                             │                             │
//!         ▼                             ▼                             ▼
//! ┌───────────────┐           ┌──────────────────┐           ┌─────────────┐
//! │ filter_blocks │           │  ListReconciler  │           │   Events    │
//! │ partition     │           │ (delete, create) │           │  (notify)   │
//! └───────────────┘           └──────────────────┘           └─────────────┘
//! ```
//!
//! ## Run Flow
//!
//! 1. Fetch dataset; a fetch failure aborts the run before any provider call
//! 2. Keep blocks named in the configuration, in dataset order
//! 3. For each block, IPv4 then IPv6, partition into chunks
//! 4. For each chunk, derive its name and reconcile it
//! 5. Collect created names (and failures) into a [`SyncReport`]
//!
//! The engine holds no state between runs. Lists left over from a previous
//! run with a higher chunk index are not removed. Concurrent runs against the
//! same account are not safe; callers must serialize them.

pub mod reconcile;

pub use reconcile::{ListReconciler, ReconcileOutcome};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::num::NonZeroUsize;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::SyncConfig;
use crate::error::{Error, Result};
use crate::naming::derive_name;
use crate::partition::{AddressFamily, partition};
use crate::range::filter_blocks;
use crate::traits::{PrefixListProvider, RangeSource};

/// Events emitted by the SyncEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// Run started
    RunStarted {
        range_names: Vec<String>,
    },

    /// Upstream fetch failed; nothing was reconciled
    FetchFailed {
        error: String,
    },

    /// Configured blocks found in the dataset
    BlocksSelected {
        count: usize,
    },

    /// Prefix list created
    ListCreated {
        name: String,
        entries: usize,
    },

    /// Prefix list could not be reconciled
    ListFailed {
        name: String,
        error: String,
    },

    /// Run finished
    RunFinished {
        created: usize,
        failed: usize,
    },
}

/// A prefix list the run could not reconcile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedList {
    /// Prefix list name
    pub name: String,
    /// Underlying cause
    pub reason: String,
}

/// Outcome of one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    /// Names of lists created this run, in processing order
    pub created: Vec<String>,
    /// Lists that failed, in processing order
    pub failed: Vec<FailedList>,
    /// Run start time
    pub started_at: DateTime<Utc>,
    /// Run end time
    pub finished_at: DateTime<Utc>,
}

impl SyncReport {
    /// Number of lists that failed
    pub fn failure_count(&self) -> usize {
        self.failed.len()
    }

    /// Whether every chunk was reconciled
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Core synchronization engine
///
/// ## Lifecycle
///
/// 1. Create with [`SyncEngine::new()`] (validates configuration)
/// 2. Call [`SyncEngine::run()`] once per scheduled sync
///
/// ## Threading
///
/// A run is fully sequential: chunks are reconciled one after another in
/// the order they appear in the report.
pub struct SyncEngine {
    /// Upstream dataset source
    source: Box<dyn RangeSource>,

    /// Prefix list provider
    provider: Box<dyn PrefixListProvider>,

    /// Range names to include
    range_names: HashSet<String>,

    /// Range names in configured order (for logging)
    configured_names: Vec<String>,

    /// Maximum entries per prefix list
    max_entries: NonZeroUsize,

    /// Tags attached to created lists
    tags: BTreeMap<String, String>,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<SyncEvent>,
}

impl SyncEngine {
    /// Create a new sync engine
    ///
    /// Configuration is validated here, before any provider call can be made.
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(
        source: Box<dyn RangeSource>,
        provider: Box<dyn PrefixListProvider>,
        config: SyncConfig,
    ) -> Result<(Self, mpsc::Receiver<SyncEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let engine = Self {
            source,
            provider,
            range_names: config.range_name_set(),
            max_entries: config.max_entries()?,
            configured_names: config.range_names,
            tags: config.tags,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Run one synchronization pass
    ///
    /// # Returns
    ///
    /// - `Ok(SyncReport)`: The run completed; individual lists may have failed
    /// - `Err(Error::Fetch)`: The dataset could not be fetched; nothing was touched
    pub async fn run(&self) -> Result<SyncReport> {
        let started_at = Utc::now();
        self.emit_event(SyncEvent::RunStarted {
            range_names: self.configured_names.clone(),
        });

        info!(
            "Starting prefix list sync from {} via {} for {:?}",
            self.source.source_name(),
            self.provider.provider_name(),
            self.configured_names
        );

        let blocks = match self.source.fetch().await {
            Ok(blocks) => blocks,
            Err(e) => {
                let e = if e.is_fetch() { e } else { Error::fetch(e.to_string()) };
                error!("Failed to fetch range dataset: {}", e);
                self.emit_event(SyncEvent::FetchFailed {
                    error: e.to_string(),
                });
                return Err(e);
            }
        };

        let selected = filter_blocks(&blocks, &self.range_names);
        debug!(
            "Selected {} of {} range blocks",
            selected.len(),
            blocks.len()
        );
        self.emit_event(SyncEvent::BlocksSelected {
            count: selected.len(),
        });

        for name in &self.configured_names {
            if !selected.iter().any(|block| &block.name == name) {
                warn!("Range {} not present in dataset, nothing to sync", name);
            }
        }

        let reconciler = ListReconciler::new(self.provider.as_ref(), &self.tags);
        let mut created = Vec::new();
        let mut failed = Vec::new();
        // Derived name -> range it was derived from, to catch collisions
        let mut claimed: HashMap<String, &str> = HashMap::new();

        for block in selected {
            for family in AddressFamily::ALL {
                let chunks = partition(&block.address_prefixes, family, self.max_entries);
                debug!(
                    "Range {} has {} {} chunk(s)",
                    block.name,
                    chunks.len(),
                    family
                );

                for chunk in chunks {
                    let name = derive_name(&block.name, family, chunk.index);

                    if let Some(owner) = claimed.get(&name) {
                        let reason = format!(
                            "name already derived from range {} in this run",
                            owner
                        );
                        error!("Skipping prefix list {} for range {}: {}", name, block.name, reason);
                        self.emit_event(SyncEvent::ListFailed {
                            name: name.clone(),
                            error: reason.clone(),
                        });
                        failed.push(FailedList { name, reason });
                        continue;
                    }
                    claimed.insert(name.clone(), &block.name);

                    match reconciler.reconcile(&name, &chunk.entries, family).await {
                        ReconcileOutcome::Created { name, .. } => {
                            self.emit_event(SyncEvent::ListCreated {
                                name: name.clone(),
                                entries: chunk.len(),
                            });
                            created.push(name);
                        }
                        ReconcileOutcome::Failed { name, reason } => {
                            self.emit_event(SyncEvent::ListFailed {
                                name: name.clone(),
                                error: reason.clone(),
                            });
                            failed.push(FailedList { name, reason });
                        }
                    }
                }
            }
        }

        info!(
            "Prefix list sync finished: {} created, {} failed",
            created.len(),
            failed.len()
        );
        self.emit_event(SyncEvent::RunFinished {
            created: created.len(),
            failed: failed.len(),
        });

        Ok(SyncReport {
            created,
            failed,
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// Emit an engine event
    fn emit_event(&self, event: SyncEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
            // Nobody is listening
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_failure_count() {
        let report = SyncReport {
            created: vec!["a".to_string()],
            failed: vec![FailedList {
                name: "b".to_string(),
                reason: "denied".to_string(),
            }],
            started_at: Utc::now(),
            finished_at: Utc::now(),
        };

        assert_eq!(report.failure_count(), 1);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_sync_event_clone_eq() {
        let event = SyncEvent::ListCreated {
            name: "azure-azuredevops-pl-ipv4-1".to_string(),
            entries: 50,
        };
        assert_eq!(event.clone(), event);
    }
}
