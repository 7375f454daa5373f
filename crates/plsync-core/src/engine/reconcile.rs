//! Per-name prefix list reconciliation
//!
//! Ensures exactly one prefix list with a given name exists, holding exactly
//! the given entries, by deleting every list carrying the name and creating a
//! fresh one.
//!
//! ## Protocol
//!
//! 1. Look up every list named `name` (names are not unique on the provider)
//! 2. Delete each match, unconditionally; live entries are never diffed
//! 3. Create a new list with capacity equal to the entry count, tagged as owned
//!
//! Any failure is caught here, logged with the list name and cause, and
//! reported as [`ReconcileOutcome::Failed`]. Nothing is transactional: if the
//! create fails after a delete succeeded, the list stays absent until the
//! next run.

use std::collections::BTreeMap;
use tracing::{debug, error, info};

use crate::error::{Error, Result};
use crate::partition::{AddressFamily, Entry};
use crate::traits::{CreatePrefixList, PrefixListHandle, PrefixListProvider};

/// Result of reconciling one prefix list name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// A fresh list now holds the entries
    Created {
        /// Prefix list name
        name: String,
        /// Provider id of the new list
        id: String,
    },
    /// Lookup, delete or create failed
    Failed {
        /// Prefix list name
        name: String,
        /// Underlying cause
        reason: String,
    },
}

impl ReconcileOutcome {
    /// Name this outcome refers to
    pub fn name(&self) -> &str {
        match self {
            ReconcileOutcome::Created { name, .. } | ReconcileOutcome::Failed { name, .. } => name,
        }
    }

    /// Whether the list was created
    pub fn is_created(&self) -> bool {
        matches!(self, ReconcileOutcome::Created { .. })
    }
}

/// Replaces prefix lists by name through a provider
pub struct ListReconciler<'a> {
    provider: &'a dyn PrefixListProvider,
    tags: &'a BTreeMap<String, String>,
}

impl<'a> ListReconciler<'a> {
    /// Create a reconciler using `provider`, tagging created lists with `tags`
    pub fn new(provider: &'a dyn PrefixListProvider, tags: &'a BTreeMap<String, String>) -> Self {
        Self { provider, tags }
    }

    /// Replace every list named `name` with one holding `entries`
    ///
    /// Never returns an error: failures become [`ReconcileOutcome::Failed`]
    /// so sibling chunks keep going.
    pub async fn reconcile(
        &self,
        name: &str,
        entries: &[Entry],
        family: AddressFamily,
    ) -> ReconcileOutcome {
        match self.replace(name, entries, family).await {
            Ok(handle) => {
                info!(
                    "Created prefix list {} ({}, {} entries, id {})",
                    name,
                    family,
                    entries.len(),
                    handle.id
                );
                ReconcileOutcome::Created {
                    name: name.to_string(),
                    id: handle.id,
                }
            }
            Err(e) => {
                error!("Failed to reconcile prefix list {}: {}", name, e);
                ReconcileOutcome::Failed {
                    name: name.to_string(),
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn replace(
        &self,
        name: &str,
        entries: &[Entry],
        family: AddressFamily,
    ) -> Result<PrefixListHandle> {
        let existing = self
            .provider
            .lookup_by_name(name)
            .await
            .map_err(|e| Error::reconcile(name, format!("lookup failed: {}", e)))?;

        for handle in &existing {
            debug!("Removing prefix list {} ({})", name, handle.id);
            self.provider
                .delete(handle)
                .await
                .map_err(|e| Error::reconcile(name, format!("delete of {} failed: {}", handle.id, e)))?;
        }

        let request =
            CreatePrefixList::sized_to_entries(name, family, entries.to_vec(), self.tags.clone());

        self.provider
            .create(&request)
            .await
            .map_err(|e| Error::reconcile(name, format!("create failed: {}", e)))
    }
}
