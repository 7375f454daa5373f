//! Test doubles and common utilities for contract tests
//!
//! Range sources here return canned datasets; the provider side uses the
//! crate's own `MemoryPrefixListProvider`, which records every call.

#![allow(dead_code)]

use plsync_core::error::{Error, Result};
use plsync_core::traits::RangeSource;
use plsync_core::{MemoryPrefixListProvider, RangeBlock, SyncConfig, SyncEngine, SyncEvent};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;

/// A range source returning a fixed dataset
pub struct StaticRangeSource {
    blocks: Vec<RangeBlock>,
    fetch_call_count: Arc<AtomicUsize>,
}

impl StaticRangeSource {
    pub fn new(blocks: Vec<RangeBlock>) -> Self {
        Self {
            blocks,
            fetch_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared counter of fetch() calls
    pub fn fetch_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.fetch_call_count)
    }
}

#[async_trait::async_trait]
impl RangeSource for StaticRangeSource {
    async fn fetch(&self) -> Result<Vec<RangeBlock>> {
        self.fetch_call_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.blocks.clone())
    }

    fn source_name(&self) -> &'static str {
        "static"
    }
}

/// A range source that always fails with the given error
pub struct FailingRangeSource {
    make_error: fn() -> Error,
}

impl FailingRangeSource {
    /// Fails with a fetch error
    pub fn unreachable() -> Self {
        Self {
            make_error: || Error::fetch("connection refused"),
        }
    }

    /// Fails with a non-fetch error (engine must still treat it as a fetch failure)
    pub fn with_other_error() -> Self {
        Self {
            make_error: || Error::Other("upstream exploded".to_string()),
        }
    }
}

#[async_trait::async_trait]
impl RangeSource for FailingRangeSource {
    async fn fetch(&self) -> Result<Vec<RangeBlock>> {
        Err((self.make_error)())
    }

    fn source_name(&self) -> &'static str {
        "failing"
    }
}

/// `count` distinct IPv4 prefixes
pub fn ipv4_prefixes(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| format!("10.{}.{}.0/24", i / 256, i % 256))
        .collect()
}

/// `count` distinct IPv6 prefixes
pub fn ipv6_prefixes(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("2603:1020:{:x}::/48", i)).collect()
}

/// Build an engine over a static dataset and a shared memory provider
pub fn engine_with(
    blocks: Vec<RangeBlock>,
    provider: &MemoryPrefixListProvider,
    config: SyncConfig,
) -> (SyncEngine, mpsc::Receiver<SyncEvent>) {
    SyncEngine::new(
        Box::new(StaticRangeSource::new(blocks)),
        Box::new(provider.clone()),
        config,
    )
    .expect("engine construction succeeds")
}

/// Drain every event currently buffered
pub fn drain_events(rx: &mut mpsc::Receiver<SyncEvent>) -> Vec<SyncEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
