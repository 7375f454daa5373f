//! Contract Test: End-to-end sync scenarios
//!
//! Constraints verified:
//! - Chunk count, sizes and names for a multi-chunk range
//! - Empty datasets and unknown range names are valid, empty outcomes
//! - A failed create does not stop later chunks
//! - Malformed prefixes are dropped from both families
//! - Report order: blocks in dataset order, IPv4 before IPv6, ascending index

mod common;

use common::*;
use plsync_core::provider::ProviderCall;
use plsync_core::{AddressFamily, MemoryPrefixListProvider, RangeBlock, SyncConfig};

#[tokio::test]
async fn multi_chunk_range_produces_sized_and_named_lists() {
    let provider = MemoryPrefixListProvider::new();
    let blocks = vec![RangeBlock::new("AzureCloud.northeurope", ipv4_prefixes(120))];
    let (engine, _rx) = engine_with(
        blocks,
        &provider,
        SyncConfig::new(["AzureCloud.northeurope"]).with_max_entries(50),
    );

    let report = engine.run().await.expect("run completes");

    assert_eq!(
        report.created,
        vec![
            "azure-azurecloud-northeurope-pl-ipv4-1",
            "azure-azurecloud-northeurope-pl-ipv4-2",
            "azure-azurecloud-northeurope-pl-ipv4-3",
        ]
    );
    assert!(report.is_clean());

    let sizes: Vec<usize> = {
        let mut sizes = Vec::new();
        for name in &report.created {
            let lists = provider.lists_named(name).await;
            assert_eq!(lists.len(), 1, "expected exactly one list named {}", name);
            assert_eq!(lists[0].family, AddressFamily::IPv4);
            assert_eq!(lists[0].max_entries, lists[0].entries.len());
            sizes.push(lists[0].entries.len());
        }
        sizes
    };
    assert_eq!(sizes, vec![50, 50, 20]);

    assert!(
        provider
            .lists()
            .await
            .iter()
            .all(|list| list.family == AddressFamily::IPv4),
        "no IPv6 lists expected"
    );
}

#[tokio::test]
async fn empty_dataset_creates_nothing() {
    let provider = MemoryPrefixListProvider::new();
    let (engine, _rx) = engine_with(Vec::new(), &provider, SyncConfig::new(["AzureDevOps"]));

    let report = engine.run().await.expect("run completes");

    assert!(report.created.is_empty());
    assert!(report.failed.is_empty());
    assert!(provider.calls().await.is_empty());
}

#[tokio::test]
async fn unknown_range_name_makes_no_provider_calls() {
    let provider = MemoryPrefixListProvider::new();
    let blocks = vec![RangeBlock::new("AzureDevOps", ipv4_prefixes(3))];
    let (engine, _rx) = engine_with(blocks, &provider, SyncConfig::new(["NotInDataset"]));

    let report = engine.run().await.expect("run completes");

    assert!(report.created.is_empty());
    assert!(report.is_clean());
    assert!(provider.calls().await.is_empty());
}

#[tokio::test]
async fn create_failure_after_delete_is_isolated() {
    let provider = MemoryPrefixListProvider::new();
    provider
        .seed("azure-azuredevops-pl-ipv4-2", AddressFamily::IPv4, Vec::new())
        .await;
    provider.fail_create_for("azure-azuredevops-pl-ipv4-2").await;

    let mut prefixes = ipv4_prefixes(5);
    prefixes.extend(ipv6_prefixes(2));
    let blocks = vec![
        RangeBlock::new("AzureDevOps", prefixes),
        RangeBlock::new("AzureCloud.northeurope", ipv4_prefixes(1)),
    ];
    let (engine, _rx) = engine_with(
        blocks,
        &provider,
        SyncConfig::new(["AzureDevOps", "AzureCloud.northeurope"]).with_max_entries(2),
    );

    let report = engine.run().await.expect("run completes despite failure");

    assert_eq!(
        report.created,
        vec![
            "azure-azuredevops-pl-ipv4-1",
            "azure-azuredevops-pl-ipv4-3",
            "azure-azuredevops-pl-ipv6-1",
            "azure-azurecloud-northeurope-pl-ipv4-1",
        ]
    );
    assert_eq!(report.failure_count(), 1);
    assert_eq!(report.failed[0].name, "azure-azuredevops-pl-ipv4-2");
    assert!(report.failed[0].reason.contains("create failed"));

    // The old list was deleted before the create failed
    assert!(provider.lists_named("azure-azuredevops-pl-ipv4-2").await.is_empty());
}

#[tokio::test]
async fn malformed_prefix_is_dropped_from_both_families() {
    let provider = MemoryPrefixListProvider::new();
    let prefixes = vec![
        "20.37.158.0/23".to_string(),
        "2603:1030:7::/48".to_string(),
        "not-a-prefix".to_string(),
        "40.74.28.0/23".to_string(),
    ];
    let blocks = vec![RangeBlock::new("AzureDevOps", prefixes.clone())];
    let (engine, _rx) = engine_with(blocks, &provider, SyncConfig::new(["AzureDevOps"]));

    let report = engine.run().await.expect("run completes");
    assert_eq!(
        report.created,
        vec!["azure-azuredevops-pl-ipv4-1", "azure-azuredevops-pl-ipv6-1"]
    );

    let total: usize = provider
        .lists()
        .await
        .iter()
        .map(|list| list.entries.len())
        .sum();
    assert_eq!(total, prefixes.len() - 1);
    assert!(
        provider
            .lists()
            .await
            .iter()
            .flat_map(|list| list.entries.iter())
            .all(|entry| entry.cidr != "not-a-prefix")
    );
}

#[tokio::test]
async fn report_order_follows_dataset_then_family_then_index() {
    let provider = MemoryPrefixListProvider::new();

    let mut devops = ipv6_prefixes(3);
    devops.extend(ipv4_prefixes(3));
    let blocks = vec![
        RangeBlock::new("Storage", ipv4_prefixes(1)),
        RangeBlock::new("AzureDevOps", devops),
        RangeBlock::new("AzureCloud.northeurope", ipv6_prefixes(1)),
    ];
    // Configured order differs from dataset order on purpose
    let (engine, _rx) = engine_with(
        blocks,
        &provider,
        SyncConfig::new(["AzureCloud.northeurope", "AzureDevOps"]).with_max_entries(2),
    );

    let report = engine.run().await.expect("run completes");

    assert_eq!(
        report.created,
        vec![
            "azure-azuredevops-pl-ipv4-1",
            "azure-azuredevops-pl-ipv4-2",
            "azure-azuredevops-pl-ipv6-1",
            "azure-azuredevops-pl-ipv6-2",
            "azure-azurecloud-northeurope-pl-ipv6-1",
        ]
    );

    let creates: Vec<String> = provider
        .calls()
        .await
        .into_iter()
        .filter_map(|call| match call {
            ProviderCall::Create(name) => Some(name),
            _ => None,
        })
        .collect();
    assert_eq!(creates, report.created);
}
