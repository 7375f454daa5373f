// # EC2 Managed Prefix List Provider
//
// This crate provides the AWS implementation of PrefixListProvider, backed by
// EC2 managed prefix lists.
//
// ## Behavior
//
// - One API call (or one paginated describe) per trait method
// - No retry or backoff beyond what the SDK does for transport errors
// - Errors carry the SDK's full display context
//
// ## Credentials
//
// Resolved by `aws-config`'s default chain (environment, profile, web
// identity, container or instance metadata). Nothing is read here.
//
// ## API Reference
//
// - DescribeManagedPrefixLists (filter `prefix-list-name`)
// - DeleteManagedPrefixList
// - CreateManagedPrefixList

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_ec2::Client;
use aws_sdk_ec2::config::Region;
use aws_sdk_ec2::error::DisplayErrorContext;
use aws_sdk_ec2::types::{AddPrefixListEntry, Filter, ResourceType, Tag, TagSpecification};
use plsync_core::config::ProviderConfig;
use plsync_core::traits::{
    CreatePrefixList, PrefixListHandle, PrefixListProvider, PrefixListProviderFactory,
};
use plsync_core::{Entry, Error, Registry, Result};
use std::collections::BTreeMap;

/// Handle id returned for writes skipped in dry-run mode
pub const DRY_RUN_LIST_ID: &str = "pl-dryrun";

const PROVIDER: &str = "ec2";

/// EC2 managed prefix list provider
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider will:
/// - Perform lookups against the account
/// - Log every delete and create it would have made
/// - **NOT** change any prefix list
pub struct Ec2PrefixListProvider {
    /// EC2 API client
    client: Client,

    /// Region the client is bound to
    region: String,

    /// Dry-run mode: if true, lookups are real and writes are skipped
    dry_run: bool,
}

impl std::fmt::Debug for Ec2PrefixListProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ec2PrefixListProvider")
            .field("region", &self.region)
            .field("dry_run", &self.dry_run)
            .finish_non_exhaustive()
    }
}

impl Ec2PrefixListProvider {
    /// Build a provider from the default AWS configuration chain
    ///
    /// # Parameters
    ///
    /// - `region`: AWS region holding the prefix lists (e.g. `eu-west-1`)
    /// - `dry_run`: If true, perform lookups but skip deletes and creates
    pub async fn connect(region: impl Into<String>, dry_run: bool) -> Self {
        let region = region.into();
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.clone()))
            .load()
            .await;

        Self::from_client(Client::new(&sdk_config), region, dry_run)
    }

    /// Wrap an existing client
    pub fn from_client(client: Client, region: impl Into<String>, dry_run: bool) -> Self {
        Self {
            client,
            region: region.into(),
            dry_run,
        }
    }

    /// Whether writes are skipped
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn mode(&self) -> &'static str {
        if self.dry_run { "DRY-RUN" } else { "LIVE" }
    }
}

/// Map prefix list entries to SDK entries
fn sdk_entries(entries: &[Entry]) -> Result<Vec<AddPrefixListEntry>> {
    entries
        .iter()
        .map(|entry| {
            AddPrefixListEntry::builder()
                .cidr(&entry.cidr)
                .description(&entry.description)
                .build()
                .map_err(|e| Error::invalid_input(format!("Invalid entry {}: {}", entry.cidr, e)))
        })
        .collect()
}

/// Map tags to a `prefix-list` tag specification
fn tag_specification(tags: &BTreeMap<String, String>) -> TagSpecification {
    let tags = tags
        .iter()
        .map(|(key, value)| Tag::builder().key(key).value(value).build())
        .collect();

    TagSpecification::builder()
        .resource_type(ResourceType::PrefixList)
        .set_tags(Some(tags))
        .build()
}

#[async_trait]
impl PrefixListProvider for Ec2PrefixListProvider {
    async fn lookup_by_name(&self, name: &str) -> Result<Vec<PrefixListHandle>> {
        let filter = Filter::builder()
            .name("prefix-list-name")
            .values(name)
            .build();

        let mut handles = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let output = self
                .client
                .describe_managed_prefix_lists()
                .filters(filter.clone())
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| {
                    Error::provider(
                        PROVIDER,
                        format!("DescribeManagedPrefixLists for {} failed: {}", name, DisplayErrorContext(&e)),
                    )
                })?;

            for list in output.prefix_lists() {
                if let Some(id) = list.prefix_list_id() {
                    handles.push(PrefixListHandle::new(
                        id,
                        list.prefix_list_name().unwrap_or(name),
                    ));
                }
            }

            match output.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                _ => break,
            }
        }

        tracing::debug!("Found {} prefix list(s) named {}", handles.len(), name);
        Ok(handles)
    }

    async fn delete(&self, handle: &PrefixListHandle) -> Result<()> {
        tracing::info!(
            "Deleting prefix list {} ({}) [mode: {}]",
            handle.name,
            handle.id,
            self.mode()
        );

        if self.dry_run {
            tracing::info!("[DRY-RUN] Would delete prefix list {}", handle.id);
            return Ok(());
        }

        self.client
            .delete_managed_prefix_list()
            .prefix_list_id(&handle.id)
            .send()
            .await
            .map_err(|e| {
                Error::provider(
                    PROVIDER,
                    format!("DeleteManagedPrefixList {} failed: {}", handle.id, DisplayErrorContext(&e)),
                )
            })?;

        Ok(())
    }

    async fn create(&self, request: &CreatePrefixList) -> Result<PrefixListHandle> {
        let entries = sdk_entries(&request.entries)?;
        let max_entries = i32::try_from(request.max_entries).map_err(|_| {
            Error::invalid_input(format!("max_entries {} out of range", request.max_entries))
        })?;

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would create {} prefix list {} with {} entries",
                request.family,
                request.name,
                entries.len()
            );
            return Ok(PrefixListHandle::new(DRY_RUN_LIST_ID, request.name.clone()));
        }

        let output = self
            .client
            .create_managed_prefix_list()
            .dry_run(false)
            .prefix_list_name(&request.name)
            .set_entries(Some(entries))
            .max_entries(max_entries)
            .address_family(request.family.as_provider_str())
            .tag_specifications(tag_specification(&request.tags))
            .send()
            .await
            .map_err(|e| {
                Error::provider(
                    PROVIDER,
                    format!("CreateManagedPrefixList {} failed: {}", request.name, DisplayErrorContext(&e)),
                )
            })?;

        let id = output
            .prefix_list()
            .and_then(|list| list.prefix_list_id())
            .ok_or_else(|| {
                Error::provider(
                    PROVIDER,
                    format!("CreateManagedPrefixList {} returned no prefix list id", request.name),
                )
            })?;

        Ok(PrefixListHandle::new(id, request.name.clone()))
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

/// Factory for creating EC2 providers
pub struct Ec2Factory;

#[async_trait]
impl PrefixListProviderFactory for Ec2Factory {
    async fn create(&self, config: &ProviderConfig) -> Result<Box<dyn PrefixListProvider>> {
        match config {
            ProviderConfig::Ec2 { region, dry_run } => {
                if region.trim().is_empty() {
                    return Err(Error::config("EC2 region cannot be empty"));
                }
                Ok(Box::new(Ec2PrefixListProvider::connect(region.clone(), *dry_run).await))
            }
            _ => Err(Error::config("Invalid config for EC2 provider")),
        }
    }
}

/// Register the EC2 provider with a registry
pub fn register(registry: &Registry) {
    registry.register_provider(PROVIDER, Box::new(Ec2Factory));
}

#[cfg(test)]
mod tests {
    use super::*;
    use plsync_core::AddressFamily;

    /// Client that never reaches AWS unless a request is sent
    fn offline_client() -> Client {
        let config = aws_sdk_ec2::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("eu-west-1"))
            .build();
        Client::from_conf(config)
    }

    fn request() -> CreatePrefixList {
        CreatePrefixList::sized_to_entries(
            "azure-azuredevops-pl-ipv4-1",
            AddressFamily::IPv4,
            vec![
                Entry::from_prefix("20.37.158.0/23"),
                Entry::from_prefix("40.74.28.0/23"),
            ],
            BTreeMap::from([("CreatedBy".to_string(), "AwsAzurePrefixListMaker".to_string())]),
        )
    }

    #[test]
    fn test_sdk_entries_keep_order_and_description() {
        let entries = sdk_entries(&request().entries).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].cidr(), "20.37.158.0/23");
        assert_eq!(entries[0].description(), Some("20.37.158.0/23"));
        assert_eq!(entries[1].cidr(), "40.74.28.0/23");
    }

    #[test]
    fn test_tag_specification() {
        let spec = tag_specification(&request().tags);
        assert_eq!(spec.resource_type(), Some(&ResourceType::PrefixList));
        assert_eq!(spec.tags().len(), 1);
        assert_eq!(spec.tags()[0].key(), Some("CreatedBy"));
        assert_eq!(spec.tags()[0].value(), Some("AwsAzurePrefixListMaker"));
    }

    #[tokio::test]
    async fn test_dry_run_writes_skip_the_api() {
        let provider = Ec2PrefixListProvider::from_client(offline_client(), "eu-west-1", true);

        let handle = provider.create(&request()).await.unwrap();
        assert_eq!(handle.id, DRY_RUN_LIST_ID);
        assert_eq!(handle.name, "azure-azuredevops-pl-ipv4-1");

        provider
            .delete(&PrefixListHandle::new("pl-0123456789abcdef0", "x"))
            .await
            .unwrap();
    }

    #[test]
    fn test_debug_and_name() {
        let provider = Ec2PrefixListProvider::from_client(offline_client(), "eu-west-1", false);
        let debug_str = format!("{:?}", provider);
        assert!(debug_str.contains("Ec2PrefixListProvider"));
        assert!(debug_str.contains("eu-west-1"));
        assert_eq!(provider.provider_name(), "ec2");
        assert!(!provider.is_dry_run());
    }

    #[tokio::test]
    async fn test_factory_rejects_other_config() {
        let result = Ec2Factory.create(&ProviderConfig::Memory).await;
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_register() {
        let registry = Registry::new();
        register(&registry);
        assert!(registry.has_provider("ec2"));
    }
}
