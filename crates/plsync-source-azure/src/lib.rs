// # Azure Service Tags Source
//
// This crate provides the upstream range source for prefix list sync.
//
// ## Purpose
//
// Microsoft publishes the Azure IP ranges weekly as a "Service Tags" JSON
// document. The document URL changes with every publication, so the stable
// entry point is a download confirmation page that links to it.
//
// ## Fetch Flow
//
// 1. GET the download page
// 2. Locate the `ServiceTags_*.json` link in the page
// 3. GET the JSON document and parse it into range blocks
//
// A URL that already points at a `.json` document skips steps 1 and 2.
// Any failure along the way is reported as a fetch error, so the engine
// aborts the run before touching a single prefix list.

use plsync_core::config::SourceConfig;
use plsync_core::dataset::parse_service_tags;
use plsync_core::traits::{RangeSource, RangeSourceFactory};
use plsync_core::{Error, RangeBlock, Registry, Result};

use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;

/// Download confirmation page for the public cloud Service Tags document
pub const DEFAULT_DOWNLOAD_PAGE_URL: &str =
    "https://www.microsoft.com/en-gb/download/confirmation.aspx?id=56519";

/// HTTP timeout for each request
const REQUEST_TIMEOUT_SECS: u64 = 30;

static SERVICE_TAGS_LINK: OnceLock<Regex> = OnceLock::new();
static ANY_JSON_LINK: OnceLock<Regex> = OnceLock::new();

fn service_tags_link() -> &'static Regex {
    SERVICE_TAGS_LINK.get_or_init(|| {
        Regex::new(
            r#"href\s*=\s*["'](https://download\.microsoft\.com/[^"']*/ServiceTags_[^"'/]*\.json)["']"#,
        )
        .expect("Invalid Regex")
    })
}

fn any_json_link() -> &'static Regex {
    ANY_JSON_LINK.get_or_init(|| {
        Regex::new(r#"href\s*=\s*["'](https://download\.microsoft\.com/[^"']*\.json)["']"#)
            .expect("Invalid Regex")
    })
}

/// Find the Service Tags document link in a download page
///
/// Prefers a `ServiceTags_*.json` link; falls back to the first `.json`
/// link on download.microsoft.com.
pub fn locate_document_link(page: &str) -> Option<String> {
    service_tags_link()
        .captures(page)
        .or_else(|| any_json_link().captures(page))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Range source reading the published Azure Service Tags document
pub struct AzureServiceTagsSource {
    /// Download page, or a direct `.json` document URL
    page_url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl AzureServiceTagsSource {
    /// Create a source starting at `page_url`
    pub fn new(page_url: impl Into<String>) -> Self {
        Self {
            page_url: page_url.into(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .unwrap_or_default(),
        }
    }

    /// The configured entry URL
    pub fn page_url(&self) -> &str {
        &self.page_url
    }

    fn is_direct_document(&self) -> bool {
        self.page_url
            .split(['?', '#'])
            .next()
            .is_some_and(|path| path.ends_with(".json"))
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::fetch(format!("Request to {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(Error::fetch(format!(
                "{} returned HTTP {}",
                url,
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| Error::fetch(format!("Failed to read response from {}: {}", url, e)))
    }

    async fn resolve_document_url(&self) -> Result<String> {
        if self.is_direct_document() {
            return Ok(self.page_url.clone());
        }

        let page = self.get_text(&self.page_url).await?;
        let url = locate_document_link(&page).ok_or_else(|| {
            Error::fetch(format!(
                "No Service Tags document link found on {}",
                self.page_url
            ))
        })?;

        tracing::debug!("Located Service Tags document at {}", url);
        Ok(url)
    }
}

#[async_trait::async_trait]
impl RangeSource for AzureServiceTagsSource {
    async fn fetch(&self) -> Result<Vec<RangeBlock>> {
        let document_url = self.resolve_document_url().await?;
        let json = self.get_text(&document_url).await?;
        let blocks = parse_service_tags(&json)?;

        tracing::info!(
            "Fetched {} range blocks from {}",
            blocks.len(),
            document_url
        );
        Ok(blocks)
    }

    fn source_name(&self) -> &'static str {
        "azure"
    }
}

impl std::fmt::Debug for AzureServiceTagsSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureServiceTagsSource")
            .field("page_url", &self.page_url)
            .finish_non_exhaustive()
    }
}

/// Factory for creating Azure range sources
pub struct AzureSourceFactory;

#[async_trait::async_trait]
impl RangeSourceFactory for AzureSourceFactory {
    async fn create(&self, config: &SourceConfig) -> Result<Box<dyn RangeSource>> {
        match config {
            SourceConfig::Azure { url } => Ok(Box::new(AzureServiceTagsSource::new(url.clone()))),
            _ => Err(Error::config("Invalid config for Azure range source")),
        }
    }
}

/// Register the Azure range source with a registry
pub fn register(registry: &Registry) {
    registry.register_source("azure", Box::new(AzureSourceFactory));
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <a href="https://www.microsoft.com/en-gb/download/details.aspx?id=56519">Back</a>
          <span class="file-link-view1">
            <a href="https://download.microsoft.com/download/7/1/D/71D86715-5596-4529-9B13-DA13A5DE5B63/ServiceTags_Public_20260914.json"
               class="mscom-link failoverLink">click here to download manually</a>
          </span>
        </body></html>
    "#;

    #[test]
    fn test_locates_service_tags_link() {
        assert_eq!(
            locate_document_link(PAGE).as_deref(),
            Some(
                "https://download.microsoft.com/download/7/1/D/71D86715-5596-4529-9B13-DA13A5DE5B63/ServiceTags_Public_20260914.json"
            )
        );
    }

    #[test]
    fn test_prefers_service_tags_over_other_json() {
        let page = r#"
            <a href="https://download.microsoft.com/download/0/manifest.json">manifest</a>
            <a href='https://download.microsoft.com/download/1/ServiceTags_Public_20260101.json'>tags</a>
        "#;
        assert_eq!(
            locate_document_link(page).as_deref(),
            Some("https://download.microsoft.com/download/1/ServiceTags_Public_20260101.json")
        );
    }

    #[test]
    fn test_falls_back_to_any_json_link() {
        let page = r#"<a href="https://download.microsoft.com/download/2/renamed.json">x</a>"#;
        assert_eq!(
            locate_document_link(page).as_deref(),
            Some("https://download.microsoft.com/download/2/renamed.json")
        );
    }

    #[test]
    fn test_no_link_found() {
        assert_eq!(locate_document_link("<html>maintenance</html>"), None);
        assert_eq!(
            locate_document_link(r#"<a href="https://evil.example/ServiceTags_Public.json">x</a>"#),
            None
        );
    }

    #[test]
    fn test_direct_document_detection() {
        assert!(AzureServiceTagsSource::new("https://host/ServiceTags_Public.json").is_direct_document());
        assert!(AzureServiceTagsSource::new("https://host/tags.json?sv=1").is_direct_document());
        assert!(!AzureServiceTagsSource::new(DEFAULT_DOWNLOAD_PAGE_URL).is_direct_document());
    }

    #[tokio::test]
    async fn test_factory_creation() {
        let factory = AzureSourceFactory;

        let source = factory
            .create(&SourceConfig::Azure {
                url: DEFAULT_DOWNLOAD_PAGE_URL.to_string(),
            })
            .await
            .unwrap();
        assert_eq!(source.source_name(), "azure");

        let wrong = factory
            .create(&SourceConfig::File {
                path: "/tmp/x.json".to_string(),
            })
            .await;
        assert!(matches!(wrong, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_fetch_error() {
        // Port 9 on loopback refuses connections on any normal host
        let source = AzureServiceTagsSource::new("http://127.0.0.1:9/ServiceTags_Public.json");
        let err = source.fetch().await.unwrap_err();
        assert!(err.is_fetch(), "expected fetch error, got {:?}", err);
    }

    #[test]
    fn test_register() {
        let registry = Registry::new();
        register(&registry);
        assert!(registry.has_source("azure"));
    }
}
