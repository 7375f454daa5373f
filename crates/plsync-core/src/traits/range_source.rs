// # Range Source Trait
//
// Defines the interface for fetching the upstream range dataset.
//
// ## Implementations
//
// - Azure download page: `plsync-source-azure` crate
// - Local JSON file: [`crate::source::FileRangeSource`]
//
// ## Usage
//
// ```rust,ignore
// use plsync_core::RangeSource;
//
// let source = /* RangeSource implementation */;
// let blocks = source.fetch().await?;
// ```

use async_trait::async_trait;

use crate::range::RangeBlock;

/// Trait for upstream dataset sources
///
/// A source returns the complete dataset or an error; it never returns a
/// partial dataset. Any failure should be reported as [`crate::Error::Fetch`],
/// which aborts the run before any provider call is made.
///
/// Sources hold no state across calls and perform no retries.
#[async_trait]
pub trait RangeSource: Send + Sync {
    /// Fetch every named range block in the dataset
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<RangeBlock>)`: All blocks, in document order
    /// - `Err(Error)`: If the dataset is unreachable or malformed
    async fn fetch(&self) -> Result<Vec<RangeBlock>, crate::Error>;

    /// Get the source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}

/// Helper trait for constructing range sources from configuration
#[async_trait]
pub trait RangeSourceFactory: Send + Sync {
    /// Create a RangeSource instance from configuration
    async fn create(
        &self,
        config: &crate::config::SourceConfig,
    ) -> Result<Box<dyn RangeSource>, crate::Error>;
}
