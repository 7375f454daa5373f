// # File Range Source
//
// Reads a Service Tags JSON document from local disk.
//
// ## Purpose
//
// Offline runs and reproducible tests: download the weekly document once,
// point the source at it, and every run sees the same dataset.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::Error;
use crate::config::SourceConfig;
use crate::dataset::parse_service_tags;
use crate::range::RangeBlock;
use crate::traits::range_source::{RangeSource, RangeSourceFactory};

/// Range source backed by a local JSON file
#[derive(Debug, Clone)]
pub struct FileRangeSource {
    path: PathBuf,
}

impl FileRangeSource {
    /// Create a source reading from `path`
    ///
    /// The file is read on every [`RangeSource::fetch`] call, not here.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path this source reads from
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RangeSource for FileRangeSource {
    async fn fetch(&self) -> Result<Vec<RangeBlock>, Error> {
        tracing::debug!("Reading range dataset from {}", self.path.display());

        let json = fs::read_to_string(&self.path).await.map_err(|e| {
            Error::fetch(format!(
                "Failed to read range file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        parse_service_tags(&json)
    }

    fn source_name(&self) -> &'static str {
        "file"
    }
}

/// Factory for creating file range sources
pub struct FileSourceFactory;

#[async_trait]
impl RangeSourceFactory for FileSourceFactory {
    async fn create(&self, config: &SourceConfig) -> Result<Box<dyn RangeSource>, Error> {
        match config {
            SourceConfig::File { path } => Ok(Box::new(FileRangeSource::new(path))),
            _ => Err(Error::config("Invalid config for file range source")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_file_source_reads_document() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ServiceTags_Public.json");
        std::fs::write(
            &path,
            r#"{"values": [{"name": "AzureDevOps", "properties": {"addressPrefixes": ["20.37.158.0/23"]}}]}"#,
        )
        .unwrap();

        let source = FileRangeSource::new(&path);
        let blocks = source.fetch().await.unwrap();
        assert_eq!(blocks, vec![RangeBlock::new("AzureDevOps", ["20.37.158.0/23"])]);
    }

    #[tokio::test]
    async fn test_missing_file_is_fetch_error() {
        let dir = tempdir().unwrap();
        let source = FileRangeSource::new(dir.path().join("absent.json"));
        assert!(source.fetch().await.unwrap_err().is_fetch());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_fetch_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("corrupt.json");
        std::fs::write(&path, "{ not json").unwrap();

        let source = FileRangeSource::new(&path);
        assert!(source.fetch().await.unwrap_err().is_fetch());
    }
}
