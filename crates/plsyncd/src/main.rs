// # plsyncd - Prefix List Sync Runner
//
// Thin integration layer: all sync logic lives in plsync-core.
//
// The runner is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Registering range sources and prefix list providers
// 4. Running one sync and printing the invocation response
//
// Scheduling (e.g. a weekly timer) is left to whatever starts the process.
//
// ## Configuration
//
// ### Range Source
// - `PLSYNC_SOURCE_TYPE`: Source type (azure, file). Default: azure
// - `AZURE_RANGE_URL`: Download page or direct document URL (for azure)
// - `PLSYNC_SOURCE_PATH`: Path to a Service Tags JSON file (for file)
// - `AZURE_RANGE_NAMES`: Comma-separated range names to sync
//
// ### Prefix List Provider
// - `PLSYNC_PROVIDER_TYPE`: Provider type (ec2, memory). Default: ec2
// - `AWS_REGION`: Region holding the prefix lists. Default: eu-west-1
// - `AWS_MAX_ENTRIES_PER_LIST`: Entries per prefix list (1-1000). Default: 50
// - `PLSYNC_MODE`: Set to `dry-run` to log writes instead of making them
//
// ### Logging
// - `PLSYNC_LOG_LEVEL`: trace, debug, info, warn, error. Default: info
//
// ## Example
//
// ```bash
// export AWS_REGION=eu-west-1
// export AZURE_RANGE_NAMES=AzureDevOps,AzureCloud.northeurope
// export PLSYNC_MODE=dry-run
//
// plsyncd
// ```

use anyhow::Result;
use plsync_core::config::{ProviderConfig, SourceConfig, SyncConfig};
use plsync_core::{Registry, SyncEngine, handle};
use std::env;
use std::process::ExitCode;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

const DEFAULT_REGION: &str = "eu-west-1";
const DEFAULT_RANGE_URL: &str =
    "https://www.microsoft.com/en-gb/download/confirmation.aspx?id=56519";
const DEFAULT_RANGE_NAMES: &str = "AzureDevOps,AzureCloud.northeurope";
const DEFAULT_MAX_ENTRIES: usize = 50;

/// EC2 ceiling for entries in one managed prefix list
const MAX_ENTRIES_CEILING: usize = 1000;

/// Exit codes for different termination scenarios
///
/// - 0: Run completed
/// - 1: Configuration or startup error
/// - 2: Runtime error, or the run did not complete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlsyncExitCode {
    /// Run completed (individual lists may still have failed)
    Completed = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (fetch failure, unexpected error)
    RuntimeError = 2,
}

impl From<PlsyncExitCode> for ExitCode {
    fn from(code: PlsyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
#[derive(Debug)]
struct Config {
    source_type: String,
    range_url: String,
    source_path: Option<String>,
    range_names: Vec<String>,
    provider_type: String,
    region: String,
    max_entries: usize,
    dry_run: bool,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through a variable lookup
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let max_entries = match lookup("AWS_MAX_ENTRIES_PER_LIST") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                anyhow::anyhow!(
                    "AWS_MAX_ENTRIES_PER_LIST must be a whole number. Got: '{}'",
                    raw
                )
            })?,
            None => DEFAULT_MAX_ENTRIES,
        };

        Ok(Self {
            source_type: lookup("PLSYNC_SOURCE_TYPE").unwrap_or_else(|| "azure".to_string()),
            range_url: lookup("AZURE_RANGE_URL").unwrap_or_else(|| DEFAULT_RANGE_URL.to_string()),
            source_path: lookup("PLSYNC_SOURCE_PATH"),
            range_names: lookup("AZURE_RANGE_NAMES")
                .unwrap_or_else(|| DEFAULT_RANGE_NAMES.to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            provider_type: lookup("PLSYNC_PROVIDER_TYPE").unwrap_or_else(|| "ec2".to_string()),
            region: lookup("AWS_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string()),
            max_entries,
            dry_run: lookup("PLSYNC_MODE")
                .is_some_and(|mode| mode.eq_ignore_ascii_case("dry-run")),
            log_level: lookup("PLSYNC_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        match self.source_type.as_str() {
            "azure" => {
                if !self.range_url.starts_with("https://") && !self.range_url.starts_with("http://")
                {
                    anyhow::bail!(
                        "AZURE_RANGE_URL must use HTTP or HTTPS scheme. Got: {}",
                        self.range_url
                    );
                }
            }
            "file" => {
                if self.source_path.as_ref().is_none_or(|p| p.is_empty()) {
                    anyhow::bail!(
                        "PLSYNC_SOURCE_PATH is required when PLSYNC_SOURCE_TYPE=file. \
                        Set it via: export PLSYNC_SOURCE_PATH=/path/to/ServiceTags_Public.json"
                    );
                }
            }
            _ => anyhow::bail!(
                "PLSYNC_SOURCE_TYPE '{}' is not supported. Supported types: azure, file",
                self.source_type
            ),
        }

        match self.provider_type.as_str() {
            "ec2" => {
                if self.region.trim().is_empty() {
                    anyhow::bail!("AWS_REGION cannot be empty");
                }
            }
            "memory" => {}
            _ => anyhow::bail!(
                "PLSYNC_PROVIDER_TYPE '{}' is not supported. Supported types: ec2, memory",
                self.provider_type
            ),
        }

        if self.range_names.is_empty() {
            anyhow::bail!(
                "AZURE_RANGE_NAMES must contain at least one range name. \
                Set it via: export AZURE_RANGE_NAMES=AzureDevOps,AzureCloud.northeurope"
            );
        }

        if !(1..=MAX_ENTRIES_CEILING).contains(&self.max_entries) {
            anyhow::bail!(
                "AWS_MAX_ENTRIES_PER_LIST must be between 1 and {}. Got: {}",
                MAX_ENTRIES_CEILING,
                self.max_entries
            );
        }

        self.log_level()?;

        Ok(())
    }

    fn log_level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "PLSYNC_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }

    fn source_config(&self) -> SourceConfig {
        match self.source_type.as_str() {
            "file" => SourceConfig::File {
                path: self.source_path.clone().unwrap_or_default(),
            },
            _ => SourceConfig::Azure {
                url: self.range_url.clone(),
            },
        }
    }

    fn provider_config(&self) -> ProviderConfig {
        match self.provider_type.as_str() {
            "memory" => ProviderConfig::Memory,
            _ => ProviderConfig::Ec2 {
                region: self.region.clone(),
                dry_run: self.dry_run,
            },
        }
    }

    fn sync_config(&self) -> SyncConfig {
        SyncConfig::new(self.range_names.iter().cloned()).with_max_entries(self.max_entries)
    }
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return PlsyncExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return PlsyncExitCode::ConfigError.into();
    }

    let log_level = config.log_level().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return PlsyncExitCode::ConfigError.into();
    }

    info!("Starting plsyncd");
    info!(
        "Configuration loaded: {} range name(s), {} entries per list",
        config.range_names.len(),
        config.max_entries
    );

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return PlsyncExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        match run_once(&config).await {
            Ok(200) => PlsyncExitCode::Completed,
            Ok(status) => {
                error!("Run did not complete (status {})", status);
                PlsyncExitCode::RuntimeError
            }
            Err(e) => {
                error!("plsyncd error: {:#}", e);
                exit_code_for(&e)
            }
        }
    });

    result.into()
}

/// Map a setup error to an exit code
fn exit_code_for(error: &anyhow::Error) -> PlsyncExitCode {
    match error.downcast_ref::<plsync_core::Error>() {
        Some(plsync_core::Error::Config(_)) => PlsyncExitCode::ConfigError,
        _ => PlsyncExitCode::RuntimeError,
    }
}

/// Build the collaborators, run one sync and print the response
///
/// Returns the handler status code.
async fn run_once(config: &Config) -> Result<u16> {
    let registry = build_registry();

    info!("Range source: {}", config.source_type);
    info!(
        "Prefix list provider: {} [mode: {}]",
        config.provider_type,
        if config.dry_run { "DRY-RUN" } else { "LIVE" }
    );
    if config.dry_run && config.provider_type != "ec2" {
        warn!("PLSYNC_MODE=dry-run only applies to the ec2 provider");
    }

    let source = registry.create_source(&config.source_config()).await?;
    let provider = registry.create_provider(&config.provider_config()).await?;

    let (engine, _events) = SyncEngine::new(source, provider, config.sync_config())?;

    let response = handle(&engine, &serde_json::json!({}), &serde_json::json!({})).await;
    println!("{}", serde_json::to_string(&response)?);

    let body = response.body()?;
    info!(
        "Run finished with status {}: {} created, {} failed",
        response.status_code,
        body.created.len(),
        body.failed_count
    );
    for name in &body.failed {
        warn!("Prefix list not reconciled: {}", name);
    }

    Ok(response.status_code)
}

/// Registry with every collaborator compiled into this binary
fn build_registry() -> Registry {
    let registry = Registry::new();
    plsync_core::register_builtin(&registry);

    #[cfg(feature = "azure")]
    plsync_source_azure::register(&registry);

    #[cfg(feature = "ec2")]
    plsync_provider_ec2::register(&registry);

    registry
}
