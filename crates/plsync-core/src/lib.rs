// # plsync-core
//
// Core library for keeping managed prefix lists in step with a published
// IP range dataset.
//
// ## Architecture Overview
//
// - **RangeSource**: Trait for fetching the upstream range dataset
// - **PrefixListProvider**: Trait for looking up, deleting and creating prefix lists
// - **filter_blocks / partition / derive_name**: Pure selection, chunking and naming
// - **ListReconciler**: Delete-then-create replacement of one named list
// - **SyncEngine**: Orchestrates fetch → filter → partition → reconcile for one run
// - **Registry**: Plugin-based registry for sources and providers
//
// ## Design Principles
//
// 1. **Stateless runs**: All persistent state lives in the provider's prefix lists
// 2. **Stable names**: A list's name is a pure function of range, family and chunk index
// 3. **Failure isolation**: One failed list never stops the rest of the run
// 4. **Library-First**: The daemon is a thin wrapper over this crate

pub mod config;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod handler;
pub mod naming;
pub mod partition;
pub mod provider;
pub mod range;
pub mod registry;
pub mod source;
pub mod traits;

// Re-export core types for convenience
pub use config::{ProviderConfig, SourceConfig, SyncConfig};
pub use engine::{FailedList, ListReconciler, ReconcileOutcome, SyncEngine, SyncEvent, SyncReport};
pub use error::{Error, Result};
pub use handler::{HandlerResponse, ResponseBody, handle};
pub use naming::derive_name;
pub use partition::{AddressFamily, Chunk, Entry, partition};
pub use provider::MemoryPrefixListProvider;
pub use range::{RangeBlock, filter_blocks};
pub use registry::{Registry, register_builtin};
pub use source::FileRangeSource;
pub use traits::{PrefixListProvider, RangeSource};
