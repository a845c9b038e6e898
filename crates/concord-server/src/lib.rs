//! Server side of the Concord document replication engine: the RPC service
//! surface, the push-pull critical section, the storage adapter contract
//! and document watch streams.

pub mod config;
mod error;
mod lock;
pub mod service;
pub mod storage;
pub mod watch;

pub use config::{Config, StorageConfig};
pub use error::{ServerError, ServerResult};
pub use service::ConcordService;
