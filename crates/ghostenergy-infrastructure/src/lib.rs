//! Infrastructure layer: configuration, local paths, durable storage and
//! the HTTP adapters behind the core ports.

pub mod config;
pub mod http;
pub mod paths;
pub mod storage;

pub use config::{ClientConfig, ConfigService};
pub use http::HttpApiClient;
pub use paths::GhostPaths;
pub use storage::{InMemoryKeyValueStore, JsonFileKeyValueStore};
