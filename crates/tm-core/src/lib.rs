//! tm-core - Core library for Tidemark
//!
//! This crate provides the migration script model, the file naming
//! convention parser, script providers (embedded bundles and filesystem
//! folders), the statement batch splitter, and project configuration.

pub mod config;
pub mod error;
pub mod provider;
pub mod script;
pub mod splitter;

pub use config::{DatabaseConfig, GateConfig, ProjectConfig, ProviderConfig, ServerConfig};
pub use error::{CoreError, CoreResult};
pub use provider::{
    BundleProvider, EmbeddedBundle, FilesystemProvider, MemoryBundle, ResourceBundle,
    ScriptProvider,
};
pub use script::{parse_script_key, ParsedKey, ScriptInfo};
pub use splitter::BatchSplitter;
