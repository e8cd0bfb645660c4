//! Script providers: pluggable sources of migration scripts.
//!
//! Every provider exposes a flat list of keys under a root, filtered and
//! parsed by the shared naming convention in [`crate::script`]. Variants
//! differ only in how keys are listed and how content is read.

mod bundle;
mod filesystem;

pub use bundle::{BundleProvider, EmbeddedBundle, MemoryBundle, ResourceBundle};
pub use filesystem::FilesystemProvider;

use crate::error::CoreResult;
use crate::script::ScriptInfo;

/// A source of migration scripts
pub trait ScriptProvider: Send + Sync {
    /// Short description used in logs, errors and `ScriptInfo::origin`
    fn describe(&self) -> String;

    /// All scripts under the provider root, sorted by sequence id
    fn list(&self) -> CoreResult<Vec<ScriptInfo>>;

    /// Full text of a script previously returned by [`list`](Self::list)
    fn load(&self, script: &ScriptInfo) -> CoreResult<String>;
}

#[cfg(test)]
#[path = "provider_test.rs"]
mod tests;
