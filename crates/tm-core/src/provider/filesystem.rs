//! Provider backed by a directory of `.sql` files.

use super::ScriptProvider;
use crate::error::{CoreError, CoreResult};
use crate::script::{collect_scripts, ScriptInfo};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Scripts stored as files directly inside one directory
#[derive(Debug, Clone)]
pub struct FilesystemProvider {
    root: PathBuf,
}

impl FilesystemProvider {
    /// Create a provider; the directory itself is checked on [`list`](ScriptProvider::list).
    pub fn new(root: impl Into<PathBuf>) -> CoreResult<Self> {
        let root = root.into();
        if root.as_os_str().is_empty() {
            return Err(CoreError::InvalidProviderRoot {
                root: String::new(),
                reason: "directory path is empty".to_string(),
            });
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn root_error(&self, reason: String) -> CoreError {
        CoreError::InvalidProviderRoot {
            root: self.root.display().to_string(),
            reason,
        }
    }

    fn root_key(&self) -> String {
        self.root
            .to_string_lossy()
            .replace('\\', "/")
            .trim_end_matches('/')
            .to_string()
    }
}

impl ScriptProvider for FilesystemProvider {
    fn describe(&self) -> String {
        format!("filesystem:{}", self.root.display())
    }

    fn list(&self) -> CoreResult<Vec<ScriptInfo>> {
        if !self.root.is_dir() {
            return Err(self.root_error("not a directory".to_string()));
        }

        let read_dir = std::fs::read_dir(&self.root)
            .map_err(|e| self.root_error(format!("cannot be read: {e}")))?;

        let root_key = self.root_key();
        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|e| self.root_error(format!("cannot be read: {e}")))?;
            if !entry.path().is_file() {
                continue;
            }
            let Some(file_name) = entry.file_name().to_str().map(str::to_string) else {
                log::warn!("Skipping non UTF-8 file name in {}", self.root.display());
                continue;
            };
            entries.push((format!("{root_key}/{file_name}"), file_name));
        }

        collect_scripts(entries, &root_key, &self.describe())
    }

    /// `script.locator` is the file name; it is joined back onto the root
    /// path so a root that is not valid UTF-8 still resolves.
    fn load(&self, script: &ScriptInfo) -> CoreResult<String> {
        let path = self.root.join(&script.locator);
        std::fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => CoreError::ScriptNotFound {
                locator: path.display().to_string(),
            },
            ErrorKind::InvalidData => CoreError::ScriptNotText {
                locator: path.display().to_string(),
            },
            _ => CoreError::IoWithPath {
                path: path.display().to_string(),
                source: e,
            },
        })
    }
}
