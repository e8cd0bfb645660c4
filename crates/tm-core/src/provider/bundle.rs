//! Provider backed by an enumerable bundle of embedded text resources.

use super::ScriptProvider;
use crate::error::{CoreError, CoreResult};
use crate::script::{collect_scripts, ScriptInfo};
use rust_embed::RustEmbed;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::marker::PhantomData;

/// A flat namespace of resources addressed by `/`-separated keys
pub trait ResourceBundle: Send + Sync {
    /// Every key in the bundle
    fn keys(&self) -> Vec<String>;

    /// Raw content for `key`, `None` if absent
    fn read(&self, key: &str) -> Option<Cow<'_, [u8]>>;
}

/// Resources compiled into the binary with `rust-embed`.
///
/// Keys are paths relative to the embedded folder, so a folder holding
/// `migrations/1_Init.sql` is used with a provider rooted at `migrations`.
pub struct EmbeddedBundle<E> {
    _assets: PhantomData<fn() -> E>,
}

impl<E: RustEmbed> EmbeddedBundle<E> {
    pub fn new() -> Self {
        Self {
            _assets: PhantomData,
        }
    }
}

impl<E: RustEmbed> Default for EmbeddedBundle<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: RustEmbed> ResourceBundle for EmbeddedBundle<E> {
    fn keys(&self) -> Vec<String> {
        E::iter().map(Cow::into_owned).collect()
    }

    fn read(&self, key: &str) -> Option<Cow<'_, [u8]>> {
        E::get(key).map(|file| file.data)
    }
}

/// In-memory resources, for scripts assembled in code
#[derive(Debug, Clone, Default)]
pub struct MemoryBundle {
    resources: BTreeMap<String, String>,
}

impl MemoryBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a resource
    pub fn with(mut self, key: impl Into<String>, content: impl Into<String>) -> Self {
        self.insert(key, content);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, content: impl Into<String>) {
        self.resources.insert(key.into(), content.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.resources.remove(key)
    }
}

impl ResourceBundle for MemoryBundle {
    fn keys(&self) -> Vec<String> {
        self.resources.keys().cloned().collect()
    }

    fn read(&self, key: &str) -> Option<Cow<'_, [u8]>> {
        self.resources
            .get(key)
            .map(|content| Cow::Borrowed(content.as_bytes()))
    }
}

/// Provider over the keys of a [`ResourceBundle`] that sit directly under `root`
pub struct BundleProvider {
    root: String,
    bundle: Box<dyn ResourceBundle>,
}

impl BundleProvider {
    /// Create a provider; `root` is the namespace prefix, e.g. `migrations`.
    pub fn new(root: impl Into<String>, bundle: impl ResourceBundle + 'static) -> CoreResult<Self> {
        let root = root.into();
        let trimmed = root.trim_matches('/');
        if trimmed.is_empty() {
            return Err(CoreError::InvalidProviderRoot {
                root,
                reason: "bundle root must name a namespace prefix".to_string(),
            });
        }
        Ok(Self {
            root: trimmed.to_string(),
            bundle: Box::new(bundle),
        })
    }

    /// Provider over a `rust-embed` folder
    pub fn embedded<E: RustEmbed + 'static>(root: impl Into<String>) -> CoreResult<Self> {
        Self::new(root, EmbeddedBundle::<E>::new())
    }

    pub fn root(&self) -> &str {
        &self.root
    }
}

impl ScriptProvider for BundleProvider {
    fn describe(&self) -> String {
        format!("bundle:{}", self.root)
    }

    fn list(&self) -> CoreResult<Vec<ScriptInfo>> {
        let entries = self.bundle.keys().into_iter().map(|k| (k.clone(), k));
        collect_scripts(entries, &self.root, &self.describe())
    }

    fn load(&self, script: &ScriptInfo) -> CoreResult<String> {
        let data = self
            .bundle
            .read(&script.locator)
            .ok_or_else(|| CoreError::ScriptNotFound {
                locator: script.locator.clone(),
            })?;
        String::from_utf8(data.into_owned()).map_err(|_| CoreError::ScriptNotText {
            locator: script.locator.clone(),
        })
    }
}
