//! Key/value storage scopes backing the credential store
//!
//! A browser tab has two scopes: `localStorage` survives restarts and
//! `sessionStorage` dies with the tab. [`SessionStore`] abstracts both so
//! the credential layer never branches on where it runs.

mod file;
mod memory;

#[cfg(target_arch = "wasm32")]
mod browser;

pub use file::FileStore;
pub use memory::MemoryStore;

#[cfg(target_arch = "wasm32")]
pub use browser::BrowserStore;

use crate::CoreResult;
use serde::{Deserialize, Serialize};

/// Which scope a record lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageScope {
    /// Survives restarts ("remember me")
    Persistent,
    /// Lives as long as the current tab or process
    Session,
}

impl StorageScope {
    /// Scope selected by the "remember me" flag
    pub const fn from_remember(remember: bool) -> Self {
        if remember {
            Self::Persistent
        } else {
            Self::Session
        }
    }

    /// The other scope
    pub const fn opposite(self) -> Self {
        match self {
            Self::Persistent => Self::Session,
            Self::Session => Self::Persistent,
        }
    }
}

/// String key/value storage with batch writes
pub trait SessionStore: Send + Sync {
    /// Read a single value
    fn get_item(&self, key: &str) -> CoreResult<Option<String>>;

    /// Write several values as one operation
    fn set_items(&self, items: &[(&str, &str)]) -> CoreResult<()>;

    /// Remove several keys as one operation. Missing keys are ignored.
    fn remove_items(&self, keys: &[&str]) -> CoreResult<()>;
}
