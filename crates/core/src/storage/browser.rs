//! Web storage backed scopes for the wasm build

use super::{SessionStore, StorageScope};
use crate::{CoreError, CoreResult};
use gloo::storage::{LocalStorage, SessionStorage, Storage};

/// `localStorage` or `sessionStorage` of the current window
#[derive(Debug, Clone, Copy)]
pub struct BrowserStore {
    scope: StorageScope,
}

impl BrowserStore {
    /// The `localStorage` scope
    pub const fn local() -> Self {
        Self {
            scope: StorageScope::Persistent,
        }
    }

    /// The `sessionStorage` scope
    pub const fn session() -> Self {
        Self {
            scope: StorageScope::Session,
        }
    }

    fn raw(self) -> web_sys::Storage {
        match self.scope {
            StorageScope::Persistent => LocalStorage::raw(),
            StorageScope::Session => SessionStorage::raw(),
        }
    }
}

fn js_error(err: &wasm_bindgen::JsValue) -> CoreError {
    CoreError::storage_error(format!("{err:?}"))
}

impl SessionStore for BrowserStore {
    fn get_item(&self, key: &str) -> CoreResult<Option<String>> {
        self.raw().get_item(key).map_err(|e| js_error(&e))
    }

    fn set_items(&self, items: &[(&str, &str)]) -> CoreResult<()> {
        let storage = self.raw();
        for (key, value) in items {
            storage.set_item(key, value).map_err(|e| js_error(&e))?;
        }
        Ok(())
    }

    fn remove_items(&self, keys: &[&str]) -> CoreResult<()> {
        let storage = self.raw();
        for key in keys {
            storage.remove_item(key).map_err(|e| js_error(&e))?;
        }
        Ok(())
    }
}
