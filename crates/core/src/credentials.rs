//! Credential persistence across the persistent and session scopes

use crate::CoreResult;
use crate::storage::{MemoryStore, SessionStore, StorageScope};
use crate::types::{AuthUser, Credentials};
use std::sync::Arc;
use tracing::{debug, warn};

/// Storage key holding the serialized [`AuthUser`]
pub const USER_KEY: &str = "user";
/// Storage key holding the bearer access token
pub const ACCESS_TOKEN_KEY: &str = "ACCESS_TOKEN";
/// Storage key holding the refresh token
pub const REFRESH_TOKEN_KEY: &str = "REFRESH_TOKEN";

const ALL_KEYS: [&str; 3] = [USER_KEY, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY];

/// Reads and writes the `{user, accessToken, refreshToken}` record.
///
/// A record lives entirely in one scope. Reads check the persistent scope
/// before the session scope.
pub struct CredentialStore {
    persistent: Arc<dyn SessionStore>,
    session: Arc<dyn SessionStore>,
}

impl CredentialStore {
    /// Create a store over the two scopes
    pub fn new(persistent: Arc<dyn SessionStore>, session: Arc<dyn SessionStore>) -> Self {
        Self {
            persistent,
            session,
        }
    }

    /// Both scopes held in memory. Useful for tests and short-lived tools.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
    }

    /// Browser `localStorage` / `sessionStorage`
    #[cfg(target_arch = "wasm32")]
    pub fn browser() -> Self {
        use crate::storage::BrowserStore;
        Self::new(
            Arc::new(BrowserStore::local()),
            Arc::new(BrowserStore::session()),
        )
    }

    fn scope(&self, scope: StorageScope) -> &dyn SessionStore {
        match scope {
            StorageScope::Persistent => self.persistent.as_ref(),
            StorageScope::Session => self.session.as_ref(),
        }
    }

    /// Write a full record into the scope picked by `remember`.
    ///
    /// The opposite scope is cleared first so an older "remember me" login
    /// cannot resurface after this session ends.
    pub fn save(&self, remember: bool, credentials: &Credentials) -> CoreResult<()> {
        let target = StorageScope::from_remember(remember);
        let user = serde_json::to_string(&credentials.user)?;

        self.scope(target.opposite()).remove_items(&ALL_KEYS)?;
        self.scope(target).set_items(&[
            (USER_KEY, user.as_str()),
            (ACCESS_TOKEN_KEY, credentials.access_token.as_str()),
            (REFRESH_TOKEN_KEY, credentials.refresh_token.as_str()),
        ])?;

        debug!("Saved credentials for user {} to {target:?} scope", credentials.user.id);
        Ok(())
    }

    /// Load the first complete record, persistent scope first.
    ///
    /// Missing keys, unreadable storage and corrupt user JSON all read as
    /// "no session".
    pub fn load(&self) -> Option<Credentials> {
        [StorageScope::Persistent, StorageScope::Session]
            .into_iter()
            .find_map(|scope| self.load_from(scope))
    }

    fn load_from(&self, scope: StorageScope) -> Option<Credentials> {
        let store = self.scope(scope);
        let read = |key: &str| match store.get_item(key) {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to read {key} from {scope:?} scope: {e}");
                None
            }
        };

        let raw_user = read(USER_KEY)?;
        let user = match serde_json::from_str::<AuthUser>(&raw_user) {
            Ok(user) => user,
            Err(e) => {
                warn!("Discarding unreadable stored user in {scope:?} scope: {e}");
                return None;
            }
        };

        Some(Credentials {
            user,
            access_token: read(ACCESS_TOKEN_KEY)?,
            refresh_token: read(REFRESH_TOKEN_KEY)?,
        })
    }

    /// Remove every credential key from both scopes
    pub fn clear(&self) -> CoreResult<()> {
        let persistent = self.persistent.remove_items(&ALL_KEYS);
        let session = self.session.remove_items(&ALL_KEYS);
        debug!("Cleared stored credentials");
        persistent.and(session)
    }

    /// Current access token, persistent scope first
    pub fn access_token(&self) -> Option<String> {
        self.first_value(ACCESS_TOKEN_KEY)
    }

    /// Current refresh token, persistent scope first
    pub fn refresh_token(&self) -> Option<String> {
        self.first_value(REFRESH_TOKEN_KEY)
    }

    /// Scope that currently holds the refresh token
    pub fn active_scope(&self) -> Option<StorageScope> {
        [StorageScope::Persistent, StorageScope::Session]
            .into_iter()
            .find(|scope| {
                matches!(
                    self.scope(*scope).get_item(REFRESH_TOKEN_KEY),
                    Ok(Some(token)) if !token.is_empty()
                )
            })
    }

    /// Store a renewed access token next to the refresh token it came from
    pub fn update_access_token(&self, access_token: &str) -> CoreResult<()> {
        let scope = self.active_scope().unwrap_or(StorageScope::Session);
        self.scope(scope)
            .set_items(&[(ACCESS_TOKEN_KEY, access_token)])?;
        debug!("Stored renewed access token in {scope:?} scope");
        Ok(())
    }

    fn first_value(&self, key: &str) -> Option<String> {
        [StorageScope::Persistent, StorageScope::Session]
            .into_iter()
            .find_map(|scope| match self.scope(scope).get_item(key) {
                Ok(Some(value)) if !value.is_empty() => Some(value),
                Ok(_) => None,
                Err(e) => {
                    warn!("Failed to read {key} from {scope:?} scope: {e}");
                    None
                }
            })
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::storage::FileStore;
    use tempfile::TempDir;

    pub(crate) fn sample_user(role: &str) -> AuthUser {
        AuthUser {
            id: 44,
            name: "Lewis Hamilton".to_string(),
            username: "lewis".to_string(),
            email: "lewis@example.com".to_string(),
            role: role.to_string(),
            country: "GB".to_string(),
            created_at: "2024-01-01T00:00:00".to_string(),
            updated_at: "2024-01-01T00:00:00".to_string(),
            profile_image_base64: None,
        }
    }

    pub(crate) fn sample_credentials() -> Credentials {
        Credentials {
            user: sample_user("USER"),
            access_token: "access-1".to_string(),
            refresh_token: "refresh-1".to_string(),
        }
    }

    struct Scopes {
        persistent: Arc<MemoryStore>,
        session: Arc<MemoryStore>,
        store: CredentialStore,
    }

    fn scopes() -> Scopes {
        let persistent = Arc::new(MemoryStore::new());
        let session = Arc::new(MemoryStore::new());
        let store = CredentialStore::new(persistent.clone(), session.clone());
        Scopes {
            persistent,
            session,
            store,
        }
    }

    #[test]
    fn test_remembered_save_round_trips_through_persistent_scope() {
        let scopes = scopes();
        let credentials = sample_credentials();

        scopes.store.save(true, &credentials).unwrap();

        assert_eq!(scopes.store.load(), Some(credentials));
        assert_eq!(scopes.persistent.len(), 3);
        assert!(scopes.session.is_empty());
        assert_eq!(scopes.store.active_scope(), Some(StorageScope::Persistent));
    }

    #[test]
    fn test_session_save_clears_stale_persistent_record() {
        let scopes = scopes();
        scopes.store.save(true, &sample_credentials()).unwrap();

        let fresh = Credentials {
            access_token: "access-2".to_string(),
            refresh_token: "refresh-2".to_string(),
            ..sample_credentials()
        };
        scopes.store.save(false, &fresh).unwrap();

        assert!(scopes.persistent.is_empty());
        assert_eq!(scopes.store.load(), Some(fresh));

        scopes.store.clear().unwrap();
        assert_eq!(scopes.store.load(), None);
    }

    #[test]
    fn test_clear_leaves_no_keys_in_either_scope() {
        for remember in [true, false] {
            let scopes = scopes();
            scopes.store.save(remember, &sample_credentials()).unwrap();

            scopes.store.clear().unwrap();

            assert_eq!(scopes.store.load(), None);
            assert!(scopes.persistent.is_empty());
            assert!(scopes.session.is_empty());
            assert_eq!(scopes.store.access_token(), None);
        }
    }

    #[test]
    fn test_corrupt_user_is_no_session() {
        let scopes = scopes();
        scopes
            .persistent
            .set_items(&[
                (USER_KEY, "{\"id\":"),
                (ACCESS_TOKEN_KEY, "a"),
                (REFRESH_TOKEN_KEY, "r"),
            ])
            .unwrap();

        assert_eq!(scopes.store.load(), None);
    }

    #[test]
    fn test_partial_record_is_no_session() {
        let scopes = scopes();
        let user = serde_json::to_string(&sample_user("USER")).unwrap();
        scopes
            .session
            .set_items(&[(USER_KEY, user.as_str()), (ACCESS_TOKEN_KEY, "a")])
            .unwrap();

        assert_eq!(scopes.store.load(), None);
    }

    #[test]
    fn test_update_access_token_targets_refresh_token_scope() {
        let scopes = scopes();
        scopes.store.save(false, &sample_credentials()).unwrap();

        scopes.store.update_access_token("access-2").unwrap();

        assert_eq!(
            scopes.session.get_item(ACCESS_TOKEN_KEY).unwrap().as_deref(),
            Some("access-2")
        );
        assert!(scopes.persistent.is_empty());
        assert_eq!(scopes.store.access_token().as_deref(), Some("access-2"));
        assert_eq!(scopes.store.refresh_token().as_deref(), Some("refresh-1"));
    }

    #[test]
    fn test_file_backed_persistent_scope() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("credentials.json");
        let credentials = sample_credentials();

        CredentialStore::new(
            Arc::new(FileStore::new(&path)),
            Arc::new(MemoryStore::new()),
        )
        .save(true, &credentials)
        .unwrap();

        let reopened = CredentialStore::new(
            Arc::new(FileStore::new(&path)),
            Arc::new(MemoryStore::new()),
        );
        assert_eq!(reopened.load(), Some(credentials));
    }
}
