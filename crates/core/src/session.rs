//! Process-wide authentication state derived from the credential store

use crate::CoreResult;
use crate::credentials::CredentialStore;
use crate::types::{AuthUser, Credentials};
use arc_swap::ArcSwap;
use std::sync::Arc;
use tracing::{info, warn};

/// Path the user is sent to when the session is torn down
pub const LANDING_PATH: &str = "/";

/// Authentication state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Stored credentials have not been read yet. Nothing depending on
    /// authentication should render in this state.
    Loading,
    Unauthenticated,
    Authenticated(AuthUser),
}

/// Receives forced logouts from the HTTP layer
pub trait SessionObserver: Send + Sync {
    /// Stored credentials were cleared because they could not be renewed.
    /// `redirect_to` is where the UI should navigate.
    fn session_expired(&self, redirect_to: &str);
}

type RedirectHook = Box<dyn Fn(&str) + Send + Sync>;

/// Authentication context
pub struct SessionContext {
    store: Arc<CredentialStore>,
    state: ArcSwap<SessionState>,
    on_redirect: Option<RedirectHook>,
}

impl SessionContext {
    /// Create a context in the `Loading` state
    pub fn new(store: Arc<CredentialStore>) -> Self {
        Self {
            store,
            state: ArcSwap::from_pointee(SessionState::Loading),
            on_redirect: None,
        }
    }

    /// Create a context and hydrate it immediately
    pub fn hydrated(store: Arc<CredentialStore>) -> Self {
        let context = Self::new(store);
        context.hydrate();
        context
    }

    /// Navigation callback invoked after a forced logout
    #[must_use]
    pub fn with_redirect(mut self, hook: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_redirect = Some(Box::new(hook));
        self
    }

    /// The credential store this context writes through to
    pub fn store(&self) -> &Arc<CredentialStore> {
        &self.store
    }

    /// Read stored credentials once. Later calls are no-ops.
    pub fn hydrate(&self) {
        if !self.is_loading() {
            return;
        }
        let next = match self.store.load() {
            Some(credentials) => SessionState::Authenticated(credentials.user),
            None => SessionState::Unauthenticated,
        };
        // A login that raced the read wins over the hydrated value
        self.state.rcu(|current| match **current {
            SessionState::Loading => Arc::new(next.clone()),
            _ => Arc::clone(current),
        });
    }

    /// Persist the credentials and mark the user as signed in
    pub fn login(
        &self,
        user: AuthUser,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        remember: bool,
    ) -> CoreResult<()> {
        let credentials = Credentials {
            user,
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        };
        self.store.save(remember, &credentials)?;

        info!(
            "User {} signed in{}",
            credentials.user.username,
            if remember { " (remembered)" } else { "" }
        );
        self.state
            .store(Arc::new(SessionState::Authenticated(credentials.user)));
        Ok(())
    }

    /// Clear stored credentials and drop the signed-in user
    pub fn logout(&self) -> CoreResult<()> {
        let cleared = self.store.clear();
        self.state.store(Arc::new(SessionState::Unauthenticated));
        info!("User signed out");
        cleared
    }

    /// Current state snapshot
    pub fn state(&self) -> Arc<SessionState> {
        self.state.load_full()
    }

    /// The signed-in user, if any
    pub fn auth(&self) -> Option<AuthUser> {
        match &**self.state.load() {
            SessionState::Authenticated(user) => Some(user.clone()),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(**self.state.load(), SessionState::Loading)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(**self.state.load(), SessionState::Authenticated(_))
    }

    pub fn is_admin(&self) -> bool {
        matches!(&**self.state.load(), SessionState::Authenticated(user) if user.is_admin())
    }
}

impl SessionObserver for SessionContext {
    fn session_expired(&self, redirect_to: &str) {
        if let Err(e) = self.store.clear() {
            warn!("Failed to clear credentials after session expiry: {e}");
        }
        self.state.store(Arc::new(SessionState::Unauthenticated));
        warn!("Session expired, redirecting to {redirect_to}");
        if let Some(hook) = &self.on_redirect {
            hook(redirect_to);
        }
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("state", &self.state.load())
            .finish_non_exhaustive()
    }
}
