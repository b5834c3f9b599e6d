//! Shared fixtures for the client integration tests

#![allow(dead_code)]

use paddock_core::{AuthUser, CredentialStore, Credentials, MemoryStore, SessionContext};
use paddock_http::PaddockClient;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use wiremock::MockServer;

pub fn user_json(role: &str) -> Value {
    json!({
        "id": 16,
        "name": "Charles Leclerc",
        "username": "charles",
        "email": "a@b.com",
        "role": role,
        "country": "MC",
        "createdAt": "2024-05-26T14:00:00",
        "updatedAt": "2024-05-26T14:00:00"
    })
}

pub fn user(role: &str) -> AuthUser {
    serde_json::from_value(user_json(role)).unwrap()
}

/// Everything a test needs to inspect after driving the client
pub struct Harness {
    pub client: PaddockClient,
    pub session: Arc<SessionContext>,
    pub persistent: Arc<MemoryStore>,
    pub scoped: Arc<MemoryStore>,
    pub store: Arc<CredentialStore>,
    pub redirects: Arc<Mutex<Vec<String>>>,
}

impl Harness {
    pub fn new(server: &MockServer) -> Self {
        let persistent = Arc::new(MemoryStore::new());
        let scoped = Arc::new(MemoryStore::new());
        let store = Arc::new(CredentialStore::new(persistent.clone(), scoped.clone()));

        let redirects = Arc::new(Mutex::new(Vec::new()));
        let recorded = redirects.clone();
        let session = Arc::new(
            SessionContext::hydrated(store.clone())
                .with_redirect(move |to| recorded.lock().unwrap().push(to.to_string())),
        );

        let client = PaddockClient::builder()
            .base_url(server.uri())
            .store(store.clone())
            .observer(session.clone())
            .build()
            .unwrap();

        Self {
            client,
            session,
            persistent,
            scoped,
            store,
            redirects,
        }
    }

    /// Start with a signed-in user holding the given tokens
    pub fn signed_in(server: &MockServer, access: &str, refresh: &str, remember: bool) -> Self {
        let harness = Self::new(server);
        harness
            .session
            .login(user("USER"), access, refresh, remember)
            .unwrap();
        harness
    }

    pub fn redirects(&self) -> Vec<String> {
        self.redirects.lock().unwrap().clone()
    }

    pub fn credentials(&self) -> Option<Credentials> {
        self.store.load()
    }
}
