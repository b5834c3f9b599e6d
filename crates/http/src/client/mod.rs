//! Paddock HTTP client

pub mod auth;
pub mod error;
pub mod interceptor;
pub mod refresh;
pub mod request;

use error::ClientError;
use interceptor::{intercept, is_no_refresh, request_path};
use paddock_core::types::{RefreshRequest, RefreshResponse};
use paddock_core::{ClientConfig, CredentialStore, LANDING_PATH, SessionObserver};
use refresh::{RefreshCoordinator, RefreshTicket};
use request::{ApiRequest, RequestBody};
use reqwest::{Client, ClientBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Token renewal endpoint
pub const REFRESH_PATH: &str = "/user/refresh";

/// Paddock API client.
///
/// Every request passes through the interceptor, which attaches the
/// stored access token. A 401 on a protected endpoint triggers one shared
/// refresh; the failed request is replayed with the renewed token.
#[derive(Clone)]
pub struct PaddockClient {
    /// Transport that keeps a cookie jar
    credentialed: Client,
    /// Transport that never sends cookies; also used for refresh calls
    anonymous: Client,
    base_url: String,
    with_credentials: bool,
    store: Arc<CredentialStore>,
    coordinator: Arc<RefreshCoordinator>,
    observer: Option<Arc<dyn SessionObserver>>,
}

impl PaddockClient {
    /// Create a new client builder
    pub fn builder() -> PaddockClientBuilder {
        PaddockClientBuilder::default()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Credential store shared with the session layer
    pub fn store(&self) -> &Arc<CredentialStore> {
        &self.store
    }

    /// Refresh coordinator owned by this client and its clones
    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.coordinator
    }

    fn resolve_url(&self, url: &str) -> String {
        if url.starts_with("http") {
            url.to_string()
        } else {
            format!("{}{}", self.base_url, url)
        }
    }

    /// Execute a request and decode the JSON body
    pub async fn execute<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ClientError> {
        let response = self.send(request).await?;
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            // Empty success bodies decode as `{}`, or as null for types that reject objects
            return serde_json::from_value(Value::Object(Map::new()))
                .or_else(|_| serde_json::from_value(Value::Null))
                .map_err(ClientError::from);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// GET a protected endpoint
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.execute(ApiRequest::get(path)).await
    }

    /// POST a JSON body to a protected endpoint
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(ApiRequest::post(path).json(body)?).await
    }

    /// Send a request through the interceptor pipeline.
    ///
    /// Non-success statuses become [`ClientError`]s; a recoverable 401 is
    /// refreshed and replayed before anything is returned.
    pub async fn send(&self, mut request: ApiRequest) -> Result<reqwest::Response, ClientError> {
        intercept(&mut request, &self.store);

        let response = self.dispatch(&request).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Self::check_status(response).await;
        }

        let error = ClientError::from_response(response).await;
        self.recover(request, error).await
    }

    /// Handle a 401 for `request`
    async fn recover(
        &self,
        mut request: ApiRequest,
        error: ClientError,
    ) -> Result<reqwest::Response, ClientError> {
        if is_no_refresh(&request_path(&request.url)) {
            debug!("401 on refresh-exempt path {}", request.url);
            return Err(error);
        }

        if request.is_retried() {
            debug!("401 on already retried request {}", request.url);
            return Err(error);
        }

        let Some(refresh_token) = self.store.refresh_token() else {
            // Exempt paths returned above, so this is always a protected endpoint
            self.force_logout();
            return Err(error);
        };

        // A refresh finished after this request went out
        if let Some(current) = self.store.access_token() {
            if request.sent_token() != Some(current.as_str()) && !self.coordinator.is_refreshing() {
                debug!("Replaying {} with the already renewed token", request.url);
                request.mark_retried();
                return self.replay(request, &current).await;
            }
        }

        match self.coordinator.acquire_or_wait() {
            RefreshTicket::Waiter(waiter) => {
                let token = waiter.wait().await.ok_or_else(|| {
                    ClientError::RefreshFailed(Box::new(error))
                })?;
                request.mark_retried();
                self.replay(request, &token).await
            }
            RefreshTicket::Leader(lease) => {
                request.mark_retried();

                // Another refresh settled between the check above and acquiring the lease
                if let Some(current) = self.store.access_token() {
                    if request.sent_token() != Some(current.as_str()) {
                        lease.complete(&current);
                        return self.replay(request, &current).await;
                    }
                }

                match self.renew(&refresh_token).await {
                    Ok(token) => {
                        lease.complete(&token);
                        self.replay(request, &token).await
                    }
                    Err(refresh_error) => {
                        lease.fail();
                        self.force_logout();
                        Err(ClientError::RefreshFailed(Box::new(refresh_error)))
                    }
                }
            }
        }
    }

    /// Call the refresh endpoint and persist the new access token
    async fn renew(&self, refresh_token: &str) -> Result<String, ClientError> {
        let response = self
            .anonymous
            .post(self.resolve_url(REFRESH_PATH))
            .json(&RefreshRequest {
                refresh_token: refresh_token.to_string(),
            })
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        let RefreshResponse { access_token } = response.json().await?;
        if access_token.is_empty() {
            return Err(ClientError::InvalidResponse(
                "refresh returned an empty access token".into(),
            ));
        }

        self.store.update_access_token(&access_token)?;
        info!("Access token renewed");
        Ok(access_token)
    }

    /// Re-send a request with an explicit token, skipping the interceptor
    async fn replay(
        &self,
        mut request: ApiRequest,
        token: &str,
    ) -> Result<reqwest::Response, ClientError> {
        request.set_bearer(token);
        let response = self.dispatch(&request).await?;
        Self::check_status(response).await
    }

    /// Clear stored credentials and tell the session layer
    fn force_logout(&self) {
        warn!("Session can no longer be renewed, logging out");
        match &self.observer {
            Some(observer) => observer.session_expired(LANDING_PATH),
            None => {
                if let Err(e) = self.store.clear() {
                    warn!("Failed to clear credentials: {e}");
                }
            }
        }
    }

    async fn dispatch(&self, request: &ApiRequest) -> Result<reqwest::Response, ClientError> {
        let transport = if request.with_credentials.unwrap_or(self.with_credentials) {
            &self.credentialed
        } else {
            &self.anonymous
        };

        let mut builder = transport
            .request(request.method.clone(), self.resolve_url(&request.url))
            .headers(request.headers.clone());
        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Multipart(form) => builder.multipart(form.to_form()?),
        };

        debug!("{} {}", request.method, request.url);
        Ok(builder.send().await?)
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(ClientError::from_response(response).await)
        }
    }
}

impl std::fmt::Debug for PaddockClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaddockClient")
            .field("base_url", &self.base_url)
            .field("with_credentials", &self.with_credentials)
            .finish_non_exhaustive()
    }
}

/// Builder for PaddockClient
#[derive(Default)]
pub struct PaddockClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    with_credentials: Option<bool>,
    store: Option<Arc<CredentialStore>>,
    observer: Option<Arc<dyn SessionObserver>>,
}

impl PaddockClientBuilder {
    /// Builder preset from loaded configuration
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::default()
            .base_url(&config.api_base_url)
            .timeout(config.timeout())
            .with_credentials(config.with_credentials)
            .user_agent(&config.user_agent)
    }

    /// Set the base URL
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Default cookie behaviour for requests that do not choose
    #[must_use]
    pub const fn with_credentials(mut self, enabled: bool) -> Self {
        self.with_credentials = Some(enabled);
        self
    }

    /// Credential store to read tokens from. Defaults to an in-memory store.
    #[must_use]
    pub fn store(mut self, store: Arc<CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Receiver of forced logouts
    #[must_use]
    pub fn observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    fn transport(&self, cookies: bool) -> Result<Client, ClientError> {
        let user_agent = self
            .user_agent
            .clone()
            .unwrap_or_else(|| concat!("paddock-client/", env!("CARGO_PKG_VERSION")).to_string());
        let mut builder = ClientBuilder::new().user_agent(user_agent);

        #[cfg(not(target_arch = "wasm32"))]
        {
            if let Some(timeout) = self.timeout {
                builder = builder.timeout(timeout);
            }
            builder = builder.cookie_store(cookies);
        }

        #[cfg(target_arch = "wasm32")]
        let _ = cookies; // The browser owns cookies on WASM

        Ok(builder.build()?)
    }

    /// Build the client
    pub fn build(self) -> Result<PaddockClient, ClientError> {
        let base_url = self
            .base_url
            .as_deref()
            .ok_or_else(|| ClientError::Configuration("base_url is required".into()))?
            .trim_end_matches('/')
            .to_string();
        if base_url.is_empty() {
            return Err(ClientError::Configuration("base_url is required".into()));
        }

        Ok(PaddockClient {
            credentialed: self.transport(true)?,
            anonymous: self.transport(false)?,
            base_url,
            with_credentials: self.with_credentials.unwrap_or(true),
            store: self
                .store
                .unwrap_or_else(|| Arc::new(CredentialStore::in_memory())),
            coordinator: Arc::new(RefreshCoordinator::new()),
            observer: self.observer,
        })
    }
}
