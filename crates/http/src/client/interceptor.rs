//! Outgoing request interception: credential injection and exemptions

use super::request::{ApiRequest, RequestBody};
use paddock_core::CredentialStore;
use reqwest::header::CONTENT_TYPE;
use std::borrow::Cow;
use tracing::debug;
use url::Url;

/// Endpoints called without any credential attached.
///
/// The backend serves account endpoints under both `/user` and `/users`.
pub const NO_AUTH_PATHS: &[&str] = &[
    "/user/login",
    "/user/signin",
    "/user/signup",
    "/user/refresh",
    "/users/login",
    "/users/signin",
    "/users/signup",
];

/// Endpoints whose 401 must never trigger a refresh or a forced logout
pub const NO_REFRESH_PATHS: &[&str] = &[
    "/user/login",
    "/user/signin",
    "/user/signup",
    "/user/refresh",
    "/users/login",
    "/users/signin",
    "/users/signup",
    "/user/password/reset-request",
    "/user/password/reset-confirm",
    "/users/password/reset-request",
    "/users/password/reset-confirm",
];

/// Path component of a relative path or absolute URL
pub fn request_path(url: &str) -> Cow<'_, str> {
    if url.starts_with("http") {
        if let Ok(parsed) = Url::parse(url) {
            return Cow::Owned(parsed.path().to_string());
        }
    }
    Cow::Borrowed(url)
}

fn matches_any(path: &str, prefixes: &[&str]) -> bool {
    prefixes.iter().any(|prefix| path.starts_with(prefix))
}

/// Whether `path` must be called without credentials
pub fn is_no_auth(path: &str) -> bool {
    matches_any(path, NO_AUTH_PATHS)
}

/// Whether a 401 on `path` must be passed through untouched
pub fn is_no_refresh(path: &str) -> bool {
    matches_any(path, NO_REFRESH_PATHS)
}

/// Prepare a request for sending.
///
/// Multipart bodies lose any explicit `Content-Type` so the transport can
/// add one with the boundary. No-auth endpoints lose `Authorization` and
/// default to sending no cookies. Everything else gets the stored bearer
/// token, if there is one.
pub fn intercept(request: &mut ApiRequest, store: &CredentialStore) {
    if matches!(request.body, RequestBody::Multipart(_)) {
        request.headers.remove(CONTENT_TYPE);
    }

    if is_no_auth(&request_path(&request.url)) {
        debug!("No-auth path {}, stripping credentials", request.url);
        request.clear_bearer();
        request.with_credentials.get_or_insert(false);
        return;
    }

    if let Some(token) = store.access_token() {
        request.set_bearer(&token);
    }
}
