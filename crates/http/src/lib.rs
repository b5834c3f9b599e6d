//! Paddock HTTP client
//!
//! Wraps `reqwest` with the session rules of the Paddock web front-end:
//! bearer injection, no-auth endpoints, and single-flight token refresh
//! on 401.

pub mod client;

pub use client::auth::{ProfileImage, SignupForm};
pub use client::error::{ClientError, ErrorBody};
pub use client::refresh::RefreshCoordinator;
pub use client::request::{ApiRequest, MultipartForm, RequestBody};
pub use client::{PaddockClient, PaddockClientBuilder};
