//! Paddock client core: credential storage, session state and error normalization

pub mod config;
pub mod credentials;
pub mod error;
pub mod error_info;
#[cfg(feature = "tracing-init")]
pub mod logging;
pub mod session;
pub mod storage;
pub mod types;
pub mod validation;

pub use config::ClientConfig;
pub use credentials::CredentialStore;
pub use error::{CoreError, CoreResult};
pub use error_info::{ErrorInfo, login_message_key};
pub use session::{LANDING_PATH, SessionContext, SessionObserver, SessionState};
pub use storage::{FileStore, MemoryStore, SessionStore, StorageScope};
pub use types::{AuthUser, Credentials, LoginRequest, LoginResponse};
pub use validation::{PasswordCriteria, is_valid_email};
