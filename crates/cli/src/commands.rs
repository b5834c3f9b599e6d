//! CLI commands

use crate::state_dir::StateDir;
use anyhow::{Context as _, Result, bail};
use clap::Subcommand;
use paddock_core::{
    ClientConfig, CredentialStore, FileStore, LoginRequest, MemoryStore, PasswordCriteria,
    SessionContext, SessionState, is_valid_email,
};
use paddock_http::{PaddockClient, PaddockClientBuilder, ProfileImage, SignupForm};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

const DEFAULT_LOCALE: &str = "en";

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in with a login id and password
    Login {
        /// Email or username
        #[arg(long)]
        id: String,

        #[arg(long)]
        password: String,

        /// Keep the session on disk for later invocations
        #[arg(long)]
        remember: bool,
    },

    /// Forget the stored session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Create an account
    Signup {
        #[arg(long)]
        username: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,

        #[arg(long)]
        country: String,

        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        /// Birth date as YYYY-MM-DD
        #[arg(long)]
        birth_date: String,

        /// Profile picture to upload
        #[arg(long)]
        image: Option<PathBuf>,

        #[arg(long)]
        favorite_team: Option<String>,

        #[arg(long)]
        favorite_driver: Option<String>,
    },

    /// Password reset by mail
    ResetPassword {
        #[command(subcommand)]
        command: ResetCommands,
    },

    /// GET an API path with the stored session and print the JSON body
    Get {
        /// Path relative to the API base URL, e.g. /users/me
        path: String,
    },
}

#[derive(Subcommand)]
pub enum ResetCommands {
    /// Send a reset mail
    Request {
        #[arg(long)]
        email: String,

        #[arg(long, default_value = DEFAULT_LOCALE)]
        locale: String,
    },

    /// Set a new password with the token from the mail
    Confirm {
        #[arg(long)]
        token: String,

        #[arg(long)]
        new_password: String,

        #[arg(long, default_value = DEFAULT_LOCALE)]
        locale: String,
    },
}

/// Client and session shared by every command
pub struct Context {
    client: PaddockClient,
    session: Arc<SessionContext>,
}

impl Context {
    /// Remembered sessions live in a file; others only in this process
    pub fn new(config: &ClientConfig, state_dir: Option<PathBuf>) -> Result<Self> {
        let path = StateDir::resolve(state_dir).credentials_path();
        info!("Remembered credentials at {}", path.display());

        let store = Arc::new(CredentialStore::new(
            Arc::new(FileStore::new(path)),
            Arc::new(MemoryStore::new()),
        ));
        let session = Arc::new(SessionContext::hydrated(store.clone()));
        let client = PaddockClientBuilder::from_config(config)
            .store(store)
            .observer(session.clone())
            .build()?;

        Ok(Self { client, session })
    }
}

impl Commands {
    /// Whether failures come from the login or signup forms and so map to `loginErrors.*` keys
    pub const fn uses_login_messages(&self) -> bool {
        matches!(self, Self::Login { .. } | Self::Signup { .. })
    }

    pub async fn execute(self, ctx: &Context) -> Result<()> {
        match self {
            Self::Login {
                id,
                password,
                remember,
            } => login(ctx, id, password, remember).await,
            Self::Logout => {
                ctx.session.logout()?;
                println!("Signed out");
                Ok(())
            }
            Self::Whoami => {
                whoami(&ctx.session);
                Ok(())
            }
            Self::Signup {
                username,
                email,
                password,
                country,
                first_name,
                last_name,
                birth_date,
                image,
                favorite_team,
                favorite_driver,
            } => {
                let form = SignupForm {
                    username,
                    email,
                    password,
                    country,
                    first_name,
                    last_name,
                    birth_date,
                    profile_image: image.as_deref().map(read_image).transpose()?,
                    favorite_team,
                    favorite_driver,
                };
                signup(ctx, &form).await
            }
            Self::ResetPassword { command } => command.execute(ctx).await,
            Self::Get { path } => {
                let body: Value = ctx.client.get_json(&path).await?;
                println!("{}", serde_json::to_string_pretty(&body)?);
                Ok(())
            }
        }
    }
}

impl ResetCommands {
    pub async fn execute(self, ctx: &Context) -> Result<()> {
        let reply = match self {
            Self::Request { email, locale } => {
                if !is_valid_email(email.trim()) {
                    bail!("{email} is not a valid email address");
                }
                ctx.client.request_password_reset(&email, &locale).await?
            }
            Self::Confirm {
                token,
                new_password,
                locale,
            } => {
                check_password(&new_password)?;
                ctx.client
                    .confirm_password_reset(&token, &new_password, &locale)
                    .await?
            }
        };

        println!("{}", reply.message.as_deref().unwrap_or("Done"));
        Ok(())
    }
}

async fn login(ctx: &Context, id: String, password: String, remember: bool) -> Result<()> {
    let request = LoginRequest {
        login_id: id.trim().to_string(),
        password,
    };
    let user = ctx.client.sign_in(&ctx.session, &request, remember).await?;

    println!("Signed in as {} ({})", user.username, user.email);
    if !remember {
        println!("Session not remembered; pass --remember to keep it for later commands");
    }
    Ok(())
}

fn whoami(session: &SessionContext) {
    match &*session.state() {
        SessionState::Authenticated(user) => {
            println!("{} <{}>", user.username, user.email);
            println!("role: {}", user.role);
            if !user.country.is_empty() {
                println!("country: {}", user.country);
            }
        }
        SessionState::Loading | SessionState::Unauthenticated => println!("Not signed in"),
    }
}

async fn signup(ctx: &Context, form: &SignupForm) -> Result<()> {
    if !is_valid_email(&form.email) {
        bail!("{} is not a valid email address", form.email);
    }
    check_password(&form.password)?;

    let created = ctx.client.signup(form).await?;
    info!("Signup response: {created}");
    println!("Account {} created", form.username);
    Ok(())
}

fn check_password(password: &str) -> Result<()> {
    let criteria = PasswordCriteria::evaluate(password);
    if !criteria.is_satisfied() {
        bail!(
            "password does not meet the requirements: {}",
            criteria.unmet().join(", ")
        );
    }
    Ok(())
}

fn read_image(path: &Path) -> Result<ProfileImage> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map_or_else(|| "profile".to_string(), |name| name.to_string_lossy().into_owned());

    Ok(ProfileImage {
        mime: image_mime(path).map(str::to_string),
        file_name,
        bytes,
    })
}

fn image_mime(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}
