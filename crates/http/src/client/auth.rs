//! Account API client methods: login, signup and password reset

use super::error::ErrorBody;
use super::request::{ApiRequest, MultipartForm};
use super::{ClientError, PaddockClient};
use paddock_core::types::{ApiMessage, PasswordResetConfirm, PasswordResetRequest};
use paddock_core::{AuthUser, LoginRequest, LoginResponse, SessionContext};
use serde_json::Value;
use tracing::info;

pub const LOGIN_PATH: &str = "/users/login";
pub const SIGNUP_PATH: &str = "/users/signup";
pub const RESET_REQUEST_PATH: &str = "/users/password/reset-request";
pub const RESET_CONFIRM_PATH: &str = "/users/password/reset-confirm";

/// Profile picture attached to a signup
#[derive(Debug, Clone)]
pub struct ProfileImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub mime: Option<String>,
}

/// Fields of the signup form
#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub country: String,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: String,
    pub profile_image: Option<ProfileImage>,
    pub favorite_team: Option<String>,
    pub favorite_driver: Option<String>,
}

impl SignupForm {
    /// Encode as the multipart body the backend expects
    pub fn to_multipart(&self) -> MultipartForm {
        let mut form = MultipartForm::new()
            .text("username", &self.username)
            .text("email", &self.email)
            .text("password", &self.password)
            .text("country", &self.country)
            .text("firstName", &self.first_name)
            .text("lastName", &self.last_name)
            .text("birthDate", &self.birth_date);

        if let Some(image) = &self.profile_image {
            form = form.file(
                "profileImage",
                &image.file_name,
                image.bytes.clone(),
                image.mime.clone(),
            );
        }

        form.text("favoriteTeam", self.favorite_team.clone().unwrap_or_default())
            .text(
                "favoriteDriver",
                self.favorite_driver.clone().unwrap_or_default(),
            )
    }
}

fn localized(request: ApiRequest, locale: &str) -> Result<ApiRequest, ClientError> {
    request
        .with_credentials(false)
        .header("Accept-Language", locale)?
        .header("Content-Type", "application/json")
}

// Keys a successful login must carry
const USER_FIELD: &str = "user";
const ACCESS_TOKEN_FIELD: &str = "accessToken";

/// Turn a 2xx login payload into a session or the error it describes.
///
/// The backend sometimes answers 200 with a bare `{code, message}`; that
/// payload is kept so the code still maps to a translation key.
fn decode_login(payload: Value) -> Result<LoginResponse, ClientError> {
    if !payload.get(USER_FIELD).is_some_and(Value::is_object) {
        return Err(ClientError::LoginRejected(ErrorBody(payload)));
    }

    let has_token = payload
        .get(ACCESS_TOKEN_FIELD)
        .and_then(Value::as_str)
        .is_some_and(|token| !token.is_empty());
    let response: LoginResponse = serde_json::from_value(payload.clone())?;

    if !has_token {
        if response.user.is_admin() {
            return Err(ClientError::AdminTokenRequired);
        }
        return Err(ClientError::LoginRejected(ErrorBody(payload)));
    }
    Ok(response)
}

impl PaddockClient {
    /// Exchange a login id and password for tokens.
    ///
    /// Replies without a user or access token are errors, even on 2xx.
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ClientError> {
        let req = ApiRequest::post(LOGIN_PATH)
            .json(request)?
            .with_credentials(false);
        decode_login(self.execute(req).await?)
    }

    /// Log in and record the session
    pub async fn sign_in(
        &self,
        session: &SessionContext,
        request: &LoginRequest,
        remember: bool,
    ) -> Result<AuthUser, ClientError> {
        let response = self.login(request).await?;

        let user = response.user.clone();
        session.login(
            response.user,
            response.access_token,
            response.refresh_token,
            remember,
        )?;
        info!("Signed in as {}", user.username);
        Ok(user)
    }

    /// Create an account
    pub async fn signup(&self, form: &SignupForm) -> Result<Value, ClientError> {
        let req = ApiRequest::post(SIGNUP_PATH)
            .multipart(form.to_multipart())
            .with_credentials(true);
        self.execute(req).await
    }

    /// Ask for a password reset mail, localized for `locale`
    pub async fn request_password_reset(
        &self,
        email: &str,
        locale: &str,
    ) -> Result<ApiMessage, ClientError> {
        let req = ApiRequest::post(RESET_REQUEST_PATH).json(&PasswordResetRequest {
            email: email.trim().to_string(),
        })?;
        self.execute(localized(req, locale)?).await
    }

    /// Set a new password using the token from the reset mail
    pub async fn confirm_password_reset(
        &self,
        token: &str,
        new_password: &str,
        locale: &str,
    ) -> Result<ApiMessage, ClientError> {
        let req = ApiRequest::post(RESET_CONFIRM_PATH).json(&PasswordResetConfirm {
            token: token.to_string(),
            new_password: new_password.to_string(),
        })?;
        self.execute(localized(req, locale)?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_signup_form_fields() {
        let form = SignupForm {
            username: "charles".to_string(),
            email: "charles@example.com".to_string(),
            password: "Monaco#16".to_string(),
            country: "MC".to_string(),
            first_name: "Charles".to_string(),
            last_name: "Leclerc".to_string(),
            birth_date: "1997-10-16".to_string(),
            favorite_team: Some("Ferrari".to_string()),
            ..SignupForm::default()
        }
        .to_multipart();

        assert_eq!(
            form.field_names().collect::<Vec<_>>(),
            vec![
                "username",
                "email",
                "password",
                "country",
                "firstName",
                "lastName",
                "birthDate",
                "favoriteTeam",
                "favoriteDriver",
            ]
        );
        assert_eq!(form.text_value("favoriteTeam"), Some("Ferrari"));
        assert_eq!(form.text_value("favoriteDriver"), Some(""));
    }

    #[test]
    fn test_decode_login_without_user_keeps_payload() {
        let error = decode_login(json!({"code": "USER_NOT_FOUND", "message": "no user"})).unwrap_err();

        assert!(matches!(error, ClientError::LoginRejected(_)));
        assert_eq!(error.error_info().code.as_deref(), Some("USER_NOT_FOUND"));
    }

    #[test]
    fn test_decode_login_without_token() {
        let user = json!({"id": 1, "name": "Max", "username": "max", "email": "m@x.nl", "role": "USER"});
        let error = decode_login(json!({"user": user.clone(), "code": "INVALID_PASSWORD"})).unwrap_err();
        assert_eq!(error.error_info().code.as_deref(), Some("INVALID_PASSWORD"));

        let mut admin = user;
        admin["role"] = json!("ADMIN");
        let error = decode_login(json!({"user": admin, "accessToken": ""})).unwrap_err();
        assert!(matches!(error, ClientError::AdminTokenRequired));
    }

    #[test]
    fn test_decode_login_success() {
        let response = decode_login(json!({
            "user": {"id": 1, "name": "Max", "username": "max", "email": "m@x.nl", "role": "USER"},
            "accessToken": "a",
            "refreshToken": "r"
        }))
        .unwrap();
        assert_eq!(response.access_token, "a");
        assert_eq!(response.user.username, "max");
    }

    #[test]
    fn test_signup_form_includes_image() {
        let form = SignupForm {
            profile_image: Some(ProfileImage {
                file_name: "me.png".to_string(),
                bytes: vec![0x89, 0x50],
                mime: Some("image/png".to_string()),
            }),
            ..SignupForm::default()
        }
        .to_multipart();

        assert!(form.field_names().any(|name| name == "profileImage"));
        assert_eq!(form.text_value("profileImage"), None);
    }
}
