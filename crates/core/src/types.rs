//! Wire types shared by the session layer and the HTTP client

use serde::{Deserialize, Serialize};

/// Role value the backend assigns to administrators
pub const ADMIN_ROLE: &str = "ADMIN";

/// Authenticated user profile as returned by the login endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: i64,
    pub name: String,
    pub username: String,
    pub email: String,
    pub role: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    /// Base64 encoded profile picture, if the user uploaded one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image_base64: Option<String>,
}

impl AuthUser {
    /// Whether this user carries the administrator role
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }
}

/// A complete stored credential record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: AuthUser,
    pub access_token: String,
    pub refresh_token: String,
}

/// Body of `POST /users/login`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub login_id: String,
    pub password: String,
}

/// Successful login payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: AuthUser,
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
}

impl LoginResponse {
    /// Convert into a credential record
    pub fn into_credentials(self) -> Credentials {
        Credentials {
            user: self.user,
            access_token: self.access_token,
            refresh_token: self.refresh_token,
        }
    }
}

/// Body of `POST /user/refresh`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Response of `POST /user/refresh`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
}

/// Body of `POST /users/password/reset-request`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

/// Body of `POST /users/password/reset-confirm`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordResetConfirm {
    pub token: String,
    pub new_password: String,
}

/// Plain `{message}` acknowledgement
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_auth_user_uses_camel_case() {
        let user: AuthUser = serde_json::from_value(json!({
            "id": 7,
            "name": "Kimi",
            "username": "iceman",
            "email": "kimi@example.com",
            "role": "ADMIN",
            "country": "FI",
            "createdAt": "2024-03-01T10:00:00",
            "updatedAt": "2024-03-02T10:00:00"
        }))
        .unwrap();

        assert!(user.is_admin());
        assert_eq!(user.created_at, "2024-03-01T10:00:00");
        assert!(user.profile_image_base64.is_none());

        let value = serde_json::to_value(&user).unwrap();
        assert!(value.get("profileImageBase64").is_none());
        assert_eq!(value["updatedAt"], "2024-03-02T10:00:00");
    }

    #[test]
    fn test_login_request_field_names() {
        let request = LoginRequest {
            login_id: "a@b.com".to_string(),
            password: "x".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"loginId": "a@b.com", "password": "x"})
        );
    }
}
