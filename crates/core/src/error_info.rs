//! Canonical `{code, message}` extraction from backend error payloads
//!
//! Error bodies differ between endpoints and locales. Everything the UI
//! shows goes through [`ErrorInfo::from_payload`], which first tries the
//! well-formed shape and then scans a fixed list of key aliases.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keys searched for an error code, in priority order
pub const CODE_KEYS: &[&str] = &["code", "errorCode", "error_code", "에러코드", "코드"];

/// Keys searched for an error message, in priority order
pub const MESSAGE_KEYS: &[&str] = &[
    "message",
    "errorMessage",
    "error_message",
    "메시지",
    "사유",
];

/// Login error codes that have a dedicated translation
const LOGIN_ERROR_CODES: &[&str] = &[
    "INCORRECT_PASSWORD",
    "INVALID_PASSWORD",
    "USER_NOT_FOUND",
    "EMAIL_ALREADY_EXISTS",
    "FILE_SIZE_EXCEEDED",
];

/// Translation key used when no login error code matches
pub const GENERIC_LOGIN_ERROR_KEY: &str = "loginErrors.genericError";

/// Normalized error shape handed to the UI layer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// The shape well-behaved endpoints return
#[derive(Deserialize)]
struct CanonicalError {
    code: String,
    message: String,
}

impl ErrorInfo {
    /// Normalize an arbitrary payload. Never fails; non-objects yield an empty info.
    pub fn from_payload(raw: &Value) -> Self {
        let Value::Object(object) = raw else {
            return Self::default();
        };

        if let Ok(canonical) = CanonicalError::deserialize(raw) {
            return Self {
                code: Some(canonical.code),
                message: Some(canonical.message),
            };
        }

        Self {
            code: first_string(object, CODE_KEYS),
            message: first_string(object, MESSAGE_KEYS),
        }
    }

    /// True when neither field was found
    pub fn is_empty(&self) -> bool {
        self.code.is_none() && self.message.is_none()
    }

    /// The message, or the given fallback text
    pub fn message_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.message.as_deref().unwrap_or(fallback)
    }
}

fn first_string(object: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| object.get(*key).and_then(Value::as_str))
        .map(str::to_owned)
}

/// Map a login error code to its translation key.
///
/// Server supplied messages are not shown for login failures so the
/// wording always matches the active locale.
pub fn login_message_key(code: Option<&str>) -> String {
    match code {
        Some(code) if LOGIN_ERROR_CODES.contains(&code) => format!("loginErrors.{code}"),
        _ => GENERIC_LOGIN_ERROR_KEY.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_non_objects_are_empty() {
        for raw in [
            json!(null),
            json!("boom"),
            json!(401),
            json!(true),
            json!(["code", "X"]),
        ] {
            assert_eq!(ErrorInfo::from_payload(&raw), ErrorInfo::default());
        }
    }

    #[test]
    fn test_canonical_shape() {
        let info = ErrorInfo::from_payload(&json!({
            "code": "USER_NOT_FOUND",
            "message": "no such user",
            "status": 404
        }));
        assert_eq!(info.code.as_deref(), Some("USER_NOT_FOUND"));
        assert_eq!(info.message.as_deref(), Some("no such user"));
    }

    #[test]
    fn test_aliases_are_found() {
        let info = ErrorInfo::from_payload(&json!({
            "error_code": "E42",
            "errorMessage": "bad things"
        }));
        assert_eq!(info.code.as_deref(), Some("E42"));
        assert_eq!(info.message.as_deref(), Some("bad things"));

        let info = ErrorInfo::from_payload(&json!({"에러코드": "DUP", "사유": "중복"}));
        assert_eq!(info.code.as_deref(), Some("DUP"));
        assert_eq!(info.message.as_deref(), Some("중복"));
    }

    #[test]
    fn test_first_key_in_priority_order_wins() {
        let info = ErrorInfo::from_payload(&json!({
            "코드": "LAST",
            "error_code": "THIRD",
            "errorCode": "SECOND"
        }));
        assert_eq!(info.code.as_deref(), Some("SECOND"));
    }

    #[test]
    fn test_message_without_code_keeps_scanning_codes() {
        let info = ErrorInfo::from_payload(&json!({
            "message": "only a message",
            "errorCode": "E1"
        }));
        assert_eq!(info.code.as_deref(), Some("E1"));
        assert_eq!(info.message.as_deref(), Some("only a message"));
    }

    #[test]
    fn test_non_string_values_are_skipped() {
        let info = ErrorInfo::from_payload(&json!({
            "code": 500,
            "errorCode": "STRING_CODE",
            "message": {"nested": true}
        }));
        assert_eq!(info.code.as_deref(), Some("STRING_CODE"));
        assert_eq!(info.message, None);
        assert_eq!(info.message_or("generic"), "generic");
    }

    #[test]
    fn test_empty_object() {
        let info = ErrorInfo::from_payload(&json!({}));
        assert!(info.is_empty());
    }

    #[test]
    fn test_login_message_key() {
        assert_eq!(
            login_message_key(Some("INCORRECT_PASSWORD")),
            "loginErrors.INCORRECT_PASSWORD"
        );
        assert_eq!(
            login_message_key(Some("FILE_SIZE_EXCEEDED")),
            "loginErrors.FILE_SIZE_EXCEEDED"
        );
        assert_eq!(login_message_key(Some("SOMETHING_ELSE")), GENERIC_LOGIN_ERROR_KEY);
        assert_eq!(login_message_key(None), GENERIC_LOGIN_ERROR_KEY);
    }
}
