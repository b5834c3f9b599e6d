//! Client-side checks for the sign-in, sign-up and reset forms

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static LENGTH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^.{8,30}$").expect("valid regex"));
static UPPERCASE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Z]").expect("valid regex"));
static LOWERCASE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-z]").expect("valid regex"));
static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d").expect("valid regex"));
static SPECIAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"[!@#%^&+=-]").expect("valid regex"));
static EMAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S+@\S+\.\S+").expect("valid regex"));

/// Which password rules a candidate satisfies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordCriteria {
    /// 8 to 30 characters
    pub length: bool,
    pub uppercase: bool,
    pub lowercase: bool,
    pub number: bool,
    /// One of `! @ # % ^ & + = -`
    pub special: bool,
}

impl PasswordCriteria {
    /// Evaluate every rule against `password`
    pub fn evaluate(password: &str) -> Self {
        Self {
            length: LENGTH.is_match(password),
            uppercase: UPPERCASE.is_match(password),
            lowercase: LOWERCASE.is_match(password),
            number: NUMBER.is_match(password),
            special: SPECIAL.is_match(password),
        }
    }

    /// All rules pass
    pub const fn is_satisfied(&self) -> bool {
        self.length && self.uppercase && self.lowercase && self.number && self.special
    }

    /// Names of the rules that fail, in display order
    pub fn unmet(&self) -> Vec<&'static str> {
        [
            ("length", self.length),
            ("uppercase", self.uppercase),
            ("lowercase", self.lowercase),
            ("number", self.number),
            ("special", self.special),
        ]
        .into_iter()
        .filter_map(|(name, ok)| (!ok).then_some(name))
        .collect()
    }
}

/// Loose `something@domain.tld` check used before calling the backend
pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strong_password() {
        let criteria = PasswordCriteria::evaluate("Monza#2024");
        assert!(criteria.is_satisfied());
        assert!(criteria.unmet().is_empty());
    }

    #[test]
    fn test_each_rule_reported() {
        let criteria = PasswordCriteria::evaluate("short");
        assert!(!criteria.length);
        assert!(!criteria.uppercase);
        assert!(criteria.lowercase);
        assert!(!criteria.number);
        assert!(!criteria.special);
        assert_eq!(
            criteria.unmet(),
            vec!["length", "uppercase", "number", "special"]
        );
    }

    #[test]
    fn test_length_bounds() {
        assert!(!PasswordCriteria::evaluate("Aa1#567").length);
        assert!(PasswordCriteria::evaluate("Aa1#5678").length);
        assert!(PasswordCriteria::evaluate(&"a".repeat(30)).length);
        assert!(!PasswordCriteria::evaluate(&"a".repeat(31)).length);
    }

    #[test]
    fn test_special_set_is_restricted() {
        assert!(!PasswordCriteria::evaluate("Password1$").special);
        assert!(PasswordCriteria::evaluate("Password1-").special);
    }

    #[test]
    fn test_email() {
        assert!(is_valid_email("a@b.com"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("not an email"));
    }
}
