//! Validation Utilities
//!
//! Structural rules for registration credentials. Everything here is pure:
//! no store access, no clock, no I/O.

use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use crate::config::ValidationConfig;
use crate::models::Credentials;
use crate::utils::security::MAX_PASSWORD_BYTES;

/// Validates email address format
pub fn validate_email(email: &str) -> bool {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    regex.is_match(email)
}

/// Normalizes email address to lowercase and removes whitespace
///
/// Emails are stored and looked up in this form, which makes the
/// one-account-per-email rule case-insensitive.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// A single rule broken by a single field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: String,
}

/// Non-empty collection of field violations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violations(Vec<FieldViolation>);

impl Violations {
    pub fn iter(&self) -> impl Iterator<Item = &FieldViolation> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether any violation concerns `field`
    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|v| v.field == field)
    }

    /// Messages for one field, in the order they were found
    pub fn messages_for(&self, field: &str) -> Vec<&str> {
        self.0
            .iter()
            .filter(|v| v.field == field)
            .map(|v| v.message.as_str())
            .collect()
    }

    /// Field name to messages, for error response details
    pub fn to_details(&self) -> serde_json::Value {
        let mut grouped: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for violation in &self.0 {
            grouped
                .entry(violation.field)
                .or_default()
                .push(violation.message.as_str());
        }
        serde_json::json!(grouped)
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|v| format!("{}: {}", v.field, v.message))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// `Ok(())` when the credentials are accepted
pub type ValidationResult = Result<(), Violations>;

/// Enforces email, username and password rules at registration time
#[derive(Debug, Clone)]
pub struct CredentialValidator {
    config: ValidationConfig,
}

impl Default for CredentialValidator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}

impl CredentialValidator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Check every rule and report all violations at once
    pub fn validate(&self, credentials: &Credentials) -> ValidationResult {
        let mut found = Vec::new();

        self.check_email(&credentials.email, &mut found);
        self.check_username(&credentials.username, &mut found);
        self.check_password(&credentials.password, &mut found);

        if found.is_empty() {
            Ok(())
        } else {
            Err(Violations(found))
        }
    }

    fn check_email(&self, email: &str, found: &mut Vec<FieldViolation>) {
        if !validate_email(email.trim()) {
            push(found, "email", messages::INVALID_EMAIL.to_string());
        }
    }

    fn check_username(&self, username: &str, found: &mut Vec<FieldViolation>) {
        let cfg = &self.config;

        if username.trim() != username {
            push(found, "username", messages::USERNAME_WHITESPACE.to_string());
        }

        let trimmed = username.trim();
        let length = trimmed.chars().count();
        if length < cfg.username_min_length {
            push(
                found,
                "username",
                format!("must be at least {} characters", cfg.username_min_length),
            );
        } else if length > cfg.username_max_length {
            push(
                found,
                "username",
                format!("must be at most {} characters", cfg.username_max_length),
            );
        }

        let allowed = |c: char| {
            c.is_ascii_alphanumeric() || cfg.username_allowed_punctuation.contains(c)
        };
        if !trimmed.chars().all(allowed) {
            push(
                found,
                "username",
                format!(
                    "may only contain letters, digits and {}",
                    describe_punctuation(&cfg.username_allowed_punctuation)
                ),
            );
        }
    }

    fn check_password(&self, password: &str, found: &mut Vec<FieldViolation>) {
        let cfg = &self.config;
        let length = password.chars().count();

        if length < cfg.password_min_length {
            push(
                found,
                "password",
                format!("must be at least {} characters", cfg.password_min_length),
            );
        } else if length > cfg.password_max_length {
            push(
                found,
                "password",
                format!("must be at most {} characters", cfg.password_max_length),
            );
        } else if password.len() > MAX_PASSWORD_BYTES {
            push(
                found,
                "password",
                format!("must be at most {} bytes", MAX_PASSWORD_BYTES),
            );
        }

        if cfg.password_require_uppercase && !password.chars().any(|c| c.is_uppercase()) {
            push(found, "password", messages::PASSWORD_UPPERCASE.to_string());
        }
        if cfg.password_require_lowercase && !password.chars().any(|c| c.is_lowercase()) {
            push(found, "password", messages::PASSWORD_LOWERCASE.to_string());
        }
        if cfg.password_require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
            push(found, "password", messages::PASSWORD_DIGIT.to_string());
        }
    }
}

fn push(found: &mut Vec<FieldViolation>, field: &'static str, message: String) {
    found.push(FieldViolation { field, message });
}

fn describe_punctuation(punctuation: &str) -> String {
    if punctuation.is_empty() {
        return "no punctuation".to_string();
    }
    punctuation
        .chars()
        .map(|c| format!("'{}'", c))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Validation error messages for user-friendly responses
pub mod messages {
    pub const INVALID_EMAIL: &str = "not a valid address";
    pub const USERNAME_WHITESPACE: &str = "must not start or end with whitespace";
    pub const PASSWORD_UPPERCASE: &str = "must contain an uppercase letter";
    pub const PASSWORD_LOWERCASE: &str = "must contain a lowercase letter";
    pub const PASSWORD_DIGIT: &str = "must contain a digit";
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials(email: &str, username: &str, password: &str) -> Credentials {
        Credentials {
            email: email.to_string(),
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com"));
        assert!(validate_email("test.user+tag@domain.co.uk"));
        assert!(!validate_email("invalid.email"));
        assert!(!validate_email("@domain.com"));
        assert!(!validate_email("user@"));
        assert!(!validate_email("user@domain.c"));
        assert!(!validate_email(""));
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  USER@EXAMPLE.COM  "), "user@example.com");
        assert_eq!(normalize_email("Test@Domain.org"), "test@domain.org");
    }

    #[test]
    fn test_valid_credentials_accepted() {
        let validator = CredentialValidator::default();
        let result = validator.validate(&credentials("a@x.com", "alice", "Abcdef12"));
        assert!(result.is_ok());
    }

    #[test]
    fn test_short_password_lists_every_violation() {
        let validator = CredentialValidator::default();
        let violations = validator
            .validate(&credentials("a@x.com", "alice", "abc"))
            .unwrap_err();

        assert!(!violations.has_field("email"));
        assert!(!violations.has_field("username"));

        let messages = violations.messages_for("password");
        assert_eq!(messages.len(), 3);
        assert!(messages.contains(&"must be at least 8 characters"));
        assert!(messages.contains(&messages::PASSWORD_UPPERCASE));
        assert!(messages.contains(&messages::PASSWORD_DIGIT));
    }

    #[test]
    fn test_password_complexity_is_configurable() {
        let config = ValidationConfig {
            password_min_length: 3,
            password_require_uppercase: false,
            password_require_digit: false,
            ..ValidationConfig::default()
        };
        let validator = CredentialValidator::new(config);
        assert!(validator
            .validate(&credentials("a@x.com", "alice", "abc"))
            .is_ok());
    }

    #[test]
    fn test_password_upper_bound() {
        let validator = CredentialValidator::default();
        let long = format!("Aa1{}", "x".repeat(70));
        let violations = validator
            .validate(&credentials("a@x.com", "alice", &long))
            .unwrap_err();
        assert_eq!(
            violations.messages_for("password"),
            vec!["must be at most 72 characters"]
        );

        let at_limit = format!("Aa1{}", "x".repeat(69));
        assert!(validator
            .validate(&credentials("a@x.com", "alice", &at_limit))
            .is_ok());
    }

    #[test]
    fn test_password_byte_limit() {
        let validator = CredentialValidator::default();
        // 38 characters, 73 bytes
        let wide = format!("Aa1{}", "é".repeat(35));
        let violations = validator
            .validate(&credentials("a@x.com", "alice", &wide))
            .unwrap_err();
        assert_eq!(
            violations.messages_for("password"),
            vec!["must be at most 72 bytes"]
        );
    }

    #[test]
    fn test_username_rules() {
        let validator = CredentialValidator::default();

        assert!(validator
            .validate(&credentials("a@x.com", "alice_99", "Abcdef12"))
            .is_ok());

        let too_short = validator
            .validate(&credentials("a@x.com", "al", "Abcdef12"))
            .unwrap_err();
        assert_eq!(
            too_short.messages_for("username"),
            vec!["must be at least 3 characters"]
        );

        let too_long = validator
            .validate(&credentials("a@x.com", &"a".repeat(51), "Abcdef12"))
            .unwrap_err();
        assert!(too_long.has_field("username"));

        let bad_chars = validator
            .validate(&credentials("a@x.com", "alice!", "Abcdef12"))
            .unwrap_err();
        assert_eq!(bad_chars.messages_for("username").len(), 1);

        let padded = validator
            .validate(&credentials("a@x.com", " alice ", "Abcdef12"))
            .unwrap_err();
        assert_eq!(
            padded.messages_for("username"),
            vec![messages::USERNAME_WHITESPACE]
        );
    }

    #[test]
    fn test_username_punctuation_is_configurable() {
        let config = ValidationConfig {
            username_allowed_punctuation: "_.-".to_string(),
            ..ValidationConfig::default()
        };
        let validator = CredentialValidator::new(config);
        assert!(validator
            .validate(&credentials("a@x.com", "alice.smith-1", "Abcdef12"))
            .is_ok());
    }

    #[test]
    fn test_invalid_email_reported() {
        let validator = CredentialValidator::default();
        let violations = validator
            .validate(&credentials("not-an-email", "alice", "Abcdef12"))
            .unwrap_err();
        assert_eq!(violations.len(), 1);
        assert_eq!(
            violations.messages_for("email"),
            vec![messages::INVALID_EMAIL]
        );
    }

    #[test]
    fn test_violation_details_and_display() {
        let validator = CredentialValidator::default();
        let violations = validator
            .validate(&credentials("bad", "alice", "abcdefgh"))
            .unwrap_err();

        let details = violations.to_details();
        assert_eq!(details["email"][0], messages::INVALID_EMAIL);
        assert_eq!(details["password"].as_array().unwrap().len(), 2);

        let text = violations.to_string();
        assert!(text.starts_with("email: not a valid address"));
        assert!(text.contains("password: must contain a digit"));
    }
}
