use serde::Deserialize;
use thiserror::Error;

pub const ACCOUNT_CREATED_MESSAGE: &str = "Account created successfully!";

/// Sign-up form as submitted by the client
#[derive(Debug, Clone, Deserialize)]
pub struct AccountForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

/// Reasons a sign-up form is rejected
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccountError {
    #[error("Passwords do not match!")]
    PasswordMismatch,
    #[error("Please enter a username.")]
    MissingUsername,
}

/// Checks a sign-up form. Nothing is stored.
///
/// Password mismatch is reported before a missing username.
pub fn validate_account(form: &AccountForm) -> Result<String, AccountError> {
    if form.password != form.confirm_password {
        return Err(AccountError::PasswordMismatch);
    }

    let username = form.username.trim();
    if username.is_empty() {
        return Err(AccountError::MissingUsername);
    }

    Ok(username.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(username: &str, password: &str, confirm_password: &str) -> AccountForm {
        AccountForm {
            username: username.to_string(),
            password: password.to_string(),
            confirm_password: confirm_password.to_string(),
        }
    }

    #[test]
    fn test_valid_form() {
        assert_eq!(validate_account(&form(" neo ", "redpill", "redpill")), Ok("neo".to_string()));
    }

    #[test]
    fn test_password_mismatch() {
        assert_eq!(
            validate_account(&form("neo", "redpill", "bluepill")),
            Err(AccountError::PasswordMismatch)
        );
    }

    #[test]
    fn test_mismatch_reported_before_missing_username() {
        assert_eq!(
            validate_account(&form("", "a", "b")),
            Err(AccountError::PasswordMismatch)
        );
    }

    #[test]
    fn test_missing_username() {
        assert_eq!(
            validate_account(&form("   ", "redpill", "redpill")),
            Err(AccountError::MissingUsername)
        );
        assert_eq!(AccountError::MissingUsername.to_string(), "Please enter a username.");
    }
}
