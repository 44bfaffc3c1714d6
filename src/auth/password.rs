//! Argon2id hashing and the input rules applied at signup.

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand::rngs::OsRng;

const PASSWORD_MIN: usize = 8;
const PASSWORD_MAX: usize = 128;
const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 50;

/// Hash a password with Argon2id and a fresh random salt.
///
/// # Errors
///
/// Returns an error if hashing fails.
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| anyhow::anyhow!("password hashing failed: {e}"))
}

/// Check a password against a stored hash. A mismatch is `Ok(false)`, not an
/// error.
///
/// # Errors
///
/// Returns an error only when the stored hash itself cannot be parsed.
pub fn verify_password(password: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| anyhow::anyhow!("bad password hash: {e}"))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Length rules for new passwords.
///
/// # Errors
///
/// Returns the message to surface to the caller when a rule is violated.
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.len() < PASSWORD_MIN {
        return Err(format!(
            "Password must be at least {PASSWORD_MIN} characters."
        ));
    }
    if password.len() > PASSWORD_MAX {
        return Err(format!("Password must be at most {PASSWORD_MAX} characters."));
    }
    Ok(())
}

/// Minimal shape check for an email address: one `@`, a non-empty local part,
/// and a domain containing a dot. Real verification happens out of band.
///
/// # Errors
///
/// Returns the message to surface to the caller when the shape is wrong.
pub fn validate_email(email: &str) -> Result<(), String> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Err("Email is required.".to_string());
    }
    match trimmed.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err("Invalid email format.".to_string()),
    }
}

/// Usernames: 3-50 characters, letters/digits/underscores only.
///
/// # Errors
///
/// Returns the message to surface to the caller when a rule is violated.
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.len() < USERNAME_MIN {
        return Err(format!(
            "Username must be at least {USERNAME_MIN} characters."
        ));
    }
    if username.len() > USERNAME_MAX {
        return Err(format!("Username must be at most {USERNAME_MAX} characters."));
    }
    if !username.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err("Username may only contain letters, numbers, and underscores.".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify() {
        let hash = hash_password("correct horse battery").unwrap_or_default();
        assert!(verify_password("correct horse battery", &hash).unwrap_or(false));
        assert!(!verify_password("wrong password", &hash).unwrap_or(true));
    }

    #[test]
    fn password_rules() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("long enough").is_ok());
    }

    #[test]
    fn email_rules() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("user@nodot").is_err());
        assert!(validate_email("@example.com").is_err());
    }

    #[test]
    fn username_rules() {
        assert!(validate_username("player_one").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("bad name").is_err());
    }
}
