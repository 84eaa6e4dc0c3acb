//! Password logic.

use std::sync::LazyLock;

use regex_lite::Regex;

use crate::domain::error::{DomainError, Result};

static PHC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\$([a-z0-9-]{1,32})(?:\$v=(\d+))?(?:\$([^$]+))?\$([^$]+)\$([^$]+)$",
    )
    .expect("PHC pattern is valid")
});

/// Value object of a plaintext password.
///
/// It only lives for the duration of a request and is never persisted nor
/// logged.
#[derive(Clone)]
pub struct Password(String);

impl Password {
    /// Maximum password length.
    pub const MAX_LENGTH: usize = 40;
    /// Minimum password length.
    pub const MIN_LENGTH: usize = 6;

    /// Create a new [`Password`] for account creation, checking its length.
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        let len = value.chars().count();

        if !(Self::MIN_LENGTH..=Self::MAX_LENGTH).contains(&len) {
            return Err(DomainError::InvalidLength {
                field: "password",
                min: Self::MIN_LENGTH,
                max: Self::MAX_LENGTH,
            });
        }

        Ok(Self(value))
    }

    /// Wrap a password presented on sign-in.
    ///
    /// Strength rules do not apply to a login attempt, only emptiness is
    /// refused.
    pub fn presented(value: impl Into<String>) -> Result<Self> {
        let value = value.into();

        if value.is_empty() {
            return Err(DomainError::InvalidLength {
                field: "password",
                min: 1,
                max: usize::MAX,
            });
        }

        Ok(Self(value))
    }

    /// Returns the same string as a string slice `&str`.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Password")
            .field("value", &"[REDACTED]")
            .finish()
    }
}

/// A hashed password stored in the database.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Converts a [`String`] into a valid [`PasswordHash`].
    ///
    /// # Errors
    ///
    /// Returns `Err` if the string is not in PHC format.
    pub fn parse(phc_string: impl Into<String>) -> Result<Self> {
        let phc_string = phc_string.into();
        if !PHC_RE.is_match(&phc_string) {
            return Err(DomainError::MalformedPasswordHash);
        }

        Ok(Self(phc_string))
    }

    /// Returns the same string as a string slice `&str`.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHash")
            .field("phc_string", &"[REDACTED]")
            .finish()
    }
}
