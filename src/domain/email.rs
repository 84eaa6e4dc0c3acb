//! Email logic management.

use std::fmt;

use crate::domain::error::{DomainError, Result};

/// Value object of a valid email address.
///
/// The address is kept exactly as supplied: no case folding or trimming is
/// applied, callers decide on normalization and must apply it consistently.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Maximum email length.
    pub const MAX_LENGTH: usize = 50;

    /// Converts a [`String`] into a valid [`EmailAddress`].
    ///
    /// # Errors
    ///
    /// Returns `Err` if the string does not hold exactly one `@` between a
    /// non-empty local part and a non-empty domain, carries surrounding
    /// whitespace, or exceeds [`EmailAddress::MAX_LENGTH`].
    pub fn parse(email: impl Into<String>) -> Result<Self> {
        let email = email.into();

        if email.len() > Self::MAX_LENGTH || email.trim() != email {
            return Err(DomainError::InvalidEmailFormat);
        }

        match email.split_once('@') {
            Some((local, domain))
                if !local.is_empty()
                    && !domain.is_empty()
                    && !domain.contains('@') =>
            {
                Ok(Self(email))
            },
            _ => Err(DomainError::InvalidEmailFormat),
        }
    }

    /// Returns the same string as a string slice `&str`.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
