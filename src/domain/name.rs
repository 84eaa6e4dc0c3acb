//! Person name shared by identities and profiles.

use crate::domain::error::{DomainError, Result};

const MAX_LENGTH: usize = 50;

/// First and last name, trimmed and length-checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonName {
    first: String,
    last: String,
}

impl PersonName {
    pub fn new(first: impl AsRef<str>, last: impl AsRef<str>) -> Result<Self> {
        Ok(Self {
            first: Self::part("firstName", first.as_ref())?,
            last: Self::part("lastName", last.as_ref())?,
        })
    }

    fn part(field: &'static str, value: &str) -> Result<String> {
        let value = value.trim();
        if value.is_empty() || value.chars().count() > MAX_LENGTH {
            return Err(DomainError::InvalidLength {
                field,
                min: 1,
                max: MAX_LENGTH,
            });
        }

        Ok(value.to_owned())
    }

    #[inline]
    pub fn first(&self) -> &str {
        &self.first
    }

    #[inline]
    pub fn last(&self) -> &str {
        &self.last
    }
}
