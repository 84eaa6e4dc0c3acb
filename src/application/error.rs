//! Application-level errors.

use std::fmt;

use crate::domain::error::DomainError;
use crate::domain::identity::IdentityId;
use crate::domain::profile::ProfileId;
use crate::domain::role::RoleName;

pub type Result<T> = std::result::Result<T, ApplicationError>;

/// Last sign-up step that took effect before a partial failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignUpStage {
    IdentityCreated,
    ProfileCreated,
}

impl fmt::Display for SignUpStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignUpStage::IdentityCreated => f.write_str("identity creation"),
            SignUpStage::ProfileCreated => f.write_str("profile creation"),
        }
    }
}

/// Errors that can occur in the application layer.
#[derive(Debug, thiserror::Error)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("email already taken")]
    DuplicateAccount,

    #[error("role `{role}` is missing from the role catalog")]
    RoleCatalogCorrupt { role: RoleName },
    #[error(
        "sign-up stopped after {stage} (identity {identity_id}, profile {profile_id:?})"
    )]
    PartialFailure {
        stage: SignUpStage,
        identity_id: IdentityId,
        profile_id: Option<ProfileId>,
        #[source]
        source: Box<ApplicationError>,
    },

    #[error("unique constraint violated on `{0}`")]
    UniqueViolation(&'static str),
    #[error("record not found")]
    NotFound,

    #[error("internal server error")]
    Internal(Box<dyn std::error::Error + Send + Sync>),
}

impl ApplicationError {
    pub fn internal<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Internal(Box::new(err))
    }
}

pub trait ToInternal<T> {
    fn catch(self) -> Result<T>;
}

impl<T, E> ToInternal<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn catch(self) -> Result<T> {
        self.map_err(|e| ApplicationError::Internal(Box::new(e)))
    }
}
