//! Custom error handler for domain (core).

pub type Result<T> = std::result::Result<T, DomainError>;

/// Enum representing custom domain errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    #[error("invalid email formatting")]
    InvalidEmailFormat,
    #[error("{field} must be between {min} and {max} characters")]
    InvalidLength {
        field: &'static str,
        min: usize,
        max: usize,
    },
    #[error("identity must hold at least one role")]
    EmptyRoleSet,
    #[error("unknown role `{0}`")]
    UnknownRole(String),
    #[error("password hash is not in PHC format")]
    MalformedPasswordHash,
}

impl DomainError {
    /// Name of the input field the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            DomainError::InvalidEmailFormat => "email",
            DomainError::InvalidLength { field, .. } => field,
            DomainError::EmptyRoleSet | DomainError::UnknownRole(_) => "roles",
            DomainError::MalformedPasswordHash => "password",
        }
    }
}
