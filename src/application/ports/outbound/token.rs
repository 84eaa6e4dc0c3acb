//! Interface for session token operations.

use crate::application::dto::PrincipalDto;
use crate::application::error::Result;

/// Claims contained in a session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    /// Subject (principal ID).
    pub sub: String,
    /// Principal display name.
    pub name: String,
    /// Role names held at issuance.
    pub roles: Vec<String>,
    /// Issuer.
    pub iss: String,
    /// Audience.
    pub aud: String,
    /// Expiration time (Unix timestamp).
    pub exp: u64,
    /// Issued at (Unix timestamp).
    pub iat: u64,
    /// JWT ID (unique identifier).
    pub jti: String,
}

/// A freshly signed token.
#[derive(Debug, Clone)]
pub struct SignedToken {
    pub token: String,
    /// Lifetime in seconds.
    pub expires_in: u64,
}

/// Port for token signing.
pub trait TokenIssuer: Send + Sync {
    /// Sign a time-bounded token asserting `principal`.
    fn issue(&self, principal: &PrincipalDto, issued_at: u64)
    -> Result<SignedToken>;

    /// Decode and verify a token, returning its claims.
    fn introspect(&self, token: &str) -> Result<TokenClaims>;
}
