//! Data Transfer Objects for the application layer.
//!
//! DTOs are used to transfer data between layers without exposing domain
//! entities.

use crate::domain::identity::IdentityId;
use crate::domain::profile::ProfileId;

/// Request DTO for sign-in.
#[derive(Debug, Clone)]
pub struct SignInRequestDto {
    pub email: String,
    pub password: String,
}

/// Authenticated principal, as asserted by a session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalDto {
    pub id: IdentityId,
    /// Display name (the login email).
    pub name: String,
    pub roles: Vec<String>,
}

/// Response DTO for sign-in.
#[derive(Debug, Clone)]
pub struct SessionDto {
    /// Signed access token (JWT).
    pub token: String,
    /// Token type (e.g., "Bearer").
    pub token_type: String,
    /// Expiration time in seconds.
    pub expires_in: u64,
    pub principal: PrincipalDto,
}

/// Request DTO for sign-up.
#[derive(Debug, Clone)]
pub struct SignUpRequestDto {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

/// Response DTO for sign-up. Sign-up does not authenticate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignUpConfirmationDto {
    pub identity_id: IdentityId,
    pub profile_id: ProfileId,
}

/// Outcome of one reconciliation sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Pairs whose links were completed.
    pub repaired: usize,
    /// Profiles created for identities that had none.
    pub created_profiles: usize,
    /// Profiles left without any identity.
    pub orphans: usize,
    pub failures: usize,
}
