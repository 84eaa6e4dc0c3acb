//! Interfaces for cryptographic operations.

use crate::application::error::Result;
use crate::domain::password::{Password, PasswordHash};

/// Port for one-way password hashing.
pub trait PasswordHasher: Send + Sync {
    /// Hash a password using a secure algorithm.
    fn hash(&self, password: &Password) -> Result<PasswordHash>;

    /// Verify a password against a stored hash.
    ///
    /// A mismatch is reported as `InvalidCredentials`.
    fn verify(&self, password: &Password, hash: &PasswordHash) -> Result<()>;
}
