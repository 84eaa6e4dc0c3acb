//! Credential store port.

use async_trait::async_trait;

use crate::application::error::Result;
use crate::domain::email::EmailAddress;
use crate::domain::identity::{Identity, IdentityId};

/// Port for login identity persistence.
///
/// Emails are compared exactly as given.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Whether an identity is registered under `email`.
    async fn exists_by_email(&self, email: &EmailAddress) -> Result<bool>;

    /// Find an identity by email.
    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Identity>>;

    /// Find an identity by id.
    async fn find_by_id(&self, id: IdentityId) -> Result<Option<Identity>>;

    /// Insert `identity` when it has no id, update it otherwise.
    ///
    /// Fails with `UniqueViolation` when another identity already owns the
    /// email.
    async fn save(&self, identity: Identity) -> Result<Identity>;

    /// Identities that do not reference any profile, in id order, starting
    /// after `after`.
    async fn find_unlinked(
        &self,
        after: Option<IdentityId>,
        limit: usize,
    ) -> Result<Vec<Identity>>;
}
