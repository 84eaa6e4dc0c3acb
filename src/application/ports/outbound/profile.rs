//! Profile store port.

use async_trait::async_trait;

use crate::application::error::Result;
use crate::domain::email::EmailAddress;
use crate::domain::profile::{Profile, ProfileId};

/// Port for profile persistence.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Insert `profile` when it has no id, update it otherwise.
    async fn save_or_update(&self, profile: Profile) -> Result<Profile>;

    async fn find_by_id(&self, id: ProfileId) -> Result<Option<Profile>>;

    /// Profiles carrying `email`. Email is not unique for profiles.
    async fn list_by_email(&self, email: &EmailAddress) -> Result<Vec<Profile>>;

    /// Profiles that do not reference any identity, in id order, starting
    /// after `after`.
    async fn find_unlinked(
        &self,
        after: Option<ProfileId>,
        limit: usize,
    ) -> Result<Vec<Profile>>;
}
