//! In-process store backing every persistence port.
//!
//! Used when no database is configured and by tests. Data is lost on exit.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::application::error::{ApplicationError, Result};
use crate::application::ports::outbound::{
    CredentialStore, ProfileStore, RoleCatalog,
};
use crate::domain::email::EmailAddress;
use crate::domain::identity::{Identity, IdentityId};
use crate::domain::profile::{Profile, ProfileId};
use crate::domain::role::{Role, RoleName};

/// Memory store.
pub struct MemoryStore {
    roles: BTreeMap<RoleName, Role>,
    identities: RwLock<BTreeMap<IdentityId, Identity>>,
    profiles: RwLock<BTreeMap<ProfileId, Profile>>,
    next_identity: AtomicI64,
    next_profile: AtomicI64,
}

impl MemoryStore {
    /// Create a new [`MemoryStore`] seeded with every role.
    pub fn new() -> Self {
        Self::with_roles(
            RoleName::ALL
                .into_iter()
                .zip(1..)
                .map(|(name, id)| Role::new(id, name)),
        )
    }

    /// Create a new [`MemoryStore`] with a custom role catalog.
    pub fn with_roles(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            roles: roles.into_iter().map(|role| (role.name(), role)).collect(),
            identities: RwLock::new(BTreeMap::new()),
            profiles: RwLock::new(BTreeMap::new()),
            next_identity: AtomicI64::new(1),
            next_profile: AtomicI64::new(1),
        }
    }

    #[cfg(test)]
    pub async fn identity_count(&self, email: &EmailAddress) -> usize {
        self.identities
            .read()
            .await
            .values()
            .filter(|identity| identity.email() == email)
            .count()
    }

    #[cfg(test)]
    pub async fn profile_count(&self) -> usize {
        self.profiles.read().await.len()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoleCatalog for MemoryStore {
    async fn find_by_name(&self, name: RoleName) -> Result<Option<Role>> {
        Ok(self.roles.get(&name).copied())
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn exists_by_email(&self, email: &EmailAddress) -> Result<bool> {
        Ok(self
            .identities
            .read()
            .await
            .values()
            .any(|identity| identity.email() == email))
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Identity>> {
        Ok(self
            .identities
            .read()
            .await
            .values()
            .find(|identity| identity.email() == email)
            .cloned())
    }

    async fn find_by_id(&self, id: IdentityId) -> Result<Option<Identity>> {
        Ok(self.identities.read().await.get(&id).cloned())
    }

    async fn save(&self, identity: Identity) -> Result<Identity> {
        // Uniqueness check and write happen under the same lock.
        let mut identities = self.identities.write().await;

        if identities.values().any(|other| {
            other.email() == identity.email() && other.id() != identity.id()
        }) {
            return Err(ApplicationError::UniqueViolation("email"));
        }

        let identity = match identity.id() {
            Some(id) if identities.contains_key(&id) => identity,
            Some(_) => return Err(ApplicationError::NotFound),
            None => identity.with_id(IdentityId::new(
                self.next_identity.fetch_add(1, Ordering::Relaxed),
            )),
        };

        if let Some(id) = identity.id() {
            identities.insert(id, identity.clone());
        }

        Ok(identity)
    }

    async fn find_unlinked(
        &self,
        after: Option<IdentityId>,
        limit: usize,
    ) -> Result<Vec<Identity>> {
        Ok(self
            .identities
            .read()
            .await
            .iter()
            .filter(|(id, _)| after.is_none_or(|after| **id > after))
            .map(|(_, identity)| identity)
            .filter(|identity| identity.profile_id().is_none())
            .take(limit)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn save_or_update(&self, profile: Profile) -> Result<Profile> {
        let mut profiles = self.profiles.write().await;

        let profile = match profile.id() {
            Some(id) if profiles.contains_key(&id) => profile,
            Some(_) => return Err(ApplicationError::NotFound),
            None => profile.with_id(ProfileId::new(
                self.next_profile.fetch_add(1, Ordering::Relaxed),
            )),
        };

        if let Some(id) = profile.id() {
            profiles.insert(id, profile.clone());
        }

        Ok(profile)
    }

    async fn find_by_id(&self, id: ProfileId) -> Result<Option<Profile>> {
        Ok(self.profiles.read().await.get(&id).cloned())
    }

    async fn list_by_email(&self, email: &EmailAddress) -> Result<Vec<Profile>> {
        Ok(self
            .profiles
            .read()
            .await
            .values()
            .filter(|profile| profile.email() == email)
            .cloned()
            .collect())
    }

    async fn find_unlinked(
        &self,
        after: Option<ProfileId>,
        limit: usize,
    ) -> Result<Vec<Profile>> {
        Ok(self
            .profiles
            .read()
            .await
            .iter()
            .filter(|(id, _)| after.is_none_or(|after| **id > after))
            .map(|(_, profile)| profile)
            .filter(|profile| profile.identity_id().is_none())
            .take(limit)
            .cloned()
            .collect())
    }
}
