//! Login identity entity.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::email::EmailAddress;
use crate::domain::error::{DomainError, Result};
use crate::domain::name::PersonName;
use crate::domain::password::PasswordHash;
use crate::domain::profile::ProfileId;
use crate::domain::role::Role;

/// Storage-assigned identifier of an [`Identity`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct IdentityId(i64);

impl IdentityId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    #[inline]
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Login identity: credentials, granted roles and the link to its profile.
///
/// An identity without id has never been persisted. Once created, only the
/// profile link changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    id: Option<IdentityId>,
    email: EmailAddress,
    name: PersonName,
    password_hash: PasswordHash,
    roles: BTreeSet<Role>,
    profile_id: Option<ProfileId>,
    created_at: u64,
}

impl Identity {
    /// Create a new, unsaved [`Identity`].
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::EmptyRoleSet`] when `roles` yields nothing.
    pub fn new(
        email: EmailAddress,
        name: PersonName,
        password_hash: PasswordHash,
        roles: impl IntoIterator<Item = Role>,
        created_at: u64,
    ) -> Result<Self> {
        let roles: BTreeSet<Role> = roles.into_iter().collect();
        if roles.is_empty() {
            return Err(DomainError::EmptyRoleSet);
        }

        Ok(Self {
            id: None,
            email,
            name,
            password_hash,
            roles,
            profile_id: None,
            created_at,
        })
    }

    /// Attach the identifier given by storage.
    pub fn with_id(mut self, id: IdentityId) -> Self {
        self.id = Some(id);
        self
    }

    /// Restore the profile link read from storage.
    pub fn with_profile(mut self, profile_id: Option<ProfileId>) -> Self {
        self.profile_id = profile_id;
        self
    }

    pub fn link_profile(&mut self, profile_id: ProfileId) {
        self.profile_id = Some(profile_id);
    }

    pub fn unlink_profile(&mut self) {
        self.profile_id = None;
    }

    pub fn is_linked_to(&self, profile_id: ProfileId) -> bool {
        self.profile_id == Some(profile_id)
    }

    #[inline]
    pub fn id(&self) -> Option<IdentityId> {
        self.id
    }

    #[inline]
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    #[inline]
    pub fn name(&self) -> &PersonName {
        &self.name
    }

    #[inline]
    pub fn password_hash(&self) -> &PasswordHash {
        &self.password_hash
    }

    #[inline]
    pub fn roles(&self) -> &BTreeSet<Role> {
        &self.roles
    }

    /// Role tags as plain strings, in catalog order.
    pub fn role_names(&self) -> Vec<String> {
        self.roles.iter().map(|r| r.name().to_string()).collect()
    }

    #[inline]
    pub fn profile_id(&self) -> Option<ProfileId> {
        self.profile_id
    }

    /// Unix timestamp (seconds) of creation.
    #[inline]
    pub fn created_at(&self) -> u64 {
        self.created_at
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::role::RoleName;

    pub(crate) const PHC: &str =
        "$argon2id$v=19$m=4096,t=1,p=1$c29tZXNhbHQ$aGFzaGVkcGFzc3dvcmQ";

    pub(crate) fn identity(email: &str) -> Identity {
        Identity::new(
            EmailAddress::parse(email).unwrap(),
            PersonName::new("Ann", "Lee").unwrap(),
            PasswordHash::parse(PHC).unwrap(),
            [Role::new(1, RoleName::User)],
            1_700_000_000,
        )
        .unwrap()
    }

    #[test]
    fn test_roles_must_not_be_empty() {
        let err = Identity::new(
            EmailAddress::parse("ann@x.com").unwrap(),
            PersonName::new("Ann", "Lee").unwrap(),
            PasswordHash::parse(PHC).unwrap(),
            [],
            0,
        )
        .unwrap_err();

        assert_eq!(err, DomainError::EmptyRoleSet);
    }

    #[test]
    fn test_duplicate_roles_collapse() {
        let user = Role::new(1, RoleName::User);
        let identity = Identity::new(
            EmailAddress::parse("ann@x.com").unwrap(),
            PersonName::new("Ann", "Lee").unwrap(),
            PasswordHash::parse(PHC).unwrap(),
            [user, user, Role::new(2, RoleName::Admin)],
            0,
        )
        .unwrap();

        assert_eq!(identity.role_names(), vec!["USER", "ADMIN"]);
    }

    #[test]
    fn test_profile_link() {
        let mut identity = identity("ann@x.com");
        assert_eq!(identity.profile_id(), None);

        identity.link_profile(ProfileId::new(7));
        assert!(identity.is_linked_to(ProfileId::new(7)));

        identity.unlink_profile();
        assert!(!identity.is_linked_to(ProfileId::new(7)));
    }
}
