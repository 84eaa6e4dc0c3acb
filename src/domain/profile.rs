//! Personnel profile entity.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::email::EmailAddress;
use crate::domain::identity::IdentityId;
use crate::domain::name::PersonName;

/// Storage-assigned identifier of a [`Profile`].
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
pub struct ProfileId(i64);

impl ProfileId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    #[inline]
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Profile of a person, linked one-to-one with an identity.
///
/// `email` is a denormalized copy; the identity owns uniqueness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    id: Option<ProfileId>,
    name: PersonName,
    email: EmailAddress,
    identity_id: Option<IdentityId>,
}

impl Profile {
    /// Create a new, unsaved and unlinked [`Profile`].
    pub fn new(name: PersonName, email: EmailAddress) -> Self {
        Self {
            id: None,
            name,
            email,
            identity_id: None,
        }
    }

    pub fn with_id(mut self, id: ProfileId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_identity(mut self, identity_id: Option<IdentityId>) -> Self {
        self.identity_id = identity_id;
        self
    }

    pub fn link_identity(&mut self, identity_id: IdentityId) {
        self.identity_id = Some(identity_id);
    }

    #[inline]
    pub fn id(&self) -> Option<ProfileId> {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &PersonName {
        &self.name
    }

    #[inline]
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    #[inline]
    pub fn identity_id(&self) -> Option<IdentityId> {
        self.identity_id
    }
}
