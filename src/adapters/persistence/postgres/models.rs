//! Database models for PostgreSQL.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::application::error::{Result, ToInternal};
use crate::domain::email::EmailAddress;
use crate::domain::identity::{Identity, IdentityId};
use crate::domain::name::PersonName;
use crate::domain::password::PasswordHash;
use crate::domain::profile::{Profile, ProfileId};
use crate::domain::role::{Role, RoleName};

/// Role record as stored in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct RoleRecord {
    pub id: i32,
    pub name: String,
}

/// Identity record, with its roles aggregated as JSON.
#[derive(Debug, Clone, FromRow)]
pub struct IdentityRecord {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub profile_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    #[sqlx(json)]
    pub roles: Vec<RoleRecord>,
}

/// Profile record as stored in the database.
#[derive(Debug, Clone, FromRow)]
pub struct ProfileRecord {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub identity_id: Option<i64>,
}

impl RoleRecord {
    /// Convert to [`Role`].
    pub fn try_into_domain(self) -> Result<Role> {
        let name = self.name.parse::<RoleName>().catch()?;
        Ok(Role::new(self.id, name))
    }
}

impl IdentityRecord {
    /// Convert to [`Identity`].
    ///
    /// Rows violating domain rules are reported as internal errors.
    pub fn try_into_domain(self) -> Result<Identity> {
        let roles = self
            .roles
            .into_iter()
            .map(RoleRecord::try_into_domain)
            .collect::<Result<Vec<_>>>()?;

        let identity = Identity::new(
            EmailAddress::parse(self.email).catch()?,
            PersonName::new(&self.first_name, &self.last_name).catch()?,
            PasswordHash::parse(self.password).catch()?,
            roles,
            self.created_at.timestamp().max(0) as u64,
        )
        .catch()?;

        Ok(identity
            .with_id(IdentityId::new(self.id))
            .with_profile(self.profile_id.map(ProfileId::new)))
    }
}

impl ProfileRecord {
    /// Convert to [`Profile`].
    pub fn try_into_domain(self) -> Result<Profile> {
        let profile = Profile::new(
            PersonName::new(&self.first_name, &self.last_name).catch()?,
            EmailAddress::parse(self.email).catch()?,
        );

        Ok(profile
            .with_id(ProfileId::new(self.id))
            .with_identity(self.identity_id.map(IdentityId::new)))
    }
}

/// Convert a Unix timestamp to a database timestamp.
pub fn to_timestamp(secs: u64) -> DateTime<Utc> {
    i64::try_from(secs)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .unwrap_or_else(Utc::now)
}
