//! PostgreSQL implementation for the profile store.

use async_trait::async_trait;
use sqlx::PgPool;

use super::limit;
use super::models::ProfileRecord;
use crate::application::error::{ApplicationError, Result, ToInternal};
use crate::application::ports::outbound::ProfileStore;
use crate::domain::email::EmailAddress;
use crate::domain::profile::{Profile, ProfileId};

/// PostgreSQL profile store.
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    /// Create a new [`PgProfileStore`].
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn into_profiles(records: Vec<ProfileRecord>) -> Result<Vec<Profile>> {
    records
        .into_iter()
        .map(ProfileRecord::try_into_domain)
        .collect()
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn save_or_update(&self, profile: Profile) -> Result<Profile> {
        let identity_id = profile.identity_id().map(|id| id.get());

        match profile.id() {
            None => {
                let id: i64 = sqlx::query_scalar(
                    r#"
                    INSERT INTO profiles (first_name, last_name, email, identity_id)
                    VALUES ($1, $2, $3, $4)
                    RETURNING id
                    "#,
                )
                .bind(profile.name().first())
                .bind(profile.name().last())
                .bind(profile.email().as_str())
                .bind(identity_id)
                .fetch_one(&self.pool)
                .await
                .catch()?;

                Ok(profile.with_id(ProfileId::new(id)))
            },
            Some(id) => {
                let result = sqlx::query(
                    r#"
                    UPDATE profiles
                    SET first_name = $2, last_name = $3, email = $4, identity_id = $5
                    WHERE id = $1
                    "#,
                )
                .bind(id.get())
                .bind(profile.name().first())
                .bind(profile.name().last())
                .bind(profile.email().as_str())
                .bind(identity_id)
                .execute(&self.pool)
                .await
                .catch()?;

                if result.rows_affected() == 0 {
                    return Err(ApplicationError::NotFound);
                }

                Ok(profile)
            },
        }
    }

    async fn find_by_id(&self, id: ProfileId) -> Result<Option<Profile>> {
        let record = sqlx::query_as::<_, ProfileRecord>(
            r#"
            SELECT id, first_name, last_name, email, identity_id
            FROM profiles
            WHERE id = $1
            "#,
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .catch()?;

        record.map(ProfileRecord::try_into_domain).transpose()
    }

    async fn list_by_email(&self, email: &EmailAddress) -> Result<Vec<Profile>> {
        let records = sqlx::query_as::<_, ProfileRecord>(
            r#"
            SELECT id, first_name, last_name, email, identity_id
            FROM profiles
            WHERE email = $1
            ORDER BY id
            "#,
        )
        .bind(email.as_str())
        .fetch_all(&self.pool)
        .await
        .catch()?;

        into_profiles(records)
    }

    async fn find_unlinked(
        &self,
        after: Option<ProfileId>,
        page: usize,
    ) -> Result<Vec<Profile>> {
        let records = sqlx::query_as::<_, ProfileRecord>(
            r#"
            SELECT id, first_name, last_name, email, identity_id
            FROM profiles
            WHERE identity_id IS NULL AND id > $1
            ORDER BY id
            LIMIT $2
            "#,
        )
        .bind(after.map_or(0, |id| id.get()))
        .bind(limit(page))
        .fetch_all(&self.pool)
        .await
        .catch()?;

        into_profiles(records)
    }
}
