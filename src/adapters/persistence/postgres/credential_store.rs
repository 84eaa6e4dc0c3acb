//! PostgreSQL implementation for the credential store.

use async_trait::async_trait;
use sqlx::PgPool;

use super::models::{IdentityRecord, to_timestamp};
use super::{limit, map_unique};
use crate::application::error::{ApplicationError, Result, ToInternal};
use crate::application::ports::outbound::CredentialStore;
use crate::domain::email::EmailAddress;
use crate::domain::identity::{Identity, IdentityId};

/// Identity columns plus roles aggregated as a JSON array.
macro_rules! select_identity {
    ($tail:literal) => {
        concat!(
            r#"
            SELECT
                i.id, i.email, i.first_name, i.last_name, i.password,
                i.profile_id, i.created_at,
                COALESCE(
                    (SELECT json_agg(json_build_object('id', r.id, 'name', r.name) ORDER BY r.id)
                     FROM identity_roles ir
                     JOIN roles r ON r.id = ir.role_id
                     WHERE ir.identity_id = i.id),
                    '[]'::json
                ) AS roles
            FROM identities i
            "#,
            $tail
        )
    };
}

/// PostgreSQL credential store.
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    /// Create a new [`PgCredentialStore`].
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert(&self, identity: Identity) -> Result<Identity> {
        let mut tx = self.pool.begin().await.catch()?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO identities (
                email, first_name, last_name, password, profile_id, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(identity.email().as_str())
        .bind(identity.name().first())
        .bind(identity.name().last())
        .bind(identity.password_hash().as_str())
        .bind(identity.profile_id().map(|id| id.get()))
        .bind(to_timestamp(identity.created_at()))
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| map_unique(err, "email"))?;

        for role in identity.roles() {
            sqlx::query(
                "INSERT INTO identity_roles (identity_id, role_id) VALUES ($1, $2)",
            )
            .bind(id)
            .bind(role.id())
            .execute(&mut *tx)
            .await
            .catch()?;
        }

        tx.commit().await.catch()?;

        Ok(identity.with_id(IdentityId::new(id)))
    }

    /// Roles are fixed at creation and are not rewritten.
    async fn update(&self, id: IdentityId, identity: Identity) -> Result<Identity> {
        let result = sqlx::query(
            r#"
            UPDATE identities
            SET email = $2, first_name = $3, last_name = $4, password = $5, profile_id = $6
            WHERE id = $1
            "#,
        )
        .bind(id.get())
        .bind(identity.email().as_str())
        .bind(identity.name().first())
        .bind(identity.name().last())
        .bind(identity.password_hash().as_str())
        .bind(identity.profile_id().map(|id| id.get()))
        .execute(&self.pool)
        .await
        .map_err(|err| map_unique(err, "email"))?;

        if result.rows_affected() == 0 {
            return Err(ApplicationError::NotFound);
        }

        Ok(identity)
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn exists_by_email(&self, email: &EmailAddress) -> Result<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM identities WHERE email = $1)",
        )
        .bind(email.as_str())
        .fetch_one(&self.pool)
        .await
        .catch()
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Identity>> {
        let record = sqlx::query_as::<_, IdentityRecord>(select_identity!(
            "WHERE i.email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await
        .catch()?;

        record.map(IdentityRecord::try_into_domain).transpose()
    }

    async fn find_by_id(&self, id: IdentityId) -> Result<Option<Identity>> {
        let record = sqlx::query_as::<_, IdentityRecord>(select_identity!(
            "WHERE i.id = $1"
        ))
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .catch()?;

        record.map(IdentityRecord::try_into_domain).transpose()
    }

    async fn save(&self, identity: Identity) -> Result<Identity> {
        match identity.id() {
            Some(id) => self.update(id, identity).await,
            None => self.insert(identity).await,
        }
    }

    async fn find_unlinked(
        &self,
        after: Option<IdentityId>,
        page: usize,
    ) -> Result<Vec<Identity>> {
        let records = sqlx::query_as::<_, IdentityRecord>(select_identity!(
            "WHERE i.profile_id IS NULL AND i.id > $1 ORDER BY i.id LIMIT $2"
        ))
        .bind(after.map_or(0, |id| id.get()))
        .bind(limit(page))
        .fetch_all(&self.pool)
        .await
        .catch()?;

        records
            .into_iter()
            .map(IdentityRecord::try_into_domain)
            .collect()
    }
}
