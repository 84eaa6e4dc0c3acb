//! PostgreSQL implementation for the role catalog.

use async_trait::async_trait;
use sqlx::PgPool;

use super::models::RoleRecord;
use crate::application::error::{Result, ToInternal};
use crate::application::ports::outbound::RoleCatalog;
use crate::domain::role::{Role, RoleName};

/// PostgreSQL role catalog.
pub struct PgRoleCatalog {
    pool: PgPool,
}

impl PgRoleCatalog {
    /// Create a new [`PgRoleCatalog`].
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleCatalog for PgRoleCatalog {
    async fn find_by_name(&self, name: RoleName) -> Result<Option<Role>> {
        let record = sqlx::query_as::<_, RoleRecord>(
            "SELECT id, name FROM roles WHERE name = $1",
        )
        .bind(name.as_str())
        .fetch_optional(&self.pool)
        .await
        .catch()?;

        record.map(RoleRecord::try_into_domain).transpose()
    }
}
