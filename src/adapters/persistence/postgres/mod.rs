//! PostgreSQL persistence adapters.

mod credential_store;
pub mod models;
mod profile_store;
mod role_catalog;

use std::sync::Arc;

use sqlx::PgPool;

pub use credential_store::PgCredentialStore;
pub use profile_store::PgProfileStore;
pub use role_catalog::PgRoleCatalog;

use crate::application::error::ApplicationError;
use crate::application::usecases::Stores;

/// Build every store port on top of one pool.
pub fn stores(pool: PgPool) -> Stores {
    Stores {
        credentials: Arc::new(PgCredentialStore::new(pool.clone())),
        profiles: Arc::new(PgProfileStore::new(pool.clone())),
        roles: Arc::new(PgRoleCatalog::new(pool)),
    }
}

/// Map a database error, surfacing unique violations on `field`.
fn map_unique(err: sqlx::Error, field: &'static str) -> ApplicationError {
    match err.as_database_error() {
        Some(db_err) if db_err.is_unique_violation() => {
            ApplicationError::UniqueViolation(field)
        },
        _ => ApplicationError::internal(err),
    }
}

/// `LIMIT` argument for a page size.
fn limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}
