//! Role catalog port.

use async_trait::async_trait;

use crate::application::error::Result;
use crate::domain::role::{Role, RoleName};

/// Read-only port over seeded roles.
#[async_trait]
pub trait RoleCatalog: Send + Sync {
    async fn find_by_name(&self, name: RoleName) -> Result<Option<Role>>;
}
