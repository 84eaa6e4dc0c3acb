//! Link reconciliation port.

use async_trait::async_trait;

use crate::application::dto::ReconcileReport;
use crate::application::error::Result;

/// Inbound port repairing identity/profile pairs left unlinked.
#[async_trait]
pub trait ReconcileLinks: Send + Sync {
    /// Run one repair pass.
    async fn sweep(&self) -> Result<ReconcileReport>;
}
