//! Interface for observability.

use crate::application::dto::ReconcileReport;
use crate::application::error::SignUpStage;
use crate::domain::identity::IdentityId;
use crate::domain::profile::ProfileId;

/// Port for telemetry/observability operations.
pub trait TelemetryPort: Send + Sync {
    /// Record a successful sign-in.
    fn record_sign_in_success(&self, principal_id: IdentityId);

    /// Record a failed sign-in. `reason` never leaves the service.
    fn record_sign_in_failure(&self, reason: &str);

    /// Record a new account creation.
    fn record_account_created(&self, identity_id: IdentityId);

    /// Record a sign-up refused before any write.
    fn record_sign_up_rejected(&self, reason: &str);

    /// Record a sign-up that stopped between writes.
    fn record_partial_failure(
        &self,
        stage: SignUpStage,
        identity_id: IdentityId,
        profile_id: Option<ProfileId>,
    );

    /// Record the outcome of a reconciliation sweep.
    fn record_reconciliation(&self, report: &ReconcileReport);
}
