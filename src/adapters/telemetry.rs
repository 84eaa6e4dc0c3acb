//! Telemetry adapters - Observability implementations.

use metrics::{counter, gauge};

use crate::application::dto::ReconcileReport;
use crate::application::error::SignUpStage;
use crate::application::ports::outbound::TelemetryPort;
use crate::domain::identity::IdentityId;
use crate::domain::profile::ProfileId;

/// Tracing-based telemetry adapter, also feeding the metrics recorder.
#[derive(Default)]
pub struct TracingTelemetry;

impl TracingTelemetry {
    /// Create a new [`TracingTelemetry`].
    pub fn new() -> Self {
        Self
    }
}

impl TelemetryPort for TracingTelemetry {
    fn record_sign_in_success(&self, principal_id: IdentityId) {
        counter!("auth_sign_in_total", "outcome" => "success").increment(1);
        tracing::info!(%principal_id, "sign-in successful");
    }

    fn record_sign_in_failure(&self, reason: &str) {
        counter!("auth_sign_in_total", "outcome" => "failure").increment(1);
        tracing::info!(reason, "sign-in failed");
    }

    fn record_account_created(&self, identity_id: IdentityId) {
        counter!("account_created_total").increment(1);
        tracing::info!(%identity_id, "account created");
    }

    fn record_sign_up_rejected(&self, reason: &str) {
        counter!("account_sign_up_rejected_total", "reason" => reason.to_owned())
            .increment(1);
        tracing::info!(reason, "sign-up rejected");
    }

    fn record_partial_failure(
        &self,
        stage: SignUpStage,
        identity_id: IdentityId,
        profile_id: Option<ProfileId>,
    ) {
        counter!("account_partial_failures_total", "stage" => stage.to_string())
            .increment(1);
        tracing::warn!(%stage, %identity_id, ?profile_id, "sign-up left an unlinked pair");
    }

    fn record_reconciliation(&self, report: &ReconcileReport) {
        counter!("account_links_repaired_total")
            .increment(report.repaired as u64);
        gauge!("account_orphan_profiles").set(report.orphans as f64);

        if report.repaired > 0 || report.failures > 0 || report.orphans > 0 {
            tracing::info!(
                repaired = report.repaired,
                created_profiles = report.created_profiles,
                orphans = report.orphans,
                failures = report.failures,
                "reconciliation sweep finished"
            );
        } else {
            tracing::debug!("reconciliation sweep found nothing to repair");
        }
    }
}
