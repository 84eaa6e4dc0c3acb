//! Repair of identity/profile pairs left unlinked by an interrupted sign-up.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::application::dto::ReconcileReport;
use crate::application::error::Result;
use crate::application::ports::inbound::ReconcileLinks;
use crate::application::ports::outbound::{Clock, TelemetryPort};
use crate::application::usecases::Stores;
use crate::application::usecases::link::link_pair;
use crate::domain::identity::{Identity, IdentityId};
use crate::domain::profile::{Profile, ProfileId};

const DEFAULT_BATCH_SIZE: usize = 100;

/// Last record inspected on each side, `None` to start over.
#[derive(Debug, Default)]
struct SweepCursor {
    identity: Option<IdentityId>,
    profile: Option<ProfileId>,
}

/// Link reconciliation use case service.
pub struct LinkReconciler {
    stores: Stores,
    telemetry: Arc<dyn TelemetryPort>,
    clock: Arc<dyn Clock>,
    /// Identities younger than this (seconds) may still be mid sign-up.
    grace_period: u64,
    batch_size: usize,
    cursor: Mutex<SweepCursor>,
}

impl LinkReconciler {
    pub fn new(
        stores: Stores,
        telemetry: Arc<dyn TelemetryPort>,
        clock: Arc<dyn Clock>,
        grace_period: u64,
    ) -> Self {
        Self {
            stores,
            telemetry,
            clock,
            grace_period,
            batch_size: DEFAULT_BATCH_SIZE,
            cursor: Mutex::new(SweepCursor::default()),
        }
    }

    /// Update how many records one pass inspects per side.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Give `identity` a linked profile, creating one if none matches.
    ///
    /// Returns whether a profile was created.
    async fn repair_identity(&self, identity: Identity) -> Result<bool> {
        let candidate = self
            .stores
            .profiles
            .list_by_email(identity.email())
            .await?
            .into_iter()
            .find(|profile| {
                profile.identity_id().is_none()
                    || profile.identity_id() == identity.id()
            });

        let (profile, created) = match candidate {
            Some(profile) => (profile, false),
            None => {
                let profile = Profile::new(
                    identity.name().clone(),
                    identity.email().clone(),
                );
                (self.stores.profiles.save_or_update(profile).await?, true)
            },
        };

        link_pair(&self.stores, identity, profile).await?;
        Ok(created)
    }

    /// Complete the back-reference of `profile` if its identity already
    /// points at it.
    ///
    /// Returns `false` for an orphan profile.
    async fn repair_profile(&self, profile: Profile) -> Result<bool> {
        let identity = self
            .stores
            .credentials
            .find_by_email(profile.email())
            .await?;

        match identity {
            Some(identity)
                if profile.id().is_some()
                    && identity.profile_id() == profile.id() =>
            {
                link_pair(&self.stores, identity, profile).await?;
                Ok(true)
            },
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl ReconcileLinks for LinkReconciler {
    async fn sweep(&self) -> Result<ReconcileReport> {
        let mut report = ReconcileReport::default();
        let cutoff = self.clock.now().saturating_sub(self.grace_period);
        // Held for the whole pass, so sweeps never overlap.
        let mut cursor = self.cursor.lock().await;

        let identities = self
            .stores
            .credentials
            .find_unlinked(cursor.identity, self.batch_size)
            .await?;
        let mut next = cursor.identity;
        let mut deferred = false;
        let exhausted = identities.len() < self.batch_size;
        for identity in identities {
            // Ids grow with creation time, the rest of the page is recent too.
            if identity.created_at() > cutoff {
                deferred = true;
                break;
            }

            let identity_id = identity.id();
            next = identity_id;
            match self.repair_identity(identity).await {
                Ok(created) => {
                    report.repaired += 1;
                    report.created_profiles += usize::from(created);
                },
                Err(err) => {
                    report.failures += 1;
                    tracing::warn!(?identity_id, error = %err, "cannot repair unlinked identity");
                },
            }
        }

        cursor.identity = if exhausted && !deferred { None } else { next };

        let profiles = self
            .stores
            .profiles
            .find_unlinked(cursor.profile, self.batch_size)
            .await?;
        let exhausted = profiles.len() < self.batch_size;
        let mut next = cursor.profile;
        for profile in profiles {
            let profile_id = profile.id();
            next = profile_id;
            match self.repair_profile(profile).await {
                Ok(true) => report.repaired += 1,
                Ok(false) => {
                    report.orphans += 1;
                    tracing::warn!(?profile_id, "profile has no identity");
                },
                Err(err) => {
                    report.failures += 1;
                    tracing::warn!(?profile_id, error = %err, "cannot repair unlinked profile");
                },
            }
        }

        cursor.profile = if exhausted { None } else { next };

        self.telemetry.record_reconciliation(&report);

        Ok(report)
    }
}
