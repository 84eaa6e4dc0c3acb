//! Bidirectional identity/profile linking.

use crate::application::error::{ApplicationError, Result};
use crate::application::usecases::Stores;
use crate::domain::identity::Identity;
use crate::domain::profile::Profile;

/// Point `identity` and `profile` at each other and persist both sides.
///
/// Idempotent: a side already holding the expected reference is not
/// written again, so a failed call can simply be replayed.
pub(crate) async fn link_pair(
    stores: &Stores,
    mut identity: Identity,
    mut profile: Profile,
) -> Result<(Identity, Profile)> {
    let identity_id = identity.id().ok_or(ApplicationError::NotFound)?;
    let profile_id = profile.id().ok_or(ApplicationError::NotFound)?;

    if !identity.is_linked_to(profile_id) {
        identity.link_profile(profile_id);
        identity = stores.credentials.save(identity).await?;
    }

    if profile.identity_id() != Some(identity_id) {
        profile.link_identity(identity_id);
        profile = stores.profiles.save_or_update(profile).await?;
    }

    Ok((identity, profile))
}
