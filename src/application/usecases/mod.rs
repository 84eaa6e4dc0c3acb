//! Application services implementing business logic.

use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::outbound::{
    CredentialStore, ProfileStore, RoleCatalog,
};
use crate::domain::role::RoleName;

pub const TOKEN_TYPE: &str = "Bearer";

pub mod authentication;
mod link;
pub mod reconcile;

pub use authentication::*;
pub use reconcile::*;

/// Persistence ports shared by the use cases.
#[derive(Clone)]
pub struct Stores {
    pub credentials: Arc<dyn CredentialStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pub roles: Arc<dyn RoleCatalog>,
}

impl Stores {
    /// Use one backend for every store port.
    pub fn shared<S>(store: Arc<S>) -> Self
    where
        S: CredentialStore + ProfileStore + RoleCatalog + 'static,
    {
        Self {
            credentials: store.clone(),
            profiles: store.clone(),
            roles: store,
        }
    }
}

/// Tunables of the sign-up flow.
#[derive(Debug, Clone, Copy)]
pub struct SignUpPolicy {
    /// Role granted to every new identity.
    pub default_role: RoleName,
    /// Linking attempts before giving up with a partial failure.
    pub link_attempts: u32,
    /// Delay before the second attempt, grows linearly afterwards.
    pub link_backoff: Duration,
}

impl Default for SignUpPolicy {
    fn default() -> Self {
        Self {
            default_role: RoleName::User,
            link_attempts: 3,
            link_backoff: Duration::from_millis(50),
        }
    }
}
