//! HTTP API.
pub mod metrics;
pub mod sign_in;
pub mod sign_up;
pub mod status;

use axum::Json;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::ServerError;

/// JSON body checked against its `validator` rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct Valid<T>(pub T);

impl<T, S> FromRequest<S> for Valid<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(
        req: Request,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(Valid(value))
    }
}

/// Memory-backed state. MUST NEVER be used in production.
#[cfg(test)]
pub fn state() -> crate::AppState {
    use std::sync::Arc;

    use crate::adapters::clock::SystemClock;
    use crate::adapters::crypto::argon2::Argon2PasswordHasher;
    use crate::adapters::persistence::memory::MemoryStore;
    use crate::adapters::telemetry::TracingTelemetry;
    use crate::application::usecases::authentication::tests::token_issuer;
    use crate::application::usecases::{
        AuthenticationService, LinkReconciler, SignUpPolicy, Stores,
    };

    let stores = Stores::shared(Arc::new(MemoryStore::new()));
    let telemetry = Arc::new(TracingTelemetry::new());
    let clock = Arc::new(SystemClock::new());

    crate::AppState {
        config: Arc::new(crate::config::Configuration::default()),
        auth: Arc::new(AuthenticationService::new(
            stores.clone(),
            Arc::new(Argon2PasswordHasher::new(1024, 1, 1).unwrap()),
            token_issuer(),
            telemetry.clone(),
            clock.clone(),
            SignUpPolicy::default(),
        )),
        reconciler: Arc::new(LinkReconciler::new(stores, telemetry, clock, 0)),
        metrics: None,
    }
}
