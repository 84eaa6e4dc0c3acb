//! Sign-in and account provisioning service issuing signed session tokens.

#![forbid(unsafe_code)]
pub mod adapters;
pub mod application;
pub mod config;
mod database;
pub mod domain;
pub mod error;
mod router;
pub mod telemetry;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{Method, StatusCode, header};
use axum::routing::{get, post};
use axum::{Router, middleware as AxumMiddleware};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tower::ServiceBuilder;
use tower_http::LatencyUnit;
use tower_http::cors::{Any, CorsLayer};
use tower_http::sensitive_headers::SetSensitiveHeadersLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{
    DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer,
};

use crate::adapters::clock::SystemClock;
use crate::adapters::crypto::argon2::Argon2PasswordHasher;
use crate::adapters::jwt::JwtTokenIssuer;
use crate::adapters::persistence::{memory, postgres};
use crate::adapters::telemetry::TracingTelemetry;
use crate::application::error::ApplicationError;
use crate::application::ports::inbound::{Authentication, ReconcileLinks};
use crate::application::usecases::{
    AuthenticationService, LinkReconciler, SignUpPolicy, Stores,
};

const DEFAULT_KEY_ID: &str = "default";

/// MUST NEVER be used in production.
#[cfg(test)]
pub async fn make_request(
    app: Router,
    method: Method,
    path: &str,
    body: String,
) -> axum::http::Response<axum::body::Body> {
    use axum::extract::Request;
    use tower::util::ServiceExt;

    app.oneshot(
        Request::builder()
            .method(method)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(axum::body::Body::from(body))
            .unwrap(),
    )
    .await
    .unwrap()
}

/// State sharing between routes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::Configuration>,
    pub auth: Arc<dyn Authentication>,
    pub reconciler: Arc<dyn ReconcileLinks>,
    /// Set when the Prometheus recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

/// Create router.
pub fn app(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        // Add high level tracing/logging to all requests.
        .layer(
            TraceLayer::new_for_http()
                .on_body_chunk(|chunk: &Bytes, latency: Duration, _span: &tracing::Span| {
                    tracing::trace!(size_bytes = chunk.len(), latency = ?latency, "sending body chunk")
                })
                .make_span_with(DefaultMakeSpan::new().include_headers(true).level(tracing::Level::INFO))
                .on_request(DefaultOnRequest::new())
                .on_response(DefaultOnResponse::new().include_headers(true).latency_unit(LatencyUnit::Micros)),
        )
        // Set a timeout.
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, Duration::from_secs(10)))
        // Remove senstive headers from trace.
        .layer(SetSensitiveHeadersLayer::new([header::AUTHORIZATION, header::COOKIE]))
        // Add CORS preflight support.
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers(Any),
        );

    let auth_router = Router::new()
        // `POST /api/auth/signin` goes to `sign_in`.
        .route("/signin", post(router::sign_in::handler))
        // `POST /api/auth/signup` goes to `sign_up`.
        .route("/signup", post(router::sign_up::handler));

    Router::new()
        // `GET /status.json` goes to `status`.
        .route("/status.json", get(router::status::status))
        .route("/metrics", get(router::metrics::handler))
        .nest("/api/auth", auth_router)
        .with_state(state)
        .route_layer(AxumMiddleware::from_fn(telemetry::track))
        .layer(middleware)
}

/// Build the session token issuer from the `token` section.
fn token_issuer(
    config: &config::Configuration,
) -> Result<JwtTokenIssuer, ApplicationError> {
    let Some(token) = &config.token else {
        return Err(ApplicationError::internal(std::io::Error::other(
            "missing `token` entry on `config.yaml` file or `TOKEN_SECRET` variable",
        )));
    };

    let issuer = match (&token.secret, &token.private_key_pem) {
        (Some(secret), _) => {
            JwtTokenIssuer::from_secret(&config.url, secret.as_bytes())?
        },
        (None, Some(private_key_pem)) => JwtTokenIssuer::from_ec_pem(
            token.key_id.as_deref().unwrap_or(DEFAULT_KEY_ID),
            &config.url,
            token.public_key_pem.as_deref().unwrap_or_default(),
            private_key_pem,
        )?,
        (None, None) => {
            return Err(ApplicationError::internal(std::io::Error::other(
                "`token` entry needs a `secret` or a `private_key_pem`",
            )));
        },
    };

    let issuer = match &token.audience {
        Some(audience) => issuer.with_audience(audience),
        None => issuer,
    };

    Ok(match token.ttl_secs {
        Some(ttl) => issuer.with_ttl(ttl),
        None => issuer,
    })
}

/// Initialize the application state.
pub async fn initialize_state(
    config: Arc<config::Configuration>,
) -> Result<AppState, Box<dyn std::error::Error>> {
    let stores = match config.postgres {
        Some(ref pg_config) => {
            let db = database::Database::from_config(pg_config).await?;
            // execute migrations scripts on start.
            db.migrate().await?;
            postgres::stores(db.postgres)
        },
        None => {
            tracing::warn!(
                "missing `postgres` entry on `config.yaml` file, accounts are kept in memory"
            );
            Stores::shared(Arc::new(memory::MemoryStore::new()))
        },
    };

    let hasher = Argon2PasswordHasher::try_from(&config.argon2)?;
    let token = token_issuer(&config)?;
    let events = Arc::new(TracingTelemetry::new());
    let clock = Arc::new(SystemClock::new());

    let policy = SignUpPolicy {
        default_role: config.roles.default,
        link_attempts: config.reconciliation.link_attempts,
        ..Default::default()
    };

    let auth = AuthenticationService::new(
        stores.clone(),
        Arc::new(hasher),
        Arc::new(token),
        events.clone(),
        clock.clone(),
        policy,
    );
    let reconciler = LinkReconciler::new(
        stores,
        events,
        clock,
        config.reconciliation.grace_secs,
    )
    .with_batch_size(config.reconciliation.batch_size);

    let metrics = if config.telemetry.prometheus {
        Some(telemetry::setup_metrics_recorder()?)
    } else {
        None
    };

    Ok(AppState {
        config,
        auth: Arc::new(auth),
        reconciler: Arc::new(reconciler),
        metrics,
    })
}

/// Run reconciliation sweeps every `interval_secs` seconds.
///
/// Returns `None` when `interval_secs` is `0`.
pub fn spawn_reconciliation(
    reconciler: Arc<dyn ReconcileLinks>,
    interval_secs: u64,
) -> Option<JoinHandle<()>> {
    if interval_secs == 0 {
        tracing::info!("link reconciliation disabled");
        return None;
    }

    Some(tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(Duration::from_secs(interval_secs));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;

            if let Err(err) = reconciler.sweep().await {
                tracing::error!(error = %err, "reconciliation sweep failed");
            }
        }
    }))
}
