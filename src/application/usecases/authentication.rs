//! Sign-in and sign-up use case implementation.

use std::sync::Arc;

use async_trait::async_trait;

use crate::application::dto::{
    PrincipalDto, SessionDto, SignInRequestDto, SignUpConfirmationDto,
    SignUpRequestDto,
};
use crate::application::error::{ApplicationError, Result, SignUpStage};
use crate::application::ports::inbound::Authentication;
use crate::application::ports::outbound::{
    Clock, PasswordHasher, TelemetryPort, TokenIssuer,
};
use crate::application::usecases::link::link_pair;
use crate::application::usecases::{SignUpPolicy, Stores, TOKEN_TYPE};
use crate::domain::email::EmailAddress;
use crate::domain::identity::Identity;
use crate::domain::name::PersonName;
use crate::domain::password::{Password, PasswordHash};
use crate::domain::profile::Profile;

/// Password hashed at start-up, verified against when no identity matches.
const DECOY_PASSWORD: &str = "decoy-password";

/// Authentication use case service.
pub struct AuthenticationService {
    stores: Stores,
    hasher: Arc<dyn PasswordHasher>,
    token: Arc<dyn TokenIssuer>,
    telemetry: Arc<dyn TelemetryPort>,
    clock: Arc<dyn Clock>,
    policy: SignUpPolicy,
    decoy: Option<(Password, PasswordHash)>,
}

impl AuthenticationService {
    pub fn new(
        stores: Stores,
        hasher: Arc<dyn PasswordHasher>,
        token: Arc<dyn TokenIssuer>,
        telemetry: Arc<dyn TelemetryPort>,
        clock: Arc<dyn Clock>,
        policy: SignUpPolicy,
    ) -> Self {
        let decoy = Password::presented(DECOY_PASSWORD)
            .map_err(ApplicationError::from)
            .and_then(|password| {
                let hash = hasher.hash(&password)?;
                Ok((password, hash))
            })
            .inspect_err(|err| {
                tracing::warn!(error = %err, "cannot hash decoy password, unknown emails fail fast");
            })
            .ok();

        Self {
            stores,
            hasher,
            token,
            telemetry,
            clock,
            policy,
            decoy,
        }
    }

    /// Run one password verification whose outcome is discarded.
    ///
    /// Rejections without a stored hash then take as long as a wrong
    /// password.
    fn verify_decoy(&self, password: Option<&Password>) {
        if let Some((decoy_password, decoy_hash)) = &self.decoy {
            let _ = self
                .hasher
                .verify(password.unwrap_or(decoy_password), decoy_hash);
        }
    }

    /// Link the freshly created pair, replaying the idempotent link on
    /// failure.
    async fn link_with_retry(
        &self,
        identity: &Identity,
        profile: &Profile,
    ) -> Result<()> {
        let attempts = self.policy.link_attempts.max(1);
        let mut attempt = 1;

        loop {
            match link_pair(&self.stores, identity.clone(), profile.clone())
                .await
            {
                Ok(_) => return Ok(()),
                Err(err) if attempt < attempts => {
                    tracing::warn!(
                        attempt,
                        identity_id = ?identity.id(),
                        profile_id = ?profile.id(),
                        error = %err,
                        "linking identity and profile failed, retrying"
                    );
                    tokio::time::sleep(self.policy.link_backoff * attempt)
                        .await;
                    attempt += 1;
                },
                Err(err) => return Err(err),
            }
        }
    }
}

#[async_trait]
impl Authentication for AuthenticationService {
    async fn sign_in(&self, request: SignInRequestDto) -> Result<SessionDto> {
        // Malformed input is answered like any other credential failure.
        let (Ok(email), Ok(password)) = (
            EmailAddress::parse(request.email),
            Password::presented(request.password),
        ) else {
            self.verify_decoy(None);
            self.telemetry.record_sign_in_failure("malformed_input");
            return Err(ApplicationError::InvalidCredentials);
        };

        let Some(identity) = self.stores.credentials.find_by_email(&email).await?
        else {
            self.verify_decoy(Some(&password));
            self.telemetry.record_sign_in_failure("unknown_email");
            return Err(ApplicationError::InvalidCredentials);
        };

        if let Err(err) = self.hasher.verify(&password, identity.password_hash())
        {
            if matches!(err, ApplicationError::InvalidCredentials) {
                self.telemetry.record_sign_in_failure("password_mismatch");
            }
            return Err(err);
        }

        let principal = PrincipalDto {
            id: identity.id().ok_or(ApplicationError::NotFound)?,
            name: identity.email().to_string(),
            roles: identity.role_names(),
        };
        let signed = self.token.issue(&principal, self.clock.now())?;

        self.telemetry.record_sign_in_success(principal.id);

        Ok(SessionDto {
            token: signed.token,
            token_type: TOKEN_TYPE.to_string(),
            expires_in: signed.expires_in,
            principal,
        })
    }

    async fn sign_up(
        &self,
        request: SignUpRequestDto,
    ) -> Result<SignUpConfirmationDto> {
        let email = EmailAddress::parse(request.email)?;
        let name = PersonName::new(&request.first_name, &request.last_name)?;
        let password = Password::new(request.password)?;

        if self.stores.credentials.exists_by_email(&email).await? {
            self.telemetry.record_sign_up_rejected("duplicate_account");
            return Err(ApplicationError::DuplicateAccount);
        }

        let role = self.policy.default_role;
        let Some(default_role) = self.stores.roles.find_by_name(role).await?
        else {
            tracing::error!(%role, "default role is not seeded in the role catalog");
            return Err(ApplicationError::RoleCatalogCorrupt { role });
        };

        let password_hash = self.hasher.hash(&password)?;

        let identity = Identity::new(
            email.clone(),
            name.clone(),
            password_hash,
            [default_role],
            self.clock.now(),
        )?;

        // The store's unique constraint settles concurrent sign-ups that
        // all passed the existence check.
        let identity = match self.stores.credentials.save(identity).await {
            Ok(identity) => identity,
            Err(ApplicationError::UniqueViolation(_)) => {
                self.telemetry.record_sign_up_rejected("duplicate_account");
                return Err(ApplicationError::DuplicateAccount);
            },
            Err(err) => return Err(err),
        };
        let identity_id = identity.id().ok_or(ApplicationError::NotFound)?;

        let profile = match self
            .stores
            .profiles
            .save_or_update(Profile::new(name, email))
            .await
        {
            Ok(profile) => profile,
            Err(err) => {
                let stage = SignUpStage::IdentityCreated;
                tracing::error!(%identity_id, %stage, error = %err, "profile creation failed, identity left unlinked");
                self.telemetry.record_partial_failure(stage, identity_id, None);
                return Err(ApplicationError::PartialFailure {
                    stage,
                    identity_id,
                    profile_id: None,
                    source: Box::new(err),
                });
            },
        };
        let profile_id = profile.id().ok_or(ApplicationError::NotFound)?;

        if let Err(err) = self.link_with_retry(&identity, &profile).await {
            let stage = SignUpStage::ProfileCreated;
            tracing::error!(%identity_id, %profile_id, %stage, error = %err, "linking failed, pair left for reconciliation");
            self.telemetry
                .record_partial_failure(stage, identity_id, Some(profile_id));
            return Err(ApplicationError::PartialFailure {
                stage,
                identity_id,
                profile_id: Some(profile_id),
                source: Box::new(err),
            });
        }

        self.telemetry.record_account_created(identity_id);

        Ok(SignUpConfirmationDto {
            identity_id,
            profile_id,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::adapters::clock::SystemClock;
    use crate::adapters::crypto::argon2::Argon2PasswordHasher;
    use crate::adapters::jwt::JwtTokenIssuer;
    use crate::adapters::persistence::memory::MemoryStore;
    use crate::adapters::telemetry::TracingTelemetry;
    use crate::application::ports::inbound::ReconcileLinks;
    use crate::application::ports::outbound::{CredentialStore, ProfileStore};
    use crate::application::usecases::LinkReconciler;
    use crate::domain::email::EmailAddress;
    use crate::domain::profile::ProfileId;
    use crate::domain::role::{RoleName, Role};

    pub(crate) const ISSUER: &str = "https://auth.test/";

    pub(crate) fn token_issuer() -> Arc<JwtTokenIssuer> {
        Arc::new(JwtTokenIssuer::from_secret(ISSUER, b"test-secret").unwrap())
    }

    pub(crate) fn policy() -> SignUpPolicy {
        SignUpPolicy {
            link_backoff: Duration::ZERO,
            ..Default::default()
        }
    }

    pub(crate) fn service_with(
        stores: Stores,
        policy: SignUpPolicy,
    ) -> AuthenticationService {
        AuthenticationService::new(
            stores,
            Arc::new(Argon2PasswordHasher::new(1024, 1, 1).unwrap()),
            token_issuer(),
            Arc::new(TracingTelemetry::new()),
            Arc::new(SystemClock::new()),
            policy,
        )
    }

    pub(crate) fn sign_up_request(email: &str, password: &str) -> SignUpRequestDto {
        SignUpRequestDto {
            first_name: "Ann".into(),
            last_name: "Lee".into(),
            email: email.into(),
            password: password.into(),
        }
    }

    fn sign_in_request(email: &str, password: &str) -> SignInRequestDto {
        SignInRequestDto {
            email: email.into(),
            password: password.into(),
        }
    }

    fn email(value: &str) -> EmailAddress {
        EmailAddress::parse(value).unwrap()
    }

    /// Profile store failing the first `failures` link writes.
    pub(crate) struct FailingLinks {
        pub(crate) inner: Arc<MemoryStore>,
        pub(crate) failures: AtomicU32,
    }

    #[async_trait]
    impl ProfileStore for FailingLinks {
        async fn save_or_update(&self, profile: Profile) -> Result<Profile> {
            if profile.identity_id().is_some()
                && self
                    .failures
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                        n.checked_sub(1)
                    })
                    .is_ok()
            {
                return Err(ApplicationError::internal(std::io::Error::other(
                    "connection reset",
                )));
            }
            self.inner.save_or_update(profile).await
        }

        async fn find_by_id(&self, id: ProfileId) -> Result<Option<Profile>> {
            ProfileStore::find_by_id(self.inner.as_ref(), id).await
        }

        async fn list_by_email(
            &self,
            email: &EmailAddress,
        ) -> Result<Vec<Profile>> {
            self.inner.list_by_email(email).await
        }

        async fn find_unlinked(
            &self,
            after: Option<ProfileId>,
            limit: usize,
        ) -> Result<Vec<Profile>> {
            ProfileStore::find_unlinked(self.inner.as_ref(), after, limit).await
        }
    }

    pub(crate) fn failing_links(
        store: &Arc<MemoryStore>,
        failures: u32,
    ) -> Stores {
        Stores {
            profiles: Arc::new(FailingLinks {
                inner: Arc::clone(store),
                failures: AtomicU32::new(failures),
            }),
            ..Stores::shared(Arc::clone(store))
        }
    }

    /// Profile store refusing every new profile.
    struct FailingInserts(Arc<MemoryStore>);

    #[async_trait]
    impl ProfileStore for FailingInserts {
        async fn save_or_update(&self, profile: Profile) -> Result<Profile> {
            if profile.id().is_none() {
                return Err(ApplicationError::internal(std::io::Error::other(
                    "profiles table is read-only",
                )));
            }
            self.0.save_or_update(profile).await
        }

        async fn find_by_id(&self, id: ProfileId) -> Result<Option<Profile>> {
            ProfileStore::find_by_id(self.0.as_ref(), id).await
        }

        async fn list_by_email(
            &self,
            email: &EmailAddress,
        ) -> Result<Vec<Profile>> {
            self.0.list_by_email(email).await
        }

        async fn find_unlinked(
            &self,
            after: Option<ProfileId>,
            limit: usize,
        ) -> Result<Vec<Profile>> {
            ProfileStore::find_unlinked(self.0.as_ref(), after, limit).await
        }
    }

    /// Argon2 hasher counting verifications.
    struct CountingHasher {
        inner: Argon2PasswordHasher,
        verifications: AtomicUsize,
    }

    impl PasswordHasher for CountingHasher {
        fn hash(&self, password: &Password) -> Result<PasswordHash> {
            self.inner.hash(password)
        }

        fn verify(&self, password: &Password, hash: &PasswordHash) -> Result<()> {
            self.verifications.fetch_add(1, Ordering::SeqCst);
            self.inner.verify(password, hash)
        }
    }

    #[tokio::test]
    async fn test_sign_up_registers_email() {
        let store = Arc::new(MemoryStore::new());
        let service = service_with(Stores::shared(store.clone()), policy());

        service
            .sign_up(sign_up_request("ann@x.com", "secret1"))
            .await
            .unwrap();

        assert!(store.exists_by_email(&email("ann@x.com")).await.unwrap());
    }

    #[tokio::test]
    async fn test_sign_up_twice_is_duplicate() {
        let store = Arc::new(MemoryStore::new());
        let service = service_with(Stores::shared(store.clone()), policy());

        service
            .sign_up(sign_up_request("ann@x.com", "secret1"))
            .await
            .unwrap();
        let err = service
            .sign_up(sign_up_request("ann@x.com", "another1"))
            .await
            .unwrap_err();

        assert!(matches!(err, ApplicationError::DuplicateAccount));
        assert_eq!(store.identity_count(&email("ann@x.com")).await, 1);
        assert_eq!(store.profile_count().await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_sign_ups_create_one_identity() {
        let store = Arc::new(MemoryStore::new());
        let service =
            Arc::new(service_with(Stores::shared(store.clone()), policy()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = Arc::clone(&service);
                tokio::spawn(async move {
                    service
                        .sign_up(sign_up_request("race@x.com", "secret1"))
                        .await
                })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(ApplicationError::DuplicateAccount) => (),
                Err(err) => panic!("unexpected error: {err}"),
            }
        }

        assert_eq!(created, 1);
        assert_eq!(store.identity_count(&email("race@x.com")).await, 1);
    }

    #[tokio::test]
    async fn test_sign_up_links_both_sides() {
        let store = Arc::new(MemoryStore::new());
        let service = service_with(Stores::shared(store.clone()), policy());

        let confirmation = service
            .sign_up(sign_up_request("ann@x.com", "secret1"))
            .await
            .unwrap();

        let identity = store
            .find_by_email(&email("ann@x.com"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(identity.id(), Some(confirmation.identity_id));
        assert_eq!(identity.profile_id(), Some(confirmation.profile_id));

        let profile = ProfileStore::find_by_id(store.as_ref(), confirmation.profile_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(profile.identity_id(), identity.id());
        assert_eq!(profile.email(), identity.email());
        assert_eq!(profile.name(), identity.name());
    }

    #[tokio::test]
    async fn test_sign_up_grants_default_role_only() {
        let store = Arc::new(MemoryStore::new());
        let service = service_with(Stores::shared(store.clone()), policy());

        service
            .sign_up(sign_up_request("ann@x.com", "secret1"))
            .await
            .unwrap();

        let identity = store
            .find_by_email(&email("ann@x.com"))
            .await
            .unwrap()
            .unwrap();
        let roles: Vec<RoleName> = identity.roles().iter().map(Role::name).collect();
        assert_eq!(roles, vec![RoleName::User]);
    }

    #[tokio::test]
    async fn test_sign_up_never_stores_plaintext() {
        let store = Arc::new(MemoryStore::new());
        let service = service_with(Stores::shared(store.clone()), policy());

        service
            .sign_up(sign_up_request("ann@x.com", "secret1"))
            .await
            .unwrap();

        let identity = store
            .find_by_email(&email("ann@x.com"))
            .await
            .unwrap()
            .unwrap();
        assert!(!identity.password_hash().as_str().contains("secret1"));
        assert!(identity.password_hash().as_str().starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_sign_up_without_default_role() {
        let store = Arc::new(MemoryStore::with_roles([Role::new(
            2,
            RoleName::Admin,
        )]));
        let service = service_with(Stores::shared(store.clone()), policy());

        let err = service
            .sign_up(sign_up_request("ann@x.com", "secret1"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ApplicationError::RoleCatalogCorrupt {
                role: RoleName::User
            }
        ));
        assert!(!store.exists_by_email(&email("ann@x.com")).await.unwrap());
        assert_eq!(store.profile_count().await, 0);
    }

    #[tokio::test]
    async fn test_sign_up_rejects_invalid_input() {
        let store = Arc::new(MemoryStore::new());
        let service = service_with(Stores::shared(store.clone()), policy());

        for request in [
            sign_up_request("not-an-email", "secret1"),
            sign_up_request("ann@x.com", "short"),
            SignUpRequestDto {
                first_name: " ".into(),
                ..sign_up_request("ann@x.com", "secret1")
            },
        ] {
            let err = service.sign_up(request).await.unwrap_err();
            assert!(matches!(err, ApplicationError::Domain(_)), "{err:?}");
        }

        assert_eq!(store.profile_count().await, 0);
        assert!(!store.exists_by_email(&email("ann@x.com")).await.unwrap());
    }

    #[tokio::test]
    async fn test_link_retry_recovers() {
        let store = Arc::new(MemoryStore::new());
        let service = service_with(failing_links(&store, 1), policy());

        let confirmation = service
            .sign_up(sign_up_request("ann@x.com", "secret1"))
            .await
            .unwrap();

        let profile = ProfileStore::find_by_id(store.as_ref(), confirmation.profile_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(profile.identity_id(), Some(confirmation.identity_id));
    }

    #[tokio::test]
    async fn test_link_failure_is_partial() {
        let store = Arc::new(MemoryStore::new());
        let service = service_with(failing_links(&store, u32::MAX), policy());

        let err = service
            .sign_up(sign_up_request("ann@x.com", "secret1"))
            .await
            .unwrap_err();

        let ApplicationError::PartialFailure {
            stage,
            identity_id,
            profile_id: Some(profile_id),
            ..
        } = err
        else {
            panic!("expected a partial failure, got {err:?}");
        };
        assert_eq!(stage, SignUpStage::ProfileCreated);

        // Identity side was written, profile side was not.
        let identity = CredentialStore::find_by_id(store.as_ref(), identity_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(identity.profile_id(), Some(profile_id));
        let profile = ProfileStore::find_by_id(store.as_ref(), profile_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(profile.identity_id(), None);
    }

    #[tokio::test]
    async fn test_profile_failure_leaves_identity_for_sweep() {
        let store = Arc::new(MemoryStore::new());
        let stores = Stores {
            profiles: Arc::new(FailingInserts(Arc::clone(&store))),
            ..Stores::shared(Arc::clone(&store))
        };
        let service = service_with(stores, policy());

        let err = service
            .sign_up(sign_up_request("ann@x.com", "secret1"))
            .await
            .unwrap_err();

        let ApplicationError::PartialFailure {
            stage,
            identity_id,
            profile_id,
            ..
        } = err
        else {
            panic!("expected a partial failure, got {err:?}");
        };
        assert_eq!(stage, SignUpStage::IdentityCreated);
        assert_eq!(profile_id, None);

        let identity = CredentialStore::find_by_id(store.as_ref(), identity_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(identity.profile_id(), None);
        assert_eq!(store.profile_count().await, 0);

        let report = LinkReconciler::new(
            Stores::shared(Arc::clone(&store)),
            Arc::new(TracingTelemetry::new()),
            Arc::new(SystemClock::new()),
            0,
        )
        .sweep()
        .await
        .unwrap();
        assert_eq!(report.created_profiles, 1);

        let identity = CredentialStore::find_by_id(store.as_ref(), identity_id)
            .await
            .unwrap()
            .unwrap();
        let profile_id = identity.profile_id().expect("identity is linked");
        let profile = ProfileStore::find_by_id(store.as_ref(), profile_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(profile.identity_id(), Some(identity_id));
    }

    #[tokio::test]
    async fn test_rejected_sign_ins_verify_a_hash() {
        let store = Arc::new(MemoryStore::new());
        let hasher = Arc::new(CountingHasher {
            inner: Argon2PasswordHasher::new(1024, 1, 1).unwrap(),
            verifications: AtomicUsize::new(0),
        });
        let service = AuthenticationService::new(
            Stores::shared(store.clone()),
            hasher.clone(),
            token_issuer(),
            Arc::new(TracingTelemetry::new()),
            Arc::new(SystemClock::new()),
            policy(),
        );

        service
            .sign_up(sign_up_request("ann@x.com", "secret1"))
            .await
            .unwrap();

        for request in [
            sign_in_request("ann@x.com", "wrongpass"),
            sign_in_request("nobody@x.com", "anything"),
            sign_in_request("nobody", ""),
        ] {
            let before = hasher.verifications.load(Ordering::SeqCst);
            let err = service.sign_in(request).await.unwrap_err();

            assert!(matches!(err, ApplicationError::InvalidCredentials));
            assert_eq!(hasher.verifications.load(Ordering::SeqCst), before + 1);
        }
    }

    #[tokio::test]
    async fn test_sign_in_issues_token() {
        let store = Arc::new(MemoryStore::new());
        let service = service_with(Stores::shared(store.clone()), policy());

        let confirmation = service
            .sign_up(sign_up_request("ann@x.com", "secret1"))
            .await
            .unwrap();
        let session = service
            .sign_in(sign_in_request("ann@x.com", "secret1"))
            .await
            .unwrap();

        assert_eq!(session.token_type, TOKEN_TYPE);
        assert_eq!(session.principal.id, confirmation.identity_id);
        assert_eq!(session.principal.name, "ann@x.com");
        assert_eq!(session.principal.roles, vec!["USER"]);

        let claims = token_issuer().introspect(&session.token).unwrap();
        assert_eq!(claims.sub, confirmation.identity_id.to_string());
        assert_eq!(claims.roles, vec!["USER"]);
        assert_eq!(claims.exp - claims.iat, session.expires_in);
    }

    #[tokio::test]
    async fn test_sign_in_failures_are_indistinguishable() {
        let store = Arc::new(MemoryStore::new());
        let service = service_with(Stores::shared(store.clone()), policy());

        service
            .sign_up(sign_up_request("ann@x.com", "secret1"))
            .await
            .unwrap();

        let wrong_password = service
            .sign_in(sign_in_request("ann@x.com", "wrongpass"))
            .await
            .unwrap_err();
        let unknown_email = service
            .sign_in(sign_in_request("nobody@x.com", "anything"))
            .await
            .unwrap_err();
        let malformed = service
            .sign_in(sign_in_request("nobody", ""))
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, ApplicationError::InvalidCredentials));
        assert!(matches!(unknown_email, ApplicationError::InvalidCredentials));
        assert!(matches!(malformed, ApplicationError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[tokio::test]
    async fn test_sign_in_is_case_sensitive() {
        let store = Arc::new(MemoryStore::new());
        let service = service_with(Stores::shared(store.clone()), policy());

        service
            .sign_up(sign_up_request("ann@x.com", "secret1"))
            .await
            .unwrap();

        let err = service
            .sign_in(sign_in_request("ANN@x.com", "secret1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::InvalidCredentials));
    }
}
