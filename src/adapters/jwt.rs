//! Session token signing and verification.
//!
//! Tokens are signed either with a shared secret (HS256) or with an ECDSA
//! P-256 key pair (ES256).

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
};
use rand::Rng;
use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

use crate::application::dto::PrincipalDto;
use crate::application::error::{ApplicationError, Result, ToInternal};
use crate::application::ports::outbound::{
    SignedToken, TokenClaims, TokenIssuer,
};

const JTI_LENGTH: usize = 12;
const DEFAULT_AUDIENCE: &str = "account";
pub const DEFAULT_TTL: u64 = 900; // 15 minutes.

/// JWT issuer.
pub struct JwtTokenIssuer {
    algorithm: Algorithm,
    kid: Option<String>,
    issuer: String,
    audience: String,
    ttl: u64,
    encoding_key: EncodingKey,
    decoding_key: Option<DecodingKey>,
}

impl JwtTokenIssuer {
    /// Create a new HS256 [`JwtTokenIssuer`].
    pub fn from_secret(issuer: impl Into<String>, secret: &[u8]) -> Result<Self> {
        if secret.is_empty() {
            return Err(ApplicationError::internal(std::io::Error::other(
                "token secret is empty",
            )));
        }

        Ok(Self {
            algorithm: Algorithm::HS256,
            kid: None,
            issuer: issuer.into(),
            audience: DEFAULT_AUDIENCE.to_string(),
            ttl: DEFAULT_TTL,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: Some(DecodingKey::from_secret(secret)),
        })
    }

    /// Create a new ES256 [`JwtTokenIssuer`].
    ///
    /// Without a public key, issued tokens cannot be introspected.
    pub fn from_ec_pem(
        kid: impl Into<String>,
        issuer: impl Into<String>,
        public_key_pem: &str,
        private_key_pem: &str,
    ) -> Result<Self> {
        let encoding_key =
            EncodingKey::from_ec_pem(private_key_pem.as_bytes()).catch()?;

        let decoding_key = if !public_key_pem.is_empty() {
            Some(DecodingKey::from_ec_pem(public_key_pem.as_bytes()).catch()?)
        } else {
            None
        };

        Ok(Self {
            algorithm: Algorithm::ES256,
            kid: Some(kid.into()),
            issuer: issuer.into(),
            audience: DEFAULT_AUDIENCE.to_string(),
            ttl: DEFAULT_TTL,
            encoding_key,
            decoding_key,
        })
    }

    /// Set `audience` field on JWT.
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = audience.into();
        self
    }

    /// Set token lifetime, in seconds.
    pub fn with_ttl(mut self, ttl: u64) -> Self {
        self.ttl = ttl.max(1);
        self
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct JwtClaims {
    sub: String,
    name: String,
    roles: Vec<String>,
    iss: String,
    aud: String,
    exp: u64,
    iat: u64,
    jti: String,
}

impl TokenIssuer for JwtTokenIssuer {
    fn issue(
        &self,
        principal: &PrincipalDto,
        issued_at: u64,
    ) -> Result<SignedToken> {
        let mut header = Header::new(self.algorithm);
        header.kid = self.kid.clone();

        let claims = JwtClaims {
            sub: principal.id.to_string(),
            name: principal.name.clone(),
            roles: principal.roles.clone(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            exp: issued_at.saturating_add(self.ttl),
            iat: issued_at,
            jti: OsRng
                .sample_iter(&Alphanumeric)
                .take(JTI_LENGTH)
                .map(char::from)
                .collect(),
        };

        Ok(SignedToken {
            token: encode(&header, &claims, &self.encoding_key).catch()?,
            expires_in: self.ttl,
        })
    }

    fn introspect(&self, token: &str) -> Result<TokenClaims> {
        let decoding_key = self
            .decoding_key
            .as_ref()
            .ok_or(ApplicationError::InvalidCredentials)?;

        let mut validation = Validation::new(self.algorithm);
        validation.set_audience(&[&self.audience]);
        validation.set_issuer(&[&self.issuer]);

        let token_data = decode::<JwtClaims>(token, decoding_key, &validation)
            .map_err(|_| ApplicationError::InvalidCredentials)?;

        Ok(TokenClaims {
            sub: token_data.claims.sub,
            name: token_data.claims.name,
            roles: token_data.claims.roles,
            iss: token_data.claims.iss,
            aud: token_data.claims.aud,
            exp: token_data.claims.exp,
            iat: token_data.claims.iat,
            jti: token_data.claims.jti,
        })
    }
}
