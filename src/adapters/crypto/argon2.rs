//! Argon2id password hasher implementation.

use argon2::password_hash::{
    PasswordHash, PasswordHasher as Argon2PasswordHasherTrait,
    PasswordVerifier, SaltString,
};
use argon2::{Argon2, Params, Version};
use rand::rngs::OsRng;

use crate::application::error::{ApplicationError, Result, ToInternal};
use crate::application::ports::outbound::PasswordHasher;
use crate::config::Argon2 as ArgonConfig;
use crate::domain::password::{Password, PasswordHash as DomainPasswordHash};

const OUTPUT_LENGTH: usize = 32;

/// Argon2id password hasher adapter.
pub struct Argon2PasswordHasher {
    params: Params,
}

impl Argon2PasswordHasher {
    /// Create a new Argon2 hasher with custom parameters.
    pub fn new(
        memory_cost: u32,
        iterations: u32,
        parallelism: u32,
    ) -> Result<Self> {
        Self::with_output_length(
            memory_cost,
            iterations,
            parallelism,
            OUTPUT_LENGTH,
        )
    }

    fn with_output_length(
        memory_cost: u32,
        iterations: u32,
        parallelism: u32,
        output_length: usize,
    ) -> Result<Self> {
        let params = Params::new(
            memory_cost,
            iterations,
            parallelism,
            Some(output_length),
        )
        .catch()?;

        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'_> {
        Argon2::new(
            argon2::Algorithm::Argon2id,
            Version::V0x13,
            self.params.clone(),
        )
    }
}

impl TryFrom<&ArgonConfig> for Argon2PasswordHasher {
    type Error = ApplicationError;

    fn try_from(config: &ArgonConfig) -> Result<Self> {
        Self::with_output_length(
            config.memory_cost,
            config.iterations,
            config.parallelism,
            config.hash_length,
        )
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, password: &Password) -> Result<DomainPasswordHash> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .catch()?;

        Ok(DomainPasswordHash::parse(hash.to_string())?)
    }

    fn verify(
        &self,
        password: &Password,
        hash: &DomainPasswordHash,
    ) -> Result<()> {
        let parsed_hash = PasswordHash::new(hash.as_str())
            .map_err(|_| ApplicationError::InvalidCredentials)?;

        self.argon2()
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| ApplicationError::InvalidCredentials)
    }
}
