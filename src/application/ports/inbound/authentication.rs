//! Authentication use case port.

use async_trait::async_trait;

use crate::application::dto::{
    SessionDto, SignInRequestDto, SignUpConfirmationDto, SignUpRequestDto,
};
use crate::application::error::Result;

/// Inbound port for signing in and provisioning accounts.
#[async_trait]
pub trait Authentication: Send + Sync {
    /// Verify credentials and issue a session token.
    async fn sign_in(&self, request: SignInRequestDto) -> Result<SessionDto>;

    /// Create a linked identity and profile.
    async fn sign_up(
        &self,
        request: SignUpRequestDto,
    ) -> Result<SignUpConfirmationDto>;
}
