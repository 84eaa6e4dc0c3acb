//! These traits define what the application needs from the outside world.

pub mod clock;
pub mod credential;
pub mod crypto;
pub mod profile;
pub mod role;
pub mod telemetry;
pub mod token;

pub use clock::*;
pub use credential::*;
pub use crypto::*;
pub use profile::*;
pub use role::*;
pub use telemetry::*;
pub use token::*;
