//! Implementations of the outbound ports.

pub mod clock;
pub mod crypto;
pub mod jwt;
pub mod persistence;
pub mod telemetry;
