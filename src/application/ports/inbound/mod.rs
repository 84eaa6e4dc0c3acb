//! These traits define what the application can do.

pub mod authentication;
pub mod reconcile;

pub use authentication::*;
pub use reconcile::*;
