//! Entities and value objects of the account domain.

pub mod email;
pub mod error;
pub mod identity;
pub mod name;
pub mod password;
pub mod profile;
pub mod role;
