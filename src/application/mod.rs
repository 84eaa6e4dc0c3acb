//! Use cases and the ports they need from the outside world.

pub mod dto;
pub mod error;
pub mod ports;
pub mod usecases;
