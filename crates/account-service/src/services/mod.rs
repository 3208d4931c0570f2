//! Business logic layer.

pub mod provisioning;
pub mod session;
pub mod token_service;
