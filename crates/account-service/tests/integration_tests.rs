//! Integration tests for the account service.
//!
//! This is the top-level integration test harness that Cargo discovers.
//! Test modules are organized in the integration/ subdirectory.

#[path = "integration/registration_tests.rs"]
mod registration_tests;

#[path = "integration/session_tests.rs"]
mod session_tests;
