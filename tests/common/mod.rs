//! Shared fixtures for the integration tests.

#![allow(dead_code)] // Each test binary uses a different subset

pub mod builders;
pub mod mocks;
pub mod strategies;

pub use builders::*;
pub use mocks::*;

pub const PROJECT_ID: &str = "project-1";
