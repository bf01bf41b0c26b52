//! Shared fixtures for unit tests.
mod common;
mod mock;

pub use common::*;
pub use mock::*;
