//! Wallet compliance screening service.
//!
//! Screens wallet addresses against a precedence-ordered rule table, persists
//! every screening as an append-only record, and serves filtered, paginated
//! screening history.

pub mod api;
pub mod app;
pub mod domain;
pub mod infra;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
