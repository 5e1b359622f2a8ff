//! Test doubles, available under `cfg(test)` or the `test-utils` feature.

pub mod mocks;

pub use mocks::{MockConfig, MockScreeningStore};
