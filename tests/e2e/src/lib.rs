//! End-to-end test support for Brightcards
//!
//! - [`harness`]: isolated temporary databases
//! - [`mocks`]: card factories and pre-built scheduling scenarios

pub mod harness;
pub mod mocks;

pub use harness::TestDatabaseManager;
pub use mocks::{BatchConfig, TestDataFactory, TestScenario};
