//! Test data

mod fixtures;

pub use fixtures::{BatchConfig, TestDataFactory, TestScenario};
