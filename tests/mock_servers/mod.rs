//! Mock external services for integration tests

pub mod multiroom;
