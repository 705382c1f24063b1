//! Test helpers module
//!
//! Shared setup for the integration tests: an in-memory service graph,
//! fixture data, recording push transports, fault-injecting stores, a push
//! service mock server and a PostgreSQL test database.

#![allow(dead_code)]

pub mod database_helper;
pub mod faulty_store;
pub mod push_mock;
pub mod test_context;
pub mod test_data;

pub use database_helper::*;
pub use faulty_store::*;
pub use push_mock::*;
pub use test_context::*;
pub use test_data::*;
