#![allow(unused_imports)]
//! Shared test utilities for integration tests.
//!
//! # Modules
//!
//! - `fixtures`: addresses, declared groups, lookup tables and interface descriptions
//! - `assertions`: assertion helpers with descriptive failure messages
//! - `network`: gating for tests that need a running cluster

pub mod assertions;
pub mod fixtures;
pub mod network;

pub use assertions::{
    assert_error_contains, assert_ok, assert_prefix_growth, assert_unique,
};
pub use fixtures::{addr, caller, program_id, sample_group, sample_table, write_idl};
pub use network::{localnet_fee_payer, should_run_network_tests};
