//! Network-dependent test utilities.
//!
//! Tests against a running cluster are `#[ignore]`d and additionally gated on
//! `RUN_NETWORK_TESTS`, so `cargo test -- --ignored` stays safe offline.

use std::env;

use executor_resolver::Address;

/// Environment variable to enable network tests.
pub const RUN_NETWORK_TESTS_VAR: &str = "RUN_NETWORK_TESTS";

/// Base58 fee payer used when simulating against localnet.
pub const FEE_PAYER_VAR: &str = "RESOLVER_FEE_PAYER";

pub fn should_run_network_tests() -> bool {
    env::var(RUN_NETWORK_TESTS_VAR)
        .map(|v| !v.is_empty())
        .unwrap_or(false)
}

/// Fee payer from `RESOLVER_FEE_PAYER`, if set and valid.
pub fn localnet_fee_payer() -> Option<Address> {
    env::var(FEE_PAYER_VAR).ok()?.parse().ok()
}

/// Skip a test if network tests are not enabled.
#[macro_export]
macro_rules! skip_if_no_network {
    () => {
        if !$crate::common::network::should_run_network_tests() {
            eprintln!(
                "Skipping {}: {} not set",
                module_path!(),
                $crate::common::network::RUN_NETWORK_TESTS_VAR
            );
            return;
        }
    };
}
