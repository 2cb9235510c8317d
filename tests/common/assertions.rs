//! Assertion helpers for resolution tests.

use std::collections::HashSet;
use std::hash::Hash;

use executor_resolver::{Address, CallDescriptor};

/// Assert that a result is Ok and return the inner value.
#[allow(dead_code)]
pub fn assert_ok<T, E: std::fmt::Debug>(result: Result<T, E>, context: &str) -> T {
    match result {
        Ok(v) => v,
        Err(e) => panic!("{} failed: {:?}", context, e),
    }
}

/// Assert that an error message contains expected text (case-insensitive).
#[allow(dead_code)]
pub fn assert_error_contains<E: std::fmt::Display>(error: E, expected_text: &str, context: &str) {
    let error_str = error.to_string().to_lowercase();
    assert!(
        error_str.contains(&expected_text.to_lowercase()),
        "{}: error message should contain '{}', got: {}",
        context,
        expected_text,
        error
    );
}

/// Assert that no item appears twice.
#[allow(dead_code)]
pub fn assert_unique<T: Eq + Hash + std::fmt::Debug>(items: &[T], context: &str) {
    let mut seen = HashSet::new();
    for item in items {
        assert!(seen.insert(item), "{}: duplicate entry {:?}", context, item);
    }
}

/// Assert that each probe's account list extends the previous one.
#[allow(dead_code)]
pub fn assert_prefix_growth(probes: &[CallDescriptor]) {
    for (round, pair) in probes.windows(2).enumerate() {
        let before: Vec<Address> = pair[0].accounts.iter().map(|a| a.address).collect();
        let after: Vec<Address> = pair[1].accounts.iter().map(|a| a.address).collect();
        assert!(
            after.len() >= before.len() && after[..before.len()] == before[..],
            "round {} probe does not extend round {} probe",
            round + 2,
            round + 1
        );
    }
}
