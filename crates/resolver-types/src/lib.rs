//! Shared types for the executor-resolver workspace.
//!
//! Foundational values used by the transport, the resolution core and the
//! facade crate:
//!
//! - [`address`]: 32-byte identities with base58 text form
//! - [`call`]: call descriptors, declared groups, lookup tables, executable groups
//! - [`constants`]: seeds, discriminators, placeholders, well-known program ids
//! - [`derive`]: discriminator and program-derived address derivation
//! - [`encoding`]: base64 / base58 / hex helpers
//! - [`env_utils`]: typed environment variable parsing

pub mod address;
pub mod call;
pub mod constants;
pub mod derive;
pub mod encoding;
pub mod env_utils;

pub use address::{Address, AddressParseError, ADDRESS_LENGTH};
pub use call::{CallDescriptor, CallGroup, LookupTable, PlannedGroup, ResourceRef};
pub use derive::{discriminator, find_program_address, result_account_address};
pub use env_utils::{env_string_or, env_var, env_var_or};

use std::time::Duration;

/// Caller-side retry policy for transport failures.
///
/// The resolution driver never retries on its own; callers that want retries
/// wrap whole resolutions with this policy.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Number of retry attempts after the first failure.
    pub retries: usize,
    /// Initial backoff duration between retries.
    pub initial_backoff: Duration,
    /// Maximum backoff duration.
    pub max_backoff: Duration,
}

impl RetryConfig {
    pub fn new(retries: usize, initial_backoff_ms: u64, max_backoff_ms: u64) -> Self {
        Self {
            retries,
            initial_backoff: Duration::from_millis(initial_backoff_ms),
            max_backoff: Duration::from_millis(max_backoff_ms),
        }
    }

    /// Read `RESOLVER_RETRIES`, `RESOLVER_RETRY_INITIAL_MS` and `RESOLVER_RETRY_MAX_MS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            retries: env_var_or("RESOLVER_RETRIES", defaults.retries),
            initial_backoff: env_var::<u64>("RESOLVER_RETRY_INITIAL_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.initial_backoff),
            max_backoff: env_var::<u64>("RESOLVER_RETRY_MAX_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.max_backoff),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            retries: 3,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_millis(5000),
        }
    }
}
