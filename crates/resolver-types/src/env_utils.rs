//! Environment variable parsing for resolver configuration.
//!
//! All knobs are read with a typed default so that a missing or malformed
//! variable never aborts a resolution:
//!
//! ```
//! use executor_resolver_types::env_utils::{env_var, env_var_or};
//!
//! let rounds: usize = env_var_or("RESOLVER_DOC_MAX_ROUNDS", 32);
//! assert_eq!(rounds, 32);
//!
//! let custom: Option<u64> = env_var("RESOLVER_DOC_UNSET");
//! assert!(custom.is_none());
//! ```

use std::str::FromStr;
use std::time::Duration;

/// Parse an environment variable into any `FromStr` type.
///
/// Returns `None` if the variable is unset, blank, or does not parse.
pub fn env_var<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .and_then(|v| v.trim().parse().ok())
}

/// Parse an environment variable, falling back to `default`.
pub fn env_var_or<T: FromStr>(key: &str, default: T) -> T {
    env_var(key).unwrap_or(default)
}

/// String variable with a default; blank values count as unset.
pub fn env_string_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Whole seconds from an environment variable as a [`Duration`].
pub fn env_secs_or(key: &str, default_secs: u64) -> Duration {
    Duration::from_secs(env_var_or(key, default_secs))
}
