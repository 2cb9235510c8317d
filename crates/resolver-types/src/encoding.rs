//! Encoding utilities for base64, base58 and hex.
//!
//! Shared helpers so callers do not repeat the same error mapping. Errors
//! carry the caller-supplied context.

use anyhow::{Context, Result};

use crate::address::Address;

// =============================================================================
// Base64 Encoding/Decoding
// =============================================================================

/// Encode bytes to a standard base64 string.
pub fn base64_encode(bytes: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Decode a base64 string with a context-aware error message.
///
/// # Arguments
/// * `b64` - Base64 encoded string
/// * `context` - Description for error messages (e.g., "return data", "account data")
pub fn base64_decode(b64: &str, context: &str) -> Result<Vec<u8>> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(b64.trim())
        .with_context(|| format!("Failed to decode {} from base64", context))
}

/// Decode base64 string to bytes, returning None on failure.
pub fn try_base64_decode(b64: &str) -> Option<Vec<u8>> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.decode(b64.trim()).ok()
}

// =============================================================================
// Address Parsing & Formatting
// =============================================================================

/// Parse a base58 address with a context-aware error message.
///
/// ```
/// use executor_resolver_types::encoding::parse_address;
///
/// let system = parse_address("11111111111111111111111111111111", "program id").unwrap();
/// assert_eq!(system.to_bytes(), [0u8; 32]);
/// assert!(parse_address("not-an-address", "program id").is_err());
/// ```
pub fn parse_address(text: &str, context: &str) -> Result<Address> {
    text.parse::<Address>()
        .with_context(|| format!("Invalid {} '{}'", context, text))
}

/// Short form for log lines: first and last four base58 characters.
pub fn format_address_short(addr: &Address) -> String {
    let full = addr.to_base58();
    if full.len() <= 10 {
        return full;
    }
    format!("{}..{}", &full[..4], &full[full.len() - 4..])
}

/// Hex form of a discriminator or other short byte string, `0x`-prefixed.
pub fn bytes_to_hex_prefixed(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}
