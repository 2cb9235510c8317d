//! Discriminator and program-derived address derivation.

use ed25519_dalek::VerifyingKey;
use sha2::{Digest, Sha256};

use crate::address::Address;
use crate::constants::{PDA_MARKER, RESOLVER_RESULT_ACCOUNT_SEED};

/// First 8 bytes of SHA-256 over `preimage`, e.g. `"namespace:method-name"`.
pub fn discriminator(preimage: &[u8]) -> [u8; 8] {
    let hash = Sha256::digest(preimage);
    let mut out = [0u8; 8];
    out.copy_from_slice(&hash[..8]);
    out
}

/// Whether the bytes decompress to a point on the ed25519 curve.
///
/// Derived addresses must be off-curve so that no private key exists for them.
pub fn is_on_curve(bytes: &[u8; 32]) -> bool {
    VerifyingKey::from_bytes(bytes).is_ok()
}

/// Hash `seeds ‖ bump ‖ program_id ‖ marker`, returning `None` when the result is on-curve.
pub fn create_program_address(seeds: &[&[u8]], bump: u8, program_id: &Address) -> Option<Address> {
    let mut hasher = Sha256::new();
    for seed in seeds {
        hasher.update(seed);
    }
    hasher.update([bump]);
    hasher.update(program_id.as_ref());
    hasher.update(PDA_MARKER);
    let hash: [u8; 32] = hasher.finalize().into();
    if is_on_curve(&hash) {
        None
    } else {
        Some(Address::new_from_array(hash))
    }
}

/// Find the canonical derived address: the first off-curve candidate from bump 255 down.
pub fn find_program_address(seeds: &[&[u8]], program_id: &Address) -> Option<(Address, u8)> {
    (0..=u8::MAX)
        .rev()
        .find_map(|bump| create_program_address(seeds, bump, program_id).map(|a| (a, bump)))
}

/// Address of the side-channel account a resolver program writes oversized results to.
pub fn result_account_address(program_id: &Address) -> Option<Address> {
    find_program_address(&[RESOLVER_RESULT_ACCOUNT_SEED], program_id).map(|(addr, _)| addr)
}
