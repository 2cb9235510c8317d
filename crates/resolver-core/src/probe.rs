//! Discovery probe construction.

use executor_resolver_types::{Address, CallDescriptor, ResourceRef};

/// Instruction data for the discovery entry point: discriminator, then the
/// VAA body as a length-prefixed byte vector.
pub fn probe_data(entry_point: &[u8; 8], vaa_body: &[u8]) -> Vec<u8> {
    let mut data = Vec::with_capacity(entry_point.len() + 4 + vaa_body.len());
    data.extend_from_slice(entry_point);
    data.extend_from_slice(&(vaa_body.len() as u32).to_le_bytes());
    data.extend_from_slice(vaa_body);
    data
}

/// Probe for one round: every known account in first-seen order, none of
/// them signers. Only the result account is writable, so the program can
/// grow it and write an oversized outcome there.
///
/// Placeholders are passed through as-is.
pub fn build_probe(
    program_id: &Address,
    entry_point: &[u8; 8],
    vaa_body: &[u8],
    known_refs: &[Address],
    result_account: &Address,
) -> CallDescriptor {
    let accounts = known_refs
        .iter()
        .map(|address| ResourceRef::new(*address, false, address == result_account))
        .collect();
    CallDescriptor::new(*program_id, accounts, probe_data(entry_point, vaa_body))
}
