//! Address lookup table account parsing.
//!
//! Account layout: a 56-byte metadata header (`u32` state tag, deactivation
//! slot, last-extended slot, start index, optional authority, padding)
//! followed by packed 32-byte addresses.

use anyhow::{anyhow, bail, Result};
use executor_resolver_types::encoding::format_address_short;
use executor_resolver_types::{Address, LookupTable, ADDRESS_LENGTH};
use tracing::warn;

pub const LOOKUP_TABLE_META_SIZE: usize = 56;
/// State tag of an initialized lookup table.
const LOOKUP_TABLE_STATE_TAG: u32 = 1;

/// Parse raw account data of the lookup table at `key`.
pub fn parse_lookup_table(key: Address, data: &[u8]) -> Result<LookupTable> {
    if data.len() < LOOKUP_TABLE_META_SIZE {
        bail!(
            "lookup table {} data too short: {} bytes, header needs {}",
            key,
            data.len(),
            LOOKUP_TABLE_META_SIZE
        );
    }
    let tag = u32::from_le_bytes(
        data[..4]
            .try_into()
            .map_err(|_| anyhow!("lookup table {} header truncated", key))?,
    );
    if tag != LOOKUP_TABLE_STATE_TAG {
        bail!("account {} is not an initialized lookup table (state {})", key, tag);
    }
    let deactivation_slot = u64::from_le_bytes(
        data[4..12]
            .try_into()
            .map_err(|_| anyhow!("lookup table {} header truncated", key))?,
    );
    if deactivation_slot != u64::MAX {
        warn!(
            table = %format_address_short(&key),
            deactivation_slot,
            "lookup table is deactivated; compiled calls may fail to load it"
        );
    }

    let body = &data[LOOKUP_TABLE_META_SIZE..];
    if body.len() % ADDRESS_LENGTH != 0 {
        bail!(
            "lookup table {} has {} trailing bytes after its entries",
            key,
            body.len() % ADDRESS_LENGTH
        );
    }
    let addresses = body
        .chunks_exact(ADDRESS_LENGTH)
        .map(Address::try_from_slice)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| anyhow!("lookup table {}: {}", key, e))?;
    Ok(LookupTable::new(key, addresses))
}
