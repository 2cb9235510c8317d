//! Call descriptors and call groups.
//!
//! A [`CallDescriptor`] is one invocation of a program: the program id, the
//! ordered account list it reads positionally, and an opaque payload.
//! Groups come in two shapes: [`PlannedGroup`] is what the resolver program
//! declares (lookup tables by identity only), [`CallGroup`] is the executable
//! form with every lookup table materialized.

use serde::{Deserialize, Serialize};

use crate::address::Address;

/// An account reference plus the access intent of the call that uses it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceRef {
    pub address: Address,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl ResourceRef {
    pub fn new(address: Address, is_signer: bool, is_writable: bool) -> Self {
        Self {
            address,
            is_signer,
            is_writable,
        }
    }

    pub fn readonly(address: Address) -> Self {
        Self::new(address, false, false)
    }

    pub fn writable(address: Address) -> Self {
        Self::new(address, false, true)
    }
}

/// One program invocation. Account order is significant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallDescriptor {
    pub program_id: Address,
    pub accounts: Vec<ResourceRef>,
    pub data: Vec<u8>,
}

impl CallDescriptor {
    pub fn new(program_id: Address, accounts: Vec<ResourceRef>, data: Vec<u8>) -> Self {
        Self {
            program_id,
            accounts,
            data,
        }
    }
}

/// A group of calls as declared by the resolver program.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlannedGroup {
    pub descriptors: Vec<CallDescriptor>,
    /// Lookup tables needed to compact the group, in declared order.
    pub table_keys: Vec<Address>,
}

/// Materialized contents of an address lookup table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupTable {
    pub key: Address,
    pub addresses: Vec<Address>,
}

impl LookupTable {
    pub fn new(key: Address, addresses: Vec<Address>) -> Self {
        Self { key, addresses }
    }

    /// Index of `address` inside the table, if present.
    pub fn position(&self, address: &Address) -> Option<u8> {
        self.addresses
            .iter()
            .position(|a| a == address)
            .and_then(|idx| u8::try_from(idx).ok())
    }
}

/// An executable group: ordered calls plus the lookup tables they compile against.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CallGroup {
    pub descriptors: Vec<CallDescriptor>,
    pub tables: Vec<LookupTable>,
}
