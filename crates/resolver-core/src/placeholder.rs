//! Placeholder substitution for finalized call plans.
//!
//! Resolver programs name accounts they cannot know (the relayer paying for
//! execution, the posted VAA, fresh keypairs) with fixed placeholder
//! addresses. After resolution, each bound placeholder is replaced by its real
//! address. Placeholders with no binding are left untouched.

use std::collections::HashMap;

use anyhow::{bail, Result};
use executor_resolver_types::constants::{
    RESOLVER_PUBKEY_KEYPAIRS, RESOLVER_PUBKEY_PAYER, RESOLVER_PUBKEY_POSTED_VAA,
    RESOLVER_PUBKEY_SHIM_VAA_SIGS,
};
use executor_resolver_types::{Address, CallDescriptor, ResourceRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Binding {
    address: Address,
    /// Whether every reference to the placeholder becomes a signer.
    signer: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceholderBindings {
    bindings: HashMap<Address, Binding>,
}

impl PlaceholderBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the payer placeholder to `caller`.
    pub fn for_caller(caller: Address) -> Self {
        Self::new().bind(RESOLVER_PUBKEY_PAYER, caller, true)
    }

    fn bind(mut self, placeholder: Address, address: Address, signer: bool) -> Self {
        self.bindings.insert(placeholder, Binding { address, signer });
        self
    }

    pub fn bind_posted_vaa(self, posted_vaa: Address) -> Self {
        self.bind(RESOLVER_PUBKEY_POSTED_VAA, posted_vaa, false)
    }

    pub fn bind_guardian_signatures(self, signatures: Address) -> Self {
        self.bind(RESOLVER_PUBKEY_SHIM_VAA_SIGS, signatures, false)
    }

    /// Bind fresh-keypair placeholder `index` (0..=9). The keypair signs.
    pub fn bind_keypair(self, index: usize, keypair: Address) -> Result<Self> {
        let Some(placeholder) = RESOLVER_PUBKEY_KEYPAIRS.get(index) else {
            bail!(
                "keypair placeholder index {} out of range (0..={})",
                index,
                RESOLVER_PUBKEY_KEYPAIRS.len() - 1
            );
        };
        Ok(self.bind(*placeholder, keypair, true))
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn resolve_ref(&self, account: &ResourceRef) -> ResourceRef {
        match self.bindings.get(&account.address) {
            Some(binding) => ResourceRef::new(
                binding.address,
                account.is_signer || binding.signer,
                account.is_writable,
            ),
            None => *account,
        }
    }

    /// Rewrite bound placeholders in the account lists of `descriptor`.
    pub fn apply(&self, descriptor: &CallDescriptor) -> CallDescriptor {
        CallDescriptor {
            program_id: descriptor.program_id,
            accounts: descriptor
                .accounts
                .iter()
                .map(|a| self.resolve_ref(a))
                .collect(),
            data: descriptor.data.clone(),
        }
    }
}
