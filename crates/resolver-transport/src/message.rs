//! v0 message compilation for dry-run simulation.
//!
//! Only what a simulation needs: key ordering, lookup table extraction,
//! compact-u16 framing and an unsigned transaction envelope. Signatures are
//! left zeroed; the node is asked to skip signature verification.

use std::collections::{HashMap, HashSet};

use anyhow::{anyhow, bail, Result};
use executor_resolver_types::{Address, CallDescriptor, LookupTable};

/// High bit set in the first byte marks a versioned message; low bits carry the version.
const MESSAGE_VERSION_PREFIX: u8 = 0x80;
/// Account indexes are `u8`.
const MAX_ACCOUNT_KEYS: usize = 256;
pub const SIGNATURE_LENGTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MessageHeader {
    pub num_required_signatures: u8,
    pub num_readonly_signed_accounts: u8,
    pub num_readonly_unsigned_accounts: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledInstruction {
    pub program_id_index: u8,
    pub accounts: Vec<u8>,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLookup {
    pub table_key: Address,
    pub writable_indexes: Vec<u8>,
    pub readonly_indexes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageV0 {
    pub header: MessageHeader,
    pub static_keys: Vec<Address>,
    pub recent_blockhash: [u8; 32],
    pub instructions: Vec<CompiledInstruction>,
    pub lookups: Vec<TableLookup>,
}

#[derive(Debug, Clone, Copy, Default)]
struct KeyFlags {
    signer: bool,
    writable: bool,
    invoked: bool,
}

impl KeyFlags {
    /// Sort rank: writable signers, readonly signers, writable, readonly.
    fn rank(&self) -> u8 {
        match (self.signer, self.writable) {
            (true, true) => 0,
            (true, false) => 1,
            (false, true) => 2,
            (false, false) => 3,
        }
    }
}

impl MessageV0 {
    /// Compile `instructions` with `payer` as fee payer.
    ///
    /// Non-signer keys that are not invoked as programs are loaded through the
    /// first table in `tables` that contains them. Everything else is static.
    pub fn compile(
        payer: &Address,
        instructions: &[CallDescriptor],
        tables: &[LookupTable],
        recent_blockhash: [u8; 32],
    ) -> Result<Self> {
        let mut order = vec![*payer];
        let mut flags: HashMap<Address, KeyFlags> = HashMap::new();
        flags.insert(
            *payer,
            KeyFlags {
                signer: true,
                writable: true,
                invoked: false,
            },
        );

        let mut note = |key: Address, update: &dyn Fn(&mut KeyFlags)| {
            let entry = flags.entry(key).or_insert_with(|| {
                order.push(key);
                KeyFlags::default()
            });
            update(entry);
        };
        for ix in instructions {
            note(ix.program_id, &|f: &mut KeyFlags| f.invoked = true);
            for meta in &ix.accounts {
                note(meta.address, &|f: &mut KeyFlags| {
                    f.signer |= meta.is_signer;
                    f.writable |= meta.is_writable;
                });
            }
        }

        // Stable sort keeps first-seen order inside each rank; the payer stays first.
        order.sort_by_key(|key| flags[key].rank());

        let mut loaded: HashSet<Address> = HashSet::new();
        let mut loaded_writable = Vec::new();
        let mut loaded_readonly = Vec::new();
        let mut lookups = Vec::new();
        for table in tables {
            let mut lookup = TableLookup {
                table_key: table.key,
                writable_indexes: Vec::new(),
                readonly_indexes: Vec::new(),
            };
            for key in &order {
                let f = flags[key];
                if f.signer || f.invoked || loaded.contains(key) {
                    continue;
                }
                let Some(idx) = table.position(key) else {
                    continue;
                };
                if f.writable {
                    lookup.writable_indexes.push(idx);
                    loaded_writable.push(*key);
                } else {
                    lookup.readonly_indexes.push(idx);
                    loaded_readonly.push(*key);
                }
                loaded.insert(*key);
            }
            if !lookup.writable_indexes.is_empty() || !lookup.readonly_indexes.is_empty() {
                lookups.push(lookup);
            }
        }

        let static_keys: Vec<Address> = order
            .iter()
            .filter(|k| !loaded.contains(*k))
            .copied()
            .collect();

        let total = static_keys.len() + loaded_writable.len() + loaded_readonly.len();
        if total > MAX_ACCOUNT_KEYS {
            bail!(
                "message references {} accounts, at most {} are addressable",
                total,
                MAX_ACCOUNT_KEYS
            );
        }

        let count = |pred: &dyn Fn(&KeyFlags) -> bool| -> u8 {
            static_keys.iter().filter(|k| pred(&flags[*k])).count() as u8
        };
        let header = MessageHeader {
            num_required_signatures: count(&|f: &KeyFlags| f.signer),
            num_readonly_signed_accounts: count(&|f: &KeyFlags| f.signer && !f.writable),
            num_readonly_unsigned_accounts: count(&|f: &KeyFlags| !f.signer && !f.writable),
        };

        let index: HashMap<Address, u8> = static_keys
            .iter()
            .chain(loaded_writable.iter())
            .chain(loaded_readonly.iter())
            .enumerate()
            .map(|(i, k)| (*k, i as u8))
            .collect();
        let lookup_index = |key: &Address| {
            index
                .get(key)
                .copied()
                .ok_or_else(|| anyhow!("account {} missing from compiled keys", key))
        };

        let compiled = instructions
            .iter()
            .map(|ix| {
                Ok(CompiledInstruction {
                    program_id_index: lookup_index(&ix.program_id)?,
                    accounts: ix
                        .accounts
                        .iter()
                        .map(|m| lookup_index(&m.address))
                        .collect::<Result<_>>()?,
                    data: ix.data.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            header,
            static_keys,
            recent_blockhash,
            instructions: compiled,
            lookups,
        })
    }

    /// Wire bytes of the message, version prefix included.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let mut out = vec![
            MESSAGE_VERSION_PREFIX,
            self.header.num_required_signatures,
            self.header.num_readonly_signed_accounts,
            self.header.num_readonly_unsigned_accounts,
        ];
        write_short_vec_len(&mut out, self.static_keys.len())?;
        for key in &self.static_keys {
            out.extend_from_slice(key.as_ref());
        }
        out.extend_from_slice(&self.recent_blockhash);

        write_short_vec_len(&mut out, self.instructions.len())?;
        for ix in &self.instructions {
            out.push(ix.program_id_index);
            write_short_vec_len(&mut out, ix.accounts.len())?;
            out.extend_from_slice(&ix.accounts);
            write_short_vec_len(&mut out, ix.data.len())?;
            out.extend_from_slice(&ix.data);
        }

        write_short_vec_len(&mut out, self.lookups.len())?;
        for lookup in &self.lookups {
            out.extend_from_slice(lookup.table_key.as_ref());
            write_short_vec_len(&mut out, lookup.writable_indexes.len())?;
            out.extend_from_slice(&lookup.writable_indexes);
            write_short_vec_len(&mut out, lookup.readonly_indexes.len())?;
            out.extend_from_slice(&lookup.readonly_indexes);
        }
        Ok(out)
    }

    /// Versioned transaction bytes with one zeroed signature per required signer.
    pub fn to_unsigned_transaction(&self) -> Result<Vec<u8>> {
        let signatures = self.header.num_required_signatures as usize;
        let mut out = Vec::new();
        write_short_vec_len(&mut out, signatures)?;
        out.resize(out.len() + signatures * SIGNATURE_LENGTH, 0);
        out.extend(self.serialize()?);
        Ok(out)
    }
}

/// Compact-u16 length: 7 bits per byte, high bit marks continuation.
pub fn write_short_vec_len(out: &mut Vec<u8>, len: usize) -> Result<()> {
    let mut rem = u16::try_from(len).map_err(|_| anyhow!("length {} exceeds u16", len))?;
    loop {
        let mut byte = (rem & 0x7f) as u8;
        rem >>= 7;
        if rem == 0 {
            out.push(byte);
            return Ok(());
        }
        byte |= 0x80;
        out.push(byte);
    }
}
