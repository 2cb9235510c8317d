//! Fixtures: addresses, groups, tables and interface descriptions.

use std::path::{Path, PathBuf};

use executor_resolver::constants::RESOLVER_PUBKEY_PAYER;
use executor_resolver::{Address, CallDescriptor, LookupTable, PlannedGroup, ResourceRef};
use serde_json::{json, Value};

/// The example resolver program deployed by the resolver test suite.
pub const EXAMPLE_PROGRAM: &str = "GeSLWQHGZRWhrdqo5Zvaa3JonhzQmfEmJSuHJwmRebPw";

#[allow(dead_code)]
pub fn addr(b: u8) -> Address {
    Address::new_from_array([b; 32])
}

#[allow(dead_code)]
pub fn program_id() -> Address {
    EXAMPLE_PROGRAM.parse().expect("valid program id")
}

#[allow(dead_code)]
pub fn caller() -> Address {
    addr(0xc0)
}

/// One group of two calls: a payer-funded call and a read-only follow-up.
#[allow(dead_code)]
pub fn sample_group(table_keys: Vec<Address>) -> PlannedGroup {
    PlannedGroup {
        descriptors: vec![
            CallDescriptor::new(
                addr(0x70),
                vec![
                    ResourceRef::new(RESOLVER_PUBKEY_PAYER, true, true),
                    ResourceRef::writable(addr(0x11)),
                    ResourceRef::readonly(addr(0x12)),
                ],
                vec![0x01, 0x02, 0x03],
            ),
            CallDescriptor::new(
                addr(0x71),
                vec![ResourceRef::readonly(addr(0x12))],
                b"execute".to_vec(),
            ),
        ],
        table_keys,
    }
}

#[allow(dead_code)]
pub fn sample_table(key: Address, entries: u8) -> LookupTable {
    LookupTable::new(key, (0..entries).map(|i| addr(0x80 + i)).collect())
}

fn struct_type(name: &str, fields: &[&str]) -> Value {
    json!({
        "name": name,
        "type": {
            "kind": "struct",
            "fields": fields.iter().map(|f| json!({ "name": f, "type": "pubkey" })).collect::<Vec<_>>(),
        }
    })
}

/// Interface description of a resolver program, Anchor layout.
#[allow(dead_code)]
pub fn resolver_idl(variants: &[&str]) -> Value {
    json!({
        "address": EXAMPLE_PROGRAM,
        "metadata": { "name": "executor_account_resolver_svm_program", "version": "0.1.0", "spec": "0.1.0" },
        "instructions": [{
            "name": "resolve_execute_vaa_v1",
            "discriminator": [148, 184, 169, 222, 207, 8, 154, 127],
            "accounts": [],
            "args": [{ "name": "_vaa_body", "type": "bytes" }],
            "returns": { "defined": { "name": "Resolver", "generics": [] } }
        }],
        "types": [
            struct_type("InstructionGroup", &["instructions", "address_lookup_tables"]),
            struct_type("MissingAccounts", &["accounts", "address_lookup_tables"]),
            {
                "name": "Resolver",
                "type": {
                    "kind": "enum",
                    "variants": variants.iter().map(|v| json!({ "name": v })).collect::<Vec<_>>(),
                }
            },
            struct_type("SerializableAccountMeta", &["pubkey", "is_signer", "is_writable"]),
            struct_type("SerializableInstruction", &["program_id", "accounts", "data"]),
        ]
    })
}

/// Write an interface description into `dir`, returning its path.
#[allow(dead_code)]
pub fn write_idl(dir: &Path, variants: &[&str]) -> PathBuf {
    let path = dir.join("executor_account_resolver_svm_program.json");
    let text = serde_json::to_string_pretty(&resolver_idl(variants)).expect("serialize idl");
    std::fs::write(&path, text).expect("write idl");
    path
}
