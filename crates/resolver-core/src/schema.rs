//! Versioned return schema for the resolver entry point.
//!
//! The schema fixes which outcome tag means what. The built-in [`ReturnSchema::v1`]
//! matches the published resolver interface; [`ReturnSchema::from_idl`] derives
//! the same descriptor from an Anchor interface description and rejects one
//! whose layout the decoder cannot read.

use std::path::Path;

use executor_resolver_types::constants::{RESOLVER_EXECUTE_VAA_V1, RESOLVER_EXECUTE_VAA_V1_SEED};
use executor_resolver_types::discriminator;
use executor_resolver_types::encoding::bytes_to_hex_prefixed;
use serde_json::Value;
use tracing::debug;

use crate::error::DecodeError;

pub const SUPPORTED_SCHEMA_VERSION: u8 = 1;

/// Variant names of the generic result enum, in wire-tag order for v1.
const RESOLVED_VARIANT: &str = "Resolved";
const MISSING_VARIANT: &str = "Missing";
const INDIRECT_VARIANT: &str = "Account";

/// Field order the decoder reads, per declared struct.
const STRUCT_LAYOUTS: &[(&str, &[&str])] = &[
    ("InstructionGroup", &["instructions", "address_lookup_tables"]),
    ("SerializableInstruction", &["program_id", "accounts", "data"]),
    ("SerializableAccountMeta", &["pubkey", "is_signer", "is_writable"]),
    ("MissingAccounts", &["accounts", "address_lookup_tables"]),
];

/// Which outcome a wire tag selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Resolved,
    Missing,
    Indirect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReturnSchema {
    pub version: u8,
    /// Discriminator of the discovery entry point.
    pub entry_point: [u8; 8],
    pub resolved_tag: u8,
    pub missing_tag: u8,
    pub indirect_tag: u8,
}

impl Default for ReturnSchema {
    fn default() -> Self {
        Self::v1()
    }
}

impl ReturnSchema {
    pub fn v1() -> Self {
        Self {
            version: SUPPORTED_SCHEMA_VERSION,
            entry_point: RESOLVER_EXECUTE_VAA_V1,
            resolved_tag: 0,
            missing_tag: 1,
            indirect_tag: 2,
        }
    }

    /// Check the schema before any payload is decoded with it.
    pub fn validate(&self) -> Result<(), DecodeError> {
        if self.version != SUPPORTED_SCHEMA_VERSION {
            return Err(DecodeError::schema(format!(
                "unsupported schema version {} (supported: {})",
                self.version, SUPPORTED_SCHEMA_VERSION
            )));
        }
        let expected = discriminator(RESOLVER_EXECUTE_VAA_V1_SEED);
        if self.entry_point != expected {
            return Err(DecodeError::schema(format!(
                "entry point {} does not match derived discriminator {}",
                bytes_to_hex_prefixed(&self.entry_point),
                bytes_to_hex_prefixed(&expected)
            )));
        }
        let tags = [self.resolved_tag, self.missing_tag, self.indirect_tag];
        if tags[0] == tags[1] || tags[0] == tags[2] || tags[1] == tags[2] {
            return Err(DecodeError::schema(format!("outcome tags are not distinct: {:?}", tags)));
        }
        Ok(())
    }

    pub fn kind_of(&self, tag: u8) -> Option<OutcomeKind> {
        if tag == self.resolved_tag {
            Some(OutcomeKind::Resolved)
        } else if tag == self.missing_tag {
            Some(OutcomeKind::Missing)
        } else if tag == self.indirect_tag {
            Some(OutcomeKind::Indirect)
        } else {
            None
        }
    }

    /// Read an interface description from disk.
    pub fn from_idl_path(path: &Path) -> Result<Self, DecodeError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            DecodeError::schema(format!("cannot read interface description {}: {}", path.display(), e))
        })?;
        let idl: Value = serde_json::from_str(&text)
            .map_err(|e| DecodeError::schema(format!("invalid interface description JSON: {}", e)))?;
        Self::from_idl(&idl)
    }

    /// Derive the schema from an Anchor interface description.
    pub fn from_idl(idl: &Value) -> Result<Self, DecodeError> {
        let entry_point = RESOLVER_EXECUTE_VAA_V1;
        let instruction = idl
            .get("instructions")
            .and_then(Value::as_array)
            .and_then(|ixs| {
                ixs.iter()
                    .find(|ix| discriminator_of(ix) == Some(entry_point))
            })
            .ok_or_else(|| {
                DecodeError::schema(format!(
                    "no instruction with discriminator {}",
                    bytes_to_hex_prefixed(&entry_point)
                ))
            })?;

        let return_type = instruction
            .get("returns")
            .and_then(defined_name)
            .ok_or_else(|| DecodeError::schema("entry point declares no defined return type"))?;

        let types = idl
            .get("types")
            .and_then(Value::as_array)
            .ok_or_else(|| DecodeError::schema("interface description has no types"))?;

        let variants: Vec<&str> = find_type(types, return_type)
            .filter(|ty| ty.get("kind").and_then(Value::as_str) == Some("enum"))
            .and_then(|ty| ty.get("variants"))
            .and_then(Value::as_array)
            .ok_or_else(|| DecodeError::schema(format!("return type {} is not an enum", return_type)))?
            .iter()
            .map(|v| v.get("name").and_then(Value::as_str).unwrap_or(""))
            .collect();

        let tag_of = |name: &str| -> Result<u8, DecodeError> {
            let pos = variants
                .iter()
                .position(|v| *v == name)
                .ok_or_else(|| DecodeError::schema(format!("return enum has no {} variant", name)))?;
            u8::try_from(pos)
                .map_err(|_| DecodeError::schema(format!("variant {} index {} exceeds u8", name, pos)))
        };

        for (name, fields) in STRUCT_LAYOUTS {
            check_struct_layout(types, name, fields)?;
        }

        let schema = Self {
            version: SUPPORTED_SCHEMA_VERSION,
            entry_point,
            resolved_tag: tag_of(RESOLVED_VARIANT)?,
            missing_tag: tag_of(MISSING_VARIANT)?,
            indirect_tag: tag_of(INDIRECT_VARIANT)?,
        };
        schema.validate()?;
        debug!(?schema, return_type, "return schema loaded from interface description");
        Ok(schema)
    }
}

fn discriminator_of(instruction: &Value) -> Option<[u8; 8]> {
    let bytes = instruction.get("discriminator")?.as_array()?;
    let mut out = [0u8; 8];
    if bytes.len() != out.len() {
        return None;
    }
    for (slot, b) in out.iter_mut().zip(bytes) {
        *slot = u8::try_from(b.as_u64()?).ok()?;
    }
    Some(out)
}

/// Name of a `{"defined": {"name": ..}}` (or legacy `{"defined": ".."}`) type reference.
fn defined_name(ty: &Value) -> Option<&str> {
    let defined = ty.get("defined")?;
    defined
        .as_str()
        .or_else(|| defined.get("name").and_then(Value::as_str))
}

fn find_type<'a>(types: &'a [Value], name: &str) -> Option<&'a Value> {
    types
        .iter()
        .find(|t| t.get("name").and_then(Value::as_str) == Some(name))
        .and_then(|t| t.get("type"))
}

/// Field names compare case- and underscore-insensitively (`addressLookupTables`).
fn normalize_field(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

fn check_struct_layout(types: &[Value], name: &str, expected: &[&str]) -> Result<(), DecodeError> {
    let fields = find_type(types, name)
        .filter(|ty| ty.get("kind").and_then(Value::as_str) == Some("struct"))
        .and_then(|ty| ty.get("fields"))
        .and_then(Value::as_array)
        .ok_or_else(|| DecodeError::schema(format!("struct {} not declared", name)))?;

    let declared: Vec<String> = fields
        .iter()
        .map(|f| f.get("name").and_then(Value::as_str).map(normalize_field).unwrap_or_default())
        .collect();
    let wanted: Vec<String> = expected.iter().map(|f| normalize_field(f)).collect();
    if declared != wanted {
        return Err(DecodeError::schema(format!(
            "struct {} fields {:?} do not match expected order {:?}",
            name, declared, wanted
        )));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    fn fields(names: &[&str]) -> Value {
        Value::Array(names.iter().map(|n| json!({ "name": n, "type": "u8" })).collect())
    }

    /// Interface description in the shape Anchor publishes for a resolver program.
    pub(crate) fn resolver_idl() -> Value {
        json!({
            "address": "GeSLWQHGZRWhrdqo5Zvaa3JonhzQmfEmJSuHJwmRebPw",
            "metadata": { "name": "example_resolver", "version": "0.1.0", "spec": "0.1.0" },
            "instructions": [
                {
                    "name": "initialize",
                    "discriminator": [175, 175, 109, 31, 13, 152, 155, 237],
                    "accounts": [],
                    "args": []
                },
                {
                    "name": "resolve_execute_vaa_v1",
                    "discriminator": [148, 184, 169, 222, 207, 8, 154, 127],
                    "accounts": [],
                    "args": [{ "name": "vaa_body", "type": "bytes" }],
                    "returns": {
                        "defined": {
                            "name": "Resolver",
                            "generics": [{ "kind": "type", "type": { "defined": { "name": "InstructionGroups" } } }]
                        }
                    }
                }
            ],
            "types": [
                { "name": "InstructionGroup", "type": { "kind": "struct", "fields": fields(&["instructions", "address_lookup_tables"]) } },
                { "name": "InstructionGroups", "type": { "kind": "struct", "fields": [{ "vec": { "defined": { "name": "InstructionGroup" } } }] } },
                { "name": "MissingAccounts", "type": { "kind": "struct", "fields": fields(&["accounts", "address_lookup_tables"]) } },
                {
                    "name": "Resolver",
                    "generics": [{ "kind": "type", "name": "T" }],
                    "type": {
                        "kind": "enum",
                        "variants": [
                            { "name": "Resolved", "fields": [{ "generic": "T" }] },
                            { "name": "Missing", "fields": [{ "defined": { "name": "MissingAccounts" } }] },
                            { "name": "Account" }
                        ]
                    }
                },
                { "name": "SerializableAccountMeta", "type": { "kind": "struct", "fields": fields(&["pubkey", "is_signer", "is_writable"]) } },
                { "name": "SerializableInstruction", "type": { "kind": "struct", "fields": fields(&["program_id", "accounts", "data"]) } }
            ]
        })
    }

    #[test]
    fn test_v1_is_valid() {
        let schema = ReturnSchema::v1();
        schema.validate().unwrap();
        assert_eq!(schema.kind_of(0), Some(OutcomeKind::Resolved));
        assert_eq!(schema.kind_of(1), Some(OutcomeKind::Missing));
        assert_eq!(schema.kind_of(2), Some(OutcomeKind::Indirect));
        assert_eq!(schema.kind_of(3), None);
    }

    #[test]
    fn test_validate_rejects_bad_schemas() {
        let mut dup = ReturnSchema::v1();
        dup.indirect_tag = 0;
        assert!(matches!(dup.validate(), Err(DecodeError::SchemaMismatch(_))));

        let mut version = ReturnSchema::v1();
        version.version = 2;
        assert!(version.validate().is_err());

        let mut entry = ReturnSchema::v1();
        entry.entry_point = [0; 8];
        assert!(entry.validate().is_err());
    }

    #[test]
    fn test_from_idl_yields_v1() {
        assert_eq!(ReturnSchema::from_idl(&resolver_idl()).unwrap(), ReturnSchema::v1());
    }

    #[test]
    fn test_from_idl_accepts_camel_case_fields() {
        let mut idl = resolver_idl();
        idl["types"][0]["type"]["fields"] = fields(&["instructions", "addressLookupTables"]);
        assert!(ReturnSchema::from_idl(&idl).is_ok());
    }

    #[test]
    fn test_from_idl_follows_variant_positions() {
        let mut idl = resolver_idl();
        idl["types"][3]["type"]["variants"] = json!([
            { "name": "Missing" },
            { "name": "Resolved" },
            { "name": "Account" }
        ]);
        let schema = ReturnSchema::from_idl(&idl).unwrap();
        assert_eq!(schema.missing_tag, 0);
        assert_eq!(schema.resolved_tag, 1);
    }

    #[test]
    fn test_from_idl_rejects_mismatches() {
        let mut missing_variant = resolver_idl();
        missing_variant["types"][3]["type"]["variants"] =
            json!([{ "name": "Resolved" }, { "name": "Missing" }]);
        assert!(ReturnSchema::from_idl(&missing_variant).is_err());

        let mut reordered = resolver_idl();
        reordered["types"][4]["type"]["fields"] = fields(&["pubkey", "is_writable", "is_signer"]);
        let err = ReturnSchema::from_idl(&reordered).unwrap_err();
        assert!(err.to_string().contains("SerializableAccountMeta"));

        let mut no_entry = resolver_idl();
        no_entry["instructions"][1]["discriminator"] = json!([1, 2, 3, 4, 5, 6, 7, 8]);
        assert!(ReturnSchema::from_idl(&no_entry).is_err());
    }

    #[test]
    fn test_from_idl_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resolver.json");
        std::fs::write(&path, serde_json::to_string_pretty(&resolver_idl()).unwrap()).unwrap();
        assert_eq!(ReturnSchema::from_idl_path(&path).unwrap(), ReturnSchema::v1());

        assert!(ReturnSchema::from_idl_path(&dir.path().join("absent.json")).is_err());
    }
}
