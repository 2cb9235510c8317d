//! Well-known seeds, discriminators, placeholders and program ids.
//!
//! Placeholders follow the padded-ASCII pattern used by the guardian signer
//! prefixes: a short name, then `_` and `0` padding up to 32 bytes.

use crate::address::Address;

/// Preimage hashed into [`RESOLVER_EXECUTE_VAA_V1`].
pub const RESOLVER_EXECUTE_VAA_V1_SEED: &[u8] = b"executor-account-resolver:execute-vaa-v1";

/// Seed of the side-channel result account.
pub const RESOLVER_RESULT_ACCOUNT_SEED: &[u8] = b"executor-account-resolver:result";

/// Discriminator of the resolve entry point for executing a v1 VAA.
pub const RESOLVER_EXECUTE_VAA_V1: [u8; 8] = [148, 184, 169, 222, 207, 8, 154, 127];

/// Length of the account discriminator that prefixes the side-channel account data.
pub const RESULT_ACCOUNT_DISCRIMINATOR_LEN: usize = 8;

/// Stands for the caller (the relayer paying for and signing the transaction).
pub const RESOLVER_PUBKEY_PAYER: Address =
    Address::new_from_array(*b"payer_00000000000000000000000000");

/// Stands for the posted VAA account.
pub const RESOLVER_PUBKEY_POSTED_VAA: Address =
    Address::new_from_array(*b"posted_vaa_000000000000000000000");

/// Stands for the account holding the guardian signatures of the VAA.
pub const RESOLVER_PUBKEY_SHIM_VAA_SIGS: Address =
    Address::new_from_array(*b"shim_vaa_sigs_000000000000000000");

/// Stand-ins for freshly generated keypairs, `keypair_00` through `keypair_09`.
pub const RESOLVER_PUBKEY_KEYPAIRS: [Address; 10] = [
    Address::new_from_array(*b"keypair_00_000000000000000000000"),
    Address::new_from_array(*b"keypair_01_000000000000000000000"),
    Address::new_from_array(*b"keypair_02_000000000000000000000"),
    Address::new_from_array(*b"keypair_03_000000000000000000000"),
    Address::new_from_array(*b"keypair_04_000000000000000000000"),
    Address::new_from_array(*b"keypair_05_000000000000000000000"),
    Address::new_from_array(*b"keypair_06_000000000000000000000"),
    Address::new_from_array(*b"keypair_07_000000000000000000000"),
    Address::new_from_array(*b"keypair_08_000000000000000000000"),
    Address::new_from_array(*b"keypair_09_000000000000000000000"),
];

/// `ComputeBudget111111111111111111111111111111`
pub const COMPUTE_BUDGET_PROGRAM_ID: Address = Address::new_from_array([
    3, 6, 70, 111, 229, 33, 23, 50, 255, 236, 173, 186, 114, 195, 155, 231, 188, 140, 229, 187,
    197, 247, 18, 107, 44, 67, 155, 58, 64, 0, 0, 0,
]);

/// Marker appended to program-derived address preimages.
pub const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";

/// Prefix of the log line carrying a program's return data.
pub const PROGRAM_RETURN_LOG_PREFIX: &str = "Program return: ";
