//! Result decoding.
//!
//! The resolver program returns its outcome as return data, which the runtime
//! logs as `Program return: <program id> <base64>`. Outcomes too large for
//! return data are written to the program's result account instead, and the
//! inline value is only an `Indirect` marker pointing there.
//!
//! Layout is little-endian and length-prefixed (`u32` vector lengths, `u8`
//! booleans). The runtime drops trailing zero bytes from return data, so the
//! inline payload is read as if zero-extended; result account data is read
//! strictly after its 8-byte discriminator.

use executor_resolver_types::constants::{
    PROGRAM_RETURN_LOG_PREFIX, RESULT_ACCOUNT_DISCRIMINATOR_LEN,
};
use executor_resolver_types::encoding::try_base64_decode;
use executor_resolver_types::{
    result_account_address, Address, CallDescriptor, PlannedGroup, ResourceRef, ADDRESS_LENGTH,
};
use executor_resolver_transport::Evaluation;
use tracing::debug;

use crate::error::DecodeError;
use crate::schema::{OutcomeKind, ReturnSchema};

/// Largest return data the runtime carries inline.
pub const MAX_INLINE_RETURN_LEN: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionOutcome {
    /// Terminal: the program emitted its complete call plan.
    Resolved(Vec<PlannedGroup>),
    /// The program needs these accounts and lookup tables before it can plan.
    Missing {
        refs: Vec<Address>,
        tables: Vec<Address>,
    },
    /// The real outcome lives in the result account.
    Indirect,
}

/// Bounds-checked cursor over a payload.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
    /// Bytes readable past `data.len()`, all zero.
    extension: usize,
}

impl<'a> Reader<'a> {
    fn strict(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            extension: 0,
        }
    }

    fn zero_extended(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            extension: MAX_INLINE_RETURN_LEN.saturating_sub(data.len()),
        }
    }

    fn fill(&mut self, out: &mut [u8], what: &str) -> Result<(), DecodeError> {
        let end = self.pos + out.len();
        if end > self.data.len() + self.extension {
            return Err(DecodeError::schema(format!(
                "truncated {}: need {} bytes at offset {}, payload has {}",
                what,
                out.len(),
                self.pos,
                self.data.len()
            )));
        }
        let start = self.pos.min(self.data.len());
        let available = self.data.len().min(end) - start;
        out[..available].copy_from_slice(&self.data[start..start + available]);
        out[available..].fill(0);
        self.pos = end;
        Ok(())
    }

    fn u8(&mut self, what: &str) -> Result<u8, DecodeError> {
        let mut b = [0u8; 1];
        self.fill(&mut b, what)?;
        Ok(b[0])
    }

    fn bool(&mut self, what: &str) -> Result<bool, DecodeError> {
        match self.u8(what)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(DecodeError::schema(format!("invalid bool {} for {}", other, what))),
        }
    }

    fn vec_len(&mut self, what: &str) -> Result<usize, DecodeError> {
        let mut b = [0u8; 4];
        self.fill(&mut b, what)?;
        Ok(u32::from_le_bytes(b) as usize)
    }

    fn address(&mut self, what: &str) -> Result<Address, DecodeError> {
        let mut b = [0u8; ADDRESS_LENGTH];
        self.fill(&mut b, what)?;
        Ok(Address::new_from_array(b))
    }

    fn bytes(&mut self, what: &str) -> Result<Vec<u8>, DecodeError> {
        let len = self.vec_len(what)?;
        if self.pos + len > self.data.len() + self.extension {
            return Err(DecodeError::schema(format!("{} length {} overruns payload", what, len)));
        }
        let mut out = vec![0u8; len];
        self.fill(&mut out, what)?;
        Ok(out)
    }

    fn addresses(&mut self, what: &str) -> Result<Vec<Address>, DecodeError> {
        let count = self.vec_len(what)?;
        (0..count).map(|_| self.address(what)).collect()
    }

    fn descriptor(&mut self) -> Result<CallDescriptor, DecodeError> {
        let program_id = self.address("instruction program id")?;
        let count = self.vec_len("account metas")?;
        let accounts = (0..count)
            .map(|_| {
                let address = self.address("account meta pubkey")?;
                let is_signer = self.bool("is_signer")?;
                let is_writable = self.bool("is_writable")?;
                Ok(ResourceRef::new(address, is_signer, is_writable))
            })
            .collect::<Result<Vec<_>, DecodeError>>()?;
        let data = self.bytes("instruction data")?;
        Ok(CallDescriptor::new(program_id, accounts, data))
    }

    fn group(&mut self) -> Result<PlannedGroup, DecodeError> {
        let count = self.vec_len("instructions")?;
        let descriptors = (0..count)
            .map(|_| self.descriptor())
            .collect::<Result<Vec<_>, _>>()?;
        let table_keys = self.addresses("address lookup tables")?;
        Ok(PlannedGroup {
            descriptors,
            table_keys,
        })
    }

    fn outcome(&mut self, schema: &ReturnSchema) -> Result<ResolutionOutcome, DecodeError> {
        let tag = self.u8("outcome tag")?;
        match schema.kind_of(tag) {
            Some(OutcomeKind::Resolved) => {
                let count = self.vec_len("instruction groups")?;
                let groups = (0..count)
                    .map(|_| self.group())
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(ResolutionOutcome::Resolved(groups))
            }
            Some(OutcomeKind::Missing) => Ok(ResolutionOutcome::Missing {
                refs: self.addresses("missing accounts")?,
                tables: self.addresses("missing address lookup tables")?,
            }),
            Some(OutcomeKind::Indirect) => Ok(ResolutionOutcome::Indirect),
            None => Err(DecodeError::schema(format!("unknown outcome tag {}", tag))),
        }
    }
}

/// Decodes evaluations of one resolver program against one schema.
#[derive(Debug, Clone)]
pub struct ResultDecoder {
    program_id: Address,
    result_account: Address,
    schema: ReturnSchema,
}

impl ResultDecoder {
    /// Fails when the schema is invalid, before anything is decoded with it.
    pub fn new(program_id: Address, schema: ReturnSchema) -> Result<Self, DecodeError> {
        schema.validate()?;
        let result_account = result_account_address(&program_id).ok_or_else(|| {
            DecodeError::schema(format!("no result account address for {}", program_id))
        })?;
        Ok(Self {
            program_id,
            result_account,
            schema,
        })
    }

    pub fn result_account(&self) -> Address {
        self.result_account
    }

    pub fn schema(&self) -> &ReturnSchema {
        &self.schema
    }

    /// The return payload logged for this program (the last one, if it returned more than once).
    pub fn return_payload(&self, logs: &[String]) -> Result<Vec<u8>, DecodeError> {
        let program = self.program_id.to_string();
        let encoded = logs
            .iter()
            .rev()
            .filter_map(|line| line.strip_prefix(PROGRAM_RETURN_LOG_PREFIX))
            .filter_map(|rest| rest.split_once(' '))
            .find(|(id, _)| *id == program)
            .map(|(_, payload)| payload.trim())
            .ok_or(DecodeError::MissingReturnLog {
                program_id: self.program_id,
            })?;
        try_base64_decode(encoded)
            .ok_or_else(|| DecodeError::schema(format!("return data is not base64: {:?}", encoded)))
    }

    /// Decode a return-data payload; missing trailing bytes read as zero.
    pub fn decode_inline(&self, payload: &[u8]) -> Result<ResolutionOutcome, DecodeError> {
        Reader::zero_extended(payload).outcome(&self.schema)
    }

    /// Decode result account data. Trailing bytes after the outcome are ignored.
    pub fn decode_side_channel(&self, account_data: &[u8]) -> Result<ResolutionOutcome, DecodeError> {
        let body = account_data
            .get(RESULT_ACCOUNT_DISCRIMINATOR_LEN..)
            .ok_or_else(|| {
                DecodeError::schema(format!(
                    "result account data is {} bytes, shorter than its discriminator",
                    account_data.len()
                ))
            })?;
        match Reader::strict(body).outcome(&self.schema)? {
            ResolutionOutcome::Indirect => Err(DecodeError::schema(
                "result account holds another indirect marker",
            )),
            outcome => Ok(outcome),
        }
    }

    /// Decode one evaluation into `Resolved` or `Missing`, following an
    /// `Indirect` marker into the result account.
    pub fn decode(&self, evaluation: &Evaluation) -> Result<ResolutionOutcome, DecodeError> {
        let payload = self.return_payload(&evaluation.logs)?;
        match self.decode_inline(&payload)? {
            ResolutionOutcome::Indirect => {
                let data = evaluation.side_channel.as_deref().ok_or(
                    DecodeError::SideChannelMissing {
                        address: self.result_account,
                    },
                )?;
                debug!(
                    account = %self.result_account,
                    bytes = data.len(),
                    "outcome redirected to result account"
                );
                self.decode_side_channel(data)
            }
            outcome => Ok(outcome),
        }
    }
}
