//! Scripted transport and return payload writer for tests.
//!
//! [`ReturnPayload`] writes resolver return values in the on-chain wire
//! format, and [`ScriptedTransport`] replays a queue of them so resolution
//! runs can be exercised without a network.
//!
//! ```ignore
//! let transport = ScriptedTransport::new(program_id)
//!     .then_missing(&[vaa_account], &[])
//!     .then_resolved(&[group])
//!     .with_table(table);
//! ```

use std::collections::{HashMap, VecDeque};

use anyhow::{anyhow, Result};
use executor_resolver_types::constants::{
    PROGRAM_RETURN_LOG_PREFIX, RESULT_ACCOUNT_DISCRIMINATOR_LEN,
};
use executor_resolver_types::encoding::base64_encode;
use executor_resolver_types::{Address, CallDescriptor, LookupTable, PlannedGroup};
use parking_lot::Mutex;

use crate::{DryRunTransport, Evaluation};

const TAG_RESOLVED: u8 = 0;
const TAG_MISSING: u8 = 1;
const TAG_INDIRECT: u8 = 2;

/// Writer for resolver return values.
pub struct ReturnPayload;

impl ReturnPayload {
    fn put_len(out: &mut Vec<u8>, len: usize) {
        out.extend_from_slice(&(len as u32).to_le_bytes());
    }

    fn put_addresses(out: &mut Vec<u8>, addresses: &[Address]) {
        Self::put_len(out, addresses.len());
        for address in addresses {
            out.extend_from_slice(address.as_ref());
        }
    }

    /// `Resolved` outcome carrying `groups`.
    pub fn resolved(groups: &[PlannedGroup]) -> Vec<u8> {
        let mut out = vec![TAG_RESOLVED];
        Self::put_len(&mut out, groups.len());
        for group in groups {
            Self::put_len(&mut out, group.descriptors.len());
            for descriptor in &group.descriptors {
                out.extend_from_slice(descriptor.program_id.as_ref());
                Self::put_len(&mut out, descriptor.accounts.len());
                for account in &descriptor.accounts {
                    out.extend_from_slice(account.address.as_ref());
                    out.push(account.is_signer as u8);
                    out.push(account.is_writable as u8);
                }
                Self::put_len(&mut out, descriptor.data.len());
                out.extend_from_slice(&descriptor.data);
            }
            Self::put_addresses(&mut out, &group.table_keys);
        }
        out
    }

    /// `Missing` outcome naming unknown account references and lookup tables.
    pub fn missing(refs: &[Address], tables: &[Address]) -> Vec<u8> {
        let mut out = vec![TAG_MISSING];
        Self::put_addresses(&mut out, refs);
        Self::put_addresses(&mut out, tables);
        out
    }

    /// Marker redirecting the reader to the side-channel result account.
    pub fn indirect() -> Vec<u8> {
        vec![TAG_INDIRECT]
    }

    /// The log line the runtime emits for `program_id` returning `payload`.
    pub fn return_log(program_id: &Address, payload: &[u8]) -> String {
        format!("{}{} {}", PROGRAM_RETURN_LOG_PREFIX, program_id, base64_encode(payload))
    }

    /// Result account data: discriminator, payload, then `padding` zero bytes.
    pub fn side_channel_account(payload: &[u8], padding: usize) -> Vec<u8> {
        let mut data = vec![0xAB; RESULT_ACCOUNT_DISCRIMINATOR_LEN];
        data.extend_from_slice(payload);
        data.resize(data.len() + padding, 0);
        data
    }

    /// Drop trailing zero bytes, as some runtimes do with return data.
    pub fn trim_trailing_zeros(payload: &[u8]) -> Vec<u8> {
        let end = payload.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
        payload[..end].to_vec()
    }

    /// A complete evaluation in which `program_id` returned `payload` inline.
    pub fn evaluation(program_id: &Address, payload: &[u8]) -> Evaluation {
        Evaluation::from_logs(vec![
            format!("Program {} invoke [1]", program_id),
            "Program log: Instruction: ResolveExecuteVaaV1".to_string(),
            Self::return_log(program_id, payload),
            format!("Program {} success", program_id),
        ])
    }
}

type Responder = Box<dyn Fn(&CallDescriptor) -> Result<Evaluation> + Send + Sync>;

enum Step {
    Evaluation(Evaluation),
    Error(String),
}

#[derive(Default)]
struct Recorded {
    probes: Vec<CallDescriptor>,
    probe_tables: Vec<Vec<Address>>,
    table_fetches: HashMap<Address, usize>,
}

/// In-memory transport that replays scripted evaluations in order.
///
/// Once the script runs out, the responder (if any) answers every further
/// probe; without one, evaluation fails.
pub struct ScriptedTransport {
    program_id: Address,
    steps: Mutex<VecDeque<Step>>,
    responder: Option<Responder>,
    tables: HashMap<Address, LookupTable>,
    recorded: Mutex<Recorded>,
}

impl ScriptedTransport {
    pub fn new(program_id: Address) -> Self {
        Self {
            program_id,
            steps: Mutex::new(VecDeque::new()),
            responder: None,
            tables: HashMap::new(),
            recorded: Mutex::new(Recorded::default()),
        }
    }

    fn push(self, step: Step) -> Self {
        self.steps.lock().push_back(step);
        self
    }

    pub fn then_resolved(self, groups: &[PlannedGroup]) -> Self {
        let evaluation = ReturnPayload::evaluation(&self.program_id, &ReturnPayload::resolved(groups));
        self.push(Step::Evaluation(evaluation))
    }

    pub fn then_missing(self, refs: &[Address], tables: &[Address]) -> Self {
        let evaluation =
            ReturnPayload::evaluation(&self.program_id, &ReturnPayload::missing(refs, tables));
        self.push(Step::Evaluation(evaluation))
    }

    /// Inline `Indirect` marker with `payload` written to the result account.
    pub fn then_indirect(self, payload: &[u8], padding: usize) -> Self {
        let evaluation = ReturnPayload::evaluation(&self.program_id, &ReturnPayload::indirect())
            .with_side_channel(ReturnPayload::side_channel_account(payload, padding));
        self.push(Step::Evaluation(evaluation))
    }

    /// An arbitrary inline return payload.
    pub fn then_payload(self, payload: &[u8]) -> Self {
        let evaluation = ReturnPayload::evaluation(&self.program_id, payload);
        self.push(Step::Evaluation(evaluation))
    }

    pub fn then_raw(self, evaluation: Evaluation) -> Self {
        self.push(Step::Evaluation(evaluation))
    }

    pub fn then_error(self, message: &str) -> Self {
        self.push(Step::Error(message.to_string()))
    }

    pub fn with_table(mut self, table: LookupTable) -> Self {
        self.tables.insert(table.key, table);
        self
    }

    pub fn with_responder<F>(mut self, responder: F) -> Self
    where
        F: Fn(&CallDescriptor) -> Result<Evaluation> + Send + Sync + 'static,
    {
        self.responder = Some(Box::new(responder));
        self
    }

    pub fn program_id(&self) -> Address {
        self.program_id
    }

    /// Every probe evaluated so far, in order.
    pub fn probes(&self) -> Vec<CallDescriptor> {
        self.recorded.lock().probes.clone()
    }

    /// Keys of the tables handed to each evaluation, in order.
    pub fn probe_tables(&self) -> Vec<Vec<Address>> {
        self.recorded.lock().probe_tables.clone()
    }

    pub fn evaluation_count(&self) -> usize {
        self.recorded.lock().probes.len()
    }

    pub fn table_fetch_count(&self, key: &Address) -> usize {
        self.recorded
            .lock()
            .table_fetches
            .get(key)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_table_fetches(&self) -> usize {
        self.recorded.lock().table_fetches.values().sum()
    }

    /// Scripted steps not yet consumed.
    pub fn remaining(&self) -> usize {
        self.steps.lock().len()
    }
}

#[async_trait::async_trait]
impl DryRunTransport for ScriptedTransport {
    async fn evaluate(&self, probe: &CallDescriptor, tables: &[LookupTable]) -> Result<Evaluation> {
        {
            let mut recorded = self.recorded.lock();
            recorded.probes.push(probe.clone());
            recorded
                .probe_tables
                .push(tables.iter().map(|t| t.key).collect());
        }

        let step = self.steps.lock().pop_front();
        match step {
            Some(Step::Evaluation(evaluation)) => Ok(evaluation),
            Some(Step::Error(message)) => Err(anyhow!(message)),
            None => match &self.responder {
                Some(responder) => responder(probe),
                None => Err(anyhow!("scripted transport has no evaluation left")),
            },
        }
    }

    async fn fetch_table(&self, key: &Address) -> Result<LookupTable> {
        *self.recorded.lock().table_fetches.entry(*key).or_insert(0) += 1;
        self.tables
            .get(key)
            .cloned()
            .ok_or_else(|| anyhow!("lookup table {} not found", key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use executor_resolver_types::ResourceRef;

    fn addr(b: u8) -> Address {
        Address::new_from_array([b; 32])
    }

    #[test]
    fn test_missing_layout() {
        let payload = ReturnPayload::missing(&[addr(1)], &[]);
        assert_eq!(payload.len(), 1 + 4 + 32 + 4);
        assert_eq!(payload[0], TAG_MISSING);
        assert_eq!(&payload[1..5], &[1, 0, 0, 0]);
        assert_eq!(&payload[37..41], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_resolved_layout() {
        let group = PlannedGroup {
            descriptors: vec![CallDescriptor::new(
                addr(7),
                vec![ResourceRef::new(addr(1), true, false)],
                vec![0xde, 0xad],
            )],
            table_keys: vec![addr(9)],
        };
        let payload = ReturnPayload::resolved(&[group]);
        let mut expected = vec![TAG_RESOLVED, 1, 0, 0, 0, 1, 0, 0, 0];
        expected.extend_from_slice(&[7; 32]);
        expected.extend_from_slice(&[1, 0, 0, 0]);
        expected.extend_from_slice(&[1; 32]);
        expected.extend_from_slice(&[1, 0]);
        expected.extend_from_slice(&[2, 0, 0, 0, 0xde, 0xad]);
        expected.extend_from_slice(&[1, 0, 0, 0]);
        expected.extend_from_slice(&[9; 32]);
        assert_eq!(payload, expected);
    }

    #[test]
    fn test_side_channel_account_and_trim() {
        let data = ReturnPayload::side_channel_account(&[1, 2], 3);
        assert_eq!(data.len(), RESULT_ACCOUNT_DISCRIMINATOR_LEN + 5);
        assert_eq!(&data[8..], &[1, 2, 0, 0, 0]);

        assert_eq!(ReturnPayload::trim_trailing_zeros(&[1, 0, 2, 0, 0]), vec![1, 0, 2]);
        assert!(ReturnPayload::trim_trailing_zeros(&[0, 0]).is_empty());
    }

    #[test]
    fn test_return_log_format() {
        let line = ReturnPayload::return_log(&addr(0), &[2]);
        assert_eq!(line, "Program return: 11111111111111111111111111111111 Ag==");
    }

    #[tokio::test]
    async fn test_scripted_replay_then_responder() {
        let program = addr(5);
        let transport = ScriptedTransport::new(program)
            .then_error("connection reset")
            .then_missing(&[addr(1)], &[])
            .with_responder(move |_| Ok(ReturnPayload::evaluation(&program, &[0, 0, 0, 0, 0])));
        let probe = CallDescriptor::new(program, vec![], vec![]);

        assert!(transport.evaluate(&probe, &[]).await.is_err());
        let missing = transport.evaluate(&probe, &[]).await.unwrap();
        assert_eq!(missing.logs.len(), 4);
        assert!(transport.evaluate(&probe, &[]).await.is_ok());
        assert_eq!(transport.evaluation_count(), 3);
        assert_eq!(transport.remaining(), 0);
    }

    #[tokio::test]
    async fn test_table_fetches_are_counted() {
        let table = LookupTable::new(addr(9), vec![addr(1)]);
        let transport = ScriptedTransport::new(addr(5)).with_table(table.clone());

        assert_eq!(transport.fetch_table(&addr(9)).await.unwrap(), table);
        assert!(transport.fetch_table(&addr(8)).await.is_err());
        assert_eq!(transport.table_fetch_count(&addr(9)), 1);
        assert_eq!(transport.table_fetch_count(&addr(8)), 1);
        assert_eq!(transport.total_table_fetches(), 2);
    }
}
