//! Executor Resolver Transport
//!
//! Side-effect-free evaluation of resolver probes against an execution target.
//!
//! This crate provides:
//! - [`DryRunTransport`]: the contract the resolution driver consumes
//! - [`rpc`]: a JSON-RPC transport that simulates probes as unsigned v0 transactions
//! - [`message`]: the v0 message compiler used to build those transactions
//! - [`lookup_table`]: parsing of address lookup table accounts
//! - [`retry`]: caller-side retry with exponential backoff
//! - [`test_utils`]: a scripted in-memory transport and return payload writer
//!
//! # Example
//!
//! ```ignore
//! use executor_resolver_transport::{DryRunTransport, RpcTransport};
//!
//! let transport = RpcTransport::localnet(fee_payer);
//! let evaluation = transport.evaluate(&probe, &[]).await?;
//! for line in &evaluation.logs {
//!     println!("{}", line);
//! }
//! ```

pub mod lookup_table;
pub mod message;
pub mod network;
pub mod retry;
pub mod rpc;
pub mod test_utils;

pub use retry::{retry_when, should_retry_error, with_retries};
pub use rpc::RpcTransport;
pub use test_utils::{ReturnPayload, ScriptedTransport};

use std::sync::Arc;

use anyhow::Result;
use executor_resolver_types::{Address, CallDescriptor, LookupTable};

/// Raw output of one dry-run evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    /// Program log lines, in emission order.
    pub logs: Vec<String>,
    /// Raw data of the side-channel result account, if the target has one.
    pub side_channel: Option<Vec<u8>>,
}

impl Evaluation {
    pub fn from_logs(logs: Vec<String>) -> Self {
        Self {
            logs,
            side_channel: None,
        }
    }

    pub fn with_side_channel(mut self, data: Vec<u8>) -> Self {
        self.side_channel = Some(data);
        self
    }
}

/// Side-effect-free evaluation of a call against the execution target.
///
/// Implementations must bound each call with a timeout and report a hang as an
/// error. Nothing here retries; see [`with_retries`] for caller-side policy.
#[async_trait::async_trait]
pub trait DryRunTransport: Send + Sync {
    /// Simulate `probe`, compiling against the given lookup tables.
    async fn evaluate(&self, probe: &CallDescriptor, tables: &[LookupTable]) -> Result<Evaluation>;

    /// Fetch the full contents of a lookup table.
    async fn fetch_table(&self, key: &Address) -> Result<LookupTable>;
}

#[async_trait::async_trait]
impl<T: DryRunTransport + ?Sized> DryRunTransport for Arc<T> {
    async fn evaluate(&self, probe: &CallDescriptor, tables: &[LookupTable]) -> Result<Evaluation> {
        (**self).evaluate(probe, tables).await
    }

    async fn fetch_table(&self, key: &Address) -> Result<LookupTable> {
        (**self).fetch_table(key).await
    }
}
