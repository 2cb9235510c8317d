//! JSON-RPC transport.
//!
//! Probes are compiled into unsigned v0 transactions (plus a compute-unit
//! limit instruction) and sent to `simulateTransaction` with signature
//! verification off and blockhash replacement on. The side-channel result
//! account of the probed program is requested alongside, so an oversized
//! result comes back in the same round trip.
//!
//! ## Endpoints
//! - Localnet: `http://127.0.0.1:8899` (default)
//! - Devnet: `https://api.devnet.solana.com`
//! - Mainnet-beta: `https://api.mainnet-beta.solana.com`
//!
//! ## Usage
//!
//! ```ignore
//! let transport = RpcTransport::devnet(fee_payer).with_compute_unit_limit(400_000);
//! let evaluation = transport.evaluate(&probe, &tables).await?;
//! ```

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use executor_resolver_types::constants::COMPUTE_BUDGET_PROGRAM_ID;
use executor_resolver_types::encoding::{base64_decode, base64_encode, parse_address};
use executor_resolver_types::env_utils::{env_secs_or, env_string_or, env_var, env_var_or};
use executor_resolver_types::{
    result_account_address, Address, CallDescriptor, LookupTable,
};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::lookup_table::parse_lookup_table;
use crate::message::MessageV0;
use crate::network::{default_rpc_endpoint, infer_cluster_from_url, resolve_rpc_endpoint};
use crate::{DryRunTransport, Evaluation};

/// `SetComputeUnitLimit` instruction tag of the compute-budget program.
const SET_COMPUTE_UNIT_LIMIT_TAG: u8 = 2;

/// JSON-RPC simulation transport.
#[derive(Clone, Debug)]
pub struct RpcTransport {
    endpoint: String,
    agent: ureq::Agent,
    fee_payer: Address,
    compute_unit_limit: u32,
    commitment: String,
}

impl RpcTransport {
    /// Default request timeout in seconds (can be overridden by env).
    const DEFAULT_TIMEOUT_SECS: u64 = 30;
    /// Default connect timeout in seconds (can be overridden by env).
    const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
    pub const DEFAULT_COMMITMENT: &'static str = "confirmed";
    pub const DEFAULT_COMPUTE_UNIT_LIMIT: u32 = 1_000_000;

    fn default_timeouts() -> (Duration, Duration) {
        (
            env_secs_or("RESOLVER_RPC_TIMEOUT_SECS", Self::DEFAULT_TIMEOUT_SECS),
            env_secs_or(
                "RESOLVER_RPC_CONNECT_TIMEOUT_SECS",
                Self::DEFAULT_CONNECT_TIMEOUT_SECS,
            ),
        )
    }

    fn build_agent(timeout: Duration, connect_timeout: Duration) -> ureq::Agent {
        ureq::AgentBuilder::new()
            .timeout(timeout)
            .timeout_connect(connect_timeout)
            .build()
    }

    pub fn localnet(fee_payer: Address) -> Self {
        Self::new(default_rpc_endpoint("localnet"), fee_payer)
    }

    pub fn devnet(fee_payer: Address) -> Self {
        Self::new(default_rpc_endpoint("devnet"), fee_payer)
    }

    pub fn mainnet(fee_payer: Address) -> Self {
        Self::new(default_rpc_endpoint("mainnet-beta"), fee_payer)
    }

    /// Create a transport for `endpoint`, paying simulation fees from `fee_payer`.
    pub fn new(endpoint: &str, fee_payer: Address) -> Self {
        let (timeout, connect_timeout) = Self::default_timeouts();
        Self::with_timeouts(endpoint, fee_payer, timeout, connect_timeout)
    }

    /// Create a transport with explicit timeouts.
    pub fn with_timeouts(
        endpoint: &str,
        fee_payer: Address,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Self {
        debug!(
            endpoint,
            cluster = infer_cluster_from_url(endpoint).unwrap_or("custom"),
            timeout_secs = timeout.as_secs(),
            "rpc transport configured"
        );
        Self {
            endpoint: endpoint.to_string(),
            agent: Self::build_agent(timeout, connect_timeout),
            fee_payer,
            compute_unit_limit: env_var_or(
                "RESOLVER_COMPUTE_UNIT_LIMIT",
                Self::DEFAULT_COMPUTE_UNIT_LIMIT,
            ),
            commitment: Self::DEFAULT_COMMITMENT.to_string(),
        }
    }

    /// Configuration via environment variables:
    ///
    /// - `RESOLVER_RPC_ENDPOINT` - RPC endpoint (default: localnet)
    /// - `RESOLVER_FEE_PAYER` - base58 fee payer for simulations (required)
    /// - `RESOLVER_RPC_TIMEOUT_SECS`, `RESOLVER_RPC_CONNECT_TIMEOUT_SECS`
    /// - `RESOLVER_COMPUTE_UNIT_LIMIT`
    /// - `RESOLVER_COMMITMENT` - commitment for simulations and fetches (default: confirmed)
    pub fn from_env() -> Result<Self> {
        let payer: String = env_var("RESOLVER_FEE_PAYER")
            .ok_or_else(|| anyhow!("RESOLVER_FEE_PAYER must be set to a base58 address"))?;
        let fee_payer = parse_address(&payer, "fee payer")?;
        Ok(Self::new(&resolve_rpc_endpoint(), fee_payer)
            .with_commitment(&env_string_or("RESOLVER_COMMITMENT", Self::DEFAULT_COMMITMENT)))
    }

    pub fn with_compute_unit_limit(mut self, units: u32) -> Self {
        self.compute_unit_limit = units;
        self
    }

    pub fn with_commitment(mut self, commitment: &str) -> Self {
        self.commitment = commitment.to_string();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn commitment(&self) -> &str {
        &self.commitment
    }

    /// Execute a JSON-RPC request and return its `result`.
    fn call(&self, method: &str, params: Value) -> Result<Value> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response: Value = self
            .agent
            .post(&self.endpoint)
            .set("Content-Type", "application/json")
            .send_json(&body)
            .map_err(|e| anyhow!("RPC {} request failed: {}", method, e))?
            .into_json()
            .map_err(|e| anyhow!("Failed to parse RPC {} response: {}", method, e))?;

        if let Some(err) = response.get("error").filter(|e| !e.is_null()) {
            let msg = err
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            return Err(anyhow!("RPC {} error: {}", method, msg));
        }

        response
            .get("result")
            .cloned()
            .ok_or_else(|| anyhow!("No result in RPC {} response", method))
    }

    fn compute_unit_limit_instruction(&self) -> CallDescriptor {
        let mut data = vec![SET_COMPUTE_UNIT_LIMIT_TAG];
        data.extend_from_slice(&self.compute_unit_limit.to_le_bytes());
        CallDescriptor::new(COMPUTE_BUDGET_PROGRAM_ID, vec![], data)
    }

    /// Blocking simulation of `probe`; see [`DryRunTransport::evaluate`].
    pub fn simulate_blocking(
        &self,
        probe: &CallDescriptor,
        tables: &[LookupTable],
    ) -> Result<Evaluation> {
        let instructions = [probe.clone(), self.compute_unit_limit_instruction()];
        let message = MessageV0::compile(&self.fee_payer, &instructions, tables, [0u8; 32])
            .context("compile probe message")?;
        let tx = message.to_unsigned_transaction()?;

        let side_channel = result_account_address(&probe.program_id)
            .ok_or_else(|| anyhow!("no result account for program {}", probe.program_id))?;

        debug!(
            program = %probe.program_id,
            accounts = probe.accounts.len(),
            tables = tables.len(),
            tx_bytes = tx.len(),
            "simulating probe"
        );
        let result = self.call(
            "simulateTransaction",
            json!([
                base64_encode(&tx),
                {
                    "encoding": "base64",
                    "sigVerify": false,
                    "replaceRecentBlockhash": true,
                    "commitment": self.commitment,
                    "accounts": {
                        "encoding": "base64",
                        "addresses": [side_channel.to_string()],
                    },
                }
            ]),
        )?;
        parse_simulation_result(&result)
    }

    /// Blocking fetch of raw account data. `Ok(None)` when the account does not exist.
    pub fn fetch_account_data_blocking(&self, address: &Address) -> Result<Option<Vec<u8>>> {
        let result = self.call(
            "getAccountInfo",
            json!([
                address.to_string(),
                { "encoding": "base64", "commitment": self.commitment }
            ]),
        )?;
        parse_account_info(result.get("value").unwrap_or(&Value::Null))
    }

    pub fn fetch_table_blocking(&self, key: &Address) -> Result<LookupTable> {
        let data = self
            .fetch_account_data_blocking(key)?
            .ok_or_else(|| anyhow!("lookup table {} not found", key))?;
        parse_lookup_table(*key, &data)
    }
}

/// Account data from a base64-encoded account object; `None` for a missing account.
fn parse_account_info(value: &Value) -> Result<Option<Vec<u8>>> {
    if value.is_null() {
        return Ok(None);
    }
    let b64 = value
        .get("data")
        .and_then(|d| d.get(0))
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("account response has no base64 data"))?;
    base64_decode(b64, "account data").map(Some)
}

/// Extract logs and the side-channel account from a `simulateTransaction` result.
///
/// A simulation error is not fatal here: the decoder decides from the logs
/// whether a usable return value was produced.
pub fn parse_simulation_result(result: &Value) -> Result<Evaluation> {
    let value = result
        .get("value")
        .ok_or_else(|| anyhow!("simulateTransaction result has no value"))?;

    if let Some(err) = value.get("err").filter(|e| !e.is_null()) {
        warn!(error = %err, "simulation reported an error");
    }

    let logs = value
        .get("logs")
        .and_then(Value::as_array)
        .map(|lines| {
            lines
                .iter()
                .filter_map(|l| l.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default();

    let side_channel = match value
        .get("accounts")
        .and_then(Value::as_array)
        .and_then(|accounts| accounts.first())
    {
        Some(account) => parse_account_info(account)?,
        None => None,
    };

    Ok(Evaluation { logs, side_channel })
}

#[async_trait::async_trait]
impl DryRunTransport for RpcTransport {
    async fn evaluate(&self, probe: &CallDescriptor, tables: &[LookupTable]) -> Result<Evaluation> {
        let this = self.clone();
        let probe = probe.clone();
        let tables = tables.to_vec();
        tokio::task::spawn_blocking(move || this.simulate_blocking(&probe, &tables))
            .await
            .map_err(|e| anyhow!("simulation task failed: {}", e))?
    }

    async fn fetch_table(&self, key: &Address) -> Result<LookupTable> {
        let this = self.clone();
        let key = *key;
        tokio::task::spawn_blocking(move || this.fetch_table_blocking(&key))
            .await
            .map_err(|e| anyhow!("lookup table fetch task failed: {}", e))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payer() -> Address {
        Address::new_from_array([42; 32])
    }

    #[test]
    fn test_transport_creation() {
        let local = RpcTransport::localnet(payer());
        assert_eq!(local.endpoint(), "http://127.0.0.1:8899");

        let devnet = RpcTransport::devnet(payer());
        assert!(devnet.endpoint().contains("devnet"));

        let custom = RpcTransport::new("https://rpc.example.org", payer());
        assert_eq!(custom.endpoint(), "https://rpc.example.org");
    }

    #[test]
    fn test_from_env() {
        std::env::remove_var("RESOLVER_FEE_PAYER");
        assert!(RpcTransport::from_env().is_err());

        std::env::set_var("RESOLVER_FEE_PAYER", "not-base58!");
        let err = RpcTransport::from_env().unwrap_err();
        assert!(err.to_string().contains("Invalid fee payer"));

        std::env::set_var("RESOLVER_FEE_PAYER", payer().to_string());
        std::env::set_var("RESOLVER_COMMITMENT", "finalized");
        let transport = RpcTransport::from_env().unwrap();
        assert_eq!(transport.commitment(), "finalized");
        assert_eq!(transport.fee_payer, payer());

        std::env::remove_var("RESOLVER_COMMITMENT");
        assert_eq!(RpcTransport::from_env().unwrap().commitment(), "confirmed");
        std::env::remove_var("RESOLVER_FEE_PAYER");
    }

    #[test]
    fn test_compute_unit_limit_instruction() {
        let transport = RpcTransport::localnet(payer()).with_compute_unit_limit(1_000_000);
        let ix = transport.compute_unit_limit_instruction();
        assert_eq!(ix.program_id, COMPUTE_BUDGET_PROGRAM_ID);
        assert_eq!(ix.data, vec![2, 0x40, 0x42, 0x0f, 0x00]);
        assert!(ix.accounts.is_empty());
    }

    #[test]
    fn test_parse_simulation_result_with_side_channel() {
        let result = json!({
            "context": { "slot": 10 },
            "value": {
                "err": null,
                "logs": [
                    "Program GeSLWQHGZRWhrdqo5Zvaa3JonhzQmfEmJSuHJwmRebPw invoke [1]",
                    "Program return: GeSLWQHGZRWhrdqo5Zvaa3JonhzQmfEmJSuHJwmRebPw Ag==",
                ],
                "accounts": [
                    { "data": ["AQID", "base64"], "executable": false, "lamports": 1 }
                ],
            }
        });
        let evaluation = parse_simulation_result(&result).unwrap();
        assert_eq!(evaluation.logs.len(), 2);
        assert_eq!(evaluation.side_channel, Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_parse_simulation_result_missing_account_and_error() {
        let result = json!({
            "value": {
                "err": { "InstructionError": [0, "InvalidAccountData"] },
                "logs": ["Program log: failed"],
                "accounts": [null],
            }
        });
        let evaluation = parse_simulation_result(&result).unwrap();
        assert_eq!(evaluation.logs, vec!["Program log: failed".to_string()]);
        assert_eq!(evaluation.side_channel, None);

        assert!(parse_simulation_result(&json!({})).is_err());
    }

    /// Run with: cargo test -p executor-resolver-transport -- --ignored
    #[tokio::test]
    #[ignore = "requires a local validator"]
    async fn test_fetch_missing_table_from_localnet() {
        let transport = RpcTransport::localnet(payer());
        let missing = Address::new_from_array([7; 32]);
        assert!(transport.fetch_table(&missing).await.is_err());
    }
}
