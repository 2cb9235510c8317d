//! Resolution driver.
//!
//! Each round builds a probe from everything discovered so far, dry-runs it,
//! and decodes the outcome. `Missing` feeds the session and loops; `Resolved`
//! is assembled into executable call groups. Rounds are strictly sequential.
//! Lookup table fetches inside a round fan out and are joined before the next
//! probe.

use executor_resolver_transport::DryRunTransport;
use executor_resolver_types::env_utils::env_var_or;
use executor_resolver_types::{Address, CallGroup, LookupTable};
use tracing::{debug, info};

use crate::assembler::{assemble, fetch_tables};
use crate::decoder::{ResolutionOutcome, ResultDecoder};
use crate::error::{DecodeError, ResolutionError};
use crate::placeholder::PlaceholderBindings;
use crate::probe::build_probe;
use crate::schema::ReturnSchema;
use crate::session::ResolutionSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Hard cap on probe rounds, independent of stall detection.
    pub max_rounds: usize,
    /// Maximum lookup table fetches in flight.
    pub fetch_concurrency: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_rounds: 32,
            fetch_concurrency: 8,
        }
    }
}

impl ResolverConfig {
    /// Read `RESOLVER_MAX_ROUNDS` and `RESOLVER_FETCH_CONCURRENCY`. Both are at least 1.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_rounds: env_var_or("RESOLVER_MAX_ROUNDS", defaults.max_rounds).max(1),
            fetch_concurrency: env_var_or("RESOLVER_FETCH_CONCURRENCY", defaults.fetch_concurrency)
                .max(1),
        }
    }

    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }
}

/// A finished resolution and the state that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub groups: Vec<CallGroup>,
    /// Probe rounds used, including the final one.
    pub rounds: usize,
    pub known_refs: Vec<Address>,
    pub known_tables: Vec<LookupTable>,
}

/// Drives resolutions against one transport.
///
/// Holds no per-resolution state: every call gets its own session, so one
/// resolver can serve concurrent resolutions.
pub struct Resolver<T> {
    transport: T,
    schema: ReturnSchema,
    config: ResolverConfig,
}

impl<T: DryRunTransport> Resolver<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            schema: ReturnSchema::v1(),
            config: ResolverConfig::default(),
        }
    }

    pub fn with_schema(mut self, schema: ReturnSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve the call groups that execute `vaa_body` on `program_id`, paid for by `caller`.
    pub async fn resolve(
        &self,
        program_id: &Address,
        caller: &Address,
        vaa_body: &[u8],
    ) -> Result<Vec<CallGroup>, ResolutionError> {
        Ok(self
            .resolve_detailed(program_id, caller, vaa_body)
            .await?
            .groups)
    }

    pub async fn resolve_detailed(
        &self,
        program_id: &Address,
        caller: &Address,
        vaa_body: &[u8],
    ) -> Result<Resolution, ResolutionError> {
        self.resolve_with_bindings(program_id, &PlaceholderBindings::for_caller(*caller), vaa_body)
            .await
    }

    /// Like [`Resolver::resolve_detailed`], with explicit placeholder bindings.
    pub async fn resolve_with_bindings(
        &self,
        program_id: &Address,
        bindings: &PlaceholderBindings,
        vaa_body: &[u8],
    ) -> Result<Resolution, ResolutionError> {
        let decoder = ResultDecoder::new(*program_id, self.schema)?;
        let result_account = decoder.result_account();
        let mut session = ResolutionSession::new();

        loop {
            if session.round() >= self.config.max_rounds {
                return Err(ResolutionError::Exceeded {
                    max_rounds: self.config.max_rounds,
                });
            }
            let round = session.begin_round();
            let probe = build_probe(
                program_id,
                &self.schema.entry_point,
                vaa_body,
                session.known_refs(),
                &result_account,
            );
            let tables = session.known_tables();
            debug!(
                program = %program_id,
                round,
                refs = probe.accounts.len(),
                tables = tables.len(),
                "probing resolver"
            );

            let evaluation = self
                .transport
                .evaluate(&probe, &tables)
                .await
                .map_err(ResolutionError::Transport)?;

            match decoder.decode(&evaluation)? {
                ResolutionOutcome::Resolved(planned) => {
                    let groups = assemble(
                        &self.transport,
                        &planned,
                        &session,
                        bindings,
                        self.config.fetch_concurrency,
                    )
                    .await?;
                    info!(
                        program = %program_id,
                        rounds = round,
                        groups = groups.len(),
                        "resolution converged"
                    );
                    return Ok(Resolution {
                        groups,
                        rounds: round,
                        known_refs: session.known_refs().to_vec(),
                        known_tables: session.known_tables(),
                    });
                }
                ResolutionOutcome::Missing { refs, tables } => {
                    let new_tables = session.unknown_tables(&tables);
                    let has_new_refs = refs.iter().any(|r| !session.knows_ref(r));
                    if !has_new_refs && new_tables.is_empty() {
                        return Err(ResolutionError::Stalled { round });
                    }
                    let fetched =
                        fetch_tables(&self.transport, &new_tables, self.config.fetch_concurrency)
                            .await
                            .map_err(ResolutionError::Transport)?;
                    let added = session.merge(&refs, fetched);
                    debug!(
                        round,
                        added,
                        known_refs = session.known_refs().len(),
                        known_tables = session.known_table_keys().len(),
                        "resolver reported missing accounts"
                    );
                }
                ResolutionOutcome::Indirect => {
                    return Err(DecodeError::schema("unresolved indirect outcome").into());
                }
            }
        }
    }
}
