//! Executor Resolver
//!
//! Client-side resolution of the accounts and instructions needed to execute
//! a VAA through an executor resolver program:
//!
//! - **Discovery**: dry-run the program's resolver entry point, feeding back
//!   the accounts it asks for until it emits a complete plan
//! - **Decoding**: read inline return data or the program's result account
//! - **Assembly**: materialize lookup tables and bind placeholder accounts
//!
//! See [`Resolver`] for the round loop and [`RpcTransport`] for the JSON-RPC
//! simulation transport.

pub use executor_resolver_core::{
    assembler, decoder, placeholder, schema, session, DecodeError, PlaceholderBindings,
    Resolution, ResolutionError, ResolutionOutcome, ResolutionSession, Resolver, ResolverConfig,
    ResultDecoder, ReturnSchema,
};
pub use executor_resolver_transport::{
    retry_when, should_retry_error, with_retries, DryRunTransport, Evaluation, ReturnPayload,
    RpcTransport, ScriptedTransport,
};
pub use executor_resolver_types::{
    constants, Address, CallDescriptor, CallGroup, LookupTable, PlannedGroup, ResourceRef,
    RetryConfig,
};

/// Resolve with caller-side retries.
///
/// Only transport failures are retried, with exponential backoff. Decode
/// errors, stalls and exceeded round bounds are returned immediately: the
/// same program would fail the same way again.
pub async fn resolve_with_retries<T: DryRunTransport>(
    resolver: &Resolver<T>,
    program_id: &Address,
    caller: &Address,
    vaa_body: &[u8],
    retry: &RetryConfig,
) -> Result<Resolution, ResolutionError> {
    retry_when(retry, ResolutionError::is_transport, || {
        resolver.resolve_detailed(program_id, caller, vaa_body)
    })
    .await
}
