//! Iterative account resolution for executor resolver programs.
//!
//! A resolver program knows which accounts and instructions are needed to
//! execute a VAA, but it can only tell us piece by piece: each dry-run reports
//! either the complete plan or the accounts it still needs to look at. This
//! crate drives that exchange to a fixed point.
//!
//! - [`decoder`]: return-data decoding, including the result-account indirection
//! - [`schema`]: versioned outcome schema, loadable from an interface description
//! - [`session`]: ordered, deduplicated accumulator of discovered accounts and tables
//! - [`probe`]: discovery probe construction
//! - [`placeholder`]: substitution of placeholder accounts in the final plan
//! - [`assembler`]: lookup table materialization and call group assembly
//! - [`driver`]: the round loop ([`Resolver`])
//!
//! # Example
//!
//! ```ignore
//! use executor_resolver_core::Resolver;
//! use executor_resolver_transport::RpcTransport;
//!
//! let resolver = Resolver::new(RpcTransport::devnet(relayer));
//! let groups = resolver.resolve(&program_id, &relayer, &vaa_body).await?;
//! ```

pub mod assembler;
pub mod decoder;
pub mod driver;
pub mod error;
pub mod placeholder;
pub mod probe;
pub mod schema;
pub mod session;

pub use decoder::{ResolutionOutcome, ResultDecoder};
pub use driver::{Resolution, Resolver, ResolverConfig};
pub use error::{DecodeError, ResolutionError};
pub use placeholder::PlaceholderBindings;
pub use schema::ReturnSchema;
pub use session::ResolutionSession;
