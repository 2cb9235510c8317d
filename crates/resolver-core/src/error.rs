//! Resolution error taxonomy.
//!
//! Every variant is fatal for the current `resolve()` call. Only
//! [`ResolutionError::Transport`] is worth retrying, and only by the caller.

use executor_resolver_types::Address;

/// Malformed or unexpected evaluator output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// No `Program return:` line for the target program in the evaluation logs.
    MissingReturnLog { program_id: Address },
    /// The outcome was `Indirect` but the result account was not returned.
    SideChannelMissing { address: Address },
    /// Payload or schema does not match the expected layout.
    SchemaMismatch(String),
}

impl DecodeError {
    pub fn schema(msg: impl Into<String>) -> Self {
        DecodeError::SchemaMismatch(msg.into())
    }
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::MissingReturnLog { program_id } => {
                write!(f, "no return data logged by program {}", program_id)
            }
            DecodeError::SideChannelMissing { address } => {
                write!(f, "result account {} missing from evaluation", address)
            }
            DecodeError::SchemaMismatch(msg) => write!(f, "schema mismatch: {}", msg),
        }
    }
}

impl std::error::Error for DecodeError {}

/// Why a resolution failed.
#[derive(Debug)]
pub enum ResolutionError {
    /// Evaluation or table fetch failed (network, timeout, node error).
    Transport(anyhow::Error),
    /// Evaluator output could not be decoded.
    Decode(DecodeError),
    /// A `Missing` outcome added nothing new.
    Stalled { round: usize },
    /// The round bound was reached without a `Resolved` outcome.
    Exceeded { max_rounds: usize },
}

impl ResolutionError {
    pub fn is_transport(&self) -> bool {
        matches!(self, ResolutionError::Transport(_))
    }
}

impl std::fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolutionError::Transport(e) => write!(f, "transport error: {:#}", e),
            ResolutionError::Decode(e) => write!(f, "decode error: {}", e),
            ResolutionError::Stalled { round } => write!(
                f,
                "resolution stalled in round {}: missing outcome added no new references",
                round
            ),
            ResolutionError::Exceeded { max_rounds } => {
                write!(f, "resolution did not converge within {} rounds", max_rounds)
            }
        }
    }
}

impl std::error::Error for ResolutionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResolutionError::Transport(e) => Some(&**e),
            ResolutionError::Decode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DecodeError> for ResolutionError {
    fn from(e: DecodeError) -> Self {
        ResolutionError::Decode(e)
    }
}
