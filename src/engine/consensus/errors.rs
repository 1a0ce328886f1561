use thiserror::Error;

use super::types::ValidatorId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConsensusError {
    #[error("consensus round cancelled")]
    Cancelled,
    #[error("validator roster needs at least {required} validators, got {actual}")]
    RosterTooSmall { required: usize, actual: usize },
}

/// Failure reported by a vote backend for one validator.
///
/// The simulator never propagates these: the affected validator is recorded
/// as an Uncertain vote and the round carries on.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VoteSourceError {
    #[error("validator {validator} did not answer after {attempts} attempt(s)")]
    TimeoutExhausted {
        validator: ValidatorId,
        attempts: u32,
    },
    #[error("validator {validator} unavailable: {reason}")]
    Unavailable {
        validator: ValidatorId,
        reason: String,
    },
}
