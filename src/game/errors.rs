use thiserror::Error;

use crate::config::ConfigError;
use crate::engine::consensus::ConsensusError;

use super::game_phases::{MatchPhase, PhaseTrigger};
use super::types::{ClaimId, PlayerId};

/// Malformed or out-of-turn input. The offending call is rejected and no
/// state is touched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("claim content is empty")]
    EmptyContent,
    #[error("claim content has {len} characters, limit is {max}")]
    ContentTooLong { len: usize, max: usize },
    #[error("declared confidence {0} is outside 50..=100")]
    ConfidenceOutOfRange(u8),
    #[error("dispute reasoning is empty")]
    EmptyReasoning,
    #[error("player {0} is not in this match")]
    UnknownPlayer(PlayerId),
    #[error("claim {0} does not exist")]
    UnknownClaim(ClaimId),
    #[error("claim {0} has not been adjudicated yet")]
    ClaimPending(ClaimId),
    #[error("a match needs at least one player")]
    NoPlayers,
    #[error("player {0} is not the host")]
    NotHost(PlayerId),
    #[error("username {0} is already taken")]
    DuplicatePlayer(String),
    #[error("room is full ({max} players)")]
    RoomFull { max: usize },
    #[error("bot limit of {max} reached")]
    BotLimit { max: usize },
    #[error("not allowed during the {0:?} phase")]
    WrongPhase(MatchPhase),
    #[error("username is empty")]
    EmptyUsername,
    #[error("submission length must be at least one minute")]
    ZeroDuration,
    #[error("no more bot profiles available")]
    NoBotProfiles,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MatchError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("cannot apply {trigger:?} in the {from:?} phase")]
    InvalidTransition {
        from: MatchPhase,
        trigger: PhaseTrigger,
    },
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
    #[error(transparent)]
    Consensus(#[from] ConsensusError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to spawn match task: {0}")]
    TaskSpawn(String),
    #[error("match coordinator has shut down")]
    CoordinatorClosed,
}

impl MatchError {
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }
}
