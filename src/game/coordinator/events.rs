use serde::Serialize;

use crate::engine::consensus::ConsensusEvent;
use crate::engine::scoring::Points;
use crate::game::session::{MatchSummary, PhaseChange};
use crate::game::types::{
    Claim, ClaimId, ClaimStatus, Dispute, DisputeId, DisputeResolution, Player, PlayerId,
    RoomSettings,
};

/// Everything a room's subscribers see, in the order it happened.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(
    tag = "event",
    content = "payload",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum MatchEvent {
    PhaseChanged(PhaseChange),
    PlayerJoined(Player),
    PlayerReady {
        player_id: PlayerId,
        ready: bool,
    },
    SettingsUpdated(RoomSettings),
    ClaimSubmitted(Claim),
    /// Progress of a verification round or dispute expansion.
    Consensus(ConsensusEvent),
    ClaimAdjudicated {
        claim_id: ClaimId,
        status: ClaimStatus,
        points_awarded: Points,
    },
    DisputeFiled(Dispute),
    DisputeResolved {
        dispute_id: DisputeId,
        resolution: DisputeResolution,
        payout: Points,
        disputer_score: Points,
    },
    MatchFinished(MatchSummary),
}

impl MatchEvent {
    pub fn consensus(&self) -> Option<&ConsensusEvent> {
        match self {
            MatchEvent::Consensus(event) => Some(event),
            _ => None,
        }
    }
}
