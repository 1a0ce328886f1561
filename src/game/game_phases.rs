//! Match phase definitions and transitions

use serde::{Deserialize, Serialize};

use super::errors::MatchError;

/// Phases of a match, in play order. The machine is cyclic: a reset from
/// any phase returns to `Lobby`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchPhase {
    /// Players join, host picks settings
    Lobby,
    /// Players submit claims until the timer runs out
    Submission,
    /// Claims are adjudicated one at a time
    Verification,
    /// Verdicts may be challenged
    Dispute,
    /// Match results
    Leaderboard,
    /// Cumulative standings across matches
    GlobalLeaderboard,
}

/// Everything that can move the machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseTrigger {
    StartMatch,
    SubmissionTimerElapsed,
    ClaimsProcessed,
    DisputeTimerElapsed,
    SkipToResults,
    ShowGlobalLeaderboard,
    Reset,
}

impl MatchPhase {
    /// Check if a match is underway
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            MatchPhase::Submission | MatchPhase::Verification | MatchPhase::Dispute
        )
    }

    /// Get the phase `trigger` leads to, if the transition is legal.
    pub fn on(&self, trigger: PhaseTrigger) -> Option<MatchPhase> {
        use MatchPhase::*;
        use PhaseTrigger::*;
        match (self, trigger) {
            (_, Reset) => Some(Lobby),
            (Lobby, StartMatch) => Some(Submission),
            (Submission, SubmissionTimerElapsed) => Some(Verification),
            (Verification, ClaimsProcessed) => Some(Dispute),
            (Dispute, DisputeTimerElapsed) | (Dispute, SkipToResults) => Some(Leaderboard),
            (Leaderboard, ShowGlobalLeaderboard) => Some(GlobalLeaderboard),
            _ => None,
        }
    }

    pub fn transition(&self, trigger: PhaseTrigger) -> Result<MatchPhase, MatchError> {
        self.on(trigger).ok_or(MatchError::InvalidTransition {
            from: *self,
            trigger,
        })
    }

    /// The explicit action `advance` performs in this phase, if any.
    /// Timed transitions cannot be forced.
    pub fn explicit_advance(&self) -> Option<PhaseTrigger> {
        match self {
            MatchPhase::Lobby => Some(PhaseTrigger::StartMatch),
            MatchPhase::Dispute => Some(PhaseTrigger::SkipToResults),
            MatchPhase::Leaderboard => Some(PhaseTrigger::ShowGlobalLeaderboard),
            _ => None,
        }
    }

    /// Get a human-readable description
    pub fn description(&self) -> &str {
        match self {
            MatchPhase::Lobby => "Waiting for players",
            MatchPhase::Submission => "Players submitting claims",
            MatchPhase::Verification => "Validators adjudicating claims",
            MatchPhase::Dispute => "Verdicts open to dispute",
            MatchPhase::Leaderboard => "Match results",
            MatchPhase::GlobalLeaderboard => "All-time standings",
        }
    }
}
