use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ValidatorId = String;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimId(pub Uuid);

impl ClaimId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClaimId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClaimId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Outcome of a single vote or a tallied round.
///
/// Declaration order is the tally tie-break order: on equal counts the
/// earlier variant wins (Verified, then False, then Uncertain).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerdictStatus {
    Verified,
    False,
    Uncertain,
}

impl VerdictStatus {
    pub const TALLY_ORDER: [VerdictStatus; 3] = [
        VerdictStatus::Verified,
        VerdictStatus::False,
        VerdictStatus::Uncertain,
    ];

    pub(crate) fn tally_index(&self) -> usize {
        match self {
            VerdictStatus::Verified => 0,
            VerdictStatus::False => 1,
            VerdictStatus::Uncertain => 2,
        }
    }
}

impl fmt::Display for VerdictStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            VerdictStatus::Verified => "VERIFIED",
            VerdictStatus::False => "FALSE",
            VerdictStatus::Uncertain => "UNCERTAIN",
        };
        f.write_str(label)
    }
}

/// A simulated voting participant. The bias label is cosmetic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    pub id: ValidatorId,
    pub name: String,
    pub bias: String,
}

impl Validator {
    pub fn new(id: impl Into<String>, name: impl Into<String>, bias: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            bias: bias.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub validator_id: ValidatorId,
    pub status: VerdictStatus,
    pub reasoning: String,
    pub sources: Vec<String>,
    /// Set when the validator failed to answer and the vote was recorded as Uncertain.
    #[serde(default)]
    pub degraded: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub status: VerdictStatus,
    /// Share of votes agreeing with `status`, as a rounded percentage.
    pub confidence: u8,
    pub reasoning: String,
    pub sources: Vec<String>,
}

/// Immutable view of a claim handed to the consensus engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClaimSnapshot {
    pub claim_id: ClaimId,
    pub content: String,
    pub has_source: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsensusOutcome {
    pub verdict: Verdict,
    /// Every vote the verdict was tallied over, in casting order.
    pub votes: Vec<Vote>,
}
