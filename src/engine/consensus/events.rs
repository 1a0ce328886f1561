use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::trace;

use super::types::{ClaimId, Validator, ValidatorId, Verdict, Vote};

const LOG_TARGET: &str = "fact_arena::engine::consensus::events";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum ConsensusEventKind {
    Init {
        validators: Vec<Validator>,
    },
    ValidatorStart {
        validator_id: ValidatorId,
    },
    VoteCast {
        validator_id: ValidatorId,
        vote: Vote,
    },
    ConsensusReached {
        verdict: Verdict,
        breakdown: Vec<Vote>,
    },
    Expand {
        validators: Vec<Validator>,
    },
    FinalJudgment {
        verdict: Verdict,
        breakdown: Vec<Vote>,
    },
    Progress {
        index: usize,
        total: usize,
    },
}

impl ConsensusEventKind {
    pub fn tag(&self) -> &'static str {
        match self {
            ConsensusEventKind::Init { .. } => "INIT",
            ConsensusEventKind::ValidatorStart { .. } => "VALIDATOR_START",
            ConsensusEventKind::VoteCast { .. } => "VOTE_CAST",
            ConsensusEventKind::ConsensusReached { .. } => "CONSENSUS_REACHED",
            ConsensusEventKind::Expand { .. } => "EXPAND",
            ConsensusEventKind::FinalJudgment { .. } => "FINAL_JUDGMENT",
            ConsensusEventKind::Progress { .. } => "PROGRESS",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsensusEvent {
    pub claim_id: ClaimId,
    pub message: String,
    #[serde(flatten)]
    pub kind: ConsensusEventKind,
}

/// Ordered outlet for the events of consensus rounds.
///
/// Backed by a bounded channel: a slow reader applies backpressure to the
/// round rather than losing events. A dropped reader is not an error; the
/// round keeps going and its events are discarded.
#[derive(Clone, Debug)]
pub struct EventSink {
    tx: Option<mpsc::Sender<ConsensusEvent>>,
}

impl EventSink {
    pub fn new(tx: mpsc::Sender<ConsensusEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    /// Creates a sink together with the receiving end of its channel.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ConsensusEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx), rx)
    }

    pub fn discard() -> Self {
        Self { tx: None }
    }

    pub async fn emit(&self, claim_id: ClaimId, message: impl Into<String>, kind: ConsensusEventKind) {
        let Some(tx) = &self.tx else {
            return;
        };
        let event = ConsensusEvent {
            claim_id,
            message: message.into(),
            kind,
        };
        if tx.send(event).await.is_err() {
            trace!(target: LOG_TARGET, %claim_id, "event reader gone; dropping consensus event");
        }
    }
}
