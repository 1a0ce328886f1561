use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::time::{timeout, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{PacingConfig, RoundPolicy};

use super::errors::{ConsensusError, VoteSourceError};
use super::events::{ConsensusEventKind, EventSink};
use super::roster::ValidatorRoster;
use super::source::{reasoning_for, reference_sources, VoteSource};
use super::tally::tally;
use super::types::{ClaimSnapshot, ConsensusOutcome, Validator, VerdictStatus, Vote};

const LOG_TARGET: &str = "fact_arena::engine::consensus::simulator";

/// Runs "Optimistic Democracy" rounds: a three-validator quorum per claim and
/// a two-validator expansion when a verdict is disputed.
///
/// Validators vote strictly one after another; each vote is emitted before the
/// next validator starts. Every simulated delay is a cancellation point.
pub struct ConsensusSimulator {
    roster: ValidatorRoster,
    source: Arc<dyn VoteSource>,
    pacing: PacingConfig,
    policy: RoundPolicy,
}

impl ConsensusSimulator {
    pub fn new(
        roster: ValidatorRoster,
        source: Arc<dyn VoteSource>,
        pacing: PacingConfig,
        policy: RoundPolicy,
    ) -> Self {
        Self {
            roster,
            source,
            pacing,
            policy,
        }
    }

    pub fn roster(&self) -> &ValidatorRoster {
        &self.roster
    }

    pub async fn run_consensus(
        &self,
        claim: &ClaimSnapshot,
        sink: &EventSink,
        cancel: &CancellationToken,
    ) -> Result<ConsensusOutcome, ConsensusError> {
        let quorum = self.roster.initial_quorum();
        let deadline = Instant::now() + self.policy.round_deadline;

        sink.emit(
            claim.claim_id,
            "Initializing FactChecker contract...",
            ConsensusEventKind::Init {
                validators: quorum.to_vec(),
            },
        )
        .await;
        pause(self.pacing.init, cancel).await?;

        let mut votes = Vec::with_capacity(quorum.len());
        for validator in quorum {
            sink.emit(
                claim.claim_id,
                format!("{} is analyzing...", validator.name),
                ConsensusEventKind::ValidatorStart {
                    validator_id: validator.id.clone(),
                },
            )
            .await;
            pause(self.validator_delay(), cancel).await?;

            let vote = self.collect_vote(validator, claim, false, deadline, cancel).await?;
            sink.emit(
                claim.claim_id,
                format!("{} voted {}", validator.name, vote.status),
                ConsensusEventKind::VoteCast {
                    validator_id: validator.id.clone(),
                    vote: vote.clone(),
                },
            )
            .await;
            votes.push(vote);
        }

        pause(self.pacing.settle, cancel).await?;
        let verdict = tally(&votes);
        info!(
            target: LOG_TARGET,
            claim_id = %claim.claim_id,
            status = %verdict.status,
            confidence = verdict.confidence,
            "consensus reached"
        );

        sink.emit(
            claim.claim_id,
            format!(
                "Consensus Reached: {} ({}% Agreement)",
                verdict.status, verdict.confidence
            ),
            ConsensusEventKind::ConsensusReached {
                verdict: verdict.clone(),
                breakdown: votes.clone(),
            },
        )
        .await;

        Ok(ConsensusOutcome { verdict, votes })
    }

    /// Adds the validators held back from the initial quorum and re-tallies
    /// over the prior votes plus theirs. Drawn Uncertain outcomes are read as
    /// Verified on this path; degraded votes stay Uncertain.
    pub async fn expand_consensus(
        &self,
        claim: &ClaimSnapshot,
        prior_votes: &[Vote],
        sink: &EventSink,
        cancel: &CancellationToken,
    ) -> Result<ConsensusOutcome, ConsensusError> {
        let expansion = self.roster.expansion();
        let deadline = Instant::now() + self.policy.round_deadline;
        let total = prior_votes.len() + expansion.len();

        sink.emit(
            claim.claim_id,
            format!("Dispute Triggered: Expanding Consensus to {total} Validators..."),
            ConsensusEventKind::Expand {
                validators: expansion.to_vec(),
            },
        )
        .await;
        pause(self.pacing.expand_announce, cancel).await?;

        let mut votes = prior_votes.to_vec();
        for validator in expansion {
            sink.emit(
                claim.claim_id,
                format!("{} (Appeals Court) analyzing...", validator.name),
                ConsensusEventKind::ValidatorStart {
                    validator_id: validator.id.clone(),
                },
            )
            .await;
            pause(self.pacing.expansion_validator, cancel).await?;

            let vote = self.collect_vote(validator, claim, true, deadline, cancel).await?;
            sink.emit(
                claim.claim_id,
                format!("{} cast tie-breaking vote.", validator.name),
                ConsensusEventKind::VoteCast {
                    validator_id: validator.id.clone(),
                    vote: vote.clone(),
                },
            )
            .await;
            votes.push(vote);
        }

        let verdict = tally(&votes);
        info!(
            target: LOG_TARGET,
            claim_id = %claim.claim_id,
            status = %verdict.status,
            confidence = verdict.confidence,
            validators = votes.len(),
            "final judgment reached"
        );

        sink.emit(
            claim.claim_id,
            format!("Final Judgment: {}", verdict.status),
            ConsensusEventKind::FinalJudgment {
                verdict: verdict.clone(),
                breakdown: votes.clone(),
            },
        )
        .await;

        Ok(ConsensusOutcome { verdict, votes })
    }

    async fn collect_vote(
        &self,
        validator: &Validator,
        claim: &ClaimSnapshot,
        escalated: bool,
        deadline: Instant,
        cancel: &CancellationToken,
    ) -> Result<Vote, ConsensusError> {
        let mut attempts = 0;
        let mut last_error = None;

        while attempts < self.policy.max_attempts {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            attempts += 1;

            let limit = self.policy.vote_timeout.min(remaining);
            let draw = tokio::select! {
                _ = cancel.cancelled() => return Err(ConsensusError::Cancelled),
                draw = timeout(limit, self.source.draw(validator, claim, escalated)) => draw,
            };

            match draw {
                Ok(Ok(status)) => {
                    let status = if escalated && status == VerdictStatus::Uncertain {
                        VerdictStatus::Verified
                    } else {
                        status
                    };
                    debug!(
                        target: LOG_TARGET,
                        claim_id = %claim.claim_id,
                        validator = %validator.id,
                        %status,
                        escalated,
                        "vote drawn"
                    );
                    return Ok(Vote {
                        validator_id: validator.id.clone(),
                        status,
                        reasoning: reasoning_for(status, &claim.content),
                        sources: reference_sources(),
                        degraded: false,
                    });
                }
                Ok(Err(err)) => last_error = Some(err),
                Err(_) => {
                    last_error = Some(VoteSourceError::TimeoutExhausted {
                        validator: validator.id.clone(),
                        attempts,
                    })
                }
            }
        }

        let error = last_error.unwrap_or(VoteSourceError::TimeoutExhausted {
            validator: validator.id.clone(),
            attempts,
        });
        warn!(
            target: LOG_TARGET,
            claim_id = %claim.claim_id,
            validator = %validator.id,
            %error,
            "validator degraded to an uncertain vote"
        );
        Ok(Vote {
            validator_id: validator.id.clone(),
            status: VerdictStatus::Uncertain,
            reasoning: format!("{} did not respond: {error}", validator.name),
            sources: Vec::new(),
            degraded: true,
        })
    }

    fn validator_delay(&self) -> Duration {
        let min = self.pacing.validator_min;
        let max = self.pacing.validator_max;
        if max <= min {
            return min;
        }
        let spread = (max - min).as_millis() as u64;
        min + Duration::from_millis(rand::thread_rng().gen_range(0..=spread))
    }
}

async fn pause(duration: Duration, cancel: &CancellationToken) -> Result<(), ConsensusError> {
    if cancel.is_cancelled() {
        return Err(ConsensusError::Cancelled);
    }
    if duration.is_zero() {
        return Ok(());
    }
    tokio::select! {
        _ = cancel.cancelled() => Err(ConsensusError::Cancelled),
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}
