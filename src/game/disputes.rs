//! Dispute records and their settlement.
//!
//! Filing a dispute debits the stake immediately. Disputes are settled one
//! at a time in filing order by re-running the claim through the expanded
//! quorum; [`DisputeDesk::resolve`] applies the result.

use tracing::{info, warn};

use crate::engine::consensus::types::{ConsensusOutcome, VerdictStatus};
use crate::engine::scoring::{dispute_payout, Points};

use super::claims::ClaimBook;
use super::errors::{MatchError, ValidationError};
use super::game_phases::MatchPhase;
use super::players::PlayerRoster;
use super::types::{ClaimId, ClaimStatus, Dispute, DisputeId, DisputeResolution, DisputeStatus, PlayerId};

const LOG_TARGET: &str = "fact_arena::game::disputes";

/// What a settled dispute did to the disputer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Settlement {
    pub resolution: DisputeResolution,
    /// Amount credited back to the disputer (0 unless upheld).
    pub payout: Points,
    pub disputer_score: Points,
}

#[derive(Clone, Debug)]
pub struct DisputeDesk {
    disputes: Vec<Dispute>,
    stake: Points,
    payout_bps: u32,
}

impl DisputeDesk {
    pub fn new(stake: Points, payout_bps: u32) -> Self {
        Self {
            disputes: Vec::new(),
            stake,
            payout_bps,
        }
    }

    pub fn stake(&self) -> Points {
        self.stake
    }

    pub fn disputes(&self) -> &[Dispute] {
        &self.disputes
    }

    pub fn get(&self, id: DisputeId) -> Option<&Dispute> {
        self.disputes.iter().find(|d| d.id == id)
    }

    /// Earliest dispute still awaiting settlement.
    pub fn next_open(&self) -> Option<&Dispute> {
        self.disputes.iter().find(|d| d.status == DisputeStatus::Open)
    }

    pub fn open_count(&self) -> usize {
        self.disputes
            .iter()
            .filter(|d| d.status == DisputeStatus::Open)
            .count()
    }

    fn claim_already_disputed(&self, claim_id: ClaimId) -> bool {
        self.disputes.iter().any(|d| {
            d.claim_id == claim_id && d.resolution != Some(DisputeResolution::Superseded)
        })
    }

    /// Challenges an adjudicated claim.
    ///
    /// The first dispute on a claim takes the stake and is queued for
    /// settlement. Later disputes on the same claim are recorded as
    /// superseded straight away and cost nothing.
    pub fn file(
        &mut self,
        phase: MatchPhase,
        claims: &ClaimBook,
        players: &mut PlayerRoster,
        disputer: &PlayerId,
        claim_id: ClaimId,
        reasoning: &str,
    ) -> Result<Dispute, ValidationError> {
        if phase != MatchPhase::Dispute {
            return Err(ValidationError::WrongPhase(phase));
        }
        players.require(disputer)?;
        let claim = claims.require(claim_id)?;
        if claim.status == ClaimStatus::Pending {
            return Err(ValidationError::ClaimPending(claim_id));
        }
        let reasoning = reasoning.trim();
        if reasoning.is_empty() {
            return Err(ValidationError::EmptyReasoning);
        }

        let superseded = self.claim_already_disputed(claim_id);
        let dispute = if superseded {
            Dispute {
                id: DisputeId::new(),
                claim_id,
                disputer_id: disputer.clone(),
                reasoning: reasoning.to_string(),
                stake: 0,
                status: DisputeStatus::Resolved,
                resolution: Some(DisputeResolution::Superseded),
            }
        } else {
            players.apply_delta(disputer, -self.stake)?;
            Dispute {
                id: DisputeId::new(),
                claim_id,
                disputer_id: disputer.clone(),
                reasoning: reasoning.to_string(),
                stake: self.stake,
                status: DisputeStatus::Open,
                resolution: None,
            }
        };

        info!(
            target: LOG_TARGET,
            dispute_id = %dispute.id,
            claim_id = %claim_id,
            disputer = %disputer,
            stake = dispute.stake,
            superseded,
            "dispute filed"
        );
        self.disputes.push(dispute.clone());
        Ok(dispute)
    }

    /// Settles an open dispute with the expanded-quorum outcome.
    ///
    /// The claim is corrected to the expanded verdict either way; only the
    /// disputer's score depends on whether it came back Verified.
    pub fn resolve(
        &mut self,
        id: DisputeId,
        outcome: ConsensusOutcome,
        claims: &mut ClaimBook,
        players: &mut PlayerRoster,
    ) -> Result<Settlement, MatchError> {
        let index = self
            .disputes
            .iter()
            .position(|d| d.id == id)
            .ok_or_else(|| MatchError::invariant(format!("dispute {id} does not exist")))?;
        let dispute = &self.disputes[index];
        if dispute.status != DisputeStatus::Open {
            return Err(MatchError::invariant(format!(
                "dispute {id} was already resolved as {:?}",
                dispute.resolution
            )));
        }
        let disputer = dispute.disputer_id.clone();
        let claim_id = dispute.claim_id;
        players.require(&disputer)?;

        let upheld = outcome.verdict.status == VerdictStatus::Verified;
        claims.correct_verdict(claim_id, outcome)?;

        let (resolution, payout) = if upheld {
            (
                DisputeResolution::Upheld,
                dispute_payout(dispute.stake, self.payout_bps),
            )
        } else {
            (DisputeResolution::Rejected, 0)
        };
        let disputer_score = if payout > 0 {
            players.apply_delta(&disputer, payout)?
        } else {
            players.require(&disputer)?.score
        };

        let dispute = &mut self.disputes[index];
        dispute.status = DisputeStatus::Resolved;
        dispute.resolution = Some(resolution);
        info!(
            target: LOG_TARGET,
            dispute_id = %id,
            claim_id = %claim_id,
            ?resolution,
            payout,
            disputer_score,
            "dispute resolved"
        );
        Ok(Settlement {
            resolution,
            payout,
            disputer_score,
        })
    }

    /// Closes every dispute still open. Stakes stay forfeited and claims
    /// keep their current verdicts.
    pub fn lapse_open(&mut self) -> Vec<DisputeId> {
        let mut lapsed = Vec::new();
        for dispute in self
            .disputes
            .iter_mut()
            .filter(|d| d.status == DisputeStatus::Open)
        {
            dispute.status = DisputeStatus::Resolved;
            dispute.resolution = Some(DisputeResolution::Lapsed);
            lapsed.push(dispute.id);
        }
        if !lapsed.is_empty() {
            warn!(
                target: LOG_TARGET,
                count = lapsed.len(),
                "dispute phase ended with unresolved disputes"
            );
        }
        lapsed
    }

    pub fn clear(&mut self) {
        self.disputes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::consensus::types::Verdict;
    use crate::game::types::{ClaimDraft, Player};

    struct Fixture {
        claims: ClaimBook,
        players: PlayerRoster,
        desk: DisputeDesk,
        claim_id: ClaimId,
        disputer: PlayerId,
    }

    fn outcome(status: VerdictStatus) -> ConsensusOutcome {
        ConsensusOutcome {
            verdict: Verdict {
                status,
                confidence: 60,
                reasoning: "expanded".into(),
                sources: Vec::new(),
            },
            votes: Vec::new(),
        }
    }

    fn player(id: &str) -> Player {
        Player {
            id: PlayerId::from(id),
            username: id.into(),
            avatar: "👾".into(),
            is_bot: false,
            is_host: false,
            score: 0,
            is_ready: true,
        }
    }

    /// Author "a" has one claim adjudicated as `status`; disputer "d" holds 100 points.
    fn fixture(status: VerdictStatus) -> Fixture {
        let mut players = PlayerRoster::new();
        players.insert(player("a"));
        players.insert(player("d"));
        let disputer = PlayerId::from("d");
        players.apply_delta(&disputer, 100).unwrap();

        let mut claims = ClaimBook::new(200);
        let claim_id = claims
            .submit(
                MatchPhase::Submission,
                &"a".into(),
                ClaimDraft::new("The Titanic sank in 1912.", 100),
            )
            .unwrap();
        claims
            .apply_verdict(
                claim_id,
                ConsensusOutcome {
                    verdict: Verdict {
                        status,
                        confidence: 67,
                        reasoning: "initial".into(),
                        sources: Vec::new(),
                    },
                    votes: Vec::new(),
                },
                &mut players,
            )
            .unwrap();

        Fixture {
            claims,
            players,
            desk: DisputeDesk::new(50, 15_000),
            claim_id,
            disputer,
        }
    }

    fn file(f: &mut Fixture) -> Result<Dispute, ValidationError> {
        f.desk.file(
            MatchPhase::Dispute,
            &f.claims,
            &mut f.players,
            &f.disputer,
            f.claim_id,
            "That is wrong",
        )
    }

    #[test]
    fn upheld_dispute_nets_half_the_stake() {
        let mut f = fixture(VerdictStatus::False);
        let dispute = file(&mut f).unwrap();
        assert_eq!(f.players.get(&f.disputer).unwrap().score, 50);

        let settlement = f
            .desk
            .resolve(dispute.id, outcome(VerdictStatus::Verified), &mut f.claims, &mut f.players)
            .unwrap();
        assert_eq!(settlement.resolution, DisputeResolution::Upheld);
        assert_eq!(settlement.payout, 75);
        assert_eq!(settlement.disputer_score, 125);
        assert_eq!(f.players.get(&f.disputer).unwrap().score, 125);
    }

    #[test]
    fn rejected_dispute_loses_the_stake() {
        let mut f = fixture(VerdictStatus::Verified);
        let dispute = file(&mut f).unwrap();
        let settlement = f
            .desk
            .resolve(dispute.id, outcome(VerdictStatus::False), &mut f.claims, &mut f.players)
            .unwrap();
        assert_eq!(settlement.resolution, DisputeResolution::Rejected);
        assert_eq!(f.players.get(&f.disputer).unwrap().score, 50);

        let resolved = f.desk.get(dispute.id).unwrap();
        assert_eq!(resolved.status, DisputeStatus::Resolved);
        assert_eq!(f.claims.get(f.claim_id).unwrap().status, ClaimStatus::False);
        assert_eq!(f.claims.get(f.claim_id).unwrap().points_awarded, 0);
    }

    #[test]
    fn author_score_is_not_revisited() {
        let mut f = fixture(VerdictStatus::Verified);
        let author = PlayerId::from("a");
        assert_eq!(f.players.get(&author).unwrap().score, 15);

        let dispute = file(&mut f).unwrap();
        f.desk
            .resolve(dispute.id, outcome(VerdictStatus::False), &mut f.claims, &mut f.players)
            .unwrap();
        assert_eq!(f.players.get(&author).unwrap().score, 15);
    }

    #[test]
    fn preconditions_reject_without_touching_scores() {
        let mut f = fixture(VerdictStatus::False);

        let wrong_phase = f.desk.file(
            MatchPhase::Verification,
            &f.claims,
            &mut f.players,
            &f.disputer,
            f.claim_id,
            "nope",
        );
        assert_eq!(wrong_phase, Err(ValidationError::WrongPhase(MatchPhase::Verification)));

        let empty = f.desk.file(
            MatchPhase::Dispute,
            &f.claims,
            &mut f.players,
            &f.disputer,
            f.claim_id,
            "   ",
        );
        assert_eq!(empty, Err(ValidationError::EmptyReasoning));

        let unknown = ClaimId::new();
        let missing = f.desk.file(
            MatchPhase::Dispute,
            &f.claims,
            &mut f.players,
            &f.disputer,
            unknown,
            "nope",
        );
        assert_eq!(missing, Err(ValidationError::UnknownClaim(unknown)));

        assert!(f.desk.disputes().is_empty());
        assert_eq!(f.players.get(&f.disputer).unwrap().score, 100);
    }

    #[test]
    fn pending_claims_cannot_be_disputed() {
        let mut f = fixture(VerdictStatus::False);
        let pending = f
            .claims
            .submit(MatchPhase::Submission, &"a".into(), ClaimDraft::new("later", 60))
            .unwrap();
        let result = f.desk.file(
            MatchPhase::Dispute,
            &f.claims,
            &mut f.players,
            &f.disputer,
            pending,
            "too early",
        );
        assert_eq!(result, Err(ValidationError::ClaimPending(pending)));
    }

    #[test]
    fn second_dispute_on_a_claim_is_superseded_for_free() {
        let mut f = fixture(VerdictStatus::False);
        file(&mut f).unwrap();
        let second = file(&mut f).unwrap();

        assert_eq!(second.stake, 0);
        assert_eq!(second.status, DisputeStatus::Resolved);
        assert_eq!(second.resolution, Some(DisputeResolution::Superseded));
        assert_eq!(f.desk.open_count(), 1);
        assert_eq!(f.players.get(&f.disputer).unwrap().score, 50);
    }

    #[test]
    fn resolving_twice_is_an_invariant_violation() {
        let mut f = fixture(VerdictStatus::False);
        let dispute = file(&mut f).unwrap();
        f.desk
            .resolve(dispute.id, outcome(VerdictStatus::Verified), &mut f.claims, &mut f.players)
            .unwrap();
        let again = f
            .desk
            .resolve(dispute.id, outcome(VerdictStatus::Verified), &mut f.claims, &mut f.players);
        assert!(matches!(again, Err(MatchError::InvariantViolation(_))));
        assert_eq!(f.players.get(&f.disputer).unwrap().score, 125);
    }

    #[test]
    fn lapsed_disputes_keep_the_stake() {
        let mut f = fixture(VerdictStatus::False);
        let dispute = file(&mut f).unwrap();
        assert_eq!(f.desk.lapse_open(), vec![dispute.id]);
        assert_eq!(
            f.desk.get(dispute.id).unwrap().resolution,
            Some(DisputeResolution::Lapsed)
        );
        assert!(f.desk.next_open().is_none());
        assert_eq!(f.players.get(&f.disputer).unwrap().score, 50);
        assert_eq!(f.claims.get(f.claim_id).unwrap().status, ClaimStatus::False);
    }
}
