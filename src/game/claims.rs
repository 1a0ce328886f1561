//! Claim lifecycle: `Pending -> Verified | False | Uncertain`.
//!
//! [`ClaimBook`] is the only place claim status changes. Claims are kept in
//! submission order, which is also the order they are adjudicated in.

use std::collections::HashMap;

use tracing::{error, info};

use crate::engine::consensus::types::{ClaimSnapshot, ConsensusOutcome, Verdict, VerdictStatus, Vote};
use crate::engine::scoring::{
    base_claim_score, Points, MAX_DECLARED_CONFIDENCE, MIN_DECLARED_CONFIDENCE,
};

use super::errors::{MatchError, ValidationError};
use super::game_phases::MatchPhase;
use super::players::PlayerRoster;
use super::types::{Claim, ClaimDraft, ClaimId, ClaimStatus, PlayerId};

const LOG_TARGET: &str = "fact_arena::game::claims";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerdictApplication {
    Applied { points: Points },
    /// The identical verdict was already on the claim; nothing changed.
    AlreadyApplied,
}

#[derive(Clone, Debug)]
pub struct ClaimBook {
    claims: Vec<Claim>,
    votes: HashMap<ClaimId, Vec<Vote>>,
    max_chars: usize,
}

pub fn validate_draft(draft: &ClaimDraft, max_chars: usize) -> Result<(), ValidationError> {
    if draft.content.trim().is_empty() {
        return Err(ValidationError::EmptyContent);
    }
    let len = draft.content.chars().count();
    if len > max_chars {
        return Err(ValidationError::ContentTooLong { len, max: max_chars });
    }
    if !(MIN_DECLARED_CONFIDENCE..=MAX_DECLARED_CONFIDENCE).contains(&draft.declared_confidence) {
        return Err(ValidationError::ConfidenceOutOfRange(
            draft.declared_confidence,
        ));
    }
    Ok(())
}

fn claim_points(claim: &Claim, status: VerdictStatus) -> Points {
    match status {
        VerdictStatus::Verified => {
            base_claim_score(claim.claim_type, claim.declared_confidence, claim.has_source)
        }
        VerdictStatus::False | VerdictStatus::Uncertain => 0,
    }
}

impl ClaimBook {
    pub fn new(max_chars: usize) -> Self {
        Self {
            claims: Vec::new(),
            votes: HashMap::new(),
            max_chars,
        }
    }

    /// Records a new Pending claim. Only accepted during Submission.
    pub fn submit(
        &mut self,
        phase: MatchPhase,
        author: &PlayerId,
        draft: ClaimDraft,
    ) -> Result<ClaimId, ValidationError> {
        if phase != MatchPhase::Submission {
            return Err(ValidationError::WrongPhase(phase));
        }
        validate_draft(&draft, self.max_chars)?;

        let source_url = draft
            .source_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());
        let claim = Claim {
            id: ClaimId::new(),
            author_id: author.clone(),
            content: draft.content.trim().to_string(),
            claim_type: draft.claim_type,
            declared_confidence: draft.declared_confidence,
            has_source: source_url.is_some(),
            source_url,
            status: ClaimStatus::Pending,
            verdict: None,
            points_awarded: 0,
        };
        let id = claim.id;
        info!(
            target: LOG_TARGET,
            claim_id = %id,
            author = %author,
            claim_type = claim.claim_type.label(),
            confidence = claim.declared_confidence,
            "claim submitted"
        );
        self.claims.push(claim);
        Ok(id)
    }

    pub fn claims(&self) -> &[Claim] {
        &self.claims
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    pub fn get(&self, id: ClaimId) -> Option<&Claim> {
        self.claims.iter().find(|c| c.id == id)
    }

    pub fn require(&self, id: ClaimId) -> Result<&Claim, ValidationError> {
        self.get(id).ok_or(ValidationError::UnknownClaim(id))
    }

    pub fn pending_count(&self) -> usize {
        self.claims
            .iter()
            .filter(|c| c.status == ClaimStatus::Pending)
            .count()
    }

    /// Earliest-submitted claim still awaiting a verdict.
    pub fn next_pending(&self) -> Option<&Claim> {
        self.claims
            .iter()
            .find(|c| c.status == ClaimStatus::Pending)
    }

    /// 1-based position of `id` in submission order.
    pub fn position(&self, id: ClaimId) -> Option<usize> {
        self.claims.iter().position(|c| c.id == id).map(|i| i + 1)
    }

    pub fn snapshot(&self, id: ClaimId) -> Option<ClaimSnapshot> {
        self.get(id).map(|claim| ClaimSnapshot {
            claim_id: claim.id,
            content: claim.content.clone(),
            has_source: claim.has_source,
        })
    }

    /// Votes behind the claim's current verdict.
    pub fn votes(&self, id: ClaimId) -> &[Vote] {
        self.votes.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Applies the first verdict to a Pending claim and credits the author.
    ///
    /// Re-applying the identical verdict is a no-op. A different verdict on
    /// an already adjudicated claim is an invariant violation; disputes go
    /// through [`ClaimBook::correct_verdict`] instead.
    pub fn apply_verdict(
        &mut self,
        id: ClaimId,
        outcome: ConsensusOutcome,
        players: &mut PlayerRoster,
    ) -> Result<VerdictApplication, MatchError> {
        let claim = self
            .claims
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(ValidationError::UnknownClaim(id))?;

        if let Some(existing) = &claim.verdict {
            if existing == &outcome.verdict {
                return Ok(VerdictApplication::AlreadyApplied);
            }
            error!(
                target: LOG_TARGET,
                claim_id = %id,
                existing = %existing.status,
                incoming = %outcome.verdict.status,
                "refusing to overwrite an applied verdict"
            );
            return Err(MatchError::invariant(format!(
                "claim {id} already carries a {} verdict",
                existing.status
            )));
        }

        let points = claim_points(claim, outcome.verdict.status);
        if points > 0 {
            players.apply_delta(&claim.author_id, points)?;
        }
        claim.status = outcome.verdict.status.into();
        claim.verdict = Some(outcome.verdict);
        claim.points_awarded = points;
        self.votes.insert(id, outcome.votes);

        info!(
            target: LOG_TARGET,
            claim_id = %id,
            status = ?claim.status,
            points,
            "verdict applied"
        );
        Ok(VerdictApplication::Applied { points })
    }

    /// Replaces an adjudicated claim's verdict with the expanded one.
    ///
    /// `points_awarded` is re-priced for the new verdict, but the author's
    /// score is left alone: the original award is neither revoked nor topped up.
    pub fn correct_verdict(
        &mut self,
        id: ClaimId,
        outcome: ConsensusOutcome,
    ) -> Result<(), MatchError> {
        let claim = self
            .claims
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(ValidationError::UnknownClaim(id))?;
        if claim.status == ClaimStatus::Pending {
            return Err(ValidationError::ClaimPending(id).into());
        }

        let points = claim_points(claim, outcome.verdict.status);
        info!(
            target: LOG_TARGET,
            claim_id = %id,
            from = ?claim.status,
            to = %outcome.verdict.status,
            "verdict corrected after dispute"
        );
        claim.status = outcome.verdict.status.into();
        claim.verdict = Some(outcome.verdict);
        claim.points_awarded = points;
        self.votes.insert(id, outcome.votes);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.claims.clear();
        self.votes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::scoring::ClaimType;
    use crate::game::types::Player;

    fn roster_with(id: &str) -> PlayerRoster {
        let mut roster = PlayerRoster::new();
        roster.insert(Player {
            id: PlayerId::from(id),
            username: id.into(),
            avatar: "😎".into(),
            is_bot: false,
            is_host: true,
            score: 0,
            is_ready: true,
        });
        roster
    }

    fn outcome(status: VerdictStatus, confidence: u8) -> ConsensusOutcome {
        ConsensusOutcome {
            verdict: Verdict {
                status,
                confidence,
                reasoning: "because".into(),
                sources: vec!["wikipedia.org".into()],
            },
            votes: Vec::new(),
        }
    }

    #[test]
    fn submission_is_only_open_during_the_submission_phase() {
        let mut book = ClaimBook::new(200);
        let err = book
            .submit(MatchPhase::Lobby, &"p1".into(), ClaimDraft::new("x", 70))
            .unwrap_err();
        assert_eq!(err, ValidationError::WrongPhase(MatchPhase::Lobby));
        assert!(book.is_empty());
    }

    #[test]
    fn malformed_drafts_are_rejected() {
        let mut book = ClaimBook::new(10);
        let author = PlayerId::from("p1");
        let phase = MatchPhase::Submission;
        assert_eq!(
            book.submit(phase, &author, ClaimDraft::new("   ", 70)),
            Err(ValidationError::EmptyContent)
        );
        assert_eq!(
            book.submit(phase, &author, ClaimDraft::new("x", 49)),
            Err(ValidationError::ConfidenceOutOfRange(49))
        );
        assert_eq!(
            book.submit(phase, &author, ClaimDraft::new("x", 101)),
            Err(ValidationError::ConfidenceOutOfRange(101))
        );
        assert_eq!(
            book.submit(phase, &author, ClaimDraft::new("0123456789a", 70)),
            Err(ValidationError::ContentTooLong { len: 11, max: 10 })
        );
        assert!(book.is_empty());
    }

    #[test]
    fn pending_claims_come_out_in_submission_order() {
        let mut book = ClaimBook::new(200);
        let author = PlayerId::from("p1");
        let ids: Vec<_> = ["first", "second", "third"]
            .into_iter()
            .map(|text| {
                book.submit(MatchPhase::Submission, &author, ClaimDraft::new(text, 70))
                    .unwrap()
            })
            .collect();
        assert_eq!(book.next_pending().unwrap().id, ids[0]);
        assert_eq!(book.position(ids[2]), Some(3));

        let mut players = roster_with("p1");
        book.apply_verdict(ids[0], outcome(VerdictStatus::False, 100), &mut players)
            .unwrap();
        assert_eq!(book.next_pending().unwrap().id, ids[1]);
        assert_eq!(book.pending_count(), 2);
    }

    #[test]
    fn verified_claim_credits_author_once() {
        let mut book = ClaimBook::new(200);
        let author = PlayerId::from("p1");
        let id = book
            .submit(
                MatchPhase::Submission,
                &author,
                ClaimDraft::new("Neil Armstrong was the first man on the moon.", 100)
                    .with_source("https://nasa.gov")
                    .with_type(ClaimType::Predictive),
            )
            .unwrap();
        let mut players = roster_with("p1");

        let first = book
            .apply_verdict(id, outcome(VerdictStatus::Verified, 67), &mut players)
            .unwrap();
        assert_eq!(first, VerdictApplication::Applied { points: 50 });

        let second = book
            .apply_verdict(id, outcome(VerdictStatus::Verified, 67), &mut players)
            .unwrap();
        assert_eq!(second, VerdictApplication::AlreadyApplied);

        let claim = book.get(id).unwrap();
        assert_eq!(claim.status, ClaimStatus::Verified);
        assert_eq!(claim.points_awarded, 50);
        assert!(claim.has_source);
        assert_eq!(players.get(&author).unwrap().score, 50);
    }

    #[test]
    fn conflicting_verdict_is_an_invariant_violation() {
        let mut book = ClaimBook::new(200);
        let author = PlayerId::from("p1");
        let id = book
            .submit(MatchPhase::Submission, &author, ClaimDraft::new("claim", 80))
            .unwrap();
        let mut players = roster_with("p1");
        book.apply_verdict(id, outcome(VerdictStatus::Verified, 100), &mut players)
            .unwrap();

        let err = book
            .apply_verdict(id, outcome(VerdictStatus::False, 100), &mut players)
            .unwrap_err();
        assert!(matches!(err, MatchError::InvariantViolation(_)));
        assert_eq!(book.get(id).unwrap().status, ClaimStatus::Verified);
        assert_eq!(players.get(&author).unwrap().score, 11);
    }

    #[test]
    fn false_and_uncertain_award_nothing() {
        let mut book = ClaimBook::new(200);
        let author = PlayerId::from("p1");
        let mut players = roster_with("p1");
        for status in [VerdictStatus::False, VerdictStatus::Uncertain] {
            let id = book
                .submit(MatchPhase::Submission, &author, ClaimDraft::new("claim", 100))
                .unwrap();
            let applied = book.apply_verdict(id, outcome(status, 67), &mut players).unwrap();
            assert_eq!(applied, VerdictApplication::Applied { points: 0 });
            assert!(book.get(id).unwrap().verdict.is_some());
        }
        assert_eq!(players.get(&author).unwrap().score, 0);
    }

    #[test]
    fn correction_reprices_claim_without_touching_author() {
        let mut book = ClaimBook::new(200);
        let author = PlayerId::from("p1");
        let id = book
            .submit(MatchPhase::Submission, &author, ClaimDraft::new("claim", 100))
            .unwrap();
        let mut players = roster_with("p1");
        book.apply_verdict(id, outcome(VerdictStatus::False, 67), &mut players)
            .unwrap();

        book.correct_verdict(id, outcome(VerdictStatus::Verified, 60))
            .unwrap();
        let claim = book.get(id).unwrap();
        assert_eq!(claim.status, ClaimStatus::Verified);
        assert_eq!(claim.points_awarded, 15);
        assert_eq!(players.get(&author).unwrap().score, 0);
    }
}
