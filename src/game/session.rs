//! The match-session object.
//!
//! A [`MatchSession`] owns every piece of match-scoped state (players,
//! claims, disputes, settings, phase) and is the only way to change it.
//! It is synchronous; the coordinator drives it from a single task and the
//! async helpers at the bottom run consensus rounds against it directly.
//!
//! Every phase change bumps the session epoch. Work started in one epoch
//! (a verification round, a dispute expansion) is only applied if the epoch
//! is still current when it finishes.

use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::MatchConfig;
use crate::engine::consensus::{
    ClaimSnapshot, ConsensusEvent, ConsensusEventKind, ConsensusOutcome, ConsensusSimulator,
    EventSink, Vote,
};
use crate::leaderboard::GlobalLeaderboard;

use super::bots::BOT_PROFILES;
use super::claims::{ClaimBook, VerdictApplication};
use super::disputes::{DisputeDesk, Settlement};
use super::errors::{MatchError, ValidationError};
use super::game_phases::{MatchPhase, PhaseTrigger};
use super::players::PlayerRoster;
use super::types::{
    Claim, ClaimDraft, ClaimId, ClaimStatus, Dispute, DisputeId, DisputeResolution, Player,
    PlayerId, PlayerProfile, RoomCode, RoomSettings,
};

const LOG_TARGET: &str = "fact_arena::game::session";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseChange {
    pub from: MatchPhase,
    pub to: MatchPhase,
    pub trigger: PhaseTrigger,
    pub epoch: u64,
}

/// Results screen for one finished match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSummary {
    /// Players by match score, highest first.
    pub standings: Vec<Player>,
    pub claims_submitted: usize,
    pub claims_verified: usize,
    pub disputes_upheld: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSnapshot {
    pub room_code: RoomCode,
    pub phase: MatchPhase,
    pub epoch: u64,
    pub settings: RoomSettings,
    pub players: Vec<Player>,
    pub claims: Vec<Claim>,
    pub disputes: Vec<Dispute>,
    pub summary: Option<MatchSummary>,
}

/// A claim ready for its consensus round.
#[derive(Clone, Debug)]
pub struct VerificationJob {
    pub epoch: u64,
    pub claim: ClaimSnapshot,
    /// 1-based position in submission order.
    pub index: usize,
    pub total: usize,
}

impl VerificationJob {
    /// The PROGRESS event announcing this round.
    pub fn progress(&self) -> ConsensusEvent {
        ConsensusEvent {
            claim_id: self.claim.claim_id,
            message: format!("Verifying claim {} of {}", self.index, self.total),
            kind: ConsensusEventKind::Progress {
                index: self.index,
                total: self.total,
            },
        }
    }
}

/// An open dispute ready for its expansion round.
#[derive(Clone, Debug)]
pub struct DisputeJob {
    pub epoch: u64,
    pub dispute_id: DisputeId,
    pub claim: ClaimSnapshot,
    pub prior_votes: Vec<Vote>,
}

pub struct MatchSession {
    room_code: RoomCode,
    config: MatchConfig,
    settings: RoomSettings,
    phase: MatchPhase,
    epoch: u64,
    players: PlayerRoster,
    claims: ClaimBook,
    disputes: DisputeDesk,
    leaderboard: Arc<GlobalLeaderboard>,
    summary: Option<MatchSummary>,
}

impl MatchSession {
    pub fn new(room_code: RoomCode, config: MatchConfig, leaderboard: Arc<GlobalLeaderboard>) -> Self {
        Self {
            room_code,
            settings: RoomSettings::default(),
            phase: MatchPhase::Lobby,
            epoch: 0,
            players: PlayerRoster::new(),
            claims: ClaimBook::new(config.max_claim_chars),
            disputes: DisputeDesk::new(config.dispute_stake, config.dispute_payout_bps),
            leaderboard,
            summary: None,
            config,
        }
    }

    pub fn room_code(&self) -> &RoomCode {
        &self.room_code
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn settings(&self) -> &RoomSettings {
        &self.settings
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_current(&self, epoch: u64) -> bool {
        self.epoch == epoch
    }

    pub fn players(&self) -> &PlayerRoster {
        &self.players
    }

    pub fn claims(&self) -> &ClaimBook {
        &self.claims
    }

    pub fn disputes(&self) -> &DisputeDesk {
        &self.disputes
    }

    pub fn summary(&self) -> Option<&MatchSummary> {
        self.summary.as_ref()
    }

    pub fn leaderboard(&self) -> &Arc<GlobalLeaderboard> {
        &self.leaderboard
    }

    pub fn snapshot(&self) -> MatchSnapshot {
        MatchSnapshot {
            room_code: self.room_code.clone(),
            phase: self.phase,
            epoch: self.epoch,
            settings: self.settings.clone(),
            players: self.players.iter().cloned().collect(),
            claims: self.claims.claims().to_vec(),
            disputes: self.disputes.disputes().to_vec(),
            summary: self.summary.clone(),
        }
    }

    fn require_phase(&self, phase: MatchPhase) -> Result<(), ValidationError> {
        if self.phase != phase {
            return Err(ValidationError::WrongPhase(self.phase));
        }
        Ok(())
    }

    fn require_host(&self, requester: &PlayerId) -> Result<(), ValidationError> {
        let player = self.players.require(requester)?;
        if !player.is_host {
            return Err(ValidationError::NotHost(requester.clone()));
        }
        Ok(())
    }

    fn require_room(&self) -> Result<(), ValidationError> {
        if self.players.len() >= self.config.max_players {
            return Err(ValidationError::RoomFull {
                max: self.config.max_players,
            });
        }
        Ok(())
    }

    /// Joins a human to the lobby. The first human becomes host and is ready
    /// straight away; everyone after starts not ready.
    pub fn register_player(&mut self, profile: PlayerProfile) -> Result<Player, ValidationError> {
        self.require_phase(MatchPhase::Lobby)?;
        let username = profile.username.trim();
        if username.is_empty() {
            return Err(ValidationError::EmptyUsername);
        }
        if self.players.username_taken(username) {
            return Err(ValidationError::DuplicatePlayer(username.to_string()));
        }
        if let Some(id) = &profile.id {
            if self.players.contains(id) {
                return Err(ValidationError::DuplicatePlayer(id.to_string()));
            }
        }
        self.require_room()?;

        let is_host = self.players.host().is_none();
        let player = Player {
            id: profile.id.clone().unwrap_or_else(PlayerId::generate),
            username: username.to_string(),
            avatar: profile.avatar,
            is_bot: false,
            is_host,
            score: 0,
            is_ready: is_host,
        };
        info!(
            target: LOG_TARGET,
            room = %self.room_code,
            player_id = %player.id,
            username = %player.username,
            is_host,
            "player joined"
        );
        self.players.insert(player.clone());
        Ok(player)
    }

    /// Adds the next unused bot profile to the lobby.
    pub fn add_bot(&mut self) -> Result<Player, ValidationError> {
        self.require_phase(MatchPhase::Lobby)?;
        if self.players.bot_count() >= self.config.max_bots {
            return Err(ValidationError::BotLimit {
                max: self.config.max_bots,
            });
        }
        self.require_room()?;
        let profile = BOT_PROFILES
            .iter()
            .find(|profile| !self.players.contains(&profile.player_id()))
            .ok_or(ValidationError::NoBotProfiles)?;

        let player = profile.to_player();
        info!(
            target: LOG_TARGET,
            room = %self.room_code,
            player_id = %player.id,
            username = %player.username,
            "bot joined"
        );
        self.players.insert(player.clone());
        Ok(player)
    }

    pub fn set_ready(&mut self, player_id: &PlayerId, ready: bool) -> Result<(), ValidationError> {
        self.require_phase(MatchPhase::Lobby)?;
        self.players.set_ready(player_id, ready)
    }

    pub fn update_settings(
        &mut self,
        requester: &PlayerId,
        settings: RoomSettings,
    ) -> Result<(), ValidationError> {
        self.require_phase(MatchPhase::Lobby)?;
        self.require_host(requester)?;
        if settings.submission_minutes == 0 {
            return Err(ValidationError::ZeroDuration);
        }
        info!(
            target: LOG_TARGET,
            room = %self.room_code,
            category = ?settings.category,
            difficulty = ?settings.difficulty,
            minutes = settings.submission_minutes,
            "room settings updated"
        );
        self.settings = settings;
        Ok(())
    }

    /// Host-only start. [`MatchSession::advance_phase`] starts a match too,
    /// without the host check, for callers that already authorised the request.
    pub fn start_match(&mut self, requester: &PlayerId) -> Result<PhaseChange, MatchError> {
        self.require_host(requester)?;
        self.apply(PhaseTrigger::StartMatch)
    }

    /// Performs the explicit transition for the current phase.
    pub fn advance_phase(&mut self) -> Result<PhaseChange, MatchError> {
        let trigger = self
            .phase
            .explicit_advance()
            .ok_or(ValidationError::WrongPhase(self.phase))?;
        self.apply(trigger)
    }

    pub fn skip_to_results(&mut self) -> Result<PhaseChange, MatchError> {
        self.apply(PhaseTrigger::SkipToResults)
    }

    pub fn reset(&mut self) -> Result<PhaseChange, MatchError> {
        self.apply(PhaseTrigger::Reset)
    }

    /// Moves the machine and runs the entry effects of the new phase.
    pub fn apply(&mut self, trigger: PhaseTrigger) -> Result<PhaseChange, MatchError> {
        let from = self.phase;
        let to = from.transition(trigger)?;
        if trigger == PhaseTrigger::StartMatch && self.players.is_empty() {
            return Err(ValidationError::NoPlayers.into());
        }

        match to {
            MatchPhase::Lobby => self.clear_match(),
            MatchPhase::Leaderboard => self.finish_match(),
            _ => {}
        }

        self.phase = to;
        self.epoch += 1;
        info!(
            target: LOG_TARGET,
            room = %self.room_code,
            ?from,
            ?to,
            ?trigger,
            epoch = self.epoch,
            "phase changed"
        );
        Ok(PhaseChange {
            from,
            to,
            trigger,
            epoch: self.epoch,
        })
    }

    fn clear_match(&mut self) {
        self.players.clear();
        self.claims.clear();
        self.disputes.clear();
        self.settings = RoomSettings::default();
        self.summary = None;
    }

    fn finish_match(&mut self) {
        self.disputes.lapse_open();
        self.leaderboard.fold_match(self.players.iter());

        let claims = self.claims.claims();
        self.summary = Some(MatchSummary {
            standings: self.players.standings(),
            claims_submitted: claims.len(),
            claims_verified: claims
                .iter()
                .filter(|c| c.status == ClaimStatus::Verified)
                .count(),
            disputes_upheld: self
                .disputes
                .disputes()
                .iter()
                .filter(|d| d.resolution == Some(DisputeResolution::Upheld))
                .count(),
        });
    }

    pub fn submit_claim(&mut self, author: &PlayerId, draft: ClaimDraft) -> Result<ClaimId, ValidationError> {
        self.players.require(author)?;
        self.claims.submit(self.phase, author, draft)
    }

    pub fn file_dispute(
        &mut self,
        disputer: &PlayerId,
        claim_id: ClaimId,
        reasoning: &str,
    ) -> Result<Dispute, ValidationError> {
        self.disputes.file(
            self.phase,
            &self.claims,
            &mut self.players,
            disputer,
            claim_id,
            reasoning,
        )
    }

    /// The next claim to verify, if the session is verifying and one is left.
    pub fn begin_verification(&self) -> Option<VerificationJob> {
        if self.phase != MatchPhase::Verification {
            return None;
        }
        let claim = self.claims.next_pending()?;
        let snapshot = self.claims.snapshot(claim.id)?;
        Some(VerificationJob {
            epoch: self.epoch,
            index: self.claims.position(claim.id)?,
            total: self.claims.len(),
            claim: snapshot,
        })
    }

    /// True once every submitted claim has a verdict.
    pub fn verification_done(&self) -> bool {
        self.phase == MatchPhase::Verification && self.claims.pending_count() == 0
    }

    /// Applies a finished round. Rounds from an earlier epoch are dropped.
    pub fn complete_verification(
        &mut self,
        epoch: u64,
        claim_id: ClaimId,
        outcome: ConsensusOutcome,
    ) -> Result<Option<VerdictApplication>, MatchError> {
        if !self.is_current(epoch) {
            warn!(
                target: LOG_TARGET,
                room = %self.room_code,
                %claim_id,
                stale_epoch = epoch,
                epoch = self.epoch,
                "discarding verdict from a previous phase"
            );
            return Ok(None);
        }
        self.claims
            .apply_verdict(claim_id, outcome, &mut self.players)
            .map(Some)
    }

    /// The next dispute to settle, if the session is in Dispute and one is open.
    pub fn begin_dispute(&self) -> Option<DisputeJob> {
        if self.phase != MatchPhase::Dispute {
            return None;
        }
        let dispute = self.disputes.next_open()?;
        Some(DisputeJob {
            epoch: self.epoch,
            dispute_id: dispute.id,
            claim: self.claims.snapshot(dispute.claim_id)?,
            prior_votes: self.claims.votes(dispute.claim_id).to_vec(),
        })
    }

    pub fn complete_dispute(
        &mut self,
        epoch: u64,
        dispute_id: DisputeId,
        outcome: ConsensusOutcome,
    ) -> Result<Option<Settlement>, MatchError> {
        if !self.is_current(epoch) {
            warn!(
                target: LOG_TARGET,
                room = %self.room_code,
                %dispute_id,
                stale_epoch = epoch,
                epoch = self.epoch,
                "discarding dispute expansion from a previous phase"
            );
            return Ok(None);
        }
        self.disputes
            .resolve(dispute_id, outcome, &mut self.claims, &mut self.players)
            .map(Some)
    }

    /// Verifies the earliest pending claim end to end. Returns `None` when
    /// nothing is left to verify.
    pub async fn process_next(
        &mut self,
        simulator: &ConsensusSimulator,
        sink: &EventSink,
        cancel: &CancellationToken,
    ) -> Result<Option<ClaimId>, MatchError> {
        let Some(job) = self.begin_verification() else {
            return Ok(None);
        };
        let progress = job.progress();
        sink.emit(progress.claim_id, progress.message, progress.kind)
            .await;
        let outcome = simulator.run_consensus(&job.claim, sink, cancel).await?;
        self.complete_verification(job.epoch, job.claim.claim_id, outcome)?;
        Ok(Some(job.claim.claim_id))
    }

    /// Runs [`MatchSession::process_next`] until no pending claims remain and
    /// returns how many were verified. The caller fires `ClaimsProcessed`.
    pub async fn process_all(
        &mut self,
        simulator: &ConsensusSimulator,
        sink: &EventSink,
        cancel: &CancellationToken,
    ) -> Result<usize, MatchError> {
        let mut processed = 0;
        while self.process_next(simulator, sink, cancel).await?.is_some() {
            processed += 1;
        }
        Ok(processed)
    }

    /// Settles the earliest open dispute end to end.
    pub async fn resolve_next_dispute(
        &mut self,
        simulator: &ConsensusSimulator,
        sink: &EventSink,
        cancel: &CancellationToken,
    ) -> Result<Option<Settlement>, MatchError> {
        let Some(job) = self.begin_dispute() else {
            return Ok(None);
        };
        let outcome = simulator
            .expand_consensus(&job.claim, &job.prior_votes, sink, cancel)
            .await?;
        self.complete_dispute(job.epoch, job.dispute_id, outcome)
    }
}
