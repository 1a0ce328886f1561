use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::engine::consensus::{
    ClaimId, ConsensusError, ConsensusEvent, ConsensusOutcome,
    ConsensusSimulator, EventSink,
};
use crate::game::bots::{BotPlanner, BotSchedule};
use crate::game::errors::MatchError;
use crate::game::game_phases::{MatchPhase, PhaseTrigger};
use crate::game::session::{MatchSession, PhaseChange};
use crate::game::timer::PhaseTimer;
use crate::game::types::{ClaimDraft, DisputeId, PlayerId};

use super::commands::MatchCommand;
use super::events::MatchEvent;

const LOG_TARGET: &str = "fact_arena::game::coordinator";

type RoundFuture = Pin<Box<dyn Future<Output = Result<ConsensusOutcome, ConsensusError>> + Send>>;

#[derive(Clone, Copy, Debug)]
enum RoundKind {
    Verification(ClaimId),
    Dispute(DisputeId),
}

/// The consensus round currently running for this room. At most one exists.
struct InFlight {
    epoch: u64,
    kind: RoundKind,
    future: RoundFuture,
}

/// Owns a [`MatchSession`] and everything that moves it without a caller:
/// phase timers, bot wake-ups and consensus rounds. Runs on a single task,
/// so session mutations never interleave.
pub(crate) struct MatchDriver {
    session: MatchSession,
    simulator: Arc<ConsensusSimulator>,
    commands: mpsc::Receiver<MatchCommand>,
    events: broadcast::Sender<MatchEvent>,
    sink: EventSink,
    consensus_rx: mpsc::Receiver<ConsensusEvent>,
    timer: PhaseTimer,
    planner: BotPlanner,
    bots: BotSchedule,
    round: Option<InFlight>,
    round_cancel: CancellationToken,
    shutdown: CancellationToken,
}

impl MatchDriver {
    pub(crate) fn new(
        session: MatchSession,
        simulator: Arc<ConsensusSimulator>,
        commands: mpsc::Receiver<MatchCommand>,
        events: broadcast::Sender<MatchEvent>,
        planner: BotPlanner,
        shutdown: CancellationToken,
    ) -> Self {
        let (sink, consensus_rx) = EventSink::channel(session.config().event_buffer);
        Self {
            session,
            simulator,
            commands,
            events,
            sink,
            consensus_rx,
            timer: PhaseTimer::new(),
            planner,
            bots: BotSchedule::default(),
            round: None,
            round_cancel: shutdown.child_token(),
            shutdown,
        }
    }

    pub(crate) async fn run(mut self) {
        info!(target: LOG_TARGET, room = %self.session.room_code(), "match driver started");
        loop {
            let timer_deadline = self.timer.deadline();
            let bot_deadline = self.bots.next_deadline();

            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    debug!(
                        target: LOG_TARGET,
                        room = %self.session.room_code(),
                        "cancellation token triggered; stopping match driver"
                    );
                    break;
                }
                Some(event) = self.consensus_rx.recv() => self.publish(MatchEvent::Consensus(event)),
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => {
                        debug!(
                            target: LOG_TARGET,
                            room = %self.session.room_code(),
                            "all handles dropped; stopping match driver"
                        );
                        break;
                    }
                },
                result = next_round_result(&mut self.round) => self.finish_round(result),
                _ = sleep_until_opt(timer_deadline) => self.on_timer(),
                _ = sleep_until_opt(bot_deadline) => self.on_bot_wake(),
            }

            self.pump();
        }
        self.cancel_round();
        info!(target: LOG_TARGET, room = %self.session.room_code(), "match driver stopped");
    }

    fn publish(&self, event: MatchEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn handle_command(&mut self, command: MatchCommand) {
        match command {
            MatchCommand::RegisterPlayer { profile, reply } => {
                let result = self.session.register_player(profile).map_err(MatchError::from);
                if let Ok(player) = &result {
                    self.publish(MatchEvent::PlayerJoined(player.clone()));
                }
                let _ = reply.send(result);
            }
            MatchCommand::AddBot { reply } => {
                let result = self.session.add_bot().map_err(MatchError::from);
                if let Ok(player) = &result {
                    self.publish(MatchEvent::PlayerJoined(player.clone()));
                }
                let _ = reply.send(result);
            }
            MatchCommand::SetReady {
                player_id,
                ready,
                reply,
            } => {
                let result = self.session.set_ready(&player_id, ready).map_err(MatchError::from);
                if result.is_ok() {
                    self.publish(MatchEvent::PlayerReady { player_id, ready });
                }
                let _ = reply.send(result);
            }
            MatchCommand::UpdateSettings {
                requester,
                settings,
                reply,
            } => {
                let result = self
                    .session
                    .update_settings(&requester, settings.clone())
                    .map_err(MatchError::from);
                if result.is_ok() {
                    self.publish(MatchEvent::SettingsUpdated(settings));
                }
                let _ = reply.send(result);
            }
            MatchCommand::StartMatch { requester, reply } => {
                let result = self.session.start_match(&requester);
                let _ = reply.send(self.entered(result));
            }
            MatchCommand::SubmitClaim {
                player_id,
                draft,
                reply,
            } => {
                let result = self.submit_claim(&player_id, draft);
                let _ = reply.send(result);
            }
            MatchCommand::FileDispute {
                player_id,
                claim_id,
                reasoning,
                reply,
            } => {
                let result = self
                    .session
                    .file_dispute(&player_id, claim_id, &reasoning)
                    .map_err(MatchError::from);
                if let Ok(dispute) = &result {
                    self.publish(MatchEvent::DisputeFiled(dispute.clone()));
                }
                let _ = reply.send(result);
            }
            MatchCommand::AdvancePhase { reply } => {
                let result = self.session.advance_phase();
                let _ = reply.send(self.entered(result));
            }
            MatchCommand::SkipToResults { reply } => {
                let result = self.session.skip_to_results();
                let _ = reply.send(self.entered(result));
            }
            MatchCommand::Reset { reply } => {
                let result = self.session.reset();
                let _ = reply.send(self.entered(result));
            }
            MatchCommand::Snapshot { reply } => {
                let _ = reply.send(Ok(self.session.snapshot()));
            }
        }
    }

    fn submit_claim(
        &mut self,
        player_id: &PlayerId,
        draft: ClaimDraft,
    ) -> Result<ClaimId, MatchError> {
        let claim_id = self.session.submit_claim(player_id, draft)?;
        if let Some(claim) = self.session.claims().get(claim_id) {
            self.publish(MatchEvent::ClaimSubmitted(claim.clone()));
        }
        Ok(claim_id)
    }

    fn transition(&mut self, trigger: PhaseTrigger) {
        let result = self.session.apply(trigger);
        if let Err(err) = self.entered(result) {
            error!(
                target: LOG_TARGET,
                room = %self.session.room_code(),
                ?trigger,
                error = %err,
                "automatic phase transition failed"
            );
        }
    }

    /// Runs the driver-side effects of a successful phase change.
    fn entered(&mut self, result: Result<PhaseChange, MatchError>) -> Result<PhaseChange, MatchError> {
        let change = result?;
        self.cancel_round();
        self.timer.disarm();
        self.bots.clear();
        self.publish(MatchEvent::PhaseChanged(change.clone()));

        let config = self.session.config();
        match change.to {
            MatchPhase::Submission => {
                self.timer.arm(
                    MatchPhase::Submission,
                    PhaseTrigger::SubmissionTimerElapsed,
                    self.session.settings().submission_duration(),
                );
                if config.bots_enabled {
                    let bots: Vec<_> = self
                        .session
                        .players()
                        .iter()
                        .filter(|p| p.is_bot)
                        .map(|p| p.id.clone())
                        .collect();
                    self.bots.start(bots, &mut self.planner, Instant::now());
                }
            }
            MatchPhase::Verification if self.session.claims().is_empty() => {
                self.timer.arm(
                    MatchPhase::Verification,
                    PhaseTrigger::ClaimsProcessed,
                    config.empty_verification_grace,
                );
            }
            MatchPhase::Dispute => {
                self.timer.arm(
                    MatchPhase::Dispute,
                    PhaseTrigger::DisputeTimerElapsed,
                    config.dispute_duration,
                );
            }
            MatchPhase::Leaderboard => {
                if let Some(summary) = self.session.summary() {
                    self.publish(MatchEvent::MatchFinished(summary.clone()));
                }
            }
            _ => {}
        }
        Ok(change)
    }

    fn on_timer(&mut self) {
        if let Some(trigger) = self.timer.fire_due(Instant::now()) {
            self.transition(trigger);
        }
    }

    fn on_bot_wake(&mut self) {
        let now = Instant::now();
        let due = self.bots.due(&mut self.planner, now);
        let settings = self.session.settings().clone();
        for bot in due {
            let Some(draft) = self.planner.decide(settings.category, settings.difficulty) else {
                continue;
            };
            if let Err(err) = self.submit_claim(&bot, draft) {
                warn!(
                    target: LOG_TARGET,
                    room = %self.session.room_code(),
                    bot = %bot,
                    error = %err,
                    "bot claim rejected"
                );
            }
        }
    }

    /// Starts the next consensus round when nothing is running, and closes
    /// Verification once every claim has a verdict.
    fn pump(&mut self) {
        if self.round.is_some() {
            return;
        }
        match self.session.phase() {
            MatchPhase::Verification => {
                if let Some(job) = self.session.begin_verification() {
                    let claim_id = job.claim.claim_id;
                    self.publish(MatchEvent::Consensus(job.progress()));

                    let simulator = Arc::clone(&self.simulator);
                    let sink = self.sink.clone();
                    let cancel = self.round_cancel.clone();
                    let claim = job.claim;
                    self.round = Some(InFlight {
                        epoch: job.epoch,
                        kind: RoundKind::Verification(claim_id),
                        future: Box::pin(async move {
                            simulator.run_consensus(&claim, &sink, &cancel).await
                        }),
                    });
                } else if self.session.verification_done() && !self.session.claims().is_empty() {
                    self.transition(PhaseTrigger::ClaimsProcessed);
                }
            }
            MatchPhase::Dispute => {
                if let Some(job) = self.session.begin_dispute() {
                    let simulator = Arc::clone(&self.simulator);
                    let sink = self.sink.clone();
                    let cancel = self.round_cancel.clone();
                    let claim = job.claim;
                    let prior_votes = job.prior_votes;
                    self.round = Some(InFlight {
                        epoch: job.epoch,
                        kind: RoundKind::Dispute(job.dispute_id),
                        future: Box::pin(async move {
                            simulator
                                .expand_consensus(&claim, &prior_votes, &sink, &cancel)
                                .await
                        }),
                    });
                }
            }
            _ => {}
        }
    }

    fn finish_round(&mut self, result: Result<ConsensusOutcome, ConsensusError>) {
        let Some(round) = self.round.take() else {
            return;
        };
        // Everything the round emitted is already queued; forward it before
        // announcing the result.
        while let Ok(event) = self.consensus_rx.try_recv() {
            self.publish(MatchEvent::Consensus(event));
        }

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(
                    target: LOG_TARGET,
                    room = %self.session.room_code(),
                    kind = ?round.kind,
                    error = %err,
                    "consensus round ended without an outcome"
                );
                return;
            }
        };

        match round.kind {
            RoundKind::Verification(claim_id) => {
                match self.session.complete_verification(round.epoch, claim_id, outcome) {
                    Ok(Some(_)) => {
                        if let Some(claim) = self.session.claims().get(claim_id) {
                            self.publish(MatchEvent::ClaimAdjudicated {
                                claim_id,
                                status: claim.status,
                                points_awarded: claim.points_awarded,
                            });
                        }
                    }
                    Ok(None) => {}
                    Err(err) => error!(
                        target: LOG_TARGET,
                        room = %self.session.room_code(),
                        %claim_id,
                        error = %err,
                        "failed to apply verdict"
                    ),
                }
            }
            RoundKind::Dispute(dispute_id) => {
                match self.session.complete_dispute(round.epoch, dispute_id, outcome) {
                    Ok(Some(settlement)) => {
                        self.publish(MatchEvent::DisputeResolved {
                            dispute_id,
                            resolution: settlement.resolution,
                            payout: settlement.payout,
                            disputer_score: settlement.disputer_score,
                        });
                        if let Some(dispute) = self.session.disputes().get(dispute_id) {
                            if let Some(claim) = self.session.claims().get(dispute.claim_id) {
                                self.publish(MatchEvent::ClaimAdjudicated {
                                    claim_id: claim.id,
                                    status: claim.status,
                                    points_awarded: claim.points_awarded,
                                });
                            }
                        }
                    }
                    Ok(None) => {}
                    Err(err) => error!(
                        target: LOG_TARGET,
                        room = %self.session.room_code(),
                        %dispute_id,
                        error = %err,
                        "failed to settle dispute"
                    ),
                }
            }
        }
    }

    /// Drops the in-flight round, if any. Its queued events and its eventual
    /// result are discarded.
    fn cancel_round(&mut self) {
        if let Some(round) = self.round.take() {
            self.round_cancel.cancel();
            self.round_cancel = self.shutdown.child_token();
            while self.consensus_rx.try_recv().is_ok() {}
            debug!(
                target: LOG_TARGET,
                room = %self.session.room_code(),
                kind = ?round.kind,
                epoch = round.epoch,
                "in-flight consensus round cancelled"
            );
        }
    }
}

async fn next_round_result(round: &mut Option<InFlight>) -> Result<ConsensusOutcome, ConsensusError> {
    match round {
        Some(round) => (&mut round.future).await,
        None => std::future::pending().await,
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
