use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::BroadcastStream;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::{validate_match_config, MatchConfig};
use crate::engine::consensus::{ConsensusSimulator, ValidatorRoster, VoteSource};
use crate::game::bots::BotPlanner;
use crate::game::errors::MatchError;
use crate::game::session::{MatchSession, MatchSnapshot, PhaseChange};
use crate::game::types::{
    ClaimDraft, ClaimId, Dispute, Player, PlayerId, PlayerProfile, RoomCode, RoomSettings,
};
use crate::leaderboard::GlobalLeaderboard;
use crate::tokio_tools::spawn_room_task;

use super::commands::{MatchCommand, Reply};
use super::driver::MatchDriver;
use super::events::MatchEvent;

const LOG_TARGET: &str = "fact_arena::game::coordinator";

/// Handle to a running match. Cheap calls are forwarded to the driver task
/// and answered once the session has applied them.
pub struct MatchCoordinator {
    room_code: RoomCode,
    commands: mpsc::Sender<MatchCommand>,
    events: broadcast::Sender<MatchEvent>,
    leaderboard: Arc<GlobalLeaderboard>,
    shutdown: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl MatchCoordinator {
    /// Starts a match driver using the standard validator roster over `source`.
    pub fn spawn(
        room_code: RoomCode,
        config: MatchConfig,
        source: Arc<dyn VoteSource>,
        leaderboard: Arc<GlobalLeaderboard>,
    ) -> Result<Self, MatchError> {
        let simulator = Arc::new(ConsensusSimulator::new(
            ValidatorRoster::standard(),
            source,
            config.pacing.clone(),
            config.round_policy.clone(),
        ));
        Self::spawn_with(room_code, config, simulator, leaderboard, BotPlanner::from_entropy())
    }

    pub fn spawn_with(
        room_code: RoomCode,
        config: MatchConfig,
        simulator: Arc<ConsensusSimulator>,
        leaderboard: Arc<GlobalLeaderboard>,
        planner: BotPlanner,
    ) -> Result<Self, MatchError> {
        validate_match_config(&config)?;

        let (commands_tx, commands_rx) = mpsc::channel(config.command_buffer);
        let (events_tx, _) = broadcast::channel(config.event_buffer);
        let shutdown = CancellationToken::new();

        let session = MatchSession::new(room_code.clone(), config, Arc::clone(&leaderboard));
        let driver = MatchDriver::new(
            session,
            simulator,
            commands_rx,
            events_tx.clone(),
            planner,
            shutdown.clone(),
        );
        let task = spawn_room_task("match-driver", &room_code, driver.run())
            .map_err(|err| MatchError::TaskSpawn(err.to_string()))?;
        info!(target: LOG_TARGET, room = %room_code, "match coordinator spawned");

        Ok(Self {
            room_code,
            commands: commands_tx,
            events: events_tx,
            leaderboard,
            shutdown,
            task: Mutex::new(Some(task)),
        })
    }

    pub fn room_code(&self) -> &RoomCode {
        &self.room_code
    }

    pub fn leaderboard(&self) -> &Arc<GlobalLeaderboard> {
        &self.leaderboard
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MatchEvent> {
        self.events.subscribe()
    }

    pub fn event_stream(&self) -> BroadcastStream<MatchEvent> {
        BroadcastStream::new(self.subscribe())
    }

    async fn request<T>(&self, build: impl FnOnce(Reply<T>) -> MatchCommand) -> Result<T, MatchError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_| MatchError::CoordinatorClosed)?;
        response.await.map_err(|_| MatchError::CoordinatorClosed)?
    }

    pub async fn register_player(&self, profile: PlayerProfile) -> Result<Player, MatchError> {
        self.request(|reply| MatchCommand::RegisterPlayer { profile, reply })
            .await
    }

    pub async fn add_bot(&self) -> Result<Player, MatchError> {
        self.request(|reply| MatchCommand::AddBot { reply }).await
    }

    pub async fn set_ready(&self, player_id: PlayerId, ready: bool) -> Result<(), MatchError> {
        self.request(|reply| MatchCommand::SetReady {
            player_id,
            ready,
            reply,
        })
        .await
    }

    pub async fn update_settings(
        &self,
        requester: PlayerId,
        settings: RoomSettings,
    ) -> Result<(), MatchError> {
        self.request(|reply| MatchCommand::UpdateSettings {
            requester,
            settings,
            reply,
        })
        .await
    }

    pub async fn start_match(&self, requester: PlayerId) -> Result<PhaseChange, MatchError> {
        self.request(|reply| MatchCommand::StartMatch { requester, reply })
            .await
    }

    pub async fn submit_claim(&self, player_id: PlayerId, draft: ClaimDraft) -> Result<ClaimId, MatchError> {
        self.request(|reply| MatchCommand::SubmitClaim {
            player_id,
            draft,
            reply,
        })
        .await
    }

    pub async fn file_dispute(
        &self,
        player_id: PlayerId,
        claim_id: ClaimId,
        reasoning: impl Into<String>,
    ) -> Result<Dispute, MatchError> {
        let reasoning = reasoning.into();
        self.request(|reply| MatchCommand::FileDispute {
            player_id,
            claim_id,
            reasoning,
            reply,
        })
        .await
    }

    pub async fn advance_phase(&self) -> Result<PhaseChange, MatchError> {
        self.request(|reply| MatchCommand::AdvancePhase { reply }).await
    }

    pub async fn skip_to_results(&self) -> Result<PhaseChange, MatchError> {
        self.request(|reply| MatchCommand::SkipToResults { reply })
            .await
    }

    pub async fn reset_match(&self) -> Result<PhaseChange, MatchError> {
        self.request(|reply| MatchCommand::Reset { reply }).await
    }

    pub async fn snapshot(&self) -> Result<MatchSnapshot, MatchError> {
        self.request(|reply| MatchCommand::Snapshot { reply }).await
    }

    /// Stops the driver and waits for it to exit.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let task = self.task.lock().take();
        if let Some(task) = task {
            let _ = task.await;
        }
        info!(target: LOG_TARGET, room = %self.room_code, "match coordinator shut down");
    }
}

impl Drop for MatchCoordinator {
    fn drop(&mut self) {
        self.shutdown.cancel();
        if let Some(task) = self.task.lock().take() {
            task.abort();
        }
    }
}
