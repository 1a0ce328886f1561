use tokio::sync::oneshot;

use crate::game::errors::MatchError;
use crate::game::session::{MatchSnapshot, PhaseChange};
use crate::game::types::{ClaimDraft, ClaimId, Dispute, Player, PlayerId, PlayerProfile, RoomSettings};

pub(crate) type Reply<T> = oneshot::Sender<Result<T, MatchError>>;

/// Requests the handle sends to the driver task. Every command carries the
/// channel its result is sent back on.
#[derive(Debug)]
pub(crate) enum MatchCommand {
    RegisterPlayer {
        profile: PlayerProfile,
        reply: Reply<Player>,
    },
    AddBot {
        reply: Reply<Player>,
    },
    SetReady {
        player_id: PlayerId,
        ready: bool,
        reply: Reply<()>,
    },
    UpdateSettings {
        requester: PlayerId,
        settings: RoomSettings,
        reply: Reply<()>,
    },
    StartMatch {
        requester: PlayerId,
        reply: Reply<PhaseChange>,
    },
    SubmitClaim {
        player_id: PlayerId,
        draft: ClaimDraft,
        reply: Reply<ClaimId>,
    },
    FileDispute {
        player_id: PlayerId,
        claim_id: ClaimId,
        reasoning: String,
        reply: Reply<Dispute>,
    },
    AdvancePhase {
        reply: Reply<PhaseChange>,
    },
    SkipToResults {
        reply: Reply<PhaseChange>,
    },
    Reset {
        reply: Reply<PhaseChange>,
    },
    Snapshot {
        reply: Reply<MatchSnapshot>,
    },
}
