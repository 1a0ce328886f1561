use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use crate::engine::consensus::types::ClaimId;
use crate::engine::consensus::types::{Verdict, VerdictStatus};
use crate::engine::scoring::{ClaimType, Points};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisputeId(pub Uuid);

impl DisputeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DisputeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DisputeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// What a human supplies when joining a room.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerProfile {
    /// Returning players pass their previous id so their global standing
    /// carries over. A fresh id is generated otherwise.
    #[serde(default)]
    pub id: Option<PlayerId>,
    pub username: String,
    pub avatar: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub username: String,
    pub avatar: String,
    pub is_bot: bool,
    pub is_host: bool,
    /// Per-match score. Only ever changed by applying a delta.
    pub score: Points,
    pub is_ready: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClaimStatus {
    Pending,
    Verified,
    False,
    Uncertain,
}

impl From<VerdictStatus> for ClaimStatus {
    fn from(status: VerdictStatus) -> Self {
        match status {
            VerdictStatus::Verified => ClaimStatus::Verified,
            VerdictStatus::False => ClaimStatus::False,
            VerdictStatus::Uncertain => ClaimStatus::Uncertain,
        }
    }
}

/// Inbound claim as submitted by a player or bot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimDraft {
    pub content: String,
    pub declared_confidence: u8,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub claim_type: ClaimType,
}

impl ClaimDraft {
    pub fn new(content: impl Into<String>, declared_confidence: u8) -> Self {
        Self {
            content: content.into(),
            declared_confidence,
            source_url: None,
            claim_type: ClaimType::QuickFact,
        }
    }

    pub fn with_source(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    pub fn with_type(mut self, claim_type: ClaimType) -> Self {
        self.claim_type = claim_type;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claim {
    pub id: ClaimId,
    pub author_id: PlayerId,
    pub content: String,
    pub claim_type: ClaimType,
    pub declared_confidence: u8,
    pub has_source: bool,
    pub source_url: Option<String>,
    pub status: ClaimStatus,
    /// Present exactly when `status` is not Pending.
    pub verdict: Option<Verdict>,
    pub points_awarded: Points,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DisputeStatus {
    Open,
    Resolved,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DisputeResolution {
    /// Expanded quorum returned Verified; the disputer was paid out.
    Upheld,
    /// Expanded quorum returned anything else; the stake is lost.
    Rejected,
    /// The claim already had a dispute; nothing was staked or re-run.
    Superseded,
    /// The dispute phase closed before the expansion finished.
    Lapsed,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dispute {
    pub id: DisputeId,
    pub claim_id: ClaimId,
    pub disputer_id: PlayerId,
    pub reasoning: String,
    pub stake: Points,
    pub status: DisputeStatus,
    pub resolution: Option<DisputeResolution>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Tech News")]
    TechNews,
    Sports,
    History,
    Science,
    #[serde(rename = "Pop Culture")]
    PopCulture,
    #[serde(rename = "Crypto/Web3")]
    CryptoWeb3,
}

impl Default for Category {
    fn default() -> Self {
        Category::TechNews
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty::Medium
    }
}

const ROOM_CODE_LEN: usize = 6;
const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(pub String);

impl RoomCode {
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let code = (0..ROOM_CODE_LEN)
            .map(|_| ROOM_CODE_ALPHABET[rng.gen_range(0..ROOM_CODE_ALPHABET.len())] as char)
            .collect();
        Self(code)
    }

    /// Normalizes user input (trim, uppercase) for lookups.
    pub fn parse(input: &str) -> Self {
        Self(input.trim().to_ascii_uppercase())
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSettings {
    pub category: Category,
    pub difficulty: Difficulty,
    /// Length of the submission phase.
    pub submission_minutes: u32,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            category: Category::default(),
            difficulty: Difficulty::default(),
            submission_minutes: crate::config::DEFAULT_SUBMISSION_MINUTES,
        }
    }
}

impl RoomSettings {
    pub fn submission_duration(&self) -> std::time::Duration {
        std::time::Duration::from_secs(u64::from(self.submission_minutes) * 60)
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::test_utils::assert_json_keys;

    #[test]
    fn player_serializes_with_camel_case_fields() {
        let player = Player {
            id: PlayerId::from("p1"),
            username: "host".into(),
            avatar: "😎".into(),
            is_bot: false,
            is_host: true,
            score: 0,
            is_ready: true,
        };
        assert_json_keys(
            &player,
            &["id", "username", "avatar", "isBot", "isHost", "score", "isReady"],
        );
    }

    #[test]
    fn claim_keeps_documented_field_names() {
        let claim = Claim {
            id: ClaimId::new(),
            author_id: PlayerId::from("p1"),
            content: "Microsoft owns GitHub.".into(),
            claim_type: ClaimType::QuickFact,
            declared_confidence: 80,
            has_source: false,
            source_url: None,
            status: ClaimStatus::Pending,
            verdict: None,
            points_awarded: 0,
        };
        assert_json_keys(
            &claim,
            &[
                "id",
                "authorId",
                "content",
                "claimType",
                "declaredConfidence",
                "hasSource",
                "sourceUrl",
                "status",
                "verdict",
                "pointsAwarded",
            ],
        );
    }

    #[test]
    fn room_codes_are_six_uppercase_alphanumerics() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..32 {
            let code = RoomCode::generate(&mut rng);
            assert_eq!(code.0.len(), 6);
            assert!(code
                .0
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        }
        assert_eq!(RoomCode::parse(" ab12cd "), RoomCode("AB12CD".into()));
    }

    #[test]
    fn claim_draft_defaults_to_quick_fact() {
        let draft: ClaimDraft =
            serde_json::from_str(r#"{"content":"x","declaredConfidence":70}"#).unwrap();
        assert_eq!(draft.claim_type, ClaimType::QuickFact);
        assert_eq!(draft.source_url, None);
    }
}
