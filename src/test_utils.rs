//! Fixtures shared across test modules.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::config::{MatchConfig, PacingConfig};
use crate::engine::consensus::{
    ClaimSnapshot, ConsensusSimulator, Validator, ValidatorRoster, VerdictStatus, VoteSource,
    VoteSourceError,
};
use crate::game::types::{PlayerId, PlayerProfile};

/// One scripted answer from a validator.
#[derive(Clone, Debug)]
pub enum Scripted {
    Vote(VerdictStatus),
    Fail,
    /// Never answers; exercises the simulator's timeouts.
    Hang,
}

/// Deterministic vote backend that replays a script in call order and
/// answers Verified once the script runs out.
#[derive(Default)]
pub struct ScriptedVoteSource {
    script: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<(String, bool)>>,
}

impl ScriptedVoteSource {
    pub fn new(script: impl IntoIterator<Item = Scripted>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn votes(statuses: impl IntoIterator<Item = VerdictStatus>) -> Arc<Self> {
        Self::new(statuses.into_iter().map(Scripted::Vote))
    }

    pub fn push(&self, entries: impl IntoIterator<Item = Scripted>) {
        self.script.lock().extend(entries);
    }

    /// `(validator_id, escalated)` for every call seen so far.
    pub fn calls(&self) -> Vec<(String, bool)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl VoteSource for ScriptedVoteSource {
    async fn draw(
        &self,
        validator: &Validator,
        _claim: &ClaimSnapshot,
        escalated: bool,
    ) -> Result<VerdictStatus, VoteSourceError> {
        self.calls.lock().push((validator.id.clone(), escalated));
        let next = self.script.lock().pop_front();
        match next {
            None => Ok(VerdictStatus::Verified),
            Some(Scripted::Vote(status)) => Ok(status),
            Some(Scripted::Fail) => Err(VoteSourceError::Unavailable {
                validator: validator.id.clone(),
                reason: "scripted failure".into(),
            }),
            Some(Scripted::Hang) => std::future::pending().await,
        }
    }
}

/// Config with zero simulated latency and no bots.
pub fn fast_config() -> MatchConfig {
    MatchConfig {
        pacing: PacingConfig::instant(),
        bots_enabled: false,
        ..MatchConfig::default()
    }
}

pub fn simulator_with(source: Arc<dyn VoteSource>, config: &MatchConfig) -> Arc<ConsensusSimulator> {
    Arc::new(ConsensusSimulator::new(
        ValidatorRoster::standard(),
        source,
        config.pacing.clone(),
        config.round_policy.clone(),
    ))
}

pub fn profile(username: &str) -> PlayerProfile {
    PlayerProfile {
        id: None,
        username: username.to_string(),
        avatar: "😎".to_string(),
    }
}

/// Profile of a returning player with a fixed id.
pub fn returning(id: &str, username: &str) -> PlayerProfile {
    PlayerProfile {
        id: Some(PlayerId::from(id)),
        ..profile(username)
    }
}

/// Asserts that a value serializes with exactly the given top-level keys.
pub fn assert_json_keys<T: serde::Serialize>(value: &T, expected: &[&str]) {
    let json = serde_json::to_value(value).expect("value should serialize");
    let object = json.as_object().expect("value should serialize to an object");
    let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
    keys.sort_unstable();
    let mut expected = expected.to_vec();
    expected.sort_unstable();
    assert_eq!(keys, expected);
}
