use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::info;

use crate::config::{validate_match_config, MatchConfig};
use crate::engine::consensus::VoteSource;
use crate::leaderboard::GlobalLeaderboard;

use super::coordinator::MatchCoordinator;
use super::errors::MatchError;
use super::types::RoomCode;

const LOG_TARGET: &str = "fact_arena::game::rooms";

/// Running rooms by code. Every room folds into the same global leaderboard.
pub struct RoomRegistry {
    rooms: DashMap<RoomCode, Arc<MatchCoordinator>>,
    leaderboard: Arc<GlobalLeaderboard>,
    config: MatchConfig,
    source: Arc<dyn VoteSource>,
}

impl RoomRegistry {
    pub fn new(config: MatchConfig, source: Arc<dyn VoteSource>) -> Result<Self, MatchError> {
        Self::with_leaderboard(config, source, Arc::new(GlobalLeaderboard::new()))
    }

    pub fn with_leaderboard(
        config: MatchConfig,
        source: Arc<dyn VoteSource>,
        leaderboard: Arc<GlobalLeaderboard>,
    ) -> Result<Self, MatchError> {
        validate_match_config(&config)?;
        Ok(Self {
            rooms: DashMap::new(),
            leaderboard,
            config,
            source,
        })
    }

    pub fn leaderboard(&self) -> &Arc<GlobalLeaderboard> {
        &self.leaderboard
    }

    /// Opens a room under a fresh code. Must be called inside a Tokio runtime.
    pub fn create_room(&self) -> Result<Arc<MatchCoordinator>, MatchError> {
        let mut rng = rand::thread_rng();
        loop {
            let code = RoomCode::generate(&mut rng);
            if let Entry::Vacant(slot) = self.rooms.entry(code.clone()) {
                let coordinator = Arc::new(MatchCoordinator::spawn(
                    code.clone(),
                    self.config.clone(),
                    Arc::clone(&self.source),
                    Arc::clone(&self.leaderboard),
                )?);
                slot.insert(Arc::clone(&coordinator));
                info!(target: LOG_TARGET, room = %code, rooms = self.rooms.len(), "room opened");
                return Ok(coordinator);
            }
        }
    }

    /// Looks a room up by user-entered code (case and whitespace are ignored).
    pub fn get(&self, code: &str) -> Option<Arc<MatchCoordinator>> {
        self.rooms
            .get(&RoomCode::parse(code))
            .map(|room| Arc::clone(room.value()))
    }

    pub fn room_codes(&self) -> Vec<RoomCode> {
        self.rooms.iter().map(|room| room.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Shuts a room down and forgets it. Returns false for unknown codes.
    pub async fn close_room(&self, code: &str) -> bool {
        let Some((code, coordinator)) = self.rooms.remove(&RoomCode::parse(code)) else {
            return false;
        };
        coordinator.shutdown().await;
        info!(target: LOG_TARGET, room = %code, "room closed");
        true
    }

    pub async fn shutdown(&self) {
        for code in self.room_codes() {
            self.close_room(&code.0).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::consensus::RandomVoteSource;
    use crate::test_utils::{fast_config, profile};

    fn registry() -> RoomRegistry {
        RoomRegistry::new(fast_config(), Arc::new(RandomVoteSource::seeded(1))).unwrap()
    }

    #[tokio::test]
    async fn rooms_are_found_by_normalized_code_and_share_a_leaderboard() {
        let rooms = registry();
        let first = rooms.create_room().unwrap();
        let second = rooms.create_room().unwrap();
        assert_ne!(first.room_code(), second.room_code());
        assert_eq!(rooms.len(), 2);

        let lookup = format!("  {} ", first.room_code().0.to_ascii_lowercase());
        let found = rooms.get(&lookup).unwrap();
        assert!(Arc::ptr_eq(&found, &first));
        assert!(Arc::ptr_eq(first.leaderboard(), second.leaderboard()));

        found.register_player(profile("host")).await.unwrap();
        assert_eq!(first.snapshot().await.unwrap().players.len(), 1);
    }

    #[tokio::test]
    async fn closed_rooms_are_forgotten() {
        let rooms = registry();
        let room = rooms.create_room().unwrap();
        let code = room.room_code().clone();

        assert!(rooms.close_room(&code.0).await);
        assert!(rooms.get(&code.0).is_none());
        assert!(!rooms.close_room(&code.0).await);
        assert_eq!(
            room.snapshot().await.unwrap_err(),
            MatchError::CoordinatorClosed
        );
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = MatchConfig {
            max_players: 0,
            ..fast_config()
        };
        assert!(matches!(
            RoomRegistry::new(config, Arc::new(RandomVoteSource::seeded(1))),
            Err(MatchError::Config(_))
        ));
    }
}
