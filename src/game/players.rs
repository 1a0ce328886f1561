use serde::Serialize;
use tracing::debug;

use crate::engine::scoring::Points;

use super::errors::ValidationError;
use super::types::{Player, PlayerId};

const LOG_TARGET: &str = "fact_arena::game::players";

/// Players of one match, in join order.
///
/// Scores can only move by a delta through [`PlayerRoster::apply_delta`];
/// there is no way to overwrite a score from a stale copy.
#[derive(Clone, Debug, Default, Serialize)]
pub struct PlayerRoster {
    players: Vec<Player>,
}

impl PlayerRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn bot_count(&self) -> usize {
        self.players.iter().filter(|p| p.is_bot).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    pub fn get(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| &p.id == id)
    }

    pub fn contains(&self, id: &PlayerId) -> bool {
        self.get(id).is_some()
    }

    pub fn require(&self, id: &PlayerId) -> Result<&Player, ValidationError> {
        self.get(id)
            .ok_or_else(|| ValidationError::UnknownPlayer(id.clone()))
    }

    pub fn username_taken(&self, username: &str) -> bool {
        self.players
            .iter()
            .any(|p| p.username.eq_ignore_ascii_case(username))
    }

    pub fn host(&self) -> Option<&Player> {
        self.players.iter().find(|p| p.is_host)
    }

    /// Adds a player with a zero score. Callers validate uniqueness first.
    pub(crate) fn insert(&mut self, player: Player) {
        debug_assert!(!self.contains(&player.id));
        self.players.push(Player { score: 0, ..player });
    }

    pub fn set_ready(&mut self, id: &PlayerId, ready: bool) -> Result<(), ValidationError> {
        let player = self
            .players
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| ValidationError::UnknownPlayer(id.clone()))?;
        player.is_ready = ready;
        Ok(())
    }

    /// Adds `delta` to a player's score and returns the new score.
    pub fn apply_delta(&mut self, id: &PlayerId, delta: Points) -> Result<Points, ValidationError> {
        let player = self
            .players
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| ValidationError::UnknownPlayer(id.clone()))?;
        player.score += delta;
        debug!(
            target: LOG_TARGET,
            player_id = %id,
            delta,
            score = player.score,
            "score updated"
        );
        Ok(player.score)
    }

    /// Players sorted by score, highest first; ties keep join order.
    pub fn standings(&self) -> Vec<Player> {
        let mut standings = self.players.clone();
        standings.sort_by(|a, b| b.score.cmp(&a.score));
        standings
    }

    pub fn clear(&mut self) {
        self.players.clear();
    }
}
