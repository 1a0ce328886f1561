//! Cross-match standings.
//!
//! [`GlobalLeaderboard`] is the only writer of [`GlobalLeaderboardEntry`]
//! records. Entries are folded additively and never replaced wholesale; a
//! match reset does not touch them.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::engine::scoring::Points;
use crate::game::types::{Player, PlayerId};

const LOG_TARGET: &str = "fact_arena::leaderboard";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalLeaderboardEntry {
    pub player_id: PlayerId,
    pub username: String,
    pub avatar: String,
    pub total_score: Points,
    pub games_played: u32,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct GlobalLeaderboard {
    entries: RwLock<HashMap<PlayerId, GlobalLeaderboardEntry>>,
}

impl GlobalLeaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one finished match into the standings: every player's match
    /// score is added to their total and their games count goes up by one.
    pub fn fold_match<'a>(&self, players: impl IntoIterator<Item = &'a Player>) {
        self.fold_match_at(players, Utc::now())
    }

    pub fn fold_match_at<'a>(&self, players: impl IntoIterator<Item = &'a Player>, at: DateTime<Utc>) {
        let mut entries = self.entries.write();
        let mut folded = 0usize;
        for player in players {
            let entry = entries
                .entry(player.id.clone())
                .or_insert_with(|| GlobalLeaderboardEntry {
                    player_id: player.id.clone(),
                    username: player.username.clone(),
                    avatar: player.avatar.clone(),
                    total_score: 0,
                    games_played: 0,
                    last_updated: at,
                });
            entry.total_score += player.score;
            entry.games_played += 1;
            entry.last_updated = at;
            folded += 1;
        }
        info!(target: LOG_TARGET, players = folded, "match folded into global leaderboard");
    }

    pub fn get(&self, player_id: &PlayerId) -> Option<GlobalLeaderboardEntry> {
        self.entries.read().get(player_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// All entries, highest total first. Equal totals are ordered by player id.
    pub fn standings(&self) -> Vec<GlobalLeaderboardEntry> {
        let mut standings: Vec<_> = self.entries.read().values().cloned().collect();
        standings.sort_by(|a, b| {
            b.total_score
                .cmp(&a.total_score)
                .then_with(|| a.player_id.cmp(&b.player_id))
        });
        standings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::assert_json_keys;

    fn player(id: &str, username: &str, score: Points) -> Player {
        Player {
            id: PlayerId::from(id),
            username: username.into(),
            avatar: "🦊".into(),
            is_bot: false,
            is_host: false,
            score,
            is_ready: true,
        }
    }

    #[test]
    fn two_matches_accumulate() {
        let board = GlobalLeaderboard::new();
        board.fold_match(&[player("p1", "alice", 40)]);
        board.fold_match(&[player("p1", "alice", 60)]);

        let entry = board.get(&"p1".into()).unwrap();
        assert_eq!(entry.total_score, 100);
        assert_eq!(entry.games_played, 2);
        assert_eq!(board.len(), 1);
    }

    #[test]
    fn standings_sort_descending_by_total() {
        let board = GlobalLeaderboard::new();
        board.fold_match(&[
            player("a", "a", 10),
            player("b", "b", 30),
            player("c", "c", 10),
            player("d", "d", -5),
        ]);
        let order: Vec<_> = board
            .standings()
            .into_iter()
            .map(|e| e.player_id.0)
            .collect();
        assert_eq!(order, ["b", "a", "c", "d"]);
    }

    #[test]
    fn later_folds_only_touch_totals_and_timestamp() {
        let board = GlobalLeaderboard::new();
        let first = Utc::now();
        board.fold_match_at(&[player("p1", "alice", 5)], first);
        let later = first + chrono::Duration::minutes(10);
        board.fold_match_at(&[player("p1", "renamed", 7)], later);

        let entry = board.get(&"p1".into()).unwrap();
        assert_eq!(entry.username, "alice");
        assert_eq!(entry.total_score, 12);
        assert_eq!(entry.last_updated, later);
    }

    #[test]
    fn entry_serializes_with_camel_case_fields() {
        let board = GlobalLeaderboard::new();
        board.fold_match(&[player("p1", "alice", 5)]);
        assert_json_keys(
            &board.get(&"p1".into()).unwrap(),
            &["playerId", "username", "avatar", "totalScore", "gamesPlayed", "lastUpdated"],
        );
    }
}
