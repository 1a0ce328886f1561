pub mod config;
pub mod engine;
pub mod game;
pub mod leaderboard;

mod tokio_tools;

#[cfg(test)]
pub mod test_utils;

pub use config::{MatchConfig, PacingConfig, RoundPolicy};
pub use game::{MatchCoordinator, MatchEvent, RoomRegistry};
pub use leaderboard::{GlobalLeaderboard, GlobalLeaderboardEntry};
