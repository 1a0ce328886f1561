//! Async driver for one match.
//!
//! [`MatchCoordinator`] is the handle; a single driver task owns the
//! [`MatchSession`](crate::game::session::MatchSession) and serialises
//! inbound commands, phase timers, bot activity and consensus rounds.
//! Progress is published on a broadcast channel as [`MatchEvent`]s.

mod commands;
mod driver;
pub mod events;
pub mod handle;

pub use events::*;
pub use handle::*;
