//! Match-scoped game logic: players, claims, disputes and the phase machine
//! that sequences them.

pub mod bots;
pub mod claims;
pub mod coordinator;
pub mod disputes;
pub mod errors;
pub mod game_phases;
pub mod players;
pub mod rooms;
pub mod session;
pub mod timer;
pub mod types;

pub use claims::*;
pub use coordinator::{MatchCoordinator, MatchEvent};
pub use disputes::*;
pub use errors::*;
pub use game_phases::*;
pub use players::*;
pub use rooms::*;
pub use session::*;
pub use types::*;
