pub mod errors;
pub mod events;
pub mod roster;
pub mod simulator;
pub mod source;
pub mod tally;
pub mod types;

pub use errors::*;
pub use events::*;
pub use roster::*;
pub use simulator::*;
pub use source::*;
pub use tally::*;
pub use types::*;
