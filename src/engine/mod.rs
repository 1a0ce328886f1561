//! Rules of the game that do not depend on match state: the consensus
//! engine that adjudicates claims and the scoring model that prices them.

pub mod consensus;
pub mod scoring;
