//! Where validator votes come from.
//!
//! [`VoteSource`] is the seam between the consensus engine and whatever
//! produces votes. The game ships [`RandomVoteSource`], a seeded categorical
//! draw standing in for real validators. A networked backend implements the
//! same trait; the simulator already bounds each call with a timeout and a
//! retry cap and turns any error into an Uncertain vote.

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::{rngs::StdRng, Rng, SeedableRng};

use super::errors::VoteSourceError;
use super::types::{ClaimSnapshot, Validator, VerdictStatus};

/// Illustrative references attached to every simulated vote.
pub const REFERENCE_SOURCES: [&str; 2] = ["wikipedia.org", "reuters.com"];

const FALSE_THRESHOLD: f64 = 0.30;
const UNCERTAIN_THRESHOLD: f64 = 0.45;
const SNIPPET_CHARS: usize = 15;

#[async_trait]
pub trait VoteSource: Send + Sync {
    /// Draws one validator's outcome for `claim`. `escalated` is set on the
    /// dispute expansion path.
    async fn draw(
        &self,
        validator: &Validator,
        claim: &ClaimSnapshot,
        escalated: bool,
    ) -> Result<VerdictStatus, VoteSourceError>;
}

/// Maps a uniform draw in `[0, 1)` onto an outcome:
/// P(False)=0.30, P(Uncertain)=0.15, P(Verified)=0.55.
pub fn classify(r: f64) -> VerdictStatus {
    if r < FALSE_THRESHOLD {
        VerdictStatus::False
    } else if r < UNCERTAIN_THRESHOLD {
        VerdictStatus::Uncertain
    } else {
        VerdictStatus::Verified
    }
}

pub struct RandomVoteSource {
    rng: Mutex<StdRng>,
}

impl RandomVoteSource {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }
}

#[async_trait]
impl VoteSource for RandomVoteSource {
    async fn draw(
        &self,
        _validator: &Validator,
        _claim: &ClaimSnapshot,
        _escalated: bool,
    ) -> Result<VerdictStatus, VoteSourceError> {
        let r: f64 = self.rng.lock().gen();
        Ok(classify(r))
    }
}

/// Deterministic reasoning text for a vote on `content`.
pub fn reasoning_for(status: VerdictStatus, content: &str) -> String {
    let snippet: String = content.chars().take(SNIPPET_CHARS).collect();
    match status {
        VerdictStatus::Verified => format!(
            "Multiple primary sources confirm \"{snippet}...\" is accurate. Dates and figures align with records."
        ),
        VerdictStatus::False => format!(
            "Consensus indicates \"{snippet}...\" is factually incorrect based on 2024 reports."
        ),
        VerdictStatus::Uncertain => format!(
            "Context is missing for \"{snippet}...\". Conflicting reports found in initial scan."
        ),
    }
}

pub fn reference_sources() -> Vec<String> {
    REFERENCE_SOURCES.iter().map(|s| s.to_string()).collect()
}
