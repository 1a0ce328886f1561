//! Match configuration.
//!
//! Durations are (de)serialized as whole milliseconds so configs can be
//! written by hand as JSON.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::scoring::Points;

pub const DEFAULT_SUBMISSION_MINUTES: u32 = 5;
pub const DEFAULT_DISPUTE_DURATION: Duration = Duration::from_secs(3 * 60);
pub const DEFAULT_EMPTY_VERIFICATION_GRACE: Duration = Duration::from_secs(1);
pub const DEFAULT_DISPUTE_STAKE: Points = 50;
pub const DEFAULT_DISPUTE_PAYOUT_BPS: u32 = 15_000;
pub const DEFAULT_MAX_CLAIM_CHARS: usize = 200;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid match config: {0}")]
    Invalid(&'static str),
}

pub(crate) mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// Simulated latency between consensus events.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    #[serde(with = "duration_ms")]
    pub init: Duration,
    #[serde(with = "duration_ms")]
    pub validator_min: Duration,
    #[serde(with = "duration_ms")]
    pub validator_max: Duration,
    #[serde(with = "duration_ms")]
    pub settle: Duration,
    #[serde(with = "duration_ms")]
    pub expand_announce: Duration,
    #[serde(with = "duration_ms")]
    pub expansion_validator: Duration,
}

impl PacingConfig {
    pub fn instant() -> Self {
        Self {
            init: Duration::ZERO,
            validator_min: Duration::ZERO,
            validator_max: Duration::ZERO,
            settle: Duration::ZERO,
            expand_announce: Duration::ZERO,
            expansion_validator: Duration::ZERO,
        }
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            init: Duration::from_millis(400),
            validator_min: Duration::from_millis(200),
            validator_max: Duration::from_millis(500),
            settle: Duration::from_millis(200),
            expand_announce: Duration::from_millis(1_000),
            expansion_validator: Duration::from_millis(1_500),
        }
    }
}

/// Bounds on how long a round waits for its validators.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundPolicy {
    /// Per-attempt limit for a single validator.
    #[serde(with = "duration_ms")]
    pub vote_timeout: Duration,
    pub max_attempts: u32,
    /// Cap on a whole round. Validators not heard from in time vote Uncertain.
    #[serde(with = "duration_ms")]
    pub round_deadline: Duration,
}

impl Default for RoundPolicy {
    fn default() -> Self {
        Self {
            vote_timeout: Duration::from_secs(10),
            max_attempts: 2,
            round_deadline: Duration::from_secs(30),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    #[serde(with = "duration_ms")]
    pub dispute_duration: Duration,
    #[serde(with = "duration_ms")]
    pub empty_verification_grace: Duration,
    pub dispute_stake: Points,
    pub dispute_payout_bps: u32,
    pub max_claim_chars: usize,
    pub max_players: usize,
    pub max_bots: usize,
    pub event_buffer: usize,
    pub command_buffer: usize,
    pub bots_enabled: bool,
    pub pacing: PacingConfig,
    pub round_policy: RoundPolicy,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            dispute_duration: DEFAULT_DISPUTE_DURATION,
            empty_verification_grace: DEFAULT_EMPTY_VERIFICATION_GRACE,
            dispute_stake: DEFAULT_DISPUTE_STAKE,
            dispute_payout_bps: DEFAULT_DISPUTE_PAYOUT_BPS,
            max_claim_chars: DEFAULT_MAX_CLAIM_CHARS,
            max_players: 8,
            max_bots: 5,
            event_buffer: 256,
            command_buffer: 64,
            bots_enabled: true,
            pacing: PacingConfig::default(),
            round_policy: RoundPolicy::default(),
        }
    }
}

pub fn validate_match_config(cfg: &MatchConfig) -> Result<(), ConfigError> {
    if cfg.dispute_duration.is_zero() {
        return Err(ConfigError::Invalid("dispute_duration must be positive"));
    }
    if cfg.dispute_stake <= 0 {
        return Err(ConfigError::Invalid("dispute_stake must be positive"));
    }
    if cfg.dispute_payout_bps < 10_000 {
        return Err(ConfigError::Invalid(
            "dispute_payout_bps must return at least the stake",
        ));
    }
    if cfg.max_claim_chars == 0 {
        return Err(ConfigError::Invalid("max_claim_chars must be positive"));
    }
    if cfg.max_players == 0 {
        return Err(ConfigError::Invalid("max_players must be at least 1"));
    }
    if cfg.max_bots > cfg.max_players {
        return Err(ConfigError::Invalid("max_bots cannot exceed max_players"));
    }
    if cfg.event_buffer == 0 || cfg.command_buffer == 0 {
        return Err(ConfigError::Invalid("channel buffers must be positive"));
    }
    if cfg.pacing.validator_min > cfg.pacing.validator_max {
        return Err(ConfigError::Invalid(
            "pacing.validator_min cannot exceed pacing.validator_max",
        ));
    }
    if cfg.round_policy.max_attempts == 0 {
        return Err(ConfigError::Invalid("round_policy.max_attempts must be at least 1"));
    }
    if cfg.round_policy.vote_timeout.is_zero() || cfg.round_policy.round_deadline.is_zero() {
        return Err(ConfigError::Invalid("round_policy timeouts must be positive"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(validate_match_config(&MatchConfig::default()), Ok(()));
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let cfg: MatchConfig =
            serde_json::from_str(r#"{"dispute_stake": 20, "pacing": {"init": 0}}"#).unwrap();
        assert_eq!(cfg.dispute_stake, 20);
        assert_eq!(cfg.pacing.init, Duration::ZERO);
        assert_eq!(cfg.pacing.settle, Duration::from_millis(200));
        assert_eq!(cfg.dispute_duration, DEFAULT_DISPUTE_DURATION);
    }

    #[test]
    fn payout_below_stake_is_rejected() {
        let cfg = MatchConfig {
            dispute_payout_bps: 9_000,
            ..MatchConfig::default()
        };
        assert!(validate_match_config(&cfg).is_err());
    }

    #[test]
    fn zero_attempts_is_rejected() {
        let mut cfg = MatchConfig::default();
        cfg.round_policy.max_attempts = 0;
        assert_eq!(
            validate_match_config(&cfg),
            Err(ConfigError::Invalid("round_policy.max_attempts must be at least 1"))
        );
    }
}
