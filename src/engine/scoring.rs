//! Point values for verified claims and dispute payouts.
//!
//! Every computation here is integer arithmetic so identical inputs always
//! produce identical scores, regardless of platform float behaviour.

use serde::{Deserialize, Serialize};

pub type Points = i64;

pub const MIN_DECLARED_CONFIDENCE: u8 = 50;
pub const MAX_DECLARED_CONFIDENCE: u8 = 100;

/// Percentage applied when a claim carries a backing source (+10%).
const SOURCE_BONUS_PCT: i64 = 110;
const NO_SOURCE_PCT: i64 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClaimType {
    #[serde(rename = "Quick Fact")]
    QuickFact,
    #[serde(rename = "Comparative")]
    Comparative,
    #[serde(rename = "Trend")]
    Trend,
    #[serde(rename = "Predictive")]
    Predictive,
}

impl ClaimType {
    pub const ALL: [ClaimType; 4] = [
        ClaimType::QuickFact,
        ClaimType::Comparative,
        ClaimType::Trend,
        ClaimType::Predictive,
    ];

    pub fn base_score(&self) -> Points {
        match self {
            ClaimType::QuickFact => 10,
            ClaimType::Comparative => 20,
            ClaimType::Trend => 25,
            ClaimType::Predictive => 30,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ClaimType::QuickFact => "Quick Fact",
            ClaimType::Comparative => "Comparative",
            ClaimType::Trend => "Trend",
            ClaimType::Predictive => "Predictive",
        }
    }
}

impl Default for ClaimType {
    fn default() -> Self {
        ClaimType::QuickFact
    }
}

/// Player-skill weighting in basis points; `AccuracyRate::NEUTRAL` is x1.0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccuracyRate(pub u32);

impl AccuracyRate {
    pub const NEUTRAL: AccuracyRate = AccuracyRate(10_000);

    pub fn from_bps(bps: u32) -> Self {
        Self(bps)
    }
}

impl Default for AccuracyRate {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// Integer division rounding half-up. `denominator` must be positive.
pub(crate) fn div_round_half_up(numerator: i64, denominator: i64) -> i64 {
    debug_assert!(denominator > 0);
    (2 * numerator + denominator).div_euclid(2 * denominator)
}

/// Score of a verified claim.
///
/// `base * (0.5 + (confidence - 50) / 50) * (1.1 if sourced) * accuracy`, rounded
/// half-up. The confidence multiplier simplifies to `(confidence - 25) / 50`.
/// Confidence is clamped to `[50, 100]`; callers validate it before submission.
pub fn score(
    claim_type: ClaimType,
    declared_confidence: u8,
    has_source: bool,
    accuracy: AccuracyRate,
) -> Points {
    let confidence = declared_confidence.clamp(MIN_DECLARED_CONFIDENCE, MAX_DECLARED_CONFIDENCE);
    let source_pct = if has_source {
        SOURCE_BONUS_PCT
    } else {
        NO_SOURCE_PCT
    };

    let numerator =
        claim_type.base_score() * (i64::from(confidence) - 25) * source_pct * i64::from(accuracy.0);
    let denominator = 50 * 100 * i64::from(AccuracyRate::NEUTRAL.0);
    div_round_half_up(numerator, denominator)
}

/// Score with the neutral accuracy rate.
pub fn base_claim_score(claim_type: ClaimType, declared_confidence: u8, has_source: bool) -> Points {
    score(claim_type, declared_confidence, has_source, AccuracyRate::NEUTRAL)
}

/// Amount credited back to a disputer whose dispute is upheld.
pub fn dispute_payout(stake: Points, payout_bps: u32) -> Points {
    div_round_half_up(stake * i64::from(payout_bps), 10_000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_scores_match_the_rules_table() {
        assert_eq!(base_claim_score(ClaimType::QuickFact, 50, false), 5);
        assert_eq!(base_claim_score(ClaimType::QuickFact, 100, false), 15);
        assert_eq!(base_claim_score(ClaimType::Predictive, 100, true), 50);
        assert_eq!(base_claim_score(ClaimType::Comparative, 75, false), 20);
        assert_eq!(base_claim_score(ClaimType::Trend, 75, true), 28);
    }

    #[test]
    fn score_is_monotone_in_confidence() {
        for claim_type in ClaimType::ALL {
            for has_source in [false, true] {
                let mut previous = Points::MIN;
                for confidence in MIN_DECLARED_CONFIDENCE..=MAX_DECLARED_CONFIDENCE {
                    let value = base_claim_score(claim_type, confidence, has_source);
                    assert!(
                        value >= previous,
                        "{claim_type:?} source={has_source} dropped at {confidence}"
                    );
                    assert_eq!(value, base_claim_score(claim_type, confidence, has_source));
                    previous = value;
                }
            }
        }
    }

    #[test]
    fn accuracy_rate_scales_the_result() {
        assert_eq!(
            score(ClaimType::Comparative, 100, false, AccuracyRate::from_bps(8_000)),
            24
        );
        assert_eq!(
            score(ClaimType::Comparative, 100, false, AccuracyRate::from_bps(13_000)),
            39
        );
    }

    #[test]
    fn dispute_payout_is_one_and_a_half_stake() {
        assert_eq!(dispute_payout(50, 15_000), 75);
        assert_eq!(dispute_payout(15, 15_000), 23);
    }

    #[test]
    fn claim_type_serializes_with_display_labels() {
        let json = serde_json::to_string(&ClaimType::QuickFact).unwrap();
        assert_eq!(json, "\"Quick Fact\"");
        let parsed: ClaimType = serde_json::from_str("\"Predictive\"").unwrap();
        assert_eq!(parsed, ClaimType::Predictive);
    }
}
