use super::types::{Verdict, VerdictStatus, Vote};

/// Tallies `votes` into a verdict.
///
/// The status with the most votes wins; ties go to the status declared first
/// in [`VerdictStatus::TALLY_ORDER`]. Confidence is the winning share rounded
/// half-up to a whole percentage. Reasoning and sources are taken from the
/// first vote that agrees with the winner.
pub fn tally(votes: &[Vote]) -> Verdict {
    if votes.is_empty() {
        return Verdict {
            status: VerdictStatus::Uncertain,
            confidence: 0,
            reasoning: "No votes were cast.".to_string(),
            sources: Vec::new(),
        };
    }

    let mut counts = [0usize; 3];
    for vote in votes {
        counts[vote.status.tally_index()] += 1;
    }

    let mut winner = VerdictStatus::TALLY_ORDER[0];
    for status in VerdictStatus::TALLY_ORDER.iter().skip(1) {
        if counts[status.tally_index()] > counts[winner.tally_index()] {
            winner = *status;
        }
    }

    let winning = counts[winner.tally_index()];
    let total = votes.len();
    let confidence = (200 * winning + total) / (2 * total);

    let exemplar = votes
        .iter()
        .find(|vote| vote.status == winner)
        .unwrap_or(&votes[0]);

    Verdict {
        status: winner,
        confidence: confidence.min(100) as u8,
        reasoning: exemplar.reasoning.clone(),
        sources: exemplar.sources.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vote(id: &str, status: VerdictStatus) -> Vote {
        Vote {
            validator_id: id.to_string(),
            status,
            reasoning: format!("{id} says {status}"),
            sources: vec![format!("{id}.example")],
            degraded: false,
        }
    }

    #[test]
    fn two_of_three_verified_is_sixty_seven_percent() {
        let votes = [
            vote("v1", VerdictStatus::Verified),
            vote("v2", VerdictStatus::Verified),
            vote("v3", VerdictStatus::False),
        ];
        let verdict = tally(&votes);
        assert_eq!(verdict.status, VerdictStatus::Verified);
        assert_eq!(verdict.confidence, 67);
        assert_eq!(verdict.reasoning, "v1 says VERIFIED");
    }

    #[test]
    fn three_way_tie_resolves_to_verified() {
        let votes = [
            vote("v1", VerdictStatus::Uncertain),
            vote("v2", VerdictStatus::False),
            vote("v3", VerdictStatus::Verified),
        ];
        let verdict = tally(&votes);
        assert_eq!(verdict.status, VerdictStatus::Verified);
        assert_eq!(verdict.confidence, 33);
        assert_eq!(verdict.sources, vec!["v3.example".to_string()]);
    }

    #[test]
    fn false_beats_uncertain_on_a_tie() {
        let votes = [
            vote("v1", VerdictStatus::Uncertain),
            vote("v2", VerdictStatus::False),
            vote("v3", VerdictStatus::Uncertain),
            vote("v4", VerdictStatus::False),
            vote("v5", VerdictStatus::Verified),
        ];
        let verdict = tally(&votes);
        assert_eq!(verdict.status, VerdictStatus::False);
        assert_eq!(verdict.confidence, 40);
    }

    #[test]
    fn unanimous_round_is_fully_confident() {
        let votes = [
            vote("v1", VerdictStatus::False),
            vote("v2", VerdictStatus::False),
            vote("v3", VerdictStatus::False),
        ];
        let verdict = tally(&votes);
        assert_eq!(verdict.status, VerdictStatus::False);
        assert_eq!(verdict.confidence, 100);
    }

    #[test]
    fn empty_round_is_uncertain() {
        let verdict = tally(&[]);
        assert_eq!(verdict.status, VerdictStatus::Uncertain);
        assert_eq!(verdict.confidence, 0);
    }
}
