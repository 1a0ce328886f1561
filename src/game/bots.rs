//! Computer-controlled players.
//!
//! Bots join from a fixed set of profiles and, during Submission, wake on
//! their own jittered cadence to maybe submit a claim from the bank.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tokio::time::Instant;

use crate::engine::scoring::ClaimType;

use super::types::{Category, ClaimDraft, Difficulty, Player, PlayerId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BotProfile {
    pub id: &'static str,
    pub username: &'static str,
    pub avatar: &'static str,
    pub style: &'static str,
}

pub static BOT_PROFILES: [BotProfile; 5] = [
    BotProfile { id: "bot_1", username: "FactChecker_9000", avatar: "🤖", style: "Precise" },
    BotProfile { id: "bot_2", username: "TruthSeeker", avatar: "🦊", style: "Aggressive" },
    BotProfile { id: "bot_3", username: "DebunkK1ng", avatar: "🦅", style: "Skeptical" },
    BotProfile { id: "bot_4", username: "WikiWarrior", avatar: "📚", style: "Academic" },
    BotProfile { id: "bot_5", username: "SimplyCorrect", avatar: "💎", style: "Casual" },
];

impl BotProfile {
    pub fn player_id(&self) -> PlayerId {
        PlayerId::from(self.id)
    }

    /// Bots are always ready and never host.
    pub fn to_player(&self) -> Player {
        Player {
            id: self.player_id(),
            username: self.username.to_string(),
            avatar: self.avatar.to_string(),
            is_bot: true,
            is_host: false,
            score: 0,
            is_ready: true,
        }
    }
}

type Bank = [&'static str; 3];

static TECH_EASY: Bank = [
    "Apple released the first iPhone in 2007.",
    "Microsoft owns GitHub.",
    "Bitcoin was created by Satoshi Nakamoto.",
];
static TECH_MEDIUM: Bank = [
    "The first computer bug was an actual moth found in the Harvard Mark II.",
    "Python was named after the comedy group Monty Python, not the snake.",
    "NFTs use blockchain technology to certify unique ownership of digital assets.",
];
static TECH_HARD: Bank = [
    "The P versus NP problem is one of the seven Millennium Prize Problems.",
    "Quantum computers use qubits which can exist in multiple states simultaneously due to superposition.",
    "DeepBlue defeated Garry Kasparov in 1997 using alpha-beta pruning algorithms.",
];
static SCIENCE_EASY: Bank = [
    "Water boils at 100 degrees Celsius at sea level.",
    "The Earth revolves around the Sun.",
    "DNA stands for Deoxyribonucleic acid.",
];
static SCIENCE_MEDIUM: Bank = [
    "Light travels faster than sound, which is why we see lightning before thunder.",
    "Neutron stars are so dense that a teaspoon would weigh 6 billion tons.",
    "Bananas are radioactive due to their potassium content.",
];
static SCIENCE_HARD: Bank = [
    "The Heisenberg Uncertainty Principle states you cannot know both position and momentum precisely.",
    "Mitochondrial Eve is the most recent common ancestor of all living humans in unbroken female line.",
    "Dark energy accounts for approximately 68% of the total energy in the observable universe.",
];
static HISTORY_EASY: Bank = [
    "The Titanic sank in 1912.",
    "World War II ended in 1945.",
    "Neil Armstrong was the first man on the moon.",
];
static HISTORY_MEDIUM: Bank = [
    "Cleopatra lived closer in time to the Moon landing than to the construction of the Great Pyramid.",
    "The shortest war in history lasted 38 minutes between Britain and Zanzibar.",
    "Oxford University is older than the Aztec Empire.",
];
static HISTORY_HARD: Bank = [
    "The Great Fire of London in 1666 ended the Great Plague outbreak.",
    "Ada Lovelace is considered the first computer programmer for her work on the Analytical Engine.",
    "The Treaty of Westphalia in 1648 established the concept of state sovereignty.",
];

/// Claims bots draw from. Categories without a bank use Tech News.
pub fn claim_bank(category: Category, difficulty: Difficulty) -> &'static [&'static str] {
    use Difficulty::*;
    match (category, difficulty) {
        (Category::Science, Easy) => &SCIENCE_EASY,
        (Category::Science, Medium) => &SCIENCE_MEDIUM,
        (Category::Science, Hard) => &SCIENCE_HARD,
        (Category::History, Easy) => &HISTORY_EASY,
        (Category::History, Medium) => &HISTORY_MEDIUM,
        (Category::History, Hard) => &HISTORY_HARD,
        (_, Easy) => &TECH_EASY,
        (_, Medium) => &TECH_MEDIUM,
        (_, Hard) => &TECH_HARD,
    }
}

/// Randomness behind bot behaviour: wake cadence, whether to submit, and what.
pub struct BotPlanner {
    rng: StdRng,
    min_interval: Duration,
    max_interval: Duration,
    submit_probability: f64,
}

impl BotPlanner {
    pub const MIN_INTERVAL: Duration = Duration::from_secs(5);
    pub const MAX_INTERVAL: Duration = Duration::from_secs(15);
    pub const SUBMIT_PROBABILITY: f64 = 0.7;

    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            rng,
            min_interval: Self::MIN_INTERVAL,
            max_interval: Self::MAX_INTERVAL,
            submit_probability: Self::SUBMIT_PROBABILITY,
        }
    }

    pub fn next_wake(&mut self) -> Duration {
        let spread = (self.max_interval - self.min_interval).as_millis() as u64;
        self.min_interval + Duration::from_millis(self.rng.gen_range(0..=spread))
    }

    /// A claim for this wake-up, or `None` if the bot sits this one out.
    pub fn decide(&mut self, category: Category, difficulty: Difficulty) -> Option<ClaimDraft> {
        if !self.rng.gen_bool(self.submit_probability) {
            return None;
        }
        let content = claim_bank(category, difficulty).choose(&mut self.rng)?;
        let confidence = self.rng.gen_range(70..=99);
        Some(ClaimDraft::new(*content, confidence).with_type(ClaimType::QuickFact))
    }
}

/// Next wake-up instant of every bot taking part in the current Submission phase.
#[derive(Debug, Default)]
pub struct BotSchedule {
    wakes: Vec<(PlayerId, Instant)>,
}

impl BotSchedule {
    pub fn start(&mut self, bots: impl IntoIterator<Item = PlayerId>, planner: &mut BotPlanner, now: Instant) {
        self.wakes = bots
            .into_iter()
            .map(|id| (id, now + planner.next_wake()))
            .collect();
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.wakes.iter().map(|(_, at)| *at).min()
    }

    /// Bots whose wake-up has come, each rescheduled for its next one.
    pub fn due(&mut self, planner: &mut BotPlanner, now: Instant) -> Vec<PlayerId> {
        let mut due = Vec::new();
        for (id, at) in self.wakes.iter_mut() {
            if *at <= now {
                due.push(id.clone());
                *at = now + planner.next_wake();
            }
        }
        due
    }

    pub fn clear(&mut self) {
        self.wakes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbanked_categories_fall_back_to_tech_news() {
        assert_eq!(
            claim_bank(Category::Sports, Difficulty::Hard),
            claim_bank(Category::TechNews, Difficulty::Hard)
        );
        assert_eq!(
            claim_bank(Category::History, Difficulty::Easy)[0],
            "The Titanic sank in 1912."
        );
    }

    #[test]
    fn wake_intervals_stay_in_range() {
        let mut planner = BotPlanner::seeded(11);
        for _ in 0..200 {
            let wake = planner.next_wake();
            assert!(wake >= BotPlanner::MIN_INTERVAL && wake <= BotPlanner::MAX_INTERVAL);
        }
    }

    #[test]
    fn bot_claims_are_confident_quick_facts_from_the_bank() {
        let mut planner = BotPlanner::seeded(5);
        let bank = claim_bank(Category::Science, Difficulty::Medium);
        let drafts: Vec<_> = (0..100)
            .filter_map(|_| planner.decide(Category::Science, Difficulty::Medium))
            .collect();
        assert!(!drafts.is_empty() && drafts.len() < 100);
        for draft in drafts {
            assert!(bank.contains(&draft.content.as_str()));
            assert!((70..=99).contains(&draft.declared_confidence));
            assert_eq!(draft.claim_type, ClaimType::QuickFact);
            assert_eq!(draft.source_url, None);
        }
    }

    #[test]
    fn schedule_wakes_each_bot_and_reschedules_it() {
        let mut planner = BotPlanner::seeded(2);
        let mut schedule = BotSchedule::default();
        let start = Instant::now();
        schedule.start(
            BOT_PROFILES.iter().take(2).map(BotProfile::player_id),
            &mut planner,
            start,
        );
        assert!(schedule.due(&mut planner, start).is_empty());

        let later = start + BotPlanner::MAX_INTERVAL;
        let due = schedule.due(&mut planner, later);
        assert_eq!(due, vec![PlayerId::from("bot_1"), PlayerId::from("bot_2")]);
        assert!(schedule.next_deadline().unwrap() >= later + BotPlanner::MIN_INTERVAL);

        schedule.clear();
        assert_eq!(schedule.next_deadline(), None);
    }

    #[test]
    fn bot_players_are_ready_and_not_host() {
        let player = BOT_PROFILES[3].to_player();
        assert_eq!(player.id, PlayerId::from("bot_4"));
        assert!(player.is_bot && player.is_ready && !player.is_host);
    }
}
