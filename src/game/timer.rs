use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use super::game_phases::{MatchPhase, PhaseTrigger};

const LOG_TARGET: &str = "fact_arena::game::timer";

/// Identifies one arming of a [`PhaseTimer`]. Completion signals carrying a
/// ticket from an earlier arming are ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerTicket {
    generation: u64,
}

#[derive(Clone, Debug)]
struct Armed {
    ticket: TimerTicket,
    phase: MatchPhase,
    trigger: PhaseTrigger,
    deadline: Instant,
    fired: bool,
}

/// Single-shot phase timer.
///
/// Each [`PhaseTimer::arm`] replaces the previous timer. A timer fires at
/// most once no matter how many completion signals arrive.
#[derive(Clone, Debug, Default)]
pub struct PhaseTimer {
    armed: Option<Armed>,
    generation: u64,
}

impl PhaseTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self, phase: MatchPhase, trigger: PhaseTrigger, duration: Duration) -> TimerTicket {
        self.generation += 1;
        let ticket = TimerTicket {
            generation: self.generation,
        };
        let deadline = Instant::now() + duration;
        debug!(
            target: LOG_TARGET,
            ?phase,
            ?trigger,
            duration_ms = duration.as_millis() as u64,
            "phase timer armed"
        );
        self.armed = Some(Armed {
            ticket,
            phase,
            trigger,
            deadline,
            fired: false,
        });
        ticket
    }

    pub fn disarm(&mut self) {
        self.armed = None;
    }

    /// Deadline of the live, unfired timer.
    pub fn deadline(&self) -> Option<Instant> {
        self.armed
            .as_ref()
            .filter(|armed| !armed.fired)
            .map(|armed| armed.deadline)
    }

    pub fn phase(&self) -> Option<MatchPhase> {
        self.armed.as_ref().map(|armed| armed.phase)
    }

    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline()
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// Completion signal for `ticket`. Returns the trigger the first time
    /// only, and never for a ticket that has been replaced or disarmed.
    pub fn fire(&mut self, ticket: TimerTicket) -> Option<PhaseTrigger> {
        let armed = self.armed.as_mut()?;
        if armed.ticket != ticket || armed.fired {
            return None;
        }
        armed.fired = true;
        Some(armed.trigger)
    }

    /// Fires the live timer if its deadline has passed.
    pub fn fire_due(&mut self, now: Instant) -> Option<PhaseTrigger> {
        let ticket = self
            .armed
            .as_ref()
            .filter(|armed| now >= armed.deadline)?
            .ticket;
        self.fire(ticket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_per_arming() {
        let mut timer = PhaseTimer::new();
        let ticket = timer.arm(
            MatchPhase::Submission,
            PhaseTrigger::SubmissionTimerElapsed,
            Duration::ZERO,
        );
        assert_eq!(timer.fire(ticket), Some(PhaseTrigger::SubmissionTimerElapsed));
        assert_eq!(timer.fire(ticket), None);
        assert_eq!(timer.fire_due(Instant::now()), None);
        assert_eq!(timer.deadline(), None);
    }

    #[test]
    fn stale_tickets_are_ignored() {
        let mut timer = PhaseTimer::new();
        let old = timer.arm(
            MatchPhase::Submission,
            PhaseTrigger::SubmissionTimerElapsed,
            Duration::ZERO,
        );
        let new = timer.arm(
            MatchPhase::Dispute,
            PhaseTrigger::DisputeTimerElapsed,
            Duration::ZERO,
        );
        assert_eq!(timer.fire(old), None);
        assert_eq!(timer.fire(new), Some(PhaseTrigger::DisputeTimerElapsed));
    }

    #[test]
    fn not_due_before_the_deadline() {
        let mut timer = PhaseTimer::new();
        timer.arm(
            MatchPhase::Dispute,
            PhaseTrigger::DisputeTimerElapsed,
            Duration::from_secs(180),
        );
        let now = Instant::now();
        assert_eq!(timer.fire_due(now), None);
        assert!(timer.remaining(now).unwrap() > Duration::from_secs(179));
        assert_eq!(
            timer.fire_due(now + Duration::from_secs(180)),
            Some(PhaseTrigger::DisputeTimerElapsed)
        );
    }

    #[test]
    fn disarm_cancels_pending_fire() {
        let mut timer = PhaseTimer::new();
        let ticket = timer.arm(
            MatchPhase::Verification,
            PhaseTrigger::ClaimsProcessed,
            Duration::ZERO,
        );
        timer.disarm();
        assert_eq!(timer.fire(ticket), None);
        assert_eq!(timer.phase(), None);
    }
}
