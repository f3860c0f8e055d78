//! Timer bookkeeping for the Timer Subsystem (§4.6). This module only tracks
//! *what should be running* and for how long — the actual scheduling is a
//! cancellable `tokio::time::sleep` task in the server crate's room engine
//! that posts a timer-fired message back into the room's own inbox once it
//! elapses. A monotonically increasing generation counter per family lets a
//! superseded timer's late fire recognize itself as stale and no-op.

use crate::config::RoomConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The timer families a room can have running. `Turn`, `ClaimGlobal`,
/// `NextRound`, and `Rematch` are mutually exclusive — starting one always
/// supersedes whichever of the four was previously running, since exactly one
/// of them makes sense for the phase the round is currently in.
///
/// `RoundCap` is a hard per-round wall clock, so it cannot share that slot:
/// it must keep running underneath many turn/claim-global restarts over the
/// course of a single round. It gets its own independent slot alongside
/// `AiThink` and `EmptyRoom` rather than the shared family one — a deliberate
/// narrowing of §4.6's "mutually exclusive" family for this one member, since
/// a round-cap that a turn timer silently cancelled would never fire (see
/// `DESIGN.md`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerKind {
    Turn,
    ClaimGlobal,
    NextRound,
    Rematch,
    RoundCap,
    AiThink,
    EmptyRoom,
}

impl TimerKind {
    pub fn is_family_exclusive(self) -> bool {
        matches!(self, TimerKind::Turn | TimerKind::ClaimGlobal | TimerKind::NextRound | TimerKind::Rematch)
    }

    /// The configured duration for this timer kind, read off `config`. The
    /// empty-room watchdog has two different durations depending on whether
    /// a match is still in progress when the room empties; callers that need
    /// that distinction start it with an explicit `Duration` instead of going
    /// through this method.
    pub fn duration(self, config: &RoomConfig) -> Duration {
        match self {
            TimerKind::Turn => Duration::from_secs(config.player_turn_action_timeout_secs),
            TimerKind::ClaimGlobal => Duration::from_secs(config.claim_decision_timeout_secs),
            TimerKind::NextRound => Duration::from_secs(config.next_round_countdown_secs),
            TimerKind::Rematch => Duration::from_secs(config.rematch_vote_timeout_secs),
            TimerKind::RoundCap => Duration::from_secs(config.max_round_duration_secs),
            TimerKind::AiThink => Duration::from_millis(config.ai_think_min_ms),
            TimerKind::EmptyRoom => Duration::from_secs(config.empty_room_active_timeout_secs),
        }
    }
}

/// A snapshot of a running timer, exposed to clients via the broadcast
/// projection as an active-timer descriptor (kind + duration).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveTimer {
    pub kind: TimerKind,
    pub generation: u64,
    pub duration: Duration,
}

/// Per-room timer tracking: the one family-exclusive slot plus the two
/// independent ones, each tagged with a generation that's bumped on every
/// restart.
#[derive(Debug, Clone, Default)]
pub struct TimerRegistry {
    family: Option<ActiveTimer>,
    ai_think: Option<ActiveTimer>,
    empty_room: Option<ActiveTimer>,
    next_generation: u64,
}

impl TimerRegistry {
    /// Records that `kind` is now running for `duration`, returning the
    /// generation the caller should tag its scheduled fire with.
    pub fn start(&mut self, kind: TimerKind, duration: Duration) -> u64 {
        self.next_generation += 1;
        let generation = self.next_generation;
        let timer = ActiveTimer { kind, generation, duration };

        if kind.is_family_exclusive() {
            self.family = Some(timer);
        } else if kind == TimerKind::AiThink {
            self.ai_think = Some(timer);
        } else {
            self.empty_room = Some(timer);
        }

        generation
    }

    pub fn clear(&mut self, kind: TimerKind) {
        if kind.is_family_exclusive() {
            self.family = None;
        } else if kind == TimerKind::AiThink {
            self.ai_think = None;
        } else {
            self.empty_room = None;
        }
    }

    /// True if `generation` is still the live one for `kind` — lets a posted
    /// timer-fired message recognize a superseded firing and no-op.
    pub fn is_current(&self, kind: TimerKind, generation: u64) -> bool {
        let slot = if kind.is_family_exclusive() {
            &self.family
        } else if kind == TimerKind::AiThink {
            &self.ai_think
        } else {
            &self.empty_room
        };

        matches!(slot, Some(timer) if timer.kind == kind && timer.generation == generation)
    }

    pub fn active_family(&self) -> Option<ActiveTimer> {
        self.family
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starting_a_family_timer_supersedes_the_previous_one() {
        let mut registry = TimerRegistry::default();
        let first = registry.start(TimerKind::Turn, Duration::from_secs(20));
        assert!(registry.is_current(TimerKind::Turn, first));

        let second = registry.start(TimerKind::ClaimGlobal, Duration::from_secs(10));
        assert!(!registry.is_current(TimerKind::Turn, first));
        assert!(registry.is_current(TimerKind::ClaimGlobal, second));
    }

    #[test]
    fn ai_think_and_empty_room_are_independent_of_the_family_slot() {
        let mut registry = TimerRegistry::default();
        let turn = registry.start(TimerKind::Turn, Duration::from_secs(20));
        let think = registry.start(TimerKind::AiThink, Duration::from_millis(800));

        assert!(registry.is_current(TimerKind::Turn, turn));
        assert!(registry.is_current(TimerKind::AiThink, think));

        registry.clear(TimerKind::AiThink);
        assert!(registry.is_current(TimerKind::Turn, turn));
        assert!(!registry.is_current(TimerKind::AiThink, think));
    }
}
