//! Countdown, deferred timers, and the end-of-match decision.
//!
//! Timers are explicit entries stamped with a monotonic match-generation id.
//! A restart bumps the generation, so entries scheduled by a previous match
//! are rejected when they come due instead of mutating the new one.

use tracing::debug;

use crate::game::combatant::Combatant;
use crate::game::PlayerSlot;

pub const COUNTDOWN_START: u8 = 3;
/// Seconds between countdown steps
pub const COUNTDOWN_STEP: f64 = 1.0;
/// Pause between the countdown reaching zero and play starting
pub const MATCH_START_DELAY: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    CountdownAdvance,
    MatchStart,
    BannerHide,
}

#[derive(Debug, Clone, Copy)]
struct TimerEntry {
    fire_at: f64,
    generation: u64,
    kind: TimerKind,
}

/// Owns the deferred timers and the exactly-once end decision
#[derive(Debug, Default)]
pub struct MatchLifecycleController {
    timers: Vec<TimerEntry>,
    generation: u64,
    ended: bool,
}

impl MatchLifecycleController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Invalidate every pending timer and archive the previous match
    pub fn reset(&mut self) {
        self.generation += 1;
        self.ended = false;
        debug!(generation = self.generation, "lifecycle reset");
    }

    /// Queue a timer against the current generation
    pub fn schedule(&mut self, kind: TimerKind, fire_at: f64) {
        self.timers.push(TimerEntry {
            fire_at,
            generation: self.generation,
            kind,
        });
    }

    /// Pop every timer due at `now`, in schedule order. Entries stamped with
    /// a stale generation are dropped without firing.
    pub fn poll(&mut self, now: f64) -> Vec<TimerKind> {
        let current = self.generation;
        let mut fired = Vec::new();
        self.timers.retain(|entry| {
            if entry.generation != current {
                return false;
            }
            if entry.fire_at <= now {
                fired.push(entry.kind);
                return false;
            }
            true
        });
        fired
    }

    pub fn pending(&self) -> usize {
        self.timers
            .iter()
            .filter(|e| e.generation == self.generation)
            .count()
    }

    pub fn ended(&self) -> bool {
        self.ended
    }

    /// Win check, run once per tick after all updates. Returns `None` while
    /// the match should continue, otherwise the winner slot (or `None`
    /// inside for a double KO). Fires at most once per generation.
    pub fn resolve_end(&mut self, combatants: &[Combatant]) -> Option<Option<PlayerSlot>> {
        if self.ended {
            return None;
        }
        let mut survivors = 0;
        let mut last_alive = None;
        for (index, c) in combatants.iter().enumerate() {
            if c.is_active() {
                survivors += 1;
                last_alive = PlayerSlot::from_index(index);
            }
        }
        if survivors > 1 {
            return None;
        }
        self.ended = true;
        let winner = if survivors == 1 { last_alive } else { None };
        debug!(?winner, "match decided");
        Some(winner)
    }
}
