//! Per-actor countdown timers keyed by [`TimerKey`].
//!
//! Every timer counts whole cycles. A timer registered with duration `n`
//! reports `remaining == n` until the next [`TimerRegistry::advance`], and
//! disappears after exactly `n` advances.

use std::collections::BTreeMap;

use skirmish_types::{ActorRole, TimerKey};

/// Cycles before regular food can be eaten again.
pub const FOOD_COOLDOWN: u32 = 3;

/// Cycles before a combo food can be eaten again.
pub const KARAMBWAN_COOLDOWN: u32 = 2;

/// Cycles before another potion dose can be drunk.
pub const POTION_COOLDOWN: u32 = 3;

/// Cycles before vengeance can be recast.
pub const VENGEANCE_COOLDOWN: u32 = 50;

/// Immunity that follows a freeze, on top of the freeze itself.
pub const FREEZE_IMMUNITY_EXTRA: u32 = 5;

/// Countdown timers for a single actor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimerRegistry {
    timers: BTreeMap<TimerKey, u32>,
}

impl TimerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) `key` with `duration` cycles.
    ///
    /// A duration of zero is ignored and leaves a running timer untouched.
    pub fn register(&mut self, key: TimerKey, duration: u32) {
        if duration == 0 {
            return;
        }
        self.timers.insert(key, duration);
    }

    /// Whether `key` is running.
    pub fn has(&self, key: TimerKey) -> bool {
        self.timers.contains_key(&key)
    }

    /// Cycles left on `key`, zero when it is not running.
    pub fn remaining(&self, key: TimerKey) -> u32 {
        self.timers.get(&key).copied().unwrap_or(0)
    }

    /// Count every timer down by one cycle, dropping those that expire.
    pub fn advance(&mut self) {
        self.timers.retain(|_, remaining| {
            *remaining = remaining.saturating_sub(1);
            *remaining > 0
        });
    }

    /// Stop every timer.
    pub fn clear(&mut self) {
        self.timers.clear();
    }

    /// Number of running timers.
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    /// Whether no timer is running.
    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}

/// The timer registries of both sides of the engagement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimerBook {
    agent: TimerRegistry,
    opponent: TimerRegistry,
}

impl TimerBook {
    /// Create a book with no running timers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry for `role`.
    pub const fn get(&self, role: ActorRole) -> &TimerRegistry {
        match role {
            ActorRole::Agent => &self.agent,
            ActorRole::Opponent => &self.opponent,
        }
    }

    /// Mutable registry for `role`.
    pub const fn get_mut(&mut self, role: ActorRole) -> &mut TimerRegistry {
        match role {
            ActorRole::Agent => &mut self.agent,
            ActorRole::Opponent => &mut self.opponent,
        }
    }

    /// Advance both registries by one cycle.
    pub fn advance(&mut self) {
        self.agent.advance();
        self.opponent.advance();
    }

    /// Stop every timer of `role`.
    pub fn clear(&mut self, role: ActorRole) {
        self.get_mut(role).clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_expires_after_exactly_its_duration() {
        let mut timers = TimerRegistry::new();
        timers.register(TimerKey::Freeze, 5);
        assert_eq!(timers.remaining(TimerKey::Freeze), 5);
        for _ in 0..4 {
            timers.advance();
        }
        assert!(timers.has(TimerKey::Freeze));
        assert_eq!(timers.remaining(TimerKey::Freeze), 1);
        timers.advance();
        assert!(!timers.has(TimerKey::Freeze));
        assert_eq!(timers.remaining(TimerKey::Freeze), 0);
    }

    #[test]
    fn absent_timer_reads_as_zero() {
        let timers = TimerRegistry::new();
        assert!(!timers.has(TimerKey::PotionCooldown));
        assert_eq!(timers.remaining(TimerKey::PotionCooldown), 0);
    }

    #[test]
    fn register_overwrites_running_timer() {
        let mut timers = TimerRegistry::new();
        timers.register(TimerKey::AttackCooldown, 2);
        timers.advance();
        timers.register(TimerKey::AttackCooldown, 6);
        assert_eq!(timers.remaining(TimerKey::AttackCooldown), 6);
    }

    #[test]
    fn zero_duration_register_keeps_running_timer() {
        let mut timers = TimerRegistry::new();
        timers.register(TimerKey::Freeze, 5);
        timers.register(TimerKey::Freeze, 0);
        assert_eq!(timers.remaining(TimerKey::Freeze), 5);

        timers.register(TimerKey::FoodCooldown, 0);
        assert!(!timers.has(TimerKey::FoodCooldown));
        assert_eq!(timers.len(), 1);
    }

    #[test]
    fn advancing_empty_registry_is_a_no_op() {
        let mut timers = TimerRegistry::new();
        timers.advance();
        assert!(timers.is_empty());
    }

    #[test]
    fn book_clears_one_side_only() {
        let mut book = TimerBook::new();
        book.get_mut(ActorRole::Agent).register(TimerKey::FoodCooldown, FOOD_COOLDOWN);
        book.get_mut(ActorRole::Opponent).register(TimerKey::Freeze, 10);
        book.clear(ActorRole::Opponent);
        assert!(book.get(ActorRole::Opponent).is_empty());
        assert_eq!(book.get(ActorRole::Agent).remaining(TimerKey::FoodCooldown), 3);
        book.advance();
        assert_eq!(book.get(ActorRole::Agent).remaining(TimerKey::FoodCooldown), 2);
    }
}
