//! Engagement-scoped combat statistics for both actors.
//!
//! Cumulative counters cover the whole engagement. Recent statistics use a
//! bounded window over the most recent events of each kind, so "recent"
//! means the last `window_capacity` attacks (or prayers, or defenses), not
//! the last N cycles.

use std::collections::VecDeque;

use skirmish_types::{ActorRole, CombatStyle};

/// Default number of events kept in each recent window.
pub const DEFAULT_WINDOW_CAPACITY: usize = 5;

/// Lower clamp of [`damage_scale`].
pub const DAMAGE_SCALE_MIN: f64 = 0.5;

/// Upper clamp of [`damage_scale`].
pub const DAMAGE_SCALE_MAX: f64 = 2.0;

/// Hitpoints a per-cycle damage difference is divided by for the reward.
pub const REWARD_HEALTH_SCALE: f64 = 99.0;

/// Ratio of damage dealt to damage received, smoothed by one and clamped
/// to `[DAMAGE_SCALE_MIN, DAMAGE_SCALE_MAX]`.
///
/// Always finite and within range for non-negative inputs.
pub fn damage_scale(dealt: f64, received: f64) -> f64 {
    let scale = (dealt.max(0.0) + 1.0) / (received.max(0.0) + 1.0);
    if scale.is_finite() {
        scale.clamp(DAMAGE_SCALE_MIN, DAMAGE_SCALE_MAX)
    } else {
        DAMAGE_SCALE_MAX
    }
}

fn ratio(count: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 / total as f64).clamp(0.0, 1.0)
}

/// Fixed-capacity FIFO of the most recent values.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RecentWindow<T> {
    capacity: usize,
    values: VecDeque<T>,
}

impl<T: Copy> RecentWindow<T> {
    fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            values: VecDeque::with_capacity(capacity),
        }
    }

    fn push(&mut self, value: T) {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    fn count(&self, pred: impl Fn(T) -> bool) -> u64 {
        self.values.iter().filter(|v| pred(**v)).count() as u64
    }

    const fn capacity(&self) -> u64 {
        self.capacity as u64
    }

    fn len(&self) -> u64 {
        self.values.len() as u64
    }

    fn clear(&mut self) {
        self.values.clear();
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct StyleCounts([u64; 3]);

impl StyleCounts {
    fn bump(&mut self, style: CombatStyle) {
        if let Some(slot) = self.0.get_mut(style.ordinal()) {
            *slot = slot.saturating_add(1);
        }
    }

    fn get(&self, style: CombatStyle) -> u64 {
        self.0.get(style.ordinal()).copied().unwrap_or(0)
    }

    fn total(&self) -> u64 {
        self.0.iter().sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
struct ActorHistory {
    attacks: StyleCounts,
    recent_attacks: RecentWindow<CombatStyle>,
    prayers: StyleCounts,
    recent_prayers: RecentWindow<CombatStyle>,
    defenses: StyleCounts,
    correct_defenses: StyleCounts,
    recent_defenses: RecentWindow<(CombatStyle, bool)>,
    damage_dealt: u64,
    damage_received: u64,
    cycle_dealt: u64,
    cycle_received: u64,
}

impl ActorHistory {
    fn new(capacity: usize) -> Self {
        Self {
            attacks: StyleCounts::default(),
            recent_attacks: RecentWindow::new(capacity),
            prayers: StyleCounts::default(),
            recent_prayers: RecentWindow::new(capacity),
            defenses: StyleCounts::default(),
            correct_defenses: StyleCounts::default(),
            recent_defenses: RecentWindow::new(capacity),
            damage_dealt: 0,
            damage_received: 0,
            cycle_dealt: 0,
            cycle_received: 0,
        }
    }

    fn reset(&mut self) {
        self.attacks = StyleCounts::default();
        self.recent_attacks.clear();
        self.prayers = StyleCounts::default();
        self.recent_prayers.clear();
        self.defenses = StyleCounts::default();
        self.correct_defenses = StyleCounts::default();
        self.recent_defenses.clear();
        self.damage_dealt = 0;
        self.damage_received = 0;
        self.cycle_dealt = 0;
        self.cycle_received = 0;
    }
}

/// Attack, prayer, defense, and damage statistics of one engagement.
#[derive(Debug, Clone, PartialEq)]
pub struct CombatHistory {
    agent: ActorHistory,
    opponent: ActorHistory,
}

impl Default for CombatHistory {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_CAPACITY)
    }
}

impl CombatHistory {
    /// Create an empty history whose recent windows hold `window_capacity`
    /// events (at least one).
    pub fn new(window_capacity: usize) -> Self {
        Self {
            agent: ActorHistory::new(window_capacity),
            opponent: ActorHistory::new(window_capacity),
        }
    }

    const fn actor(&self, role: ActorRole) -> &ActorHistory {
        match role {
            ActorRole::Agent => &self.agent,
            ActorRole::Opponent => &self.opponent,
        }
    }

    const fn actor_mut(&mut self, role: ActorRole) -> &mut ActorHistory {
        match role {
            ActorRole::Agent => &mut self.agent,
            ActorRole::Opponent => &mut self.opponent,
        }
    }

    /// Record an attack of `style` by `source` that dealt `amount` to `target`.
    ///
    /// Zero-damage hits still count as attacks of that style.
    pub fn record_hit(
        &mut self,
        source: ActorRole,
        target: ActorRole,
        style: CombatStyle,
        amount: u32,
    ) {
        let amount = u64::from(amount);
        let attacker = self.actor_mut(source);
        attacker.attacks.bump(style);
        attacker.recent_attacks.push(style);
        attacker.damage_dealt = attacker.damage_dealt.saturating_add(amount);
        attacker.cycle_dealt = attacker.cycle_dealt.saturating_add(amount);

        let defender = self.actor_mut(target);
        defender.damage_received = defender.damage_received.saturating_add(amount);
        defender.cycle_received = defender.cycle_received.saturating_add(amount);
    }

    /// Record whether `defender` was protecting against the `style` it was hit with.
    pub fn record_defense(&mut self, defender: ActorRole, style: CombatStyle, was_correct: bool) {
        let history = self.actor_mut(defender);
        history.defenses.bump(style);
        if was_correct {
            history.correct_defenses.bump(style);
        }
        history.recent_defenses.push((style, was_correct));
    }

    /// Record that `actor` was seen protecting against `style`.
    pub fn record_prayer(&mut self, actor: ActorRole, style: CombatStyle) {
        let history = self.actor_mut(actor);
        history.prayers.bump(style);
        history.recent_prayers.push(style);
    }

    /// Share of `actor`'s attacks over the engagement that used `style`.
    pub fn style_ratio(&self, actor: ActorRole, style: CombatStyle) -> f64 {
        let attacks = &self.actor(actor).attacks;
        ratio(attacks.get(style), attacks.total())
    }

    /// Share of the recent window taken by `style`.
    ///
    /// Divides by the window capacity, so a half-filled window never
    /// reports a ratio of one.
    pub fn recent_style_ratio(&self, actor: ActorRole, style: CombatStyle) -> f64 {
        let window = &self.actor(actor).recent_attacks;
        ratio(window.count(|s| s == style), window.capacity())
    }

    /// Share of `actor`'s observed protection prayers that covered `style`.
    pub fn prayer_ratio(&self, actor: ActorRole, style: CombatStyle) -> f64 {
        let prayers = &self.actor(actor).prayers;
        ratio(prayers.get(style), prayers.total())
    }

    /// Share of the recent prayer window that covered `style`.
    pub fn recent_prayer_ratio(&self, actor: ActorRole, style: CombatStyle) -> f64 {
        let window = &self.actor(actor).recent_prayers;
        ratio(window.count(|s| s == style), window.capacity())
    }

    /// Share of hits on `defender` that it was correctly protecting against.
    pub fn defense_correct_ratio(&self, defender: ActorRole) -> f64 {
        let history = self.actor(defender);
        ratio(history.correct_defenses.total(), history.defenses.total())
    }

    /// Share of `style` hits on `defender` that it was protecting against.
    pub fn style_defense_correct_ratio(&self, defender: ActorRole, style: CombatStyle) -> f64 {
        let history = self.actor(defender);
        ratio(history.correct_defenses.get(style), history.defenses.get(style))
    }

    /// [`CombatHistory::defense_correct_ratio`] over the recent window.
    pub fn recent_defense_correct_ratio(&self, defender: ActorRole) -> f64 {
        let window = &self.actor(defender).recent_defenses;
        ratio(window.count(|(_, correct)| correct), window.len())
    }

    /// [`CombatHistory::style_defense_correct_ratio`] over the recent window.
    ///
    /// Divides by the `style` hits still in the window.
    pub fn recent_style_defense_correct_ratio(
        &self,
        defender: ActorRole,
        style: CombatStyle,
    ) -> f64 {
        let window = &self.actor(defender).recent_defenses;
        ratio(
            window.count(|(s, correct)| s == style && correct),
            window.count(|(s, _)| s == style),
        )
    }

    /// Share of `attacker`'s hits that landed off-prayer.
    pub fn hit_correct_ratio(&self, attacker: ActorRole) -> f64 {
        let defender = self.actor(attacker.other());
        let total = defender.defenses.total();
        ratio(total.saturating_sub(defender.correct_defenses.total()), total)
    }

    /// [`CombatHistory::hit_correct_ratio`] over the recent window.
    pub fn recent_hit_correct_ratio(&self, attacker: ActorRole) -> f64 {
        let window = &self.actor(attacker.other()).recent_defenses;
        ratio(window.count(|(_, correct)| !correct), window.len())
    }

    /// Total attacks recorded for `actor`.
    pub fn attack_count(&self, actor: ActorRole) -> u64 {
        self.actor(actor).attacks.total()
    }

    /// Total damage dealt by `actor` this engagement.
    pub fn damage_dealt(&self, actor: ActorRole) -> u64 {
        self.actor(actor).damage_dealt
    }

    /// [`damage_scale`] of the agent over the whole engagement.
    pub fn damage_dealt_scale(&self) -> f64 {
        damage_scale(self.agent.damage_dealt as f64, self.agent.damage_received as f64)
    }

    /// [`damage_scale`] of the agent for the current cycle only.
    pub fn cycle_damage_dealt_scale(&self) -> f64 {
        damage_scale(self.agent.cycle_dealt as f64, self.agent.cycle_received as f64)
    }

    /// Damage exchanged this cycle from the agent's point of view, in
    /// units of a full health pool.
    pub fn cycle_reward(&self) -> f64 {
        (self.agent.cycle_dealt as f64 - self.agent.cycle_received as f64) / REWARD_HEALTH_SCALE
    }

    /// Close the current cycle's damage accounting.
    pub fn on_cycle_end(&mut self) {
        for history in [&mut self.agent, &mut self.opponent] {
            history.cycle_dealt = 0;
            history.cycle_received = 0;
        }
    }

    /// Forget everything, keeping the window capacity.
    pub fn reset(&mut self) {
        self.agent.reset();
        self.opponent.reset();
    }
}
