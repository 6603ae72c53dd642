// Bot vitals and lifecycle rules. Terminal outcomes are sticky: the first one wins.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotStatus {
    // Playing the spawn animation; hit detection is still off.
    Spawning,
    Alive,
    Dead,
    Missed,
    // Reached the chase target.
    Reached,
    // Torn down by its owner without a terminal outcome.
    Removed,
}

impl BotStatus {
    pub fn is_alive(self) -> bool {
        self == BotStatus::Alive
    }

    pub fn is_finished(self) -> bool {
        !matches!(self, BotStatus::Spawning | BotStatus::Alive)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Dead,
    Missed,
    Reached,
}

impl From<Outcome> for BotStatus {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Dead => BotStatus::Dead,
            Outcome::Missed => BotStatus::Missed,
            Outcome::Reached => BotStatus::Reached,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BotVitals {
    hp: i32,
    ttl: Option<Duration>,
    status: BotStatus,
}

impl BotVitals {
    // A zero ttl means the bot never expires.
    pub fn new(hp: i32, ttl: Option<Duration>) -> Self {
        Self {
            hp: hp.max(0),
            ttl: ttl.filter(|t| !t.is_zero()),
            status: BotStatus::Spawning,
        }
    }

    pub fn hp(&self) -> i32 {
        self.hp
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    pub fn status(&self) -> BotStatus {
        self.status
    }

    /// Spawning -> Alive. Returns false if the bot was finished during the spawn.
    pub fn activate(&mut self) -> bool {
        if self.status != BotStatus::Spawning {
            return false;
        }
        self.status = BotStatus::Alive;
        true
    }

    /// Resolves values injected while spawning: zero hp dies, zero ttl misses.
    pub fn settle(&mut self) -> Option<Outcome> {
        if self.hp == 0 {
            return self.finish(Outcome::Dead);
        }
        if self.ttl == Some(Duration::ZERO) {
            return self.finish(Outcome::Missed);
        }
        None
    }

    /// Damage only counts while hit detection is on.
    pub fn apply_damage(&mut self, amount: i32) -> Option<Outcome> {
        if !self.status.is_alive() {
            return None;
        }
        self.hp = self.hp.saturating_sub(amount.max(0)).max(0);
        if self.hp == 0 {
            return self.finish(Outcome::Dead);
        }
        None
    }

    pub fn set_hp(&mut self, hp: i32) -> Option<Outcome> {
        if self.status.is_finished() {
            return None;
        }
        self.hp = hp.max(0);
        if self.hp == 0 {
            return self.finish(Outcome::Dead);
        }
        None
    }

    pub fn set_ttl(&mut self, ttl: Duration) -> Option<Outcome> {
        if self.status.is_finished() {
            return None;
        }
        self.ttl = Some(ttl);
        if ttl.is_zero() {
            return self.finish(Outcome::Missed);
        }
        None
    }

    pub fn expire(&mut self) -> Option<Outcome> {
        self.finish(Outcome::Missed)
    }

    pub fn reach_target(&mut self) -> Option<Outcome> {
        self.finish(Outcome::Reached)
    }

    /// Owner teardown; returns false if the bot was already finished.
    pub fn remove(&mut self) -> bool {
        if self.status.is_finished() {
            return false;
        }
        self.status = BotStatus::Removed;
        true
    }

    fn finish(&mut self, outcome: Outcome) -> Option<Outcome> {
        // Spawning bots are only finished through `settle` once activated.
        if self.status != BotStatus::Alive {
            return None;
        }
        self.status = outcome.into();
        Some(outcome)
    }
}
