//! Scoring and economy collaborators notified by the simulation.

use creep_defence_core::WaveId;
use creep_defence_system_bootstrap::PlayerConfig;
use serde::Serialize;

/// Receives kill, leak and completion notifications from the simulation.
///
/// Purchases are routed through [`ScoreSink::try_spend`]; the default
/// implementation treats every purchase as free.
pub trait ScoreSink {
    /// A creep was killed and is worth `gold`.
    fn on_kill_creep(&mut self, gold: u32);

    /// A creep leaked and deals `leak_damage` to the defender.
    fn on_miss_creep(&mut self, leak_damage: u32);

    /// The final wave of the level cleared.
    fn on_level_complete(&mut self);

    /// A wave started spawning.
    fn on_wave_started(&mut self, _wave: WaveId) {}

    /// Every creep of a wave was killed or leaked.
    fn on_wave_cleared(&mut self, _wave: WaveId) {}

    /// Reports whether a purchase of `cost` would succeed.
    fn can_afford(&self, _cost: u32) -> bool {
        true
    }

    /// Deducts `cost` for a purchase, returning whether it was paid.
    fn try_spend(&mut self, _cost: u32) -> bool {
        true
    }

    /// Returns `amount` to the player after a sale or a rejected purchase.
    fn refund(&mut self, _amount: u32) {}
}

/// Outcome of the level from the defender's point of view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    /// The level is still being played.
    Playing,
    /// Every wave cleared with the defender alive.
    Won,
    /// Leaks reduced the defender's health to zero.
    Lost,
}

/// Default score sink tracking health, gold, kills and misses.
///
/// Kills count toward the score; leaks only cost health. Both end their wave.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scoreboard {
    health: i32,
    gold: u32,
    max_gold: u32,
    infinite_gold: bool,
    kill_score: u32,
    kills: u32,
    misses: u32,
    level_complete: bool,
}

impl Scoreboard {
    /// Creates a scoreboard seeded from the level's player settings.
    #[must_use]
    pub fn new(player: &PlayerConfig) -> Self {
        Self {
            health: player.starting_health,
            gold: player.starting_gold.min(player.max_gold),
            max_gold: player.max_gold,
            infinite_gold: player.infinite_gold,
            kill_score: player.kill_score,
            kills: 0,
            misses: 0,
            level_complete: false,
        }
    }

    /// Remaining defender health.
    #[must_use]
    pub fn health(&self) -> i32 {
        self.health
    }

    /// Spendable gold; reads as the cap when gold is infinite.
    #[must_use]
    pub fn gold(&self) -> u32 {
        if self.infinite_gold {
            self.max_gold
        } else {
            self.gold
        }
    }

    /// Number of creeps killed.
    #[must_use]
    pub fn kills(&self) -> u32 {
        self.kills
    }

    /// Number of creeps that leaked.
    #[must_use]
    pub fn misses(&self) -> u32 {
        self.misses
    }

    /// Score earned from kills.
    #[must_use]
    pub fn score(&self) -> u64 {
        u64::from(self.kills) * u64::from(self.kill_score)
    }

    /// Current outcome of the level.
    #[must_use]
    pub fn status(&self) -> GameStatus {
        if self.health <= 0 {
            GameStatus::Lost
        } else if self.level_complete {
            GameStatus::Won
        } else {
            GameStatus::Playing
        }
    }

    fn deposit(&mut self, amount: u32) {
        if !self.infinite_gold {
            self.gold = self.gold.saturating_add(amount).min(self.max_gold);
        }
    }
}

impl ScoreSink for Scoreboard {
    fn on_kill_creep(&mut self, gold: u32) {
        self.kills = self.kills.saturating_add(1);
        self.deposit(gold);
    }

    fn on_miss_creep(&mut self, leak_damage: u32) {
        self.misses = self.misses.saturating_add(1);
        let damage = i32::try_from(leak_damage).unwrap_or(i32::MAX);
        self.health = self.health.saturating_sub(damage);
        if self.health <= 0 {
            log::info!("defender health depleted after {} leak(s)", self.misses);
        }
    }

    fn on_level_complete(&mut self) {
        self.level_complete = true;
        log::info!(
            "level complete with status {:?}, {} kill(s) and {} miss(es)",
            self.status(),
            self.kills,
            self.misses
        );
    }

    fn can_afford(&self, cost: u32) -> bool {
        self.infinite_gold || self.gold >= cost
    }

    fn try_spend(&mut self, cost: u32) -> bool {
        if !self.can_afford(cost) {
            return false;
        }
        if !self.infinite_gold {
            self.gold -= cost;
        }
        true
    }

    fn refund(&mut self, amount: u32) {
        self.deposit(amount);
    }
}
