//! Tactical mode selection.
//!
//! Picks the planner's time budget and risk posture from material balance
//! and the recent hit rate. Only the search budget is affected; deduction
//! and ledger handling never depend on the mode.

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Advantage beyond which the controller leaves `Balanced`.
const ADVANTAGE_THRESHOLD: f64 = 0.25;
/// Sustained hit rate (over a full window) that counts as a hot streak.
const HOT_HIT_RATE: f64 = 0.4;
/// Sustained hit rate that counts as a cold streak.
const COLD_HIT_RATE: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TacticalMode {
    Aggressive,
    #[default]
    Balanced,
    Cautious,
}

impl fmt::Display for TacticalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TacticalMode::Aggressive => "aggressive",
            TacticalMode::Balanced => "balanced",
            TacticalMode::Cautious => "cautious",
        };
        f.write_str(s)
    }
}

/// Planner time budgets per mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeBudgets {
    pub aggressive: Duration,
    pub balanced: Duration,
    pub cautious: Duration,
}

impl Default for ModeBudgets {
    fn default() -> Self {
        ModeBudgets {
            aggressive: Duration::from_millis(120),
            balanced: Duration::from_millis(250),
            cautious: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TacticalController {
    mode: TacticalMode,
    window: usize,
    recent: VecDeque<bool>,
}

impl TacticalController {
    pub fn new(window: usize) -> Self {
        TacticalController {
            mode: TacticalMode::Balanced,
            window: window.max(1),
            recent: VecDeque::with_capacity(window.max(1)),
        }
    }

    pub fn mode(&self) -> TacticalMode {
        self.mode
    }

    /// Records one of the engine's own shot outcomes.
    pub fn record_shot(&mut self, hit: bool) {
        if self.recent.len() == self.window {
            self.recent.pop_front();
        }
        self.recent.push_back(hit);
    }

    /// Hit rate over the recorded window, or `None` before the first shot.
    pub fn hit_rate(&self) -> Option<f64> {
        if self.recent.is_empty() {
            return None;
        }
        let hits = self.recent.iter().filter(|&&h| h).count();
        Some(hits as f64 / self.recent.len() as f64)
    }

    /// Recomputes the mode from ships remaining on each side.
    pub fn update(
        &mut self,
        own_left: usize,
        own_total: usize,
        opponent_left: usize,
        opponent_total: usize,
    ) -> TacticalMode {
        let ratio = |left: usize, total: usize| {
            if total == 0 {
                1.0
            } else {
                left as f64 / total as f64
            }
        };
        let advantage = ratio(own_left, own_total) - ratio(opponent_left, opponent_total);
        let sustained = self.recent.len() == self.window;
        let rate = self.hit_rate().unwrap_or(0.0);

        self.mode = if advantage > ADVANTAGE_THRESHOLD || (sustained && rate >= HOT_HIT_RATE) {
            TacticalMode::Aggressive
        } else if advantage < -ADVANTAGE_THRESHOLD || (sustained && rate <= COLD_HIT_RATE) {
            TacticalMode::Cautious
        } else {
            TacticalMode::Balanced
        };
        self.mode
    }

    /// Planner time budget for the current mode.
    pub fn movetime(&self, budgets: &ModeBudgets) -> Duration {
        match self.mode {
            TacticalMode::Aggressive => budgets.aggressive,
            TacticalMode::Balanced => budgets.balanced,
            TacticalMode::Cautious => budgets.cautious,
        }
    }

    pub fn is_cautious(&self) -> bool {
        self.mode == TacticalMode::Cautious
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_balanced() {
        let mut tc = TacticalController::new(10);
        assert_eq!(tc.mode(), TacticalMode::Balanced);
        assert_eq!(tc.update(5, 5, 5, 5), TacticalMode::Balanced);
        assert_eq!(tc.hit_rate(), None);
    }

    #[test]
    fn material_advantage_drives_mode() {
        let mut tc = TacticalController::new(10);
        assert_eq!(tc.update(5, 5, 2, 5), TacticalMode::Aggressive);
        assert_eq!(tc.update(2, 5, 5, 5), TacticalMode::Cautious);
        assert!(tc.is_cautious());
    }

    #[test]
    fn sustained_hit_rate_needs_a_full_window() {
        let mut tc = TacticalController::new(4);
        for _ in 0..3 {
            tc.record_shot(true);
        }
        assert_eq!(tc.update(5, 5, 5, 5), TacticalMode::Balanced);
        tc.record_shot(true);
        assert_eq!(tc.update(5, 5, 5, 5), TacticalMode::Aggressive);
        for _ in 0..4 {
            tc.record_shot(false);
        }
        assert_eq!(tc.hit_rate(), Some(0.0));
        assert_eq!(tc.update(5, 5, 5, 5), TacticalMode::Cautious);
    }

    #[test]
    fn movetime_follows_mode() {
        let budgets = ModeBudgets::default();
        let mut tc = TacticalController::new(10);
        tc.update(5, 5, 1, 5);
        assert_eq!(tc.movetime(&budgets), Duration::from_millis(120));
        tc.update(1, 5, 5, 5);
        assert_eq!(tc.movetime(&budgets), Duration::from_millis(500));
    }
}
