//! 💰 Bankroll Manager - Balance, stake sizing and loss progression
//!
//! D'Alembert progression on a dozen bet (pays 2:1):
//! - win: balance += stake (net), level -= 1 (floor 1)
//! - loss: balance -= stake, level += 1 unless the ball landed on 0
//!
//! Stake = level × unit in whole currency units, where
//! unit = max(base_unit, 1% of balance), then clamped to [unit, 5% of balance]
//! and capped at balance. The ceilings are floored to whole units.

use std::collections::VecDeque;

use log::{debug, info};
use serde::Serialize;

use crate::config::BankrollConfig;
use crate::spin::Spin;

/// Settled ACTIVE-phase bet
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRecord {
    pub spin: u8,
    pub won: bool,
    /// Signed balance change
    pub amount: f64,
    pub balance_after: f64,
    /// Stake for the next round
    pub bet_after: f64,
    pub timestamp_ms: i64,
}

/// Read-only view of the bankroll
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BankrollState {
    pub balance: f64,
    pub unit_size: f64,
    pub bet_level: u32,
    pub current_bet: f64,
    pub consecutive_wins: u32,
    pub consecutive_losses: u32,
}

/// Bankroll manager
pub struct BankrollManager {
    config: BankrollConfig,
    balance: f64,
    unit_size: f64,
    bet_level: u32,
    current_bet: f64,
    consecutive_wins: u32,
    consecutive_losses: u32,
    results: VecDeque<ResultRecord>,
}

impl BankrollManager {
    /// Create a bankroll holding `starting_balance`
    pub fn new(config: BankrollConfig, starting_balance: f64) -> Self {
        info!("💰 Bankroll initialized:");
        info!("   Balance: {:.0}", starting_balance);
        info!("   Unit: max({:.0}, {:.1}% of balance)",
              config.base_unit, config.unit_fraction * 100.0);
        info!("   Max bet: {:.1}% of balance", config.max_bet_fraction * 100.0);

        let mut manager = Self {
            unit_size: config.base_unit,
            current_bet: config.base_unit,
            config,
            balance: starting_balance,
            bet_level: 1,
            consecutive_wins: 0,
            consecutive_losses: 0,
            results: VecDeque::new(),
        };
        manager.unit_size = manager.compute_unit();
        manager
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn current_bet(&self) -> f64 {
        self.current_bet
    }

    pub fn bet_level(&self) -> u32 {
        self.bet_level
    }

    pub fn consecutive_wins(&self) -> u32 {
        self.consecutive_wins
    }

    pub fn consecutive_losses(&self) -> u32 {
        self.consecutive_losses
    }

    pub fn state(&self) -> BankrollState {
        BankrollState {
            balance: self.balance,
            unit_size: self.unit_size,
            bet_level: self.bet_level,
            current_bet: self.current_bet,
            consecutive_wins: self.consecutive_wins,
            consecutive_losses: self.consecutive_losses,
        }
    }

    /// ACTIVE results, oldest first
    pub fn results(&self) -> impl Iterator<Item = &ResultRecord> {
        self.results.iter()
    }

    pub fn last_result(&self) -> Option<&ResultRecord> {
        self.results.back()
    }

    /// Win rate of the recorded ACTIVE results in percent, 0 when empty
    pub fn accuracy(&self) -> f64 {
        if self.results.is_empty() {
            return 0.0;
        }
        let wins = self.results.iter().filter(|r| r.won).count();
        wins as f64 / self.results.len() as f64 * 100.0
    }

    /// Track a paper outcome: streaks only, no money moves
    pub fn record_streak(&mut self, won: bool) {
        if won {
            self.consecutive_wins += 1;
            self.consecutive_losses = 0;
        } else {
            self.consecutive_losses += 1;
            self.consecutive_wins = 0;
        }
    }

    /// Settle the current stake against `spin` and size the next one
    pub fn settle(&mut self, won: bool, spin: Spin) -> ResultRecord {
        let stake = self.current_bet;

        let amount = if won {
            self.balance += stake;
            self.bet_level = self.bet_level.saturating_sub(1).max(1);
            stake
        } else {
            self.balance -= stake;
            // House number losses do not escalate the progression
            if !spin.is_zero() {
                self.bet_level += 1;
            }
            -stake
        };
        self.record_streak(won);
        self.recompute_stake();

        let record = ResultRecord {
            spin: spin.number(),
            won,
            amount,
            balance_after: self.balance,
            bet_after: self.current_bet,
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
        };

        self.results.push_back(record.clone());
        while self.results.len() > self.config.result_history_cap {
            self.results.pop_front();
        }

        info!("{} {} on {}: {:+.0} → balance {:.0}, next bet {:.0} (level {})",
              if won { "✅" } else { "❌" },
              if won { "Win" } else { "Loss" },
              spin, amount, self.balance, self.current_bet, self.bet_level);

        record
    }

    /// Back to level 1 with a freshly sized stake (entering ACTIVE)
    pub fn reset_progression(&mut self) {
        self.bet_level = 1;
        self.recompute_stake();
    }

    pub fn reset_streaks(&mut self) {
        self.consecutive_wins = 0;
        self.consecutive_losses = 0;
    }

    pub fn clear_loss_streak(&mut self) {
        self.consecutive_losses = 0;
    }

    /// Fresh session state holding `balance`
    pub fn reinitialize(&mut self, balance: f64) {
        self.balance = balance;
        self.bet_level = 1;
        self.unit_size = self.compute_unit();
        self.current_bet = self.config.base_unit;
        self.reset_streaks();
        self.results.clear();
    }

    /// Recompute unit and stake from the current balance and level
    pub fn recompute_stake(&mut self) {
        self.unit_size = self.compute_unit();

        let raw = self.bet_level as f64 * self.unit_size;
        let ceiling = self.balance * self.config.max_bet_fraction;

        // Floor first, ceilings last: the ceilings win when they conflict.
        // Rounding happens before the ceilings so it can never push past them.
        let bet = raw
            .round()
            .max(self.unit_size)
            .min(ceiling.floor())
            .min(self.balance.floor())
            .max(0.0);

        debug!("Stake sizing: level={}, unit={:.2}, raw={:.2}, ceiling={:.2}, final={:.0}",
               self.bet_level, self.unit_size, raw, ceiling, bet);

        self.current_bet = bet;
    }

    /// Whole currency units, never below the base unit
    fn compute_unit(&self) -> f64 {
        (self.balance * self.config.unit_fraction)
            .round()
            .max(self.config.base_unit)
    }
}
