//! 🛡️ Session Risk Guardrails
//!
//! Checked once per spin after evaluation:
//! - stop-loss: balance at or below the floor forces PROTECTION
//! - profit target: balance at or above the target is signalled to the caller,
//!   no phase change

use log::{info, warn};
use serde::Serialize;

use super::phase::PhaseController;
use crate::config::RiskConfig;

/// Threshold crossed on the latest check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskSignal {
    StopLossHit,
    ProfitTargetReached,
}

/// Risk manager
pub struct RiskManager {
    config: RiskConfig,
    profit_signalled: bool,
}

impl RiskManager {
    pub fn new(config: RiskConfig) -> Self {
        info!("🛡️ Risk guardrails:");
        info!("   Stop-loss: {:.0}", config.stop_loss);
        info!("   Profit target: {:.0}", config.profit_target);

        Self {
            config,
            profit_signalled: false,
        }
    }

    /// Check `balance` against both thresholds, forcing PROTECTION on stop-loss
    pub fn check(&mut self, balance: f64, phases: &mut PhaseController) -> Option<RiskSignal> {
        if balance <= self.config.stop_loss {
            phases.force_protection(&format!(
                "balance {:.0} at or below stop-loss {:.0}",
                balance, self.config.stop_loss
            ));
            return Some(RiskSignal::StopLossHit);
        }

        if balance >= self.config.profit_target {
            if !self.profit_signalled {
                warn!("🎯 Profit target reached: balance {:.0} ≥ {:.0}",
                      balance, self.config.profit_target);
                self.profit_signalled = true;
            }
            return Some(RiskSignal::ProfitTargetReached);
        }

        self.profit_signalled = false;
        None
    }

    pub fn reset(&mut self) {
        self.profit_signalled = false;
    }
}
