//! 🎯 Phase State Machine - Gates real stakes
//!
//! CALIBRATION → GHOST → ACTIVE → PROTECTION → GHOST → ...
//!
//! - CALIBRATION: collecting the first full wheel cycle of spins
//! - GHOST: predictions are paper-traded until accuracy passes probation
//! - ACTIVE: predictions are staked with real balance
//! - PROTECTION: stakes suspended after a loss streak or stop-loss hit
//!
//! There is no terminal state. `PhaseController` is the only writer of `Phase`.

use log::{debug, info, warn};
use serde::Serialize;

use crate::config::PhaseConfig;

/// Current operating phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Calibration,
    Ghost,
    Active,
    Protection,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Calibration => "CALIBRATION",
            Phase::Ghost => "GHOST",
            Phase::Active => "ACTIVE",
            Phase::Protection => "PROTECTION",
        }
    }

    /// Whether predictions in this phase are backed by real stakes
    pub fn stakes_real(&self) -> bool {
        matches!(self, Phase::Active)
    }
}

/// Paper-trade tally for the current probation window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GhostStats {
    pub wins: u32,
    pub total: u32,
}

impl GhostStats {
    pub fn record(&mut self, won: bool) {
        self.total += 1;
        if won {
            self.wins += 1;
        }
    }

    /// Win rate in percent, 0 when nothing has been scored
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.wins as f64 / self.total as f64 * 100.0
        }
    }

    /// Whether the tally reaches `min_accuracy` percent
    ///
    /// Compared as `wins × 100 ≥ min × total` so exact boundaries such as
    /// 57 / 100 against 57% are not lost to division rounding.
    pub fn meets(&self, min_accuracy: f64) -> bool {
        self.wins as f64 * 100.0 >= min_accuracy * self.total as f64
    }

    pub fn reset(&mut self) {
        *self = GhostStats::default();
    }
}

/// Counters the transition pass reads but does not own
#[derive(Debug, Clone, Copy, Default)]
pub struct TransitionInputs {
    pub spins_recorded: usize,
    pub consecutive_wins: u32,
    pub consecutive_losses: u32,
}

/// Side effects the caller must apply after a transition pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransitionEffects {
    /// Entered ACTIVE: reset progression and size the first stake
    pub entered_active: bool,
    /// Left PROTECTION for GHOST: clear the loss streak
    pub left_protection: bool,
}

/// Phase controller
pub struct PhaseController {
    config: PhaseConfig,
    phase: Phase,
    ghost: GhostStats,
}

impl PhaseController {
    pub fn new(config: PhaseConfig) -> Self {
        info!("🎯 Phase controller initialized:");
        info!("   Calibration: {} spins", config.calibration_target);
        info!("   Ghost probation: {} predictions at ≥{:.0}%",
              config.ghost_target, config.min_accuracy);
        info!("   Protection after {} consecutive losses", config.max_consecutive_losses);

        Self {
            config,
            phase: Phase::Calibration,
            ghost: GhostStats::default(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn ghost_stats(&self) -> GhostStats {
        self.ghost
    }

    /// Score one paper-traded prediction. Only counted while in GHOST.
    pub fn record_ghost(&mut self, won: bool) {
        if self.phase == Phase::Ghost {
            self.ghost.record(won);
            debug!("👻 Ghost {}: {}/{}", if won { "win" } else { "loss" },
                   self.ghost.wins, self.ghost.total);
        }
    }

    /// Run the ordered transition pass for a newly recorded spin
    ///
    /// Checks run in a fixed order and each one sees the phase left by the
    /// previous check.
    pub fn evaluate(&mut self, inputs: TransitionInputs) -> TransitionEffects {
        let mut effects = TransitionEffects::default();

        // 1. CALIBRATION → GHOST
        if self.phase == Phase::Calibration
            && inputs.spins_recorded >= self.config.calibration_target
        {
            self.ghost.reset();
            self.enter(Phase::Ghost, "calibration complete");
        }

        // 2. GHOST → ACTIVE (or retry probation)
        if self.phase == Phase::Ghost && self.ghost.total >= self.config.ghost_target {
            let accuracy = self.ghost.accuracy();
            if self.ghost.meets(self.config.min_accuracy) {
                self.ghost.reset();
                self.enter(Phase::Active, &format!("ghost accuracy {:.1}%", accuracy));
                effects.entered_active = true;
            } else {
                info!("👻 Ghost probation failed: {:.1}% < {:.0}% ({} / {}), retrying",
                      accuracy, self.config.min_accuracy, self.ghost.wins, self.ghost.total);
                self.ghost.reset();
            }
        }

        // 3. ACTIVE → PROTECTION
        // Streaks are reset on ACTIVE entry, so a same-pass entry never trips this.
        if self.phase == Phase::Active
            && !effects.entered_active
            && inputs.consecutive_losses >= self.config.max_consecutive_losses
        {
            self.enter(
                Phase::Protection,
                &format!("{} consecutive losses", inputs.consecutive_losses),
            );
        }

        // 4. PROTECTION → GHOST
        if self.phase == Phase::Protection && inputs.consecutive_wins > 0 {
            self.ghost.reset();
            self.enter(Phase::Ghost, "win recorded in protection");
            effects.left_protection = true;
        }

        effects
    }

    /// Force PROTECTION regardless of streaks (stop-loss)
    pub fn force_protection(&mut self, reason: &str) {
        if self.phase != Phase::Protection {
            warn!("🛡️ Forcing PROTECTION: {}", reason);
            self.phase = Phase::Protection;
        }
    }

    /// Back to CALIBRATION with an empty probation window
    pub fn reset(&mut self) {
        self.phase = Phase::Calibration;
        self.ghost.reset();
    }

    fn enter(&mut self, next: Phase, reason: &str) {
        info!("🔀 Phase {} → {} ({})", self.phase.as_str(), next.as_str(), reason);
        self.phase = next;
    }
}
