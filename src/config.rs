//! Configuration management for the dozen engine
//!
//! Every value has a built-in default so the library can be used without any
//! environment. `Config::from_env()` layers environment variables (and an
//! optional .env file) on top of those defaults.

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::decision_engine::PredictionStrategy;

/// Complete configuration for one engine session
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub phase: PhaseConfig,
    pub prediction: PredictionConfig,
    pub bankroll: BankrollConfig,
    pub risk: RiskConfig,
    pub logging: LoggingConfig,
}

/// Phase state machine thresholds
#[derive(Debug, Clone)]
pub struct PhaseConfig {
    /// Spins recorded before leaving CALIBRATION
    pub calibration_target: usize,
    /// Ghost predictions scored per probation window
    pub ghost_target: u32,
    /// Ghost accuracy (percent) required to go ACTIVE
    pub min_accuracy: f64,
    /// Consecutive ACTIVE losses that trigger PROTECTION
    pub max_consecutive_losses: u32,
}

impl Default for PhaseConfig {
    fn default() -> Self {
        Self {
            calibration_target: 37,
            ghost_target: 10,
            min_accuracy: 40.0,
            max_consecutive_losses: 3,
        }
    }
}

/// Predictor window and weights
#[derive(Debug, Clone)]
pub struct PredictionConfig {
    pub strategy: PredictionStrategy,
    /// Spins read by the weighted scorer (one full wheel cycle)
    pub analysis_window: usize,
    /// Spins required before any prediction is emitted
    pub min_history: usize,
    pub dozen_weight: f64,
    pub delay_weight: f64,
    pub deviation_weight: f64,
    /// Spins read by the lowest-count strategy
    pub lowest_count_window: usize,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            strategy: PredictionStrategy::Weighted,
            analysis_window: 37,
            min_history: 10,
            dozen_weight: 15.0,
            delay_weight: 3.0,
            deviation_weight: 30.0,
            lowest_count_window: 30,
        }
    }
}

/// Stake sizing
#[derive(Debug, Clone)]
pub struct BankrollConfig {
    pub starting_balance: f64,
    /// Minimum unit size in currency units
    pub base_unit: f64,
    /// Unit size as a fraction of balance (0.01 = 1%)
    pub unit_fraction: f64,
    /// Stake ceiling as a fraction of balance (0.05 = 5%)
    pub max_bet_fraction: f64,
    /// ACTIVE results kept for accuracy reporting
    pub result_history_cap: usize,
}

impl Default for BankrollConfig {
    fn default() -> Self {
        Self {
            starting_balance: 10_000.0,
            base_unit: 100.0,
            unit_fraction: 0.01,
            max_bet_fraction: 0.05,
            result_history_cap: 50,
        }
    }
}

/// Session-wide balance thresholds
#[derive(Debug, Clone)]
pub struct RiskConfig {
    pub stop_loss: f64,
    pub profit_target: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            stop_loss: 5_000.0,
            profit_target: 15_000.0,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// CSV audit log of processed spins, disabled when `None`
    pub spin_log_path: Option<PathBuf>,
    /// Log level used when RUST_LOG is unset (error, warn, info, debug, trace)
    pub log_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            spin_log_path: None,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Reads a .env file from the working directory if present. Missing
    /// variables fall back to defaults; present but malformed ones are errors.
    pub fn from_env() -> Result<Self> {
        let _ = dotenv::dotenv();

        let phase = PhaseConfig::default();
        let prediction = PredictionConfig::default();
        let bankroll = BankrollConfig::default();
        let risk = RiskConfig::default();

        let strategy = match env::var("PREDICTION_STRATEGY") {
            Ok(raw) => PredictionStrategy::from_str(&raw)
                .map_err(anyhow::Error::msg)
                .context("Invalid PREDICTION_STRATEGY value")?,
            Err(_) => prediction.strategy,
        };

        let spin_log_path = get_env_string("SPIN_LOG_PATH", "")?;

        Ok(Config {
            phase: PhaseConfig {
                calibration_target: get_env("CALIBRATION_TARGET", phase.calibration_target)?,
                ghost_target: get_env("GHOST_TARGET", phase.ghost_target)?,
                min_accuracy: get_env("MIN_ACCURACY", phase.min_accuracy)?,
                max_consecutive_losses: get_env("MAX_CONSECUTIVE_LOSSES", phase.max_consecutive_losses)?,
            },
            prediction: PredictionConfig {
                strategy,
                analysis_window: get_env("ANALYSIS_WINDOW", prediction.analysis_window)?,
                min_history: get_env("MIN_HISTORY", prediction.min_history)?,
                dozen_weight: get_env("DOZEN_WEIGHT", prediction.dozen_weight)?,
                delay_weight: get_env("DELAY_WEIGHT", prediction.delay_weight)?,
                deviation_weight: get_env("DEVIATION_WEIGHT", prediction.deviation_weight)?,
                lowest_count_window: get_env("LOWEST_COUNT_WINDOW", prediction.lowest_count_window)?,
            },
            bankroll: BankrollConfig {
                starting_balance: get_env("STARTING_BALANCE", bankroll.starting_balance)?,
                base_unit: get_env("BASE_UNIT", bankroll.base_unit)?,
                unit_fraction: get_env("UNIT_FRACTION", bankroll.unit_fraction)?,
                max_bet_fraction: get_env("MAX_BET_FRACTION", bankroll.max_bet_fraction)?,
                result_history_cap: get_env("RESULT_HISTORY_CAP", bankroll.result_history_cap)?,
            },
            risk: RiskConfig {
                stop_loss: get_env("STOP_LOSS", risk.stop_loss)?,
                profit_target: get_env("PROFIT_TARGET", risk.profit_target)?,
            },
            logging: LoggingConfig {
                spin_log_path: if spin_log_path.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(spin_log_path))
                },
                log_level: get_env_string("LOG_LEVEL", "info")?,
            },
        })
    }

    /// Validate configuration values are within acceptable ranges
    pub fn validate(&self) -> Result<()> {
        // Phases
        if self.phase.calibration_target == 0 {
            anyhow::bail!("CALIBRATION_TARGET must be > 0");
        }
        if self.phase.ghost_target == 0 {
            anyhow::bail!("GHOST_TARGET must be > 0");
        }
        if !(0.0..=100.0).contains(&self.phase.min_accuracy) {
            anyhow::bail!("MIN_ACCURACY must be between 0 and 100");
        }
        if self.phase.max_consecutive_losses == 0 {
            anyhow::bail!("MAX_CONSECUTIVE_LOSSES must be > 0");
        }

        // Prediction
        if self.prediction.min_history == 0 {
            anyhow::bail!("MIN_HISTORY must be > 0");
        }
        if self.prediction.analysis_window < self.prediction.min_history {
            anyhow::bail!("ANALYSIS_WINDOW cannot be smaller than MIN_HISTORY");
        }
        if self.prediction.lowest_count_window == 0 {
            anyhow::bail!("LOWEST_COUNT_WINDOW must be > 0");
        }
        if self.prediction.dozen_weight < 0.0
            || self.prediction.delay_weight < 0.0
            || self.prediction.deviation_weight < 0.0
        {
            anyhow::bail!("Prediction weights must be ≥ 0");
        }

        // Bankroll
        if !self.bankroll.starting_balance.is_finite() || self.bankroll.starting_balance <= 0.0 {
            anyhow::bail!("STARTING_BALANCE must be > 0");
        }
        if self.bankroll.base_unit <= 0.0 {
            anyhow::bail!("BASE_UNIT must be > 0");
        }
        if self.bankroll.unit_fraction <= 0.0 || self.bankroll.unit_fraction > 1.0 {
            anyhow::bail!("UNIT_FRACTION must be in (0, 1]");
        }
        if self.bankroll.max_bet_fraction <= 0.0 || self.bankroll.max_bet_fraction > 1.0 {
            anyhow::bail!("MAX_BET_FRACTION must be in (0, 1]");
        }
        if self.bankroll.result_history_cap == 0 {
            anyhow::bail!("RESULT_HISTORY_CAP must be > 0");
        }

        // Risk
        if self.risk.stop_loss < 0.0 {
            anyhow::bail!("STOP_LOSS must be ≥ 0");
        }
        if self.risk.stop_loss >= self.risk.profit_target {
            anyhow::bail!("STOP_LOSS must be below PROFIT_TARGET");
        }
        if self.bankroll.starting_balance <= self.risk.stop_loss {
            log::warn!("STARTING_BALANCE is at or below STOP_LOSS - session will start in protection");
        }

        Ok(())
    }
}

// Helper functions for environment variable parsing

fn get_env_string(key: &str, default: &str) -> Result<String> {
    Ok(env::var(key).unwrap_or_else(|_| default.to_string()))
}

fn get_env<T: FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .ok()
            .with_context(|| format!("Invalid {} value: {:?}", key, raw)),
        Err(_) => Ok(default),
    }
}
