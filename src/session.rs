//! 🎰 Engine session
//!
//! One `Session` owns every piece of state for a single bankroll. Each spin
//! runs to completion before the next is accepted:
//!
//! record → phase transitions → predict next → evaluate previous → risk check
//!
//! Independent bankrolls use independent sessions; nothing is shared.

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::Serialize;

use crate::config::Config;
use crate::decision_engine::{
    BankrollManager, BankrollState, Evaluation, GhostStats, Phase, PhaseController, Prediction,
    PredictionStrategy, Predictor, ResultEvaluator, RiskManager, RiskSignal, TransitionInputs,
};
use crate::error::{EngineError, EngineResult};
use crate::history::{DozenWindowStats, HistoryLog};
use crate::spin::{Dozen, Spin};

/// Result of processing one spin
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpinSnapshot {
    pub spin: u8,
    pub phase: Phase,
    /// Prediction for the next spin
    pub prediction: Prediction,
    /// Stake for the next spin (only placed in ACTIVE)
    pub bet: f64,
    pub balance: f64,
    pub history_count: usize,
    /// Evaluation of the prediction made for this spin
    pub last_result: Option<Evaluation>,
    /// ACTIVE-phase win rate in percent
    pub accuracy: f64,
    pub stats: EngineStats,
    pub risk: Option<RiskSignal>,
    /// ACTIVE loss streak has reached the limit: the next spin moves to
    /// PROTECTION and `bet` will not be staked
    pub protection_pending: bool,
}

/// Current engine state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineState {
    pub phase: Phase,
    pub strategy: PredictionStrategy,
    pub bankroll: BankrollState,
    pub ghost: GhostStats,
    pub history_count: usize,
    pub last_spin: Option<u8>,
}

/// Window statistics and accuracy figures
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineStats {
    pub window: DozenWindowStats,
    pub hot_dozen: Option<Dozen>,
    pub cold_dozen: Option<Dozen>,
    pub ghost: GhostStats,
    pub ghost_accuracy: f64,
    pub active_accuracy: f64,
    pub active_results: usize,
    pub consecutive_wins: u32,
    pub consecutive_losses: u32,
}

/// Owning handle for one bankroll session
pub struct Session {
    config: Config,
    history: HistoryLog,
    phases: PhaseController,
    predictor: Predictor,
    bankroll: BankrollManager,
    risk: RiskManager,
    current_prediction: Prediction,
    last_evaluation: Option<Evaluation>,
    rng: Box<dyn RngCore + Send>,
}

impl Session {
    /// Session holding the configured starting balance
    pub fn new(config: Config) -> EngineResult<Self> {
        let balance = config.bankroll.starting_balance;
        Self::initialize(config, balance)
    }

    /// Session holding `starting_balance`, entropy-seeded fallback sampling
    pub fn initialize(config: Config, starting_balance: f64) -> EngineResult<Self> {
        Self::with_rng(config, starting_balance, Box::new(StdRng::from_entropy()))
    }

    /// Session with an explicit randomness source for the fallback sample
    pub fn with_rng(
        config: Config,
        starting_balance: f64,
        rng: Box<dyn RngCore + Send>,
    ) -> EngineResult<Self> {
        validate_balance(starting_balance)?;

        info!("🎰 Starting session with balance {:.0}", starting_balance);

        Ok(Self {
            history: HistoryLog::new(),
            phases: PhaseController::new(config.phase.clone()),
            predictor: Predictor::new(config.prediction.clone()),
            bankroll: BankrollManager::new(config.bankroll.clone(), starting_balance),
            risk: RiskManager::new(config.risk.clone()),
            current_prediction: Prediction::none(),
            last_evaluation: None,
            rng,
            config,
        })
    }

    /// Clear all state and start over with `starting_balance`
    pub fn reinitialize(&mut self, starting_balance: f64) -> EngineResult<()> {
        validate_balance(starting_balance)?;

        self.history.clear();
        self.phases.reset();
        self.bankroll.reinitialize(starting_balance);
        self.risk.reset();
        self.current_prediction = Prediction::none();
        self.last_evaluation = None;

        info!("🔄 Session reinitialized with balance {:.0}", starting_balance);
        Ok(())
    }

    /// New calibration cycle, carrying the current balance over
    pub fn reset(&mut self) {
        let balance = self.bankroll.balance();
        self.history.clear();
        self.phases.reset();
        self.bankroll.reinitialize(balance);
        self.risk.reset();
        self.current_prediction = Prediction::none();
        self.last_evaluation = None;

        info!("🔄 Session reset, balance {:.0} carried over", balance);
    }

    /// Validate and process a raw spin number
    ///
    /// Out-of-range input is rejected before anything is written.
    pub fn process_spin(&mut self, number: i64) -> EngineResult<SpinSnapshot> {
        let spin = Spin::new(number)?;
        Ok(self.process(spin))
    }

    /// Parse and process a textual spin ("17"); rejects non-integers
    pub fn process_input(&mut self, input: &str) -> EngineResult<SpinSnapshot> {
        let spin: Spin = input.parse()?;
        Ok(self.process(spin))
    }

    /// Run the full pipeline for an already validated spin
    pub fn process(&mut self, spin: Spin) -> SpinSnapshot {
        // 1. Record
        self.history.record(spin);

        // 2. Phase transitions
        let effects = self.phases.evaluate(TransitionInputs {
            spins_recorded: self.history.len(),
            consecutive_wins: self.bankroll.consecutive_wins(),
            consecutive_losses: self.bankroll.consecutive_losses(),
        });
        if effects.entered_active {
            self.bankroll.reset_streaks();
            self.bankroll.reset_progression();
        }
        if effects.left_protection {
            self.bankroll.clear_loss_streak();
        }

        // 3. Predict the next spin
        let next = self.predictor.predict(&self.history, &mut *self.rng);
        let previous = std::mem::replace(&mut self.current_prediction, next);

        // 4. Evaluate the prediction made for this spin
        self.last_evaluation =
            ResultEvaluator::evaluate(&previous, spin, &mut self.phases, &mut self.bankroll);

        // 5. Session thresholds
        let risk = self.risk.check(self.bankroll.balance(), &mut self.phases);

        debug!("🎡 Spin {} → phase {}, balance {:.0}, next {}",
               spin, self.phases.phase().as_str(), self.bankroll.balance(),
               self.current_prediction.breakdown());

        self.snapshot(spin, risk)
    }

    pub fn state(&self) -> EngineState {
        EngineState {
            phase: self.phases.phase(),
            strategy: self.predictor.strategy(),
            bankroll: self.bankroll.state(),
            ghost: self.phases.ghost_stats(),
            history_count: self.history.len(),
            last_spin: self.history.latest().map(|s| s.number()),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phases.phase()
    }

    /// Prediction for the next spin
    pub fn current_prediction(&self) -> &Prediction {
        &self.current_prediction
    }

    /// Win rate of recorded ACTIVE results in percent
    pub fn accuracy(&self) -> f64 {
        self.bankroll.accuracy()
    }

    pub fn stats(&self) -> EngineStats {
        let window = self.history.dozen_stats(self.config.prediction.analysis_window);
        let ghost = self.phases.ghost_stats();
        EngineStats {
            hot_dozen: window.hot(),
            cold_dozen: window.cold(),
            window,
            ghost,
            ghost_accuracy: ghost.accuracy(),
            active_accuracy: self.bankroll.accuracy(),
            active_results: self.bankroll.results().count(),
            consecutive_wins: self.bankroll.consecutive_wins(),
            consecutive_losses: self.bankroll.consecutive_losses(),
        }
    }

    pub fn balance(&self) -> f64 {
        self.bankroll.balance()
    }

    fn snapshot(&self, spin: Spin, risk: Option<RiskSignal>) -> SpinSnapshot {
        SpinSnapshot {
            spin: spin.number(),
            phase: self.phases.phase(),
            prediction: self.current_prediction.clone(),
            bet: self.bankroll.current_bet(),
            balance: self.bankroll.balance(),
            history_count: self.history.len(),
            last_result: self.last_evaluation.clone(),
            accuracy: self.bankroll.accuracy(),
            stats: self.stats(),
            risk,
            protection_pending: self.protection_pending(),
        }
    }

    /// Whether the next transition pass will leave ACTIVE for PROTECTION
    fn protection_pending(&self) -> bool {
        self.phases.phase() == Phase::Active
            && self.bankroll.consecutive_losses() >= self.config.phase.max_consecutive_losses
    }
}

fn validate_balance(balance: f64) -> EngineResult<()> {
    if !balance.is_finite() || balance <= 0.0 {
        return Err(EngineError::InvalidBalance { value: balance });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RiskConfig;

    fn session_with(config: Config) -> Session {
        Session::with_rng(config, 10_000.0, Box::new(StdRng::seed_from_u64(42))).unwrap()
    }

    fn session() -> Session {
        session_with(Config::default())
    }

    /// Spins cycling through all three dozens and the occasional zero
    fn calibration_spin(i: usize) -> i64 {
        const CYCLE: [i64; 8] = [3, 17, 29, 0, 8, 22, 35, 14];
        CYCLE[i % CYCLE.len()]
    }

    /// Stop one spin short of the calibration target; the next spin fed
    /// enters GHOST and is the first prediction scored on probation.
    fn calibrate(session: &mut Session) {
        for i in 0..36 {
            session.process_spin(calibration_spin(i)).unwrap();
        }
        assert_eq!(session.phase(), Phase::Calibration);
    }

    /// Feed a spin that wins or loses against the current prediction
    fn feed_outcome(session: &mut Session, win: bool) -> SpinSnapshot {
        let predicted = session.current_prediction().dozen.expect("prediction available");
        let target = if win {
            predicted
        } else {
            Dozen::from_index(predicted.index() % 3 + 1).unwrap()
        };
        let number = target.numbers().next().unwrap();
        session.process_spin(number as i64).unwrap()
    }

    /// Calibrate, pass probation, and book the first real win
    fn activate(session: &mut Session) -> SpinSnapshot {
        calibrate(session);
        for _ in 0..10 {
            feed_outcome(session, true);
        }
        let snapshot = feed_outcome(session, true);
        assert_eq!(snapshot.phase, Phase::Active);
        snapshot
    }

    #[test]
    fn test_invalid_balance_rejected() {
        assert!(matches!(
            Session::initialize(Config::default(), 0.0),
            Err(EngineError::InvalidBalance { .. })
        ));
        assert!(Session::initialize(Config::default(), f64::NAN).is_err());
    }

    #[test]
    fn test_invalid_spin_does_not_mutate() {
        let mut session = session();
        for i in 0..12 {
            session.process_spin(calibration_spin(i)).unwrap();
        }
        let state_before = session.state();
        let prediction_before = session.current_prediction().clone();

        assert_eq!(session.process_spin(37), Err(EngineError::InvalidSpin { value: 37 }));
        assert_eq!(session.process_spin(-1), Err(EngineError::InvalidSpin { value: -1 }));
        assert!(matches!(
            session.process_input("12.5"),
            Err(EngineError::NonIntegerSpin { .. })
        ));

        assert_eq!(session.state(), state_before);
        assert_eq!(session.current_prediction(), &prediction_before);
    }

    #[test]
    fn test_no_prediction_until_min_history() {
        let mut session = session();
        for i in 0..9 {
            let snapshot = session.process_spin(calibration_spin(i)).unwrap();
            assert!(!snapshot.prediction.is_some());
            assert_eq!(snapshot.prediction.confidence, 0);
        }
        let snapshot = session.process_spin(calibration_spin(9)).unwrap();
        assert!(snapshot.prediction.is_some());
        assert!((20..=95).contains(&snapshot.prediction.confidence));
    }

    #[test]
    fn test_calibration_ends_exactly_at_target() {
        let mut session = session();
        for i in 0..36 {
            let snapshot = session.process_spin(calibration_spin(i)).unwrap();
            assert_eq!(snapshot.phase, Phase::Calibration);
        }
        let snapshot = session.process_spin(calibration_spin(36)).unwrap();
        assert_eq!(snapshot.phase, Phase::Ghost);
        assert_eq!(snapshot.history_count, 37);
        // Calibration predictions never move money
        assert_eq!(snapshot.balance, 10_000.0);
    }

    #[test]
    fn test_ghost_probation_passes_at_forty_percent() {
        let mut session = session();
        calibrate(&mut session);

        for _ in 0..4 {
            feed_outcome(&mut session, true);
        }
        for _ in 0..6 {
            feed_outcome(&mut session, false);
        }
        assert_eq!(session.state().ghost, GhostStats { wins: 4, total: 10 });
        assert_eq!(session.phase(), Phase::Ghost);
        assert_eq!(session.balance(), 10_000.0);

        let snapshot = feed_outcome(&mut session, true);
        assert_eq!(snapshot.phase, Phase::Active);
        // Ghost losses do not carry into the real-money streak
        assert_eq!(snapshot.stats.consecutive_losses, 0);
        assert_eq!(snapshot.balance, 10_100.0);
        assert_eq!(snapshot.last_result.unwrap().settlement.unwrap().amount, 100.0);
    }

    #[test]
    fn test_ghost_probation_fails_at_thirty_percent() {
        let mut session = session();
        calibrate(&mut session);

        for _ in 0..3 {
            feed_outcome(&mut session, true);
        }
        for _ in 0..7 {
            feed_outcome(&mut session, false);
        }
        assert_eq!(session.state().ghost.total, 10);

        // Window resets on the next transition pass; this spin opens the new one
        let snapshot = feed_outcome(&mut session, false);
        assert_eq!(snapshot.phase, Phase::Ghost);
        assert_eq!(snapshot.stats.ghost, GhostStats { wins: 0, total: 1 });
        assert_eq!(snapshot.balance, 10_000.0);
    }

    #[test]
    fn test_loss_streak_protection_and_recovery() {
        let mut session = session();
        activate(&mut session);
        let balance = session.balance();

        let first = feed_outcome(&mut session, false);
        let second = feed_outcome(&mut session, false);
        let third = feed_outcome(&mut session, false);
        assert_eq!(third.phase, Phase::Active);
        assert_eq!(third.stats.consecutive_losses, 3);
        assert!(!first.protection_pending);
        assert!(!second.protection_pending);
        // Phase still reads ACTIVE, but the shown bet will not be staked
        assert!(third.protection_pending);

        let lost: f64 = [&first, &second, &third]
            .iter()
            .map(|s| s.last_result.as_ref().unwrap().settlement.as_ref().unwrap().amount)
            .sum();
        assert_eq!(session.balance(), balance + lost);

        // Next spin: PROTECTION, outcome booked without money
        let protected = feed_outcome(&mut session, true);
        assert_eq!(protected.phase, Phase::Protection);
        assert!(!protected.protection_pending);
        assert!(protected.last_result.as_ref().unwrap().won);
        assert!(protected.last_result.as_ref().unwrap().settlement.is_none());
        assert_eq!(protected.balance, session.balance());
        assert_eq!(protected.balance, balance + lost);

        // The win in protection sends us back to GHOST
        let back = feed_outcome(&mut session, true);
        assert_eq!(back.phase, Phase::Ghost);
        assert_eq!(back.stats.consecutive_losses, 0);
        assert_eq!(back.stats.ghost, GhostStats { wins: 1, total: 1 });
    }

    #[test]
    fn test_active_bet_respects_bounds() {
        let mut session = session();
        activate(&mut session);
        for i in 0..12 {
            let snapshot = feed_outcome(&mut session, i % 3 == 0);
            if snapshot.phase != Phase::Active {
                break;
            }
            let bankroll = session.state().bankroll;
            assert!(bankroll.bet_level >= 1);
            assert!(snapshot.bet >= bankroll.unit_size.min((snapshot.balance * 0.05).floor()));
            assert!(snapshot.bet <= snapshot.balance * 0.05);
        }
    }

    #[test]
    fn test_stop_loss_forces_protection_immediately() {
        let config = Config {
            risk: RiskConfig {
                stop_loss: 9_850.0,
                profit_target: 15_000.0,
            },
            ..Default::default()
        };
        let mut session = session_with(config);
        activate(&mut session);
        assert_eq!(session.balance(), 10_100.0);

        // Stake 101 (1% of 10100), then 200 at level 2
        let first = feed_outcome(&mut session, false);
        assert_eq!(first.phase, Phase::Active);
        assert_eq!(first.balance, 9_999.0);

        let second = feed_outcome(&mut session, false);
        assert_eq!(second.balance, 9_799.0);
        assert_eq!(second.risk, Some(RiskSignal::StopLossHit));
        assert_eq!(second.phase, Phase::Protection);

        // Stays protected while under the floor, even after a win
        let third = feed_outcome(&mut session, true);
        assert_eq!(third.phase, Phase::Protection);
        let fourth = feed_outcome(&mut session, true);
        assert_eq!(fourth.phase, Phase::Protection);
        assert_eq!(fourth.balance, 9_799.0);
    }

    #[test]
    fn test_profit_target_is_signalled_without_phase_change() {
        let config = Config {
            risk: RiskConfig {
                stop_loss: 5_000.0,
                profit_target: 10_050.0,
            },
            ..Default::default()
        };
        let mut session = session_with(config);
        let snapshot = activate(&mut session);
        assert_eq!(snapshot.risk, Some(RiskSignal::ProfitTargetReached));
        assert_eq!(snapshot.phase, Phase::Active);
    }

    #[test]
    fn test_zero_loses_in_active_without_escalation() {
        let mut session = session();
        activate(&mut session);
        let level_before = session.state().bankroll.bet_level;

        let snapshot = session.process_spin(0).unwrap();
        let evaluation = snapshot.last_result.unwrap();
        assert!(!evaluation.won);
        assert_eq!(evaluation.actual, None);
        assert_eq!(session.state().bankroll.bet_level, level_before);
        // Stake was 101 after the first win
        assert_eq!(snapshot.balance, 9_999.0);
    }

    #[test]
    fn test_reset_preserves_balance_and_replays_identically() {
        let spins: Vec<i64> = (0..90).map(|i| ((i * 7 + 3) % 37) as i64).collect();

        let mut fresh = session();
        let first_run: Vec<(Phase, Option<Dozen>, f64, f64)> = spins
            .iter()
            .map(|n| {
                let s = fresh.process_spin(*n).unwrap();
                (s.phase, s.prediction.dozen, s.balance, s.bet)
            })
            .collect();

        // Replay from a fresh session with the same balance
        let mut replay = session();
        let second_run: Vec<(Phase, Option<Dozen>, f64, f64)> = spins
            .iter()
            .map(|n| {
                let s = replay.process_spin(*n).unwrap();
                (s.phase, s.prediction.dozen, s.balance, s.bet)
            })
            .collect();
        assert_eq!(first_run, second_run);

        // reset() carries the balance into a new calibration cycle
        let balance = replay.balance();
        replay.reset();
        let state = replay.state();
        assert_eq!(state.phase, Phase::Calibration);
        assert_eq!(state.history_count, 0);
        assert_eq!(state.bankroll.balance, balance);
        assert!(!replay.current_prediction().is_some());
    }

    #[test]
    fn test_reset_then_replay_matches_initialize_with_same_balance() {
        let spins: Vec<i64> = (0..80).map(|i| ((i * 11 + 5) % 37) as i64).collect();

        let mut session = session();
        for i in 0..20 {
            session.process_spin(calibration_spin(i)).unwrap();
        }
        session.reset();
        let carried = session.balance();

        let mut fresh = Session::with_rng(Config::default(), carried, Box::new(StdRng::seed_from_u64(9)))
            .unwrap();

        for n in &spins {
            let a = session.process_spin(*n).unwrap();
            let b = fresh.process_spin(*n).unwrap();
            assert_eq!(a.phase, b.phase);
            assert_eq!(a.prediction.dozen, b.prediction.dozen);
            assert_eq!(a.prediction.confidence, b.prediction.confidence);
            assert_eq!(a.balance, b.balance);
            assert_eq!(a.bet, b.bet);
        }
    }

    #[test]
    fn test_stats_report_hot_and_cold() {
        let mut session = session();
        for n in [1, 2, 3, 4, 13, 14, 0] {
            session.process_spin(n).unwrap();
        }
        let stats = session.stats();
        assert_eq!(stats.hot_dozen, Some(Dozen::First));
        assert_eq!(stats.cold_dozen, Some(Dozen::Third));
        assert_eq!(stats.window.cell(Dozen::Second).count, 2);
        assert_eq!(stats.window.cell(Dozen::Second).last_seen, 1);
        assert_eq!(stats.window.zeros, 1);
        assert_eq!(stats.active_accuracy, 0.0);
        assert_eq!(stats.ghost_accuracy, 0.0);
    }

    #[test]
    fn test_independent_sessions() {
        let mut a = session();
        let mut b = session();
        for i in 0..15 {
            a.process_spin(calibration_spin(i)).unwrap();
        }
        assert_eq!(a.state().history_count, 15);
        assert_eq!(b.state().history_count, 0);
        b.process_spin(5).unwrap();
        assert_eq!(a.state().history_count, 15);
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut session = session();
        let snapshot = session.process_spin(21).unwrap();
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["phase"], "CALIBRATION");
        assert_eq!(json["spin"], 21);
        assert_eq!(json["history_count"], 1);
        assert_eq!(json["protection_pending"], false);
    }
}
