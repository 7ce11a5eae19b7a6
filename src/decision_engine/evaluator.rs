//! Result evaluation
//!
//! Checks the prediction made for a spin against the actual outcome and
//! routes the result by phase:
//! - GHOST: probation tally + streaks
//! - ACTIVE: real settlement through the bankroll
//! - CALIBRATION / PROTECTION: streaks only

use serde::Serialize;

use super::bankroll::{BankrollManager, ResultRecord};
use super::phase::{Phase, PhaseController};
use super::predictor::Prediction;
use crate::spin::{Dozen, Spin};

/// Outcome of one evaluated prediction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub spin: u8,
    pub predicted: Dozen,
    /// `None` when the ball landed on 0
    pub actual: Option<Dozen>,
    pub won: bool,
    /// Phase the outcome was booked under
    pub phase: Phase,
    /// Present only for ACTIVE settlements
    pub settlement: Option<ResultRecord>,
}

/// Whether a predicted dozen won against `spin`. Zero never wins.
pub fn prediction_won(predicted: Option<Dozen>, spin: Spin) -> bool {
    match (predicted, spin.dozen()) {
        (Some(predicted), Some(actual)) => predicted == actual,
        _ => false,
    }
}

pub struct ResultEvaluator;

impl ResultEvaluator {
    /// Book the outcome of `prediction` against `spin`
    ///
    /// Returns `None` when there was no prediction to check.
    pub fn evaluate(
        prediction: &Prediction,
        spin: Spin,
        phases: &mut PhaseController,
        bankroll: &mut BankrollManager,
    ) -> Option<Evaluation> {
        let predicted = prediction.dozen?;
        let won = prediction_won(Some(predicted), spin);
        let phase = phases.phase();

        let settlement = if phase.stakes_real() {
            Some(bankroll.settle(won, spin))
        } else {
            if phase == Phase::Ghost {
                phases.record_ghost(won);
            }
            bankroll.record_streak(won);
            None
        };

        Some(Evaluation {
            spin: spin.number(),
            predicted,
            actual: spin.dozen(),
            won,
            phase,
            settlement,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BankrollConfig, PhaseConfig};
    use crate::decision_engine::phase::TransitionInputs;

    fn spin(n: i64) -> Spin {
        Spin::new(n).unwrap()
    }

    fn predicting(dozen: Dozen) -> Prediction {
        Prediction {
            dozen: Some(dozen),
            confidence: 60,
            supporting_numbers: vec![],
            rationale: None,
        }
    }

    #[test]
    fn test_zero_never_wins() {
        for dozen in Dozen::ALL {
            assert!(!prediction_won(Some(dozen), spin(0)));
        }
        assert!(!prediction_won(None, spin(0)));
        assert!(!prediction_won(None, spin(5)));
    }

    #[test]
    fn test_match_on_dozen() {
        assert!(prediction_won(Some(Dozen::Second), spin(13)));
        assert!(!prediction_won(Some(Dozen::Second), spin(12)));
    }

    #[test]
    fn test_no_prediction_books_nothing() {
        let mut phases = PhaseController::new(PhaseConfig::default());
        let mut bankroll = BankrollManager::new(BankrollConfig::default(), 10_000.0);

        let result = ResultEvaluator::evaluate(&Prediction::none(), spin(5), &mut phases, &mut bankroll);
        assert!(result.is_none());
        assert_eq!(bankroll.consecutive_losses(), 0);
    }

    #[test]
    fn test_ghost_routes_to_probation_tally() {
        let mut phases = PhaseController::new(PhaseConfig::default());
        phases.evaluate(TransitionInputs { spins_recorded: 37, ..Default::default() });
        let mut bankroll = BankrollManager::new(BankrollConfig::default(), 10_000.0);

        let result = ResultEvaluator::evaluate(&predicting(Dozen::First), spin(3), &mut phases, &mut bankroll)
            .unwrap();
        assert!(result.won);
        assert_eq!(result.phase, Phase::Ghost);
        assert!(result.settlement.is_none());
        assert_eq!(phases.ghost_stats().wins, 1);
        assert_eq!(phases.ghost_stats().total, 1);
        assert_eq!(bankroll.balance(), 10_000.0);
        assert_eq!(bankroll.consecutive_wins(), 1);
    }

    #[test]
    fn test_active_settles_through_bankroll() {
        let mut phases = PhaseController::new(PhaseConfig::default());
        phases.evaluate(TransitionInputs { spins_recorded: 37, ..Default::default() });
        for _ in 0..10 {
            phases.record_ghost(true);
        }
        phases.evaluate(TransitionInputs { spins_recorded: 47, ..Default::default() });
        assert_eq!(phases.phase(), Phase::Active);

        let mut bankroll = BankrollManager::new(BankrollConfig::default(), 10_000.0);
        let result = ResultEvaluator::evaluate(&predicting(Dozen::Second), spin(30), &mut phases, &mut bankroll)
            .unwrap();
        assert!(!result.won);
        assert_eq!(result.phase, Phase::Active);
        assert_eq!(result.settlement.unwrap().amount, -100.0);
        assert_eq!(bankroll.balance(), 9_900.0);
        assert_eq!(phases.ghost_stats().total, 0);
    }

    #[test]
    fn test_calibration_is_streak_only() {
        let mut phases = PhaseController::new(PhaseConfig::default());
        let mut bankroll = BankrollManager::new(BankrollConfig::default(), 10_000.0);

        let result = ResultEvaluator::evaluate(&predicting(Dozen::Third), spin(0), &mut phases, &mut bankroll)
            .unwrap();
        assert!(!result.won);
        assert_eq!(result.actual, None);
        assert_eq!(phases.ghost_stats().total, 0);
        assert_eq!(bankroll.consecutive_losses(), 1);
        assert_eq!(bankroll.balance(), 10_000.0);
    }
}
