pub mod phase;
pub mod predictor;
pub mod bankroll;
pub mod evaluator;
pub mod guardrails;
pub mod logging;

// Re-export main types for convenience
pub use phase::{Phase, PhaseController, GhostStats, TransitionInputs, TransitionEffects};
pub use predictor::{Predictor, Prediction, PredictionStrategy, PredictionRationale, DozenScore};
pub use bankroll::{BankrollManager, BankrollState, ResultRecord};
pub use evaluator::{ResultEvaluator, Evaluation, prediction_won};
pub use guardrails::{RiskManager, RiskSignal};
pub use logging::{SpinLogger, SpinLogEntry};
