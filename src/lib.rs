//! Dozen Engine - prediction and bankroll core for dozen betting
//!
//! Consumes observed wheel numbers one at a time, gates predictions through a
//! CALIBRATION / GHOST / ACTIVE / PROTECTION phase machine, and sizes stakes
//! with a D'Alembert progression bounded by session risk limits.

pub mod config;
pub mod decision_engine;
pub mod error;
pub mod history;
pub mod session;
pub mod spin;

pub use config::Config;
pub use error::{EngineError, EngineResult};
pub use history::HistoryLog;
pub use session::{EngineState, EngineStats, Session, SpinSnapshot};
pub use spin::{Dozen, Spin};
